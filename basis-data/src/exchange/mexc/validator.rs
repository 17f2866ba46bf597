use super::subscription::MexcSubResponse;
use crate::{
    exchange::Connector,
    subscriber::validator::SubscriptionValidator,
    subscription::{Map, SubscriptionKind},
};
use async_trait::async_trait;
use basis_integration::{
    Validator,
    error::SocketError,
    protocol::{
        StreamParser,
        websocket::{WebSocket, WebSocketSerdeParser, WsMessage},
    },
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// [`SubscriptionValidator`] for MEXC that parses JSON confirmations while buffering any
/// binary protobuf frames that arrive before validation completes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct MexcWebSocketSubValidator;

#[async_trait]
impl SubscriptionValidator for MexcWebSocketSubValidator {
    async fn validate<Exchange, InstrumentKey, Kind>(
        instrument_map: Map<InstrumentKey>,
        websocket: &mut WebSocket,
    ) -> Result<(Map<InstrumentKey>, Vec<WsMessage>), SocketError>
    where
        Exchange: Connector + Send,
        InstrumentKey: Send,
        Kind: SubscriptionKind + Send,
    {
        let timeout = Exchange::subscription_timeout();
        let expected_responses = Exchange::expected_responses(&instrument_map);
        let mut success_responses = 0usize;
        let mut buffered_events = Vec::new();

        loop {
            if success_responses >= expected_responses {
                debug!(exchange = %Exchange::ID, "validated MEXC WebSocket subscriptions");
                break Ok((instrument_map, buffered_events));
            }

            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    break Err(SocketError::Subscribe(
                        format!("subscription validation timeout reached: {timeout:?}")
                    ))
                },
                maybe_message = websocket.next() => {
                    let response = match maybe_message {
                        Some(response) => response,
                        None => break Err(SocketError::Subscribe(
                            "WebSocket stream terminated unexpectedly".to_string()
                        ))
                    };

                    let ws_message = match response {
                        Ok(ws_message) => ws_message,
                        Err(error) => break Err(SocketError::WebSocket(Box::new(error))),
                    };

                    match <WebSocketSerdeParser as StreamParser<MexcSubResponse>>::parse(Ok(ws_message.clone())) {
                        Some(Ok(response)) => match response.validate() {
                            Ok(validated) => {
                                success_responses += 1;
                                debug!(
                                    exchange = %Exchange::ID,
                                    %success_responses,
                                    %expected_responses,
                                    payload = ?validated,
                                    "received valid Ok subscription response",
                                );
                            }
                            Err(err) => break Err(err),
                        },
                        Some(Err(SocketError::Terminated(close_frame))) => {
                            break Err(SocketError::Subscribe(
                                format!("received WebSocket CloseFrame: {close_frame}")
                            ))
                        }
                        _ => {
                            // Binary protobuf market data frames, pings, etc. - buffer for
                            // replay through the protobuf transformer after validation
                            buffered_events.push(ws_message);
                            continue;
                        }
                    }
                }
            }
        }
    }
}
