use serde::{Deserialize, Serialize};

/// [`Gateio`](super::Gateio) WebSocket message envelope.
///
/// ### Raw Payload Examples
/// #### Subscription Success
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#api-overview>
/// ```json
/// {
///     "time": 1606292218,
///     "time_ms": 1606292218231,
///     "channel": "spot.book_ticker",
///     "event": "subscribe",
///     "result": {
///         "status": "success"
///     }
/// }
/// ```
///
/// #### Subscription Failure
/// ```json
/// {
///     "time": 1606292218,
///     "time_ms": 1606292218231,
///     "channel": "spot.book_ticker",
///     "event": "subscribe",
///     "error": {
///         "code": 2,
///         "message": "unknown currency pair GIBBERISH_USD"
///     },
///     "result": null
/// }
/// ```
///
/// #### Book Ticker Update
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#best-bid-or-ask-price>
/// ```json
/// {
///     "time": 1606293275,
///     "time_ms": 1606293275123,
///     "channel": "spot.book_ticker",
///     "event": "update",
///     "result": {
///         "t": 1606293275123,
///         "u": 48733182,
///         "s": "BTC_USDT",
///         "b": "19177.79",
///         "B": "0.0003341504",
///         "a": "19179.38",
///         "A": "0.09"
///     }
/// }
/// ```
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct GateioMessage<T> {
    pub channel: String,
    pub error: Option<GateioError>,
    #[serde(rename = "result")]
    pub data: T,
}

/// [`Gateio`](super::Gateio) WebSocket error message.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct GateioError {
    pub code: u8,
    pub message: String,
}
