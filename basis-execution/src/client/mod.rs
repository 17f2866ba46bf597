use crate::{
    balance::AssetBalance,
    error::UnindexedClientError,
    order::{
        Order,
        id::OrderId,
        request::{CancelOrderRequest, OpenOrderRequest},
    },
};
use async_trait::async_trait;
use basis_instrument::{
    asset::AssetNameExchange,
    exchange::ExchangeId,
    instrument::{MarketDataInstrument, SymbolInfo, name::InstrumentNameExchange},
};
use std::{fmt::Debug, sync::Arc};

/// Gate.io execution client (spot & USDT-margined perpetuals).
pub mod gateio;

/// MEXC spot execution client.
pub mod mexc;

/// In-memory mock venue with configurable fill behaviour.
pub mod mock;

/// Venue API credentials.
#[derive(Clone, Eq, PartialEq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets never reach logs
        f.debug_struct("ApiCredentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .finish()
    }
}

/// Normalised private trading interface implemented once per venue.
///
/// Venue specifics (request construction, rate limiting, retry classification, signature
/// generation) live inside each implementation; callers interact exclusively through the
/// normalised [`Order`] model.
#[async_trait]
pub trait ExecutionClient
where
    Self: Debug + Send + Sync,
{
    /// Venue this client executes on.
    fn exchange(&self) -> ExchangeId;

    /// Fetch the venue trading rules for the provided instrument.
    ///
    /// Loaded once at startup and refreshed on reconnect.
    async fn fetch_symbol_info(
        &self,
        instrument: &MarketDataInstrument,
    ) -> Result<SymbolInfo, UnindexedClientError>;

    /// Open an order, returning the venue's initial view of it.
    async fn open_order(&self, request: OpenOrderRequest) -> Result<Order, UnindexedClientError>;

    /// Cancel a working order, returning the venue's final view of it.
    async fn cancel_order(
        &self,
        request: CancelOrderRequest,
    ) -> Result<Order, UnindexedClientError>;

    /// Fetch the venue's current view of an order.
    async fn fetch_order(
        &self,
        instrument: &InstrumentNameExchange,
        id: &OrderId,
    ) -> Result<Order, UnindexedClientError>;

    /// Fetch all working orders, optionally filtered by instrument.
    async fn fetch_open_orders(
        &self,
        instrument: Option<&InstrumentNameExchange>,
    ) -> Result<Vec<Order>, UnindexedClientError>;

    /// Fetch current account balances.
    ///
    /// Always fetched live - balances are never cached since any trade may mutate them.
    async fn fetch_balances(
        &self,
    ) -> Result<Vec<AssetBalance<AssetNameExchange>>, UnindexedClientError>;
}

/// Construct the [`ExecutionClient`] associated with the provided venue.
///
/// The factory is keyed by [`ExchangeId`] and produces boxed trait objects so callers stay
/// venue-agnostic.
pub fn init_execution_client(
    exchange: ExchangeId,
    credentials: ApiCredentials,
) -> Arc<dyn ExecutionClient> {
    match exchange {
        ExchangeId::MexcSpot => Arc::new(mexc::MexcExecution::new(credentials)),
        ExchangeId::GateioSpot => Arc::new(gateio::GateioExecution::spot(credentials)),
        ExchangeId::GateioPerpetualsUsd => {
            Arc::new(gateio::GateioExecution::perpetuals_usd(credentials))
        }
        ExchangeId::Mock => Arc::new(mock::MockExecution::default()),
    }
}
