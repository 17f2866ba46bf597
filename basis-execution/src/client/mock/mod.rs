use super::ExecutionClient;
use crate::{
    balance::AssetBalance,
    error::{ApiError, ClientError, UnindexedClientError},
    order::{
        Order, OrderStatus,
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
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use smol_str::format_smolstr;
use std::{collections::HashMap, sync::Arc, time::Duration};

/// How the [`MockExecution`] venue responds to order placements.
#[derive(Debug, Clone, Default)]
pub enum FillBehaviour {
    /// Orders fill in full immediately.
    #[default]
    FillImmediately,
    /// Orders fill `fill_quantity` then report `Canceled` on the remainder.
    PartialThenCancel { fill_quantity: Decimal },
    /// Orders rest on the venue unfilled.
    RemainOpen,
    /// Placements are rejected with the provided reason.
    Reject(String),
}

#[derive(Debug, Default)]
struct MockState {
    next_order_id: u64,
    behaviour: FillBehaviour,
    open_delay: Option<Duration>,
    orders: HashMap<OrderId, Order>,
    symbol_info: HashMap<InstrumentNameExchange, SymbolInfo>,
    balances: Vec<AssetBalance<AssetNameExchange>>,
}

/// In-memory mock venue with configurable fill behaviour.
///
/// Useful for driving the engine through entry, partial fill, imbalance, and timeout
/// scenarios without a network.
#[derive(Debug, Clone)]
pub struct MockExecution {
    exchange: ExchangeId,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockExecution {
    fn default() -> Self {
        Self::new(ExchangeId::Mock)
    }
}

impl MockExecution {
    pub fn new(exchange: ExchangeId) -> Self {
        Self {
            exchange,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Replace the active [`FillBehaviour`].
    pub fn set_behaviour(&self, behaviour: FillBehaviour) {
        self.state.lock().behaviour = behaviour;
    }

    /// Delay every order placement response, eg/ to trigger caller-side deadlines.
    pub fn set_open_delay(&self, delay: Option<Duration>) {
        self.state.lock().open_delay = delay;
    }

    pub fn insert_symbol_info(&self, instrument: InstrumentNameExchange, info: SymbolInfo) {
        self.state.lock().symbol_info.insert(instrument, info);
    }

    pub fn set_balances(&self, balances: Vec<AssetBalance<AssetNameExchange>>) {
        self.state.lock().balances = balances;
    }

    /// All orders the venue has accepted, in placement order.
    pub fn placed_orders(&self) -> Vec<Order> {
        let state = self.state.lock();
        let mut orders = state.orders.values().cloned().collect::<Vec<_>>();
        orders.sort_by(|a, b| a.id.cmp(&b.id));
        orders
    }

    /// Overwrite the venue's view of an order, eg/ to simulate a late fill.
    pub fn overwrite_order(&self, order: Order) {
        self.state.lock().orders.insert(order.id.clone(), order);
    }
}

#[async_trait]
impl ExecutionClient for MockExecution {
    fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    async fn fetch_symbol_info(
        &self,
        instrument: &MarketDataInstrument,
    ) -> Result<SymbolInfo, UnindexedClientError> {
        let name = InstrumentNameExchange::from(
            format!("{}_{}", instrument.base, instrument.quote).to_uppercase(),
        );

        self.state
            .lock()
            .symbol_info
            .get(&name)
            .cloned()
            .ok_or_else(|| {
                ClientError::Api(ApiError::InstrumentInvalid(
                    name,
                    "not configured on MockExecution".to_string(),
                ))
            })
    }

    async fn open_order(&self, request: OpenOrderRequest) -> Result<Order, UnindexedClientError> {
        let delay = self.state.lock().open_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();

        if let FillBehaviour::Reject(reason) = &state.behaviour {
            return Err(ClientError::Api(ApiError::OrderRejected(reason.clone())));
        }

        state.next_order_id += 1;
        let id = OrderId::from(format_smolstr!("mock-{}", state.next_order_id).as_str());

        let (status, filled_quantity) = match &state.behaviour {
            FillBehaviour::FillImmediately => (OrderStatus::Filled, request.quantity),
            FillBehaviour::PartialThenCancel { fill_quantity } => {
                (OrderStatus::Canceled, (*fill_quantity).min(request.quantity))
            }
            FillBehaviour::RemainOpen => (OrderStatus::New, Decimal::ZERO),
            FillBehaviour::Reject(_) => unreachable!("handled above"),
        };

        let order = Order {
            id: id.clone(),
            client_order_id: request.client_order_id,
            instrument: request.instrument,
            side: request.side,
            kind: request.kind,
            price: request.price,
            quantity: request.quantity,
            filled_quantity,
            status,
            time_in_force: request.time_in_force,
            time_exchange: Utc::now(),
            fee: None,
        };

        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn cancel_order(
        &self,
        request: CancelOrderRequest,
    ) -> Result<Order, UnindexedClientError> {
        let mut state = self.state.lock();

        let order = state
            .orders
            .get_mut(&request.id)
            .ok_or(ClientError::Api(ApiError::OrderNotFound))?;

        if !order.status.is_terminal() {
            order.status = OrderStatus::Canceled;
        }
        Ok(order.clone())
    }

    async fn fetch_order(
        &self,
        _instrument: &InstrumentNameExchange,
        id: &OrderId,
    ) -> Result<Order, UnindexedClientError> {
        self.state
            .lock()
            .orders
            .get(id)
            .cloned()
            .ok_or(ClientError::Api(ApiError::OrderNotFound))
    }

    async fn fetch_open_orders(
        &self,
        instrument: Option<&InstrumentNameExchange>,
    ) -> Result<Vec<Order>, UnindexedClientError> {
        Ok(self
            .state
            .lock()
            .orders
            .values()
            .filter(|order| !order.status.is_terminal())
            .filter(|order| instrument.is_none_or(|instrument| &order.instrument == instrument))
            .cloned()
            .collect())
    }

    async fn fetch_balances(
        &self,
    ) -> Result<Vec<AssetBalance<AssetNameExchange>>, UnindexedClientError> {
        Ok(self.state.lock().balances.clone())
    }
}
