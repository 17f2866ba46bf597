use basis_execution::{
    client::ExecutionClient,
    error::{ClientError, ConnectivityError, UnindexedClientError},
    order::{
        Order,
        request::{CancelOrderRequest, OpenOrderRequest},
    },
};
use basis_instrument::{
    exchange::{ExchangeId, ExchangeRole},
    instrument::SymbolInfo,
};
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{info, warn};

/// Small precision buffer applied when raising a quantity to the venue minimum, protecting
/// against boundary rejections from price movement between sizing and submission.
const MIN_QUANTITY_EPSILON_PCT: &str = "0.001";

/// Default per-submission deadline for parallel order placement.
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(3);

/// A venue attached to the manager, playing one [`ExchangeRole`] of the delta-neutral pair.
#[derive(Debug, Clone)]
pub struct ExchangeHandle {
    pub exchange: ExchangeId,
    pub client: Arc<dyn ExecutionClient>,
    pub symbol_info: SymbolInfo,
}

/// Uniform trading surface over N venues: parallel order placement with per-submission
/// deadlines, broadcast cancellation, and quantity normalisation against venue rules.
#[derive(Debug)]
pub struct ExchangeManager {
    exchanges: HashMap<ExchangeRole, ExchangeHandle>,
    submission_timeout: Duration,
}

impl ExchangeManager {
    pub fn new(exchanges: HashMap<ExchangeRole, ExchangeHandle>) -> Self {
        Self {
            exchanges,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    /// Handle for the venue playing the provided [`ExchangeRole`].
    pub fn get_exchange(&self, role: ExchangeRole) -> Option<&ExchangeHandle> {
        self.exchanges.get(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = ExchangeRole> + '_ {
        self.exchanges.keys().copied()
    }

    /// Round a base quantity to the venue's contract lot size.
    pub fn round_base_to_contracts(&self, role: ExchangeRole, quantity: Decimal) -> Decimal {
        match self.exchanges.get(&role) {
            Some(handle) => handle.symbol_info.round_to_contracts(quantity),
            None => quantity,
        }
    }

    /// Normalise an order quantity against the venue trading rules.
    ///
    /// 1. Raise to the minimum quote notional (plus a small precision buffer) if below it.
    /// 2. Round futures venues down to a whole number of contracts.
    pub fn prepare_order_quantity(
        &self,
        role: ExchangeRole,
        price: Decimal,
        quantity: Decimal,
    ) -> Decimal {
        let Some(handle) = self.exchanges.get(&role) else {
            return quantity;
        };
        let info = &handle.symbol_info;

        let epsilon: Decimal = MIN_QUANTITY_EPSILON_PCT.parse().unwrap_or(Decimal::ZERO);

        let mut quantity = quantity;
        if price > Decimal::ZERO {
            let min_base_for_quote = info.min_quote_quantity / price;
            if quantity < min_base_for_quote {
                quantity = min_base_for_quote * (Decimal::ONE + epsilon);
            }
        }
        if quantity < info.min_base_quantity {
            quantity = info.min_base_quantity;
        }

        info.round_to_contracts(quantity)
    }

    /// Normalise both legs of a delta-neutral pair and force them to agree.
    ///
    /// If the legs diverge after venue normalisation, both are raised to the larger leg and
    /// re-rounded, keeping `|spot_qty - futures_qty|` within one contract of the coarser
    /// venue.
    pub fn prepare_leg_quantities(
        &self,
        price: Decimal,
        quantity: Decimal,
        role_a: ExchangeRole,
        role_b: ExchangeRole,
    ) -> (Decimal, Decimal) {
        let leg_a = self.prepare_order_quantity(role_a, price, quantity);
        let leg_b = self.prepare_order_quantity(role_b, price, quantity);

        if leg_a == leg_b {
            return (leg_a, leg_b);
        }

        let target = leg_a.max(leg_b);
        (
            self.round_base_to_contracts(role_a, target),
            self.round_base_to_contracts(role_b, target),
        )
    }

    /// Launch one order submission per requested role concurrently, collecting results with
    /// a per-submission deadline.
    ///
    /// The returned map always contains an entry per requested role; failed submissions
    /// carry their rejection reason, deadline expiries carry
    /// [`ConnectivityError::Timeout`]. There is no inter-leg ordering guarantee at the
    /// venues - callers must tolerate either leg arriving first.
    pub async fn place_orders_parallel(
        &self,
        requests: HashMap<ExchangeRole, OpenOrderRequest>,
    ) -> HashMap<ExchangeRole, Result<Order, UnindexedClientError>> {
        let submissions = requests.into_iter().map(|(role, request)| {
            let handle = self.exchanges.get(&role).cloned();
            let timeout = self.submission_timeout;

            async move {
                let Some(handle) = handle else {
                    return (
                        role,
                        Err(UnindexedClientError::Connectivity(
                            ConnectivityError::Socket(format!(
                                "no venue attached for role: {role}"
                            )),
                        )),
                    );
                };

                let result = match tokio::time::timeout(
                    timeout,
                    handle.client.open_order(request),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::Connectivity(ConnectivityError::Timeout)),
                };

                (role, result)
            }
        });

        futures::future::join_all(submissions).await.into_iter().collect()
    }

    /// Broadcast cancel of all working orders, best effort.
    pub async fn cancel_all_orders(&self) {
        for (role, handle) in &self.exchanges {
            let open_orders = match handle.client.fetch_open_orders(None).await {
                Ok(orders) => orders,
                Err(error) => {
                    // Venue-wide queries are unsupported on some venues; fall back to the
                    // configured instrument
                    match handle
                        .client
                        .fetch_open_orders(Some(&handle.symbol_info.name_exchange))
                        .await
                    {
                        Ok(orders) => orders,
                        Err(fallback_error) => {
                            warn!(
                                %role,
                                ?error,
                                ?fallback_error,
                                "failed to fetch open orders during cancel_all_orders"
                            );
                            continue;
                        }
                    }
                }
            };

            for order in open_orders {
                let request = CancelOrderRequest {
                    instrument: order.instrument.clone(),
                    id: order.id.clone(),
                };
                if let Err(error) = handle.client.cancel_order(request).await {
                    warn!(%role, id = %order.id, ?error, "failed to cancel order");
                }
            }

            info!(%role, "cancelled all working orders");
        }
    }

    /// Fetch the venue's current view of an order and compute the incremental fill since
    /// the previously observed view.
    ///
    /// Returns `(updated_order, fill_delta)` where a positive delta advances the strategy's
    /// position state at the order's price.
    pub async fn poll_order_fill(
        &self,
        role: ExchangeRole,
        previous: &Order,
    ) -> Result<(Order, Decimal), UnindexedClientError> {
        let handle = self.exchanges.get(&role).ok_or_else(|| {
            UnindexedClientError::Connectivity(ConnectivityError::Socket(format!(
                "no venue attached for role: {role}"
            )))
        })?;

        let updated = handle
            .client
            .fetch_order(&previous.instrument, &previous.id)
            .await?;

        let fill_delta = (updated.filled_quantity - previous.filled_quantity).max(Decimal::ZERO);
        Ok((updated, fill_delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_execution::{
        client::mock::{FillBehaviour, MockExecution},
        order::{OrderKind, OrderStatus, TimeInForce},
    };
    use basis_instrument::{Side, instrument::name::InstrumentNameExchange};
    use rust_decimal_macros::dec;

    fn symbol_info(contract_size: Option<Decimal>) -> SymbolInfo {
        SymbolInfo {
            name_exchange: InstrumentNameExchange::from("BTC_USDT"),
            base_precision: 4,
            quote_precision: 2,
            min_base_quantity: dec!(0.0001),
            min_quote_quantity: dec!(5),
            maker_fee: dec!(0.0002),
            taker_fee: dec!(0.0005),
            contract_size,
            inactive: false,
        }
    }

    fn manager_with_mocks() -> (ExchangeManager, Arc<MockExecution>, Arc<MockExecution>) {
        let spot_venue = Arc::new(MockExecution::new(ExchangeId::MexcSpot));
        let futures_venue = Arc::new(MockExecution::new(ExchangeId::GateioPerpetualsUsd));

        let exchanges = HashMap::from([
            (
                ExchangeRole::Spot,
                ExchangeHandle {
                    exchange: ExchangeId::MexcSpot,
                    client: spot_venue.clone() as Arc<dyn ExecutionClient>,
                    symbol_info: symbol_info(None),
                },
            ),
            (
                ExchangeRole::Futures,
                ExchangeHandle {
                    exchange: ExchangeId::GateioPerpetualsUsd,
                    client: futures_venue.clone() as Arc<dyn ExecutionClient>,
                    symbol_info: symbol_info(Some(dec!(0.01))),
                },
            ),
        ]);

        (
            ExchangeManager::new(exchanges),
            spot_venue,
            futures_venue,
        )
    }

    fn open_request(quantity: Decimal) -> OpenOrderRequest {
        OpenOrderRequest {
            instrument: InstrumentNameExchange::from("BTC_USDT"),
            side: Side::Buy,
            price: dec!(100),
            quantity,
            kind: OrderKind::Limit,
            time_in_force: TimeInForce::GoodUntilCancelled,
            client_order_id: None,
        }
    }

    #[test]
    fn test_prepare_order_quantity() {
        struct TestCase {
            role: ExchangeRole,
            price: Decimal,
            quantity: Decimal,
            expected: Decimal,
        }

        let (manager, _, _) = manager_with_mocks();

        let tests = vec![
            TestCase {
                // TC0: above minimums, spot truncated to base precision
                role: ExchangeRole::Spot,
                price: dec!(100),
                quantity: dec!(1.23456),
                expected: dec!(1.2345),
            },
            TestCase {
                // TC1: below minimum notional is raised (5/100 = 0.05 plus buffer)
                role: ExchangeRole::Spot,
                price: dec!(100),
                quantity: dec!(0.01),
                expected: dec!(0.0500),
            },
            TestCase {
                // TC2: futures rounded down to whole contracts
                role: ExchangeRole::Futures,
                price: dec!(100),
                quantity: dec!(1.2345),
                expected: dec!(1.23),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(
                manager.prepare_order_quantity(test.role, test.price, test.quantity),
                test.expected,
                "TC{index} failed"
            );
        }
    }

    #[test]
    fn test_prepare_leg_quantities_agree_within_contract_size() {
        let (manager, _, _) = manager_with_mocks();

        let (spot, futures) = manager.prepare_leg_quantities(
            dec!(100),
            dec!(1.2345),
            ExchangeRole::Spot,
            ExchangeRole::Futures,
        );

        // Futures leg rounds down to 1.23; both legs raised to the max then re-rounded
        assert_eq!(futures, dec!(1.23));
        assert!((spot - futures).abs() <= dec!(0.01));
    }

    #[tokio::test]
    async fn test_place_orders_parallel_returns_entry_per_role() {
        let (manager, _, futures_venue) = manager_with_mocks();
        futures_venue.set_behaviour(FillBehaviour::Reject("insufficient margin".to_string()));

        let requests = HashMap::from([
            (ExchangeRole::Spot, open_request(dec!(1))),
            (ExchangeRole::Futures, open_request(dec!(1))),
        ]);

        let results = manager.place_orders_parallel(requests).await;

        assert_eq!(results.len(), 2);
        assert!(results[&ExchangeRole::Spot].is_ok());
        assert!(results[&ExchangeRole::Futures].is_err());
    }

    #[tokio::test]
    async fn test_place_orders_parallel_timeout_surfaces_as_connectivity() {
        let (manager, spot_venue, _) = manager_with_mocks();
        let manager = manager.with_submission_timeout(Duration::from_millis(50));
        spot_venue.set_open_delay(Some(Duration::from_millis(200)));

        let requests = HashMap::from([(ExchangeRole::Spot, open_request(dec!(1)))]);
        let results = manager.place_orders_parallel(requests).await;

        assert!(matches!(
            results[&ExchangeRole::Spot],
            Err(ClientError::Connectivity(ConnectivityError::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_poll_order_fill_computes_delta() {
        let (manager, spot_venue, _) = manager_with_mocks();
        spot_venue.set_behaviour(FillBehaviour::RemainOpen);

        let placed = spot_venue.open_order(open_request(dec!(5))).await.unwrap();

        // Simulate the venue filling 3 of 5
        let mut venue_view = placed.clone();
        venue_view.filled_quantity = dec!(3);
        venue_view.status = OrderStatus::PartiallyFilled;
        spot_venue.overwrite_order(venue_view);

        let (updated, fill_delta) = manager
            .poll_order_fill(ExchangeRole::Spot, &placed)
            .await
            .unwrap();

        assert_eq!(fill_delta, dec!(3));
        assert_eq!(updated.status, OrderStatus::PartiallyFilled);
    }
}
