use self::{
    context::{TaskContext, TaskState},
    imbalance::imbalance_correction,
    pnl::exit_net_pnl_pct,
};
use crate::{
    config::{ArbitrageConfig, StrategyConfig},
    detector::opportunity::ArbitrageOpportunity,
    manager::ExchangeManager,
    persistence::ContextRepository,
};
use basis_data::aggregator::{MarketDataCache, MarketKey};
use basis_instrument::{
    Side,
    exchange::{ExchangeId, ExchangeRole},
    instrument::MarketDataInstrument,
};
use basis_execution::order::{
    Order, OrderKind, TimeInForce,
    request::{CancelOrderRequest, OpenOrderRequest},
};
use chrono::Utc;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Serializable strategy task state and deterministic identifiers.
pub mod context;

/// Imbalance correction intents.
pub mod imbalance;

/// Exit decision P&L math.
pub mod pnl;

/// Per-exchange position snapshots and the delta invariant.
pub mod position;

/// Operator commands delivered to a running [`StrategyTask`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TaskCommand {
    Pause,
    Resume,
    Cancel,
}

/// Drives a single arbitrage strategy instance through its lifecycle.
///
/// The main loop is a single-task cooperative scheduler: each tick runs exactly one state
/// handler, persists the context snapshot if it changed, then sleeps the tick delay.
/// Shutdown and operator commands are observed between ticks.
#[derive(Debug)]
pub struct StrategyTask {
    context: TaskContext,
    manager: Arc<ExchangeManager>,
    cache: Arc<MarketDataCache>,
    repository: Arc<dyn ContextRepository>,
    opportunity_rx: mpsc::Receiver<ArbitrageOpportunity>,
    command_rx: mpsc::Receiver<TaskCommand>,
    shutdown: watch::Receiver<bool>,
    strategy_config: StrategyConfig,
    arbitrage_config: ArbitrageConfig,
}

impl StrategyTask {
    pub fn new(
        context: TaskContext,
        manager: Arc<ExchangeManager>,
        cache: Arc<MarketDataCache>,
        repository: Arc<dyn ContextRepository>,
        opportunity_rx: mpsc::Receiver<ArbitrageOpportunity>,
        command_rx: mpsc::Receiver<TaskCommand>,
        shutdown: watch::Receiver<bool>,
        strategy_config: StrategyConfig,
        arbitrage_config: ArbitrageConfig,
    ) -> Self {
        Self {
            context,
            manager,
            cache,
            repository,
            opportunity_rx,
            command_rx,
            shutdown,
            strategy_config,
            arbitrage_config,
        }
    }

    /// Run the task until a terminal state or shutdown, returning the final context.
    pub async fn run(mut self) -> TaskContext {
        info!(
            task_id = %self.context.task_id,
            instrument = %self.context.instrument,
            state = self.context.state.name(),
            "StrategyTask running"
        );

        let tick = Duration::from_millis(self.strategy_config.tick_interval_ms);

        loop {
            if *self.shutdown.borrow() {
                self.handle_shutdown().await;
                break;
            }

            self.drain_commands().await;

            if self.context.state.is_terminal() {
                info!(
                    task_id = %self.context.task_id,
                    state = self.context.state.name(),
                    "StrategyTask reached terminal state"
                );
                break;
            }

            let next = self.step(self.context.clone()).await;
            if next != self.context {
                if next.state != self.context.state {
                    info!(
                        task_id = %next.task_id,
                        from = self.context.state.name(),
                        to = next.state.name(),
                        "state transition"
                    );
                }
                self.persist(&next).await;
                self.context = next;
            }

            tokio::time::sleep(tick).await;
        }

        self.context
    }

    /// Execute the handler for the current state, returning the evolved context.
    pub async fn step(&mut self, context: TaskContext) -> TaskContext {
        match &context.state {
            TaskState::Idle => context.transition(TaskState::Initializing),
            TaskState::Initializing => self.handle_initializing(context).await,
            TaskState::Monitoring => self.handle_monitoring(context).await,
            TaskState::Analyzing => self.handle_analyzing(context),
            TaskState::Executing => self.handle_executing(context).await,
            TaskState::Exiting => self.handle_exiting(context).await,
            TaskState::ErrorRecovery { since } => {
                let since = *since;
                self.handle_error_recovery(context, since).await
            }
            // Paused and terminal states hold until an external command
            TaskState::Paused | TaskState::Completed | TaskState::Cancelled => context,
        }
    }

    async fn handle_initializing(&self, context: TaskContext) -> TaskContext {
        for role in [ExchangeRole::Spot, ExchangeRole::Futures] {
            let Some(handle) = self.manager.get_exchange(role) else {
                error!(task_id = %context.task_id, %role, "no venue attached for role");
                return self.enter_error_recovery(context);
            };
            if handle.symbol_info.inactive {
                error!(
                    task_id = %context.task_id,
                    %role,
                    exchange = %handle.exchange,
                    "instrument inactive on venue"
                );
                return self.enter_error_recovery(context);
            }
        }

        context.transition(TaskState::Monitoring)
    }

    async fn handle_monitoring(&mut self, context: TaskContext) -> TaskContext {
        // Advance the local view of working orders and fold fills into positions
        let mut context = self.track_fills(context).await;

        let dust = self.dust_threshold();
        if context.positions.holds_position(dust) {
            // Imbalance correction: at most one corrective order per tick per venue
            context = self.correct_imbalance(context).await;

            if self.should_exit(&context) {
                return context.transition(TaskState::Exiting);
            }
            return context;
        }

        // Flat: poll the detector for the most recent opportunity
        let mut latest = None;
        while let Ok(opportunity) = self.opportunity_rx.try_recv() {
            latest = Some(opportunity);
        }

        match latest {
            Some(opportunity) => context
                .evolve(|context| context.current_opportunity = Some(opportunity))
                .transition(TaskState::Analyzing),
            None => context,
        }
    }

    fn handle_analyzing(&self, context: TaskContext) -> TaskContext {
        let Some(opportunity) = &context.current_opportunity else {
            return context.transition(TaskState::Monitoring);
        };

        let now = Utc::now();
        let fresh = opportunity.is_fresh(now, self.arbitrage_config.freshness_horizon_ms);
        let sane = opportunity.margin_bps
            >= self.arbitrage_config.risk_limits.min_profit_margin_bps
            && opportunity.margin_bps <= self.arbitrage_config.risk_limits.max_spread_bps
            && opportunity.max_quantity > 0.0;

        if fresh && sane {
            context.transition(TaskState::Executing)
        } else {
            debug!(task_id = %context.task_id, fresh, sane, "discarding opportunity");
            context
                .evolve(|context| context.current_opportunity = None)
                .transition(TaskState::Monitoring)
        }
    }

    async fn handle_executing(&self, context: TaskContext) -> TaskContext {
        let Some(opportunity) = context.current_opportunity.clone() else {
            return context.transition(TaskState::Monitoring);
        };

        let Some(requests) = self.build_entry_requests(&opportunity) else {
            // Opportunity references a venue pair this task does not trade - discard
            debug!(task_id = %context.task_id, "opportunity not actionable for attached venues");
            return context
                .evolve(|context| context.current_opportunity = None)
                .transition(TaskState::Monitoring);
        };

        let results = self.manager.place_orders_parallel(requests).await;

        let mut context = context.evolve(|context| context.current_opportunity = None);
        let mut successes: Vec<(ExchangeRole, Order)> = Vec::new();
        let mut failures = 0usize;

        for (role, result) in results {
            match result {
                Ok(order) => successes.push((role, order)),
                Err(error) => {
                    warn!(task_id = %context.task_id, %role, ?error, "entry leg failed");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            // Cancel any successful leg immediately to avoid unhedged exposure. Fills that
            // landed before the cancel are folded into positions so the imbalance
            // correction can unwind them.
            for (role, order) in successes {
                let final_view = if order.is_terminal() {
                    order
                } else {
                    let request = CancelOrderRequest {
                        instrument: order.instrument.clone(),
                        id: order.id.clone(),
                    };
                    match self.manager.get_exchange(role) {
                        Some(handle) => match handle.client.cancel_order(request).await {
                            Ok(cancelled) => cancelled,
                            Err(error) => {
                                error!(
                                    task_id = %context.task_id,
                                    %role,
                                    ?error,
                                    "failed to cancel surviving entry leg"
                                );
                                order
                            }
                        },
                        None => order,
                    }
                };

                if final_view.filled_quantity > Decimal::ZERO {
                    context = context.evolve(|context| {
                        context.positions.apply_fill(
                            role,
                            final_view.side,
                            final_view.filled_quantity,
                            final_view.price,
                        );
                        record_volume(context, role, &final_view, final_view.filled_quantity);
                        context.position_opened_at.get_or_insert(Utc::now());
                    });
                }
            }

            context = context.evolve(|context| context.consecutive_failures += 1);
            return self.enter_error_recovery(context);
        }

        // Both legs accepted: track orders and fold any immediate fills
        let now = Utc::now();
        context = context.evolve(|context| {
            for (role, order) in successes {
                if order.filled_quantity > Decimal::ZERO {
                    context.positions.apply_fill(
                        role,
                        order.side,
                        order.filled_quantity,
                        order.price,
                    );
                    record_volume(context, role, &order, order.filled_quantity);
                }
                if !order.is_terminal() {
                    context.upsert_order(role, order);
                }
            }
            context.position_opened_at.get_or_insert(now);
            context.consecutive_failures = 0;
        });

        context.transition(TaskState::Monitoring)
    }

    async fn handle_exiting(&self, context: TaskContext) -> TaskContext {
        let dust = self.dust_threshold();
        let mut requests = HashMap::new();

        for role in [ExchangeRole::Spot, ExchangeRole::Futures] {
            let Some(entry) = context.positions.entry(role) else {
                continue;
            };
            if entry.quantity <= dust {
                continue;
            }
            let Some(handle) = self.manager.get_exchange(role) else {
                continue;
            };

            let Some(ticker) = self.ticker(handle.exchange) else {
                warn!(task_id = %context.task_id, %role, "no ticker available for exit");
                continue;
            };

            let exit_side = entry.side.inverse();
            let price_f64 = match exit_side {
                Side::Sell => ticker.bid_price,
                Side::Buy => ticker.ask_price,
            };
            let Some(price) = Decimal::from_f64(price_f64) else {
                continue;
            };

            let quantity = self.manager.prepare_order_quantity(role, price, entry.quantity);
            if quantity.is_zero() {
                // Residual below the venue minimum: leave it and log
                warn!(
                    task_id = %context.task_id,
                    %role,
                    residual = %entry.quantity,
                    "residual position below venue minimum - leaving"
                );
                continue;
            }

            requests.insert(
                role,
                OpenOrderRequest {
                    instrument: handle.symbol_info.name_exchange.clone(),
                    side: exit_side,
                    price,
                    quantity,
                    kind: OrderKind::Limit,
                    time_in_force: TimeInForce::ImmediateOrCancel,
                    client_order_id: None,
                },
            );
        }

        if requests.is_empty() {
            // Nothing left to unwind
            return context
                .evolve(|context| context.position_opened_at = None)
                .transition(TaskState::Monitoring);
        }

        let results = self.manager.place_orders_parallel(requests).await;

        let context = context.evolve(|context| {
            for (role, result) in results {
                match result {
                    Ok(order) => {
                        if order.filled_quantity > Decimal::ZERO {
                            context.positions.apply_fill(
                                role,
                                order.side,
                                order.filled_quantity,
                                order.price,
                            );
                            record_volume(context, role, &order, order.filled_quantity);
                        }
                        if !order.is_terminal() {
                            context.upsert_order(role, order);
                        }
                    }
                    Err(error) => {
                        // Exit is retried at the next tick while positions remain
                        warn!(task_id = %context.task_id, %role, ?error, "exit leg failed");
                    }
                }
            }

            if !context.positions.holds_position(Decimal::ZERO) {
                context.position_opened_at = None;
            }
        });

        context.transition(TaskState::Monitoring)
    }

    async fn handle_error_recovery(
        &self,
        context: TaskContext,
        since: chrono::DateTime<Utc>,
    ) -> TaskContext {
        if context.consecutive_failures >= self.strategy_config.max_consecutive_failures {
            error!(
                task_id = %context.task_id,
                failures = context.consecutive_failures,
                "persistent failures - pausing strategy and surfacing alert"
            );
            return context.transition(TaskState::Paused);
        }

        let cooldown = Duration::from_millis(self.strategy_config.recovery_cooldown_ms);
        if (Utc::now() - since).to_std().unwrap_or_default() < cooldown {
            return context;
        }

        self.manager.cancel_all_orders().await;

        context
            .evolve(|context| {
                context.current_opportunity = None;
                context.active_orders.clear();
            })
            .transition(TaskState::Monitoring)
    }

    async fn handle_shutdown(&mut self) {
        info!(task_id = %self.context.task_id, "shutdown signalled - cancelling in-flight orders");
        self.manager.cancel_all_orders().await;

        let final_context = self.context.evolve(|context| {
            context.active_orders.clear();
        });
        self.persist(&final_context).await;
        self.context = final_context;
    }

    async fn drain_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            info!(task_id = %self.context.task_id, ?command, "operator command received");
            let next = match (command, &self.context.state) {
                (TaskCommand::Pause, state) if !state.is_terminal() => {
                    Some(self.context.transition(TaskState::Paused))
                }
                (TaskCommand::Resume, TaskState::Paused) => Some(
                    self.context
                        .evolve(|context| context.consecutive_failures = 0)
                        .transition(TaskState::Monitoring),
                ),
                (TaskCommand::Cancel, state) if !state.is_terminal() => {
                    self.manager.cancel_all_orders().await;
                    Some(self.context.transition(TaskState::Cancelled))
                }
                _ => None,
            };

            if let Some(next) = next {
                self.persist(&next).await;
                self.context = next;
            }
        }
    }

    /// Poll the venues for fill progress on every tracked order.
    async fn track_fills(&self, context: TaskContext) -> TaskContext {
        let tracked: Vec<(ExchangeRole, Order)> = context
            .active_orders
            .iter()
            .flat_map(|(role, orders)| {
                orders.values().cloned().map(move |order| (*role, order))
            })
            .collect();

        if tracked.is_empty() {
            return context;
        }

        let mut context = context;
        for (role, previous) in tracked {
            match self.manager.poll_order_fill(role, &previous).await {
                Ok((updated, fill_delta)) => {
                    context = context.evolve(|context| {
                        if fill_delta > Decimal::ZERO {
                            context.positions.apply_fill(
                                role,
                                updated.side,
                                fill_delta,
                                updated.price,
                            );
                            record_volume(context, role, &updated, fill_delta);
                        }
                        if updated.is_terminal() {
                            context.remove_order(role, &updated.id);
                        } else {
                            context.upsert_order(role, updated);
                        }
                    });
                }
                Err(error) => {
                    warn!(
                        task_id = %context.task_id,
                        %role,
                        id = %previous.id,
                        ?error,
                        "failed to poll order fill"
                    );
                }
            }
        }

        context
    }

    async fn correct_imbalance(&self, context: TaskContext) -> TaskContext {
        let Some(mark_price) = self.spot_mark_price() else {
            return context;
        };

        let min_quote = self
            .manager
            .get_exchange(ExchangeRole::Spot)
            .map(|handle| handle.symbol_info.min_quote_quantity)
            .unwrap_or(Decimal::ZERO);

        let Some(intent) = imbalance_correction(&context.positions, mark_price, min_quote) else {
            return context;
        };

        let Some(handle) = self.manager.get_exchange(intent.role) else {
            return context;
        };
        let Some(ticker) = self.ticker(handle.exchange) else {
            return context;
        };

        let price_f64 = match intent.side {
            Side::Sell => ticker.bid_price,
            Side::Buy => ticker.ask_price,
        };
        let Some(price) = Decimal::from_f64(price_f64) else {
            return context;
        };

        let quantity = self
            .manager
            .prepare_order_quantity(intent.role, price, intent.quantity);
        if quantity.is_zero() {
            return context;
        }

        info!(
            task_id = %context.task_id,
            role = %intent.role,
            side = %intent.side,
            %quantity,
            "submitting imbalance correction"
        );

        let request = OpenOrderRequest {
            instrument: handle.symbol_info.name_exchange.clone(),
            side: intent.side,
            price,
            quantity,
            kind: OrderKind::Limit,
            time_in_force: TimeInForce::ImmediateOrCancel,
            client_order_id: None,
        };

        match handle.client.open_order(request).await {
            Ok(order) => context.evolve(|context| {
                if order.filled_quantity > Decimal::ZERO {
                    context.positions.apply_fill(
                        intent.role,
                        order.side,
                        order.filled_quantity,
                        order.price,
                    );
                    record_volume(context, intent.role, &order, order.filled_quantity);
                }
                if !order.is_terminal() {
                    context.upsert_order(intent.role, order);
                }
            }),
            Err(error) => {
                warn!(task_id = %context.task_id, ?error, "imbalance correction failed");
                context
            }
        }
    }

    /// Exit decision: take profit, stop loss, or position timeout.
    fn should_exit(&self, context: &TaskContext) -> bool {
        // Timeout applies regardless of quote availability
        if let Some(hours_held) = context.hours_held(Utc::now()) {
            if hours_held >= self.strategy_config.max_hours {
                info!(task_id = %context.task_id, hours_held, "position timeout - exiting");
                return true;
            }
        }

        let (Some(spot_entry), Some(futures_entry)) = (
            context.positions.entry(ExchangeRole::Spot),
            context.positions.entry(ExchangeRole::Futures),
        ) else {
            return false;
        };

        let (Some(spot_handle), Some(futures_handle)) = (
            self.manager.get_exchange(ExchangeRole::Spot),
            self.manager.get_exchange(ExchangeRole::Futures),
        ) else {
            return false;
        };

        let (Some(spot_ticker), Some(futures_ticker)) = (
            self.ticker(spot_handle.exchange),
            self.ticker(futures_handle.exchange),
        ) else {
            return false;
        };

        let (Some(spot_bid), Some(futures_ask)) = (
            Decimal::from_f64(spot_ticker.bid_price),
            Decimal::from_f64(futures_ticker.ask_price),
        ) else {
            return false;
        };

        let pnl_pct = exit_net_pnl_pct(
            spot_entry.avg_price,
            futures_entry.avg_price,
            spot_bid,
            futures_ask,
            spot_handle.symbol_info.taker_fee,
            futures_handle.symbol_info.taker_fee,
        );

        if pnl_pct >= self.strategy_config.min_profit_pct {
            info!(task_id = %context.task_id, %pnl_pct, "take profit - exiting");
            return true;
        }

        if let Some(stop_loss) = self.strategy_config.stop_loss_pct {
            if pnl_pct <= stop_loss {
                warn!(task_id = %context.task_id, %pnl_pct, "stop loss - exiting");
                return true;
            }
        }

        false
    }

    fn build_entry_requests(
        &self,
        opportunity: &ArbitrageOpportunity,
    ) -> Option<HashMap<ExchangeRole, OpenOrderRequest>> {
        let buy_role = self.role_of(opportunity.buy_exchange)?;
        let sell_role = self.role_of(opportunity.sell_exchange)?;

        let buy_price = Decimal::from_f64(opportunity.buy_price)?;
        let sell_price = Decimal::from_f64(opportunity.sell_price)?;

        // Bound the entry size by the detected executable quantity and the per-trade cap
        let cap_quantity =
            self.arbitrage_config.risk_limits.max_position_size_usd / opportunity.buy_price;
        let quantity = Decimal::from_f64(opportunity.max_quantity.min(cap_quantity))?;

        let (buy_quantity, sell_quantity) =
            self.manager
                .prepare_leg_quantities(buy_price, quantity, buy_role, sell_role);
        if buy_quantity.is_zero() || sell_quantity.is_zero() {
            return None;
        }

        let buy_handle = self.manager.get_exchange(buy_role)?;
        let sell_handle = self.manager.get_exchange(sell_role)?;

        Some(HashMap::from([
            (
                buy_role,
                OpenOrderRequest {
                    instrument: buy_handle.symbol_info.name_exchange.clone(),
                    side: Side::Buy,
                    price: buy_price,
                    quantity: buy_quantity,
                    kind: OrderKind::Limit,
                    time_in_force: TimeInForce::ImmediateOrCancel,
                    client_order_id: None,
                },
            ),
            (
                sell_role,
                OpenOrderRequest {
                    instrument: sell_handle.symbol_info.name_exchange.clone(),
                    side: Side::Sell,
                    price: sell_price,
                    quantity: sell_quantity,
                    kind: OrderKind::Limit,
                    time_in_force: TimeInForce::ImmediateOrCancel,
                    client_order_id: None,
                },
            ),
        ]))
    }

    fn enter_error_recovery(&self, context: TaskContext) -> TaskContext {
        context.transition(TaskState::ErrorRecovery { since: Utc::now() })
    }

    fn role_of(&self, exchange: ExchangeId) -> Option<ExchangeRole> {
        self.manager
            .roles()
            .find(|role| {
                self.manager
                    .get_exchange(*role)
                    .is_some_and(|handle| handle.exchange == exchange)
            })
    }

    fn ticker(&self, exchange: ExchangeId) -> Option<basis_data::subscription::book::BookTicker> {
        let key = MarketKey::new(
            exchange,
            MarketDataInstrument::new(
                self.context.instrument.base.clone(),
                self.context.instrument.quote.clone(),
                exchange.market_kind(),
            ),
        );
        self.cache.ticker(&key).map(|record| record.ticker)
    }

    fn spot_mark_price(&self) -> Option<Decimal> {
        let handle = self.manager.get_exchange(ExchangeRole::Spot)?;
        let ticker = self.ticker(handle.exchange)?;
        Decimal::from_f64(ticker.mid_price())
    }

    fn dust_threshold(&self) -> Decimal {
        self.manager
            .get_exchange(ExchangeRole::Spot)
            .map(|handle| handle.symbol_info.min_base_quantity)
            .unwrap_or(Decimal::ZERO)
    }

    async fn persist(&self, context: &TaskContext) {
        if let Err(error) = self.repository.persist(context).await {
            error!(task_id = %context.task_id, ?error, "failed to persist TaskContext");
        }
    }
}

/// Accumulate headline volume: the notional of spot-leg buys (position entries).
fn record_volume(
    context: &mut TaskContext,
    role: ExchangeRole,
    order: &Order,
    fill_delta: Decimal,
) {
    if role == ExchangeRole::Spot && order.side == Side::Buy {
        context.total_volume_usdt += fill_delta * order.price;
    }
}
