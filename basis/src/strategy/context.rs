use crate::{detector::opportunity::ArbitrageOpportunity, strategy::position::PositionsState};
use basis_execution::order::{Order, id::OrderId};
use basis_instrument::{
    exchange::{ExchangeId, ExchangeRole},
    instrument::MarketDataInstrument,
};
use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};
use std::collections::HashMap;

/// Current persisted context schema. Bump on breaking layout changes.
pub const CONTEXT_SCHEMA_VERSION: u32 = 1;

/// Deterministic strategy task identifier.
///
/// Derived by hashing `(strategy, instrument, venue pair)` so a restarted process finds the
/// same record for recovery.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub struct TaskId(pub SmolStr);

impl TaskId {
    pub fn deterministic(
        strategy: &str,
        instrument: &MarketDataInstrument,
        spot_exchange: ExchangeId,
        futures_exchange: ExchangeId,
    ) -> Self {
        // FNV-1a over the identity tuple - stable across restarts
        const FNV_OFFSET: u64 = 0xcbf29ce484222325;
        const FNV_PRIME: u64 = 0x100000001b3;

        let mut hash = FNV_OFFSET;
        for byte in strategy
            .bytes()
            .chain(instrument.to_string().bytes())
            .chain(spot_exchange.as_str().bytes())
            .chain(futures_exchange.as_str().bytes())
        {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }

        Self(format_smolstr!("{hash:016x}"))
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strategy task lifecycle state. Transitions are the only allowed state change.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum TaskState {
    /// Initial; waiting for start.
    Idle,
    /// Attaching to the exchange manager and validating venue trading rules.
    Initializing,
    /// Polling the detector, checking exit conditions, processing imbalance.
    Monitoring,
    /// Freshness and sanity check on the current opportunity.
    Analyzing,
    /// Submitting entry orders in parallel.
    Executing,
    /// Closing positions via opposite-side orders.
    Exiting,
    /// Operator hold; no scans, no submissions.
    Paused,
    /// Cancel all, cool down, reset the current opportunity.
    ErrorRecovery { since: DateTime<Utc> },
    /// Terminal.
    Completed,
    /// Terminal.
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled)
    }

    /// Short name used in logs and the persisted record.
    pub fn name(&self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::Initializing => "initializing",
            TaskState::Monitoring => "monitoring",
            TaskState::Analyzing => "analyzing",
            TaskState::Executing => "executing",
            TaskState::Exiting => "exiting",
            TaskState::Paused => "paused",
            TaskState::ErrorRecovery { .. } => "error_recovery",
            TaskState::Completed => "completed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

/// Serializable strategy task state.
///
/// Exclusively owned by the task's run loop; every mutation goes through
/// [`TaskContext::evolve`], which produces a new snapshot that is then persisted. Must
/// round-trip losslessly through the persistence layer for crash recovery.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskContext {
    pub schema_version: u32,
    pub task_id: TaskId,
    pub strategy: SmolStr,
    pub instrument: MarketDataInstrument,
    pub state: TaskState,
    pub active_orders: HashMap<ExchangeRole, HashMap<OrderId, Order>>,
    pub positions: PositionsState,
    pub current_opportunity: Option<ArbitrageOpportunity>,
    pub position_opened_at: Option<DateTime<Utc>>,
    pub total_volume_usdt: Decimal,
    pub consecutive_failures: u32,
}

impl TaskContext {
    pub fn new(
        strategy: &str,
        instrument: MarketDataInstrument,
        spot_exchange: ExchangeId,
        futures_exchange: ExchangeId,
    ) -> Self {
        Self {
            schema_version: CONTEXT_SCHEMA_VERSION,
            task_id: TaskId::deterministic(
                strategy,
                &instrument,
                spot_exchange,
                futures_exchange,
            ),
            strategy: SmolStr::new(strategy),
            instrument,
            state: TaskState::Idle,
            active_orders: HashMap::new(),
            positions: PositionsState::default(),
            current_opportunity: None,
            position_opened_at: None,
            total_volume_usdt: Decimal::ZERO,
            consecutive_failures: 0,
        }
    }

    /// Produce a new snapshot with the provided mutation applied.
    pub fn evolve<Op>(&self, op: Op) -> Self
    where
        Op: FnOnce(&mut Self),
    {
        let mut next = self.clone();
        op(&mut next);
        next
    }

    /// Produce a new snapshot in the provided state.
    pub fn transition(&self, state: TaskState) -> Self {
        self.evolve(|context| context.state = state)
    }

    /// Active (non-terminal) orders for the provided role.
    pub fn active_orders_for(&self, role: ExchangeRole) -> impl Iterator<Item = &Order> {
        self.active_orders
            .get(&role)
            .into_iter()
            .flat_map(|orders| orders.values())
    }

    /// Insert or replace the tracked view of an order.
    pub fn upsert_order(&mut self, role: ExchangeRole, order: Order) {
        self.active_orders
            .entry(role)
            .or_default()
            .insert(order.id.clone(), order);
    }

    /// Drop an order from the active table, eg/ once terminal.
    pub fn remove_order(&mut self, role: ExchangeRole, id: &OrderId) {
        if let Some(orders) = self.active_orders.get_mut(&role) {
            orders.remove(id);
        }
    }

    /// Hours the current position has been held.
    pub fn hours_held(&self, now: DateTime<Utc>) -> Option<f64> {
        self.position_opened_at
            .map(|opened| (now - opened).num_milliseconds() as f64 / 3_600_000.0)
    }
}
