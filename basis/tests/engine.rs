//! End-to-end strategy runtime scenarios driven against mock venues.

use basis::{
    config::{ArbitrageConfig, InstrumentConfig, RiskLimits, StrategyConfig},
    detector::opportunity::{ArbitrageOpportunity, OpportunityDirection},
    manager::{ExchangeHandle, ExchangeManager},
    persistence::{ContextRepository, FileContextRepository},
    strategy::{
        StrategyTask, TaskCommand,
        context::{TaskContext, TaskState},
    },
};
use basis_data::{
    aggregator::{MarketDataCache, MarketKey},
    subscription::book::BookTicker,
};
use basis_execution::client::{
    ExecutionClient,
    mock::{FillBehaviour, MockExecution},
};
use basis_instrument::{
    exchange::{ExchangeId, ExchangeRole},
    instrument::{MarketDataInstrument, SymbolInfo, kind::MarketDataInstrumentKind, name::InstrumentNameExchange},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{mpsc, watch};

struct Harness {
    task: StrategyTask,
    cache: Arc<MarketDataCache>,
    spot: Arc<MockExecution>,
    futures: Arc<MockExecution>,
    opportunity_tx: mpsc::Sender<ArbitrageOpportunity>,
    #[allow(dead_code)]
    command_tx: mpsc::Sender<TaskCommand>,
    #[allow(dead_code)]
    shutdown_tx: watch::Sender<bool>,
    context: TaskContext,
}

fn instrument() -> MarketDataInstrument {
    ("btc", "usdt", MarketDataInstrumentKind::Spot).into()
}

fn spot_symbol_info() -> SymbolInfo {
    SymbolInfo {
        name_exchange: InstrumentNameExchange::from("BTCUSDT"),
        base_precision: 4,
        quote_precision: 2,
        min_base_quantity: dec!(0.0001),
        min_quote_quantity: dec!(5),
        maker_fee: dec!(0.0002),
        taker_fee: dec!(0.0005),
        contract_size: None,
        inactive: false,
    }
}

fn futures_symbol_info() -> SymbolInfo {
    SymbolInfo {
        name_exchange: InstrumentNameExchange::from("BTC_USDT"),
        base_precision: 4,
        quote_precision: 2,
        min_base_quantity: dec!(0.01),
        min_quote_quantity: Decimal::ZERO,
        maker_fee: dec!(0.0002),
        taker_fee: dec!(0.0005),
        contract_size: Some(dec!(0.01)),
        inactive: false,
    }
}

fn strategy_config(max_consecutive_failures: u32) -> StrategyConfig {
    StrategyConfig {
        min_profit_pct: dec!(0.1),
        stop_loss_pct: None,
        max_hours: 24.0,
        tick_interval_ms: 1,
        recovery_cooldown_ms: 0,
        max_consecutive_failures,
    }
}

fn arbitrage_config() -> ArbitrageConfig {
    ArbitrageConfig {
        enabled_exchanges: vec![ExchangeId::MexcSpot, ExchangeId::GateioPerpetualsUsd],
        enabled_instruments: vec![InstrumentConfig {
            base: "btc".into(),
            quote: "usdt".into(),
        }],
        scan_interval_ms: 100,
        target_execution_time_ms: 100,
        freshness_horizon_ms: 500,
        risk_limits: RiskLimits {
            max_position_size_usd: 500.0,
            max_spread_bps: 500,
            min_market_depth_usd: 100.0,
            min_profit_margin_bps: 40,
        },
    }
}

fn ticker(bid: f64, ask: f64) -> BookTicker {
    BookTicker {
        time_exchange: Utc::now(),
        bid_price: bid,
        bid_amount: 10.0,
        ask_price: ask,
        ask_amount: 10.0,
        update_id: None,
    }
}

fn spot_key() -> MarketKey {
    MarketKey::new(ExchangeId::MexcSpot, instrument())
}

fn futures_key() -> MarketKey {
    MarketKey::new(
        ExchangeId::GateioPerpetualsUsd,
        ("btc", "usdt", MarketDataInstrumentKind::Perpetual).into(),
    )
}

fn opportunity() -> ArbitrageOpportunity {
    ArbitrageOpportunity {
        direction: OpportunityDirection::Enter,
        instrument: instrument(),
        buy_exchange: ExchangeId::MexcSpot,
        sell_exchange: ExchangeId::GateioPerpetualsUsd,
        buy_price: 100.0,
        sell_price: 100.8,
        max_quantity: 10.0,
        margin_bps: 69,
        detected_at: Utc::now(),
    }
}

fn harness(name: &str, max_consecutive_failures: u32) -> Harness {
    let spot = Arc::new(MockExecution::new(ExchangeId::MexcSpot));
    let futures = Arc::new(MockExecution::new(ExchangeId::GateioPerpetualsUsd));

    let manager = Arc::new(
        ExchangeManager::new(HashMap::from([
            (
                ExchangeRole::Spot,
                ExchangeHandle {
                    exchange: ExchangeId::MexcSpot,
                    client: spot.clone() as Arc<dyn ExecutionClient>,
                    symbol_info: spot_symbol_info(),
                },
            ),
            (
                ExchangeRole::Futures,
                ExchangeHandle {
                    exchange: ExchangeId::GateioPerpetualsUsd,
                    client: futures.clone() as Arc<dyn ExecutionClient>,
                    symbol_info: futures_symbol_info(),
                },
            ),
        ]))
        .with_submission_timeout(Duration::from_millis(100)),
    );

    let cache = Arc::new(MarketDataCache::new([spot_key(), futures_key()]));
    cache.publish_ticker(&spot_key(), ticker(99.9, 100.0));
    cache.publish_ticker(&futures_key(), ticker(100.8, 100.9));

    let state_dir =
        std::env::temp_dir().join(format!("basis-engine-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&state_dir);
    let repository = Arc::new(FileContextRepository::new(state_dir).unwrap());

    let context = TaskContext::new(
        "spot_futures_arbitrage",
        instrument(),
        ExchangeId::MexcSpot,
        ExchangeId::GateioPerpetualsUsd,
    );

    let (opportunity_tx, opportunity_rx) = mpsc::channel(8);
    let (command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = StrategyTask::new(
        context.clone(),
        manager,
        Arc::clone(&cache),
        repository as Arc<dyn ContextRepository>,
        opportunity_rx,
        command_rx,
        shutdown_rx,
        strategy_config(max_consecutive_failures),
        arbitrage_config(),
    );

    Harness {
        task,
        cache,
        spot,
        futures,
        opportunity_tx,
        command_tx,
        shutdown_tx,
        context,
    }
}

/// Drive Idle -> Initializing -> Monitoring.
async fn start(harness: &mut Harness) -> TaskContext {
    let context = harness.task.step(harness.context.clone()).await;
    assert_eq!(context.state, TaskState::Initializing);
    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Monitoring);
    context
}

#[tokio::test]
async fn test_happy_path_entry_and_profitable_exit() {
    let mut harness = harness("happy-path", 5);
    let context = start(&mut harness).await;

    // Detector emits a qualifying opportunity
    harness.opportunity_tx.send(opportunity()).await.unwrap();

    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Analyzing);

    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Executing);

    // Both legs fill in full: spot Buy 5 @ 100.00, futures Sell 5 @ 100.80
    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Monitoring);

    assert_eq!(
        context.positions.signed_quantity(ExchangeRole::Spot),
        dec!(5)
    );
    assert_eq!(
        context.positions.signed_quantity(ExchangeRole::Futures),
        dec!(-5)
    );
    assert_eq!(context.positions.delta(), Decimal::ZERO);
    assert_eq!(context.total_volume_usdt, dec!(500));

    // Later: spot bid rallies to 100.50, futures ask drops to 100.20 - net P&L clears
    // the 0.1% take-profit threshold
    harness
        .cache
        .publish_ticker(&spot_key(), ticker(100.5, 100.6));
    harness
        .cache
        .publish_ticker(&futures_key(), ticker(100.1, 100.2));

    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Exiting);

    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Monitoring);

    // Both positions closed, delta_usdt within a unit of zero
    assert!(!context.positions.holds_position(Decimal::ZERO));
    assert!(context.positions.delta_usdt(dec!(100)).abs() < dec!(1));
    assert_eq!(context.position_opened_at, None);

    // Entry volume only: 5 base @ 100.00
    assert_eq!(context.total_volume_usdt, dec!(500));
}

#[tokio::test]
async fn test_partial_fill_triggers_delta_correction() {
    let mut harness = harness("partial-fill", 5);
    let context = start(&mut harness).await;

    // Futures leg fills 3 of 5 then reports Canceled on the remainder
    harness.futures.set_behaviour(FillBehaviour::PartialThenCancel {
        fill_quantity: dec!(3),
    });

    harness.opportunity_tx.send(opportunity()).await.unwrap();
    let context = harness.task.step(context).await;
    let context = harness.task.step(context).await;
    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Monitoring);

    // Spot +5, futures -3 => delta +2 (+~200 quote)
    assert_eq!(context.positions.delta(), dec!(2));

    // Next tick detects |delta_usdt| >= min quote and sells the excess on spot
    let context = harness.task.step(context).await;
    assert_eq!(context.positions.delta(), Decimal::ZERO);

    // Correction never amplifies: spot reduced to +3 against futures -3
    assert_eq!(
        context.positions.signed_quantity(ExchangeRole::Spot),
        dec!(3)
    );
    assert_eq!(
        context.positions.signed_quantity(ExchangeRole::Futures),
        dec!(-3)
    );
}

#[tokio::test]
async fn test_entry_timeout_cancels_surviving_leg() {
    let mut harness = harness("entry-timeout", 5);
    let context = start(&mut harness).await;

    // Spot leg rests unfilled; futures leg never responds within the deadline
    harness.spot.set_behaviour(FillBehaviour::RemainOpen);
    harness
        .futures
        .set_open_delay(Some(Duration::from_millis(500)));

    harness.opportunity_tx.send(opportunity()).await.unwrap();
    let context = harness.task.step(context).await;
    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Executing);

    let context = harness.task.step(context).await;
    assert!(matches!(context.state, TaskState::ErrorRecovery { .. }));

    // Surviving spot leg was cancelled; positions never advanced
    let spot_orders = harness.spot.placed_orders();
    assert_eq!(spot_orders.len(), 1);
    assert!(spot_orders[0].is_terminal());
    assert!(!context.positions.holds_position(Decimal::ZERO));
    assert_eq!(context.consecutive_failures, 1);

    // Cooldown elapsed (configured to zero): recovery cancels all and resumes
    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Monitoring);
    assert!(context.active_orders.is_empty());
}

#[tokio::test]
async fn test_persistent_failures_escalate_to_paused() {
    let mut harness = harness("paused-escalation", 2);
    let mut context = start(&mut harness).await;

    harness.spot.set_behaviour(FillBehaviour::RemainOpen);
    harness
        .futures
        .set_behaviour(FillBehaviour::Reject("margin disabled".to_string()));

    for expected_failures in 1..=2u32 {
        harness.opportunity_tx.send(opportunity()).await.unwrap();
        context = harness.task.step(context).await; // Monitoring -> Analyzing
        context = harness.task.step(context).await; // Analyzing -> Executing
        context = harness.task.step(context).await; // Executing -> ErrorRecovery
        assert!(matches!(context.state, TaskState::ErrorRecovery { .. }));
        assert_eq!(context.consecutive_failures, expected_failures);

        context = harness.task.step(context).await;
    }

    // Second recovery pass observes the failure ceiling and pauses with an alert
    assert_eq!(context.state, TaskState::Paused);
}

#[tokio::test]
async fn test_stale_opportunity_is_discarded_in_analyzing() {
    let mut harness = harness("stale-opportunity", 5);
    let context = start(&mut harness).await;

    let mut stale = opportunity();
    stale.detected_at = Utc::now() - chrono::TimeDelta::milliseconds(600);
    harness.opportunity_tx.send(stale).await.unwrap();

    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Analyzing);

    let context = harness.task.step(context).await;
    assert_eq!(context.state, TaskState::Monitoring);
    assert!(context.current_opportunity.is_none());

    // No order reached either venue
    assert!(harness.spot.placed_orders().is_empty());
    assert!(harness.futures.placed_orders().is_empty());
}

#[tokio::test]
async fn test_crash_recovery_resumes_in_monitoring() {
    // First incarnation: enter a position, then "crash" (drop the task)
    let state_dir = {
        let mut harness = harness("crash-recovery", 5);
        let context = start(&mut harness).await;

        harness.opportunity_tx.send(opportunity()).await.unwrap();
        let context = harness.task.step(context).await;
        let context = harness.task.step(context).await;
        let context = harness.task.step(context).await;
        assert_eq!(context.state, TaskState::Monitoring);
        assert!(context.positions.holds_position(Decimal::ZERO));

        // Persist the snapshot the way the run loop would
        let repository = FileContextRepository::new(
            std::env::temp_dir()
                .join(format!("basis-engine-crash-recovery-{}", std::process::id())),
        )
        .unwrap();
        repository.persist(&context).await.unwrap();

        std::env::temp_dir().join(format!("basis-engine-crash-recovery-{}", std::process::id()))
    };

    // Restarted incarnation: rehydrate by deterministic task id and resume
    let repository = FileContextRepository::new(state_dir).unwrap();
    let expected_task_id = TaskContext::new(
        "spot_futures_arbitrage",
        instrument(),
        ExchangeId::MexcSpot,
        ExchangeId::GateioPerpetualsUsd,
    )
    .task_id;

    let rehydrated = repository.load(&expected_task_id).await.unwrap().unwrap();
    assert_eq!(rehydrated.state, TaskState::Monitoring);
    assert_eq!(
        rehydrated.positions.signed_quantity(ExchangeRole::Spot),
        dec!(5)
    );

    // First tick after resume sees unchanged positions and proceeds normally
    let mut harness = harness("crash-recovery-resume", 5);
    let context = harness.task.step(rehydrated.clone()).await;
    assert_eq!(context.state, TaskState::Monitoring);
    assert_eq!(context.positions, rehydrated.positions);
}
