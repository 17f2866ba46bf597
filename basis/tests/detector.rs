//! Detector scan cycle scenarios driven against the shared market data cache.

use basis::{
    config::{ArbitrageConfig, InstrumentConfig, RiskLimits},
    detector::{Detector, TakerFees, opportunity::ArbitrageOpportunity},
};
use basis_data::{
    aggregator::{MarketDataCache, MarketKey},
    subscription::book::BookTicker,
};
use basis_instrument::{
    exchange::ExchangeId,
    instrument::{MarketDataInstrument, kind::MarketDataInstrumentKind},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;

fn config() -> ArbitrageConfig {
    ArbitrageConfig {
        enabled_exchanges: vec![ExchangeId::MexcSpot, ExchangeId::GateioPerpetualsUsd],
        enabled_instruments: vec![InstrumentConfig {
            base: "btc".into(),
            quote: "usdt".into(),
        }],
        scan_interval_ms: 100,
        target_execution_time_ms: 3000,
        freshness_horizon_ms: 500,
        risk_limits: RiskLimits {
            max_position_size_usd: 1000.0,
            max_spread_bps: 500,
            min_market_depth_usd: 100.0,
            min_profit_margin_bps: 40,
        },
    }
}

fn fees() -> TakerFees {
    TakerFees::from_iter([
        (ExchangeId::MexcSpot, 0.0005),
        (ExchangeId::GateioPerpetualsUsd, 0.0005),
    ])
}

fn spot_key() -> MarketKey {
    MarketKey::new(
        ExchangeId::MexcSpot,
        MarketDataInstrument::from(("btc", "usdt", MarketDataInstrumentKind::Spot)),
    )
}

fn futures_key() -> MarketKey {
    MarketKey::new(
        ExchangeId::GateioPerpetualsUsd,
        MarketDataInstrument::from(("btc", "usdt", MarketDataInstrumentKind::Perpetual)),
    )
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

fn detector() -> (
    Arc<Detector>,
    Arc<MarketDataCache>,
    mpsc::Receiver<ArbitrageOpportunity>,
) {
    let cache = Arc::new(MarketDataCache::new([spot_key(), futures_key()]));
    let (tx, rx) = mpsc::channel(8);
    let detector = Arc::new(Detector::new(Arc::clone(&cache), &config(), fees(), tx));
    (detector, cache, rx)
}

#[tokio::test]
async fn test_scan_emits_opportunity_when_thresholds_crossed() {
    let (detector, cache, mut rx) = detector();

    cache.publish_ticker(&spot_key(), ticker(99.9, 100.0));
    cache.publish_ticker(&futures_key(), ticker(100.8, 100.9));

    detector.scan_once().await;

    let opportunity = rx.try_recv().unwrap();
    assert_eq!(opportunity.buy_exchange, ExchangeId::MexcSpot);
    assert_eq!(opportunity.sell_exchange, ExchangeId::GateioPerpetualsUsd);
    assert!(opportunity.margin_bps >= 40);
    assert!(opportunity.max_quantity > 0.0);
}

#[tokio::test]
async fn test_active_opportunity_emitted_at_most_once() {
    let (detector, cache, mut rx) = detector();

    cache.publish_ticker(&spot_key(), ticker(99.9, 100.0));
    cache.publish_ticker(&futures_key(), ticker(100.8, 100.9));

    // The same dislocation across repeated scans produces a single emission
    detector.scan_once().await;
    detector.scan_once().await;
    detector.scan_once().await;

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_opportunity_re_emitted_after_expiry() {
    let (detector, cache, mut rx) = detector();

    cache.publish_ticker(&spot_key(), ticker(99.9, 100.0));
    cache.publish_ticker(&futures_key(), ticker(100.8, 100.9));
    detector.scan_once().await;
    assert!(rx.try_recv().is_ok());

    // Spread collapses: the active handle expires
    cache.publish_ticker(&futures_key(), ticker(100.0, 100.1));
    detector.scan_once().await;
    assert!(rx.try_recv().is_err());

    // Dislocation reappears: a fresh opportunity is emitted
    cache.publish_ticker(&futures_key(), ticker(100.8, 100.9));
    detector.scan_once().await;
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn test_no_emission_without_both_venue_tickers() {
    let (detector, cache, mut rx) = detector();

    // Only the spot venue has published; the futures venue is mid-reconnect
    cache.publish_ticker(&spot_key(), ticker(99.9, 100.0));

    detector.scan_once().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_scan_durations_recorded() {
    let (detector, cache, _rx) = detector();

    cache.publish_ticker(&spot_key(), ticker(99.9, 100.0));
    cache.publish_ticker(&futures_key(), ticker(100.8, 100.9));

    detector.scan_once().await;
    detector.scan_once().await;

    let (mean, max) = detector.scan_durations();
    assert!(mean.is_some());
    assert!(max.is_some());
}
