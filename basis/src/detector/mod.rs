use self::{
    opportunity::{ArbitrageOpportunity, OpportunityDirection, OpportunityKey},
    stats::ScanStats,
};
use crate::config::{ArbitrageConfig, RiskLimits};
use basis_data::{
    aggregator::{MarketDataCache, MarketKey, TickerRecord},
    subscription::book::BookTicker,
};
use basis_instrument::{exchange::ExchangeId, instrument::MarketDataInstrument};
use chrono::{DateTime, Utc};
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// [`ArbitrageOpportunity`] and its deduplication key.
pub mod opportunity;

/// Scan duration tracking.
pub mod stats;

/// Scan cycle wall-clock budget. Exceeding it logs a warning, never aborts.
const SCAN_BUDGET: Duration = Duration::from_millis(80);

/// Number of scan durations kept for performance tracking.
const SCAN_STATS_CAPACITY: usize = 256;

/// Per-venue taker fees used by the spread math, loaded from
/// [`SymbolInfo`](basis_instrument::instrument::SymbolInfo) at startup.
pub type TakerFees = FnvHashMap<ExchangeId, f64>;

/// Continuous scanner computing cross-exchange spreads net of fees and depth constraints,
/// emitting [`ArbitrageOpportunity`] values when thresholds are crossed.
#[derive(Debug)]
pub struct Detector {
    cache: Arc<MarketDataCache>,
    instruments: Vec<MarketDataInstrument>,
    exchanges: Vec<ExchangeId>,
    fees: TakerFees,
    limits: RiskLimits,
    scan_interval: Duration,
    freshness_horizon_ms: u64,
    /// Active opportunity handles keyed by `(instrument, buy venue, sell venue)`.
    ///
    /// An opportunity is emitted at most once per triple while its handle is alive;
    /// handles are dropped once the pricing no longer qualifies.
    active: Mutex<FnvHashMap<OpportunityKey, DateTime<Utc>>>,
    stats: Mutex<ScanStats>,
    tx: mpsc::Sender<ArbitrageOpportunity>,
}

impl Detector {
    pub fn new(
        cache: Arc<MarketDataCache>,
        config: &ArbitrageConfig,
        fees: TakerFees,
        tx: mpsc::Sender<ArbitrageOpportunity>,
    ) -> Self {
        Self {
            cache,
            instruments: config
                .enabled_instruments
                .iter()
                .map(|instrument| {
                    // The spot-kind instrument is the canonical scan key; venue market kind
                    // is applied per venue when reading the cache
                    MarketDataInstrument::new(
                        instrument.base.clone(),
                        instrument.quote.clone(),
                        basis_instrument::instrument::kind::MarketDataInstrumentKind::Spot,
                    )
                })
                .collect(),
            exchanges: config.enabled_exchanges.clone(),
            fees,
            limits: config.risk_limits.clone(),
            scan_interval: Duration::from_millis(config.scan_interval_ms),
            freshness_horizon_ms: config.freshness_horizon_ms,
            active: Mutex::new(FnvHashMap::default()),
            stats: Mutex::new(ScanStats::new(SCAN_STATS_CAPACITY)),
            tx,
        }
    }

    /// Run the periodic scan until shutdown is signalled.
    ///
    /// Runs on a dedicated task with a cooperative yield point between instruments.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            instruments = self.instruments.len(),
            exchanges = ?self.exchanges,
            scan_interval = ?self.scan_interval,
            "Detector running"
        );

        let mut interval = tokio::time::interval(self.scan_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.scan_once().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Detector shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Execute one scan cycle over every enabled instrument and ordered venue pair.
    pub async fn scan_once(&self) {
        let started = Instant::now();
        let now = Utc::now();

        for instrument in &self.instruments {
            self.scan_instrument(instrument, now).await;

            // Cooperative yield between instruments keeps the scheduler responsive even
            // when every symbol is updating simultaneously
            tokio::task::yield_now().await;
        }

        let elapsed = started.elapsed();
        if elapsed > SCAN_BUDGET {
            warn!(?elapsed, budget = ?SCAN_BUDGET, "scan cycle exceeded budget");
        }
        self.stats.lock().record(elapsed);
    }

    async fn scan_instrument(&self, instrument: &MarketDataInstrument, now: DateTime<Utc>) {
        // Pull current tickers from all enabled venues
        let tickers = self
            .exchanges
            .iter()
            .filter_map(|exchange| {
                let key = MarketKey::new(
                    *exchange,
                    MarketDataInstrument::new(
                        instrument.base.clone(),
                        instrument.quote.clone(),
                        exchange.market_kind(),
                    ),
                );
                let record = self.cache.ticker(&key)?;
                Some((*exchange, record))
            })
            .collect::<Vec<(ExchangeId, Arc<TickerRecord>)>>();

        // Evaluate each ordered (buy venue, sell venue) pair, rank-ordering the
        // qualifying candidates by net margin. Ties are broken in favour of the earlier
        // candidate (stable ordering within the scan).
        let mut best: Option<ArbitrageOpportunity> = None;

        for (buy_index, (buy_exchange, buy_record)) in tickers.iter().enumerate() {
            for (sell_index, (sell_exchange, sell_record)) in tickers.iter().enumerate() {
                if buy_index == sell_index {
                    continue;
                }

                let opportunity = evaluate_pair(
                    EvaluatePairInput {
                        instrument,
                        now,
                        buy_exchange: *buy_exchange,
                        buy: &buy_record.ticker,
                        buy_published: buy_record.time_published,
                        sell_exchange: *sell_exchange,
                        sell: &sell_record.ticker,
                        sell_published: sell_record.time_published,
                        buy_taker_fee: self.fees.get(buy_exchange).copied().unwrap_or(0.0),
                        sell_taker_fee: self.fees.get(sell_exchange).copied().unwrap_or(0.0),
                    },
                    &self.limits,
                    self.freshness_horizon_ms,
                );

                let key = OpportunityKey {
                    instrument: instrument.clone(),
                    buy_exchange: *buy_exchange,
                    sell_exchange: *sell_exchange,
                };

                match opportunity {
                    Some(opportunity) => {
                        if best
                            .as_ref()
                            .is_none_or(|best| opportunity.margin_bps > best.margin_bps)
                        {
                            best = Some(opportunity);
                        }
                    }
                    None => {
                        // Pricing no longer qualifies - expire the active handle so the
                        // next qualifying dislocation is emitted again
                        self.active.lock().remove(&key);
                    }
                }
            }
        }

        if let Some(opportunity) = best {
            let key = opportunity.key();
            self.emit(key, opportunity).await;
        }
    }

    async fn emit(&self, key: OpportunityKey, opportunity: ArbitrageOpportunity) {
        {
            let mut active = self.active.lock();
            if active.contains_key(&key) {
                return;
            }
            active.insert(key, opportunity.detected_at);
        }

        debug!(?opportunity, "emitting ArbitrageOpportunity");
        if self.tx.send(opportunity).await.is_err() {
            warn!("ArbitrageOpportunity receiver dropped");
        }
    }

    /// Mean and max of the recent scan durations.
    pub fn scan_durations(&self) -> (Option<Duration>, Option<Duration>) {
        let stats = self.stats.lock();
        (stats.mean(), stats.max())
    }
}

/// Inputs to [`evaluate_pair`] for one ordered `(buy venue, sell venue)` pair.
#[derive(Debug)]
pub struct EvaluatePairInput<'a> {
    pub instrument: &'a MarketDataInstrument,
    pub now: DateTime<Utc>,
    pub buy_exchange: ExchangeId,
    pub buy: &'a BookTicker,
    pub buy_published: DateTime<Utc>,
    pub sell_exchange: ExchangeId,
    pub sell: &'a BookTicker,
    pub sell_published: DateTime<Utc>,
    pub buy_taker_fee: f64,
    pub sell_taker_fee: f64,
}

/// Compute the net spread for one ordered venue pair, returning an
/// [`ArbitrageOpportunity`] if every gate passes.
///
/// Gates applied in order: snapshot freshness, positive gross spread, spread sanity cap,
/// executable quantity, liquidity depth, and net margin threshold.
pub fn evaluate_pair(
    input: EvaluatePairInput<'_>,
    limits: &RiskLimits,
    freshness_horizon_ms: u64,
) -> Option<ArbitrageOpportunity> {
    let EvaluatePairInput {
        instrument,
        now,
        buy_exchange,
        buy,
        buy_published,
        sell_exchange,
        sell,
        sell_published,
        buy_taker_fee,
        sell_taker_fee,
    } = input;

    // Stale ticker disqualifies the pair
    let horizon = freshness_horizon_ms as i64;
    if (now - buy_published).num_milliseconds() > horizon
        || (now - sell_published).num_milliseconds() > horizon
    {
        return None;
    }

    let buy_ask = buy.ask_price;
    let sell_bid = sell.bid_price;

    // Gross spread must be positive
    let gross_spread = sell_bid - buy_ask;
    if gross_spread <= 0.0 || buy_ask <= 0.0 {
        return None;
    }

    // Refuse implausibly large spreads - usually one side is broken
    let gross_bps = gross_spread / buy_ask * 10_000.0;
    if gross_bps > limits.max_spread_bps as f64 {
        return None;
    }

    // Executable quantity bounded by depth on both sides and the per-trade notional cap
    let quantity = buy
        .ask_amount
        .min(sell.bid_amount)
        .min(limits.max_position_size_usd / buy_ask);
    if quantity <= 0.0 {
        return None;
    }

    // Liquidity gate
    let min_depth_quantity = limits.min_market_depth_usd / buy_ask;
    if quantity < min_depth_quantity {
        return None;
    }

    // Net profit after taker fees on both legs
    let fee = buy_ask * quantity * buy_taker_fee + sell_bid * quantity * sell_taker_fee;
    let net_profit = gross_spread * quantity - fee;
    let margin_bps = (net_profit / (buy_ask * quantity) * 10_000.0).floor() as i64;

    if margin_bps < limits.min_profit_margin_bps {
        return None;
    }

    Some(ArbitrageOpportunity {
        direction: OpportunityDirection::Enter,
        instrument: instrument.clone(),
        buy_exchange,
        sell_exchange,
        buy_price: buy_ask,
        sell_price: sell_bid,
        max_quantity: quantity,
        margin_bps,
        detected_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_instrument::instrument::kind::MarketDataInstrumentKind;
    use chrono::TimeDelta;

    fn limits() -> RiskLimits {
        RiskLimits {
            max_position_size_usd: 1000.0,
            max_spread_bps: 500,
            min_market_depth_usd: 100.0,
            min_profit_margin_bps: 40,
        }
    }

    fn ticker(bid: f64, bid_qty: f64, ask: f64, ask_qty: f64) -> BookTicker {
        BookTicker {
            time_exchange: Utc::now(),
            bid_price: bid,
            bid_amount: bid_qty,
            ask_price: ask,
            ask_amount: ask_qty,
            update_id: None,
        }
    }

    fn instrument() -> MarketDataInstrument {
        ("btc", "usdt", MarketDataInstrumentKind::Spot).into()
    }

    fn input<'a>(
        now: DateTime<Utc>,
        instrument: &'a MarketDataInstrument,
        buy: &'a BookTicker,
        sell: &'a BookTicker,
    ) -> EvaluatePairInput<'a> {
        EvaluatePairInput {
            instrument,
            now,
            buy_exchange: ExchangeId::MexcSpot,
            buy,
            buy_published: now,
            sell_exchange: ExchangeId::GateioPerpetualsUsd,
            sell,
            sell_published: now,
            buy_taker_fee: 0.0005,
            sell_taker_fee: 0.0005,
        }
    }

    #[test]
    fn test_evaluate_pair_emits_qualifying_opportunity() {
        // Venue A ask = 100.00 (qty 10), venue B bid = 100.80 (qty 10), taker 5bps each.
        // Gross spread is 80bps; net of both taker fees the margin floors to 69bps.
        let now = Utc::now();
        let instrument = instrument();
        let buy = ticker(99.9, 10.0, 100.0, 10.0);
        let sell = ticker(100.8, 10.0, 100.9, 10.0);

        let opportunity =
            evaluate_pair(input(now, &instrument, &buy, &sell), &limits(), 500).unwrap();

        assert_eq!(opportunity.margin_bps, 69);
        assert_eq!(opportunity.buy_price, 100.0);
        assert_eq!(opportunity.sell_price, 100.8);
        // Depth allows 10, notional cap allows 1000/100 = 10
        assert_eq!(opportunity.max_quantity, 10.0);
    }

    #[test]
    fn test_evaluate_pair_rejects_non_positive_spread() {
        let now = Utc::now();
        let instrument = instrument();
        let buy = ticker(100.7, 10.0, 100.8, 10.0);
        let sell = ticker(100.8, 10.0, 100.9, 10.0);

        assert!(evaluate_pair(input(now, &instrument, &buy, &sell), &limits(), 500).is_none());
    }

    #[test]
    fn test_evaluate_pair_rejects_margin_below_threshold() {
        // Gross 10bps cannot clear a 40bps threshold after fees
        let now = Utc::now();
        let instrument = instrument();
        let buy = ticker(99.9, 10.0, 100.0, 10.0);
        let sell = ticker(100.1, 10.0, 100.2, 10.0);

        assert!(evaluate_pair(input(now, &instrument, &buy, &sell), &limits(), 500).is_none());
    }

    #[test]
    fn test_evaluate_pair_rejects_stale_ticker() {
        let now = Utc::now();
        let instrument = instrument();
        let buy = ticker(99.9, 10.0, 100.0, 10.0);
        let sell = ticker(100.8, 10.0, 100.9, 10.0);

        let mut stale = input(now, &instrument, &buy, &sell);
        stale.sell_published = now - TimeDelta::milliseconds(600);

        assert!(evaluate_pair(stale, &limits(), 500).is_none());
    }

    #[test]
    fn test_evaluate_pair_rejects_insufficient_depth() {
        // Only 0.5 base available but the depth gate requires 100usd/100 = 1.0
        let now = Utc::now();
        let instrument = instrument();
        let buy = ticker(99.9, 10.0, 100.0, 0.5);
        let sell = ticker(100.8, 10.0, 100.9, 10.0);

        assert!(evaluate_pair(input(now, &instrument, &buy, &sell), &limits(), 500).is_none());
    }

    #[test]
    fn test_evaluate_pair_rejects_excessive_spread() {
        // A 10% dislocation usually means one side is broken
        let now = Utc::now();
        let instrument = instrument();
        let buy = ticker(99.9, 10.0, 100.0, 10.0);
        let sell = ticker(110.0, 10.0, 110.1, 10.0);

        assert!(evaluate_pair(input(now, &instrument, &buy, &sell), &limits(), 500).is_none());
    }

    #[test]
    fn test_evaluate_pair_caps_quantity_by_notional() {
        let now = Utc::now();
        let instrument = instrument();
        // Depth of 50 each side but 1000usd cap at price 100 allows only 10
        let buy = ticker(99.9, 50.0, 100.0, 50.0);
        let sell = ticker(100.8, 50.0, 100.9, 50.0);

        let opportunity =
            evaluate_pair(input(now, &instrument, &buy, &sell), &limits(), 500).unwrap();
        assert_eq!(opportunity.max_quantity, 10.0);
    }
}
