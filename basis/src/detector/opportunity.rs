use basis_instrument::{exchange::ExchangeId, instrument::MarketDataInstrument};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Direction of an [`ArbitrageOpportunity`] relative to the strategy's position.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum OpportunityDirection {
    /// Open a new delta-neutral position.
    Enter,
    /// Unwind an existing position.
    Exit,
}

/// A detected cross-exchange pricing dislocation, net of fees and depth constraints.
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct ArbitrageOpportunity {
    pub direction: OpportunityDirection,
    pub instrument: MarketDataInstrument,
    pub buy_exchange: ExchangeId,
    pub sell_exchange: ExchangeId,
    /// Best ask on the buy venue.
    pub buy_price: f64,
    /// Best bid on the sell venue.
    pub sell_price: f64,
    /// Executable quantity bounded by top-of-book depth and the per-trade notional cap.
    pub max_quantity: f64,
    /// Net profit margin in basis points, fees applied.
    pub margin_bps: i64,
    pub detected_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Determine if this opportunity is still fresh enough to act on.
    pub fn is_fresh(&self, now: DateTime<Utc>, freshness_horizon_ms: u64) -> bool {
        (now - self.detected_at).num_milliseconds() <= freshness_horizon_ms as i64
    }

    /// Deduplication key - one opportunity may be active per
    /// `(instrument, buy venue, sell venue)` triple.
    pub fn key(&self) -> OpportunityKey {
        OpportunityKey {
            instrument: self.instrument.clone(),
            buy_exchange: self.buy_exchange,
            sell_exchange: self.sell_exchange,
        }
    }
}

/// Identity of an active opportunity, keyed by `(instrument, buy venue, sell venue)`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct OpportunityKey {
    pub instrument: MarketDataInstrument,
    pub buy_exchange: ExchangeId,
    pub sell_exchange: ExchangeId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_instrument::instrument::kind::MarketDataInstrumentKind;
    use chrono::TimeDelta;

    fn opportunity(detected_at: DateTime<Utc>) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            direction: OpportunityDirection::Enter,
            instrument: ("btc", "usdt", MarketDataInstrumentKind::Spot).into(),
            buy_exchange: ExchangeId::MexcSpot,
            sell_exchange: ExchangeId::GateioPerpetualsUsd,
            buy_price: 100.0,
            sell_price: 100.8,
            max_quantity: 5.0,
            margin_bps: 69,
            detected_at,
        }
    }

    #[test]
    fn test_is_fresh() {
        let now = Utc::now();

        struct TestCase {
            input: ArbitrageOpportunity,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: just detected
                input: opportunity(now),
                expected: true,
            },
            TestCase {
                // TC1: within the horizon
                input: opportunity(now - TimeDelta::milliseconds(400)),
                expected: true,
            },
            TestCase {
                // TC2: beyond the horizon
                input: opportunity(now - TimeDelta::milliseconds(600)),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.input.is_fresh(now, 500), test.expected, "TC{index} failed");
        }
    }
}
