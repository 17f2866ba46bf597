use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Exchange name for an instrument, in the exact format the venue uses on the wire.
///
/// eg/ "BTCUSDT" (MEXC), "BTC_USDT" (Gate.io)
#[derive(
    Debug,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Deserialize,
    Serialize,
    Display,
    Constructor,
    From,
)]
pub struct InstrumentNameExchange(SmolStr);

impl InstrumentNameExchange {
    pub fn name(&self) -> &SmolStr {
        &self.0
    }
}

impl From<&str> for InstrumentNameExchange {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl From<String> for InstrumentNameExchange {
    fn from(value: String) -> Self {
        Self(SmolStr::new(value))
    }
}

impl AsRef<str> for InstrumentNameExchange {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
