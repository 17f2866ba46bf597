use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, StrExt};

/// Internal name for an `Asset`, lowercase.
///
/// eg/ "btc", "usdt"
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
)]
pub struct AssetNameInternal(SmolStr);

impl AssetNameInternal {
    pub fn name(&self) -> &SmolStr {
        &self.0
    }
}

impl From<&str> for AssetNameInternal {
    fn from(value: &str) -> Self {
        if value.chars().all(char::is_lowercase) {
            Self(SmolStr::new(value))
        } else {
            Self(value.to_lowercase_smolstr())
        }
    }
}

impl AsRef<str> for AssetNameInternal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Exchange name for an `Asset`, in the casing the venue uses on the wire.
///
/// eg/ "BTC", "XBT", "USDT"
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
pub struct AssetNameExchange(SmolStr);

impl AssetNameExchange {
    pub fn name(&self) -> &SmolStr {
        &self.0
    }
}

impl From<&str> for AssetNameExchange {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl AsRef<str> for AssetNameExchange {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Marker for a quantity denominated in the quote asset of an instrument.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
pub struct QuoteAsset;
