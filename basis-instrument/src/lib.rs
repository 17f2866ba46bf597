#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # Basis-Instrument
//! Core exchange, asset and instrument data structures shared by the Basis arbitrage
//! engine crates, including the venue trading rules ([`SymbolInfo`](instrument::SymbolInfo))
//! that gate order construction.

use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Defines the [`ExchangeId`](exchange::ExchangeId) enum covering all supported venues, and
/// the [`ExchangeRole`](exchange::ExchangeRole) a venue plays in a delta-neutral pair.
pub mod exchange;

/// Asset name newtypes.
pub mod asset;

/// Instrument data structures and venue trading rules.
///
/// eg/ `MarketDataInstrument`, `SymbolInfo`, etc.
pub mod instrument;

/// A keyed value.
///
/// eg/ Keyed<ExchangeId, MarketDataInstrument>
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct Keyed<Key, Value> {
    pub key: Key,
    pub value: Value,
}

impl<Key, Value> AsRef<Value> for Keyed<Key, Value> {
    fn as_ref(&self) -> &Value {
        &self.value
    }
}

impl<Key, Value> Display for Keyed<Key, Value>
where
    Key: Display,
    Value: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.key, self.value)
    }
}

/// Instrument Underlying containing a base and quote asset.
///
/// eg/ Underlying { base: "btc", quote: "usdt" }
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Underlying<AssetKey> {
    pub base: AssetKey,
    pub quote: AssetKey,
}

impl<AssetKey> Underlying<AssetKey> {
    pub fn new<A>(base: A, quote: A) -> Self
    where
        A: Into<AssetKey>,
    {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

/// [`Side`] of a trade or position - Buy or Sell.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum Side {
    #[serde(alias = "buy", alias = "BUY", alias = "b")]
    Buy,
    #[serde(alias = "sell", alias = "SELL", alias = "s")]
    Sell,
}

impl Side {
    /// Opposite [`Side`], used when unwinding a position.
    pub fn inverse(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Side::Buy => "buy",
                Side::Sell => "sell",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_inverse() {
        assert_eq!(Side::Buy.inverse(), Side::Sell);
        assert_eq!(Side::Sell.inverse(), Side::Buy);
    }

    #[test]
    fn test_de_side_aliases() {
        assert_eq!(serde_json::from_str::<Side>(r#""buy""#).unwrap(), Side::Buy);
        assert_eq!(
            serde_json::from_str::<Side>(r#""SELL""#).unwrap(),
            Side::Sell
        );
        assert_eq!(serde_json::from_str::<Side>(r#""b""#).unwrap(), Side::Buy);
    }
}
