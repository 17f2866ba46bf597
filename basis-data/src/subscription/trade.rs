use super::SubscriptionKind;
use basis_instrument::Side;
use serde::{Deserialize, Serialize};

/// Basis [`Subscription`](super::Subscription) [`SubscriptionKind`] that yields [`PublicTrade`]
/// market events.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct PublicTrades;

impl<'de> Deserialize<'de> for PublicTrades {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        match <String as Deserialize>::deserialize(deserializer)?.as_str() {
            "PublicTrades" | "public_trades" => Ok(Self),
            other => Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(other),
                &"PublicTrades",
            )),
        }
    }
}

impl Serialize for PublicTrades {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str("PublicTrades")
    }
}

impl SubscriptionKind for PublicTrades {
    type Event = PublicTrade;
    fn as_str(&self) -> &'static str {
        "public_trades"
    }
}

impl std::fmt::Display for PublicTrades {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalised Basis public trade.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct PublicTrade {
    pub id: String,
    pub price: f64,
    pub amount: f64,
    pub side: Side,
}
