use super::SubscriptionKind;
use crate::books::{OrderBook, mid_price};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Basis [`Subscription`](super::Subscription) [`SubscriptionKind`] that yields [`BookTicker`]
/// market events.
///
/// A book ticker is the compressed top-of-book view `(best_bid, best_ask)` with sizes, for
/// low-latency consumers that do not need depth.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct BookTickers;

impl<'de> Deserialize<'de> for BookTickers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        match <String as Deserialize>::deserialize(deserializer)?.as_str() {
            "BookTickers" | "book_tickers" | "book_ticker" => Ok(Self),
            other => Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(other),
                &"BookTickers",
            )),
        }
    }
}

impl Serialize for BookTickers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str("BookTickers")
    }
}

impl SubscriptionKind for BookTickers {
    type Event = BookTicker;
    fn as_str(&self) -> &'static str {
        "book_ticker"
    }
}

impl std::fmt::Display for BookTickers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalised Basis [`BookTicker`] snapshot containing the latest best bid and ask.
///
/// Prices and sizes are native `f64` - this type lives on the per-message hot path and feeds
/// the spread scanner directly.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct BookTicker {
    pub time_exchange: DateTime<Utc>,
    pub bid_price: f64,
    pub bid_amount: f64,
    pub ask_price: f64,
    pub ask_amount: f64,
    pub update_id: Option<u64>,
}

impl BookTicker {
    /// Calculate the mid-price by taking the average of the best bid and ask prices.
    pub fn mid_price(&self) -> f64 {
        mid_price(self.bid_price, self.ask_price)
    }

    /// Absolute spread between the best ask and best bid.
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    /// Age of this snapshot relative to the provided instant.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.time_exchange).num_milliseconds()
    }
}

/// Basis [`Subscription`](super::Subscription) [`SubscriptionKind`] that yields L2
/// [`OrderBookEvent`] market events.
///
/// Level 2 refers to an [`OrderBook`] with orders at each price level aggregated.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct OrderBooksL2;

impl<'de> Deserialize<'de> for OrderBooksL2 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        match <String as Deserialize>::deserialize(deserializer)?.as_str() {
            "OrderBooksL2" | "order_books_l2" | "l2" => Ok(Self),
            other => Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(other),
                &"OrderBooksL2",
            )),
        }
    }
}

impl Serialize for OrderBooksL2 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str("OrderBooksL2")
    }
}

impl SubscriptionKind for OrderBooksL2 {
    type Event = OrderBookEvent;
    fn as_str(&self) -> &'static str {
        "l2"
    }
}

impl std::fmt::Display for OrderBooksL2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub enum OrderBookEvent {
    Snapshot(OrderBook),
    Update(OrderBook),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn ticker(bid: f64, ask: f64, time_exchange: DateTime<Utc>) -> BookTicker {
        BookTicker {
            time_exchange,
            bid_price: bid,
            bid_amount: 1.0,
            ask_price: ask,
            ask_amount: 1.0,
            update_id: None,
        }
    }

    #[test]
    fn test_book_ticker_mid_price_and_spread() {
        let ticker = ticker(100.0, 100.8, Utc::now());
        assert_eq!(ticker.mid_price(), 100.4);
        assert!((ticker.spread() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_book_ticker_age_ms() {
        let now = Utc::now();
        let ticker = ticker(100.0, 100.8, now - TimeDelta::milliseconds(600));
        assert_eq!(ticker.age_ms(now), 600);
    }
}
