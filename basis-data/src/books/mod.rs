use crate::subscription::book::OrderBookEvent;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Normalised Basis [`OrderBook`] snapshot.
///
/// Levels are held as native `f64` - order books live on the per-message hot path, and all
/// quantities derived from them are re-validated in exact decimal arithmetic before they
/// become order parameters.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct OrderBook {
    sequence: u64,
    time_engine: Option<DateTime<Utc>>,
    bids: OrderBookSide<Bids>,
    asks: OrderBookSide<Asks>,
}

impl OrderBook {
    /// Construct a new sorted [`OrderBook`].
    ///
    /// Note that the passed bid and asks levels do not need to be pre-sorted.
    pub fn new<IterBids, IterAsks, L>(
        sequence: u64,
        time_engine: Option<DateTime<Utc>>,
        bids: IterBids,
        asks: IterAsks,
    ) -> Self
    where
        IterBids: IntoIterator<Item = L>,
        IterAsks: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        Self {
            sequence,
            time_engine,
            bids: OrderBookSide::bids(bids),
            asks: OrderBookSide::asks(asks),
        }
    }

    /// Current `u64` sequence number associated with the [`OrderBook`].
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Current engine time associated with the [`OrderBook`].
    pub fn time_engine(&self) -> Option<DateTime<Utc>> {
        self.time_engine
    }

    /// Generate a sorted [`OrderBook`] snapshot with a maximum depth.
    pub fn snapshot(&self, depth: usize) -> Self {
        Self {
            sequence: self.sequence,
            time_engine: self.time_engine,
            bids: OrderBookSide::bids(self.bids.levels.iter().take(depth).copied()),
            asks: OrderBookSide::asks(self.asks.levels.iter().take(depth).copied()),
        }
    }

    /// Update the local [`OrderBook`] from a new [`OrderBookEvent`].
    pub fn update(&mut self, event: &OrderBookEvent) {
        match event {
            OrderBookEvent::Snapshot(snapshot) => {
                *self = snapshot.clone();
            }
            OrderBookEvent::Update(update) => {
                self.sequence = update.sequence;
                self.time_engine = update.time_engine;
                self.bids.upsert(update.bids.levels());
                self.asks.upsert(update.asks.levels());
            }
        }
    }

    /// Return a reference to this [`OrderBook`]s bids.
    pub fn bids(&self) -> &OrderBookSide<Bids> {
        &self.bids
    }

    /// Return a reference to this [`OrderBook`]s asks.
    pub fn asks(&self) -> &OrderBookSide<Asks> {
        &self.asks
    }

    /// Determine if the top-of-book is crossed (best bid >= best ask).
    ///
    /// Invariant violation - the owning stream must resync from a fresh snapshot.
    pub fn is_crossed(&self) -> Option<(f64, f64)> {
        match (self.bids.best(), self.asks.best()) {
            (Some(best_bid), Some(best_ask)) if best_bid.price >= best_ask.price => {
                Some((best_bid.price, best_ask.price))
            }
            _ => None,
        }
    }

    /// Calculate the mid-price by taking the average of the best bid and ask prices.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.bids.best(), self.asks.best()) {
            (Some(best_bid), Some(best_ask)) => Some(mid_price(best_bid.price, best_ask.price)),
            (Some(best_bid), None) => Some(best_bid.price),
            (None, Some(best_ask)) => Some(best_ask.price),
            (None, None) => None,
        }
    }

    /// Calculate the volume weighted mid-price (micro-price), weighing the best bid and ask
    /// prices with their associated amount.
    pub fn volume_weighed_mid_price(&self) -> Option<f64> {
        match (self.bids.best(), self.asks.best()) {
            (Some(best_bid), Some(best_ask)) => {
                Some(volume_weighted_mid_price(*best_bid, *best_ask))
            }
            (Some(best_bid), None) => Some(best_bid.price),
            (None, Some(best_ask)) => Some(best_ask.price),
            (None, None) => None,
        }
    }
}

/// Normalised Basis [`Level`]s for one `Side` of the [`OrderBook`].
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct OrderBookSide<Side> {
    #[serde(skip_serializing)]
    pub side: Side,
    levels: Vec<Level>,
}

/// Unit type to tag an [`OrderBookSide`] as the bid Side (ie/ buyers) of an [`OrderBook`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Display)]
pub struct Bids;

/// Unit type to tag an [`OrderBookSide`] as the ask Side (ie/ sellers) of an [`OrderBook`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Display)]
pub struct Asks;

impl OrderBookSide<Bids> {
    /// Construct a new [`OrderBookSide<Bids>`] from the provided [`Level`]s.
    pub fn bids<Iter, L>(levels: Iter) -> Self
    where
        Iter: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        let mut levels = levels.into_iter().map(L::into).collect::<Vec<_>>();
        levels.sort_unstable_by(|a, b| a.price.total_cmp(&b.price).reverse());

        Self { side: Bids, levels }
    }

    /// Upsert bid [`Level`]s into this [`OrderBookSide<Bids>`].
    pub fn upsert<L>(&mut self, levels: &[L])
    where
        L: Into<Level> + Copy,
    {
        levels.iter().for_each(|upsert| {
            let upsert: Level = (*upsert).into();
            self.upsert_single(upsert, |existing| {
                existing.price.total_cmp(&upsert.price).reverse()
            })
        })
    }
}

impl OrderBookSide<Asks> {
    /// Construct a new [`OrderBookSide<Asks>`] from the provided [`Level`]s.
    pub fn asks<Iter, L>(levels: Iter) -> Self
    where
        Iter: IntoIterator<Item = L>,
        L: Into<Level>,
    {
        let mut levels = levels.into_iter().map(L::into).collect::<Vec<_>>();
        levels.sort_unstable_by(|a, b| a.price.total_cmp(&b.price));

        Self { side: Asks, levels }
    }

    /// Upsert ask [`Level`]s into this [`OrderBookSide<Asks>`].
    pub fn upsert<L>(&mut self, levels: &[L])
    where
        L: Into<Level> + Copy,
    {
        levels.iter().for_each(|upsert| {
            let upsert: Level = (*upsert).into();
            self.upsert_single(upsert, |existing| existing.price.total_cmp(&upsert.price))
        })
    }
}

impl<Side> OrderBookSide<Side>
where
    Side: std::fmt::Display + std::fmt::Debug,
{
    /// Get best [`Level`] on the [`OrderBookSide`].
    pub fn best(&self) -> Option<&Level> {
        self.levels.first()
    }

    /// Return a reference to the [`OrderBookSide`] levels.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Upsert a single [`Level`] into this [`OrderBookSide`].
    ///
    /// ### Upsert Scenarios
    /// #### 1 Level Already Exists
    /// 1a) New value is 0, remove the level
    /// 1b) New value is > 0, replace the level
    ///
    /// #### 2 Level Does Not Exist
    /// 2a) New value is 0, log debug and continue
    /// 2b) New value is > 0, insert new level
    pub fn upsert_single<FnOrd>(&mut self, new_level: Level, fn_ord: FnOrd)
    where
        FnOrd: Fn(&Level) -> Ordering,
    {
        match (self.levels.binary_search_by(fn_ord), new_level.amount) {
            (Ok(index), new_amount) => {
                if new_amount == 0.0 {
                    // Scenario 1a: Level exists & new value is 0 => remove level
                    let _removed = self.levels.remove(index);
                } else {
                    // Scenario 1b: Level exists & new value is > 0 => replace level
                    self.levels[index].amount = new_amount;
                }
            }
            (Err(index), new_amount) => {
                if new_amount == 0.0 {
                    // Scenario 2a: Level does not exist & new value is 0 => log & continue
                    debug!(
                        ?new_level,
                        side = %self.side,
                        "received upsert Level with zero amount (to remove) that was not found"
                    );
                } else {
                    // Scenario 2b: Level does not exist & new value > 0 => insert new level
                    self.levels.insert(index, new_level);
                }
            }
        }
    }
}

impl Default for OrderBookSide<Bids> {
    fn default() -> Self {
        Self {
            side: Bids,
            levels: vec![],
        }
    }
}

impl Default for OrderBookSide<Asks> {
    fn default() -> Self {
        Self {
            side: Asks,
            levels: vec![],
        }
    }
}

/// Normalised Basis OrderBook [`Level`].
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct Level {
    pub price: f64,
    pub amount: f64,
}

impl<T> From<(T, T)> for Level
where
    T: Into<f64>,
{
    fn from((price, amount): (T, T)) -> Self {
        Self::new(price, amount)
    }
}

impl Level {
    pub fn new<T>(price: T, amount: T) -> Self
    where
        T: Into<f64>,
    {
        Self {
            price: price.into(),
            amount: amount.into(),
        }
    }
}

/// Calculate the mid-price by taking the average of the best bid and ask prices.
pub fn mid_price(best_bid_price: f64, best_ask_price: f64) -> f64 {
    (best_bid_price + best_ask_price) / 2.0
}

/// Calculate the volume weighted mid-price (micro-price), weighing the best bid and ask prices
/// with their associated amount.
pub fn volume_weighted_mid_price(best_bid: Level, best_ask: Level) -> f64 {
    ((best_bid.price * best_ask.amount) + (best_ask.price * best_bid.amount))
        / (best_bid.amount + best_ask.amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod order_book {
        use super::*;

        #[test]
        fn test_mid_price() {
            struct TestCase {
                input: OrderBook,
                expected: Option<f64>,
            }

            let tests = vec![
                TestCase {
                    // TC0: no levels so no mid-price
                    input: OrderBook::new::<Vec<_>, Vec<_>, Level>(
                        0,
                        Default::default(),
                        vec![],
                        vec![],
                    ),
                    expected: None,
                },
                TestCase {
                    // TC1: no asks in the book so take best bid price
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![Level::new(100.0, 100.0), Level::new(50.0, 100.0)],
                        vec![],
                    ),
                    expected: Some(100.0),
                },
                TestCase {
                    // TC2: no bids in the book so take best ask price
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![],
                        vec![Level::new(50.0, 100.0), Level::new(100.0, 100.0)],
                    ),
                    expected: Some(50.0),
                },
                TestCase {
                    // TC3: regular mid-price
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![Level::new(100.0, 100.0), Level::new(50.0, 100.0)],
                        vec![Level::new(200.0, 100.0), Level::new(300.0, 100.0)],
                    ),
                    expected: Some(150.0),
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                assert_eq!(test.input.mid_price(), test.expected, "TC{index} failed")
            }
        }

        #[test]
        fn test_volume_weighted_mid_price() {
            struct TestCase {
                input: OrderBook,
                expected: Option<f64>,
            }

            let tests = vec![
                TestCase {
                    // TC0: volume the same so should be equal to non-weighted mid price
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![Level::new(100.0, 100.0)],
                        vec![Level::new(200.0, 100.0)],
                    ),
                    expected: Some(150.0),
                },
                TestCase {
                    // TC1: volume affects mid-price
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![Level::new(100.0, 3000.0), Level::new(50.0, 100.0)],
                        vec![Level::new(200.0, 1000.0), Level::new(300.0, 100.0)],
                    ),
                    expected: Some(175.0),
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                assert_eq!(
                    test.input.volume_weighed_mid_price(),
                    test.expected,
                    "TC{index} failed"
                )
            }
        }

        #[test]
        fn test_is_crossed() {
            struct TestCase {
                input: OrderBook,
                expected: Option<(f64, f64)>,
            }

            let tests = vec![
                TestCase {
                    // TC0: healthy book
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![Level::new(99.0, 1.0)],
                        vec![Level::new(100.0, 1.0)],
                    ),
                    expected: None,
                },
                TestCase {
                    // TC1: crossed book
                    input: OrderBook::new(
                        0,
                        Default::default(),
                        vec![Level::new(101.0, 1.0)],
                        vec![Level::new(100.0, 1.0)],
                    ),
                    expected: Some((101.0, 100.0)),
                },
                TestCase {
                    // TC2: empty side cannot cross
                    input: OrderBook::new::<Vec<Level>, _, Level>(
                        0,
                        Default::default(),
                        vec![],
                        vec![Level::new(100.0, 1.0)],
                    ),
                    expected: None,
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                assert_eq!(test.input.is_crossed(), test.expected, "TC{index} failed")
            }
        }

        #[test]
        fn test_update_with_snapshot_replaces_book() {
            let mut book = OrderBook::new(
                10,
                Default::default(),
                vec![Level::new(99.0, 1.0)],
                vec![Level::new(100.0, 1.0)],
            );

            let snapshot = OrderBook::new(
                20,
                Default::default(),
                vec![Level::new(98.0, 2.0)],
                vec![Level::new(99.5, 2.0)],
            );

            book.update(&OrderBookEvent::Snapshot(snapshot.clone()));
            assert_eq!(book, snapshot);
        }

        #[test]
        fn test_update_with_delta_upserts_levels() {
            let mut book = OrderBook::new(
                10,
                Default::default(),
                vec![Level::new(99.0, 1.0), Level::new(98.0, 1.0)],
                vec![Level::new(100.0, 1.0)],
            );

            // Delta removes the 99.0 bid and adds a new best ask
            let delta = OrderBook::new(
                11,
                Default::default(),
                vec![Level::new(99.0, 0.0)],
                vec![Level::new(99.5, 3.0)],
            );

            book.update(&OrderBookEvent::Update(delta));

            assert_eq!(book.sequence(), 11);
            assert_eq!(book.bids().best(), Some(&Level::new(98.0, 1.0)));
            assert_eq!(book.asks().best(), Some(&Level::new(99.5, 3.0)));
        }
    }

    mod order_book_side {
        use super::*;

        #[test]
        fn test_upsert_single() {
            struct TestCase {
                book_side: OrderBookSide<Bids>,
                new_level: Level,
                expected: OrderBookSide<Bids>,
            }

            let tests = vec![
                TestCase {
                    // TC0: Level exists & new value is 0 => remove Level
                    book_side: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 1.0),
                    ]),
                    new_level: Level::new(100.0, 0.0),
                    expected: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                    ]),
                },
                TestCase {
                    // TC1: Level exists & new value is > 0 => replace Level
                    book_side: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 1.0),
                    ]),
                    new_level: Level::new(100.0, 10.0),
                    expected: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 10.0),
                    ]),
                },
                TestCase {
                    // TC2: Level does not exist & new value > 0 => insert new Level
                    book_side: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 1.0),
                    ]),
                    new_level: Level::new(110.0, 1.0),
                    expected: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 1.0),
                        Level::new(110.0, 1.0),
                    ]),
                },
                TestCase {
                    // TC3: Level does not exist & new value is 0 => no change
                    book_side: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 1.0),
                    ]),
                    new_level: Level::new(110.0, 0.0),
                    expected: OrderBookSide::bids(vec![
                        Level::new(80.0, 1.0),
                        Level::new(90.0, 1.0),
                        Level::new(100.0, 1.0),
                    ]),
                },
            ];

            for (index, mut test) in tests.into_iter().enumerate() {
                test.book_side.upsert_single(test.new_level, |existing| {
                    existing.price.total_cmp(&test.new_level.price).reverse()
                });
                assert_eq!(test.book_side, test.expected, "TC{} failed", index);
            }
        }
    }
}
