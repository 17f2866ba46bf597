use crate::{
    books::OrderBook,
    streams::consumer::MarketStreamEvent,
    subscription::book::{BookTicker, OrderBookEvent},
};
use arc_swap::ArcSwapOption;
use basis_instrument::{exchange::ExchangeId, instrument::MarketDataInstrument};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use fnv::FnvHashMap;
use futures::Stream;
use futures_util::StreamExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, warn};

/// Number of in-flight [`BookTicker`]s a slow listener may lag before missing events.
const TICKER_BROADCAST_CAPACITY: usize = 64;

/// Unique fingerprint for market data state - `(venue, instrument)`.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct MarketKey {
    pub exchange: ExchangeId,
    pub instrument: MarketDataInstrument,
}

impl std::fmt::Display for MarketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.exchange, self.instrument)
    }
}

/// [`BookTicker`] snapshot annotated with the local publication time used for freshness
/// checks.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Deserialize, Serialize, Constructor)]
pub struct TickerRecord {
    pub ticker: BookTicker,
    pub time_published: DateTime<Utc>,
}

impl TickerRecord {
    /// Age of this record relative to the provided instant.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.time_published).num_milliseconds()
    }
}

/// Read-mostly market data aggregator presenting a unified view of
/// `(venue, instrument) -> BookTicker / OrderBook` to consumers.
///
/// Book tickers are published via atomic `Arc` swaps - readers never block writers and the
/// hot path takes no mutex. Full depth books are shared behind `parking_lot::RwLock`s since
/// depth readers are far less latency sensitive.
///
/// Strictly market data only: any value a venue may mutate in response to a trade (balances,
/// positions, open orders) must be fetched live from the private plane, never cached here.
#[derive(Debug)]
pub struct MarketDataCache {
    tickers: FnvHashMap<MarketKey, Arc<ArcSwapOption<TickerRecord>>>,
    books: FnvHashMap<MarketKey, Arc<RwLock<OrderBook>>>,
    listeners: Mutex<FnvHashMap<MarketKey, broadcast::Sender<TickerRecord>>>,
}

impl MarketDataCache {
    /// Construct a new [`MarketDataCache`] with pre-registered slots for every provided
    /// [`MarketKey`].
    ///
    /// Registration is fixed at construction so that reads stay allocation and lock free.
    pub fn new<Iter>(keys: Iter) -> Self
    where
        Iter: IntoIterator<Item = MarketKey>,
    {
        let (tickers, books) = keys
            .into_iter()
            .map(|key| {
                (
                    (key.clone(), Arc::new(ArcSwapOption::const_empty())),
                    (key, Arc::new(RwLock::new(OrderBook::default()))),
                )
            })
            .unzip();

        Self {
            tickers,
            books,
            listeners: Mutex::new(FnvHashMap::default()),
        }
    }

    /// Registered [`MarketKey`]s.
    pub fn keys(&self) -> impl Iterator<Item = &MarketKey> {
        self.tickers.keys()
    }

    /// O(1), lock-free read of the latest published [`TickerRecord`] for the provided key.
    ///
    /// Returns `None` if the key is not registered, no snapshot has been published yet, or
    /// the venue is mid-reconnect (snapshots are invalidated on disconnect).
    pub fn ticker(&self, key: &MarketKey) -> Option<Arc<TickerRecord>> {
        self.tickers.get(key)?.load_full()
    }

    /// Clone of the latest [`OrderBook`] for the provided key.
    pub fn order_book(&self, key: &MarketKey) -> Option<OrderBook> {
        self.books.get(key).map(|book| book.read().clone())
    }

    /// Cheaply cloneable handle to the shared [`OrderBook`] for the provided key.
    pub fn order_book_handle(&self, key: &MarketKey) -> Option<Arc<RwLock<OrderBook>>> {
        self.books.get(key).cloned()
    }

    /// Register interest in [`BookTicker`] updates for the provided key.
    ///
    /// Many listeners share the single underlying connector subscription. Dropping the
    /// returned receiver unsubscribes the listener.
    pub fn subscribe_tickers(&self, key: &MarketKey) -> broadcast::Receiver<TickerRecord> {
        self.listeners
            .lock()
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(TICKER_BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Publish a new [`BookTicker`] snapshot, atomically replacing the previous one.
    pub fn publish_ticker(&self, key: &MarketKey, ticker: BookTicker) {
        let record = TickerRecord {
            ticker,
            time_published: Utc::now(),
        };

        let Some(slot) = self.tickers.get(key) else {
            warn!(%key, "consumed BookTicker for non-registered market");
            return;
        };
        slot.store(Some(Arc::new(record)));

        // Fan out to registered listeners, if any
        if let Some(tx) = self.listeners.lock().get(key) {
            let _ = tx.send(record);
        }
    }

    /// Invalidate all published snapshots originating from the provided venue.
    ///
    /// Called when a venue stream disconnects so that consumers cannot act on state that
    /// pre-dates the reconnect.
    pub fn invalidate_exchange(&self, exchange: ExchangeId) {
        for (key, slot) in self
            .tickers
            .iter()
            .filter(|(key, _)| key.exchange == exchange)
        {
            slot.store(None);
            if let Some(book) = self.books.get(key) {
                *book.write() = OrderBook::default();
            }
        }
    }

    /// Consume a merged [`BookTicker`] stream, publishing each snapshot.
    ///
    /// `Reconnecting` events invalidate all snapshots of the disconnected venue.
    pub async fn run_tickers<St>(self: Arc<Self>, mut stream: St)
    where
        St: Stream<Item = MarketStreamEvent<MarketDataInstrument, BookTicker>> + Unpin,
    {
        while let Some(event) = stream.next().await {
            match event {
                MarketStreamEvent::Reconnecting(exchange) => {
                    warn!(%exchange, "BookTicker stream disconnected - invalidating snapshots");
                    self.invalidate_exchange(exchange);
                }
                MarketStreamEvent::Item(event) => {
                    let key = MarketKey::new(event.exchange, event.instrument);
                    self.publish_ticker(&key, event.kind);
                }
            }
        }
    }

    /// Consume a merged L2 [`OrderBookEvent`] stream, maintaining the local books.
    ///
    /// A crossed top-of-book after an applied update means local state has diverged - the
    /// book is cleared so depth consumers observe an empty (unusable) book until the next
    /// authoritative snapshot arrives.
    pub async fn run_books<St>(self: Arc<Self>, mut stream: St)
    where
        St: Stream<Item = MarketStreamEvent<MarketDataInstrument, OrderBookEvent>> + Unpin,
    {
        while let Some(event) = stream.next().await {
            let event = match event {
                MarketStreamEvent::Reconnecting(exchange) => {
                    warn!(%exchange, "OrderBook stream disconnected - clearing local books");
                    self.invalidate_exchange(exchange);
                    continue;
                }
                MarketStreamEvent::Item(event) => event,
            };

            let key = MarketKey::new(event.exchange, event.instrument);
            let Some(book) = self.books.get(&key) else {
                warn!(%key, "consumed OrderBookEvent for non-registered market");
                continue;
            };

            let mut book_lock = book.write();
            book_lock.update(&event.kind);

            if let Some((best_bid, best_ask)) = book_lock.is_crossed() {
                error!(
                    %key,
                    best_bid,
                    best_ask,
                    "crossed local OrderBook - clearing until next authoritative snapshot"
                );
                *book_lock = OrderBook::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis_instrument::instrument::kind::MarketDataInstrumentKind;

    fn key(exchange: ExchangeId) -> MarketKey {
        MarketKey::new(
            exchange,
            MarketDataInstrument::from(("btc", "usdt", exchange.market_kind())),
        )
    }

    fn ticker(bid: f64, ask: f64) -> BookTicker {
        BookTicker {
            time_exchange: Utc::now(),
            bid_price: bid,
            bid_amount: 1.0,
            ask_price: ask,
            ask_amount: 1.0,
            update_id: None,
        }
    }

    #[test]
    fn test_publish_and_read_ticker() {
        let mexc = key(ExchangeId::MexcSpot);
        let cache = MarketDataCache::new([mexc.clone()]);

        assert!(cache.ticker(&mexc).is_none());

        cache.publish_ticker(&mexc, ticker(100.0, 100.1));
        let record = cache.ticker(&mexc).unwrap();
        assert_eq!(record.ticker.bid_price, 100.0);

        // New snapshot replaces the old one atomically
        cache.publish_ticker(&mexc, ticker(101.0, 101.1));
        let record = cache.ticker(&mexc).unwrap();
        assert_eq!(record.ticker.bid_price, 101.0);
    }

    #[test]
    fn test_invalidate_exchange_only_clears_matching_venue() {
        let mexc = key(ExchangeId::MexcSpot);
        let gateio = key(ExchangeId::GateioSpot);
        let cache = MarketDataCache::new([mexc.clone(), gateio.clone()]);

        cache.publish_ticker(&mexc, ticker(100.0, 100.1));
        cache.publish_ticker(&gateio, ticker(100.2, 100.3));

        cache.invalidate_exchange(ExchangeId::MexcSpot);

        assert!(cache.ticker(&mexc).is_none());
        assert!(cache.ticker(&gateio).is_some());
    }

    #[test]
    fn test_publish_unregistered_key_is_ignored() {
        let cache = MarketDataCache::new([key(ExchangeId::MexcSpot)]);
        let unregistered = key(ExchangeId::GateioSpot);

        cache.publish_ticker(&unregistered, ticker(100.0, 100.1));
        assert!(cache.ticker(&unregistered).is_none());
    }

    #[tokio::test]
    async fn test_subscribe_tickers_receives_published_snapshots() {
        let mexc = key(ExchangeId::MexcSpot);
        let cache = MarketDataCache::new([mexc.clone()]);

        let mut rx = cache.subscribe_tickers(&mexc);
        cache.publish_ticker(&mexc, ticker(100.0, 100.1));

        let record = rx.recv().await.unwrap();
        assert_eq!(record.ticker.ask_price, 100.1);
    }
}
