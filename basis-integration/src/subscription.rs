use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};

/// New type representing a unique `String` identifier for a stream that has been subscribed to.
/// This is used to identify data structures received over the socket.
///
/// For example, `Basis-Data` uses this identifier to associate received data structures from a
/// venue with the original `Subscription` that was actioned over the socket.
///
/// Note: Each venue requires a different `String` format depending on the data structures
/// it sends.
///
/// eg/ [`SubscriptionId`] of a Gate.io book ticker is "spot.book_ticker|{BASE}_{QUOTE}".
/// eg/ [`SubscriptionId`] of a MEXC book ticker is "{base_channel}|{SYMBOL}".
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct SubscriptionId(pub SmolStr);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SubscriptionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SubscriptionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<S> From<S> for SubscriptionId
where
    S: Into<SmolStr>,
{
    fn from(input: S) -> Self {
        Self(input.into())
    }
}
