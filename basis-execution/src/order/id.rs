use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Venue-assigned order identifier.
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
pub struct OrderId(pub SmolStr);

impl OrderId {
    pub fn new_from<S>(id: S) -> Self
    where
        S: std::fmt::Display,
    {
        Self(SmolStr::new(id.to_string()))
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Client-assigned order identifier, echoed back by the venue.
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
pub struct ClientOrderId(pub SmolStr);

impl From<&str> for ClientOrderId {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
