use crate::books::Level;
use basis_integration::de::de_str;
use serde::{Deserialize, Serialize};

/// Level 1 book ticker types (top of book).
pub mod l1;

/// Level 2 OrderBook types.
pub mod l2;

/// [`Gateio`](super::Gateio) OrderBook level.
///
/// #### Raw Payload Examples
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#limited-level-full-order-book-snapshot>
///
/// ```json
/// ["16493.50", "0.006"]
/// ```
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialOrd, PartialEq)]
pub struct GateioLevel {
    #[serde(deserialize_with = "de_str")]
    pub price: f64,
    #[serde(deserialize_with = "de_str")]
    pub amount: f64,
}

impl From<GateioLevel> for Level {
    fn from(level: GateioLevel) -> Self {
        Self {
            price: level.price,
            amount: level.amount,
        }
    }
}
