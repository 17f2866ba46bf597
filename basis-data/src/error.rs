use crate::subscription::SubKind;
use basis_instrument::exchange::ExchangeId;
use basis_integration::{error::SocketError, subscription::SubscriptionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `basis-data`.
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("failed to initialise reconnecting MarketStream due to empty subscriptions")]
    SubscriptionsEmpty,

    #[error("initial snapshot missing for: {0}")]
    InitialSnapshotMissing(SubscriptionId),

    #[error("initial snapshot invalid: {0}")]
    InitialSnapshotInvalid(String),

    #[error("SocketError: {0}")]
    Socket(String),

    #[error("unsupported Subscription for exchange: {exchange}, kind: {sub_kind}")]
    Unsupported {
        exchange: ExchangeId,
        sub_kind: SubKind,
    },

    #[error(
        "InvalidSequence: first_update_id {first_update_id} does not follow on from the \
         prev_last_update_id {prev_last_update_id}"
    )]
    InvalidSequence {
        prev_last_update_id: u64,
        first_update_id: u64,
    },

    #[error("crossed OrderBook: best bid {best_bid} >= best ask {best_ask}")]
    CrossedBook { best_bid: f64, best_ask: f64 },
}

impl DataError {
    /// Determine if an error requires a [`MarketStream`](super::MarketStream) to re-initialise.
    ///
    /// A sequence gap or a crossed local book means the incremental state has diverged from
    /// the venue, so the stream must resync from a fresh snapshot.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DataError::InvalidSequence { .. } | DataError::CrossedBook { .. }
        )
    }
}

impl From<SocketError> for DataError {
    fn from(value: SocketError) -> Self {
        Self::Socket(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_is_terminal() {
        struct TestCase {
            input: DataError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: is terminal w/ DataError::InvalidSequence
                input: DataError::InvalidSequence {
                    prev_last_update_id: 0,
                    first_update_id: 0,
                },
                expected: true,
            },
            TestCase {
                // TC1: is terminal w/ DataError::CrossedBook
                input: DataError::CrossedBook {
                    best_bid: 100.1,
                    best_ask: 100.0,
                },
                expected: true,
            },
            TestCase {
                // TC2: is not terminal w/ DataError::Socket
                input: DataError::from(SocketError::Sink),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_terminal();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
