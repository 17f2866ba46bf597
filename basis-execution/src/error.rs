use basis_instrument::{
    asset::AssetNameExchange, exchange::ExchangeId, instrument::name::InstrumentNameExchange,
};
use basis_integration::{Unrecoverable, error::SocketError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type UnindexedClientError = ClientError<AssetNameExchange, InstrumentNameExchange>;
pub type UnindexedApiError = ApiError<AssetNameExchange, InstrumentNameExchange>;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum ClientError<AssetKey, InstrumentKey> {
    #[error("Connectivity: {0}")]
    Connectivity(#[from] ConnectivityError),

    #[error("API: {0}")]
    Api(#[from] ApiError<AssetKey, InstrumentKey>),
}

impl<AssetKey, InstrumentKey> ClientError<AssetKey, InstrumentKey> {
    /// Determine if retrying the failed operation is reasonable.
    ///
    /// Fatal errors (authentication) and permanent business errors must surface to the
    /// caller instead of being retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Connectivity(_) => true,
            ClientError::Api(api) => api.is_transient(),
        }
    }

    /// Optional venue-suggested pause before the next submission, in seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ClientError::Api(ApiError::RateLimit { retry_after_secs }) => *retry_after_secs,
            _ => None,
        }
    }
}

impl<AssetKey, InstrumentKey> Unrecoverable for ClientError<AssetKey, InstrumentKey> {
    fn is_unrecoverable(&self) -> bool {
        matches!(self, ClientError::Api(ApiError::AuthenticationFailed(_)))
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum ConnectivityError {
    #[error("exchange offline: {0}")]
    ExchangeOffline(ExchangeId),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Socket(String),
}

impl From<SocketError> for ConnectivityError {
    fn from(value: SocketError) -> Self {
        match value {
            SocketError::HttpTimeout(_) => Self::Timeout,
            other => Self::Socket(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum ApiError<AssetKey, InstrumentKey> {
    /// Venue signalled throttling; carries the suggested pause when the venue provides one.
    #[error("rate limit exceeded, retry after: {retry_after_secs:?}s")]
    RateLimit { retry_after_secs: Option<u64> },

    /// Invalid or expired credentials. Fatal - the owning strategy must halt.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("asset {0} invalid: {1}")]
    AssetInvalid(AssetKey, String),

    #[error("instrument {0} invalid: {1}")]
    InstrumentInvalid(InstrumentKey, String),

    #[error("asset {0} balance insufficient: {1}")]
    BalanceInsufficient(AssetKey, String),

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("order not found")]
    OrderNotFound,

    #[error("trading disabled: {0}")]
    TradingDisabled(String),

    /// Venue business error that does not map onto a dedicated variant.
    #[error("venue error code {code}: {message}")]
    Venue { code: i64, message: String },
}

impl<AssetKey, InstrumentKey> ApiError<AssetKey, InstrumentKey> {
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RateLimit { .. } | ApiError::Venue { .. } => true,
            ApiError::AuthenticationFailed(_)
            | ApiError::AssetInvalid(_, _)
            | ApiError::InstrumentInvalid(_, _)
            | ApiError::BalanceInsufficient(_, _)
            | ApiError::OrderRejected(_)
            | ApiError::OrderNotFound
            | ApiError::TradingDisabled(_) => false,
        }
    }
}

impl<AssetKey, InstrumentKey> From<SocketError> for ClientError<AssetKey, InstrumentKey> {
    fn from(value: SocketError) -> Self {
        match value {
            SocketError::RateLimited { retry_after_secs } => {
                Self::Api(ApiError::RateLimit { retry_after_secs })
            }
            other => Self::Connectivity(ConnectivityError::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_is_transient() {
        struct TestCase {
            input: UnindexedClientError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: connectivity errors retry
                input: ClientError::Connectivity(ConnectivityError::Timeout),
                expected: true,
            },
            TestCase {
                // TC1: rate limits retry after the window
                input: ClientError::Api(ApiError::RateLimit {
                    retry_after_secs: Some(2),
                }),
                expected: true,
            },
            TestCase {
                // TC2: rejected orders surface to the strategy
                input: ClientError::Api(ApiError::OrderRejected("oversold".to_string())),
                expected: false,
            },
            TestCase {
                // TC3: auth failures are fatal
                input: ClientError::Api(ApiError::AuthenticationFailed(
                    "invalid key".to_string(),
                )),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.input.is_transient(), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_auth_failure_is_unrecoverable() {
        let error: UnindexedClientError =
            ClientError::Api(ApiError::AuthenticationFailed("invalid key".to_string()));
        assert!(error.is_unrecoverable());

        let error: UnindexedClientError = ClientError::Connectivity(ConnectivityError::Timeout);
        assert!(!error.is_unrecoverable());
    }
}
