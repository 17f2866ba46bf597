use crate::error::{ApiError, UnindexedApiError, UnindexedClientError};
use basis_integration::{error::SocketError, protocol::http::HttpParser};
use reqwest::StatusCode;
use serde::Deserialize;

/// MEXC REST API error payload.
///
/// ### Raw Payload Examples
/// ```json
/// { "code": 30004, "msg": "Insufficient position" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MexcApiError {
    pub code: i64,
    pub msg: String,
}

/// Parses MEXC REST responses, mapping venue error codes onto the normalised
/// [`ApiError`] taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct MexcHttpParser;

impl HttpParser for MexcHttpParser {
    type ApiError = MexcApiError;
    type OutputError = UnindexedClientError;

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError {
        let api_error: UnindexedApiError = match (status, error.code) {
            // Venue throttling; Retry-After is honoured by the caller's rate limiter
            (StatusCode::TOO_MANY_REQUESTS, _) | (_, 429) => ApiError::RateLimit {
                retry_after_secs: None,
            },
            // Invalid api key, signature, or timestamp outside recv window
            (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) | (_, 700002 | 700003) => {
                ApiError::AuthenticationFailed(error.msg)
            }
            // Insufficient position / oversold
            (_, 30004 | 30005) => ApiError::BalanceInsufficient(
                basis_instrument::asset::AssetNameExchange::from("unknown"),
                error.msg,
            ),
            // Below minimum transaction volume
            (_, 30002) => ApiError::OrderRejected(error.msg),
            (_, -2011 | -2013) => ApiError::OrderNotFound,
            // Symbol not supported / not trading
            (_, 10007) => ApiError::InstrumentInvalid(
                basis_instrument::instrument::name::InstrumentNameExchange::from("unknown"),
                error.msg,
            ),
            (_, 30016) => ApiError::TradingDisabled(error.msg),
            (_, code) => ApiError::Venue {
                code,
                message: error.msg,
            },
        };

        UnindexedClientError::Api(api_error)
    }
}

impl MexcHttpParser {
    /// Map a transport-level [`SocketError`] into the normalised client error.
    pub fn map_socket_error(error: SocketError) -> UnindexedClientError {
        UnindexedClientError::from(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn test_parse_api_error() {
        struct TestCase {
            status: StatusCode,
            error: MexcApiError,
            expected_transient: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: rate limited
                status: StatusCode::TOO_MANY_REQUESTS,
                error: MexcApiError {
                    code: 429,
                    msg: "Too many requests".to_string(),
                },
                expected_transient: true,
            },
            TestCase {
                // TC1: invalid signature is fatal
                status: StatusCode::OK,
                error: MexcApiError {
                    code: 700002,
                    msg: "Signature for this request is not valid".to_string(),
                },
                expected_transient: false,
            },
            TestCase {
                // TC2: oversold surfaces to the strategy
                status: StatusCode::OK,
                error: MexcApiError {
                    code: 30005,
                    msg: "Oversold".to_string(),
                },
                expected_transient: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = MexcHttpParser.parse_api_error(test.status, test.error);
            match actual {
                ClientError::Api(api) => {
                    assert_eq!(api.is_transient(), test.expected_transient, "TC{index} failed")
                }
                other => panic!("TC{index} produced unexpected error: {other:?}"),
            }
        }
    }
}
