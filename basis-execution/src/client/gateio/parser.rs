use crate::error::{ApiError, UnindexedApiError, UnindexedClientError};
use basis_instrument::{asset::AssetNameExchange, instrument::name::InstrumentNameExchange};
use basis_integration::protocol::http::HttpParser;
use reqwest::StatusCode;
use serde::Deserialize;

/// Gate.io REST API error payload.
///
/// ### Raw Payload Examples
/// ```json
/// { "label": "BALANCE_NOT_ENOUGH", "message": "Not enough balance" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GateioApiError {
    pub label: String,
    #[serde(default)]
    pub message: String,
}

/// Parses Gate.io REST responses, mapping venue error labels onto the normalised
/// [`ApiError`] taxonomy.
#[derive(Debug, Clone, Copy)]
pub struct GateioHttpParser;

impl HttpParser for GateioHttpParser {
    type ApiError = GateioApiError;
    type OutputError = UnindexedClientError;

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError {
        let api_error: UnindexedApiError = match (status, error.label.as_str()) {
            (StatusCode::TOO_MANY_REQUESTS, _) | (_, "TOO_MANY_REQUESTS") => {
                ApiError::RateLimit {
                    retry_after_secs: None,
                }
            }
            (_, "INVALID_KEY" | "INVALID_SIGNATURE" | "MISSING_REQUIRED_HEADER") => {
                ApiError::AuthenticationFailed(error.message)
            }
            (_, "BALANCE_NOT_ENOUGH" | "MARGIN_BALANCE_NOT_ENOUGH") => {
                ApiError::BalanceInsufficient(AssetNameExchange::from("unknown"), error.message)
            }
            (_, "INVALID_CURRENCY_PAIR" | "CONTRACT_NOT_FOUND" | "INVALID_CURRENCY") => {
                ApiError::InstrumentInvalid(
                    InstrumentNameExchange::from("unknown"),
                    error.message,
                )
            }
            (_, "ORDER_NOT_FOUND") => ApiError::OrderNotFound,
            (_, "POC_FILL_IMMEDIATELY" | "ORDER_POC_IMMEDIATE" | "AMOUNT_TOO_LITTLE") => {
                ApiError::OrderRejected(error.message)
            }
            (_, "TRADE_RESTRICTED" | "TRADING_DISABLED") => {
                ApiError::TradingDisabled(error.message)
            }
            (_, label) => ApiError::Venue {
                code: 0,
                message: format!("{label}: {}", error.message),
            },
        };

        UnindexedClientError::Api(api_error)
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
            label: &'static str,
            expected_transient: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: throttled
                status: StatusCode::TOO_MANY_REQUESTS,
                label: "TOO_MANY_REQUESTS",
                expected_transient: true,
            },
            TestCase {
                // TC1: bad signature is fatal
                status: StatusCode::UNAUTHORIZED,
                label: "INVALID_SIGNATURE",
                expected_transient: false,
            },
            TestCase {
                // TC2: insufficient balance surfaces to the strategy
                status: StatusCode::BAD_REQUEST,
                label: "BALANCE_NOT_ENOUGH",
                expected_transient: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = GateioHttpParser.parse_api_error(
                test.status,
                GateioApiError {
                    label: test.label.to_string(),
                    message: String::new(),
                },
            );
            match actual {
                ClientError::Api(api) => {
                    assert_eq!(api.is_transient(), test.expected_transient, "TC{index} failed")
                }
                other => panic!("TC{index} produced unexpected error: {other:?}"),
            }
        }
    }
}
