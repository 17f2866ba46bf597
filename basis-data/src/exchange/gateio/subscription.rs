use super::message::GateioMessage;
use basis_integration::{Validator, error::SocketError};
use serde::{Deserialize, Serialize};

/// Expected [`Gateio`](super::Gateio) [`Subscription`](crate::subscription::Subscription)
/// response type wrapped in the generic [`GateioMessage<T>`](GateioMessage).
///
/// The `result` payload is absent on failure responses, so it is modelled as `Option`.
pub type GateioSubResponse = GateioMessage<Option<GateioSubResult>>;

/// Expected [`Gateio`](super::Gateio) [`Subscription`](crate::subscription::Subscription)
/// response payload.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/ws/en/#server-response>
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct GateioSubResult {
    pub status: String,
}

impl Validator for GateioSubResponse {
    fn validate(self) -> Result<Self, SocketError>
    where
        Self: Sized,
    {
        match &self.error {
            None => Ok(self),
            Some(failure) => Err(SocketError::Subscribe(format!(
                "received failure subscription response code: {} with message: {}",
                failure.code, failure.message,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::gateio::message::GateioError;

    mod de {
        use super::*;

        #[test]
        fn test_gateio_sub_response() {
            struct TestCase {
                input: &'static str,
                expected: GateioSubResponse,
            }

            let tests = vec![
                TestCase {
                    // TC0: subscription success
                    input: r#"
                    {
                        "time": 1606292218,
                        "time_ms": 1606292218231,
                        "channel": "spot.book_ticker",
                        "event": "subscribe",
                        "result": {
                            "status": "success"
                        }
                    }
                    "#,
                    expected: GateioSubResponse {
                        channel: "spot.book_ticker".to_string(),
                        error: None,
                        data: Some(GateioSubResult {
                            status: "success".to_string(),
                        }),
                    },
                },
                TestCase {
                    // TC1: subscription failure with null result
                    input: r#"
                    {
                        "time": 1606292218,
                        "time_ms": 1606292218231,
                        "channel": "spot.book_ticker",
                        "event": "subscribe",
                        "error": {
                            "code": 2,
                            "message": "unknown currency pair GIBBERISH_USD"
                        },
                        "result": null
                    }
                    "#,
                    expected: GateioSubResponse {
                        channel: "spot.book_ticker".to_string(),
                        error: Some(GateioError {
                            code: 2,
                            message: "unknown currency pair GIBBERISH_USD".to_string(),
                        }),
                        data: None,
                    },
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                let actual = serde_json::from_str::<GateioSubResponse>(test.input).unwrap();
                assert_eq!(actual, test.expected, "TC{} failed", index);
            }
        }
    }

    #[test]
    fn test_validate_gateio_sub_response() {
        struct TestCase {
            input_response: GateioSubResponse,
            is_valid: bool,
        }

        let cases = vec![
            TestCase {
                // TC0: input response is successful subscription
                input_response: GateioSubResponse {
                    channel: "spot.book_ticker".to_string(),
                    error: None,
                    data: Some(GateioSubResult {
                        status: "success".to_string(),
                    }),
                },
                is_valid: true,
            },
            TestCase {
                // TC1: input response is failed subscription
                input_response: GateioSubResponse {
                    channel: "spot.book_ticker".to_string(),
                    error: Some(GateioError {
                        code: 2,
                        message: "unknown currency pair".to_string(),
                    }),
                    data: None,
                },
                is_valid: false,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let actual = test.input_response.validate().is_ok();
            assert_eq!(actual, test.is_valid, "TestCase {} failed", index);
        }
    }
}
