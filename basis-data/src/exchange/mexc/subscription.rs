use basis_integration::{Validator, error::SocketError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Defines the aggregation interval for the MEXC aggregated public data streams.
///
/// Used when constructing the subscription topic string,
/// eg/ "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#websocket-market-data>
#[derive(Debug, Copy, Clone, Serialize, Default, Eq, PartialEq, Hash)]
pub enum MexcAggInterval {
    /// 10ms aggregation interval.
    #[serde(rename = "10ms")]
    Ms10,
    /// 100ms aggregation interval.
    #[serde(rename = "100ms")]
    #[default]
    Ms100,
}

impl MexcAggInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            MexcAggInterval::Ms10 => "10ms",
            MexcAggInterval::Ms100 => "100ms",
        }
    }
}

/// Defines the WebSocket method for MEXC subscription messages.
#[derive(Debug, Copy, Clone, Serialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MexcWsMethod {
    Subscription,
    Unsubscription,
}

/// Outbound WebSocket message for subscribing to or unsubscribing from MEXC channels.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#public-subscription>
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct MexcWsSub<'a> {
    pub method: MexcWsMethod,
    pub params: Cow<'a, [String]>,
    pub id: u64,
}

/// Inbound WebSocket message received from MEXC in response to a subscription or
/// unsubscription attempt.
///
/// ### Raw Payload Examples
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#public-subscription>
///
/// #### Subscription Success
/// ```json
/// {
///     "id": null,
///     "code": 0,
///     "msg": "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT"
/// }
/// ```
///
/// #### Subscription Failure
/// ```json
/// {
///     "id": null,
///     "code": 1,
///     "msg": "Invalid topic spot@public.aggre.bookTicker.v3.api.pb@100ms@ABC"
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct MexcSubResponse {
    /// Status code of the operation. `0` indicates success.
    pub code: i32,
    /// Optional message, used for error details or confirming a successful subscription.
    #[serde(rename = "msg", alias = "message", default)]
    pub detail: Option<String>,
    /// Optional id echoed back from the subscription request.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl Validator for MexcSubResponse {
    fn validate(self) -> Result<Self, SocketError>
    where
        Self: Sized,
    {
        if self.code == 0 {
            Ok(self)
        } else {
            Err(SocketError::Subscribe(format!(
                "subscription failed with code {}: {}",
                self.code,
                self.detail.as_deref().unwrap_or("no error detail provided")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod de {
        use super::*;

        #[test]
        fn test_mexc_sub_response() {
            struct TestCase {
                input: &'static str,
                expected: MexcSubResponse,
            }

            let tests = vec![
                TestCase {
                    // TC0: subscription success
                    input: r#"{"id":null,"code":0,"msg":"spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT"}"#,
                    expected: MexcSubResponse {
                        code: 0,
                        detail: Some(
                            "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".to_string(),
                        ),
                        id: None,
                    },
                },
                TestCase {
                    // TC1: subscription failure
                    input: r#"{"id":null,"code":1,"msg":"Invalid topic"}"#,
                    expected: MexcSubResponse {
                        code: 1,
                        detail: Some("Invalid topic".to_string()),
                        id: None,
                    },
                },
                TestCase {
                    // TC2: success with no detail
                    input: r#"{"code":0}"#,
                    expected: MexcSubResponse {
                        code: 0,
                        detail: None,
                        id: None,
                    },
                },
            ];

            for (index, test) in tests.into_iter().enumerate() {
                let actual = serde_json::from_str::<MexcSubResponse>(test.input).unwrap();
                assert_eq!(actual, test.expected, "TC{} failed", index);
            }
        }
    }

    #[test]
    fn test_validate_mexc_sub_response() {
        struct TestCase {
            input_response: MexcSubResponse,
            is_valid: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: success code
                input_response: MexcSubResponse {
                    code: 0,
                    detail: None,
                    id: None,
                },
                is_valid: true,
            },
            TestCase {
                // TC1: failure code
                input_response: MexcSubResponse {
                    code: 1,
                    detail: Some("Invalid topic".to_string()),
                    id: None,
                },
                is_valid: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input_response.validate().is_ok();
            assert_eq!(actual, test.is_valid, "TC{} failed", index);
        }
    }

    mod ser {
        use super::*;

        #[test]
        fn test_mexc_ws_sub() {
            let input = MexcWsSub {
                method: MexcWsMethod::Subscription,
                params: Cow::Owned(vec![
                    "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".to_string(),
                ]),
                id: 123,
            };

            assert_eq!(
                serde_json::to_string(&input).unwrap(),
                r#"{"method":"SUBSCRIPTION","params":["spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT"],"id":123}"#
            );
        }
    }
}
