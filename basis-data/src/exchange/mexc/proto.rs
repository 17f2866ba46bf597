//! Hand-maintained `prost` message definitions for the MEXC V3 public WebSocket streams.
//!
//! MEXC pushes public market data as protobuf binary frames. Only the aggregated deals and
//! aggregated book ticker bodies are modelled - other body variants are skipped by the
//! decoder and ignored upstream.
//!
//! See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#websocket-market-data>

/// Envelope for every MEXC V3 public push message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushDataV3ApiWrapper {
    /// Full channel the message was pushed on,
    /// eg/ "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".
    #[prost(string, tag = "1")]
    pub channel: ::prost::alloc::string::String,

    #[prost(string, optional, tag = "3")]
    pub symbol: ::core::option::Option<::prost::alloc::string::String>,

    #[prost(string, optional, tag = "4")]
    pub symbol_id: ::core::option::Option<::prost::alloc::string::String>,

    /// Event creation time in millisecond unix epoch.
    #[prost(int64, optional, tag = "5")]
    pub create_time: ::core::option::Option<i64>,

    /// Server send time in millisecond unix epoch.
    #[prost(int64, optional, tag = "6")]
    pub send_time: ::core::option::Option<i64>,

    #[prost(oneof = "push_data_v3_api_wrapper::Body", tags = "312, 313")]
    pub body: ::core::option::Option<push_data_v3_api_wrapper::Body>,
}

/// Nested message and enum types in `PushDataV3ApiWrapper`.
pub mod push_data_v3_api_wrapper {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "312")]
        PublicAggreDeals(super::PublicAggreDealsV3Api),
        #[prost(message, tag = "313")]
        PublicAggreBookTicker(super::PublicAggreBookTickerV3Api),
    }
}

/// Aggregated public trades body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublicAggreDealsV3Api {
    #[prost(message, repeated, tag = "1")]
    pub deals: ::prost::alloc::vec::Vec<PublicAggreDealItem>,

    #[prost(string, tag = "2")]
    pub event_type: ::prost::alloc::string::String,
}

/// A single aggregated public trade.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublicAggreDealItem {
    #[prost(string, tag = "1")]
    pub price: ::prost::alloc::string::String,

    #[prost(string, tag = "2")]
    pub quantity: ::prost::alloc::string::String,

    /// 1 = buy, 2 = sell.
    #[prost(int32, tag = "3")]
    pub trade_type: i32,

    /// Trade time in millisecond unix epoch.
    #[prost(int64, tag = "4")]
    pub time: i64,
}

/// Aggregated best bid/ask body.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublicAggreBookTickerV3Api {
    #[prost(string, tag = "1")]
    pub bid_price: ::prost::alloc::string::String,

    #[prost(string, tag = "2")]
    pub bid_quantity: ::prost::alloc::string::String,

    #[prost(string, tag = "3")]
    pub ask_price: ::prost::alloc::string::String,

    #[prost(string, tag = "4")]
    pub ask_quantity: ::prost::alloc::string::String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_wrapper_round_trip() {
        let wrapper = PushDataV3ApiWrapper {
            channel: "spot@public.aggre.bookTicker.v3.api.pb@100ms@BTCUSDT".to_string(),
            symbol: Some("BTCUSDT".to_string()),
            symbol_id: None,
            create_time: Some(1609459200000),
            send_time: Some(1609459200500),
            body: Some(push_data_v3_api_wrapper::Body::PublicAggreBookTicker(
                PublicAggreBookTickerV3Api {
                    bid_price: "50000.5".to_string(),
                    bid_quantity: "0.1".to_string(),
                    ask_price: "50001".to_string(),
                    ask_quantity: "0.2".to_string(),
                },
            )),
        };

        let encoded = wrapper.encode_to_vec();
        let decoded = PushDataV3ApiWrapper::decode(encoded.as_slice()).unwrap();
        assert_eq!(decoded, wrapper);
    }
}
