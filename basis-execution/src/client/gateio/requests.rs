use super::model::{
    GateioContract, GateioCurrencyPair, GateioFuturesAccount, GateioFuturesOrder, GateioOrderKind,
    GateioSide, GateioSpotAccount, GateioSpotOrder, GateioTimeInForce,
};
use basis_integration::protocol::http::rest::RestRequest;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{borrow::Cow, time::Duration};

/// Critical path (order management) Http request timeout.
const ORDER_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

// ---------------------------------- spot ----------------------------------

/// Place a new spot order.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#create-an-order>
#[derive(Debug, Clone)]
pub struct SpotPlaceOrder {
    pub body: SpotPlaceOrderBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpotPlaceOrderBody {
    pub currency_pair: String,
    #[serde(rename = "type")]
    pub kind: GateioOrderKind,
    pub side: GateioSide,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub time_in_force: GateioTimeInForce,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RestRequest for SpotPlaceOrder {
    type Response = GateioSpotOrder;
    type QueryParams = ();
    type Body = SpotPlaceOrderBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v4/spot/orders")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }

    fn timeout() -> Duration {
        ORDER_REQUEST_TIMEOUT
    }
}

/// Cancel a working spot order.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#cancel-a-single-order>
#[derive(Debug, Clone)]
pub struct SpotCancelOrder {
    pub order_id: String,
    pub params: CurrencyPairParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyPairParams {
    pub currency_pair: String,
}

impl RestRequest for SpotCancelOrder {
    type Response = GateioSpotOrder;
    type QueryParams = CurrencyPairParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("/api/v4/spot/orders/{}", self.order_id))
    }

    fn method() -> reqwest::Method {
        reqwest::Method::DELETE
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }

    fn timeout() -> Duration {
        ORDER_REQUEST_TIMEOUT
    }
}

/// Fetch the venue's current view of a spot order.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#get-a-single-order>
#[derive(Debug, Clone)]
pub struct SpotGetOrder {
    pub order_id: String,
    pub params: CurrencyPairParams,
}

impl RestRequest for SpotGetOrder {
    type Response = GateioSpotOrder;
    type QueryParams = CurrencyPairParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("/api/v4/spot/orders/{}", self.order_id))
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

/// Fetch all working spot orders for a currency pair.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#list-orders>
#[derive(Debug, Clone)]
pub struct SpotGetOpenOrders {
    pub params: SpotOpenOrdersParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpotOpenOrdersParams {
    pub currency_pair: String,
    pub status: &'static str,
}

impl RestRequest for SpotGetOpenOrders {
    type Response = Vec<GateioSpotOrder>;
    type QueryParams = SpotOpenOrdersParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v4/spot/orders")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

/// Fetch spot account balances.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#list-spot-accounts>
#[derive(Debug, Clone, Copy)]
pub struct SpotGetAccounts;

impl RestRequest for SpotGetAccounts {
    type Response = Vec<GateioSpotAccount>;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v4/spot/accounts")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}

/// Fetch the trading rules for a spot currency pair.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#get-details-of-a-specifc-currency-pair>
#[derive(Debug, Clone)]
pub struct SpotGetCurrencyPair {
    pub currency_pair: String,
}

impl RestRequest for SpotGetCurrencyPair {
    type Response = GateioCurrencyPair;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("/api/v4/spot/currency_pairs/{}", self.currency_pair))
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}

// --------------------------------- futures --------------------------------

/// Place a new USDT-margined perpetual order.
///
/// `size` is a signed contract count - negative sells.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#create-a-futures-order>
#[derive(Debug, Clone)]
pub struct FuturesPlaceOrder {
    pub body: FuturesPlaceOrderBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuturesPlaceOrderBody {
    pub contract: String,
    pub size: i64,
    pub price: String,
    pub tif: GateioTimeInForce,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RestRequest for FuturesPlaceOrder {
    type Response = GateioFuturesOrder;
    type QueryParams = ();
    type Body = FuturesPlaceOrderBody;

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v4/futures/usdt/orders")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }

    fn timeout() -> Duration {
        ORDER_REQUEST_TIMEOUT
    }
}

/// Cancel a working USDT-margined perpetual order.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#cancel-a-single-order-2>
#[derive(Debug, Clone)]
pub struct FuturesCancelOrder {
    pub order_id: String,
}

impl RestRequest for FuturesCancelOrder {
    type Response = GateioFuturesOrder;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("/api/v4/futures/usdt/orders/{}", self.order_id))
    }

    fn method() -> reqwest::Method {
        reqwest::Method::DELETE
    }

    fn timeout() -> Duration {
        ORDER_REQUEST_TIMEOUT
    }
}

/// Fetch the venue's current view of a USDT-margined perpetual order.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#get-a-single-order-2>
#[derive(Debug, Clone)]
pub struct FuturesGetOrder {
    pub order_id: String,
}

impl RestRequest for FuturesGetOrder {
    type Response = GateioFuturesOrder;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("/api/v4/futures/usdt/orders/{}", self.order_id))
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}

/// Fetch all working USDT-margined perpetual orders for a contract.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#list-futures-orders>
#[derive(Debug, Clone)]
pub struct FuturesGetOpenOrders {
    pub params: FuturesOpenOrdersParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuturesOpenOrdersParams {
    pub contract: String,
    pub status: &'static str,
}

impl RestRequest for FuturesGetOpenOrders {
    type Response = Vec<GateioFuturesOrder>;
    type QueryParams = FuturesOpenOrdersParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v4/futures/usdt/orders")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

/// Fetch the USDT-margined perpetual account summary.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#query-futures-account>
#[derive(Debug, Clone, Copy)]
pub struct FuturesGetAccount;

impl RestRequest for FuturesGetAccount {
    type Response = GateioFuturesAccount;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v4/futures/usdt/accounts")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}

/// Fetch the trading rules for a USDT-margined perpetual contract.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#get-a-single-contract>
#[derive(Debug, Clone)]
pub struct FuturesGetContract {
    pub contract: String,
}

impl RestRequest for FuturesGetContract {
    type Response = GateioContract;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Owned(format!("/api/v4/futures/usdt/contracts/{}", self.contract))
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}
