use super::model::{MexcAccount, MexcExchangeInfo, MexcOrder, MexcOrderKind, MexcSide};
use basis_integration::protocol::http::rest::RestRequest;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{borrow::Cow, time::Duration};

/// Critical path (order management) Http request timeout.
const ORDER_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Place a new order.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#new-order>
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub params: PlaceOrderParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderParams {
    pub symbol: String,
    pub side: MexcSide,
    #[serde(rename = "type")]
    pub kind: MexcOrderKind,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_client_order_id: Option<String>,
}

impl RestRequest for PlaceOrder {
    type Response = MexcOrder;
    type QueryParams = PlaceOrderParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/order")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }

    fn timeout() -> Duration {
        ORDER_REQUEST_TIMEOUT
    }
}

/// Cancel a working order.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#cancel-order>
#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub params: OrderQueryParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryParams {
    pub symbol: String,
    pub order_id: String,
}

impl RestRequest for CancelOrder {
    type Response = MexcOrder;
    type QueryParams = OrderQueryParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/order")
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

/// Fetch the venue's current view of an order.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#query-order>
#[derive(Debug, Clone)]
pub struct GetOrder {
    pub params: OrderQueryParams,
}

impl RestRequest for GetOrder {
    type Response = MexcOrder;
    type QueryParams = OrderQueryParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/order")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

/// Fetch all working orders for a symbol.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#current-open-orders>
#[derive(Debug, Clone)]
pub struct GetOpenOrders {
    pub params: SymbolParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolParams {
    pub symbol: String,
}

impl RestRequest for GetOpenOrders {
    type Response = Vec<MexcOrder>;
    type QueryParams = SymbolParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/openOrders")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}

/// Fetch account balances.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#account-information>
#[derive(Debug, Clone, Copy)]
pub struct GetAccount;

impl RestRequest for GetAccount {
    type Response = MexcAccount;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/account")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}

/// Fetch the trading rules for a symbol.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#exchange-information>
#[derive(Debug, Clone)]
pub struct GetExchangeInfo {
    pub params: SymbolParams,
}

impl RestRequest for GetExchangeInfo {
    type Response = MexcExchangeInfo;
    type QueryParams = SymbolParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/api/v3/exchangeInfo")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.params)
    }
}
