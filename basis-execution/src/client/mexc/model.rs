use crate::order::{Order, OrderKind, OrderStatus, TimeInForce, id::{ClientOrderId, OrderId}};
use basis_instrument::{
    Side,
    instrument::{SymbolInfo, name::InstrumentNameExchange},
};
use basis_integration::de::de_str;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// MEXC order response, common to placement, cancellation and queries.
///
/// ### Raw Payload Examples
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#query-order>
/// ```json
/// {
///   "symbol": "BTCUSDT",
///   "orderId": "C02__443776347957968896",
///   "clientOrderId": "basis-1",
///   "price": "30000",
///   "origQty": "0.001",
///   "executedQty": "0.0005",
///   "status": "PARTIALLY_FILLED",
///   "type": "LIMIT",
///   "side": "BUY",
///   "updateTime": 1499827319559
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcOrder {
    pub symbol: String,
    pub order_id: serde_json::Value,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(deserialize_with = "de_str")]
    pub price: Decimal,
    #[serde(rename = "origQty", deserialize_with = "de_str")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty", default)]
    pub executed_qty: Option<String>,
    #[serde(default)]
    pub status: Option<MexcOrderStatus>,
    #[serde(rename = "type")]
    pub kind: MexcOrderKind,
    pub side: MexcSide,
    #[serde(
        default,
        alias = "transactTime",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MexcOrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PartiallyCanceled,
    Rejected,
    Expired,
}

impl From<MexcOrderStatus> for OrderStatus {
    fn from(value: MexcOrderStatus) -> Self {
        match value {
            MexcOrderStatus::New => OrderStatus::New,
            MexcOrderStatus::PartiallyFilled => OrderStatus::PartiallyFilled,
            MexcOrderStatus::Filled => OrderStatus::Filled,
            MexcOrderStatus::Canceled | MexcOrderStatus::PartiallyCanceled => {
                OrderStatus::Canceled
            }
            MexcOrderStatus::Rejected => OrderStatus::Rejected,
            MexcOrderStatus::Expired => OrderStatus::Expired,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MexcOrderKind {
    Limit,
    Market,
    LimitMaker,
    ImmediateOrCancel,
    FillOrKill,
}

impl From<MexcOrderKind> for OrderKind {
    fn from(value: MexcOrderKind) -> Self {
        match value {
            MexcOrderKind::Limit => OrderKind::Limit,
            MexcOrderKind::Market => OrderKind::Market,
            MexcOrderKind::LimitMaker => OrderKind::LimitMaker,
            MexcOrderKind::ImmediateOrCancel => OrderKind::ImmediateOrCancel,
            MexcOrderKind::FillOrKill => OrderKind::FillOrKill,
        }
    }
}

impl From<OrderKind> for MexcOrderKind {
    fn from(value: OrderKind) -> Self {
        match value {
            OrderKind::Limit | OrderKind::StopLimit => MexcOrderKind::Limit,
            OrderKind::Market | OrderKind::StopMarket => MexcOrderKind::Market,
            OrderKind::LimitMaker => MexcOrderKind::LimitMaker,
            OrderKind::ImmediateOrCancel => MexcOrderKind::ImmediateOrCancel,
            OrderKind::FillOrKill => MexcOrderKind::FillOrKill,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MexcSide {
    Buy,
    Sell,
}

impl From<MexcSide> for Side {
    fn from(value: MexcSide) -> Self {
        match value {
            MexcSide::Buy => Side::Buy,
            MexcSide::Sell => Side::Sell,
        }
    }
}

impl From<Side> for MexcSide {
    fn from(value: Side) -> Self {
        match value {
            Side::Buy => MexcSide::Buy,
            Side::Sell => MexcSide::Sell,
        }
    }
}

impl From<MexcOrder> for Order {
    fn from(value: MexcOrder) -> Self {
        let filled_quantity = value
            .executed_qty
            .as_deref()
            .and_then(|qty| qty.parse::<Decimal>().ok())
            .unwrap_or(Decimal::ZERO);

        let order_id = match &value.order_id {
            serde_json::Value::String(id) => OrderId::from(id.as_str()),
            other => OrderId::new_from(other),
        };

        Self {
            id: order_id,
            client_order_id: value.client_order_id.map(|id| ClientOrderId::from(id.as_str())),
            instrument: InstrumentNameExchange::from(value.symbol),
            side: Side::from(value.side),
            kind: OrderKind::from(value.kind),
            price: value.price,
            quantity: value.orig_qty,
            filled_quantity,
            status: value.status.map(OrderStatus::from).unwrap_or(OrderStatus::New),
            time_in_force: TimeInForce::GoodUntilCancelled,
            time_exchange: value.update_time.unwrap_or_else(Utc::now),
            fee: None,
        }
    }
}

/// MEXC account information payload.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#account-information>
#[derive(Debug, Clone, Deserialize)]
pub struct MexcAccount {
    pub balances: Vec<MexcBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MexcBalance {
    pub asset: String,
    #[serde(deserialize_with = "de_str")]
    pub free: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub locked: Decimal,
}

/// MEXC exchange information payload.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#exchange-information>
#[derive(Debug, Clone, Deserialize)]
pub struct MexcExchangeInfo {
    pub symbols: Vec<MexcSymbol>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcSymbol {
    pub symbol: String,
    pub base_asset_precision: u32,
    pub quote_precision: u32,
    /// Minimum order size denominated in the base asset, eg/ "0.0001".
    #[serde(deserialize_with = "de_str")]
    pub base_size_precision: Decimal,
    /// Minimum order notional denominated in the quote asset, eg/ "5".
    #[serde(deserialize_with = "de_str")]
    pub quote_amount_precision: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub maker_commission: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub taker_commission: Decimal,
    pub is_spot_trading_allowed: bool,
}

impl From<MexcSymbol> for SymbolInfo {
    fn from(value: MexcSymbol) -> Self {
        Self {
            name_exchange: InstrumentNameExchange::from(value.symbol),
            base_precision: value.base_asset_precision,
            quote_precision: value.quote_precision,
            min_base_quantity: value.base_size_precision,
            min_quote_quantity: value.quote_amount_precision,
            maker_fee: value.maker_commission,
            taker_fee: value.taker_commission,
            contract_size: None,
            inactive: !value.is_spot_trading_allowed,
        }
    }
}
