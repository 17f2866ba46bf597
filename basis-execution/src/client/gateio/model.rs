use crate::order::{
    Order, OrderKind, OrderStatus, TimeInForce,
    id::{ClientOrderId, OrderId},
};
use basis_instrument::{
    Side,
    instrument::{SymbolInfo, name::InstrumentNameExchange},
};
use basis_integration::de::de_str;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Gate.io spot order payload.
///
/// `left` is the unfilled base amount, so `filled = amount - left`.
///
/// ### Raw Payload Examples
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#create-an-order>
/// ```json
/// {
///   "id": "12332324",
///   "text": "t-basis-1",
///   "create_time_ms": 1606292218231,
///   "currency_pair": "BTC_USDT",
///   "status": "open",
///   "type": "limit",
///   "side": "buy",
///   "amount": "1",
///   "price": "5.00032",
///   "left": "0.5",
///   "time_in_force": "gtc"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GateioSpotOrder {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub create_time_ms: Option<DateTime<Utc>>,
    pub currency_pair: String,
    pub status: GateioSpotOrderStatus,
    #[serde(rename = "type")]
    pub kind: GateioOrderKind,
    pub side: GateioSide,
    #[serde(deserialize_with = "de_str")]
    pub amount: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub price: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub left: Decimal,
    pub time_in_force: GateioTimeInForce,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateioSpotOrderStatus {
    Open,
    Closed,
    Cancelled,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateioOrderKind {
    Limit,
    Market,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateioSide {
    Buy,
    Sell,
}

impl From<GateioSide> for Side {
    fn from(value: GateioSide) -> Self {
        match value {
            GateioSide::Buy => Side::Buy,
            GateioSide::Sell => Side::Sell,
        }
    }
}

impl From<Side> for GateioSide {
    fn from(value: Side) -> Self {
        match value {
            Side::Buy => GateioSide::Buy,
            Side::Sell => GateioSide::Sell,
        }
    }
}

/// Gate.io time-in-force.
///
/// `poc` is the post-only ("pending or cancel") maker flag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateioTimeInForce {
    Gtc,
    Ioc,
    Poc,
    Fok,
}

impl From<GateioTimeInForce> for TimeInForce {
    fn from(value: GateioTimeInForce) -> Self {
        match value {
            GateioTimeInForce::Gtc | GateioTimeInForce::Poc => TimeInForce::GoodUntilCancelled,
            GateioTimeInForce::Ioc => TimeInForce::ImmediateOrCancel,
            GateioTimeInForce::Fok => TimeInForce::FillOrKill,
        }
    }
}

impl From<TimeInForce> for GateioTimeInForce {
    fn from(value: TimeInForce) -> Self {
        match value {
            TimeInForce::GoodUntilCancelled => GateioTimeInForce::Gtc,
            TimeInForce::ImmediateOrCancel => GateioTimeInForce::Ioc,
            TimeInForce::FillOrKill => GateioTimeInForce::Fok,
        }
    }
}

impl From<GateioSpotOrder> for Order {
    fn from(value: GateioSpotOrder) -> Self {
        let filled_quantity = value.amount - value.left;

        let status = match value.status {
            GateioSpotOrderStatus::Open if filled_quantity > Decimal::ZERO => {
                OrderStatus::PartiallyFilled
            }
            GateioSpotOrderStatus::Open => OrderStatus::New,
            GateioSpotOrderStatus::Closed => OrderStatus::Filled,
            GateioSpotOrderStatus::Cancelled => OrderStatus::Canceled,
        };

        Self {
            id: OrderId::from(value.id.as_str()),
            client_order_id: value.text.map(|text| ClientOrderId::from(text.as_str())),
            instrument: InstrumentNameExchange::from(value.currency_pair),
            side: Side::from(value.side),
            kind: match value.kind {
                GateioOrderKind::Limit => OrderKind::Limit,
                GateioOrderKind::Market => OrderKind::Market,
            },
            price: value.price,
            quantity: value.amount,
            filled_quantity,
            status,
            time_in_force: TimeInForce::from(value.time_in_force),
            time_exchange: value.create_time_ms.unwrap_or_else(Utc::now),
            fee: None,
        }
    }
}

/// Gate.io USDT-margined perpetual order payload.
///
/// `size` and `left` are signed contract counts - negative values communicate a sell.
///
/// ### Raw Payload Examples
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#create-a-futures-order>
/// ```json
/// {
///   "id": 15675394,
///   "contract": "BTC_USDT",
///   "size": -100,
///   "left": -20,
///   "price": "54696.6",
///   "fill_price": "54696.6",
///   "status": "open",
///   "tif": "gtc",
///   "create_time": 1545136464
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GateioFuturesOrder {
    pub id: u64,
    #[serde(default)]
    pub text: Option<String>,
    pub contract: String,
    pub size: i64,
    pub left: i64,
    #[serde(deserialize_with = "de_str")]
    pub price: Decimal,
    pub status: GateioFuturesOrderStatus,
    #[serde(default)]
    pub finish_as: Option<String>,
    pub tif: GateioTimeInForce,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub create_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateioFuturesOrderStatus {
    Open,
    Finished,
}

impl GateioFuturesOrder {
    /// Convert to a normalised [`Order`], scaling contract counts to base quantities with
    /// the provided contract size.
    pub fn into_order(self, contract_size: Decimal) -> Order {
        let quantity_contracts = Decimal::from(self.size.abs());
        let left_contracts = Decimal::from(self.left.abs());
        let filled_contracts = quantity_contracts - left_contracts;

        let status = match (self.status, self.finish_as.as_deref()) {
            (GateioFuturesOrderStatus::Open, _) if filled_contracts > Decimal::ZERO => {
                OrderStatus::PartiallyFilled
            }
            (GateioFuturesOrderStatus::Open, _) => OrderStatus::New,
            (GateioFuturesOrderStatus::Finished, Some("filled")) => OrderStatus::Filled,
            (GateioFuturesOrderStatus::Finished, Some("expired")) => OrderStatus::Expired,
            (GateioFuturesOrderStatus::Finished, _) => OrderStatus::Canceled,
        };

        Order {
            id: OrderId::new_from(self.id),
            client_order_id: self.text.map(|text| ClientOrderId::from(text.as_str())),
            instrument: InstrumentNameExchange::from(self.contract),
            side: if self.size >= 0 { Side::Buy } else { Side::Sell },
            kind: OrderKind::Limit,
            price: self.price,
            quantity: quantity_contracts * contract_size,
            filled_quantity: filled_contracts * contract_size,
            status,
            time_in_force: TimeInForce::from(self.tif),
            time_exchange: self.create_time.unwrap_or_else(Utc::now),
            fee: None,
        }
    }
}

/// Gate.io spot currency pair trading rules.
///
/// `fee` is a percentage (eg/ "0.2" is 20bps).
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#get-details-of-a-specifc-currency-pair>
#[derive(Debug, Clone, Deserialize)]
pub struct GateioCurrencyPair {
    pub id: String,
    #[serde(deserialize_with = "de_str")]
    pub fee: Decimal,
    #[serde(default, deserialize_with = "de_str_opt")]
    pub min_base_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de_str_opt")]
    pub min_quote_amount: Option<Decimal>,
    pub amount_precision: u32,
    pub precision: u32,
    pub trade_status: String,
}

impl From<GateioCurrencyPair> for SymbolInfo {
    fn from(value: GateioCurrencyPair) -> Self {
        let fee_fraction = value.fee / Decimal::ONE_HUNDRED;
        Self {
            name_exchange: InstrumentNameExchange::from(value.id),
            base_precision: value.amount_precision,
            quote_precision: value.precision,
            min_base_quantity: value.min_base_amount.unwrap_or(Decimal::ZERO),
            min_quote_quantity: value.min_quote_amount.unwrap_or(Decimal::ZERO),
            maker_fee: fee_fraction,
            taker_fee: fee_fraction,
            contract_size: None,
            inactive: value.trade_status != "tradable",
        }
    }
}

/// Gate.io USDT-margined perpetual contract trading rules.
///
/// `quanto_multiplier` is the contract size in base asset units.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#get-a-single-contract>
#[derive(Debug, Clone, Deserialize)]
pub struct GateioContract {
    pub name: String,
    #[serde(deserialize_with = "de_str")]
    pub quanto_multiplier: Decimal,
    pub order_size_min: i64,
    #[serde(deserialize_with = "de_str")]
    pub maker_fee_rate: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub taker_fee_rate: Decimal,
    pub order_price_round: String,
    #[serde(default)]
    pub in_delisting: bool,
}

impl From<GateioContract> for SymbolInfo {
    fn from(value: GateioContract) -> Self {
        let quote_precision = value
            .order_price_round
            .split('.')
            .nth(1)
            .map(|decimals| decimals.len() as u32)
            .unwrap_or(0);

        Self {
            name_exchange: InstrumentNameExchange::from(value.name),
            base_precision: value.quanto_multiplier.scale(),
            quote_precision,
            min_base_quantity: Decimal::from(value.order_size_min) * value.quanto_multiplier,
            min_quote_quantity: Decimal::ZERO,
            maker_fee: value.maker_fee_rate,
            taker_fee: value.taker_fee_rate,
            contract_size: Some(value.quanto_multiplier),
            inactive: value.in_delisting,
        }
    }
}

/// Gate.io spot account balance entry.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#list-spot-accounts>
#[derive(Debug, Clone, Deserialize)]
pub struct GateioSpotAccount {
    pub currency: String,
    #[serde(deserialize_with = "de_str")]
    pub available: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub locked: Decimal,
}

/// Gate.io USDT-margined perpetual account summary.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#query-futures-account>
#[derive(Debug, Clone, Deserialize)]
pub struct GateioFuturesAccount {
    pub currency: String,
    #[serde(deserialize_with = "de_str")]
    pub total: Decimal,
    #[serde(deserialize_with = "de_str")]
    pub available: Decimal,
}

fn de_str_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    Option::<&str>::deserialize(deserializer)?
        .map(|value| value.parse::<Decimal>().map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_de_gateio_spot_order_into_order() {
        let input = r#"
        {
            "id": "12332324",
            "text": "t-basis-1",
            "create_time_ms": 1606292218231,
            "currency_pair": "BTC_USDT",
            "status": "open",
            "type": "limit",
            "side": "buy",
            "amount": "1",
            "price": "5.00032",
            "left": "0.5",
            "time_in_force": "gtc"
        }
        "#;

        let order = Order::from(serde_json::from_str::<GateioSpotOrder>(input).unwrap());

        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_quantity, dec!(0.5));
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.time_in_force, TimeInForce::GoodUntilCancelled);
    }

    #[test]
    fn test_gateio_futures_order_into_order_scales_contracts() {
        let input = r#"
        {
            "id": 15675394,
            "contract": "BTC_USDT",
            "size": -100,
            "left": -20,
            "price": "54696.6",
            "status": "open",
            "tif": "gtc",
            "create_time": 1545136464
        }
        "#;

        let futures_order = serde_json::from_str::<GateioFuturesOrder>(input).unwrap();
        let order = futures_order.into_order(dec!(0.0001));

        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.quantity, dec!(0.0100));
        assert_eq!(order.filled_quantity, dec!(0.0080));
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
    }

    #[test]
    fn test_de_gateio_contract_into_symbol_info() {
        let input = r#"
        {
            "name": "BTC_USDT",
            "quanto_multiplier": "0.0001",
            "order_size_min": 1,
            "maker_fee_rate": "-0.00025",
            "taker_fee_rate": "0.00075",
            "order_price_round": "0.1",
            "in_delisting": false
        }
        "#;

        let info = SymbolInfo::from(serde_json::from_str::<GateioContract>(input).unwrap());

        assert_eq!(info.contract_size, Some(dec!(0.0001)));
        assert_eq!(info.min_base_quantity, dec!(0.0001));
        assert_eq!(info.quote_precision, 1);
        assert_eq!(info.taker_fee, dec!(0.00075));
    }

    #[test]
    fn test_de_gateio_currency_pair_fee_is_percentage() {
        let input = r#"
        {
            "id": "BTC_USDT",
            "fee": "0.2",
            "min_base_amount": "0.0001",
            "min_quote_amount": "1",
            "amount_precision": 4,
            "precision": 2,
            "trade_status": "tradable"
        }
        "#;

        let info = SymbolInfo::from(serde_json::from_str::<GateioCurrencyPair>(input).unwrap());

        assert_eq!(info.taker_fee, dec!(0.002));
        assert!(!info.inactive);
    }
}
