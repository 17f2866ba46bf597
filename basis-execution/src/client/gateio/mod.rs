use self::{
    model::{GateioOrderKind, GateioSide, GateioTimeInForce},
    parser::GateioHttpParser,
    requests::{
        CurrencyPairParams, FuturesCancelOrder, FuturesGetAccount, FuturesGetContract,
        FuturesGetOpenOrders, FuturesGetOrder, FuturesOpenOrdersParams, FuturesPlaceOrder,
        FuturesPlaceOrderBody, SpotCancelOrder, SpotGetAccounts, SpotGetCurrencyPair,
        SpotGetOpenOrders, SpotGetOrder, SpotOpenOrdersParams, SpotPlaceOrder, SpotPlaceOrderBody,
    },
    signer::{GateioRequestSigner, GateioSigner},
};
use super::{ApiCredentials, ExecutionClient};
use crate::{
    balance::{AssetBalance, Balance},
    error::{ApiError, ClientError, UnindexedClientError},
    order::{
        Order, OrderKind,
        id::OrderId,
        request::{CancelOrderRequest, OpenOrderRequest},
    },
};
use async_trait::async_trait;
use basis_instrument::{
    Side,
    asset::AssetNameExchange,
    exchange::ExchangeId,
    instrument::{MarketDataInstrument, SymbolInfo, name::InstrumentNameExchange},
};
use basis_integration::{
    protocol::http::{private::encoder::HexEncoder, rest::client::RestClient},
    rate_limit::{Priority, RateLimiter},
};
use chrono::Utc;
use fnv::FnvHashMap;
use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sha2::Sha512;
use std::time::Duration;
use tracing::warn;

/// Gate.io order, account and trading rule payloads.
pub mod model;

/// Gate.io [`HttpParser`](basis_integration::protocol::http::HttpParser) implementation.
pub mod parser;

/// Gate.io [`RestRequest`](basis_integration::protocol::http::rest::RestRequest) definitions.
pub mod requests;

/// Gate.io request signing strategy.
pub mod signer;

/// Gate.io REST API base url, shared by spot and perpetual endpoint groups.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/>
pub const BASE_URL_GATEIO: &str = "https://api.gateio.ws";

/// Gate.io REST rate limit for private endpoints.
const RATE_LIMIT_CAPACITY: usize = 10;
const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Endpoint group a [`GateioExecution`] client trades on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum GateioServerKind {
    Spot,
    PerpetualsUsd,
}

/// Gate.io [`ExecutionClient`] covering the spot and USDT-margined perpetual endpoint
/// groups, which share base url, signing, and error mapping.
#[derive(Debug)]
pub struct GateioExecution {
    server: GateioServerKind,
    rest_client: RestClient<'static, GateioRequestSigner, GateioHttpParser>,
    rate_limiter: RateLimiter,
    /// Contract sizes per perpetual contract, populated by `fetch_symbol_info`. Used to
    /// translate between base quantities and the venue's signed contract counts.
    contract_sizes: RwLock<FnvHashMap<InstrumentNameExchange, Decimal>>,
}

impl GateioExecution {
    pub fn spot(credentials: ApiCredentials) -> Self {
        Self::new(GateioServerKind::Spot, credentials)
    }

    pub fn perpetuals_usd(credentials: ApiCredentials) -> Self {
        Self::new(GateioServerKind::PerpetualsUsd, credentials)
    }

    fn new(server: GateioServerKind, credentials: ApiCredentials) -> Self {
        let hmac = Hmac::<Sha512>::new_from_slice(credentials.api_secret.as_bytes())
            .expect("HMAC can take keys of any size");

        let signer =
            GateioRequestSigner::new(GateioSigner::new(credentials.api_key), hmac, HexEncoder);

        Self {
            server,
            rest_client: RestClient::new(BASE_URL_GATEIO, signer, GateioHttpParser),
            rate_limiter: RateLimiter::new(RATE_LIMIT_CAPACITY, RATE_LIMIT_INTERVAL),
            contract_sizes: RwLock::new(FnvHashMap::default()),
        }
    }

    fn instrument_name(instrument: &MarketDataInstrument) -> String {
        format!("{}_{}", instrument.base, instrument.quote).to_uppercase()
    }

    fn contract_size(&self, instrument: &InstrumentNameExchange) -> Decimal {
        self.contract_sizes
            .read()
            .get(instrument)
            .copied()
            .unwrap_or(Decimal::ONE)
    }

    async fn handle_rate_limit(&self, error: &UnindexedClientError) {
        if let ClientError::Api(ApiError::RateLimit { retry_after_secs }) = error {
            let window = Duration::from_secs(retry_after_secs.unwrap_or(1));
            warn!(?window, server = ?self.server, "rate limited - suspending submissions");
            self.rate_limiter.suspend_for(window).await;
        }
    }
}

#[async_trait]
impl ExecutionClient for GateioExecution {
    fn exchange(&self) -> ExchangeId {
        match self.server {
            GateioServerKind::Spot => ExchangeId::GateioSpot,
            GateioServerKind::PerpetualsUsd => ExchangeId::GateioPerpetualsUsd,
        }
    }

    async fn fetch_symbol_info(
        &self,
        instrument: &MarketDataInstrument,
    ) -> Result<SymbolInfo, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Low).await;
        let name = Self::instrument_name(instrument);

        match self.server {
            GateioServerKind::Spot => {
                let (pair, _) = self
                    .rest_client
                    .execute(SpotGetCurrencyPair {
                        currency_pair: name,
                    })
                    .await?;
                Ok(SymbolInfo::from(pair))
            }
            GateioServerKind::PerpetualsUsd => {
                let (contract, _) = self
                    .rest_client
                    .execute(FuturesGetContract { contract: name })
                    .await?;

                let info = SymbolInfo::from(contract);
                if let Some(contract_size) = info.contract_size {
                    self.contract_sizes
                        .write()
                        .insert(info.name_exchange.clone(), contract_size);
                }
                Ok(info)
            }
        }
    }

    async fn open_order(&self, request: OpenOrderRequest) -> Result<Order, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::High).await;

        let result = match self.server {
            GateioServerKind::Spot => {
                let price = match request.kind {
                    OrderKind::Market | OrderKind::StopMarket => None,
                    _ => Some(request.price),
                };

                let place = SpotPlaceOrder {
                    body: SpotPlaceOrderBody {
                        currency_pair: request.instrument.to_string(),
                        kind: match request.kind {
                            OrderKind::Market | OrderKind::StopMarket => GateioOrderKind::Market,
                            _ => GateioOrderKind::Limit,
                        },
                        side: GateioSide::from(request.side),
                        amount: request.quantity,
                        price,
                        time_in_force: GateioTimeInForce::from(request.time_in_force),
                        text: request.client_order_id.as_ref().map(|id| format!("t-{id}")),
                    },
                };

                self.rest_client
                    .execute(place)
                    .await
                    .map(|(order, _)| Order::from(order))
            }
            GateioServerKind::PerpetualsUsd => {
                let contract_size = self.contract_size(&request.instrument);
                let contracts = (request.quantity / contract_size).trunc();
                let signed_contracts = match request.side {
                    Side::Buy => contracts,
                    Side::Sell => -contracts,
                };
                let size = signed_contracts.to_i64().ok_or_else(|| {
                    ClientError::Api(ApiError::OrderRejected(format!(
                        "contract count out of range: {contracts}"
                    )))
                })?;

                let place = FuturesPlaceOrder {
                    body: FuturesPlaceOrderBody {
                        contract: request.instrument.to_string(),
                        size,
                        price: match request.kind {
                            // "0" price communicates a market order
                            OrderKind::Market | OrderKind::StopMarket => "0".to_string(),
                            _ => request.price.to_string(),
                        },
                        tif: GateioTimeInForce::from(request.time_in_force),
                        text: request.client_order_id.as_ref().map(|id| format!("t-{id}")),
                    },
                };

                self.rest_client
                    .execute(place)
                    .await
                    .map(|(order, _)| order.into_order(contract_size))
            }
        };

        if let Err(error) = &result {
            self.handle_rate_limit(error).await;
        }
        result
    }

    async fn cancel_order(
        &self,
        request: CancelOrderRequest,
    ) -> Result<Order, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::High).await;

        let result = match self.server {
            GateioServerKind::Spot => self
                .rest_client
                .execute(SpotCancelOrder {
                    order_id: request.id.to_string(),
                    params: CurrencyPairParams {
                        currency_pair: request.instrument.to_string(),
                    },
                })
                .await
                .map(|(order, _)| Order::from(order)),
            GateioServerKind::PerpetualsUsd => self
                .rest_client
                .execute(FuturesCancelOrder {
                    order_id: request.id.to_string(),
                })
                .await
                .map(|(order, _)| order.into_order(self.contract_size(&request.instrument))),
        };

        if let Err(error) = &result {
            self.handle_rate_limit(error).await;
        }
        result
    }

    async fn fetch_order(
        &self,
        instrument: &InstrumentNameExchange,
        id: &OrderId,
    ) -> Result<Order, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Normal).await;

        match self.server {
            GateioServerKind::Spot => {
                let (order, _) = self
                    .rest_client
                    .execute(SpotGetOrder {
                        order_id: id.to_string(),
                        params: CurrencyPairParams {
                            currency_pair: instrument.to_string(),
                        },
                    })
                    .await?;
                Ok(Order::from(order))
            }
            GateioServerKind::PerpetualsUsd => {
                let (order, _) = self
                    .rest_client
                    .execute(FuturesGetOrder {
                        order_id: id.to_string(),
                    })
                    .await?;
                Ok(order.into_order(self.contract_size(instrument)))
            }
        }
    }

    async fn fetch_open_orders(
        &self,
        instrument: Option<&InstrumentNameExchange>,
    ) -> Result<Vec<Order>, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Normal).await;

        let Some(instrument) = instrument else {
            return Err(ClientError::Api(ApiError::Venue {
                code: 0,
                message: "Gateio open orders query requires an instrument".to_string(),
            }));
        };

        match self.server {
            GateioServerKind::Spot => {
                let (orders, _) = self
                    .rest_client
                    .execute(SpotGetOpenOrders {
                        params: SpotOpenOrdersParams {
                            currency_pair: instrument.to_string(),
                            status: "open",
                        },
                    })
                    .await?;
                Ok(orders.into_iter().map(Order::from).collect())
            }
            GateioServerKind::PerpetualsUsd => {
                let contract_size = self.contract_size(instrument);
                let (orders, _) = self
                    .rest_client
                    .execute(FuturesGetOpenOrders {
                        params: FuturesOpenOrdersParams {
                            contract: instrument.to_string(),
                            status: "open",
                        },
                    })
                    .await?;
                Ok(orders
                    .into_iter()
                    .map(|order| order.into_order(contract_size))
                    .collect())
            }
        }
    }

    async fn fetch_balances(
        &self,
    ) -> Result<Vec<AssetBalance<AssetNameExchange>>, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Normal).await;
        let time_exchange = Utc::now();

        match self.server {
            GateioServerKind::Spot => {
                let (accounts, _) = self.rest_client.execute(SpotGetAccounts).await?;
                Ok(accounts
                    .into_iter()
                    .map(|account| AssetBalance {
                        asset: AssetNameExchange::from(account.currency.as_str()),
                        balance: Balance {
                            total: account.available + account.locked,
                            free: account.available,
                        },
                        time_exchange,
                    })
                    .collect())
            }
            GateioServerKind::PerpetualsUsd => {
                let (account, _) = self.rest_client.execute(FuturesGetAccount).await?;
                Ok(vec![AssetBalance {
                    asset: AssetNameExchange::from(account.currency.as_str()),
                    balance: Balance {
                        total: account.total,
                        free: account.available,
                    },
                    time_exchange,
                }])
            }
        }
    }
}
