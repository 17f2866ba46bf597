use self::{
    model::{MexcOrderKind, MexcSide},
    parser::MexcHttpParser,
    requests::{
        CancelOrder, GetAccount, GetExchangeInfo, GetOpenOrders, GetOrder, OrderQueryParams,
        PlaceOrder, PlaceOrderParams, SymbolParams,
    },
    signer::{MexcRequestSigner, MexcSigner},
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
    asset::AssetNameExchange,
    exchange::ExchangeId,
    instrument::{MarketDataInstrument, SymbolInfo, name::InstrumentNameExchange},
};
use basis_integration::{
    protocol::http::{private::encoder::HexEncoder, rest::client::RestClient},
    rate_limit::{Priority, RateLimiter},
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use tracing::warn;

/// MEXC order response and trading rule payloads.
pub mod model;

/// MEXC [`HttpParser`](basis_integration::protocol::http::HttpParser) implementation.
pub mod parser;

/// MEXC [`RestRequest`](basis_integration::protocol::http::rest::RestRequest) definitions.
pub mod requests;

/// MEXC request signing strategy.
pub mod signer;

/// MEXC REST API base url.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#general-info>
pub const BASE_URL_MEXC: &str = "https://api.mexc.com";

/// MEXC REST rate limit: 20 requests per second per endpoint group.
const RATE_LIMIT_CAPACITY: usize = 20;
const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

/// MEXC spot [`ExecutionClient`].
#[derive(Debug)]
pub struct MexcExecution {
    rest_client: RestClient<'static, MexcRequestSigner, MexcHttpParser>,
    rate_limiter: RateLimiter,
}

impl MexcExecution {
    pub fn new(credentials: ApiCredentials) -> Self {
        let hmac = Hmac::<Sha256>::new_from_slice(credentials.api_secret.as_bytes())
            .expect("HMAC can take keys of any size");

        let signer = MexcRequestSigner::new(
            MexcSigner::new(credentials.api_key),
            hmac,
            HexEncoder,
        );

        Self {
            rest_client: RestClient::new(BASE_URL_MEXC, signer, MexcHttpParser),
            rate_limiter: RateLimiter::new(RATE_LIMIT_CAPACITY, RATE_LIMIT_INTERVAL),
        }
    }

    fn instrument_name(instrument: &MarketDataInstrument) -> String {
        format!("{}{}", instrument.base, instrument.quote).to_uppercase()
    }

    /// Honour venue throttling signals before surfacing the error to the caller.
    async fn handle_rate_limit(&self, error: &UnindexedClientError) {
        if let ClientError::Api(ApiError::RateLimit { retry_after_secs }) = error {
            let window = Duration::from_secs(retry_after_secs.unwrap_or(1));
            warn!(?window, exchange = %ExchangeId::MexcSpot, "rate limited - suspending submissions");
            self.rate_limiter.suspend_for(window).await;
        }
    }
}

#[async_trait]
impl ExecutionClient for MexcExecution {
    fn exchange(&self) -> ExchangeId {
        ExchangeId::MexcSpot
    }

    async fn fetch_symbol_info(
        &self,
        instrument: &MarketDataInstrument,
    ) -> Result<SymbolInfo, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Low).await;

        let symbol = Self::instrument_name(instrument);
        let request = GetExchangeInfo {
            params: SymbolParams {
                symbol: symbol.clone(),
            },
        };

        let (response, _) = self.rest_client.execute(request).await?;

        response
            .symbols
            .into_iter()
            .find(|venue_symbol| venue_symbol.symbol == symbol)
            .map(SymbolInfo::from)
            .ok_or_else(|| {
                ClientError::Api(ApiError::InstrumentInvalid(
                    InstrumentNameExchange::from(symbol.as_str()),
                    "not present in exchangeInfo".to_string(),
                ))
            })
    }

    async fn open_order(&self, request: OpenOrderRequest) -> Result<Order, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::High).await;

        let price = match request.kind {
            OrderKind::Market | OrderKind::StopMarket => None,
            _ => Some(request.price),
        };

        let place = PlaceOrder {
            params: PlaceOrderParams {
                symbol: request.instrument.to_string(),
                side: MexcSide::from(request.side),
                kind: MexcOrderKind::from(request.kind),
                quantity: request.quantity,
                price,
                new_client_order_id: request
                    .client_order_id
                    .as_ref()
                    .map(|id| id.to_string()),
            },
        };

        match self.rest_client.execute(place).await {
            Ok((response, _)) => Ok(Order::from(response)),
            Err(error) => {
                self.handle_rate_limit(&error).await;
                Err(error)
            }
        }
    }

    async fn cancel_order(
        &self,
        request: CancelOrderRequest,
    ) -> Result<Order, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::High).await;

        let cancel = CancelOrder {
            params: OrderQueryParams {
                symbol: request.instrument.to_string(),
                order_id: request.id.to_string(),
            },
        };

        match self.rest_client.execute(cancel).await {
            Ok((response, _)) => Ok(Order::from(response)),
            Err(error) => {
                self.handle_rate_limit(&error).await;
                Err(error)
            }
        }
    }

    async fn fetch_order(
        &self,
        instrument: &InstrumentNameExchange,
        id: &OrderId,
    ) -> Result<Order, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Normal).await;

        let get = GetOrder {
            params: OrderQueryParams {
                symbol: instrument.to_string(),
                order_id: id.to_string(),
            },
        };

        let (response, _) = self.rest_client.execute(get).await?;
        Ok(Order::from(response))
    }

    async fn fetch_open_orders(
        &self,
        instrument: Option<&InstrumentNameExchange>,
    ) -> Result<Vec<Order>, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Normal).await;

        let Some(instrument) = instrument else {
            return Err(ClientError::Api(ApiError::Venue {
                code: 0,
                message: "Mexc open orders query requires a symbol".to_string(),
            }));
        };

        let get = GetOpenOrders {
            params: SymbolParams {
                symbol: instrument.to_string(),
            },
        };

        let (response, _) = self.rest_client.execute(get).await?;
        Ok(response.into_iter().map(Order::from).collect())
    }

    async fn fetch_balances(
        &self,
    ) -> Result<Vec<AssetBalance<AssetNameExchange>>, UnindexedClientError> {
        self.rate_limiter.acquire(Priority::Normal).await;

        let (response, _) = self.rest_client.execute(GetAccount).await?;
        let time_exchange = Utc::now();

        Ok(response
            .balances
            .into_iter()
            .map(|balance| AssetBalance {
                asset: AssetNameExchange::from(balance.asset.as_str()),
                balance: Balance {
                    total: balance.free + balance.locked,
                    free: balance.free,
                },
                time_exchange,
            })
            .collect())
    }
}
