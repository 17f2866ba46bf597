use basis_integration::{
    error::SocketError,
    protocol::http::{
        private::{RequestSigner, Signer, encoder::HexEncoder},
        rest::RestRequest,
    },
};
use chrono::Utc;
use derive_more::Constructor;

pub type MexcRequestSigner = RequestSigner<MexcSigner, hmac::Hmac<sha2::Sha256>, HexEncoder>;

/// MEXC request signing strategy.
///
/// The HMAC-SHA256 signature is computed over the full query string (including the
/// `timestamp` parameter) and appended as the `signature` query parameter. The API key is
/// sent via the `X-MEXC-APIKEY` header.
///
/// See docs: <https://mexcdevelop.github.io/apidocs/spot_v3_en/#signed>
#[derive(Debug, Clone, Constructor)]
pub struct MexcSigner {
    pub api_key: String,
}

#[derive(Debug)]
pub struct MexcSignConfig<'a> {
    api_key: &'a str,
    timestamp: i64,
    params_to_sign: String,
}

impl Signer for MexcSigner {
    type Config<'a>
        = MexcSignConfig<'a>
    where
        Self: 'a;

    fn config<'a, Request>(
        &'a self,
        request: Request,
        _builder: &reqwest::RequestBuilder,
    ) -> Result<Self::Config<'a>, SocketError>
    where
        Request: RestRequest,
    {
        let params_to_sign = match request.query_params() {
            Some(params) => serde_urlencoded::to_string(params)?,
            None => String::default(),
        };

        Ok(Self::Config {
            api_key: self.api_key.as_str(),
            timestamp: Utc::now().timestamp_millis(),
            params_to_sign,
        })
    }

    fn add_bytes_to_sign<M>(mac: &mut M, config: &Self::Config<'_>)
    where
        M: hmac::Mac,
    {
        // The message being signed is "{query_string}&timestamp={timestamp}", matching the
        // parameter order of the final request
        if !config.params_to_sign.is_empty() {
            mac.update(config.params_to_sign.as_bytes());
            mac.update(b"&");
        }
        mac.update(b"timestamp=");
        mac.update(config.timestamp.to_string().as_bytes());
    }

    fn build_signed_request(
        config: Self::Config<'_>,
        builder: reqwest::RequestBuilder,
        signature: String,
    ) -> Result<reqwest::Request, SocketError> {
        const KEY_HEADER: &str = "X-MEXC-APIKEY";

        builder
            .header(KEY_HEADER, config.api_key)
            .query(&[("timestamp", config.timestamp.to_string().as_str())])
            .query(&[("signature", signature.as_str())])
            .build()
            .map_err(SocketError::from)
    }
}
