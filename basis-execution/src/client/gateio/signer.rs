use basis_integration::{
    error::SocketError,
    protocol::http::{
        private::{RequestSigner, Signer, encoder::HexEncoder},
        rest::RestRequest,
    },
};
use chrono::Utc;
use derive_more::Constructor;
use sha2::{Digest, Sha512};

pub type GateioRequestSigner = RequestSigner<GateioSigner, hmac::Hmac<sha2::Sha512>, HexEncoder>;

/// Gate.io request signing strategy.
///
/// The HMAC-SHA512 signature is computed over
/// `"{method}\n{path}\n{query}\n{hex(sha512(body))}\n{timestamp}"` and sent via the `SIGN`
/// header, alongside `KEY` and `Timestamp` headers.
///
/// See docs: <https://www.gate.io/docs/developers/apiv4/en/#api-signature-string-generation>
#[derive(Debug, Clone, Constructor)]
pub struct GateioSigner {
    pub api_key: String,
}

#[derive(Debug)]
pub struct GateioSignConfig<'a> {
    api_key: &'a str,
    timestamp: i64,
    method: reqwest::Method,
    path: String,
    query: String,
    body_hash_hex: String,
}

impl Signer for GateioSigner {
    type Config<'a>
        = GateioSignConfig<'a>
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
        let query = match request.query_params() {
            Some(params) => serde_urlencoded::to_string(params)?,
            None => String::default(),
        };

        let body = match request.body() {
            Some(body) => serde_json::to_vec(body).map_err(SocketError::Serialise)?,
            None => Vec::default(),
        };
        let body_hash_hex = hex::encode(Sha512::digest(&body));

        Ok(Self::Config {
            api_key: self.api_key.as_str(),
            timestamp: Utc::now().timestamp(),
            method: Request::method(),
            path: request.path().into_owned(),
            query,
            body_hash_hex,
        })
    }

    fn add_bytes_to_sign<M>(mac: &mut M, config: &Self::Config<'_>)
    where
        M: hmac::Mac,
    {
        mac.update(config.method.as_str().as_bytes());
        mac.update(b"\n");
        mac.update(config.path.as_bytes());
        mac.update(b"\n");
        mac.update(config.query.as_bytes());
        mac.update(b"\n");
        mac.update(config.body_hash_hex.as_bytes());
        mac.update(b"\n");
        mac.update(config.timestamp.to_string().as_bytes());
    }

    fn build_signed_request(
        config: Self::Config<'_>,
        builder: reqwest::RequestBuilder,
        signature: String,
    ) -> Result<reqwest::Request, SocketError> {
        const KEY_HEADER: &str = "KEY";
        const TIMESTAMP_HEADER: &str = "Timestamp";
        const SIGNATURE_HEADER: &str = "SIGN";

        builder
            .header(KEY_HEADER, config.api_key)
            .header(TIMESTAMP_HEADER, config.timestamp)
            .header(SIGNATURE_HEADER, signature)
            .build()
            .map_err(SocketError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};

    #[test]
    fn test_signed_message_layout() {
        let config = GateioSignConfig {
            api_key: "key",
            timestamp: 1_609_459_200,
            method: reqwest::Method::POST,
            path: "/api/v4/spot/orders".to_string(),
            query: String::new(),
            body_hash_hex: hex::encode(Sha512::digest(b"{}")),
        };

        let mut mac = Hmac::<Sha512>::new_from_slice(b"secret").unwrap();
        GateioSigner::add_bytes_to_sign(&mut mac, &config);
        let actual = hex::encode(mac.finalize().into_bytes());

        let expected_message = format!(
            "POST\n/api/v4/spot/orders\n\n{}\n1609459200",
            hex::encode(Sha512::digest(b"{}"))
        );
        let mut expected_mac = Hmac::<Sha512>::new_from_slice(b"secret").unwrap();
        expected_mac.update(expected_message.as_bytes());
        let expected = hex::encode(expected_mac.finalize().into_bytes());

        assert_eq!(actual, expected);
    }
}
