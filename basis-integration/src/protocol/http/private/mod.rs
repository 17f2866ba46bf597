use self::encoder::Encoder;
use crate::{
    error::SocketError,
    protocol::http::{BuildStrategy, rest::RestRequest},
};
use hmac::Mac;

/// Defines how to encode signature bytes into the `String` format the venue expects.
///
/// eg/ lowercase hex (MEXC, Gate.io).
pub mod encoder;

/// Defines how to sign a [`RestRequest`] for a specific venue API.
///
/// Each venue supplies the message construction logic; the shared [`RequestSigner`] drives
/// the Mac update, signature encoding, and final request construction.
pub trait Signer {
    /// Configuration required to sign every [`RestRequest`] for this venue.
    type Config<'a>
    where
        Self: 'a;

    fn config<'a, Request>(
        &'a self,
        request: Request,
        builder: &reqwest::RequestBuilder,
    ) -> Result<Self::Config<'a>, SocketError>
    where
        Request: RestRequest;

    fn add_bytes_to_sign<M>(mac: &mut M, config: &Self::Config<'_>)
    where
        M: Mac;

    fn build_signed_request(
        config: Self::Config<'_>,
        builder: reqwest::RequestBuilder,
        signature: String,
    ) -> Result<reqwest::Request, SocketError>;
}

/// [`BuildStrategy`] that signs [`RestRequest`]s using venue specific [`Signer`] logic, a
/// hashable [`Mac`], and a signature [`Encoder`].
#[derive(Debug, Clone)]
pub struct RequestSigner<Sig, HmacMac, SignatureEncoder> {
    signer: Sig,
    mac: HmacMac,
    encoder: SignatureEncoder,
}

impl<Sig, HmacMac, SignatureEncoder> RequestSigner<Sig, HmacMac, SignatureEncoder> {
    pub fn new(signer: Sig, mac: HmacMac, encoder: SignatureEncoder) -> Self {
        Self {
            signer,
            mac,
            encoder,
        }
    }
}

impl<Sig, HmacMac, SignatureEncoder> BuildStrategy for RequestSigner<Sig, HmacMac, SignatureEncoder>
where
    Sig: Signer,
    HmacMac: Mac + Clone,
    SignatureEncoder: Encoder,
{
    fn build<Request>(
        &self,
        request: Request,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, SocketError>
    where
        Request: RestRequest,
    {
        // Construct venue specific sign configuration from the request
        let config = self.signer.config(request, &builder)?;

        // Generate signature bytes over the venue specific message
        let mut mac = self.mac.clone();
        Sig::add_bytes_to_sign(&mut mac, &config);
        let signature = self.encoder.encode(mac.finalize().into_bytes());

        Sig::build_signed_request(config, builder, signature)
    }
}
