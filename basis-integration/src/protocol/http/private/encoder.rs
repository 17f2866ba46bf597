/// Encodes signature bytes into the `String` format the venue expects.
pub trait Encoder {
    /// Encodes the bytes data into some `String` format.
    fn encode<Bytes>(&self, data: Bytes) -> String
    where
        Bytes: AsRef<[u8]>;
}

/// Encodes signature bytes as a hex `String` using lowercase characters.
///
/// Both supported venue APIs (MEXC HMAC-SHA256, Gate.io HMAC-SHA512) expect lowercase hex
/// signatures.
#[derive(Debug, Copy, Clone)]
pub struct HexEncoder;

impl Encoder for HexEncoder {
    fn encode<Bytes>(&self, data: Bytes) -> String
    where
        Bytes: AsRef<[u8]>,
    {
        hex::encode(data)
    }
}
