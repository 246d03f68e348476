use multibase::Base::Base58Btc;

use super::errors::Error;

/// Key algorithms recognised in multicodec-prefixed key encodings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Algorithm {
    Ed25519,
    X25519,
    Secp256k1,
    BLS12381,
    P256,
    P384,
    P521,
    RSA,
}

use Algorithm::*;

// See:
// - https://w3c-ccg.github.io/did-method-key/#signature-method-creation-algorithm
// - https://github.com/multiformats/multicodec/blob/master/table.csv
impl Algorithm {
    /// Returns the two-byte (varint) multicodec prefix of the algorithm.
    pub fn multicodec_prefix(&self) -> [u8; 2] {
        match self {
            Ed25519 => [0xed, 0x01],
            X25519 => [0xec, 0x01],
            Secp256k1 => [0xe7, 0x01],
            BLS12381 => [0xeb, 0x01],
            P256 => [0x80, 0x24],
            P384 => [0x81, 0x24],
            P521 => [0x82, 0x24],
            RSA => [0x85, 0x24],
        }
    }

    /// Maps a multicodec prefix back to its algorithm.
    pub fn from_multicodec_prefix(prefix: &[u8; 2]) -> Option<Self> {
        match prefix {
            [0xed, 0x01] => Some(Ed25519),
            [0xec, 0x01] => Some(X25519),
            [0xe7, 0x01] => Some(Secp256k1),
            [0xeb, 0x01] => Some(BLS12381),
            [0x80, 0x24] => Some(P256),
            [0x81, 0x24] => Some(P384),
            [0x82, 0x24] => Some(P521),
            [0x85, 0x24] => Some(RSA),
            _ => None,
        }
    }

    /// Returns the length of the public key for the algorithm, if fixed.
    pub fn public_key_length(&self) -> Option<usize> {
        match self {
            Ed25519 | X25519 => Some(32),
            Secp256k1 | P256 => Some(33),
            P384 => Some(49),
            BLS12381 | P521 | RSA => None,
        }
    }
}

/// Decodes a base58btc multikey into its algorithm and raw key bytes.
pub fn decode_multikey(multikey: &str) -> Result<(Algorithm, Vec<u8>), Error> {
    let (base, decoded) = multibase::decode(multikey).map_err(|err| Error::InvalidMultikey(err.to_string()))?;
    if base != Base58Btc {
        return Err(Error::InvalidMultikey(format!("unexpected base {base:?}")));
    }

    if decoded.len() < 2 {
        return Err(Error::InvalidMultikey("missing multicodec prefix".to_string()));
    }

    let prefix = [decoded[0], decoded[1]];
    let alg = Algorithm::from_multicodec_prefix(&prefix).ok_or(Error::Unsupported)?;
    let key = decoded[2..].to_vec();

    if let Some(required_length) = alg.public_key_length() {
        if required_length != key.len() {
            return Err(Error::InvalidKeyLength);
        }
    }

    Ok((alg, key))
}

/// Encodes raw key bytes as a base58btc multikey.
pub fn encode_multikey(alg: Algorithm, key: &[u8]) -> String {
    multibase::encode(Base58Btc, [&alg.multicodec_prefix()[..], key].concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multikey_encoding_of_known_ed25519_key() {
        let key = hex::decode("3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29").unwrap();
        let multikey = encode_multikey(Ed25519, &key);
        assert_eq!(multikey, "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");

        let (alg, decoded) = decode_multikey(&multikey).unwrap();
        assert_eq!(alg, Ed25519);
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_decode_multikey_detects_algorithm() {
        let (alg, key) = decode_multikey("zQ3shokFTS3brHcDQrn82RUDfCZESWL1ZdCEJwekUDPQiYBme").unwrap();
        assert_eq!(alg, Secp256k1);
        assert_eq!(key.len(), 33);
    }

    #[test]
    fn test_decode_multikey_failures() {
        // not multibase
        assert!(matches!(decode_multikey("6MkiTBz1y"), Err(Error::InvalidMultikey(_))));
        // base64url multibase instead of base58btc
        assert!(matches!(decode_multikey("uAQID"), Err(Error::InvalidMultikey(_))));
        // truncated Ed25519 key
        let truncated = multibase::encode(Base58Btc, [0xed, 0x01, 0x01, 0x02]);
        assert_eq!(decode_multikey(&truncated), Err(Error::InvalidKeyLength));
        // unknown multicodec
        let unknown = multibase::encode(Base58Btc, [0x00, 0x00, 0x01]);
        assert_eq!(decode_multikey(&unknown), Err(Error::Unsupported));
    }
}
