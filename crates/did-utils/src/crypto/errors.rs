use thiserror::Error;

/// Failures of key handling, signing, and signature checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("random number generator unavailable")]
    RandomnessUnavailable,
    /// The signature bytes do not form an Ed25519 signature.
    #[error("malformed signature")]
    MalformedSignature,
    /// The key is not on a curve the toolkit signs with.
    #[error("invalid curve")]
    InvalidCurve,
    #[error("invalid key length")]
    InvalidKeyLength,
    /// The key has no usable secret part.
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("signing failed")]
    SigningFailed,
    /// The signature is well formed but does not match the payload.
    #[error("signature does not match")]
    SignatureMismatch,
    #[error("invalid multikey: {0}")]
    InvalidMultikey(String),
    /// The multicodec tag names a key type the toolkit does not handle.
    #[error("unsupported algorithm")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(Error::SignatureMismatch.to_string(), "signature does not match");
        assert_eq!(Error::InvalidMultikey("bad base".to_string()).to_string(), "invalid multikey: bad base");
    }
}
