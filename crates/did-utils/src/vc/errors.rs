use thiserror::Error;

use crate::{
    canon::CanonicalizationError, crypto::Error as CryptoError, methods::DIDResolutionError, proof::ProofError,
};

/// Hard failures of issuance and verification.
///
/// Findings about a document under verification are never reported through
/// this type; they land in a [`VerificationResult`](super::VerificationResult).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("invalid presentation: {0}")]
    InvalidPresentation(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),
    #[error("a challenge is required")]
    MissingChallenge,
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
    #[error("resolution of {did} failed: {error}")]
    Resolution { did: String, error: DIDResolutionError },
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ProofError> for Error {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Canonicalization(err) => Error::Canonicalization(err),
            ProofError::Crypto(err) => Error::Crypto(err),
            ProofError::Serialization(message) | ProofError::MalformedProof(message) => Error::Internal(message),
        }
    }
}
