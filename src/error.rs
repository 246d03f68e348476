use did_utils::{canon::CanonicalizationError, crypto::Error as CryptoError, vc};
use thiserror::Error;

/// Hard failures of the text interface.
///
/// Each variant carries a stable integer code, reported through
/// [`didkit_error_code`](crate::ffi::didkit_error_code) at the foreign-call boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("malformed key: {0}")]
    MalformedKey(String),
    #[error("crypto failure: {0}")]
    CryptoFailure(String),
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("invalid presentation: {0}")]
    InvalidPresentation(String),
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("a challenge is required")]
    MissingChallenge,
    #[error("invalid context: {0}")]
    InvalidContext(String),
    #[error("canonicalization failure: {0}")]
    CanonicalizationFailure(String),
    #[error("resolution failure: {0}")]
    ResolutionFailure(String),
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("{0}")]
    BoundaryMisuse(String),
}

impl Error {
    pub fn code(&self) -> i32 {
        match self {
            Error::MalformedInput(_) => 1,
            Error::MalformedKey(_) => 2,
            Error::CryptoFailure(_) => 3,
            Error::InvalidCredential(_) => 4,
            Error::InvalidPresentation(_) => 5,
            Error::UnsupportedProofType(_) => 6,
            Error::UnsupportedMethod(_) => 7,
            Error::MissingChallenge => 8,
            Error::InvalidContext(_) => 9,
            Error::CanonicalizationFailure(_) => 10,
            Error::ResolutionFailure(_) => 11,
            Error::KeyMismatch(_) => 12,
            Error::UnsupportedAlgorithm(_) => 13,
            Error::Internal(_) => 14,
            Error::BoundaryMisuse(_) => -1,
        }
    }
}

impl From<CanonicalizationError> for Error {
    fn from(err: CanonicalizationError) -> Self {
        match err.is_context_error() {
            true => Error::InvalidContext(err.to_string()),
            false => Error::CanonicalizationFailure(err.to_string()),
        }
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::CryptoFailure(err.to_string())
    }
}

impl From<vc::Error> for Error {
    fn from(err: vc::Error) -> Self {
        match err {
            vc::Error::InvalidCredential(message) => Error::InvalidCredential(message),
            vc::Error::InvalidPresentation(message) => Error::InvalidPresentation(message),
            vc::Error::InvalidOptions(message) => Error::MalformedInput(message),
            vc::Error::UnsupportedProofType(name) => Error::UnsupportedProofType(name),
            vc::Error::MissingChallenge => Error::MissingChallenge,
            vc::Error::KeyMismatch(message) => Error::KeyMismatch(message),
            vc::Error::Resolution { did, error } => Error::ResolutionFailure(format!("{did}: {error}")),
            vc::Error::Canonicalization(err) => err.into(),
            vc::Error::Crypto(err) => err.into(),
            vc::Error::Internal(message) => Error::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use did_utils::methods::DIDResolutionError;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            Error::MalformedInput(String::new()),
            Error::MalformedKey(String::new()),
            Error::CryptoFailure(String::new()),
            Error::InvalidCredential(String::new()),
            Error::InvalidPresentation(String::new()),
            Error::UnsupportedProofType(String::new()),
            Error::UnsupportedMethod(String::new()),
            Error::MissingChallenge,
            Error::InvalidContext(String::new()),
            Error::CanonicalizationFailure(String::new()),
            Error::ResolutionFailure(String::new()),
            Error::KeyMismatch(String::new()),
            Error::UnsupportedAlgorithm(String::new()),
            Error::Internal(String::new()),
        ];

        let codes: Vec<i32> = errors.iter().map(Error::code).collect();
        assert_eq!(codes, (1..=14).collect::<Vec<_>>());
        assert_eq!(Error::BoundaryMisuse(String::new()).code(), -1);
    }

    #[test]
    fn test_canonicalization_errors_split_by_stage() {
        let context: Error = CanonicalizationError::UndefinedTerm("foo".to_string()).into();
        assert_eq!(context.code(), 9);

        let labeling: Error = CanonicalizationError::WorkBudgetExceeded.into();
        assert_eq!(labeling.code(), 10);
    }

    #[test]
    fn test_engine_errors() {
        let err: Error = vc::Error::Resolution {
            did: "did:web:example.com".to_string(),
            error: DIDResolutionError::InternalError,
        }
        .into();
        assert_eq!(err, Error::ResolutionFailure("did:web:example.com: internalError".to_string()));

        let err: Error = vc::Error::Crypto(CryptoError::InvalidCurve).into();
        assert_eq!(err.code(), 3);
    }
}
