use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::Error as CryptoError;

/// Registry for [error] types found across the DID core specification,
/// and especially during the DID resolution process.
///
/// [error]: https://www.w3.org/TR/did-spec-registries/#error
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Error)]
#[serde(rename_all = "camelCase")]
pub enum DIDResolutionError {
    #[error("invalidDid")]
    InvalidDid,
    #[error("invalidDidUrl")]
    InvalidDidUrl,
    #[error("notFound")]
    NotFound,
    #[error("representationNotSupported")]
    RepresentationNotSupported,
    #[error("methodNotSupported")]
    MethodNotSupported,
    #[error("internalError")]
    InternalError,
    #[error("invalidPublicKey")]
    InvalidPublicKey,
    #[error("invalidPublicKeyLength")]
    InvalidPublicKeyLength,
    #[error("invalidPublicKeyType")]
    InvalidPublicKeyType,
    #[error("unsupportedPublicKeyType")]
    UnsupportedPublicKeyType,
    #[error("notAllowedLocalDuplicateKey")]
    NotAllowedLocalDuplicateKey,
}

impl DIDResolutionError {
    /// Whether the resolver failed to reach or read the source of truth,
    /// as opposed to the DID itself being unusable.
    pub fn is_transport(&self) -> bool {
        matches!(self, DIDResolutionError::InternalError)
    }
}

impl From<CryptoError> for DIDResolutionError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyLength => DIDResolutionError::InvalidPublicKeyLength,
            CryptoError::Unsupported | CryptoError::InvalidCurve => DIDResolutionError::UnsupportedPublicKeyType,
            CryptoError::InvalidMultikey(_) => DIDResolutionError::InvalidDid,
            _ => DIDResolutionError::InvalidPublicKey,
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DidWebError {
    #[error("Invalid DID: {0}")]
    InvalidDid(String),
    #[error("Representation not supported: {0}")]
    RepresentationNotSupported(String),
    #[error("Parsing error: {0}")]
    ParsingError(#[from] ParsingErrorSource),
    #[error("HTTP error: {0}")]
    HttpError(#[from] hyper::Error),
    #[error("HTTP client error: {0}")]
    ClientError(#[from] hyper_util::client::legacy::Error),
    #[error("Non-success server response: {0}")]
    NonSuccessResponse(StatusCode),
    #[error("Document id {0} does not match the DID")]
    IdMismatch(String),
}

#[derive(Error, Debug)]
pub enum ParsingErrorSource {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid encoding: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

impl From<std::string::FromUtf8Error> for DidWebError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DidWebError::ParsingError(ParsingErrorSource::Utf8Error(err))
    }
}

impl From<DidWebError> for DIDResolutionError {
    fn from(err: DidWebError) -> Self {
        match err {
            DidWebError::InvalidDid(_) => DIDResolutionError::InvalidDid,
            DidWebError::NonSuccessResponse(StatusCode::NOT_FOUND) | DidWebError::IdMismatch(_) => {
                DIDResolutionError::NotFound
            }
            DidWebError::RepresentationNotSupported(_) | DidWebError::ParsingError(_) => {
                DIDResolutionError::RepresentationNotSupported
            }
            DidWebError::HttpError(_) | DidWebError::ClientError(_) | DidWebError::NonSuccessResponse(_) => {
                DIDResolutionError::InternalError
            }
        }
    }
}
