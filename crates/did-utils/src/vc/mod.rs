//! This module provides utilities for working with [Verifiable Credentials (VCs)][vc]
//! and presentations.
//!
//! An [`Engine`] issues documents by appending a proof made with the signing
//! key, and verifies them by resolving the verification method named in each
//! proof. Verification reports its findings in a [`VerificationResult`]
//! instead of failing.
//!
//! [vc]: https://www.w3.org/TR/vc-data-model/
//!
//! # Example
//!
//! ```
//! use did_utils::{jwk::Jwk, methods::{DIDMethod, DidKey}, vc::{Engine, ProofOptions}};
//! use serde_json::json;
//!
//! # async fn issue() {
//! let jwk = Jwk::generate_ed25519().unwrap();
//! let did = DidKey::new().generate(&jwk).unwrap();
//!
//! let credential = json!({
//!     "@context": ["https://www.w3.org/2018/credentials/v1"],
//!     "type": ["VerifiableCredential"],
//!     "issuer": did,
//!     "credentialSubject": {"id": "did:example:1"}
//! });
//!
//! let engine = Engine::default();
//! let vc = engine.issue_credential(&credential, &ProofOptions::default(), &jwk).await.unwrap();
//! let result = engine.verify_credential(&vc, &ProofOptions::default()).await.unwrap();
//! assert!(result.errors.is_empty());
//! # }
//! ```

mod credential;
mod engine;
mod errors;
mod options;
mod presentation;
mod result;
pub mod status;

// Re-exports
pub use credential::{issuer_of, validate_credential, VERIFIABLE_CREDENTIAL_TYPE};
pub use engine::Engine;
pub use errors::Error;
pub use options::{Check, ProofOptions};
pub use presentation::{validate_presentation, VERIFIABLE_PRESENTATION_TYPE};
pub use result::VerificationResult;
pub use status::{CredentialState, StatusError, StatusMethod, StatusMethods, STATUS_METHODS};
