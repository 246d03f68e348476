//! DID methods, DID resolution and DID URL dereferencing.
//!
//! This module provides functionality for resolving Decentralized Identifiers (DIDs)
//! using different DID methods including [`did:key`], [`did:jwk`], and [`did:web`].
//! The process-wide [`DID_METHODS`] table dispatches on the method name.
//!
//! [`did:key`]: https://w3c-ccg.github.io/did-method-key/
//! [`did:jwk`]: https://github.com/quartzjer/did-jwk/blob/main/spec.md
//! [`did:web`]: https://w3c-ccg.github.io/did-method-web/
//!
//! # Examples
//!
//! ### Basic did:key resolution example.
//!
//! ```
//! use did_utils::methods::{DIDResolver, DidKey};
//! use did_utils::methods::DIDResolutionOptions;
//!
//! # async fn test_did_key() {
//!     let did_key_resolver = DidKey::new();
//!     let did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
//!     let output = did_key_resolver.resolve(did, &DIDResolutionOptions::default()).await;
//! # }
//! ```
//!
//! ### Resolution through the method table
//!
//! ```
//! use did_utils::methods::{DIDResolver, DIDResolutionOptions, DID_METHODS};
//!
//! # async fn resolves_any_did() {
//!     let output = DID_METHODS.resolve("did:unsupported:abc", &DIDResolutionOptions::default()).await;
//!     assert!(output.did_document.is_none());
//! # }
//! ```

mod errors;
mod jwk;
mod key;
mod registry;
mod resolution;
mod traits;
mod utils;
mod web;

// Re-exported items
pub use errors::{DIDResolutionError, DidWebError, ParsingErrorSource};
pub use jwk::method::DidJwk;
pub use key::{method::DidKey, PublicKeyFormat};
pub use registry::{DIDMethods, DID_METHODS};
pub use resolution::*;
pub use traits::{DIDMethod, DIDResolver};
pub use utils::{method_name, parse_did_url, ParsedDIDUrl};
pub use web::resolver::DidWeb;
