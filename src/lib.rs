//! Text-JSON interface over the `did-utils` engine.
//!
//! Every operation takes and returns JSON text. Hard failures surface as an
//! [`Error`] carrying a stable [code](Error::code); verification findings are
//! data inside the returned result document. The [`ffi`] module exposes the
//! same operations as `didkit_*` C symbols.
//!
//! ```
//! # async fn flow() -> Result<(), didkit::Error> {
//! let key = didkit::generate_key("Ed25519")?;
//! let did = didkit::key_to_did("key", &key)?;
//! assert!(did.starts_with("did:key:z6Mk"));
//!
//! let credential = format!(
//!     r#"{{"@context":["https://www.w3.org/2018/credentials/v1"],"type":["VerifiableCredential"],"issuer":"{did}","credentialSubject":{{"id":"did:example:1"}}}}"#
//! );
//! let vc = didkit::issue_credential(&credential, r#"{"proofPurpose":"assertionMethod"}"#, &key).await?;
//! let result = didkit::verify_credential(&vc, "{}").await?;
//! assert!(result.contains(r#""errors":[]"#));
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod ffi;

pub use config::{init_tracing, Config, CONFIG};
pub use error::Error;

use did_utils::{
    jwk::Jwk,
    methods::{DIDResolutionError, DIDResolutionOptions, DIDResolver, DereferencingOptions, DID_METHODS},
    vc::{Check, Engine, ProofOptions},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn get_version() -> &'static str {
    VERSION
}

/// Generates a key for the named algorithm and returns it as a JWK.
///
/// Only `Ed25519` is supported; the name is matched case-insensitively.
pub fn generate_key(algorithm: &str) -> Result<String, Error> {
    if !algorithm.eq_ignore_ascii_case("Ed25519") {
        return Err(Error::UnsupportedAlgorithm(algorithm.to_string()));
    }

    let jwk = Jwk::generate_ed25519()?;
    to_text(&jwk)
}

pub fn generate_ed25519_key() -> Result<String, Error> {
    generate_key("Ed25519")
}

/// Derives the DID a method pattern (e.g. `key` or `jwk`) assigns to a key.
pub fn key_to_did(method_pattern: &str, key: &str) -> Result<String, Error> {
    let jwk = parse_key(key)?;
    let method = method_pattern.strip_prefix("did:").unwrap_or(method_pattern);

    DID_METHODS.generate(method, &jwk).map_err(|err| match err {
        DIDResolutionError::MethodNotSupported => Error::UnsupportedMethod(format!("unknown method pattern {method_pattern}")),
        DIDResolutionError::UnsupportedPublicKeyType => {
            Error::UnsupportedMethod(format!("{method_pattern} cannot derive a DID from this key"))
        }
        err => Error::MalformedKey(err.to_string()),
    })
}

/// Derives the DID of a key and returns the id of its first verification method.
pub async fn key_to_verification_method(method_pattern: &str, key: &str) -> Result<String, Error> {
    let did = key_to_did(method_pattern, key)?;
    let document = DID_METHODS
        .resolve(&did, &DIDResolutionOptions::default())
        .await
        .into_document()
        .map_err(|err| Error::ResolutionFailure(format!("{did}: {err}")))?;

    document
        .verification_method
        .as_deref()
        .and_then(<[_]>::first)
        .map(|vm| document.absolute_id(&vm.id))
        .ok_or_else(|| Error::ResolutionFailure(format!("{did} has no verification method")))
}

pub async fn issue_credential(credential: &str, options: &str, key: &str) -> Result<String, Error> {
    let credential: Value = parse_input(credential, "credential")?;
    let options = issuance_options(options)?;
    let jwk = parse_key(key)?;

    let vc = Engine::default().issue_credential(&credential, &options, &jwk).await?;
    to_text(&vc)
}

/// Verifies a credential and returns its verification result.
///
/// Findings are reported in the result; only malformed input and resolver
/// transport failures are errors.
pub async fn verify_credential(credential: &str, options: &str) -> Result<String, Error> {
    let credential: Value = parse_input(credential, "credential")?;
    let options = verification_options(options)?;

    let result = Engine::default().verify_credential(&credential, &options).await?;
    to_text(&result)
}

pub async fn issue_presentation(presentation: &str, options: &str, key: &str) -> Result<String, Error> {
    let presentation: Value = parse_input(presentation, "presentation")?;
    let options = issuance_options(options)?;
    let jwk = parse_key(key)?;

    let vp = Engine::default().issue_presentation(&presentation, &options, &jwk).await?;
    to_text(&vp)
}

pub async fn verify_presentation(presentation: &str, options: &str) -> Result<String, Error> {
    let presentation: Value = parse_input(presentation, "presentation")?;
    let options = verification_options(options)?;

    let result = Engine::default().verify_presentation(&presentation, &options).await?;
    to_text(&result)
}

/// Resolves a DID. Resolution failures are reported in the returned metadata.
pub async fn resolve_did(did: &str, input_metadata: &str) -> Result<String, Error> {
    let options: DIDResolutionOptions = parse_options(input_metadata, "input metadata")?;

    let output = DID_METHODS.resolve(did, &options).await;
    to_text(&output)
}

pub async fn dereference_did_url(did_url: &str, input_metadata: &str) -> Result<String, Error> {
    let options: DereferencingOptions = parse_options(input_metadata, "input metadata")?;

    let output = DID_METHODS.dereference(did_url, &options).await;
    to_text(&output)
}

/// Signs a claims-free presentation held by `did`, bound to the options' challenge.
pub async fn did_auth(did: &str, options: &str, key: &str) -> Result<String, Error> {
    let options = issuance_options(options)?;
    let jwk = parse_key(key)?;

    let vp = Engine::default().did_auth(did, &options, &jwk).await?;
    to_text(&vp)
}

fn parse_key(key: &str) -> Result<Jwk, Error> {
    let jwk: Jwk = serde_json::from_str(key).map_err(|err| Error::MalformedKey(err.to_string()))?;
    jwk.validate().map_err(|err| Error::MalformedKey(err.to_string()))?;
    Ok(jwk)
}

fn parse_input<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, Error> {
    serde_json::from_str(text).map_err(|err| Error::MalformedInput(format!("{what}: {err}")))
}

// Blank option text stands for the empty object.
fn parse_options<T: DeserializeOwned + Default>(text: &str, what: &str) -> Result<T, Error> {
    match text.trim() {
        "" => Ok(T::default()),
        text => parse_input(text, what),
    }
}

fn issuance_options(text: &str) -> Result<ProofOptions, Error> {
    let mut options: ProofOptions = parse_options(text, "options")?;
    if options.proof_type.is_none() {
        options.proof_type.clone_from(&CONFIG.default_proof_type);
    }
    Ok(options)
}

fn verification_options(text: &str) -> Result<ProofOptions, Error> {
    let mut options: ProofOptions = parse_options(text, "options")?;
    if options.checks.is_none() && CONFIG.strict_status {
        options.checks = Some(vec![Check::Proof, Check::CredentialStatus]);
    }
    Ok(options)
}

fn to_text<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|err| Error::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let key = generate_key("ed25519").unwrap();
        let jwk = parse_key(&key).unwrap();
        assert!(jwk.is_private());

        assert_eq!(
            generate_key("P-256").unwrap_err(),
            Error::UnsupportedAlgorithm("P-256".to_string())
        );
    }

    #[test]
    fn test_parse_key_rejects_mismatched_secret() {
        let key: Value = serde_json::from_str(&generate_ed25519_key().unwrap()).unwrap();
        let other: Value = serde_json::from_str(&generate_ed25519_key().unwrap()).unwrap();

        let mut mixed = key.clone();
        mixed["d"] = other["d"].clone();
        assert!(matches!(parse_key(&mixed.to_string()), Err(Error::MalformedKey(_))));

        assert!(matches!(parse_key("{\"kty\":\"OKP\"}"), Err(Error::MalformedKey(_))));
        assert!(matches!(parse_key("not json"), Err(Error::MalformedKey(_))));
    }

    #[test]
    fn test_key_to_did_patterns() {
        let key = generate_ed25519_key().unwrap();

        assert!(key_to_did("key", &key).unwrap().starts_with("did:key:z6Mk"));
        assert!(key_to_did("jwk", &key).unwrap().starts_with("did:jwk:"));
        assert_eq!(key_to_did("did:key", &key).unwrap(), key_to_did("key", &key).unwrap());

        assert!(matches!(key_to_did("web", &key), Err(Error::UnsupportedMethod(_))));
        assert!(matches!(key_to_did("unknown", &key), Err(Error::UnsupportedMethod(_))));
    }

    #[test]
    fn test_options() {
        assert_eq!(parse_options::<ProofOptions>("  ", "options").unwrap(), ProofOptions::default());

        let err = issuance_options(r#"{"proofPurpose":"assertionMethod","colour":"blue"}"#).unwrap_err();
        assert_eq!(err.code(), 1);

        let err = issuance_options(r#"{"created":"yesterday"}"#).unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[tokio::test]
    async fn test_key_to_verification_method() {
        let key = generate_ed25519_key().unwrap();
        let did = key_to_did("key", &key).unwrap();

        let vm = key_to_verification_method("key", &key).await.unwrap();
        assert_eq!(vm, format!("{did}#{}", did.trim_start_matches("did:key:")));

        let vm = key_to_verification_method("jwk", &key).await.unwrap();
        assert!(vm.starts_with("did:jwk:"));
        assert!(vm.ends_with("#0"));
    }

    #[tokio::test]
    async fn test_malformed_documents() {
        let key = generate_ed25519_key().unwrap();

        let err = issue_credential("{", "{}", &key).await.unwrap_err();
        assert_eq!(err.code(), 1);

        let err = issue_credential(r#"{"type":["VerifiableCredential"]}"#, "{}", &key)
            .await
            .unwrap_err();
        assert_eq!(err.code(), 4);

        let err = verify_presentation("[]", "{not options}").await.unwrap_err();
        assert_eq!(err.code(), 1);
    }
}
