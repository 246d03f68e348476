use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::{
    jwk::Jwk,
    methods::{
        errors::DIDResolutionError,
        resolution::{DIDResolutionOptions, DereferencingOptions, DereferencingOutput, ResolutionOutput},
        traits::{DIDMethod, DIDResolver},
        utils::{method_name, parse_did_url},
        DidJwk, DidKey, DidWeb,
    },
};

/// The methods known to the engine, registered once and read-only afterwards.
pub static DID_METHODS: Lazy<DIDMethods> = Lazy::new(|| {
    let mut methods = DIDMethods::new();
    methods.register(Box::new(DidKey::new()));
    methods.register(Box::new(DidJwk::new()));
    methods.register(Box::new(DidWeb::new()));
    methods
});

/// Dispatch table of DID methods keyed by method name.
///
/// Resolution through the table picks the method from the DID string and
/// hands the call over; it never inspects key material itself.
#[derive(Default)]
pub struct DIDMethods {
    methods: HashMap<&'static str, Box<dyn DIDMethod>>,
}

impl DIDMethods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method under its own name, replacing any previous entry.
    pub fn register(&mut self, method: Box<dyn DIDMethod>) {
        self.methods.insert(method.name(), method);
    }

    pub fn get(&self, name: &str) -> Option<&dyn DIDMethod> {
        self.methods.get(name).map(Box::as_ref)
    }

    /// Looks up the method responsible for a DID.
    pub fn for_did(&self, did: &str) -> Result<&dyn DIDMethod, DIDResolutionError> {
        let name = method_name(did)?;
        self.get(name).ok_or(DIDResolutionError::MethodNotSupported)
    }

    /// Derives a DID from a key following the named method (e.g. `key`).
    pub fn generate(&self, name: &str, jwk: &Jwk) -> Result<String, DIDResolutionError> {
        let method = self.get(name).ok_or(DIDResolutionError::MethodNotSupported)?;
        method.generate(jwk).ok_or(DIDResolutionError::UnsupportedPublicKeyType)
    }
}

#[async_trait]
impl DIDResolver for DIDMethods {
    async fn resolve(&self, did: &str, options: &DIDResolutionOptions) -> ResolutionOutput {
        match self.for_did(did) {
            Ok(method) => {
                tracing::debug!(did, method = method.name(), "dispatching resolution");
                method.resolve(did, options).await
            }
            Err(err) => {
                tracing::warn!(did, %err, "no resolver for DID");
                ResolutionOutput::from_error(err)
            }
        }
    }

    async fn dereference(&self, did_url: &str, options: &DereferencingOptions) -> DereferencingOutput {
        let method = parse_did_url(did_url).and_then(|(did, _, _)| {
            self.for_did(&did).map_err(|err| match err {
                DIDResolutionError::InvalidDid => DIDResolutionError::InvalidDidUrl,
                other => other,
            })
        });

        match method {
            Ok(method) => method.dereference(did_url, options).await,
            Err(err) => DereferencingOutput::from_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::Content;

    #[tokio::test]
    async fn test_unknown_method_is_reported_in_metadata() {
        let output = DID_METHODS.resolve("did:unsupported:abc", &DIDResolutionOptions::default()).await;
        assert!(output.did_document.is_none());
        assert_eq!(output.error(), Some(&DIDResolutionError::MethodNotSupported));

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["didResolutionMetadata"]["error"], "methodNotSupported");
        assert_eq!(json["didDocument"], serde_json::Value::Null);

        let output = DID_METHODS.resolve("not a did", &DIDResolutionOptions::default()).await;
        assert_eq!(output.error(), Some(&DIDResolutionError::InvalidDid));
    }

    #[tokio::test]
    async fn test_dispatch_by_method_name() {
        let did = "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";
        let output = DID_METHODS.resolve(did, &DIDResolutionOptions::default()).await;
        assert_eq!(output.did_document.unwrap().id, did);

        assert_eq!(DID_METHODS.for_did("did:jwk:e30").unwrap().name(), "jwk");
        assert_eq!(DID_METHODS.for_did("did:web:example.com").unwrap().name(), "web");
    }

    #[tokio::test]
    async fn test_dereference_verification_method() {
        let did = "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";
        let url = format!("{did}#z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");

        let output = DID_METHODS.dereference(&url, &DereferencingOptions::default()).await;
        assert!(output.error().is_none());
        match output.content {
            Some(Content::Data(vm)) => {
                assert_eq!(vm["id"], url.as_str());
                assert_eq!(vm["type"], "Ed25519VerificationKey2018");
            }
            other => panic!("unexpected content: {other:?}"),
        }

        let output = DID_METHODS.dereference(&format!("{did}#nope"), &DereferencingOptions::default()).await;
        assert_eq!(output.error(), Some(&DIDResolutionError::NotFound));

        let output = DID_METHODS.dereference("did:unsupported:abc#key", &DereferencingOptions::default()).await;
        assert_eq!(output.error(), Some(&DIDResolutionError::MethodNotSupported));

        let output = DID_METHODS.dereference("garbage#key", &DereferencingOptions::default()).await;
        assert_eq!(output.error(), Some(&DIDResolutionError::InvalidDidUrl));
    }

    #[test]
    fn test_generate_by_method_name() {
        let jwk = Jwk::generate_ed25519().unwrap();

        assert!(DID_METHODS.generate("key", &jwk).unwrap().starts_with("did:key:z6Mk"));
        assert!(DID_METHODS.generate("jwk", &jwk).unwrap().starts_with("did:jwk:"));
        assert_eq!(DID_METHODS.generate("web", &jwk), Err(DIDResolutionError::UnsupportedPublicKeyType));
        assert_eq!(DID_METHODS.generate("nope", &jwk), Err(DIDResolutionError::MethodNotSupported));

        // pure function of (method, key)
        assert_eq!(DID_METHODS.generate("key", &jwk), DID_METHODS.generate("key", &jwk));
    }
}
