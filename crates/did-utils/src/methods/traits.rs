//! Trait definitions for DID methods.

use async_trait::async_trait;

use crate::{
    jwk::Jwk,
    methods::{
        errors::DIDResolutionError,
        resolution::{
            dereference_did_document, Content, DIDResolutionOptions, DereferencingOptions, DereferencingOutput,
            MediaType, ResolutionOutput,
        },
        utils::parse_did_url,
    },
};

/// Abstract contract for DID methods.
///
/// A method resolves its own DIDs and, when its DIDs can be computed
/// from key material alone, derives them without any registration step.
pub trait DIDMethod: DIDResolver {
    /// Returns the DIDMethod's registered name, without the `did:` prefix,
    /// e.g. key, web, etc.
    fn name(&self) -> &'static str;

    /// Derives a DID from the public part of a key.
    ///
    /// Returns `None` when the key type is not supported by the method or
    /// when the method requires registration (e.g. did:web).
    fn generate(&self, jwk: &Jwk) -> Option<String>;
}

/// Abstract contract for DID resolution.
///
/// [See DID Resolution Specification](https://w3c.github.io/did-resolution)
#[async_trait]
pub trait DIDResolver: Send + Sync {
    /// Resolves a DID address into its corresponding DID document.
    ///
    /// Failures are carried by the resolution metadata, never raised.
    async fn resolve(&self, did: &str, options: &DIDResolutionOptions) -> ResolutionOutput;

    /// Dereferences a DID URL into its corresponding resource.
    async fn dereference(&self, did_url: &str, options: &DereferencingOptions) -> DereferencingOutput {
        let (did, query, fragment) = match parse_did_url(did_url) {
            Ok(parsed) => parsed,
            Err(err) => return DereferencingOutput::from_error(err),
        };

        let resolution_output = self.resolve(&did, options).await;
        if let Some(err) = resolution_output.error() {
            let err = match err {
                DIDResolutionError::InvalidDid => DIDResolutionError::InvalidDidUrl,
                other => other.clone(),
            };
            return DereferencingOutput::from_error(err);
        }

        let Some(diddoc) = &resolution_output.did_document else {
            return DereferencingOutput::from_error(DIDResolutionError::NotFound);
        };

        match dereference_did_document(diddoc, &query, &fragment) {
            Ok(Content::DIDDocument(document)) => {
                let content_type = resolution_output
                    .did_resolution_metadata
                    .as_ref()
                    .and_then(|metadata| metadata.content_type.clone());
                DereferencingOutput::from_content(
                    Content::DIDDocument(document),
                    content_type,
                    resolution_output.did_document_metadata.clone(),
                )
            }
            Ok(content) => DereferencingOutput::from_content(content, Some(MediaType::Json.to_string()), None),
            Err(err) => DereferencingOutput::from_error(err),
        }
    }
}
