use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};

use crate::{
    didcore::{Document as DIDDocument, KeyFormat, VerificationMethod, VerificationMethodType},
    jwk::{Class, Jwk},
    ldmodel::Context,
    methods::{
        errors::DIDResolutionError,
        resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
        traits::{DIDMethod, DIDResolver},
    },
};

const DID_JWK_PREFIX: &str = "did:jwk:";

/// The did:jwk method, encoding a public JWK directly in the identifier.
///
/// See `<https://github.com/quartzjer/did-jwk/blob/main/spec.md>`
#[derive(Default)]
pub struct DidJwk;

impl DIDMethod for DidJwk {
    fn name(&self) -> &'static str {
        "jwk"
    }

    fn generate(&self, jwk: &Jwk) -> Option<String> {
        Self::from_jwk(jwk).ok()
    }
}

impl DidJwk {
    pub fn new() -> Self {
        Self
    }

    /// Computes the did:jwk address of the public part of a key.
    pub fn from_jwk(jwk: &Jwk) -> Result<String, DIDResolutionError> {
        let canonical = json_canon::to_string(&jwk.to_public()).map_err(|_| DIDResolutionError::InvalidPublicKey)?;
        Ok(format!("{DID_JWK_PREFIX}{}", Base64UrlUnpadded::encode_string(canonical.as_bytes())))
    }

    /// Expands did:jwk address into DID document
    pub fn expand(&self, did: &str) -> Result<DIDDocument, DIDResolutionError> {
        let encoded = did.strip_prefix(DID_JWK_PREFIX).ok_or(DIDResolutionError::InvalidDid)?;
        let decoded = Base64UrlUnpadded::decode_vec(encoded).map_err(|_| DIDResolutionError::InvalidDid)?;
        let jwk: Jwk = serde_json::from_slice(&decoded).map_err(|_| DIDResolutionError::InvalidDid)?;

        if jwk.is_private() {
            return Err(DIDResolutionError::InvalidPublicKey);
        }
        jwk.validate()?;

        let vm_id = format!("{did}#0");
        let verification_method = VerificationMethod {
            public_key: Some(KeyFormat::Jwk(Box::new(jwk.clone()))),
            ..VerificationMethod::new(vm_id.clone(), "JsonWebKey2020".to_string(), did.to_string())
        };

        let (signing, encryption) = match jwk.prm.cls {
            Some(Class::Signing) => (true, false),
            Some(Class::Encryption) => (false, true),
            None => (true, true),
        };
        let reference = |enabled: bool| enabled.then(|| vec![VerificationMethodType::Reference(vm_id.clone())]);

        Ok(DIDDocument {
            verification_method: Some(vec![verification_method]),
            authentication: reference(signing),
            assertion_method: reference(signing),
            capability_invocation: reference(signing),
            capability_delegation: reference(signing),
            key_agreement: reference(encryption),
            ..DIDDocument::new(
                Context::SetOfString(vec![
                    "https://www.w3.org/ns/did/v1".to_string(),
                    "https://w3id.org/security/suites/jws-2020/v1".to_string(),
                ]),
                did.to_string(),
            )
        })
    }
}

#[async_trait]
impl DIDResolver for DidJwk {
    async fn resolve(&self, did: &str, _options: &DIDResolutionOptions) -> ResolutionOutput {
        match self.expand(did) {
            Ok(diddoc) => ResolutionOutput::from_document(diddoc, MediaType::DidLdJson),
            Err(err) => {
                tracing::debug!(did, %err, "did:jwk expansion failed");
                ResolutionOutput::from_error(err)
            }
        }
    }
}
