use async_trait::async_trait;

use crate::{
    crypto::{decode_multikey, encode_multikey, Algorithm, Ed25519KeyPair, Error as CryptoError, Generate, KeyMaterial},
    didcore::{Document as DIDDocument, KeyFormat, VerificationMethod, VerificationMethodType},
    jwk::Jwk,
    ldmodel::Context,
    methods::{
        errors::DIDResolutionError,
        resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
        traits::{DIDMethod, DIDResolver},
    },
};

use super::PublicKeyFormat;

const DID_KEY_PREFIX: &str = "did:key:";

/// The did:key method.
///
/// See `<https://w3c-ccg.github.io/did-method-key/>`
#[derive(Default)]
pub struct DidKey {
    /// Key format to consider during DID
    /// expansion into a DID document.
    key_format: PublicKeyFormat,
}

impl DIDMethod for DidKey {
    fn name(&self) -> &'static str {
        "key"
    }

    fn generate(&self, jwk: &Jwk) -> Option<String> {
        let keypair = jwk.ed25519_keypair().ok()?;
        Self::from_ed25519_keypair(&keypair).ok()
    }
}

impl DidKey {
    /// Creates new instance of DidKey.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new instance of DidKey with given key format.
    pub fn with_format(key_format: PublicKeyFormat) -> Self {
        Self { key_format }
    }

    /// Computes did:key address corresponding to Ed25519 key pair
    pub fn from_ed25519_keypair(keypair: &Ed25519KeyPair) -> Result<String, CryptoError> {
        Self::from_raw_public_key(Algorithm::Ed25519, &keypair.public_key_bytes()?)
    }

    /// Computes did:key address corresponding to raw public key bytes
    pub fn from_raw_public_key(alg: Algorithm, bytes: &[u8]) -> Result<String, CryptoError> {
        if let Some(required_length) = alg.public_key_length() {
            if required_length != bytes.len() {
                return Err(CryptoError::InvalidKeyLength);
            }
        }

        Ok(format!("{DID_KEY_PREFIX}{}", encode_multikey(alg, bytes)))
    }

    /// Expands did:key address into DID document
    pub fn expand(&self, did: &str) -> Result<DIDDocument, DIDResolutionError> {
        let multikey = did.strip_prefix(DID_KEY_PREFIX).ok_or(DIDResolutionError::InvalidDid)?;
        if !multikey.starts_with('z') || multikey.contains(&[':', '#', '?', '/'][..]) {
            return Err(DIDResolutionError::InvalidDid);
        }

        let (alg, key) = decode_multikey(multikey)?;
        if alg != Algorithm::Ed25519 {
            return Err(DIDResolutionError::UnsupportedPublicKeyType);
        }

        let public_key: [u8; 32] = key
            .as_slice()
            .try_into()
            .map_err(|_| DIDResolutionError::InvalidPublicKeyLength)?;
        let keypair = Ed25519KeyPair::from_public_key(&public_key)?;

        let vm_id = format!("{did}#{multikey}");
        let (key_type, context, public_key) = match self.key_format {
            PublicKeyFormat::Jwk => (
                "Ed25519VerificationKey2018",
                "https://w3id.org/security/suites/ed25519-2018/v1",
                KeyFormat::Jwk(Box::new(Jwk::from_ed25519_keypair(&keypair)?)),
            ),
            PublicKeyFormat::Multikey => (
                "Multikey",
                "https://w3id.org/security/multikey/v1",
                KeyFormat::Multibase(multikey.to_string()),
            ),
        };

        let verification_method = VerificationMethod {
            public_key: Some(public_key),
            ..VerificationMethod::new(vm_id.clone(), key_type.to_string(), did.to_string())
        };
        let reference = || Some(vec![VerificationMethodType::Reference(vm_id.clone())]);

        Ok(DIDDocument {
            verification_method: Some(vec![verification_method]),
            authentication: reference(),
            assertion_method: reference(),
            capability_invocation: reference(),
            capability_delegation: reference(),
            ..DIDDocument::new(
                Context::SetOfString(vec!["https://www.w3.org/ns/did/v1".to_string(), context.to_string()]),
                did.to_string(),
            )
        })
    }
}

#[async_trait]
impl DIDResolver for DidKey {
    /// Resolves a did:key address by expanding it, without any network access.
    async fn resolve(&self, did: &str, _options: &DIDResolutionOptions) -> ResolutionOutput {
        match self.expand(did) {
            Ok(diddoc) => ResolutionOutput::from_document(diddoc, MediaType::DidLdJson),
            Err(err) => {
                tracing::debug!(did, %err, "did:key expansion failed");
                ResolutionOutput::from_error(err)
            }
        }
    }
}
