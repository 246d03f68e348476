pub(super) mod method;

/// Key representation used when expanding a key-based DID into a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyFormat {
    /// `Ed25519VerificationKey2018` carrying `publicKeyJwk`.
    #[default]
    Jwk,
    /// `Multikey` carrying `publicKeyMultibase`.
    Multikey,
}
