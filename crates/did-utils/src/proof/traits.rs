use serde_json::{Map, Value};

use crate::{canon::Canonicalizer, crypto::Ed25519KeyPair};

use super::ProofError;

/// Verification method types whose Ed25519 key material the suites accept.
pub const ED25519_VERIFICATION_METHOD_TYPES: [&str; 4] = [
    "Ed25519VerificationKey2018",
    "Ed25519VerificationKey2020",
    "JsonWebKey2020",
    "Multikey",
];

/// A trait to be implemented by every crypto suite.
///
/// A suite computes the bytes a proof covers, and stores or checks a
/// signature over those bytes on the proof object.
pub trait ProofSuite: Send + Sync {
    /// The proof `type` this suite produces.
    fn proof_type(&self) -> &'static str;

    /// The `cryptosuite` member for data-integrity proofs.
    fn cryptosuite(&self) -> Option<&'static str> {
        None
    }

    /// Context to append to a document that does not yet define the suite's terms.
    fn required_context(&self, contexts: &[&str]) -> Option<&'static str>;

    /// Whether a verification method of this type can carry the suite's keys.
    fn accepts_verification_method(&self, key_type: &str) -> bool {
        ED25519_VERIFICATION_METHOD_TYPES.contains(&key_type)
    }

    /// Computes the signing input from the document (without proofs) and the
    /// proof options (the proof without its signature, carrying `@context`).
    fn signing_input(
        &self,
        canonicalizer: &Canonicalizer,
        document: &Value,
        proof_options: &Value,
    ) -> Result<Vec<u8>, ProofError>;

    /// Signs the input and stores the signature on the proof.
    fn sign(&self, input: &[u8], keypair: &Ed25519KeyPair, proof: &mut Map<String, Value>) -> Result<(), ProofError>;

    /// Checks the signature stored on the proof.
    ///
    /// A missing, malformed, or mismatched signature yields `false`.
    fn verify(&self, input: &[u8], proof: &Map<String, Value>, public_key: &Ed25519KeyPair) -> bool;
}
