//! This module provides utilities for creating and verifying proofs.
//!
//! A proof suite turns a document and a set of proof options into signing
//! input, then stores or checks a signature over it. Linked-data suites
//! canonicalize with URDNA2015; `eddsa-jcs-2022` uses the JSON
//! Canonicalization Scheme. Both hash as `sha256(options) || sha256(document)`.
//!
//! Suites are looked up by proof type (and cryptosuite) in [`PROOF_SUITES`].

mod ed25519_signature_2018;
mod ed25519_signature_2020;
mod eddsa_jcs_2022;
mod model;
mod traits;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    canon::{CanonicalizationError, Canonicalizer},
    crypto::{digest, Ed25519KeyPair, Error as CryptoError},
};

// public re-exports
pub use ed25519_signature_2018::{Ed25519Signature2018, PROOF_TYPE_ED25519_SIGNATURE_2018};
pub use ed25519_signature_2020::{Ed25519Signature2020, PROOF_TYPE_ED25519_SIGNATURE_2020};
pub use eddsa_jcs_2022::{EdDsaJcs2022, CRYPTO_SUITE_EDDSA_JCS_2022, PROOF_TYPE_DATA_INTEGRITY_PROOF};
pub use model::{append_proof, proofs_of, without_proofs, Domain, PreviousProofs, Proof, Proofs};
pub use traits::{ProofSuite, ED25519_VERIFICATION_METHOD_TYPES};

/// Members holding the signature itself, excluded from the signing input.
const SIGNATURE_MEMBERS: [&str; 3] = ["jws", "proofValue", "signatureValue"];

#[derive(Debug, Error)]
pub enum ProofError {
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
    #[error("signing failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("malformed proof: {0}")]
    MalformedProof(String),
}

/// Builds the proof options of a proof: the proof without its signature,
/// carrying the context of the document it secures.
pub fn proof_options(document: &Value, proof: &Map<String, Value>) -> Value {
    let mut options = proof.clone();
    for member in SIGNATURE_MEMBERS {
        options.remove(member);
    }

    options.remove("@context");
    if let Some(context) = document.get("@context") {
        options.insert("@context".to_string(), context.clone());
    }

    Value::Object(options)
}

/// URDNA2015 signing input.
pub(crate) fn ld_signing_input(
    canonicalizer: &Canonicalizer,
    document: &Value,
    proof_options: &Value,
) -> Result<Vec<u8>, ProofError> {
    let canon_options = canonicalizer.canonicalize(proof_options)?;
    let canon_doc = canonicalizer.canonicalize(document)?;

    Ok(digest::options_then_document(&canon_options, &canon_doc))
}

/// JCS signing input.
pub(crate) fn jcs_signing_input(document: &Value, proof_options: &Value) -> Result<Vec<u8>, ProofError> {
    let canon_options = json_canon::to_string(proof_options).map_err(|err| ProofError::Serialization(err.to_string()))?;
    let canon_doc = json_canon::to_string(document).map_err(|err| ProofError::Serialization(err.to_string()))?;

    Ok(digest::options_then_document(&canon_options, &canon_doc))
}

/// Creates a proof over the document, which must already carry every context
/// the suite needs. Existing proofs of the document are not covered.
///
/// Returns the proof object complete with its signature, ready to be appended
/// to the document.
pub fn create_proof(
    suite: &dyn ProofSuite,
    canonicalizer: &Canonicalizer,
    document: &Value,
    proof: Proof,
    keypair: &Ed25519KeyPair,
) -> Result<Value, ProofError> {
    let normalized = Proof {
        context: None,
        proof_type: suite.proof_type().to_string(),
        cryptosuite: suite.cryptosuite().map(str::to_string),
        jws: None,
        proof_value: None,
        ..proof
    };

    let Value::Object(mut proof) =
        serde_json::to_value(&normalized).map_err(|err| ProofError::Serialization(err.to_string()))?
    else {
        return Err(ProofError::MalformedProof("proof is not an object".to_string()));
    };

    let document = without_proofs(document);
    let input = suite.signing_input(canonicalizer, &document, &proof_options(&document, &proof))?;
    suite.sign(&input, keypair, &mut proof)?;

    Ok(Value::Object(proof))
}

/// Checks one proof of a document against a public key.
///
/// `Ok(false)` means the signature does not match. Errors are reserved for
/// documents whose signing input cannot be computed.
pub fn verify_proof(
    suite: &dyn ProofSuite,
    canonicalizer: &Canonicalizer,
    document: &Value,
    proof: &Value,
    public_key: &Ed25519KeyPair,
) -> Result<bool, ProofError> {
    let Value::Object(proof) = proof else {
        return Err(ProofError::MalformedProof("proof is not an object".to_string()));
    };

    let document = without_proofs(document);
    let input = suite.signing_input(canonicalizer, &document, &proof_options(&document, proof))?;

    Ok(suite.verify(&input, proof, public_key))
}

/// The supported proof suites.
pub struct ProofSuites {
    suites: Vec<Box<dyn ProofSuite>>,
}

impl Default for ProofSuites {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofSuites {
    pub fn new() -> Self {
        Self {
            suites: vec![
                Box::new(Ed25519Signature2018),
                Box::new(Ed25519Signature2020),
                Box::new(EdDsaJcs2022),
            ],
        }
    }

    /// Finds the suite implementing a proof type.
    ///
    /// Data-integrity proofs share their type and are told apart by cryptosuite.
    pub fn get(&self, proof_type: &str, cryptosuite: Option<&str>) -> Option<&dyn ProofSuite> {
        self.suites
            .iter()
            .find(|suite| suite.proof_type() == proof_type && (suite.cryptosuite().is_none() || suite.cryptosuite() == cryptosuite))
            .map(|suite| suite.as_ref())
    }

    /// Proof types in registration order.
    pub fn proof_types(&self) -> Vec<&'static str> {
        self.suites.iter().map(|suite| suite.proof_type()).collect()
    }
}

pub static PROOF_SUITES: Lazy<ProofSuites> = Lazy::new(ProofSuites::new);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        canon::CREDENTIALS_V1,
        crypto::{Generate, KeyMaterial},
    };
    use serde_json::json;

    fn credential() -> Value {
        json!({
            "@context": [CREDENTIALS_V1],
            "id": "urn:uuid:86294362-4254-4f36-854f-3952fe42555d",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "issuanceDate": "2021-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:example:subject"}
        })
    }

    fn options() -> Proof {
        Proof {
            proof_purpose: Some("assertionMethod".to_string()),
            created: Some("2021-01-01T00:00:00Z".parse().unwrap()),
            ..Proof::new("", "did:example:issuer#key-1")
        }
    }

    #[test]
    fn test_proof_options_carry_document_context() {
        let proof = json!({
            "@context": "https://example.com/ignored",
            "type": "Ed25519Signature2018",
            "verificationMethod": "did:example:issuer#key-1",
            "jws": "abc..def"
        });

        let options = proof_options(&credential(), proof.as_object().unwrap());
        assert_eq!(
            options,
            json!({
                "@context": [CREDENTIALS_V1],
                "type": "Ed25519Signature2018",
                "verificationMethod": "did:example:issuer#key-1"
            })
        );

        let options = proof_options(&json!({"id": "x"}), proof.as_object().unwrap());
        assert!(options.get("@context").is_none());
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(
            PROOF_SUITES.get("Ed25519Signature2018", None).map(|suite| suite.proof_type()),
            Some("Ed25519Signature2018")
        );
        assert!(PROOF_SUITES.get("DataIntegrityProof", Some("eddsa-jcs-2022")).is_some());
        assert!(PROOF_SUITES.get("DataIntegrityProof", Some("ecdsa-rdfc-2019")).is_none());
        assert!(PROOF_SUITES.get("DataIntegrityProof", None).is_none());
        assert!(PROOF_SUITES.get("RsaSignature2018", None).is_none());
    }

    #[test]
    fn test_create_and_verify_with_every_suite() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let public_key = Ed25519KeyPair::from_public_key(&keypair.public_key_bytes().unwrap()).unwrap();
        let canonicalizer = Canonicalizer::default();

        for (proof_type, cryptosuite) in [
            (PROOF_TYPE_ED25519_SIGNATURE_2018, None),
            (PROOF_TYPE_DATA_INTEGRITY_PROOF, Some(CRYPTO_SUITE_EDDSA_JCS_2022)),
        ] {
            let suite = PROOF_SUITES.get(proof_type, cryptosuite).unwrap();
            let document = credential();

            let proof = create_proof(suite, &canonicalizer, &document, options(), &keypair).unwrap();
            assert_eq!(proof["type"], proof_type);
            assert!(proof.get("@context").is_none());

            let mut secured = document.clone();
            append_proof(&mut secured, proof.clone());
            assert!(verify_proof(suite, &canonicalizer, &secured, &proof, &public_key).unwrap());

            let mut tampered = secured.clone();
            tampered["credentialSubject"]["id"] = json!("did:example:mallory");
            assert!(!verify_proof(suite, &canonicalizer, &tampered, &proof, &public_key).unwrap());

            let mut moved = proof.clone();
            moved["created"] = json!("2022-01-01T00:00:00Z");
            assert!(!verify_proof(suite, &canonicalizer, &secured, &moved, &public_key).unwrap());
        }
    }

    #[test]
    fn test_existing_proofs_are_not_covered() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let canonicalizer = Canonicalizer::default();
        let suite = PROOF_SUITES.get(PROOF_TYPE_ED25519_SIGNATURE_2018, None).unwrap();

        let mut document = credential();
        let first = create_proof(suite, &canonicalizer, &document, options(), &keypair).unwrap();
        append_proof(&mut document, first.clone());

        let second = create_proof(suite, &canonicalizer, &document, options(), &keypair).unwrap();
        append_proof(&mut document, second.clone());

        assert_eq!(proofs_of(&document).len(), 2);
        assert!(verify_proof(suite, &canonicalizer, &document, &first, &keypair).unwrap());
        assert!(verify_proof(suite, &canonicalizer, &document, &second, &keypair).unwrap());
    }

    #[test]
    fn test_undefined_terms_fail_canonicalization() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let suite = PROOF_SUITES.get(PROOF_TYPE_ED25519_SIGNATURE_2018, None).unwrap();

        let mut document = credential();
        document["undefinedTerm"] = json!(true);

        let err = create_proof(suite, &Canonicalizer::default(), &document, options(), &keypair).unwrap_err();
        assert!(matches!(err, ProofError::Canonicalization(ref err) if err.is_context_error()));
    }

    #[test]
    fn test_signing_requires_a_secret_key() {
        let keypair = Ed25519KeyPair::new().unwrap();
        let public_key = Ed25519KeyPair::from_public_key(&keypair.public_key_bytes().unwrap()).unwrap();
        let suite = PROOF_SUITES.get(PROOF_TYPE_ED25519_SIGNATURE_2018, None).unwrap();

        let err = create_proof(suite, &Canonicalizer::default(), &credential(), options(), &public_key).unwrap_err();
        assert!(matches!(err, ProofError::Crypto(CryptoError::InvalidSecretKey)));
    }
}
