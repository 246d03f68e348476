use multibase::Base;
use serde_json::{Map, Value};

use crate::{
    canon::{Canonicalizer, ED25519_2020_V1},
    crypto::{CoreSign, Ed25519KeyPair},
};

use super::{ld_signing_input, traits::ProofSuite, ProofError};

pub const PROOF_TYPE_ED25519_SIGNATURE_2020: &str = "Ed25519Signature2020";

/// Ed25519Signature2020: URDNA2015 signing input, signature as a multibase
/// `proofValue`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Signature2020;

impl ProofSuite for Ed25519Signature2020 {
    fn proof_type(&self) -> &'static str {
        PROOF_TYPE_ED25519_SIGNATURE_2020
    }

    fn required_context(&self, contexts: &[&str]) -> Option<&'static str> {
        (!contexts.contains(&ED25519_2020_V1)).then_some(ED25519_2020_V1)
    }

    fn signing_input(
        &self,
        canonicalizer: &Canonicalizer,
        document: &Value,
        proof_options: &Value,
    ) -> Result<Vec<u8>, ProofError> {
        ld_signing_input(canonicalizer, document, proof_options)
    }

    fn sign(&self, input: &[u8], keypair: &Ed25519KeyPair, proof: &mut Map<String, Value>) -> Result<(), ProofError> {
        let signature = keypair.sign(input)?;
        proof.insert(
            "proofValue".to_string(),
            Value::String(multibase::encode(Base::Base58Btc, signature)),
        );
        Ok(())
    }

    fn verify(&self, input: &[u8], proof: &Map<String, Value>, public_key: &Ed25519KeyPair) -> bool {
        proof
            .get("proofValue")
            .and_then(Value::as_str)
            .and_then(|value| multibase::decode(value).ok())
            .is_some_and(|(_, signature)| public_key.verify(input, &signature).is_ok())
    }
}
