use multibase::Base;
use serde_json::{Map, Value};

use crate::{
    canon::{Canonicalizer, CREDENTIALS_V2, DATA_INTEGRITY_V2},
    crypto::{CoreSign, Ed25519KeyPair},
};

use super::{jcs_signing_input, traits::ProofSuite, ProofError};

pub const CRYPTO_SUITE_EDDSA_JCS_2022: &str = "eddsa-jcs-2022";
pub const PROOF_TYPE_DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// Data-integrity proof with the `eddsa-jcs-2022` cryptosuite.
///
/// The signing input does not depend on JSON-LD processing, only on the JCS
/// form of the document and of the proof options.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdDsaJcs2022;

impl ProofSuite for EdDsaJcs2022 {
    fn proof_type(&self) -> &'static str {
        PROOF_TYPE_DATA_INTEGRITY_PROOF
    }

    fn cryptosuite(&self) -> Option<&'static str> {
        Some(CRYPTO_SUITE_EDDSA_JCS_2022)
    }

    fn required_context(&self, contexts: &[&str]) -> Option<&'static str> {
        match contexts.iter().any(|url| *url == CREDENTIALS_V2 || *url == DATA_INTEGRITY_V2) {
            true => None,
            false => Some(DATA_INTEGRITY_V2),
        }
    }

    fn signing_input(
        &self,
        _canonicalizer: &Canonicalizer,
        document: &Value,
        proof_options: &Value,
    ) -> Result<Vec<u8>, ProofError> {
        jcs_signing_input(document, proof_options)
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
        match proof.get("proofValue").and_then(Value::as_str).map(multibase::decode) {
            Some(Ok((_, signature))) => public_key.verify(input, &signature).is_ok(),
            _ => false,
        }
    }
}
