use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};

use crate::{
    canon::{Canonicalizer, CREDENTIALS_V1, ED25519_2018_V1},
    crypto::{CoreSign, Ed25519KeyPair},
};

use super::{ld_signing_input, traits::ProofSuite, ProofError};

pub const PROOF_TYPE_ED25519_SIGNATURE_2018: &str = "Ed25519Signature2018";

/// Protected header of the detached, unencoded-payload JWS (RFC 7797).
const JWS_HEADER: &str = r#"{"alg":"EdDSA","b64":false,"crit":["b64"]}"#;

/// Ed25519Signature2018: URDNA2015 signing input, signature as a detached JWS.
///
/// See `<https://w3c-ccg.github.io/lds-ed25519-2018/>`
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Signature2018;

impl Ed25519Signature2018 {
    fn jws_signing_input(encoded_header: &str, input: &[u8]) -> Vec<u8> {
        [encoded_header.as_bytes(), b".", input].concat()
    }
}

impl ProofSuite for Ed25519Signature2018 {
    fn proof_type(&self) -> &'static str {
        PROOF_TYPE_ED25519_SIGNATURE_2018
    }

    fn required_context(&self, contexts: &[&str]) -> Option<&'static str> {
        // credentials v1 defines the suite's terms itself
        match contexts.iter().any(|url| *url == CREDENTIALS_V1 || *url == ED25519_2018_V1) {
            true => None,
            false => Some(ED25519_2018_V1),
        }
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
        let header = Base64UrlUnpadded::encode_string(JWS_HEADER.as_bytes());
        let signature = keypair.sign(&Self::jws_signing_input(&header, input))?;

        let jws = format!("{header}..{}", Base64UrlUnpadded::encode_string(&signature));
        proof.insert("jws".to_string(), Value::String(jws));
        Ok(())
    }

    fn verify(&self, input: &[u8], proof: &Map<String, Value>, public_key: &Ed25519KeyPair) -> bool {
        let Some(jws) = proof.get("jws").and_then(Value::as_str) else {
            return false;
        };

        let mut parts = jws.split('.');
        let (Some(header), Some(""), Some(signature), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        let Ok(decoded_header) = Base64UrlUnpadded::decode_vec(header) else {
            return false;
        };
        let Ok(decoded_header) = serde_json::from_slice::<Value>(&decoded_header) else {
            return false;
        };
        let unencoded = decoded_header["alg"] == "EdDSA"
            && decoded_header["b64"] == false
            && decoded_header["crit"].as_array().is_some_and(|crit| crit.iter().any(|entry| entry == "b64"));
        if !unencoded {
            return false;
        }

        match Base64UrlUnpadded::decode_vec(signature) {
            Ok(signature) => public_key
                .verify(&Self::jws_signing_input(header, input), &signature)
                .is_ok(),
            Err(_) => false,
        }
    }
}
