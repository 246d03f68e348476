use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    // Linked-data suites carry the secured document's context while signing.
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    // An optional identifier for the proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // A specified set of cryptographic primitives bundled together into a cryptographic suite
    // See https://www.w3.org/TR/vc-data-integrity/#dfn-proof-type
    #[serde(rename = "type")]
    pub proof_type: String,

    // See https://www.w3.org/TR/vc-data-integrity/#dfn-cryptosuite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    // See https://www.w3.org/TR/vc-data-integrity/#dfn-proof-purpose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    // See https://www.w3.org/TR/vc-data-integrity/#dfn-verification-method
    pub verification_method: String,

    // The date and time the proof was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    // The date and time that the proof expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    // One or more security domains in which the proof is meant to be used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,

    // A string value that SHOULD be included in a proof if a domain is specified
    // The value is used once for a particular domain and window of time
    // This value is used to mitigate replay attacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    // A string value supplied by the proof creator that is unique to the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    // Detached JWS of Ed25519Signature2018 proofs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,

    // Data necessary to verify the digital proof using the verificationMethod specified
    // The contents of the value MUST be a [MULTIBASE]-encoded binary value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    // Each value identifies another data integrity proof that
    // MUST verify before the current proof is processed
    // See https://www.w3.org/TR/vc-data-integrity/#proof-chains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_proof: Option<PreviousProofs>,

    // === Additional properties ===
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl Proof {
    pub fn new(proof_type: &str, verification_method: &str) -> Self {
        Self {
            proof_type: proof_type.to_string(),
            verification_method: verification_method.to_string(),
            ..Default::default()
        }
    }

    /// Whether the proof is bound to the given domain.
    pub fn has_domain(&self, domain: &str) -> bool {
        match &self.domain {
            Some(Domain::SingleString(value)) => value == domain,
            Some(Domain::SetOfString(values)) => values.iter().any(|value| value == domain),
            None => false,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    SingleString(String),
    SetOfString(Vec<String>),
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PreviousProofs {
    SingleString(String),
    SetOfString(Vec<String>),
}

/// The `proof` member of a secured document: one proof or a set of them.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Proofs {
    SingleProof(Box<Proof>),
    SetOfProofs(Vec<Proof>),
}

/// Returns the proof entries of a document, in order, as raw JSON objects.
pub fn proofs_of(document: &Value) -> Vec<&Value> {
    match document.get("proof") {
        Some(Value::Array(entries)) => entries.iter().collect(),
        Some(Value::Null) | None => vec![],
        Some(entry) => vec![entry],
    }
}

/// Returns a copy of the document without its proofs.
pub fn without_proofs(document: &Value) -> Value {
    let mut document = document.clone();
    if let Some(object) = document.as_object_mut() {
        object.remove("proof");
    }
    document
}

/// Appends a proof, turning an existing single proof into a set.
pub fn append_proof(document: &mut Value, proof: Value) {
    let Some(object) = document.as_object_mut() else {
        return;
    };

    let proofs = match object.remove("proof") {
        None | Some(Value::Null) => proof,
        Some(Value::Array(mut entries)) => {
            entries.push(proof);
            Value::Array(entries)
        }
        Some(existing) => Value::Array(vec![existing, proof]),
    };
    object.insert("proof".to_string(), proofs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_proof_serialization() {
        let proof = Proof {
            proof_purpose: Some("assertionMethod".to_string()),
            created: Some(Utc.with_ymd_and_hms(2023, 3, 5, 19, 23, 24).unwrap()),
            domain: Some(Domain::SingleString("vc-demo.adorsys.com".to_string())),
            ..Proof::new("Ed25519Signature2018", "did:example:123#key-1")
        };

        let expected = r#"{"created":"2023-03-05T19:23:24Z","domain":"vc-demo.adorsys.com","proofPurpose":"assertionMethod","type":"Ed25519Signature2018","verificationMethod":"did:example:123#key-1"}"#;
        assert_eq!(json_canon::to_string(&proof).unwrap(), expected);

        let parsed: Proof = serde_json::from_str(expected).unwrap();
        assert!(parsed.has_domain("vc-demo.adorsys.com"));
        assert!(!parsed.has_domain("elsewhere"));
    }

    #[test]
    fn test_unknown_proof_members_are_kept() {
        let proof: Proof = serde_json::from_value(json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-jcs-2022",
            "verificationMethod": "did:example:123#key-1",
            "domain": ["a.example", "b.example"],
            "customMember": 42
        }))
        .unwrap();

        assert!(proof.has_domain("b.example"));
        assert_eq!(proof.additional_properties.as_ref().unwrap()["customMember"], 42);
        assert_eq!(serde_json::to_value(&proof).unwrap()["customMember"], 42);
    }

    #[test]
    fn test_append_proof() {
        let mut document = json!({"id": "urn:uuid:1"});
        assert!(proofs_of(&document).is_empty());

        append_proof(&mut document, json!({"type": "A"}));
        assert_eq!(document["proof"]["type"], "A");

        append_proof(&mut document, json!({"type": "B"}));
        let types: Vec<_> = proofs_of(&document).iter().map(|proof| proof["type"].clone()).collect();
        assert_eq!(types, vec![json!("A"), json!("B")]);

        assert_eq!(without_proofs(&document), json!({"id": "urn:uuid:1"}));
    }
}
