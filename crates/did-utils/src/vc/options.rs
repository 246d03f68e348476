use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::didcore::VerificationRelationship;

use super::Error;

/// Options of issuance and verification calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProofOptions {
    // Overrides the verification method picked from the issuer or holder document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    // Suite selection; `type` is accepted as an alias
    #[serde(alias = "type", skip_serializing_if = "Option::is_none")]
    pub proof_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<Check>>,
}

/// A verification check a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Check {
    Proof,
    CredentialStatus,
}

impl ProofOptions {
    /// The proof purpose requested, or the given default.
    pub fn purpose_or(&self, default: VerificationRelationship) -> Result<VerificationRelationship, Error> {
        match &self.proof_purpose {
            None => Ok(default),
            Some(purpose) => VerificationRelationship::from_purpose(purpose)
                .ok_or_else(|| Error::InvalidOptions(format!("unknown proof purpose {purpose}"))),
        }
    }

    /// Checks to run, `proof` alone unless stated otherwise.
    pub fn checks(&self) -> Vec<Check> {
        self.checks.clone().unwrap_or_else(|| vec![Check::Proof])
    }

    /// Whether an unverifiable credential status is an error rather than a warning.
    pub fn strict_status(&self) -> bool {
        self.checks().contains(&Check::CredentialStatus)
    }
}
