use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    canon::{CREDENTIALS_V1, CREDENTIALS_V2},
    didcore::VerificationRelationship,
    jwk::Jwk,
};

use super::{Check, Engine, Error, ProofOptions, VerificationResult};

pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

const DATE_FIELDS: [&str; 4] = ["issuanceDate", "expirationDate", "validFrom", "validUntil"];

/// Checks the members every credential must carry.
pub fn validate_credential(credential: &Value) -> Result<(), Error> {
    let invalid = |message: &str| Error::InvalidCredential(message.to_string());

    let credential = credential.as_object().ok_or_else(|| invalid("credential must be an object"))?;
    check_base_context(credential).map_err(|message| invalid(&message))?;

    if !has_type(credential, VERIFIABLE_CREDENTIAL_TYPE) {
        return Err(invalid("type must include VerifiableCredential"));
    }

    match credential.get("issuer") {
        Some(Value::String(_)) => {}
        Some(Value::Object(issuer)) if issuer.get("id").is_some_and(Value::is_string) => {}
        Some(_) => return Err(invalid("issuer must be a string or an object with an id")),
        None => return Err(invalid("missing issuer")),
    }

    match credential.get("credentialSubject") {
        Some(Value::Object(subject)) if !subject.is_empty() => {}
        Some(Value::Array(subjects)) if !subjects.is_empty() && subjects.iter().all(Value::is_object) => {}
        Some(_) => return Err(invalid("credentialSubject must be a non-empty object or array")),
        None => return Err(invalid("missing credentialSubject")),
    }

    for field in DATE_FIELDS {
        if let Some(value) = credential.get(field) {
            let valid = value.as_str().is_some_and(|date| DateTime::parse_from_rfc3339(date).is_ok());
            if !valid {
                return Err(Error::InvalidCredential(format!("{field} must be an RFC 3339 date-time")));
            }
        }
    }

    Ok(())
}

/// The issuer DID of a credential.
pub fn issuer_of(credential: &Value) -> Option<&str> {
    match credential.get("issuer") {
        Some(Value::String(issuer)) => Some(issuer),
        Some(Value::Object(issuer)) => issuer.get("id").and_then(Value::as_str),
        _ => None,
    }
}

/// Requires the first `@context` entry to be a credentials base context.
pub(super) fn check_base_context(document: &Map<String, Value>) -> Result<(), String> {
    let first = match document.get("@context") {
        None => return Err("missing @context".to_string()),
        Some(Value::Array(entries)) => entries.first(),
        Some(context) => Some(context),
    };

    match first.and_then(Value::as_str) {
        Some(CREDENTIALS_V1) | Some(CREDENTIALS_V2) => Ok(()),
        _ => Err(format!("the first @context entry must be {CREDENTIALS_V1} or {CREDENTIALS_V2}")),
    }
}

pub(super) fn has_type(document: &Map<String, Value>, expected: &str) -> bool {
    match document.get("type") {
        Some(Value::String(value)) => value == expected,
        Some(Value::Array(values)) => values.iter().any(|value| value == expected),
        _ => false,
    }
}

fn date_of(credential: &Value, field: &str) -> Option<DateTime<Utc>> {
    credential
        .get(field)
        .and_then(Value::as_str)
        .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
        .map(|date| date.with_timezone(&Utc))
}

impl Engine<'_> {
    /// Issues a credential, signed by the given key on behalf of its issuer.
    ///
    /// The returned credential carries the new proof in addition to any it
    /// already had.
    pub async fn issue_credential(&self, credential: &Value, options: &ProofOptions, jwk: &Jwk) -> Result<Value, Error> {
        validate_credential(credential)?;

        self.secure(
            credential.clone(),
            issuer_of(credential),
            options,
            VerificationRelationship::AssertionMethod,
            jwk,
        )
        .await
    }

    /// Verifies a credential.
    ///
    /// Every check runs; findings are collected in the result. Only resolver
    /// transport failures and unusable options are raised.
    pub async fn verify_credential(&self, credential: &Value, options: &ProofOptions) -> Result<VerificationResult, Error> {
        let mut result = VerificationResult::default();

        if let Err(err) = validate_credential(credential) {
            result.error(err.to_string());
        }

        let now = Utc::now();
        if ["expirationDate", "validUntil"]
            .iter()
            .filter_map(|field| date_of(credential, field))
            .any(|date| date < now)
        {
            result.error("credential has expired");
        }
        if ["issuanceDate", "validFrom"]
            .iter()
            .filter_map(|field| date_of(credential, field))
            .any(|date| date > now)
        {
            result.error("credential is not yet valid");
        }

        if options.checks().contains(&Check::Proof) {
            self.check_proofs(
                credential,
                issuer_of(credential),
                options,
                VerificationRelationship::AssertionMethod,
                &mut result,
            )
            .await?;
        }

        if credential.get("credentialStatus").is_some() {
            result.record(Check::CredentialStatus);
            self.status_methods
                .evaluate(credential, options.strict_status(), &mut result)
                .await;
        }

        Ok(result)
    }
}
