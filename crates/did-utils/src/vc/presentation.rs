use serde_json::{json, Value};

use crate::{canon::CREDENTIALS_V1, didcore::VerificationRelationship, jwk::Jwk};

use super::{
    credential::{check_base_context, has_type},
    Check, Engine, Error, ProofOptions, VerificationResult,
};

pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Checks the members every presentation must carry.
///
/// Embedded credentials are only required to be objects or strings; they are
/// not verified along with the presentation.
pub fn validate_presentation(presentation: &Value) -> Result<(), Error> {
    let invalid = |message: &str| Error::InvalidPresentation(message.to_string());

    let presentation = presentation
        .as_object()
        .ok_or_else(|| invalid("presentation must be an object"))?;
    check_base_context(presentation).map_err(|message| invalid(&message))?;

    if !has_type(presentation, VERIFIABLE_PRESENTATION_TYPE) {
        return Err(invalid("type must include VerifiablePresentation"));
    }

    if presentation.get("holder").is_some_and(|holder| !holder.is_string()) {
        return Err(invalid("holder must be a string"));
    }

    let embedded = |credential: &Value| credential.is_object() || credential.is_string();
    match presentation.get("verifiableCredential") {
        None => {}
        Some(Value::Array(credentials)) if credentials.iter().all(embedded) => {}
        Some(credential) if embedded(credential) => {}
        Some(_) => return Err(invalid("verifiableCredential entries must be objects or strings")),
    }

    Ok(())
}

fn holder_of(presentation: &Value) -> Option<&str> {
    presentation.get("holder").and_then(Value::as_str)
}

impl Engine<'_> {
    /// Issues a presentation, signed by the given key on behalf of its holder.
    ///
    /// The presentation purpose defaults to `authentication`.
    pub async fn issue_presentation(
        &self,
        presentation: &Value,
        options: &ProofOptions,
        jwk: &Jwk,
    ) -> Result<Value, Error> {
        validate_presentation(presentation)?;

        self.secure(
            presentation.clone(),
            holder_of(presentation),
            options,
            VerificationRelationship::Authentication,
            jwk,
        )
        .await
    }

    /// Verifies the proof of a presentation, including its challenge and
    /// domain binding when the options expect one.
    pub async fn verify_presentation(
        &self,
        presentation: &Value,
        options: &ProofOptions,
    ) -> Result<VerificationResult, Error> {
        let mut result = VerificationResult::default();

        if let Err(err) = validate_presentation(presentation) {
            result.error(err.to_string());
        }

        if options.checks().contains(&Check::Proof) {
            self.check_proofs(
                presentation,
                holder_of(presentation),
                options,
                VerificationRelationship::Authentication,
                &mut result,
            )
            .await?;
        }

        Ok(result)
    }

    /// Proves control of a DID by signing an empty presentation held by it.
    pub async fn did_auth(&self, did: &str, options: &ProofOptions, jwk: &Jwk) -> Result<Value, Error> {
        if options.challenge.is_none() {
            return Err(Error::MissingChallenge);
        }

        let presentation = json!({
            "@context": [CREDENTIALS_V1],
            "type": VERIFIABLE_PRESENTATION_TYPE,
            "holder": did,
        });
        let options = ProofOptions {
            proof_purpose: Some(VerificationRelationship::Authentication.as_str().to_string()),
            ..options.clone()
        };

        tracing::debug!(did, "authenticating");
        self.issue_presentation(&presentation, &options, jwk).await
    }
}
