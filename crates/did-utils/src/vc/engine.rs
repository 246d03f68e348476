use chrono::{SubsecRound, Utc};
use serde_json::Value;

use crate::{
    canon::Canonicalizer,
    crypto::{Ed25519KeyPair, Generate, KeyMaterial},
    didcore::{Document as DIDDocument, VerificationRelationship},
    jwk::Jwk,
    methods::{DIDResolutionOptions, DIDResolver, DidKey, DID_METHODS},
    proof::{
        append_proof, create_proof, proofs_of, verify_proof, Domain, Proof, ProofError, ProofSuite,
        CRYPTO_SUITE_EDDSA_JCS_2022, PROOF_SUITES, PROOF_TYPE_DATA_INTEGRITY_PROOF, PROOF_TYPE_ED25519_SIGNATURE_2018,
    },
};

use super::{
    status::{StatusMethods, STATUS_METHODS},
    Check, Error, ProofOptions, VerificationResult,
};

/// Issues and verifies credentials and presentations.
///
/// Verification methods are resolved through the given resolver, which is the
/// process-wide [`DID_METHODS`] table unless stated otherwise.
pub struct Engine<'a> {
    pub(super) resolver: &'a dyn DIDResolver,
    pub(super) canonicalizer: Canonicalizer<'a>,
    pub(super) status_methods: &'a StatusMethods,
}

impl Default for Engine<'static> {
    fn default() -> Self {
        Engine::new(&*DID_METHODS)
    }
}

impl<'a> Engine<'a> {
    pub fn new(resolver: &'a dyn DIDResolver) -> Self {
        Self {
            resolver,
            canonicalizer: Canonicalizer::default(),
            status_methods: &STATUS_METHODS,
        }
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer<'a>) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn with_status_methods(mut self, status_methods: &'a StatusMethods) -> Self {
        self.status_methods = status_methods;
        self
    }

    /// Signs a document on behalf of its issuer or holder and appends the proof.
    pub(super) async fn secure(
        &self,
        mut document: Value,
        controller: Option<&str>,
        options: &ProofOptions,
        default_purpose: VerificationRelationship,
        jwk: &Jwk,
    ) -> Result<Value, Error> {
        let keypair = jwk.ed25519_keypair()?;
        let suite = select_suite(options)?;
        let purpose = options.purpose_or(default_purpose)?;
        let verification_method = self.pick_verification_method(controller, options, purpose, &keypair).await?;

        add_suite_context(&mut document, suite);

        let proof = Proof {
            proof_purpose: Some(purpose.as_str().to_string()),
            created: Some(options.created.unwrap_or_else(|| Utc::now().trunc_subsecs(0))),
            domain: options.domain.clone().map(Domain::SingleString),
            challenge: options.challenge.clone(),
            nonce: options.nonce.clone(),
            ..Proof::new(suite.proof_type(), &verification_method)
        };

        tracing::debug!(proof_type = suite.proof_type(), %verification_method, "creating proof");
        let proof = create_proof(suite, &self.canonicalizer, &document, proof, &keypair)?;
        append_proof(&mut document, proof);

        Ok(document)
    }

    async fn pick_verification_method(
        &self,
        controller: Option<&str>,
        options: &ProofOptions,
        purpose: VerificationRelationship,
        keypair: &Ed25519KeyPair,
    ) -> Result<String, Error> {
        let public_key = keypair.public_key_bytes()?;

        if let Some(vm_id) = &options.verification_method {
            let did = did_of(vm_id);
            if let Some(controller) = controller {
                if did != controller {
                    return Err(Error::KeyMismatch(format!("{vm_id} does not belong to {controller}")));
                }
            }

            let document = self.resolve_document(did).await?;
            let vm = document
                .find_verification_method(vm_id)
                .ok_or_else(|| Error::KeyMismatch(format!("{vm_id} is not in the DID document of {did}")))?;

            return match vm.ed25519_public_key() {
                Ok(key) if key == public_key => Ok(vm_id.clone()),
                _ => Err(Error::KeyMismatch(format!("the key of {vm_id} is not the signing key"))),
            };
        }

        match controller {
            Some(did) => {
                let document = self.resolve_document(did).await?;
                document
                    .verification_methods_for(purpose)
                    .into_iter()
                    .find(|vm| vm.ed25519_public_key().is_ok_and(|key| key == public_key))
                    .map(|vm| vm.id)
                    .ok_or_else(|| {
                        Error::KeyMismatch(format!(
                            "no {} method of {did} matches the signing key",
                            purpose.as_str()
                        ))
                    })
            }
            None => {
                let did = DidKey::from_ed25519_keypair(keypair)?;
                let fingerprint = did.trim_start_matches("did:key:");
                Ok(format!("{did}#{fingerprint}"))
            }
        }
    }

    async fn resolve_document(&self, did: &str) -> Result<DIDDocument, Error> {
        self.resolver
            .resolve(did, &DIDResolutionOptions::default())
            .await
            .into_document()
            .map_err(|error| Error::Resolution {
                did: did.to_string(),
                error,
            })
    }

    /// Runs the proof checks of a document.
    ///
    /// Each proof matching the options is evaluated on its own; the first one
    /// without findings settles the check. Otherwise every finding is reported.
    pub(super) async fn check_proofs(
        &self,
        document: &Value,
        controller: Option<&str>,
        options: &ProofOptions,
        default_purpose: VerificationRelationship,
        result: &mut VerificationResult,
    ) -> Result<(), Error> {
        let expected_purpose = options.purpose_or(default_purpose)?;
        result.record(Check::Proof);

        let proofs = proofs_of(document);
        if proofs.is_empty() {
            result.error("missing proof");
            return Ok(());
        }

        let candidates: Vec<&Value> = proofs
            .into_iter()
            .filter(|proof| {
                options
                    .verification_method
                    .as_ref()
                    .map_or(true, |vm| proof["verificationMethod"] == vm.as_str())
                    && options
                        .proof_type
                        .as_ref()
                        .map_or(true, |proof_type| proof["type"] == proof_type.as_str())
            })
            .collect();

        if candidates.is_empty() {
            result.error("no proof matches the requested verification method or proof type");
            return Ok(());
        }

        let mut findings = Vec::new();
        for proof in candidates {
            let errors = self
                .check_proof(document, proof, controller, options, expected_purpose)
                .await?;
            if errors.is_empty() {
                return Ok(());
            }
            findings.extend(errors);
        }

        for finding in findings {
            result.error(finding);
        }
        Ok(())
    }

    async fn check_proof(
        &self,
        document: &Value,
        proof_value: &Value,
        controller: Option<&str>,
        options: &ProofOptions,
        expected_purpose: VerificationRelationship,
    ) -> Result<Vec<String>, Error> {
        let mut errors = Vec::new();

        let proof: Proof = match serde_json::from_value(proof_value.clone()) {
            Ok(proof) => proof,
            Err(err) => {
                errors.push(format!("malformed proof: {err}"));
                return Ok(errors);
            }
        };

        let Some(suite) = PROOF_SUITES.get(&proof.proof_type, proof.cryptosuite.as_deref()) else {
            errors.push(format!("unsupported proof type {}", proof.proof_type));
            return Ok(errors);
        };
        let vm_id = proof.verification_method.as_str();
        tracing::debug!(proof_type = suite.proof_type(), verification_method = vm_id, "checking proof");

        let purpose = proof.proof_purpose.as_deref().and_then(VerificationRelationship::from_purpose);
        if purpose != Some(expected_purpose) {
            errors.push(format!(
                "proof purpose {} does not match the expected {}",
                proof.proof_purpose.as_deref().unwrap_or("(none)"),
                expected_purpose.as_str()
            ));
        }

        if proof.expires.is_some_and(|expires| expires < Utc::now()) {
            errors.push("proof has expired".to_string());
        }

        if let Some(challenge) = &options.challenge {
            match &proof.challenge {
                None => errors.push("proof has no challenge".to_string()),
                Some(value) if value != challenge => errors.push("challenge does not match".to_string()),
                Some(_) => {}
            }
        }

        if let Some(domain) = &options.domain {
            match &proof.domain {
                None => errors.push("proof has no domain".to_string()),
                Some(_) if !proof.has_domain(domain) => errors.push("domain does not match".to_string()),
                Some(_) => {}
            }
        }

        let did = did_of(vm_id);
        let output = self.resolver.resolve(did, &DIDResolutionOptions::default()).await;
        if let Some(error) = output.error() {
            if error.is_transport() {
                return Err(Error::Resolution {
                    did: did.to_string(),
                    error: error.clone(),
                });
            }
            errors.push(format!("unable to resolve {vm_id}: {error}"));
            return Ok(errors);
        }

        if output.is_deactivated() {
            errors.push(format!("{did} is deactivated"));
        }

        let Some((diddoc, vm)) = output
            .did_document
            .as_ref()
            .and_then(|diddoc| diddoc.find_verification_method(vm_id).map(|vm| (diddoc, vm)))
        else {
            errors.push(format!("verification method {vm_id} not found"));
            return Ok(errors);
        };

        let relationship = purpose.unwrap_or(expected_purpose);
        if !diddoc.is_authorized(vm_id, relationship) {
            errors.push(format!("{vm_id} is not listed under {}", relationship.as_str()));
        }

        if let Some(controller) = controller {
            if vm.controller != controller {
                errors.push(format!("{vm_id} is not controlled by {controller}"));
            }
        }

        if !suite.accepts_verification_method(&vm.key_type) {
            errors.push(format!("{} keys cannot verify {} proofs", vm.key_type, suite.proof_type()));
            return Ok(errors);
        }

        let public_key = match vm
            .ed25519_public_key()
            .and_then(|key| Ed25519KeyPair::from_public_key(&key))
        {
            Ok(public_key) => public_key,
            Err(err) => {
                errors.push(format!("unusable key in {vm_id}: {err}"));
                return Ok(errors);
            }
        };

        match verify_proof(suite, &self.canonicalizer, document, proof_value, &public_key) {
            Ok(true) => {}
            Ok(false) => errors.push("signature does not match".to_string()),
            Err(ProofError::Canonicalization(err)) => errors.push(format!("canonicalization failed: {err}")),
            Err(err) => errors.push(err.to_string()),
        }

        Ok(errors)
    }
}

/// The DID part of a DID URL.
pub(super) fn did_of(did_url: &str) -> &str {
    did_url.split_once('#').map_or(did_url, |(did, _)| did)
}

fn select_suite(options: &ProofOptions) -> Result<&'static dyn ProofSuite, Error> {
    let proof_type = options.proof_type.as_deref().unwrap_or(PROOF_TYPE_ED25519_SIGNATURE_2018);
    let cryptosuite = match (proof_type, options.cryptosuite.as_deref()) {
        (PROOF_TYPE_DATA_INTEGRITY_PROOF, None) => Some(CRYPTO_SUITE_EDDSA_JCS_2022),
        (_, cryptosuite) => cryptosuite,
    };

    PROOF_SUITES.get(proof_type, cryptosuite).ok_or_else(|| {
        Error::UnsupportedProofType(match cryptosuite {
            Some(cryptosuite) => format!("{proof_type} ({cryptosuite})"),
            None => proof_type.to_string(),
        })
    })
}

/// Appends the suite's context when the document does not define its terms yet.
fn add_suite_context(document: &mut Value, suite: &dyn ProofSuite) {
    let Some(context) = document.get_mut("@context") else {
        return;
    };

    let missing = {
        let urls: Vec<&str> = match &*context {
            Value::String(url) => vec![url.as_str()],
            Value::Array(entries) => entries.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        };
        suite.required_context(&urls)
    };

    if let Some(url) = missing {
        match context {
            Value::Array(entries) => entries.push(Value::from(url)),
            other => {
                let first = other.take();
                *other = Value::Array(vec![first, Value::from(url)]);
            }
        }
    }
}
