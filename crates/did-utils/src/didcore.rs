use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    crypto::{decode_multikey, Algorithm, Error as CryptoError, BYTES_LENGTH_32},
    jwk::{Jwk, Key, OkpCurves},
    ldmodel::Context,
};

// === Structure of a did document ===

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "@context")]
    pub context: Context,

    // === Identifier ===

    // Identifier property is mandatory in a did document.
    // see https://www.w3.org/TR/did-core/#dfn-id
    pub id: String,

    // See https://www.w3.org/TR/did-core/#dfn-controller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<Controller>,

    // See https://www.w3.org/TR/did-core/#dfn-alsoknownas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_known_as: Option<Vec<String>>,

    // === Verification Methods ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,

    // === Verification Relationships ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<VerificationMethodType>>,

    // === Services ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,

    // === Dynamic Properties ===
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Controller {
    SingleString(String),
    SetOfString(Vec<String>),
}

// See https://www.w3.org/TR/did-core/#services
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,

    #[serde(rename = "type")]
    pub service_type: ServiceType,

    // A string, a map, or a set composed of one or more strings and/or maps.
    pub service_endpoint: Value,

    // === Additional properties ===
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ServiceType {
    SingleString(String),
    SetOfString(Vec<String>),
}

#[derive(Serialize, Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,

    #[serde(rename = "type")]
    pub key_type: String,

    pub controller: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub public_key: Option<KeyFormat>,

    // === Additional properties ===
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// Public key material of a verification method, keyed by its property name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum KeyFormat {
    #[serde(rename = "publicKeyBase58")]
    Base58(String),
    #[serde(rename = "publicKeyMultibase")]
    Multibase(String),
    #[serde(rename = "publicKeyJwk")]
    Jwk(Box<Jwk>),
}

/// Verification method either embedded in a relationship or referenced by id.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VerificationMethodType {
    Reference(String),
    Embedded(Box<VerificationMethod>),
}

impl VerificationMethodType {
    pub fn id(&self) -> &str {
        match self {
            VerificationMethodType::Reference(id) => id,
            VerificationMethodType::Embedded(vm) => &vm.id,
        }
    }
}

/// Verification relationships of a DID document.
///
/// See https://www.w3.org/TR/did-core/#verification-relationships
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VerificationRelationship {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl VerificationRelationship {
    /// Parses the proof purpose naming this relationship.
    pub fn from_purpose(purpose: &str) -> Option<Self> {
        match purpose {
            "authentication" => Some(Self::Authentication),
            "assertionMethod" => Some(Self::AssertionMethod),
            "keyAgreement" => Some(Self::KeyAgreement),
            "capabilityInvocation" => Some(Self::CapabilityInvocation),
            "capabilityDelegation" => Some(Self::CapabilityDelegation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::AssertionMethod => "assertionMethod",
            Self::KeyAgreement => "keyAgreement",
            Self::CapabilityInvocation => "capabilityInvocation",
            Self::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl Document {
    /// Creates a document with only the required members.
    pub fn new(context: Context, id: String) -> Self {
        Self {
            context,
            id,
            controller: None,
            also_known_as: None,
            verification_method: None,
            authentication: None,
            assertion_method: None,
            capability_delegation: None,
            capability_invocation: None,
            key_agreement: None,
            service: None,
            additional_properties: None,
        }
    }

    /// Turns a relative DID URL (`#key-1`) into an absolute one.
    pub fn absolute_id(&self, id: &str) -> String {
        match id.starts_with('#') {
            true => format!("{}{}", self.id, id),
            false => id.to_string(),
        }
    }

    /// Returns the entries listed under a verification relationship.
    pub fn relationship(&self, relationship: VerificationRelationship) -> &[VerificationMethodType] {
        let entries = match relationship {
            VerificationRelationship::Authentication => &self.authentication,
            VerificationRelationship::AssertionMethod => &self.assertion_method,
            VerificationRelationship::KeyAgreement => &self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &self.capability_delegation,
        };

        entries.as_deref().unwrap_or_default()
    }

    /// Checks that a verification method is listed under the relationship.
    pub fn is_authorized(&self, vm_id: &str, relationship: VerificationRelationship) -> bool {
        self.relationship(relationship)
            .iter()
            .any(|entry| self.absolute_id(entry.id()) == vm_id)
    }

    /// Looks a verification method up by absolute id, following references
    /// into the `verificationMethod` set.
    pub fn find_verification_method(&self, vm_id: &str) -> Option<VerificationMethod> {
        let listed = self.verification_method.iter().flatten();
        let embedded = [
            &self.authentication,
            &self.assertion_method,
            &self.key_agreement,
            &self.capability_invocation,
            &self.capability_delegation,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| match entry {
            VerificationMethodType::Embedded(vm) => Some(vm.as_ref()),
            VerificationMethodType::Reference(_) => None,
        });

        listed
            .chain(embedded)
            .find(|vm| self.absolute_id(&vm.id) == vm_id)
            .map(|vm| VerificationMethod {
                id: self.absolute_id(&vm.id),
                ..vm.clone()
            })
    }

    /// Returns the verification methods usable for a relationship, in document order.
    pub fn verification_methods_for(&self, relationship: VerificationRelationship) -> Vec<VerificationMethod> {
        self.relationship(relationship)
            .iter()
            .filter_map(|entry| self.find_verification_method(&self.absolute_id(entry.id())))
            .collect()
    }
}

impl VerificationMethod {
    /// Creates a verification method without key material.
    pub fn new(id: String, key_type: String, controller: String) -> Self {
        Self {
            id,
            key_type,
            controller,
            ..Default::default()
        }
    }

    /// Extracts raw Ed25519 public key bytes from whichever key format is present.
    pub fn ed25519_public_key(&self) -> Result<[u8; BYTES_LENGTH_32], CryptoError> {
        let bytes = match &self.public_key {
            Some(KeyFormat::Jwk(jwk)) => match &jwk.key {
                Key::Okp(okp) if okp.crv == OkpCurves::Ed25519 => okp.x.to_vec(),
                _ => return Err(CryptoError::InvalidCurve),
            },
            Some(KeyFormat::Multibase(multikey)) => {
                let (alg, key) = decode_multikey(multikey)?;
                if alg != Algorithm::Ed25519 {
                    return Err(CryptoError::InvalidCurve);
                }
                key
            }
            Some(KeyFormat::Base58(encoded)) => multibase::Base::Base58Btc
                .decode(encoded)
                .map_err(|_| CryptoError::InvalidPublicKey)?,
            None => return Err(CryptoError::InvalidPublicKey),
        };

        bytes.as_slice().try_into().map_err(|_| CryptoError::InvalidKeyLength)
    }
}
