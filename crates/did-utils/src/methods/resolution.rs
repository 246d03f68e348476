use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{didcore::Document as DIDDocument, ldmodel::Context, methods::errors::DIDResolutionError};

pub const DID_RESOLUTION_CONTEXT: &str = "https://w3id.org/did-resolution/v1";

/// DID Resolution Options.
///
/// Formerly known as "DID resolution input metadata", they provide
/// additional configuration for the DID resolution process.
///
/// See `<https://www.w3.org/TR/did-core/#did-resolution-options>`
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DIDResolutionOptions {
    // See https://www.w3.org/TR/did-spec-registries/#accept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<MediaType>,
    // See https://w3c.github.io/did-resolution/#caching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
    // Dynamic properties
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// DID Resolution Output.
///
/// See `<https://www.w3.org/TR/did-core/#did-resolution>`
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOutput {
    #[serde(rename = "@context")]
    pub context: Context,
    // See https://www.w3.org/TR/did-core/#dfn-diddocument
    pub did_document: Option<DIDDocument>,
    // See https://www.w3.org/TR/did-core/#dfn-didresolutionmetadata
    pub did_resolution_metadata: Option<DIDResolutionMetadata>,
    // See https://www.w3.org/TR/did-core/#dfn-diddocumentmetadata
    pub did_document_metadata: Option<DIDDocumentMetadata>,
    // Dynamic properties
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl ResolutionOutput {
    /// Successful resolution of a document.
    pub fn from_document(document: DIDDocument, content_type: MediaType) -> Self {
        Self {
            context: Context::SingleString(DID_RESOLUTION_CONTEXT.to_string()),
            did_document: Some(document),
            did_resolution_metadata: Some(DIDResolutionMetadata {
                error: None,
                content_type: Some(content_type.to_string()),
                additional_properties: None,
            }),
            did_document_metadata: Some(DIDDocumentMetadata::default()),
            additional_properties: None,
        }
    }

    /// Failed resolution.
    pub fn from_error(error: DIDResolutionError) -> Self {
        Self {
            context: Context::SingleString(DID_RESOLUTION_CONTEXT.to_string()),
            did_document: None,
            did_resolution_metadata: Some(DIDResolutionMetadata {
                error: Some(error),
                content_type: None,
                additional_properties: None,
            }),
            did_document_metadata: None,
            additional_properties: None,
        }
    }

    pub fn error(&self) -> Option<&DIDResolutionError> {
        self.did_resolution_metadata.as_ref().and_then(|metadata| metadata.error.as_ref())
    }

    pub fn is_deactivated(&self) -> bool {
        self.did_document_metadata
            .as_ref()
            .and_then(|metadata| metadata.deactivated)
            .unwrap_or(false)
    }

    /// The document, or the error explaining its absence.
    pub fn into_document(self) -> Result<DIDDocument, DIDResolutionError> {
        if let Some(error) = self.error() {
            return Err(error.clone());
        }
        self.did_document.ok_or(DIDResolutionError::NotFound)
    }
}

/// DID Resolution Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#did-resolution-metadata>`
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DIDResolutionMetadata {
    // See https://www.w3.org/TR/did-spec-registries/#error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DIDResolutionError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    // See https://www.w3.org/TR/did-spec-registries/#contenttype
    pub content_type: Option<String>,
    // Dynamic properties
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// DID Document Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#did-document-metadata>`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DIDDocumentMetadata {
    // See https://www.w3.org/TR/did-spec-registries/#created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    // See https://www.w3.org/TR/did-spec-registries/#updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    // See https://www.w3.org/TR/did-spec-registries/#deactivated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
    // See https://www.w3.org/TR/did-spec-registries/#version_id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    // See https://www.w3.org/TR/did-spec-registries/#equivalent_id
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub equivalent_id: Vec<String>,
    // See https://www.w3.org/TR/did-spec-registries/#canonical_id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
    // Dynamic properties
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// DID URL Dereferencing Options.
///
/// See `<https://www.w3.org/TR/did-core/#did-url-dereferencing-options>`
pub type DereferencingOptions = DIDResolutionOptions;

/// DID URL Dereferencing Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#did-url-dereferencing-metadata>`
pub type DereferencingMetadata = DIDResolutionMetadata;

/// Content Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#metadata-structure>`
pub type ContentMetadata = DIDDocumentMetadata;

/// Dereferencing Output.
///
/// See `<https://www.w3.org/TR/did-core/#did-url-dereferencing>`
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DereferencingOutput {
    #[serde(rename = "@context")]
    pub context: Context,
    // See https://www.w3.org/TR/did-core/#dfn-diddocument
    pub content: Option<Content>,
    // See https://www.w3.org/TR/did-core/#did-url-dereferencing-metadata
    pub dereferencing_metadata: Option<DereferencingMetadata>,
    // See https://www.w3.org/TR/did-core/#dfn-diddocumentmetadata
    pub content_metadata: Option<ContentMetadata>,
    // Dynamic properties
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl DereferencingOutput {
    pub fn from_content(content: Content, content_type: Option<String>, content_metadata: Option<ContentMetadata>) -> Self {
        Self {
            context: Context::SingleString(DID_RESOLUTION_CONTEXT.to_string()),
            content: Some(content),
            dereferencing_metadata: Some(DereferencingMetadata {
                error: None,
                content_type,
                additional_properties: None,
            }),
            content_metadata,
            additional_properties: None,
        }
    }

    pub fn from_error(error: DIDResolutionError) -> Self {
        Self {
            context: Context::SingleString(DID_RESOLUTION_CONTEXT.to_string()),
            content: None,
            dereferencing_metadata: Some(DereferencingMetadata {
                error: Some(error),
                content_type: None,
                additional_properties: None,
            }),
            content_metadata: None,
            additional_properties: None,
        }
    }

    pub fn error(&self) -> Option<&DIDResolutionError> {
        self.dereferencing_metadata.as_ref().and_then(|metadata| metadata.error.as_ref())
    }
}

/// A resource returned by DID URL dereferencing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Content {
    /// DID Document
    DIDDocument(DIDDocument),
    /// URL
    URL(String),
    /// Other (e.g. verification method map)
    Data(Value),
}

/// Media type for resolution input and output metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MediaType {
    Json,
    DidJson,
    DidLdJson,
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Json => write!(f, "application/json"),
            MediaType::DidJson => write!(f, "application/did+json"),
            MediaType::DidLdJson => write!(f, "application/did+ld+json"),
        }
    }
}

/// Serves derefencing query given a DID document.
pub(super) fn dereference_did_document(
    diddoc: &DIDDocument,
    query: &HashMap<String, String>,
    fragment: &Option<String>,
) -> Result<Content, DIDResolutionError> {
    // Primary resource
    if let Some(service) = query.get("service") {
        let needle = format!("{}#{}", diddoc.id, service);
        let found: Vec<_> = diddoc
            .service
            .iter()
            .flatten()
            .filter(|entry| diddoc.absolute_id(&entry.id) == needle)
            .collect();

        let endpoint = match found.as_slice() {
            [] => return Err(DIDResolutionError::NotFound),
            [entry] => match &entry.service_endpoint {
                Value::String(url) => url.clone(),
                _ => return Err(DIDResolutionError::RepresentationNotSupported),
            },
            _ => return Err(DIDResolutionError::NotAllowedLocalDuplicateKey),
        };

        let relative_ref = query.get("relativeRef");
        if (fragment.is_some() || relative_ref.is_some()) && endpoint.contains('#') {
            return Err(DIDResolutionError::InternalError);
        }

        return Ok(Content::URL(format!(
            "{}{}{}",
            endpoint,
            relative_ref.map(String::as_str).unwrap_or_default(),
            fragment.as_ref().map_or(String::new(), |frag| format!("#{frag}"))
        )));
    } else if !query.is_empty() {
        // Resort to returning whole DID document as other query parameters
        // are not supported by this default dereferencing implementation.
        return Ok(Content::DIDDocument(diddoc.clone()));
    }

    // Secondary resource without primary resource
    if let Some(fragment) = fragment {
        let needle = format!("{}#{}", diddoc.id, fragment);

        let embedded = [
            &diddoc.authentication,
            &diddoc.assertion_method,
            &diddoc.key_agreement,
            &diddoc.capability_invocation,
            &diddoc.capability_delegation,
        ]
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| match entry {
            crate::didcore::VerificationMethodType::Embedded(vm) => Some(vm.as_ref()),
            crate::didcore::VerificationMethodType::Reference(_) => None,
        });

        let mut found: Vec<Value> = diddoc
            .verification_method
            .iter()
            .flatten()
            .chain(embedded)
            .filter(|vm| diddoc.absolute_id(&vm.id) == needle)
            .map(|vm| {
                let mut vm = vm.clone();
                vm.id = diddoc.absolute_id(&vm.id);
                serde_json::to_value(vm)
            })
            .collect::<Result<_, _>>()
            .map_err(|_| DIDResolutionError::InternalError)?;

        for service in diddoc.service.iter().flatten() {
            if diddoc.absolute_id(&service.id) == needle {
                let mut service = service.clone();
                service.id = needle.clone();
                found.push(serde_json::to_value(service).map_err(|_| DIDResolutionError::InternalError)?);
            }
        }

        return match found.len() {
            0 => Err(DIDResolutionError::NotFound),
            1 => Ok(Content::Data(found.remove(0))),
            _ => Err(DIDResolutionError::NotAllowedLocalDuplicateKey),
        };
    }

    // Resort to returning whole DID document
    Ok(Content::DIDDocument(diddoc.clone()))
}
