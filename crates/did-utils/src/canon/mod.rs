//! Canonical RDF form of JSON-LD documents.
//!
//! A document is expanded against its `@context`, converted to an RDF dataset and
//! relabeled with the URDNA2015 algorithm, producing sorted N-Quads that are
//! independent of key order and blank node naming.
//!
//! Only contexts known to a [`ContextStore`] can be used; nothing is fetched from
//! the network.

mod context;
mod expand;
mod rdf;
mod urdna2015;

pub use context::{ContextStore, CREDENTIALS_V1, CREDENTIALS_V2, DATA_INTEGRITY_V2, DEFAULT_CONTEXTS, DID_V1, ED25519_2018_V1, ED25519_2020_V1, EXAMPLES_V1, JWS_2020_V1, MULTIKEY_V1};
pub use rdf::{Quad, Term};

use serde_json::Value;
use thiserror::Error;

/// Work units granted to the n-degree hashing step before giving up.
pub const DEFAULT_MAX_WORK: usize = 100_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    #[error("invalid context: {0}")]
    InvalidContext(String),
    #[error("term is not defined by the active context: {0}")]
    UndefinedTerm(String),
    #[error("protected term redefinition: {0}")]
    ProtectedTermRedefinition(String),
    #[error("unsupported JSON-LD feature: {0}")]
    Unsupported(String),
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("relative IRI cannot be converted to RDF: {0}")]
    RelativeIri(String),
    #[error("blank node labeling exceeded its work budget")]
    WorkBudgetExceeded,
}

impl CanonicalizationError {
    /// Whether the failure comes from context processing or term resolution,
    /// as opposed to the later dataset construction and labeling.
    pub fn is_context_error(&self) -> bool {
        matches!(
            self,
            CanonicalizationError::InvalidContext(_)
                | CanonicalizationError::UndefinedTerm(_)
                | CanonicalizationError::ProtectedTermRedefinition(_)
        )
    }
}

/// Produces canonical N-Quads from JSON-LD documents.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer<'a> {
    contexts: &'a ContextStore,
    max_work: usize,
}

impl Default for Canonicalizer<'static> {
    fn default() -> Self {
        Canonicalizer::new(&DEFAULT_CONTEXTS)
    }
}

impl<'a> Canonicalizer<'a> {
    pub fn new(contexts: &'a ContextStore) -> Self {
        Self {
            contexts,
            max_work: DEFAULT_MAX_WORK,
        }
    }

    pub fn with_max_work(mut self, max_work: usize) -> Self {
        self.max_work = max_work;
        self
    }

    /// Expands a document into JSON-LD expanded form.
    pub fn expand(&self, document: &Value) -> Result<Value, CanonicalizationError> {
        expand::expand_document(document, self.contexts)
    }

    /// Converts a document to its (unlabeled) RDF dataset.
    pub fn to_dataset(&self, document: &Value) -> Result<Vec<Quad>, CanonicalizationError> {
        let expanded = self.expand(document)?;
        rdf::to_dataset(&expanded)
    }

    /// Returns the canonical N-Quads serialization of a document.
    pub fn canonicalize(&self, document: &Value) -> Result<String, CanonicalizationError> {
        let dataset = self.to_dataset(document)?;
        let labeled = urdna2015::canonicalize(&dataset, self.max_work)?;

        let mut lines: Vec<String> = labeled.iter().map(Quad::to_nquad).collect();
        lines.sort();
        lines.dedup();

        tracing::trace!(quads = lines.len(), "canonicalized document");
        Ok(lines.concat())
    }
}

/// Canonicalizes a document with the built-in contexts.
pub fn canonicalize(document: &Value) -> Result<String, CanonicalizationError> {
    Canonicalizer::default().canonicalize(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credential() -> Value {
        json!({
            "@context": [CREDENTIALS_V1, EXAMPLES_V1],
            "id": "http://example.edu/credentials/1872",
            "type": ["VerifiableCredential", "AlumniCredential"],
            "issuer": "did:example:issuer",
            "issuanceDate": "2010-01-01T19:23:24Z",
            "credentialSubject": {
                "id": "did:example:subject",
                "alumniOf": "Example University"
            }
        })
    }

    #[test]
    fn test_canonical_credential() {
        let nquads = canonicalize(&credential()).unwrap();

        let expected = concat!(
            "<did:example:subject> <http://schema.org/alumniOf> \"Example University\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#HTML> .\n",
            "<http://example.edu/credentials/1872> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://example.org/examples#AlumniCredential> .\n",
            "<http://example.edu/credentials/1872> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .\n",
            "<http://example.edu/credentials/1872> <https://www.w3.org/2018/credentials#credentialSubject> <did:example:subject> .\n",
            "<http://example.edu/credentials/1872> <https://www.w3.org/2018/credentials#issuanceDate> \"2010-01-01T19:23:24Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n",
            "<http://example.edu/credentials/1872> <https://www.w3.org/2018/credentials#issuer> <did:example:issuer> .\n",
        );
        assert_eq!(nquads, expected);
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let reordered: Value = serde_json::from_str(
            r#"{
                "credentialSubject": {"alumniOf": "Example University", "id": "did:example:subject"},
                "issuanceDate": "2010-01-01T19:23:24Z",
                "issuer": "did:example:issuer",
                "type": ["VerifiableCredential", "AlumniCredential"],
                "id": "http://example.edu/credentials/1872",
                "@context": ["https://www.w3.org/2018/credentials/v1", "https://www.w3.org/2018/credentials/examples/v1"]
            }"#,
        )
        .unwrap();

        assert_eq!(canonicalize(&credential()).unwrap(), canonicalize(&reordered).unwrap());
    }

    #[test]
    fn test_blank_node_labels_are_canonical() {
        let mut doc = credential();
        doc.as_object_mut().unwrap().remove("id");
        doc["credentialSubject"] = json!({"alumniOf": "Example University"});

        let nquads = canonicalize(&doc).unwrap();
        assert!(nquads.contains("_:c14n0"));
        assert!(nquads.contains("_:c14n1"));
        assert!(!nquads.contains("_:b"));

        let mut renamed = doc.clone();
        renamed["id"] = json!("_:whatever");
        renamed["credentialSubject"]["id"] = json!("_:other");
        assert_eq!(canonicalize(&renamed).unwrap(), nquads);
    }

    #[test]
    fn test_proof_lands_in_named_graph() {
        let mut doc = credential();
        doc["proof"] = json!({
            "type": "Ed25519Signature2018",
            "created": "2021-01-01T00:00:00Z",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:issuer#key-1",
            "jws": "abc"
        });

        let nquads = canonicalize(&doc).unwrap();
        let proof_line = nquads
            .lines()
            .find(|line| line.contains("<https://w3id.org/security#proof>"))
            .unwrap();
        let graph = proof_line.split(' ').nth(2).unwrap();
        assert!(graph.starts_with("_:c14n"));

        let in_graph: Vec<&str> = nquads
            .lines()
            .filter(|line| line.split(' ').nth(3) == Some(graph))
            .collect();
        assert_eq!(in_graph.len(), 5);

        let links: Vec<&str> = nquads
            .lines()
            .filter(|line| line.ends_with(&format!(" {graph} .")) && line.split(' ').nth(3) == Some("."))
            .collect();
        assert_eq!(links, vec![proof_line]);
        assert!(in_graph
            .iter()
            .any(|line| line.contains("<https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod>")));
        assert!(in_graph
            .iter()
            .any(|line| line.contains("<https://w3id.org/security#verificationMethod> <did:example:issuer#key-1>")));
        assert!(in_graph
            .iter()
            .any(|line| line.contains("<http://purl.org/dc/terms/created> \"2021-01-01T00:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime>")));
    }

    #[test]
    fn test_list_order_is_preserved() {
        let doc = |items: Value| {
            json!({
                "@context": {"items": {"@id": "https://example.org/items", "@container": "@list"}},
                "@id": "https://example.org/thing",
                "items": items
            })
        };

        let forward = canonicalize(&doc(json!(["a", "b"]))).unwrap();
        let backward = canonicalize(&doc(json!(["b", "a"]))).unwrap();
        assert_ne!(forward, backward);
        assert!(forward.contains("<http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"a\""));
        assert!(forward.contains("<http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil>"));

        let empty = canonicalize(&doc(json!([]))).unwrap();
        assert_eq!(
            empty,
            "<https://example.org/thing> <https://example.org/items> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> .\n"
        );
    }

    #[test]
    fn test_undefined_term_is_a_context_error() {
        let doc = json!({
            "@context": CREDENTIALS_V1,
            "type": "VerifiableCredential",
            "unknownTerm": "value"
        });

        let err = canonicalize(&doc).unwrap_err();
        assert_eq!(err, CanonicalizationError::UndefinedTerm("unknownTerm".to_string()));
        assert!(err.is_context_error());
    }

    #[test]
    fn test_unknown_context_url() {
        let doc = json!({"@context": "https://example.com/unknown/v1", "name": "x"});
        assert!(matches!(canonicalize(&doc), Err(CanonicalizationError::InvalidContext(_))));
    }

    #[test]
    fn test_relative_identifier_is_not_canonicalizable() {
        let doc = json!({
            "@context": {"name": "http://schema.org/name"},
            "@id": "relative/path",
            "name": "x"
        });

        let err = canonicalize(&doc).unwrap_err();
        assert_eq!(err, CanonicalizationError::RelativeIri("relative/path".to_string()));
        assert!(!err.is_context_error());
    }

    #[test]
    fn test_caller_supplied_context() {
        let mut store = DEFAULT_CONTEXTS.clone();
        store.insert(
            "https://example.com/custom/v1",
            json!({"@context": {"nickname": "https://example.com/vocab#nickname"}}),
        );

        let doc = json!({
            "@context": "https://example.com/custom/v1",
            "@id": "https://example.com/people/1",
            "nickname": "bob"
        });

        assert!(canonicalize(&doc).is_err());
        assert_eq!(
            Canonicalizer::new(&store).canonicalize(&doc).unwrap(),
            "<https://example.com/people/1> <https://example.com/vocab#nickname> \"bob\" .\n"
        );
    }

    #[test]
    fn test_work_budget() {
        // A ring of indistinguishable blank nodes needs n-degree hashing.
        let doc = json!({
            "@context": {"next": {"@id": "https://example.org/next", "@type": "@id"}},
            "@graph": [
                {"@id": "_:a", "next": "_:b"},
                {"@id": "_:b", "next": "_:c"},
                {"@id": "_:c", "next": "_:a"}
            ]
        });

        let nquads = canonicalize(&doc).unwrap();
        assert_eq!(nquads.lines().count(), 3);

        let starved = Canonicalizer::default().with_max_work(1).canonicalize(&doc);
        assert_eq!(starved, Err(CanonicalizationError::WorkBudgetExceeded));
    }
}
