use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::CanonicalizationError;

pub const CREDENTIALS_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_V2: &str = "https://www.w3.org/ns/credentials/v2";
pub const EXAMPLES_V1: &str = "https://www.w3.org/2018/credentials/examples/v1";
pub const DATA_INTEGRITY_V2: &str = "https://w3id.org/security/data-integrity/v2";
pub const ED25519_2018_V1: &str = "https://w3id.org/security/suites/ed25519-2018/v1";
pub const ED25519_2020_V1: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const MULTIKEY_V1: &str = "https://w3id.org/security/multikey/v1";
pub const JWS_2020_V1: &str = "https://w3id.org/security/suites/jws-2020/v1";
pub const DID_V1: &str = "https://www.w3.org/ns/did/v1";

const BUILTIN: &[(&str, &str)] = &[
    (CREDENTIALS_V1, include_str!("contexts/credentials-v1.jsonld")),
    (CREDENTIALS_V2, include_str!("contexts/credentials-v2.jsonld")),
    (EXAMPLES_V1, include_str!("contexts/credentials-examples-v1.jsonld")),
    (DATA_INTEGRITY_V2, include_str!("contexts/data-integrity-v2.jsonld")),
    (ED25519_2018_V1, include_str!("contexts/ed25519-2018-v1.jsonld")),
    (ED25519_2020_V1, include_str!("contexts/ed25519-2020-v1.jsonld")),
    (MULTIKEY_V1, include_str!("contexts/multikey-v1.jsonld")),
    (JWS_2020_V1, include_str!("contexts/jws-2020-v1.jsonld")),
    (DID_V1, include_str!("contexts/did-v1.jsonld")),
];

/// Context documents bundled with the library.
pub static DEFAULT_CONTEXTS: Lazy<ContextStore> = Lazy::new(ContextStore::builtin);

/// Nested remote context references allowed before giving up.
const MAX_CONTEXT_DEPTH: usize = 16;

const GEN_DELIMS: [char; 7] = [':', '/', '?', '#', '[', ']', '@'];

/// Offline registry of remote context documents, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    documents: HashMap<String, Value>,
}

impl ContextStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store holding the bundled contexts.
    pub fn builtin() -> Self {
        let mut store = Self::empty();
        for (url, text) in BUILTIN {
            match serde_json::from_str(text) {
                Ok(document) => store.insert(*url, document),
                Err(err) => tracing::error!(%url, %err, "bundled context is not valid JSON"),
            }
        }
        store
    }

    /// Registers a context document (the whole document, `@context` included).
    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.documents.contains_key(url)
    }

    /// Returns the `@context` value of a registered document.
    pub fn get(&self, url: &str) -> Option<&Value> {
        self.documents.get(url).and_then(|doc| doc.get("@context"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TermDefinition {
    pub iri: String,
    pub prefix: bool,
    pub protected: bool,
    pub type_mapping: Option<String>,
    pub containers: Vec<String>,
    /// `Some(None)` when the term explicitly clears the default language.
    pub language: Option<Option<String>>,
    pub context: Option<Value>,
}

impl TermDefinition {
    pub fn has_container(&self, container: &str) -> bool {
        self.containers.iter().any(|c| c == container)
    }

    fn same_as(&self, other: &TermDefinition) -> bool {
        self.iri == other.iri
            && self.prefix == other.prefix
            && self.type_mapping == other.type_mapping
            && self.containers == other.containers
            && self.language == other.language
            && self.context == other.context
    }
}

/// The result of processing `@context` entries.
///
/// A term mapped to `None` was explicitly set to `null` and drops its values.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveContext {
    pub terms: HashMap<String, Option<TermDefinition>>,
    pub vocab: Option<String>,
    pub language: Option<String>,
    /// Context to revert to when entering a nested node, set by non-propagating contexts.
    pub previous: Option<Box<ActiveContext>>,
}

impl ActiveContext {
    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term).and_then(Option::as_ref)
    }

    fn has_protected_terms(&self) -> bool {
        self.terms.values().flatten().any(|def| def.protected)
    }

    /// IRI expansion. Returns `None` when the value maps to `null`.
    ///
    /// Values that cannot be made absolute are returned unchanged.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if looks_like_keyword(value) {
            return None;
        }

        if vocab {
            if let Some(entry) = self.terms.get(value) {
                return entry.as_ref().map(|def| def.iri.clone());
            }
        }

        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(def) = self.term(prefix) {
                if def.prefix {
                    return Some(format!("{}{}", def.iri, suffix));
                }
            }
            if is_absolute_iri(value) {
                return Some(value.to_string());
            }
        }

        if vocab {
            if let Some(base) = &self.vocab {
                return Some(format!("{base}{value}"));
            }
        }

        Some(value.to_string())
    }
}

pub(crate) fn is_keyword(value: &str) -> bool {
    matches!(
        value,
        "@base"
            | "@container"
            | "@context"
            | "@default"
            | "@direction"
            | "@embed"
            | "@explicit"
            | "@graph"
            | "@id"
            | "@import"
            | "@included"
            | "@index"
            | "@json"
            | "@language"
            | "@list"
            | "@nest"
            | "@none"
            | "@omitDefault"
            | "@prefix"
            | "@preserve"
            | "@propagate"
            | "@protected"
            | "@requireAll"
            | "@reverse"
            | "@set"
            | "@type"
            | "@value"
            | "@version"
            | "@vocab"
    )
}

/// `@` followed by letters only: reserved for future keywords and ignored.
fn looks_like_keyword(value: &str) -> bool {
    value.len() > 1 && value.starts_with('@') && value[1..].chars().all(|c| c.is_ascii_alphabetic())
}

pub(crate) fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub(crate) fn is_blank_node(value: &str) -> bool {
    value.starts_with("_:")
}

fn invalid(message: impl Into<String>) -> CanonicalizationError {
    CanonicalizationError::InvalidContext(message.into())
}

/// Applies a local context to `active`, producing a new active context.
pub(crate) fn process_context(
    active: &ActiveContext,
    local: &Value,
    store: &ContextStore,
    override_protected: bool,
    propagate: bool,
) -> Result<ActiveContext, CanonicalizationError> {
    process_context_at(active, local, store, override_protected, propagate, 0)
}

fn process_context_at(
    active: &ActiveContext,
    local: &Value,
    store: &ContextStore,
    override_protected: bool,
    mut propagate: bool,
    depth: usize,
) -> Result<ActiveContext, CanonicalizationError> {
    if depth > MAX_CONTEXT_DEPTH {
        return Err(invalid("context references nest too deeply"));
    }

    let mut result = active.clone();

    if let Some(flag) = local.get("@propagate") {
        propagate = flag.as_bool().ok_or_else(|| invalid("@propagate must be a boolean"))?;
    }
    if !propagate && result.previous.is_none() {
        result.previous = Some(Box::new(active.clone()));
    }

    let entries = match local {
        Value::Array(entries) => entries.iter().collect(),
        other => vec![other],
    };

    for entry in entries {
        match entry {
            Value::Null => {
                if !override_protected && result.has_protected_terms() {
                    return Err(CanonicalizationError::ProtectedTermRedefinition(
                        "context nullification".to_string(),
                    ));
                }
                let previous = result.previous.take();
                result = ActiveContext {
                    previous,
                    ..ActiveContext::default()
                };
            }
            Value::String(url) => {
                let document = store.get(url).ok_or_else(|| invalid(format!("unknown context {url}")))?;
                result = process_context_at(&result, document, store, override_protected, true, depth + 1)?;
            }
            Value::Object(map) => {
                if let Some(version) = map.get("@version") {
                    if version.as_f64() != Some(1.1) {
                        return Err(invalid("unsupported @version"));
                    }
                }
                if map.contains_key("@import") {
                    return Err(CanonicalizationError::Unsupported("@import".to_string()));
                }
                if map.contains_key("@direction") {
                    return Err(CanonicalizationError::Unsupported("@direction".to_string()));
                }

                match map.get("@vocab") {
                    None => {}
                    Some(Value::Null) => result.vocab = None,
                    Some(Value::String(vocab)) => {
                        let iri = result.expand_iri(vocab, true).unwrap_or_default();
                        if !(is_absolute_iri(&iri) || is_blank_node(&iri)) {
                            return Err(invalid(format!("invalid @vocab {vocab}")));
                        }
                        result.vocab = Some(iri);
                    }
                    Some(_) => return Err(invalid("@vocab must be a string or null")),
                }

                match map.get("@language") {
                    None => {}
                    Some(Value::Null) => result.language = None,
                    Some(Value::String(language)) => result.language = Some(language.to_lowercase()),
                    Some(_) => return Err(invalid("@language must be a string or null")),
                }

                let protected = match map.get("@protected") {
                    None => false,
                    Some(Value::Bool(flag)) => *flag,
                    Some(_) => return Err(invalid("@protected must be a boolean")),
                };

                let mut definer = TermDefiner {
                    local: map,
                    defined: HashMap::new(),
                    protected,
                    override_protected,
                };
                for term in map.keys() {
                    if matches!(
                        term.as_str(),
                        "@base" | "@language" | "@propagate" | "@protected" | "@version" | "@vocab"
                    ) {
                        continue;
                    }
                    definer.define(&mut result, term)?;
                }
            }
            _ => return Err(invalid("local context must be an object, string, array or null")),
        }
    }

    Ok(result)
}

struct TermDefiner<'l> {
    local: &'l Map<String, Value>,
    defined: HashMap<String, bool>,
    protected: bool,
    override_protected: bool,
}

impl TermDefiner<'_> {
    /// Expands an IRI while making sure terms it depends on are defined first.
    fn expand(&mut self, active: &mut ActiveContext, value: &str) -> Result<Option<String>, CanonicalizationError> {
        if self.local.contains_key(value) && !is_keyword(value) {
            self.define(active, value)?;
        } else if let Some((prefix, _)) = value.split_once(':') {
            if self.local.contains_key(prefix) {
                self.define(active, prefix)?;
            }
        }
        Ok(active.expand_iri(value, true))
    }

    fn define(&mut self, active: &mut ActiveContext, term: &str) -> Result<(), CanonicalizationError> {
        match self.defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => return Err(invalid(format!("cyclic IRI mapping for {term}"))),
            None => {}
        }
        if term.is_empty() {
            return Err(invalid("empty term"));
        }
        if is_keyword(term) {
            return Err(invalid(format!("keyword redefinition {term}")));
        }
        if looks_like_keyword(term) {
            self.defined.insert(term.to_string(), true);
            return Ok(());
        }
        self.defined.insert(term.to_string(), false);

        let previous = active.terms.remove(term);
        let local = self.local;
        let value = &local[term];

        let definition = self.build(active, term, value)?;

        if let Some(Some(previous)) = &previous {
            if previous.protected && !self.override_protected {
                let unchanged = definition.as_ref().is_some_and(|def| def.same_as(previous));
                if !unchanged {
                    return Err(CanonicalizationError::ProtectedTermRedefinition(term.to_string()));
                }
                active.terms.insert(term.to_string(), Some(previous.clone()));
                self.defined.insert(term.to_string(), true);
                return Ok(());
            }
        }

        active.terms.insert(term.to_string(), definition);
        self.defined.insert(term.to_string(), true);
        Ok(())
    }

    fn build(
        &mut self,
        active: &mut ActiveContext,
        term: &str,
        value: &Value,
    ) -> Result<Option<TermDefinition>, CanonicalizationError> {
        let (map, simple) = match value {
            Value::Null => return Ok(None),
            Value::String(id) => {
                let mut map = Map::new();
                map.insert("@id".to_string(), Value::String(id.clone()));
                (map, true)
            }
            Value::Object(map) => (map.clone(), false),
            _ => return Err(invalid(format!("invalid term definition for {term}"))),
        };

        for key in map.keys() {
            match key.as_str() {
                "@id" | "@type" | "@container" | "@context" | "@language" | "@protected" | "@prefix" => {}
                "@reverse" | "@nest" | "@index" | "@direction" => {
                    return Err(CanonicalizationError::Unsupported(format!("{key} in definition of {term}")))
                }
                other => return Err(invalid(format!("invalid keyword {other} in definition of {term}"))),
            }
        }

        let mut definition = TermDefinition {
            iri: String::new(),
            prefix: false,
            protected: self.protected,
            type_mapping: None,
            containers: Vec::new(),
            language: None,
            context: None,
        };

        if let Some(flag) = map.get("@protected") {
            definition.protected = flag.as_bool().ok_or_else(|| invalid("@protected must be a boolean"))?;
        }

        match map.get("@id") {
            Some(Value::Null) => return Ok(None),
            Some(Value::String(id)) if id != term => {
                if looks_like_keyword(id) && !is_keyword(id) {
                    return Ok(None);
                }
                let iri = self.expand(active, id)?.unwrap_or_default();
                if !(is_keyword(&iri) || is_absolute_iri(&iri) || is_blank_node(&iri)) {
                    return Err(invalid(format!("term {term} does not map to an absolute IRI")));
                }
                if iri == "@context" {
                    return Err(invalid("@context cannot be aliased"));
                }
                definition.prefix = simple && !term.contains(':') && iri.ends_with(&GEN_DELIMS[..]);
                definition.iri = iri;
            }
            Some(Value::String(_)) | None => {
                definition.iri = self.implied_iri(active, term)?;
            }
            Some(_) => return Err(invalid(format!("@id of {term} must be a string"))),
        }

        if let Some(flag) = map.get("@prefix") {
            definition.prefix = flag.as_bool().ok_or_else(|| invalid("@prefix must be a boolean"))?;
        }

        if let Some(type_mapping) = map.get("@type") {
            let type_mapping = type_mapping.as_str().ok_or_else(|| invalid("@type mapping must be a string"))?;
            let iri = self.expand(active, type_mapping)?.unwrap_or_default();
            let valid = matches!(iri.as_str(), "@id" | "@vocab" | "@json" | "@none") || is_absolute_iri(&iri);
            if !valid {
                return Err(invalid(format!("invalid type mapping {type_mapping} for {term}")));
            }
            definition.type_mapping = Some(iri);
        }

        if let Some(container) = map.get("@container") {
            let containers: Vec<String> = match container {
                Value::String(c) => vec![c.clone()],
                Value::Array(cs) => cs
                    .iter()
                    .map(|c| c.as_str().map(str::to_string).ok_or_else(|| invalid("invalid @container")))
                    .collect::<Result<_, _>>()?,
                _ => return Err(invalid("invalid @container")),
            };
            for c in &containers {
                match c.as_str() {
                    "@list" | "@set" | "@graph" | "@language" => {}
                    "@index" | "@id" | "@type" => {
                        return Err(CanonicalizationError::Unsupported(format!("{c} container")))
                    }
                    other => return Err(invalid(format!("invalid container {other}"))),
                }
            }
            definition.containers = containers;
        }

        match map.get("@language") {
            None => {}
            Some(Value::Null) => definition.language = Some(None),
            Some(Value::String(language)) => definition.language = Some(Some(language.to_lowercase())),
            Some(_) => return Err(invalid("@language must be a string or null")),
        }

        if let Some(context) = map.get("@context") {
            definition.context = Some(context.clone());
        }

        Ok(Some(definition))
    }

    /// IRI of a term without an explicit `@id`.
    fn implied_iri(&mut self, active: &mut ActiveContext, term: &str) -> Result<String, CanonicalizationError> {
        if let Some((prefix, suffix)) = term.split_once(':') {
            if self.local.contains_key(prefix) {
                self.define(active, prefix)?;
            }
            if let Some(def) = active.term(prefix) {
                return Ok(format!("{}{}", def.iri, suffix));
            }
            return Ok(term.to_string());
        }
        if term == "@type" {
            return Ok("@type".to_string());
        }
        match &active.vocab {
            Some(vocab) => Ok(format!("{vocab}{term}")),
            None => Err(invalid(format!("term {term} has no IRI mapping"))),
        }
    }
}
