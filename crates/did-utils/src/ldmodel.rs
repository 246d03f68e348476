use serde::{Deserialize, Serialize};
use serde_json::Value;

// The @context property defines the vocabulary used in the JSON-LD document.
// It maps the keys in the JSON structure to specific terms, properties, and
// classes from external vocabularies.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Context {
    SingleString(String),
    SetOfString(Vec<String>),
    // Inline context definitions, or arrays mixing URLs and definitions.
    JsonObject(Value),
}

impl Context {
    /// Returns the context URLs in declaration order, skipping inline definitions.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            Context::SingleString(url) => vec![url.as_str()],
            Context::SetOfString(urls) => urls.iter().map(String::as_str).collect(),
            Context::JsonObject(Value::Array(entries)) => entries.iter().filter_map(Value::as_str).collect(),
            Context::JsonObject(_) => vec![],
        }
    }

    /// Returns the first entry if it is a URL.
    pub fn first_url(&self) -> Option<&str> {
        match self {
            Context::SingleString(url) => Some(url),
            Context::SetOfString(urls) => urls.first().map(String::as_str),
            Context::JsonObject(Value::Array(entries)) => entries.first().and_then(Value::as_str),
            Context::JsonObject(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_variants() {
        let single: Context = serde_json::from_value(json!("https://www.w3.org/ns/did/v1")).unwrap();
        assert_eq!(single.first_url(), Some("https://www.w3.org/ns/did/v1"));

        let mixed: Context = serde_json::from_value(json!([
            "https://www.w3.org/2018/credentials/v1",
            {"ex": "https://example.org/"},
            "https://w3id.org/security/suites/ed25519-2020/v1"
        ]))
        .unwrap();
        assert!(matches!(mixed, Context::JsonObject(_)));
        assert_eq!(
            mixed.urls(),
            vec!["https://www.w3.org/2018/credentials/v1", "https://w3id.org/security/suites/ed25519-2020/v1"]
        );

        let inline: Context = serde_json::from_value(json!({"@vocab": "https://example.org/"})).unwrap();
        assert_eq!(inline.first_url(), None);
    }
}
