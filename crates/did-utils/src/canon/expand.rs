use serde_json::{Map, Value};

use super::context::{is_absolute_iri, is_blank_node, is_keyword, process_context, ActiveContext, ContextStore};
use super::CanonicalizationError;

/// Expands a document, always returning an array of top-level objects.
pub(crate) fn expand_document(document: &Value, store: &ContextStore) -> Result<Value, CanonicalizationError> {
    let expander = Expander { store };
    let expanded = expander.expand(&ActiveContext::default(), None, document)?;

    let expanded = match expanded {
        None => Vec::new(),
        Some(Value::Object(mut map)) if map.len() == 1 && map.contains_key("@graph") => {
            as_array(map.remove("@graph").unwrap_or(Value::Null))
        }
        Some(value) => as_array(value),
    };

    Ok(Value::Array(expanded))
}

fn as_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn malformed(message: impl Into<String>) -> CanonicalizationError {
    CanonicalizationError::MalformedDocument(message.into())
}

fn append(result: &mut Map<String, Value>, key: &str, value: Value) {
    let entry = result.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        items.extend(as_array(value));
    }
}

struct Expander<'s> {
    store: &'s ContextStore,
}

impl Expander<'_> {
    fn expand(
        &self,
        ctx: &ActiveContext,
        property: Option<&str>,
        element: &Value,
    ) -> Result<Option<Value>, CanonicalizationError> {
        let scoped = property.and_then(|p| ctx.term(p)).and_then(|def| def.context.clone());

        match element {
            Value::Null => Ok(None),
            Value::Array(items) => {
                let in_list = property
                    .and_then(|p| ctx.term(p))
                    .is_some_and(|def| def.has_container("@list"));

                let mut result = Vec::new();
                for item in items {
                    match self.expand(ctx, property, item)? {
                        Some(Value::Array(nested)) if in_list => {
                            let mut list = Map::new();
                            list.insert("@list".to_string(), Value::Array(nested));
                            result.push(Value::Object(list));
                        }
                        Some(Value::Array(nested)) => result.extend(nested),
                        Some(value) => result.push(value),
                        None => {}
                    }
                }
                Ok(Some(Value::Array(result)))
            }
            Value::Object(map) => self.expand_object(ctx, property, map, scoped),
            scalar => {
                if matches!(property, None | Some("@graph")) {
                    return Ok(None);
                }
                let ctx = match &scoped {
                    Some(local) => process_context(ctx, local, self.store, true, true)?,
                    None => ctx.clone(),
                };
                expand_value(&ctx, property, scalar).map(Some)
            }
        }
    }

    fn expand_object(
        &self,
        ctx: &ActiveContext,
        property: Option<&str>,
        element: &Map<String, Value>,
        scoped: Option<Value>,
    ) -> Result<Option<Value>, CanonicalizationError> {
        let mut ctx = ctx.clone();

        // Non-propagated contexts do not apply inside nested node objects.
        if let Some(previous) = ctx.previous.clone() {
            let expands_to = |key: &String| ctx.expand_iri(key, true);
            let is_value = element.keys().any(|k| expands_to(k).as_deref() == Some("@value"));
            let only_id = element.len() == 1 && element.keys().all(|k| expands_to(k).as_deref() == Some("@id"));
            if !is_value && !only_id {
                ctx = *previous;
            }
        }

        if let Some(local) = &scoped {
            ctx = process_context(&ctx, local, self.store, true, true)?;
        }
        if let Some(local) = element.get("@context") {
            ctx = process_context(&ctx, local, self.store, false, true)?;
        }

        let type_scoped = ctx.clone();

        let mut type_keys: Vec<&String> = element
            .keys()
            .filter(|k| ctx.expand_iri(k, true).as_deref() == Some("@type"))
            .collect();
        type_keys.sort();
        for key in type_keys {
            let mut types: Vec<&str> = match &element[key.as_str()] {
                Value::String(t) => vec![t.as_str()],
                Value::Array(ts) => ts.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            types.sort_unstable();
            for t in types {
                if let Some(local) = type_scoped.term(t).and_then(|def| def.context.clone()) {
                    ctx = process_context(&ctx, &local, self.store, false, false)?;
                }
            }
        }

        let mut result = Map::new();
        let mut keys: Vec<&String> = element.keys().collect();
        keys.sort();

        for key in keys {
            if key == "@context" {
                continue;
            }
            let value = &element[key.as_str()];

            let Some(expanded_property) = ctx.expand_iri(key, true) else {
                continue;
            };

            if is_keyword(&expanded_property) {
                self.expand_keyword(&ctx, &type_scoped, property, &expanded_property, value, &mut result)?;
                continue;
            }

            if !(is_absolute_iri(&expanded_property) || is_blank_node(&expanded_property)) {
                return Err(CanonicalizationError::UndefinedTerm(key.to_string()));
            }

            let definition = ctx.term(key);
            let is_json = definition.is_some_and(|def| def.type_mapping.as_deref() == Some("@json"));
            let language_map = definition.is_some_and(|def| def.has_container("@language")) && value.is_object();

            let expanded = if is_json {
                let mut json = Map::new();
                json.insert("@value".to_string(), value.clone());
                json.insert("@type".to_string(), Value::String("@json".to_string()));
                Some(Value::Object(json))
            } else if language_map {
                Some(expand_language_map(value)?)
            } else {
                self.expand(&ctx, Some(key), value)?
            };

            let Some(mut expanded) = expanded else {
                continue;
            };

            if let Some(def) = definition {
                if def.has_container("@list") && !is_list(&expanded) {
                    let mut list = Map::new();
                    list.insert("@list".to_string(), Value::Array(as_array(expanded)));
                    expanded = Value::Object(list);
                }
                if def.has_container("@graph") {
                    let graphs = as_array(expanded)
                        .into_iter()
                        .map(|item| {
                            let mut graph = Map::new();
                            graph.insert("@graph".to_string(), Value::Array(as_array(item)));
                            Value::Object(graph)
                        })
                        .collect();
                    expanded = Value::Array(graphs);
                }
            }

            append(&mut result, &expanded_property, expanded);
        }

        finish_object(result, property)
    }

    fn expand_keyword(
        &self,
        ctx: &ActiveContext,
        type_scoped: &ActiveContext,
        property: Option<&str>,
        keyword: &str,
        value: &Value,
        result: &mut Map<String, Value>,
    ) -> Result<(), CanonicalizationError> {
        if result.contains_key(keyword) && keyword != "@type" {
            return Err(malformed(format!("colliding keywords {keyword}")));
        }

        match keyword {
            "@id" => {
                let id = value.as_str().ok_or_else(|| malformed("@id must be a string"))?;
                if let Some(iri) = ctx.expand_iri(id, false) {
                    result.insert("@id".to_string(), Value::String(iri));
                }
            }
            "@type" => {
                let types: Vec<&str> = match value {
                    Value::String(t) => vec![t.as_str()],
                    Value::Array(ts) => ts
                        .iter()
                        .map(|t| t.as_str().ok_or_else(|| malformed("@type entries must be strings")))
                        .collect::<Result<_, _>>()?,
                    _ => return Err(malformed("@type must be a string or an array of strings")),
                };
                for t in types {
                    let Some(iri) = type_scoped.expand_iri(t, true) else {
                        continue;
                    };
                    if iri != "@json" && !(is_absolute_iri(&iri) || is_blank_node(&iri)) {
                        return Err(CanonicalizationError::UndefinedTerm(t.to_string()));
                    }
                    append(result, "@type", Value::String(iri));
                }
            }
            "@graph" => {
                let graph = self.expand(ctx, Some("@graph"), value)?.unwrap_or(Value::Null);
                result.insert("@graph".to_string(), Value::Array(as_array(graph)));
            }
            "@value" => {
                if value.is_array() || value.is_object() {
                    return Err(malformed("@value must be a scalar"));
                }
                result.insert("@value".to_string(), value.clone());
            }
            "@language" => {
                let language = value.as_str().ok_or_else(|| malformed("@language must be a string"))?;
                result.insert("@language".to_string(), Value::String(language.to_lowercase()));
            }
            "@list" => {
                if matches!(property, None | Some("@graph")) {
                    return Ok(());
                }
                let items = self.expand(ctx, property, value)?.unwrap_or(Value::Null);
                result.insert("@list".to_string(), Value::Array(as_array(items)));
            }
            "@set" => {
                let items = self.expand(ctx, property, value)?.unwrap_or(Value::Null);
                result.insert("@set".to_string(), Value::Array(as_array(items)));
            }
            "@included" | "@reverse" | "@nest" | "@index" | "@direction" => {
                return Err(CanonicalizationError::Unsupported(keyword.to_string()));
            }
            _ => {}
        }
        Ok(())
    }
}

fn is_list(value: &Value) -> bool {
    value.get("@list").is_some()
}

fn expand_language_map(value: &Value) -> Result<Value, CanonicalizationError> {
    let mut items = Vec::new();
    if let Value::Object(map) = value {
        let mut languages: Vec<&String> = map.keys().collect();
        languages.sort();
        for language in languages {
            let strings = match &map[language.as_str()] {
                Value::Array(values) => values.clone(),
                other => vec![other.clone()],
            };
            for s in strings {
                match s {
                    Value::Null => continue,
                    Value::String(_) => {}
                    _ => return Err(malformed("language map values must be strings")),
                }
                let mut item = Map::new();
                item.insert("@value".to_string(), s);
                if language != "@none" {
                    item.insert("@language".to_string(), Value::String(language.to_lowercase()));
                }
                items.push(Value::Object(item));
            }
        }
    }
    Ok(Value::Array(items))
}

/// Value, set and list cleanup plus free-floating value removal.
fn finish_object(mut result: Map<String, Value>, property: Option<&str>) -> Result<Option<Value>, CanonicalizationError> {
    if let Some(value) = result.get("@value") {
        let allowed = result
            .keys()
            .all(|k| matches!(k.as_str(), "@value" | "@type" | "@language"));
        if !allowed {
            return Err(malformed("value objects may only carry @value, @type and @language"));
        }
        if value.is_null() {
            return Ok(None);
        }

        let types = result.get("@type").map(|t| as_array(t.clone())).unwrap_or_default();
        if types.len() > 1 {
            return Err(malformed("value objects take a single datatype"));
        }
        if let Some(datatype) = types.into_iter().next() {
            if result.contains_key("@language") {
                return Err(malformed("value objects cannot combine @type and @language"));
            }
            result.insert("@type".to_string(), datatype);
        }
        if result.contains_key("@language") && !result["@value"].is_string() {
            return Err(malformed("language-tagged values must be strings"));
        }
        return Ok(Some(Value::Object(result)));
    }

    if let Some(set) = result.remove("@set") {
        if !result.is_empty() {
            return Err(malformed("@set cannot be combined with other entries"));
        }
        return Ok(Some(set));
    }

    if result.contains_key("@list") && result.len() > 1 {
        return Err(malformed("@list cannot be combined with other entries"));
    }

    if result.len() == 1 && result.contains_key("@language") {
        return Ok(None);
    }

    if matches!(property, None | Some("@graph")) {
        let floating = result.is_empty()
            || result.contains_key("@value")
            || result.contains_key("@list")
            || (result.len() == 1 && result.contains_key("@id"));
        if floating {
            return Ok(None);
        }
    }

    Ok(Some(Value::Object(result)))
}

/// Expands a scalar according to the type and language mappings of its property.
fn expand_value(ctx: &ActiveContext, property: Option<&str>, value: &Value) -> Result<Value, CanonicalizationError> {
    let definition = property.and_then(|p| ctx.term(p));
    let type_mapping = definition.and_then(|def| def.type_mapping.as_deref());

    let mut result = Map::new();
    match (type_mapping, value) {
        (Some("@id"), Value::String(id)) => {
            if let Some(iri) = ctx.expand_iri(id, false) {
                result.insert("@id".to_string(), Value::String(iri));
            }
            return Ok(Value::Object(result));
        }
        (Some("@vocab"), Value::String(id)) => {
            if let Some(iri) = ctx.expand_iri(id, true) {
                result.insert("@id".to_string(), Value::String(iri));
            }
            return Ok(Value::Object(result));
        }
        _ => {}
    }

    result.insert("@value".to_string(), value.clone());
    match type_mapping {
        Some("@id") | Some("@vocab") | Some("@none") | None => {
            if let Value::String(_) = value {
                let language = match definition.and_then(|def| def.language.clone()) {
                    Some(language) => language,
                    None => ctx.language.clone(),
                };
                if let Some(language) = language {
                    result.insert("@language".to_string(), Value::String(language));
                }
            }
        }
        Some(datatype) => {
            result.insert("@type".to_string(), Value::String(datatype.to_string()));
        }
    }
    Ok(Value::Object(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::DEFAULT_CONTEXTS;
    use serde_json::json;

    fn expand(doc: Value) -> Value {
        expand_document(&doc, &DEFAULT_CONTEXTS).unwrap()
    }

    #[test]
    fn test_typed_and_language_values() {
        let expanded = expand(json!({
            "@context": {
                "@language": "EN",
                "ex": "https://example.org/",
                "age": {"@id": "ex:age", "@type": "http://www.w3.org/2001/XMLSchema#integer"},
                "label": "ex:label",
                "code": {"@id": "ex:code", "@language": null},
                "homepage": {"@id": "ex:homepage", "@type": "@id"}
            },
            "@id": "ex:alice",
            "age": 42,
            "label": "Alice",
            "code": "A-1",
            "homepage": "ex:home"
        }));

        assert_eq!(
            expanded,
            json!([{
                "@id": "https://example.org/alice",
                "https://example.org/age": [{"@value": 42, "@type": "http://www.w3.org/2001/XMLSchema#integer"}],
                "https://example.org/code": [{"@value": "A-1"}],
                "https://example.org/homepage": [{"@id": "https://example.org/home"}],
                "https://example.org/label": [{"@value": "Alice", "@language": "en"}]
            }])
        );
    }

    #[test]
    fn test_type_scoped_context_does_not_propagate() {
        let expanded = expand(json!({
            "@context": [
                "https://www.w3.org/2018/credentials/v1",
                {"knows": {"@id": "https://example.org/knows", "@type": "@id"}, "nick": "https://example.org/nick"}
            ],
            "type": "VerifiableCredential",
            "credentialSubject": {"id": "did:example:1", "nick": "one"}
        }));

        assert_eq!(
            expanded[0]["https://www.w3.org/2018/credentials#credentialSubject"],
            json!([{"@id": "did:example:1", "https://example.org/nick": [{"@value": "one"}]}])
        );

        // `issuer` only exists inside the credential's own node.
        let err = expand_document(
            &json!({
                "@context": "https://www.w3.org/2018/credentials/v1",
                "type": "VerifiableCredential",
                "credentialSubject": {"issuer": "did:example:1"}
            }),
            &DEFAULT_CONTEXTS,
        )
        .unwrap_err();
        assert_eq!(err, CanonicalizationError::UndefinedTerm("issuer".to_string()));
    }

    #[test]
    fn test_graph_container_and_vocab_values() {
        let expanded = expand(json!({
            "@context": "https://www.w3.org/2018/credentials/v1",
            "id": "urn:uuid:1",
            "type": "VerifiableCredential",
            "proof": {"type": "Ed25519Signature2018", "proofPurpose": "assertionMethod"}
        }));

        assert_eq!(
            expanded[0]["https://w3id.org/security#proof"],
            json!([{"@graph": [{
                "@type": ["https://w3id.org/security#Ed25519Signature2018"],
                "https://w3id.org/security#proofPurpose": [{"@id": "https://w3id.org/security#assertionMethod"}]
            }]}])
        );
    }

    #[test]
    fn test_json_literals_and_free_floating_values() {
        let expanded = expand(json!({
            "@context": {"data": {"@id": "https://example.org/data", "@type": "@json"}},
            "@graph": [
                {"@id": "https://example.org/a", "data": {"b": [1, 2], "a": true}},
                {"@id": "https://example.org/only-id"},
                "dangling"
            ]
        }));

        assert_eq!(
            expanded,
            json!([{
                "@id": "https://example.org/a",
                "https://example.org/data": [{"@value": {"b": [1, 2], "a": true}, "@type": "@json"}]
            }])
        );
    }

    #[test]
    fn test_language_maps_and_lists() {
        let expanded = expand(json!({
            "@context": {
                "title": {"@id": "https://example.org/title", "@container": "@language"},
                "steps": {"@id": "https://example.org/steps", "@container": "@list"}
            },
            "@id": "https://example.org/doc",
            "title": {"fr": "Bonjour", "en": ["Hello", "Hi"]},
            "steps": ["one", {"@id": "https://example.org/two"}]
        }));

        assert_eq!(
            expanded[0]["https://example.org/title"],
            json!([
                {"@value": "Hello", "@language": "en"},
                {"@value": "Hi", "@language": "en"},
                {"@value": "Bonjour", "@language": "fr"}
            ])
        );
        assert_eq!(
            expanded[0]["https://example.org/steps"],
            json!([{"@list": [{"@value": "one"}, {"@id": "https://example.org/two"}]}])
        );
    }

    #[test]
    fn test_unsupported_keywords() {
        let err = expand_document(
            &json!({"@context": {"ex": "https://example.org/"}, "@reverse": {"ex:p": {"@id": "ex:x"}}}),
            &DEFAULT_CONTEXTS,
        )
        .unwrap_err();
        assert_eq!(err, CanonicalizationError::Unsupported("@reverse".to_string()));
    }
}
