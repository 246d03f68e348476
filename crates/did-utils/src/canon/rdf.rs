use std::collections::HashMap;
use std::fmt::Write as _;

use serde_json::{Map, Value};

use super::context::{is_absolute_iri, is_blank_node};
use super::CanonicalizationError;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// An RDF term. Blank node labels are stored without the `_:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
}

impl Term {
    pub fn as_blank(&self) -> Option<&str> {
        match self {
            Term::Blank(label) => Some(label),
            _ => None,
        }
    }

    fn write_nquad(&self, out: &mut String, relabel: &dyn Fn(&str) -> String) {
        match self {
            Term::Iri(iri) => {
                let _ = write!(out, "<{iri}>");
            }
            Term::Blank(label) => {
                let _ = write!(out, "_:{}", relabel(label));
            }
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                out.push('"');
                escape_literal(value, out);
                out.push('"');
                if let Some(language) = language {
                    let _ = write!(out, "@{language}");
                } else if datatype != XSD_STRING {
                    let _ = write!(out, "^^<{datatype}>");
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Option<Term>,
}

impl Quad {
    /// N-Quads line, terminated by `" .\n"`.
    pub fn to_nquad(&self) -> String {
        self.to_nquad_with(&|label: &str| -> String { label.to_string() })
    }

    /// N-Quads line with blank node labels rewritten by `relabel`.
    pub(crate) fn to_nquad_with(&self, relabel: &dyn Fn(&str) -> String) -> String {
        let mut out = String::new();
        self.subject.write_nquad(&mut out, relabel);
        out.push(' ');
        self.predicate.write_nquad(&mut out, relabel);
        out.push(' ');
        self.object.write_nquad(&mut out, relabel);
        if let Some(graph) = &self.graph {
            out.push(' ');
            graph.write_nquad(&mut out, relabel);
        }
        out.push_str(" .\n");
        out
    }
}

fn escape_literal(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            // other control characters are emitted as is
            c => out.push(c),
        }
    }
}

/// Canonical lexical form of an `xsd:double`, e.g. `1.1E0`.
fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:.15E}");
    let (mantissa, exponent) = formatted.split_once('E').unwrap_or((formatted.as_str(), "0"));
    let mantissa = match mantissa.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            let fraction = if fraction.is_empty() { "0" } else { fraction };
            format!("{whole}.{fraction}")
        }
        None => format!("{mantissa}.0"),
    };
    format!("{mantissa}E{exponent}")
}

/// Converts expanded JSON-LD into an RDF dataset.
pub(crate) fn to_dataset(expanded: &Value) -> Result<Vec<Quad>, CanonicalizationError> {
    let mut builder = DatasetBuilder::default();
    if let Value::Array(nodes) = expanded {
        for node in nodes {
            if let Value::Object(node) = node {
                builder.node(node, None)?;
            }
        }
    }
    Ok(builder.quads)
}

#[derive(Default)]
struct DatasetBuilder {
    quads: Vec<Quad>,
    labels: HashMap<String, String>,
    counter: usize,
}

impl DatasetBuilder {
    fn fresh_blank(&mut self) -> Term {
        let label = format!("b{}", self.counter);
        self.counter += 1;
        Term::Blank(label)
    }

    /// Maps document blank node identifiers onto generated labels.
    fn blank(&mut self, id: &str) -> Term {
        if let Some(label) = self.labels.get(id) {
            return Term::Blank(label.clone());
        }
        let term = self.fresh_blank();
        if let Term::Blank(label) = &term {
            self.labels.insert(id.to_string(), label.clone());
        }
        term
    }

    fn resource(&mut self, id: &str) -> Result<Term, CanonicalizationError> {
        if is_blank_node(id) {
            Ok(self.blank(id))
        } else if is_absolute_iri(id) {
            Ok(Term::Iri(id.to_string()))
        } else {
            Err(CanonicalizationError::RelativeIri(id.to_string()))
        }
    }

    fn push(&mut self, subject: Term, predicate: &str, object: Term, graph: &Option<Term>) {
        self.quads.push(Quad {
            subject,
            predicate: Term::Iri(predicate.to_string()),
            object,
            graph: graph.clone(),
        });
    }

    /// Emits the quads of a node object and returns its subject term.
    fn node(&mut self, node: &Map<String, Value>, graph: Option<Term>) -> Result<Term, CanonicalizationError> {
        let subject = match node.get("@id").and_then(Value::as_str) {
            Some(id) => self.resource(id)?,
            None => self.fresh_blank(),
        };

        if let Some(Value::Array(types)) = node.get("@type") {
            for t in types.iter().filter_map(Value::as_str) {
                let object = self.resource(t)?;
                self.push(subject.clone(), RDF_TYPE, object, &graph);
            }
        }

        if let Some(Value::Array(members)) = node.get("@graph") {
            let name = Some(subject.clone());
            for member in members {
                if let Value::Object(member) = member {
                    if !member.contains_key("@value") && !member.contains_key("@list") {
                        self.node(member, name.clone())?;
                    }
                }
            }
        }

        let mut properties: Vec<&String> = node.keys().filter(|k| !k.starts_with('@')).collect();
        properties.sort();

        for property in properties {
            // generalized RDF is not produced
            if is_blank_node(property) {
                continue;
            }
            let Some(Value::Array(values)) = node.get(property.as_str()) else {
                continue;
            };
            for value in values {
                if let Some(object) = self.object(value, &graph)? {
                    self.push(subject.clone(), property, object, &graph);
                }
            }
        }

        Ok(subject)
    }

    fn object(&mut self, value: &Value, graph: &Option<Term>) -> Result<Option<Term>, CanonicalizationError> {
        let Value::Object(item) = value else {
            return Ok(None);
        };

        if item.contains_key("@value") {
            return literal(item).map(Some);
        }

        if let Some(Value::Array(items)) = item.get("@list") {
            return self.list(items, graph).map(Some);
        }

        if item.contains_key("@graph") && !item.keys().any(|k| !k.starts_with('@')) {
            let name = match item.get("@id").and_then(Value::as_str) {
                Some(id) => self.resource(id)?,
                None => self.fresh_blank(),
            };
            if let Some(Value::Array(members)) = item.get("@graph") {
                for member in members {
                    if let Value::Object(member) = member {
                        self.node(member, Some(name.clone()))?;
                    }
                }
            }
            return Ok(Some(name));
        }

        self.node(item, graph.clone()).map(Some)
    }

    fn list(&mut self, items: &[Value], graph: &Option<Term>) -> Result<Term, CanonicalizationError> {
        let mut objects = Vec::new();
        for item in items {
            if let Some(object) = self.object(item, graph)? {
                objects.push(object);
            }
        }

        if objects.is_empty() {
            return Ok(Term::Iri(RDF_NIL.to_string()));
        }

        let cells: Vec<Term> = objects.iter().map(|_| self.fresh_blank()).collect();
        for (i, object) in objects.into_iter().enumerate() {
            self.push(cells[i].clone(), RDF_FIRST, object, graph);
            let rest = match cells.get(i + 1) {
                Some(next) => next.clone(),
                None => Term::Iri(RDF_NIL.to_string()),
            };
            self.push(cells[i].clone(), RDF_REST, rest, graph);
        }

        Ok(cells[0].clone())
    }
}

fn literal(item: &Map<String, Value>) -> Result<Term, CanonicalizationError> {
    let value = &item["@value"];
    let datatype = item.get("@type").and_then(Value::as_str);
    let language = item.get("@language").and_then(Value::as_str).map(str::to_string);

    if datatype == Some("@json") {
        let canonical = json_canon::to_string(value)
            .map_err(|err| CanonicalizationError::MalformedDocument(format!("JSON literal: {err}")))?;
        return Ok(Term::Literal {
            value: canonical,
            datatype: RDF_JSON.to_string(),
            language: None,
        });
    }

    let (lexical, default_type) = match value {
        Value::Bool(b) => (b.to_string(), XSD_BOOLEAN),
        Value::Number(n) => {
            let as_double = datatype == Some(XSD_DOUBLE);
            match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) if !as_double => (i.to_string(), XSD_INTEGER),
                (_, Some(u), _) if !as_double => (u.to_string(), XSD_INTEGER),
                (_, _, Some(f)) if !as_double && f.fract() == 0.0 && f.abs() < 1e21 => {
                    (format!("{}", f as i128), XSD_INTEGER)
                }
                (_, _, Some(f)) => (canonical_double(f), XSD_DOUBLE),
                _ => {
                    return Err(CanonicalizationError::MalformedDocument(format!(
                        "unrepresentable number {n}"
                    )))
                }
            }
        }
        Value::String(s) if language.is_some() => (s.clone(), RDF_LANG_STRING),
        Value::String(s) => (s.clone(), XSD_STRING),
        _ => return Err(CanonicalizationError::MalformedDocument("invalid @value".to_string())),
    };

    if let Some(dt) = datatype {
        if !is_absolute_iri(dt) {
            return Err(CanonicalizationError::RelativeIri(dt.to_string()));
        }
    }

    Ok(Term::Literal {
        value: lexical,
        datatype: datatype.unwrap_or(default_type).to_string(),
        language: if datatype.is_some() { None } else { language },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(subject: Term, predicate: &str, object: Term) -> String {
        Quad {
            subject,
            predicate: Term::Iri(predicate.to_string()),
            object,
            graph: None,
        }
        .to_nquad()
    }

    #[test]
    fn test_literal_serialization() {
        let s = Term::Iri("https://example.org/s".to_string());

        let escaped = Term::Literal {
            value: "line\nwith \"quotes\" and \\".to_string(),
            datatype: XSD_STRING.to_string(),
            language: None,
        };
        assert_eq!(
            line(s.clone(), "https://example.org/p", escaped),
            "<https://example.org/s> <https://example.org/p> \"line\\nwith \\\"quotes\\\" and \\\\\" .\n"
        );

        let controls = Term::Literal {
            value: "tab\there\u{8}\r".to_string(),
            datatype: XSD_STRING.to_string(),
            language: None,
        };
        assert_eq!(
            line(s.clone(), "https://example.org/p", controls),
            "<https://example.org/s> <https://example.org/p> \"tab\there\u{8}\\r\" .\n"
        );

        let tagged = Term::Literal {
            value: "hallo".to_string(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some("de".to_string()),
        };
        assert_eq!(
            line(s, "https://example.org/p", tagged),
            "<https://example.org/s> <https://example.org/p> \"hallo\"@de .\n"
        );
    }

    #[test]
    fn test_native_values() {
        let literal_of = |value: Value| literal(value.as_object().unwrap()).unwrap();

        assert_eq!(
            literal_of(json!({"@value": true})),
            Term::Literal { value: "true".into(), datatype: XSD_BOOLEAN.into(), language: None }
        );
        assert_eq!(
            literal_of(json!({"@value": 5})),
            Term::Literal { value: "5".into(), datatype: XSD_INTEGER.into(), language: None }
        );
        assert_eq!(
            literal_of(json!({"@value": 5.0})),
            Term::Literal { value: "5".into(), datatype: XSD_INTEGER.into(), language: None }
        );
        assert_eq!(
            literal_of(json!({"@value": 1.1})),
            Term::Literal { value: "1.1E0".into(), datatype: XSD_DOUBLE.into(), language: None }
        );
        assert_eq!(
            literal_of(json!({"@value": 5, "@type": XSD_DOUBLE})),
            Term::Literal { value: "5.0E0".into(), datatype: XSD_DOUBLE.into(), language: None }
        );
        assert_eq!(
            literal_of(json!({"@value": {"b": 1, "a": [true]}, "@type": "@json"})),
            Term::Literal { value: r#"{"a":[true],"b":1}"#.into(), datatype: RDF_JSON.into(), language: None }
        );
    }

    #[test]
    fn test_canonical_double() {
        assert_eq!(canonical_double(0.5), "5.0E-1");
        assert_eq!(canonical_double(-123.456), "-1.23456E2");
        assert_eq!(canonical_double(1e25), "1.0E25");
    }

    #[test]
    fn test_document_blank_nodes_are_relabeled() {
        let quads = to_dataset(&json!([{
            "@id": "_:custom",
            "https://example.org/p": [{"@id": "_:custom"}]
        }]))
        .unwrap();

        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].subject, Term::Blank("b0".to_string()));
        assert_eq!(quads[0].object, Term::Blank("b0".to_string()));
    }
}
