//! URDNA2015 blank node labeling.

use std::collections::{BTreeMap, HashMap};

use super::rdf::{Quad, Term};
use super::CanonicalizationError;
use crate::crypto::digest::sha256_hex;

#[derive(Debug, Clone)]
struct IdentifierIssuer {
    prefix: &'static str,
    counter: usize,
    issued: HashMap<String, String>,
    order: Vec<String>,
}

impl IdentifierIssuer {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: 0,
            issued: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn issue(&mut self, existing: &str) -> String {
        if let Some(id) = self.issued.get(existing) {
            return id.clone();
        }
        let id = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.issued.insert(existing.to_string(), id.clone());
        self.order.push(existing.to_string());
        id
    }

    fn get(&self, existing: &str) -> Option<&String> {
        self.issued.get(existing)
    }
}

struct State<'q> {
    blank_node_quads: HashMap<String, Vec<&'q Quad>>,
    canonical: IdentifierIssuer,
    first_degree: HashMap<String, String>,
    work: usize,
    max_work: usize,
}

fn blank_nodes(quad: &Quad) -> impl Iterator<Item = &str> {
    [Some(&quad.subject), Some(&quad.object), quad.graph.as_ref()]
        .into_iter()
        .flatten()
        .filter_map(Term::as_blank)
}

/// Returns the dataset with every blank node relabeled canonically (`c14n0`, `c14n1`, ...).
pub(crate) fn canonicalize(quads: &[Quad], max_work: usize) -> Result<Vec<Quad>, CanonicalizationError> {
    let mut state = State {
        blank_node_quads: HashMap::new(),
        canonical: IdentifierIssuer::new("c14n"),
        first_degree: HashMap::new(),
        work: 0,
        max_work,
    };

    let mut ordered_nodes: Vec<String> = Vec::new();
    for quad in quads {
        for label in blank_nodes(quad) {
            let entry = state.blank_node_quads.entry(label.to_string()).or_insert_with(|| {
                ordered_nodes.push(label.to_string());
                Vec::new()
            });
            if !entry.iter().any(|q| std::ptr::eq(*q, quad)) {
                entry.push(quad);
            }
        }
    }

    let mut hash_to_nodes: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for label in &ordered_nodes {
        let hash = state.hash_first_degree(label);
        hash_to_nodes.entry(hash).or_default().push(label.clone());
    }

    let mut shared = Vec::new();
    for (_, nodes) in hash_to_nodes {
        if nodes.len() == 1 {
            state.canonical.issue(&nodes[0]);
        } else {
            shared.push(nodes);
        }
    }

    for nodes in shared {
        let mut paths = Vec::new();
        for label in &nodes {
            if state.canonical.get(label).is_some() {
                continue;
            }
            let mut issuer = IdentifierIssuer::new("b");
            issuer.issue(label);
            paths.push(state.hash_n_degree(label, issuer)?);
        }
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, issuer) in paths {
            for existing in &issuer.order {
                state.canonical.issue(existing);
            }
        }
    }

    let relabel = |term: &Term| match term {
        Term::Blank(label) => Term::Blank(state.canonical.get(label).cloned().unwrap_or_else(|| label.clone())),
        other => other.clone(),
    };

    Ok(quads
        .iter()
        .map(|quad| Quad {
            subject: relabel(&quad.subject),
            predicate: quad.predicate.clone(),
            object: relabel(&quad.object),
            graph: quad.graph.as_ref().map(relabel),
        })
        .collect())
}

impl State<'_> {
    fn spend(&mut self) -> Result<(), CanonicalizationError> {
        self.work += 1;
        if self.work > self.max_work {
            tracing::warn!(max_work = self.max_work, "blank node labeling gave up");
            return Err(CanonicalizationError::WorkBudgetExceeded);
        }
        Ok(())
    }

    fn hash_first_degree(&mut self, label: &str) -> String {
        if let Some(hash) = self.first_degree.get(label) {
            return hash.clone();
        }

        let mut lines: Vec<String> = self
            .blank_node_quads
            .get(label)
            .map(|quads| {
                quads
                    .iter()
                    .map(|quad| {
                        quad.to_nquad_with(&|other: &str| -> String {
                            if other == label { "a".to_string() } else { "z".to_string() }
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        lines.sort();

        let hash = sha256_hex(lines.concat().as_bytes());
        self.first_degree.insert(label.to_string(), hash.clone());
        hash
    }

    fn hash_related(&mut self, related: &str, predicate: &Term, issuer: &IdentifierIssuer, position: &str) -> String {
        let identifier = match self.canonical.get(related).or_else(|| issuer.get(related)) {
            Some(id) => format!("_:{id}"),
            None => self.hash_first_degree(related),
        };

        let mut input = position.to_string();
        if position != "g" {
            if let Term::Iri(iri) = predicate {
                input.push('<');
                input.push_str(iri);
                input.push('>');
            }
        }
        input.push_str(&identifier);
        sha256_hex(input.as_bytes())
    }

    fn hash_n_degree(
        &mut self,
        label: &str,
        mut issuer: IdentifierIssuer,
    ) -> Result<(String, IdentifierIssuer), CanonicalizationError> {
        self.spend()?;

        let quads = self.blank_node_quads.get(label).cloned().unwrap_or_default();
        let mut related_by_hash: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for quad in quads {
            let positions = [(Some(&quad.subject), "s"), (Some(&quad.object), "o"), (quad.graph.as_ref(), "g")];
            for (term, position) in positions {
                let Some(related) = term.and_then(Term::as_blank) else {
                    continue;
                };
                if related == label {
                    continue;
                }
                let hash = self.hash_related(related, &quad.predicate, &issuer, position);
                related_by_hash.entry(hash).or_default().push(related.to_string());
            }
        }

        let mut data = String::new();
        for (related_hash, mut nodes) in related_by_hash {
            data.push_str(&related_hash);

            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<IdentifierIssuer> = None;

            nodes.sort();
            let mut permutation = Some(nodes);
            while let Some(current) = permutation {
                self.spend()?;

                if let Some((path, candidate)) = self.permutation_path(&current, &issuer, &chosen_path)? {
                    if chosen_path.is_empty() || path < chosen_path {
                        chosen_path = path;
                        chosen_issuer = Some(candidate);
                    }
                }

                permutation = next_permutation(current);
            }

            data.push_str(&chosen_path);
            if let Some(chosen) = chosen_issuer {
                issuer = chosen;
            }
        }

        Ok((sha256_hex(data.as_bytes()), issuer))
    }

    /// Path for one ordering of related nodes, or `None` once it cannot beat `chosen_path`.
    fn permutation_path(
        &mut self,
        permutation: &[String],
        issuer: &IdentifierIssuer,
        chosen_path: &str,
    ) -> Result<Option<(String, IdentifierIssuer)>, CanonicalizationError> {
        let worse = |path: &str| !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path;

        let mut issuer_copy = issuer.clone();
        let mut path = String::new();
        let mut recursion = Vec::new();

        for related in permutation {
            match self.canonical.get(related) {
                Some(id) => {
                    path.push_str("_:");
                    path.push_str(id);
                }
                None => {
                    if issuer_copy.get(related).is_none() {
                        recursion.push(related.clone());
                    }
                    path.push_str("_:");
                    path.push_str(&issuer_copy.issue(related));
                }
            }
            if worse(&path) {
                return Ok(None);
            }
        }

        for related in recursion {
            let (hash, result_issuer) = self.hash_n_degree(&related, issuer_copy.clone())?;
            path.push_str("_:");
            path.push_str(&issuer_copy.issue(&related));
            path.push('<');
            path.push_str(&hash);
            path.push('>');
            issuer_copy = result_issuer;
            if worse(&path) {
                return Ok(None);
            }
        }

        Ok(Some((path, issuer_copy)))
    }
}

/// Next lexicographic permutation, or `None` after the last one.
fn next_permutation(mut items: Vec<String>) -> Option<Vec<String>> {
    if items.len() < 2 {
        return None;
    }
    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return None;
    }
    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(label: &str) -> Term {
        Term::Blank(label.to_string())
    }

    fn iri(value: &str) -> Term {
        Term::Iri(value.to_string())
    }

    fn quad(subject: Term, predicate: &str, object: Term) -> Quad {
        Quad {
            subject,
            predicate: iri(predicate),
            object,
            graph: None,
        }
    }

    fn serialize(quads: &[Quad]) -> Vec<String> {
        let mut lines: Vec<String> = quads.iter().map(Quad::to_nquad).collect();
        lines.sort();
        lines
    }

    #[test]
    fn test_permutations() {
        let all: Vec<Vec<String>> = std::iter::successors(Some(vec!["a".to_string(), "b".into(), "c".into()]), |p| {
            next_permutation(p.clone())
        })
        .collect();

        assert_eq!(all.len(), 6);
        assert_eq!(all[1], vec!["a", "c", "b"]);
        assert_eq!(all[5], vec!["c", "b", "a"]);
    }

    #[test]
    fn test_relabeling_is_independent_of_input_labels() {
        let dataset = |x: &str, y: &str| {
            vec![
                quad(blank(x), "https://example.org/knows", blank(y)),
                quad(blank(y), "https://example.org/name", iri("https://example.org/bob")),
            ]
        };

        let first = serialize(&canonicalize(&dataset("b0", "b1"), 100).unwrap());
        let second = serialize(&canonicalize(&dataset("zz", "aa"), 100).unwrap());
        assert_eq!(first, second);
        assert!(first.iter().all(|line| line.contains("_:c14n")));
    }

    #[test]
    fn test_symmetric_graphs_need_n_degree_hashing() {
        // Two disjoint two-node cycles: all four nodes share a first-degree hash.
        let dataset = |labels: [&str; 4]| {
            vec![
                quad(blank(labels[0]), "https://example.org/p", blank(labels[1])),
                quad(blank(labels[1]), "https://example.org/p", blank(labels[0])),
                quad(blank(labels[2]), "https://example.org/p", blank(labels[3])),
                quad(blank(labels[3]), "https://example.org/p", blank(labels[2])),
            ]
        };

        let first = serialize(&canonicalize(&dataset(["a", "b", "c", "d"]), 1_000).unwrap());
        let second = serialize(&canonicalize(&dataset(["w", "z", "y", "x"]), 1_000).unwrap());
        assert_eq!(first, second);

        let labels: std::collections::BTreeSet<&str> = first
            .iter()
            .flat_map(|line| line.split(' ').filter(|token| token.starts_with("_:")))
            .collect();
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn test_ground_dataset_is_untouched() {
        let dataset = vec![quad(iri("https://example.org/s"), "https://example.org/p", iri("https://example.org/o"))];
        assert_eq!(canonicalize(&dataset, 0).unwrap(), dataset);
    }
}
