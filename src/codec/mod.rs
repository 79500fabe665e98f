//! Graph codec: typed nodes to triple sets and back.
//!
//! - [`serialize`]/[`serialize_in`]: node tree → [`TripleSet`], cycle-safe.
//! - [`deserialize`]: [`TripleSet`] → nodes registered in a [`NodeGraph`], so one
//!   identifier is one node instance however many times it is referenced.
//! - [`wire`]: Turtle/N-Triples encoding of triple sets.

mod deserialize;
mod serialize;
pub mod wire;

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;

pub use deserialize::{Target, deserialize};
pub use serialize::{serialize, serialize_in};

use crate::model::Node;
use crate::value::{Attr, Literal, NodeRef, Subject, Value};
use crate::vocab::rdf;

/// Object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    /// The term as a subject, unless it is a literal.
    pub fn as_subject(&self) -> Option<Subject> {
        match self {
            Self::Iri(iri) => Some(Subject::Iri(iri.clone())),
            Self::Blank(id) => Some(Subject::Blank(id.clone())),
            Self::Literal(_) => None,
        }
    }
}

impl From<Subject> for Term {
    fn from(s: Subject) -> Self {
        match s {
            Subject::Iri(iri) => Self::Iri(iri),
            Subject::Blank(id) => Self::Blank(id),
        }
    }
}

impl From<&Subject> for Term {
    fn from(s: &Subject) -> Self {
        s.clone().into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Subject, predicate: impl Into<String>, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

/// An unordered set of triples. Iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripleSet {
    triples: BTreeSet<Triple>,
}

impl TripleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the triple was not already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn merge(&mut self, other: TripleSet) {
        self.triples.extend(other.triples);
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Distinct subjects.
    pub fn subjects(&self) -> BTreeSet<&Subject> {
        self.triples.iter().map(|t| &t.subject).collect()
    }

    pub fn has_subject(&self, subject: &Subject) -> bool {
        self.from_prefix(subject, "")
            .next()
            .is_some_and(|t| &t.subject == subject)
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a Subject,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.from_prefix(subject, predicate)
            .take_while(move |t| &t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Triples ordered at or after `(subject, predicate)`; `Term::Iri("")` sorts first.
    fn from_prefix(&self, subject: &Subject, predicate: &str) -> impl Iterator<Item = &Triple> {
        let lower = Triple::new(subject.clone(), predicate, Term::Iri(String::new()));
        self.triples.range((Bound::Included(lower), Bound::Unbounded))
    }

    /// Every `rdf:type` IRI stated for a subject.
    pub fn types_of<'a>(&'a self, subject: &'a Subject) -> impl Iterator<Item = &'a str> + 'a {
        self.objects(subject, rdf::TYPE).filter_map(|o| match o {
            Term::Iri(iri) => Some(iri.as_str()),
            _ => None,
        })
    }

    /// Subjects typed with the given class identifier, in set order.
    pub fn subjects_of_type(&self, class_iri: &str) -> Vec<Subject> {
        self.triples
            .iter()
            .filter(|t| t.predicate == rdf::TYPE && matches!(&t.object, Term::Iri(i) if i == class_iri))
            .map(|t| t.subject.clone())
            .collect()
    }

    /// Triples for which `keep` returns `true`.
    pub fn filter(&self, mut keep: impl FnMut(&Triple) -> bool) -> TripleSet {
        self.triples.iter().filter(|t| keep(t)).cloned().collect()
    }
}

impl FromIterator<Triple> for TripleSet {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TripleSet {
    type Item = Triple;
    type IntoIter = std::collections::btree_set::IntoIter<Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a TripleSet {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

impl Extend<Triple> for TripleSet {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

/// Nodes materialized by one or more loads, keyed by identifier.
///
/// Nodes reference each other through [`NodeRef::Shared`] handles into this
/// graph, which is what lets a node be shared by several parents and lets
/// cycles exist without ownership loops. `roots` records which nodes a load
/// was asked for, in request order.
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: HashMap<String, Node>,
    order: Vec<String>,
    roots: Vec<String>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node(&self, subject: &Subject) -> Option<&Node> {
        self.nodes.get(&subject.key())
    }

    pub fn contains(&self, subject: &Subject) -> bool {
        self.nodes.contains_key(&subject.key())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in materialization order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|k| self.nodes.get(k))
    }

    /// Requested nodes, in request order, without duplicates.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.roots.iter().filter_map(|k| self.nodes.get(k))
    }

    /// First requested node.
    pub fn root(&self) -> Option<&Node> {
        self.roots().next()
    }

    /// Mark a materialized node as requested. Duplicates are ignored.
    pub fn push_root(&mut self, subject: &Subject) {
        let key = subject.key();
        if self.nodes.contains_key(&key) && !self.roots.contains(&key) {
            self.roots.push(key);
        }
    }

    /// Follow a value to the node it denotes, if that node is materialized.
    pub fn resolve<'a>(&'a self, value: &'a Value) -> Option<&'a Node> {
        match value {
            Value::Node(NodeRef::Owned(node)) => Some(node),
            Value::Node(NodeRef::Shared(s)) | Value::Ref(s) => self.node(s),
            Value::Literal(_) => None,
        }
    }

    /// Copy a node out as an owned tree.
    ///
    /// Shared handles are replaced by owned copies; a handle that would close a
    /// cycle stays shared.
    pub fn materialize(&self, subject: &Subject) -> Option<Node> {
        let mut path = Vec::new();
        self.node(subject).map(|node| self.materialize_node(node, &mut path))
    }

    fn materialize_node(&self, node: &Node, path: &mut Vec<Subject>) -> Node {
        path.push(node.uri().clone());
        let mut out = node.clone();
        let class = node.class();
        for (name, attr) in node.attributes() {
            let Some(spec) = class.attribute(name) else {
                continue;
            };
            let values: Vec<Value> = attr
                .values()
                .iter()
                .map(|v| match v {
                    Value::Node(NodeRef::Shared(s)) if !path.contains(s) => self
                        .node(s)
                        .map(|child| Value::from(self.materialize_node(child, path)))
                        .unwrap_or_else(|| v.clone()),
                    _ => v.clone(),
                })
                .collect();
            let attr = match attr {
                Attr::One(_) => values
                    .into_iter()
                    .next()
                    .map(Attr::One)
                    .unwrap_or_else(|| attr.clone()),
                Attr::Many(_) => Attr::Many(values),
            };
            out.insert_attr(spec, attr);
        }
        path.pop();
        out
    }

    pub(crate) fn insert(&mut self, node: Node) {
        let key = node.uri().key();
        if self.nodes.insert(key.clone(), node).is_none() {
            self.order.push(key);
        }
    }

    pub(crate) fn get_mut(&mut self, subject: &Subject) -> Option<&mut Node> {
        self.nodes.get_mut(&subject.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Subject {
        Subject::iri(s).unwrap()
    }

    #[test]
    fn lookups_stay_inside_their_prefix() {
        let a = iri("http://ex.org/a");
        let ab = iri("http://ex.org/ab");
        let triples: TripleSet = [
            Triple::new(a.clone(), "urn:p", Literal::string("1")),
            Triple::new(a.clone(), "urn:p", iri("http://ex.org/x")),
            Triple::new(a.clone(), "urn:p2", Literal::string("2")),
            Triple::new(a.clone(), rdf::TYPE, iri("urn:C")),
            Triple::new(ab.clone(), "urn:p", Literal::string("3")),
            Triple::new(Subject::blank("b0").unwrap(), "urn:p", Literal::string("4")),
        ]
        .into_iter()
        .collect();

        assert_eq!(triples.objects(&a, "urn:p").count(), 2);
        assert_eq!(triples.objects(&a, "urn:p2").count(), 1);
        assert_eq!(triples.objects(&ab, "urn:p").count(), 1);
        assert_eq!(triples.objects(&a, "urn:q").count(), 0);
        assert_eq!(triples.types_of(&a).collect::<Vec<_>>(), ["urn:C"]);
        assert!(triples.has_subject(&ab));
        assert!(triples.has_subject(&Subject::blank("b0").unwrap()));
        assert!(!triples.has_subject(&iri("http://ex.org/")));
        assert!(!triples.has_subject(&iri("http://ex.org/z")));
    }
}
