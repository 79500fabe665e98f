//! Node tree → triple set.

use std::collections::HashSet;

use super::{NodeGraph, Term, Triple, TripleSet};
use crate::error::{CodecError, KgResult};
use crate::model::{AttributeSpec, Node, NodeClass, ValueShape};
use crate::value::{Attr, NodeRef, Subject, Value};
use crate::vocab::rdf;

/// Serialize a node and every node it owns.
///
/// Shared handles are written as references only; use [`serialize_in`] to
/// follow them through the graph they point into.
pub fn serialize(node: &Node) -> KgResult<TripleSet> {
    Walker::new(None).run(node)
}

/// Serialize a node, following shared handles through `graph`.
pub fn serialize_in(node: &Node, graph: &NodeGraph) -> KgResult<TripleSet> {
    Walker::new(Some(graph)).run(node)
}

struct Walker<'g> {
    graph: Option<&'g NodeGraph>,
    visited: HashSet<Subject>,
    out: TripleSet,
}

impl<'g> Walker<'g> {
    fn new(graph: Option<&'g NodeGraph>) -> Self {
        Self {
            graph,
            visited: HashSet::new(),
            out: TripleSet::new(),
        }
    }

    fn run(mut self, node: &Node) -> KgResult<TripleSet> {
        self.node(node)?;
        Ok(self.out)
    }

    fn node(&mut self, node: &Node) -> KgResult<()> {
        if node.class() == NodeClass::Base || !self.visited.insert(node.uri().clone()) {
            return Ok(());
        }
        let subject = node.uri();
        self.out.insert(Triple::new(
            subject.clone(),
            rdf::TYPE,
            Term::Iri(node.class().iri().to_string()),
        ));
        for spec in node.class().attribute_map() {
            match node.get(spec.name) {
                None => {}
                Some(Attr::One(value)) => self.value(subject, spec, value)?,
                Some(Attr::Many(values)) => {
                    for value in values {
                        self.value(subject, spec, value)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn value(&mut self, subject: &Subject, spec: &AttributeSpec, value: &Value) -> KgResult<()> {
        let object = match value {
            Value::Literal(literal) => {
                if spec.shape == ValueShape::Reference {
                    return Err(CodecError::Coercion {
                        attribute: spec.name.to_string(),
                        found: value.describe(),
                    }
                    .into());
                }
                Term::Literal(literal.clone())
            }
            Value::Ref(target) => Term::from(target),
            Value::Node(NodeRef::Owned(child)) => {
                self.node(child)?;
                Term::from(child.uri())
            }
            Value::Node(NodeRef::Shared(target)) => {
                if let Some(child) = self.graph.and_then(|g| g.node(target)) {
                    self.node(child)?;
                }
                Term::from(target)
            }
        };

        if let (Some(inverse), Some(target)) = (spec.predicate.inverse(), object.as_subject()) {
            self.out
                .insert(Triple::new(target, inverse, Term::from(subject)));
        }
        self.out
            .insert(Triple::new(subject.clone(), spec.predicate.forward(), object));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::Literal;
    use crate::vocab::rdfs;

    fn connection() -> Node {
        let mut conn = Node::with_uri(NodeClass::Connection, "http://ex.org/c1").unwrap();
        conn.set("host", "localhost").unwrap();
        conn.set("port", 1883i64).unwrap();
        conn.set("label", "broker").unwrap();
        conn
    }

    #[test]
    fn scalar_attributes_and_type() {
        let triples = serialize(&connection()).unwrap();
        assert_eq!(triples.len(), 4);
        let c1 = Subject::iri("http://ex.org/c1").unwrap();
        assert_eq!(
            triples.types_of(&c1).collect::<Vec<_>>(),
            vec![NodeClass::Connection.iri()]
        );
        let labels: Vec<_> = triples.objects(&c1, rdfs::LABEL).collect();
        assert_eq!(labels, vec![&Term::Literal(Literal::string("broker"))]);
    }

    #[test]
    fn base_node_serializes_empty() {
        let node = Node::anonymous(NodeClass::Base);
        assert!(serialize(&node).unwrap().is_empty());
    }

    #[test]
    fn absent_attributes_emit_nothing() {
        let node = Node::with_uri(NodeClass::AbstractAsset, "http://ex.org/a1").unwrap();
        assert_eq!(serialize(&node).unwrap().len(), 1);
    }

    #[test]
    fn owned_children_are_included() {
        let mut prop = Node::with_uri(NodeClass::StreamingProperty, "http://ex.org/p1").unwrap();
        prop.set("propertyConnection", connection()).unwrap();
        let triples = serialize(&prop).unwrap();
        let c1 = Subject::iri("http://ex.org/c1").unwrap();
        assert!(triples.has_subject(&c1));
        assert_eq!(triples.subjects().len(), 2);
    }

    #[test]
    fn literal_in_reference_list_is_a_coercion_error() {
        let mut asset = Node::with_uri(NodeClass::AbstractAsset, "http://ex.org/a1").unwrap();
        asset.set("assetProperties", "not a node").unwrap();
        let err = serialize(&asset).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Coercion);
    }

    #[test]
    fn bidirectional_writes_inverse() {
        let mut rel = Node::with_uri(NodeClass::PartOf, "http://ex.org/r1").unwrap();
        let asset = Subject::iri("http://ex.org/a1").unwrap();
        rel.set("relationshipSource", asset.clone()).unwrap();
        let triples = serialize(&rel).unwrap();
        let rel_subject = Subject::iri("http://ex.org/r1").unwrap();
        let inverse = crate::vocab::model("sourceOfRelationship");
        assert_eq!(
            triples.objects(&asset, &inverse).collect::<Vec<_>>(),
            vec![&Term::from(&rel_subject)]
        );
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = NodeGraph::new();
        let a = Subject::iri("http://ex.org/a").unwrap();
        let b = Subject::iri("http://ex.org/b").unwrap();
        let mut na = Node::new(NodeClass::AbstractAsset, a.clone());
        na.set("assetProperties", Value::Node(NodeRef::Shared(b.clone())))
            .unwrap();
        let mut nb = Node::new(NodeClass::AbstractAsset, b.clone());
        nb.set("assetProperties", Value::Node(NodeRef::Shared(a.clone())))
            .unwrap();
        graph.insert(na);
        graph.insert(nb);

        let root = graph.node(&a).unwrap();
        let triples = serialize_in(root, &graph).unwrap();
        assert_eq!(triples.len(), 4);
    }
}
