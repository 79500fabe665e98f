//! Triple set → typed nodes.

use super::{NodeGraph, Term, TripleSet};
use crate::error::{CodecError, KgResult};
use crate::model::{ClassRegistry, NodeClass, Node};
use crate::value::{NodeRef, Subject, Value};

/// What to materialize from a triple set.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// One node. With `class` unset, its `rdf:type` must be in the triples.
    Uri {
        uri: &'a Subject,
        class: Option<NodeClass>,
    },
    /// Every node typed with this class identifier.
    Class(&'a str),
}

/// Materialize the target's nodes into `graph`.
///
/// Nodes already in `graph` are reused, not rebuilt. A node is registered
/// before its attributes are populated, so references back to it (cycles)
/// resolve to the same instance. Objects whose type is not resolvable through
/// `registry` stay plain references. Returns the targeted identifiers.
pub fn deserialize(
    triples: &TripleSet,
    registry: &ClassRegistry,
    target: Target<'_>,
    graph: &mut NodeGraph,
) -> KgResult<Vec<Subject>> {
    let mut builder = Builder {
        triples,
        registry,
        graph,
    };
    match target {
        Target::Uri { uri, class } => {
            if builder.graph.contains(uri) {
                return Ok(vec![uri.clone()]);
            }
            if !triples.has_subject(uri) {
                return Err(CodecError::NodeAbsent {
                    uri: uri.to_string(),
                }
                .into());
            }
            let class = match class {
                Some(class) => class,
                None => builder.class_of(uri)?.ok_or_else(|| CodecError::UnresolvedType {
                    uri: uri.to_string(),
                })?,
            };
            builder.build(uri, class);
            Ok(vec![uri.clone()])
        }
        Target::Class(class_iri) => {
            let class =
                registry
                    .resolve(class_iri)
                    .ok_or_else(|| CodecError::UnregisteredClass {
                        class: class_iri.to_string(),
                    })?;
            let candidates = triples.subjects_of_type(class_iri);
            for subject in &candidates {
                if !builder.graph.contains(subject) {
                    builder.build(subject, class);
                }
            }
            Ok(candidates)
        }
    }
}

struct Builder<'a> {
    triples: &'a TripleSet,
    registry: &'a ClassRegistry,
    graph: &'a mut NodeGraph,
}

impl Builder<'_> {
    /// First registered `rdf:type` of a subject.
    ///
    /// `Err` when the subject is typed but none of its types are registered.
    fn class_of(&self, subject: &Subject) -> KgResult<Option<NodeClass>> {
        let mut first_unregistered = None;
        for iri in self.triples.types_of(subject) {
            if let Some(class) = self.registry.resolve(iri) {
                return Ok(Some(class));
            }
            first_unregistered.get_or_insert(iri);
        }
        match first_unregistered {
            Some(iri) => Err(CodecError::UnregisteredClass {
                class: iri.to_string(),
            }
            .into()),
            None => Ok(None),
        }
    }

    fn build(&mut self, subject: &Subject, class: NodeClass) {
        self.graph.insert(Node::new(class, subject.clone()));

        let mut collected = Vec::new();
        for spec in class.attribute_map() {
            let objects: Vec<Term> = self
                .triples
                .objects(subject, spec.predicate.forward())
                .cloned()
                .collect();
            for object in objects {
                let value = self.object_value(object);
                collected.push((spec, value));
            }
        }

        if let Some(node) = self.graph.get_mut(subject) {
            for (spec, value) in collected {
                node.accumulate(spec, value);
            }
        }
    }

    fn object_value(&mut self, object: Term) -> Value {
        let subject = match object {
            Term::Literal(literal) => return Value::Literal(literal),
            Term::Iri(iri) => Subject::Iri(iri),
            Term::Blank(id) => Subject::Blank(id),
        };
        if self.graph.contains(&subject) {
            return Value::Node(NodeRef::Shared(subject));
        }
        match self.class_of(&subject) {
            Ok(Some(class)) => {
                self.build(&subject, class);
                Value::Node(NodeRef::Shared(subject))
            }
            _ => Value::Ref(subject),
        }
    }
}
