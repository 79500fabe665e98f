//! Typed nodes: a class tag, an identifier, and a sparse set of attributes.
//!
//! A [`NodeClass`] fixes which attributes a node may carry and which predicate
//! each one maps to. The map is inherited down the class hierarchy, so a
//! `TimeseriesProperty` understands everything an `AbstractAssetProperty` does.

mod classes;
mod patch;
mod registry;

use std::collections::BTreeMap;
use std::fmt;

pub use patch::NodePatch;
pub use registry::ClassRegistry;

use crate::error::{CodecError, KgResult};
use crate::value::{Attr, Literal, NodeRef, Subject, Value};

/// The closed set of node classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeClass {
    /// Degenerate root class: no attributes, serializes to nothing.
    Base,
    Connection,
    AbstractAssetProperty,
    DatabaseProperty,
    StreamingProperty,
    TimeseriesProperty,
    File,
    S3ObjectProperty,
    AbstractAsset,
    /// The root graph node listing assets and data connections.
    RootGraph,
    AbstractRelationship,
    ConsistOf,
    PartOf,
    ConnectedTo,
    DependsOn,
    DerivedFrom,
    Monitors,
    Controls,
    Simulates,
    Uses,
    CommunicatesWith,
}

impl NodeClass {
    /// Full attribute map: `label`, then inherited attributes from the root of
    /// the hierarchy down, then the class's own.
    pub fn attribute_map(self) -> Vec<&'static AttributeSpec> {
        if self == Self::Base {
            return Vec::new();
        }
        let mut chain = vec![self];
        while let Some(parent) = chain.last().and_then(|c| c.parent()) {
            chain.push(parent);
        }
        std::iter::once(&classes::LABEL)
            .chain(chain.iter().rev().flat_map(|c| c.own_attributes()))
            .collect()
    }

    /// Look up one attribute by name, including inherited ones.
    pub fn attribute(self, name: &str) -> Option<&'static AttributeSpec> {
        self.attribute_map().into_iter().find(|a| a.name == name)
    }

    pub fn from_iri(iri: &str) -> Option<NodeClass> {
        Self::ALL.iter().copied().find(|c| c.iri() == iri)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an attribute maps onto predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Forward(&'static str),
    /// Written as `(s, forward, o)` and `(o, inverse, s)`; read back from the
    /// forward triple only.
    Bidirectional {
        forward: &'static str,
        inverse: &'static str,
    },
}

impl Predicate {
    pub fn forward(self) -> &'static str {
        match self {
            Self::Forward(p) | Self::Bidirectional { forward: p, .. } => p,
        }
    }

    pub fn inverse(self) -> Option<&'static str> {
        match self {
            Self::Forward(_) => None,
            Self::Bidirectional { inverse, .. } => Some(inverse),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// First value is a scalar; a repeated predicate promotes it to a list.
    Scalar,
    /// Always a list.
    Multi,
}

/// What an attribute accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Any,
    /// References only: nodes, IRIs, blank ids.
    Reference,
    /// Free-form JSON, stored as its compact text in a string literal.
    Json,
}

/// One entry of a class's attribute map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub predicate: Predicate,
    pub cardinality: Cardinality,
    pub shape: ValueShape,
}

impl AttributeSpec {
    pub const fn scalar(name: &'static str, predicate: &'static str) -> Self {
        Self {
            name,
            predicate: Predicate::Forward(predicate),
            cardinality: Cardinality::Scalar,
            shape: ValueShape::Any,
        }
    }

    pub const fn multi(name: &'static str, predicate: &'static str) -> Self {
        Self {
            name,
            predicate: Predicate::Forward(predicate),
            cardinality: Cardinality::Multi,
            shape: ValueShape::Reference,
        }
    }

    pub const fn json(name: &'static str, predicate: &'static str) -> Self {
        Self {
            name,
            predicate: Predicate::Forward(predicate),
            cardinality: Cardinality::Scalar,
            shape: ValueShape::Json,
        }
    }

    pub const fn bidirectional(
        name: &'static str,
        forward: &'static str,
        inverse: &'static str,
    ) -> Self {
        Self {
            name,
            predicate: Predicate::Bidirectional { forward, inverse },
            cardinality: Cardinality::Scalar,
            shape: ValueShape::Reference,
        }
    }

    /// Coerce a JSON value for this attribute. `null` means absent.
    pub fn coerce_json(&self, json: &serde_json::Value) -> KgResult<Option<Attr>> {
        use serde_json::Value as J;
        let attr = match (self.shape, json) {
            (_, J::Null) => return Ok(None),
            (ValueShape::Json, J::Object(_) | J::Array(_)) => {
                Attr::One(Value::Literal(Literal::string(json.to_string())))
            }
            (_, J::Array(_)) if self.cardinality == Cardinality::Multi => Attr::from_json(json)?,
            (_, J::Array(items)) if items.len() > 1 => Attr::from_json(json)?,
            (_, J::Array(items)) => match items.first() {
                Some(item) => Attr::One(Value::from_json(item)?),
                None => return Ok(None),
            },
            (_, other) => Attr::One(Value::from_json(other)?),
        };
        Ok(Some(match (self.cardinality, attr) {
            (Cardinality::Multi, Attr::One(v)) => Attr::Many(vec![v]),
            (_, attr) => attr,
        }))
    }
}

/// A typed node.
///
/// Attributes are keyed by their declared name; only names in the class's
/// attribute map can be set.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    class: NodeClass,
    uri: Subject,
    attributes: BTreeMap<&'static str, Attr>,
}

impl Node {
    pub fn new(class: NodeClass, uri: Subject) -> Self {
        Self {
            class,
            uri,
            attributes: BTreeMap::new(),
        }
    }

    /// A node identified by an absolute IRI (or `_:id`).
    pub fn with_uri(class: NodeClass, uri: &str) -> KgResult<Self> {
        Ok(Self::new(class, Subject::parse(uri)?))
    }

    /// A node with a fresh, process-unique blank id.
    pub fn anonymous(class: NodeClass) -> Self {
        Self::new(class, Subject::fresh())
    }

    pub fn class(&self) -> NodeClass {
        self.class
    }

    pub fn uri(&self) -> &Subject {
        &self.uri
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attributes.get(name)
    }

    /// First value of an attribute.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Attr::first)
    }

    /// First value of an attribute, if it is a literal.
    pub fn literal(&self, name: &str) -> Option<&Literal> {
        self.value(name).and_then(Value::as_literal)
    }

    /// Set attributes, sorted by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &Attr)> {
        self.attributes.iter().map(|(k, v)| (*k, v))
    }

    fn spec(&self, name: &str) -> KgResult<&'static AttributeSpec> {
        self.class.attribute(name).ok_or_else(|| {
            CodecError::UnknownAttribute {
                class: self.class.name().to_string(),
                attribute: name.to_string(),
            }
            .into()
        })
    }

    /// Replace an attribute with a single value (a one-element list for
    /// multi-valued attributes).
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> KgResult<&mut Self> {
        let spec = self.spec(name)?;
        let attr = match spec.cardinality {
            Cardinality::Scalar => Attr::One(value.into()),
            Cardinality::Multi => Attr::Many(vec![value.into()]),
        };
        self.attributes.insert(spec.name, attr);
        Ok(self)
    }

    /// Replace an attribute with a list of values.
    pub fn set_many<I, V>(&mut self, name: &str, values: I) -> KgResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let spec = self.spec(name)?;
        let values = values.into_iter().map(Into::into).collect();
        self.attributes.insert(spec.name, Attr::Many(values));
        Ok(self)
    }

    /// Coerce and set a JSON value; `null` clears the attribute.
    pub fn set_json(&mut self, name: &str, json: &serde_json::Value) -> KgResult<&mut Self> {
        let spec = self.spec(name)?;
        match spec.coerce_json(json)? {
            Some(attr) => self.attributes.insert(spec.name, attr),
            None => self.attributes.remove(spec.name),
        };
        Ok(self)
    }

    /// Append a value, promoting a scalar to a list.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> KgResult<&mut Self> {
        let spec = self.spec(name)?;
        self.accumulate(spec, value.into());
        Ok(self)
    }

    /// Builder form of [`Node::set`].
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> KgResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn remove(&mut self, name: &str) -> Option<Attr> {
        self.attributes.remove(name)
    }

    /// Add one value read from a triple, following the attribute's cardinality.
    pub(crate) fn accumulate(&mut self, spec: &'static AttributeSpec, value: Value) {
        match (self.attributes.get_mut(spec.name), spec.cardinality) {
            (Some(attr), _) => attr.push(value),
            (None, Cardinality::Scalar) => {
                self.attributes.insert(spec.name, Attr::One(value));
            }
            (None, Cardinality::Multi) => {
                self.attributes.insert(spec.name, Attr::Many(vec![value]));
            }
        }
    }

    pub(crate) fn insert_attr(&mut self, spec: &'static AttributeSpec, attr: Attr) {
        self.attributes.insert(spec.name, attr);
    }

    /// Identifiers of every node this one references, owned or not.
    pub fn references(&self) -> Vec<&Subject> {
        self.attributes
            .values()
            .flat_map(Attr::values)
            .filter_map(Value::subject)
            .collect()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(f, "{} <{}>", self.class, self.uri)?;
        let pad = "  ".repeat(indent + 1);
        for (name, attr) in &self.attributes {
            write!(f, "{pad}{name}:")?;
            match attr {
                Attr::One(v) => {
                    f.write_str(" ")?;
                    fmt_value(v, f, indent + 1)?;
                }
                Attr::Many(vs) => {
                    writeln!(f)?;
                    for v in vs {
                        write!(f, "{pad}  - ")?;
                        fmt_value(v, f, indent + 2)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    match value {
        Value::Literal(l) => writeln!(f, "{:?}", l.lexical()),
        Value::Ref(s) => writeln!(f, "<{s}>"),
        Value::Node(NodeRef::Shared(s)) => writeln!(f, "-> <{s}>"),
        Value::Node(NodeRef::Owned(node)) => node.fmt_indented(f, indent),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::vocab::rdfs;

    #[test]
    fn attribute_map_inherits_down_the_hierarchy() {
        let names: Vec<_> = NodeClass::TimeseriesProperty
            .attribute_map()
            .iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names[0], "label");
        assert!(names.contains(&"propertyValue"));
        assert!(names.contains(&"query"));
        assert!(names.contains(&"timeseriesTags"));
        assert!(!names.contains(&"streamingTopic"));
    }

    #[test]
    fn every_class_maps_label() {
        for class in NodeClass::ALL.iter().filter(|c| **c != NodeClass::Base) {
            let label = class.attribute("label").unwrap();
            assert_eq!(label.predicate.forward(), rdfs::LABEL);
        }
        assert!(NodeClass::Base.attribute_map().is_empty());
    }

    #[test]
    fn class_iri_round_trips() {
        for class in NodeClass::ALL {
            assert_eq!(NodeClass::from_iri(class.iri()), Some(*class));
        }
        assert_eq!(NodeClass::RootGraph.name(), "SINDITKG");
        assert!(NodeClass::Monitors.is_relationship());
        assert!(!NodeClass::File.is_relationship());
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut node = Node::anonymous(NodeClass::Connection);
        let err = node.set("assets", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn push_and_multi_cardinality() {
        let mut conn = Node::anonymous(NodeClass::Connection);
        conn.set("host", "a").unwrap();
        assert!(matches!(conn.get("host"), Some(Attr::One(_))));
        conn.push("host", "b").unwrap();
        assert_eq!(conn.get("host").map(Attr::len), Some(2));

        let mut asset = Node::anonymous(NodeClass::AbstractAsset);
        asset.set("assetProperties", Subject::fresh()).unwrap();
        assert!(matches!(asset.get("assetProperties"), Some(Attr::Many(v)) if v.len() == 1));
    }

    #[test]
    fn json_attributes_store_compact_text() {
        let mut conn = Node::anonymous(NodeClass::Connection);
        conn.set_json("configuration", &serde_json::json!({"qos": 1}))
            .unwrap();
        assert_eq!(
            conn.literal("configuration").map(Literal::lexical),
            Some(r#"{"qos":1}"#)
        );
        conn.set_json("configuration", &serde_json::Value::Null).unwrap();
        assert!(conn.get("configuration").is_none());
    }

    #[test]
    fn display_nests_owned_nodes() {
        let conn = Node::with_uri(NodeClass::Connection, "http://ex.org/c1")
            .unwrap()
            .with("host", "localhost")
            .unwrap();
        let prop = Node::with_uri(NodeClass::StreamingProperty, "http://ex.org/p1")
            .unwrap()
            .with("propertyConnection", conn)
            .unwrap();
        let text = prop.to_string();
        assert!(text.starts_with("StreamingProperty <http://ex.org/p1>"));
        assert!(text.contains("Connection <http://ex.org/c1>"));
        assert!(text.contains("host: \"localhost\""));
    }
}
