//! Attribute values: typed literals, references, and embedded nodes.
//!
//! A [`Value`] is what a single node attribute slot holds. Literals keep their
//! lexical form next to a closed [`LiteralKind`], so a value read from the store
//! writes back byte-identical. References are [`Subject`]s (absolute IRIs or blank
//! ids); embedded nodes are either owned trees or handles into a
//! [`NodeGraph`](crate::codec::NodeGraph).

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::model::Node;
use crate::vocab::xsd;

/// Result type for value construction and coercion.
pub type ValueResult<T> = std::result::Result<T, ValueError>;

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

/// The closed set of literal datatypes the model understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

impl LiteralKind {
    /// Datatype IRI written for this kind.
    pub fn datatype(self) -> &'static str {
        match self {
            Self::String => xsd::STRING,
            Self::Integer => xsd::INTEGER,
            Self::Float => xsd::DOUBLE,
            Self::Boolean => xsd::BOOLEAN,
            Self::Timestamp => xsd::DATE_TIME,
        }
    }

    /// Classify a datatype IRI read from the store.
    ///
    /// Unknown datatypes (and language-tagged strings) fold into `String`.
    pub fn from_datatype(iri: &str) -> Self {
        match iri {
            xsd::INTEGER | xsd::INT | xsd::LONG => Self::Integer,
            xsd::FLOAT | xsd::DOUBLE | xsd::DECIMAL => Self::Float,
            xsd::BOOLEAN => Self::Boolean,
            xsd::DATE_TIME | xsd::DATE_TIME_STAMP => Self::Timestamp,
            _ => Self::String,
        }
    }
}

/// A typed literal kept in lexical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    kind: LiteralKind,
    lexical: String,
}

impl Literal {
    pub fn new(kind: LiteralKind, lexical: impl Into<String>) -> Self {
        Self {
            kind,
            lexical: lexical.into(),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(LiteralKind::String, s)
    }

    pub fn integer(i: i64) -> Self {
        Self::new(LiteralKind::Integer, i.to_string())
    }

    pub fn float(f: f64) -> Self {
        let lexical = if f.is_infinite() {
            if f > 0.0 { "INF".to_string() } else { "-INF".to_string() }
        } else {
            f.to_string()
        };
        Self::new(LiteralKind::Float, lexical)
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(LiteralKind::Boolean, if b { "true" } else { "false" })
    }

    pub fn timestamp<Tz: TimeZone>(t: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self::new(
            LiteralKind::Timestamp,
            t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )
    }

    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn as_str(&self) -> Option<&str> {
        (self.kind == LiteralKind::String).then_some(self.lexical.as_str())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.kind {
            LiteralKind::Integer => self.lexical.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            LiteralKind::Float => match self.lexical.as_str() {
                "INF" => Some(f64::INFINITY),
                "-INF" => Some(f64::NEG_INFINITY),
                other => other.parse().ok(),
            },
            LiteralKind::Integer => self.lexical.parse::<i64>().ok().map(|i| i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match (self.kind, self.lexical.as_str()) {
            (LiteralKind::Boolean, "true" | "1") => Some(true),
            (LiteralKind::Boolean, "false" | "0") => Some(false),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match self.kind {
            LiteralKind::Timestamp => DateTime::parse_from_rfc3339(&self.lexical).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}

// ---------------------------------------------------------------------------
// Subjects (IRIs and blank ids)
// ---------------------------------------------------------------------------

/// A node identifier: an absolute IRI or a blank id.
///
/// The display form (`http://…` or `_:id`) doubles as the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Iri(String),
    Blank(String),
}

static BLANK_PREFIX: OnceLock<u32> = OnceLock::new();
static BLANK_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Subject {
    /// Validate and wrap an absolute IRI.
    pub fn iri(iri: &str) -> ValueResult<Self> {
        oxigraph::model::NamedNode::new(iri)
            .map(|n| Self::Iri(n.into_string()))
            .map_err(|e| ValueError::InvalidIdentifier {
                identifier: iri.to_string(),
                message: e.to_string(),
            })
    }

    /// Validate and wrap a blank id (without the `_:` prefix).
    pub fn blank(id: &str) -> ValueResult<Self> {
        oxigraph::model::BlankNode::new(id)
            .map(|b| Self::Blank(b.as_str().to_string()))
            .map_err(|e| ValueError::InvalidIdentifier {
                identifier: format!("_:{id}"),
                message: e.to_string(),
            })
    }

    /// Parse the display form: `_:id` is a blank id, anything else an IRI.
    pub fn parse(s: &str) -> ValueResult<Self> {
        match s.strip_prefix("_:") {
            Some(id) => Self::blank(id),
            None => Self::iri(s),
        }
    }

    /// A blank id unique within this process and never reused.
    pub fn fresh() -> Self {
        let prefix = BLANK_PREFIX.get_or_init(rand::random::<u32>);
        let n = BLANK_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::Blank(format!("n{prefix:08x}x{n}"))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// The IRI or blank id without decoration.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Iri(s) | Self::Blank(s) => s,
        }
    }

    /// Registry key: the display form.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => f.write_str(iri),
            Self::Blank(id) => write!(f, "_:{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// An embedded node: an owned subtree, or a handle to a node held elsewhere
/// (typically a [`NodeGraph`](crate::codec::NodeGraph) shared by one load).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRef {
    Owned(Box<Node>),
    Shared(Subject),
}

impl NodeRef {
    pub fn subject(&self) -> &Subject {
        match self {
            Self::Owned(node) => node.uri(),
            Self::Shared(subject) => subject,
        }
    }
}

/// One attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    /// Reference to a node by identifier: an IRI, or a blank id.
    Ref(Subject),
    Node(NodeRef),
}

impl Value {
    /// A reference value from an absolute IRI.
    pub fn iri(iri: &str) -> ValueResult<Self> {
        Subject::iri(iri).map(Self::Ref)
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// The identifier this value points at, if it is not a literal.
    pub fn subject(&self) -> Option<&Subject> {
        match self {
            Self::Literal(_) => None,
            Self::Ref(subject) => Some(subject),
            Self::Node(node) => Some(node.subject()),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(NodeRef::Owned(node)) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Literal(l) => format!("a {:?} literal", l.kind()),
            Self::Ref(s) => format!("a reference to {s}"),
            Self::Node(n) => format!("the node {}", n.subject()),
        }
    }

    /// Coerce a JSON scalar or `{"uri": …}` object.
    ///
    /// `null`, arrays, and objects without a string `uri` are rejected.
    pub fn from_json(json: &serde_json::Value) -> ValueResult<Self> {
        use serde_json::Value as J;
        match json {
            J::String(s) => Ok(Self::from(s.as_str())),
            J::Bool(b) => Ok(Self::from(*b)),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::from(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::Literal(Literal::new(LiteralKind::Integer, u.to_string())))
                } else {
                    n.as_f64().map(Self::from).ok_or_else(|| ValueError::Coercion {
                        found: format!("the number {n}"),
                    })
                }
            }
            J::Object(map) => match map.get("uri") {
                Some(J::String(uri)) => Subject::parse(uri).map(Self::Ref),
                _ => Err(ValueError::Coercion {
                    found: "an object without a \"uri\" member".into(),
                }),
            },
            J::Array(_) => Err(ValueError::Coercion {
                found: "a nested list".into(),
            }),
            J::Null => Err(ValueError::Coercion {
                found: "null".into(),
            }),
        }
    }
}

impl From<Literal> for Value {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Literal(Literal::string(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Literal(Literal::string(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Literal(Literal::integer(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Literal(Literal::integer(i64::from(i)))
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Self::Literal(Literal::integer(i64::from(i)))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Literal(Literal::float(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Literal(Literal::boolean(b))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value
where
    Tz::Offset: fmt::Display,
{
    fn from(t: DateTime<Tz>) -> Self {
        Self::Literal(Literal::timestamp(&t))
    }
}

impl From<Subject> for Value {
    fn from(s: Subject) -> Self {
        Self::Ref(s)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(NodeRef::Owned(Box::new(node)))
    }
}

// ---------------------------------------------------------------------------
// Attribute slots
// ---------------------------------------------------------------------------

/// The contents of one attribute: a scalar or a list.
///
/// List order is not significant; equality on `Many` compares as multisets.
#[derive(Debug, Clone)]
pub enum Attr {
    One(Value),
    Many(Vec<Value>),
}

impl Attr {
    pub fn values(&self) -> &[Value] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.values().first()
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Add a value; a scalar becomes a two-element list.
    pub fn push(&mut self, value: Value) {
        match self {
            Self::Many(vs) => vs.push(value),
            Self::One(_) => {
                if let Self::One(prev) = std::mem::replace(self, Self::Many(Vec::new())) {
                    *self = Self::Many(vec![prev, value]);
                }
            }
        }
    }

    /// Coerce a JSON value: arrays become lists of scalars or references.
    pub fn from_json(json: &serde_json::Value) -> ValueResult<Self> {
        match json {
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<ValueResult<Vec<_>>>()
                .map(Self::Many),
            other => Value::from_json(other).map(Self::One),
        }
    }
}

impl From<Value> for Attr {
    fn from(v: Value) -> Self {
        Self::One(v)
    }
}

impl From<Vec<Value>> for Attr {
    fn from(vs: Vec<Value>) -> Self {
        Self::Many(vs)
    }
}

impl PartialEq for Attr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::One(a), Self::One(b)) => a == b,
            (Self::Many(a), Self::Many(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut used = vec![false; b.len()];
                a.iter().all(|x| {
                    match b.iter().enumerate().position(|(i, y)| !used[i] && x == y) {
                        Some(i) => {
                            used[i] = true;
                            true
                        }
                        None => false,
                    }
                })
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn literal_kinds_from_natives() {
        assert_eq!(Literal::integer(42).lexical(), "42");
        assert_eq!(Literal::float(21.5).lexical(), "21.5");
        assert_eq!(Literal::float(f64::NEG_INFINITY).lexical(), "-INF");
        assert_eq!(Literal::boolean(true).as_bool(), Some(true));
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let lit = Literal::timestamp(&t);
        assert_eq!(lit.lexical(), "2024-05-01T12:00:00Z");
        assert_eq!(lit.as_timestamp().map(|d| d.timestamp()), Some(t.timestamp()));
    }

    #[test]
    fn datatype_classification_is_closed() {
        assert_eq!(LiteralKind::from_datatype(xsd::FLOAT), LiteralKind::Float);
        assert_eq!(LiteralKind::from_datatype(xsd::INT), LiteralKind::Integer);
        assert_eq!(
            LiteralKind::from_datatype("http://www.w3.org/2001/XMLSchema#anyURI"),
            LiteralKind::String
        );
    }

    #[test]
    fn fresh_blanks_never_repeat() {
        let a = Subject::fresh();
        let b = Subject::fresh();
        assert_ne!(a, b);
        assert!(a.is_blank());
        assert!(a.key().starts_with("_:"));
        assert_eq!(Subject::parse(&a.key()).unwrap(), a);
    }

    #[test]
    fn relative_iri_is_rejected() {
        let err = Subject::iri("not an iri").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn json_coercion() {
        let v = Value::from_json(&serde_json::json!(1883)).unwrap();
        assert_eq!(v.as_literal().and_then(Literal::as_i64), Some(1883));

        let v = Value::from_json(&serde_json::json!({"uri": "http://ex.org/a"})).unwrap();
        assert_eq!(v.subject().map(Subject::as_str), Some("http://ex.org/a"));

        let err = Value::from_json(&serde_json::json!({"name": "x"})).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Coercion);

        let err = Attr::from_json(&serde_json::json!([[1, 2]])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Coercion);
    }

    #[test]
    fn push_promotes_scalar() {
        let mut attr = Attr::One(Value::from(1i64));
        attr.push(Value::from(2i64));
        assert_eq!(attr.len(), 2);
        assert!(matches!(attr, Attr::Many(_)));
    }

    #[test]
    fn many_compares_as_multiset() {
        let a = Attr::Many(vec![Value::from("x"), Value::from("y"), Value::from("x")]);
        let b = Attr::Many(vec![Value::from("x"), Value::from("x"), Value::from("y")]);
        let c = Attr::Many(vec![Value::from("x"), Value::from("y"), Value::from("y")]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
