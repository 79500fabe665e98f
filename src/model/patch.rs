//! Sparse node updates.

use std::collections::BTreeMap;

use super::{Node, NodeClass};
use crate::error::{ConnectorError, KgResult};
use crate::value::{Attr, Subject, Value};

#[derive(Debug, Clone)]
enum Field {
    Attr(Attr),
    Json(serde_json::Value),
}

/// A partial node: an identifier plus only the attributes being changed.
///
/// The class is not part of the patch; it is resolved from the store when the
/// patch is applied, so an update can never change a node's type.
#[derive(Debug, Clone)]
pub struct NodePatch {
    uri: Subject,
    fields: BTreeMap<String, Field>,
}

impl NodePatch {
    pub fn new(uri: Subject) -> Self {
        Self {
            uri,
            fields: BTreeMap::new(),
        }
    }

    /// Build a patch from a JSON object.
    ///
    /// `uri` is required; `class_uri` is ignored. Values are coerced once the
    /// target class is known.
    pub fn from_json(json: &serde_json::Value) -> KgResult<Self> {
        let object = json.as_object().ok_or_else(|| {
            ConnectorError::validation(
                "update payload must be a JSON object",
                "Send an object such as {\"uri\": \"http://…\", \"host\": \"…\"}.",
            )
        })?;
        let uri = match object.get("uri") {
            Some(serde_json::Value::String(uri)) => Subject::parse(uri)?,
            _ => {
                return Err(ConnectorError::validation(
                    "node uri is required for update",
                    "Include a string \"uri\" member identifying the node to update.",
                )
                .into());
            }
        };
        let fields = object
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "uri" | "class_uri"))
            .map(|(k, v)| (k.clone(), Field::Json(v.clone())))
            .collect();
        Ok(Self { uri, fields })
    }

    pub fn uri(&self) -> &Subject {
        &self.uri
    }

    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields
            .insert(name.to_string(), Field::Attr(Attr::One(value.into())));
        self
    }

    pub fn set_many<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.fields
            .insert(name.to_string(), Field::Attr(Attr::Many(values)));
        self
    }

    pub fn set_json(mut self, name: &str, json: serde_json::Value) -> Self {
        self.fields.insert(name.to_string(), Field::Json(json));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Materialize the patch as a node of the given class.
    pub fn to_node(&self, class: NodeClass) -> KgResult<Node> {
        let mut node = Node::new(class, self.uri.clone());
        for (name, field) in &self.fields {
            match field {
                Field::Attr(Attr::One(v)) => {
                    node.set(name, v.clone())?;
                }
                Field::Attr(Attr::Many(vs)) => {
                    node.set_many(name, vs.iter().cloned())?;
                }
                Field::Json(json) => {
                    node.set_json(name, json)?;
                }
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn uri_is_required() {
        let err = NodePatch::from_json(&serde_json::json!({"host": "x"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn class_uri_is_dropped() {
        let patch = NodePatch::from_json(&serde_json::json!({
            "uri": "http://ex.org/c1",
            "class_uri": "http://ex.org/Other",
            "port": 1884,
        }))
        .unwrap();
        let node = patch.to_node(NodeClass::Connection).unwrap();
        assert_eq!(node.class(), NodeClass::Connection);
        assert_eq!(node.literal("port").and_then(|l| l.as_i64()), Some(1884));
        assert_eq!(node.attributes().count(), 1);
    }

    #[test]
    fn unknown_attribute_fails_on_materialize() {
        let patch = NodePatch::new(Subject::iri("http://ex.org/c1").unwrap()).set("bogus", 1i64);
        let err = patch.to_node(NodeClass::Connection).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn nulls_mean_absent() {
        let patch = NodePatch::from_json(&serde_json::json!({
            "uri": "http://ex.org/a1",
            "assetDescription": null,
            "assetProperties": [{"uri": "http://ex.org/p1"}],
        }))
        .unwrap();
        let node = patch.to_node(NodeClass::AbstractAsset).unwrap();
        assert!(node.get("assetDescription").is_none());
        assert_eq!(node.get("assetProperties").map(Attr::len), Some(1));
    }
}
