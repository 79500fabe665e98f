//! Read-only lookups: units, datatypes, relationship types and instances.
//!
//! These return flat records; no match is an empty list, never an error.

use serde::Serialize;

use super::{KgConnector, queries};
use crate::codec::{NodeGraph, Target, deserialize};
use crate::error::KgResult;
use crate::model::ClassRegistry;
use crate::store::Row;
use crate::value::Subject;
use crate::vocab::xsd;

/// A measurement unit from the unit catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRecord {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl UnitRecord {
    fn from_row(row: &Row) -> Option<Self> {
        let text = |var: &str| row.get(var).map(|t| t.value.clone());
        Some(Self {
            uri: text("unit")?,
            label: text("label"),
            symbol: text("symbol"),
            code: text("code"),
        })
    }
}

/// A literal datatype attribute values may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataType {
    pub uri: &'static str,
    pub label: &'static str,
}

const DATA_TYPES: &[DataType] = &[
    DataType {
        uri: xsd::STRING,
        label: "string",
    },
    DataType {
        uri: xsd::INTEGER,
        label: "integer",
    },
    DataType {
        uri: xsd::FLOAT,
        label: "float",
    },
    DataType {
        uri: xsd::BOOLEAN,
        label: "boolean",
    },
    DataType {
        uri: xsd::DATE_TIME_STAMP,
        label: "dateTime | dateTimeStamp",
    },
];

/// A relationship class declared in the store's ontology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipType {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl KgConnector {
    /// Units whose identifier, name, symbol or code contains `term`.
    pub fn search_units(&self, term: &str) -> KgResult<Vec<UnitRecord>> {
        let table = self.select(&queries::find_unit(term))?;
        Ok(table.rows().iter().filter_map(UnitRecord::from_row).collect())
    }

    pub fn unit_by_uri(&self, uri: &str) -> KgResult<Option<UnitRecord>> {
        let unit = Subject::iri(uri)?;
        let table = self.select(&queries::find_unit_by_uri(&unit))?;
        Ok(table.rows().iter().find_map(UnitRecord::from_row))
    }

    pub fn all_units(&self) -> KgResult<Vec<UnitRecord>> {
        let table = self.select(&queries::all_units())?;
        Ok(table.rows().iter().filter_map(UnitRecord::from_row).collect())
    }

    pub fn data_types(&self) -> &'static [DataType] {
        DATA_TYPES
    }

    pub fn relationship_types(&self) -> KgResult<Vec<RelationshipType>> {
        let table = self.select(&queries::relationship_types())?;
        Ok(table
            .rows()
            .iter()
            .filter_map(|row| {
                Some(RelationshipType {
                    uri: row.get("s")?.value.clone(),
                    description: row.get("d").map(|t| t.value.clone()),
                })
            })
            .collect())
    }

    /// Every relationship node in the active graph.
    pub fn all_relationships(&self, depth: usize) -> KgResult<NodeGraph> {
        let mut graph = NodeGraph::new();
        for class in ClassRegistry::relationships().classes() {
            if self.registry.contains(class) {
                self.load_class_into(class.iri(), depth, &mut graph)?;
            }
        }
        Ok(graph)
    }

    /// Relationships whose source or target is `uri`.
    ///
    /// Endpoints come back as unresolved references.
    pub fn relationships_of(&self, uri: &str) -> KgResult<NodeGraph> {
        let node = Subject::iri(uri)?;
        let active = self.workspace.active();
        let triples = self.construct(&queries::relationships_by_node(&active, &node))?;
        let registry = ClassRegistry::relationships();
        let mut graph = NodeGraph::new();
        for class in registry.classes() {
            for subject in deserialize(&triples, &registry, Target::Class(class.iri()), &mut graph)? {
                graph.push_root(&subject);
            }
        }
        tracing::debug!(uri = %node, found = graph.len(), "relationships of node");
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RdfTerm;

    fn literal(value: &str) -> RdfTerm {
        RdfTerm {
            kind: "literal".into(),
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    #[test]
    fn unit_rows_need_a_uri() {
        let mut row = Row::new();
        row.insert("label".into(), literal("metre"));
        assert_eq!(UnitRecord::from_row(&row), None);

        row.insert(
            "unit".into(),
            RdfTerm {
                kind: "uri".into(),
                ..literal("urn:u#metre")
            },
        );
        let unit = UnitRecord::from_row(&row).unwrap();
        assert_eq!(unit.uri, "urn:u#metre");
        assert_eq!(unit.label.as_deref(), Some("metre"));
        assert_eq!(unit.symbol, None);
        assert_eq!(
            serde_json::to_value(&unit).unwrap(),
            serde_json::json!({"uri": "urn:u#metre", "label": "metre"})
        );
    }

    #[test]
    fn data_types_are_fixed() {
        let labels: Vec<_> = DATA_TYPES.iter().map(|d| d.label).collect();
        assert_eq!(
            labels,
            ["string", "integer", "float", "boolean", "dateTime | dateTimeStamp"]
        );
    }
}
