//! SPARQL 1.1 query results in JSON form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One bound term, as it appears in a JSON results document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfTerm {
    /// `uri`, `bnode`, or `literal`.
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl From<&oxigraph::model::Term> for RdfTerm {
    fn from(term: &oxigraph::model::Term) -> Self {
        use oxigraph::model::Term;
        match term {
            Term::NamedNode(n) => Self {
                kind: "uri".into(),
                value: n.as_str().into(),
                datatype: None,
                lang: None,
            },
            Term::BlankNode(b) => Self {
                kind: "bnode".into(),
                value: b.as_str().into(),
                datatype: None,
                lang: None,
            },
            Term::Literal(l) => Self {
                kind: "literal".into(),
                value: l.value().into(),
                datatype: l
                    .language()
                    .is_none()
                    .then(|| l.datatype().as_str().to_string()),
                lang: l.language().map(str::to_string),
            },
        }
    }
}

pub type Row = BTreeMap<String, RdfTerm>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Bindings {
    bindings: Vec<Row>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    head: Head,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<Bindings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    boolean: Option<bool>,
}

/// A tabular answer: ordered variables and one map of bindings per row.
///
/// Unbound variables are simply absent from a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    variables: Vec<String>,
    rows: Vec<Row>,
    boolean: Option<bool>,
}

impl ResultTable {
    pub fn new(variables: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            variables,
            rows,
            boolean: None,
        }
    }

    pub fn from_boolean(value: bool) -> Self {
        Self {
            boolean: Some(value),
            ..Self::default()
        }
    }

    pub fn parse(json: &str) -> Result<Self, StoreError> {
        let doc: Document = serde_json::from_str(json).map_err(|e| StoreError::Results {
            message: e.to_string(),
        })?;
        Ok(Self {
            variables: doc.head.vars,
            rows: doc.results.map(|r| r.bindings).unwrap_or_default(),
            boolean: doc.boolean,
        })
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let doc = Document {
            head: Head {
                vars: self.variables.clone(),
            },
            results: self.boolean.is_none().then(|| Bindings {
                bindings: self.rows.clone(),
            }),
            boolean: self.boolean,
        };
        serde_json::to_string(&doc).map_err(|e| StoreError::Results {
            message: e.to_string(),
        })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn boolean(&self) -> Option<bool> {
        self.boolean
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values bound to `variable`, skipping rows where it is unbound.
    pub fn column(&self, variable: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.get(variable).map(|t| t.value.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "head": {"vars": ["unit", "label"]},
        "results": {"bindings": [
            {"unit": {"type": "uri", "value": "urn:u#metre"},
             "label": {"type": "literal", "value": "metre", "xml:lang": "en"}},
            {"unit": {"type": "uri", "value": "urn:u#second"}}
        ]}
    }"#;

    #[test]
    fn parses_bindings_with_gaps() {
        let table = ResultTable::parse(SAMPLE).unwrap();
        assert_eq!(table.variables(), ["unit", "label"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("unit"), vec!["urn:u#metre", "urn:u#second"]);
        assert_eq!(table.column("label"), vec!["metre"]);
        assert_eq!(
            table.rows()[0]["label"].lang.as_deref(),
            Some("en")
        );
    }

    #[test]
    fn ask_documents() {
        let json = ResultTable::from_boolean(true).to_json().unwrap();
        let table = ResultTable::parse(&json).unwrap();
        assert_eq!(table.boolean(), Some(true));
        assert!(table.is_empty());
    }

    #[test]
    fn garbage_is_a_results_error() {
        assert!(matches!(
            ResultTable::parse("unit,label\nx,y"),
            Err(StoreError::Results { .. })
        ));
    }
}
