//! Embedded triple store backed by oxigraph.
//!
//! Runs the same SPARQL text the HTTP adapter sends, so it stands in for a
//! remote store in tests and for `backend = "memory"`. Clones share data.

use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{GraphName, NamedNode, Quad};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;

use super::results::{RdfTerm, ResultTable, Row};
use super::{ACCEPT_NTRIPLES, GraphStore, StoreResult, WriteOutcome};
use crate::error::StoreError;

/// In-process SPARQL store.
#[derive(Clone)]
pub struct MemoryStore {
    store: Store,
}

impl MemoryStore {
    pub fn new() -> StoreResult<Self> {
        let store = Store::new().map_err(|e| StoreError::Unavailable {
            endpoint: "memory".into(),
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        tracing::debug!("created in-memory oxigraph store");
        Ok(Self { store })
    }

    /// Load a Turtle document into a named graph, or the default graph.
    pub fn load_turtle(&self, graph: Option<&str>, turtle: &str) -> StoreResult<usize> {
        let graph_name = match graph {
            Some(iri) => NamedNode::new(iri)
                .map(GraphName::NamedNode)
                .map_err(|e| StoreError::InvalidQuery {
                    message: format!("invalid graph name <{iri}>: {e}"),
                })?,
            None => GraphName::DefaultGraph,
        };
        let mut count = 0;
        for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(turtle.as_bytes()) {
            let quad = quad.map_err(|e| StoreError::InvalidQuery {
                message: format!("invalid Turtle: {e}"),
            })?;
            let quad = Quad::new(quad.subject, quad.predicate, quad.object, graph_name.clone());
            self.store.insert(&quad).map_err(|e| StoreError::Rejected {
                status: 500,
                message: format!("insert failed: {e}"),
            })?;
            count += 1;
        }
        Ok(count)
    }

    /// Number of quads across all graphs.
    pub fn len(&self) -> StoreResult<usize> {
        self.store.len().map_err(|e| StoreError::Rejected {
            status: 500,
            message: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Underlying oxigraph store.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

fn failed(e: impl std::fmt::Display) -> StoreError {
    StoreError::Rejected {
        status: 500,
        message: e.to_string(),
    }
}

impl GraphStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&self, query: &str, accept: &str) -> StoreResult<String> {
        let prepared = SparqlEvaluator::new()
            .parse_query(query)
            .map_err(|e| StoreError::InvalidQuery {
                message: e.to_string(),
            })?;
        let results = prepared.on_store(&self.store).execute().map_err(failed)?;

        match results {
            QueryResults::Solutions(solutions) => {
                let variables = solutions
                    .variables()
                    .iter()
                    .map(|v| v.as_str().to_string())
                    .collect();
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(failed)?;
                    let row: Row = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), RdfTerm::from(term)))
                        .collect();
                    rows.push(row);
                }
                ResultTable::new(variables, rows).to_json()
            }
            QueryResults::Boolean(b) => ResultTable::from_boolean(b).to_json(),
            QueryResults::Graph(triples) => {
                let format = if accept == ACCEPT_NTRIPLES {
                    RdfFormat::NTriples
                } else {
                    RdfFormat::Turtle
                };
                let mut writer = RdfSerializer::from_format(format).for_writer(Vec::new());
                for triple in triples {
                    let triple = triple.map_err(failed)?;
                    let quad = Quad::new(
                        triple.subject,
                        triple.predicate,
                        triple.object,
                        GraphName::DefaultGraph,
                    );
                    writer.serialize_quad(&quad).map_err(failed)?;
                }
                let bytes = writer.finish().map_err(failed)?;
                String::from_utf8(bytes).map_err(failed)
            }
        }
    }

    fn write(&self, update: &str) -> StoreResult<WriteOutcome> {
        let prepared = match SparqlEvaluator::new().parse_update(update) {
            Ok(prepared) => prepared,
            Err(e) => return Ok(WriteOutcome::rejected(format!("malformed update: {e}"))),
        };
        Ok(match prepared.on_store(&self.store).execute() {
            Ok(()) => WriteOutcome::accepted(),
            Err(e) => WriteOutcome::rejected(e.to_string()),
        })
    }

    fn check_connectivity(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TripleSet;
    use crate::store::{ACCEPT_RESULTS_JSON, ACCEPT_TURTLE};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new().unwrap();
        store
            .load_turtle(
                Some("http://ex.org/g"),
                r#"<http://ex.org/a> <http://ex.org/p> "x" , "y" ."#,
            )
            .unwrap();
        store
    }

    #[test]
    fn select_answers_json() {
        let store = seeded();
        let body = store
            .read(
                "SELECT ?o WHERE { GRAPH <http://ex.org/g> { ?s ?p ?o } } ORDER BY ?o",
                ACCEPT_RESULTS_JSON,
            )
            .unwrap();
        let table = ResultTable::parse(&body).unwrap();
        assert_eq!(table.column("o"), vec!["x", "y"]);
    }

    #[test]
    fn construct_answers_turtle() {
        let store = seeded();
        let body = store
            .read(
                "CONSTRUCT { ?s ?p ?o } WHERE { GRAPH <http://ex.org/g> { ?s ?p ?o } }",
                ACCEPT_TURTLE,
            )
            .unwrap();
        assert_eq!(TripleSet::parse_turtle(&body).unwrap().len(), 2);
    }

    #[test]
    fn bad_update_is_rejected_not_failed() {
        let store = seeded();
        let outcome = store.write("INSERT DATA { nonsense").unwrap();
        assert!(!outcome.ok);
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn clones_share_data() {
        let store = seeded();
        let clone = store.clone();
        let outcome = clone
            .write("DELETE WHERE { GRAPH <http://ex.org/g> { ?s ?p ?o } }")
            .unwrap();
        assert!(outcome.ok);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn bad_query_is_invalid() {
        let store = seeded();
        assert!(matches!(
            store.read("SELEC ?x", ACCEPT_RESULTS_JSON),
            Err(StoreError::InvalidQuery { .. })
        ));
    }
}
