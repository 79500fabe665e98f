//! Knowledge-graph connector: typed nodes in, SPARQL round trips out.
//!
//! Every operation is scoped to the workspace's active named graph and is a
//! sequence of independent store requests. Nothing here locks across those
//! requests, so two writers touching the same subjects race at the store and
//! the last write wins.

mod queries;
mod search;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

pub use search::{DataType, RelationshipType, UnitRecord};

use crate::codec::{NodeGraph, Target, Term, TripleSet, deserialize, serialize, serialize_in};
use crate::config::KgConfig;
use crate::error::{CodecError, ConnectorError, ErrorKind, KgResult};
use crate::model::{ClassRegistry, Node, NodeClass, NodePatch};
use crate::store::{
    ACCEPT_RESULTS_JSON, ACCEPT_TURTLE, GraphStore, RdfTerm, ResultTable, wait_until_available,
};
use crate::value::Subject;
use crate::vocab::rdf;
use crate::workspace::Workspace;

/// Loads, saves, updates and deletes typed nodes in a remote triple store.
pub struct KgConnector {
    store: Arc<dyn GraphStore>,
    registry: ClassRegistry,
    workspace: Workspace,
}

impl KgConnector {
    /// Build a connector without probing the store.
    pub fn new(store: Arc<dyn GraphStore>, config: &KgConfig) -> KgResult<Self> {
        let workspace = Workspace::new(&config.graph)?;
        tracing::debug!(
            backend = store.name(),
            graph = %workspace.active(),
            "connector ready"
        );
        Ok(Self {
            store,
            registry: ClassRegistry::standard(),
            workspace,
        })
    }

    /// Wait for the store to come up, then build a connector.
    pub fn connect(store: Arc<dyn GraphStore>, config: &KgConfig) -> KgResult<Self> {
        wait_until_available(store.as_ref(), &config.connect)?;
        Self::new(store, config)
    }

    /// Replace the class registry used to resolve stored types.
    pub fn with_registry(mut self, registry: ClassRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn active_graph(&self) -> String {
        self.workspace.active()
    }

    /// Switch the active graph. Short names are resolved against the base
    /// namespace; the resolved identifier is returned.
    pub fn set_active_graph(&self, identifier: &str) -> KgResult<String> {
        Ok(self.workspace.set_active(identifier)?)
    }

    /// Named graphs that currently hold at least one triple.
    pub fn graphs(&self) -> KgResult<Vec<String>> {
        let table = self.select(queries::list_named_graphs())?;
        Ok(table.column("g").into_iter().map(str::to_string).collect())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Load one node, expanding references breadth-first for `depth` rounds.
    ///
    /// With `depth = 1` only the node's own triples are fetched and every
    /// referenced node comes back as an unresolved reference. Each extra
    /// round resolves one more hop. The returned graph's root is `uri`.
    pub fn load_by_uri(
        &self,
        uri: &str,
        class: Option<NodeClass>,
        depth: usize,
    ) -> KgResult<NodeGraph> {
        let subject = Subject::parse(uri)?;
        let mut graph = NodeGraph::new();
        self.load_into(&subject, class, depth, &mut graph)?;
        Ok(graph)
    }

    /// Load every node of one class into a single shared graph.
    pub fn load_by_class(&self, class_iri: &str, depth: usize) -> KgResult<NodeGraph> {
        let mut graph = NodeGraph::new();
        self.load_class_into(class_iri, depth, &mut graph)?;
        Ok(graph)
    }

    /// Load every node of every registered class.
    ///
    /// All scans share one graph, so a node reachable from several classes is
    /// materialized once; roots keep the order in which nodes were first seen.
    pub fn load_all(&self, depth: usize) -> KgResult<NodeGraph> {
        let mut graph = NodeGraph::new();
        for class in self.registry.classes() {
            self.load_class_into(class.iri(), depth, &mut graph)?;
        }
        Ok(graph)
    }

    /// Load `uri` into an existing graph, reusing nodes it already holds.
    pub fn load_into(
        &self,
        uri: &Subject,
        class: Option<NodeClass>,
        depth: usize,
        graph: &mut NodeGraph,
    ) -> KgResult<()> {
        if depth == 0 {
            return Err(ConnectorError::validation(
                "depth must be at least 1",
                "depth 1 loads the node's own attributes; each extra level resolves one more hop.",
            )
            .into());
        }
        if uri.is_blank() {
            return Err(blank_not_addressable(uri));
        }
        if graph.contains(uri) {
            graph.push_root(uri);
            return Ok(());
        }

        let active = self.workspace.active();
        let mut fetched = TripleSet::new();
        let mut visited: HashSet<Subject> = HashSet::new();
        let mut frontier = vec![uri.clone()];

        for round in 1..=depth {
            let mut next = Vec::new();
            for subject in frontier.drain(..) {
                if subject.is_blank() || graph.contains(&subject) || !visited.insert(subject.clone())
                {
                    continue;
                }
                let triples = self.construct(&queries::load_node(&active, &subject))?;
                if round < depth {
                    next.extend(
                        triples
                            .iter()
                            .filter(|t| t.predicate != rdf::TYPE)
                            .filter_map(|t| match &t.object {
                                Term::Iri(iri) => Some(Subject::Iri(iri.clone())),
                                _ => None,
                            }),
                    );
                }
                fetched.merge(triples);
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        tracing::debug!(
            uri = %uri,
            depth,
            nodes = visited.len(),
            triples = fetched.len(),
            "fetched node neighbourhood"
        );

        if !fetched.has_subject(uri) {
            return Err(ConnectorError::NotFound {
                uri: uri.to_string(),
                graph: active,
            }
            .into());
        }
        deserialize(&fetched, &self.registry, Target::Uri { uri, class }, graph)?;
        graph.push_root(uri);
        Ok(())
    }

    fn load_class_into(&self, class_iri: &str, depth: usize, graph: &mut NodeGraph) -> KgResult<()> {
        let class = self
            .registry
            .resolve(class_iri)
            .ok_or_else(|| CodecError::UnregisteredClass {
                class: class_iri.to_string(),
            })?;
        let active = self.workspace.active();
        let table = self.select(&queries::uris_by_class(&active, class.iri()))?;
        for term in table.rows().iter().filter_map(|row| row.get("node")) {
            let Some(subject) = term_subject(term) else {
                continue;
            };
            if subject.is_blank() {
                tracing::debug!(node = %subject, class = %class, "skipping blank node");
                continue;
            }
            match self.load_into(&subject, Some(class), depth, graph) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!(node = %subject, class = %class, "node vanished while loading");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Remove every triple whose subject is `uri`, with the blank nodes it
    /// owns. Named nodes it references are left alone.
    pub fn delete(&self, uri: &str) -> KgResult<()> {
        let subject = Subject::parse(uri)?;
        if subject.is_blank() {
            return Err(blank_not_addressable(&subject));
        }
        let active = self.workspace.active();
        let exists = self
            .select(&queries::node_exists(&active, &subject))?
            .boolean()
            .unwrap_or(false);
        if !exists {
            return Err(ConnectorError::NotFound {
                uri: subject.to_string(),
                graph: active,
            }
            .into());
        }
        self.apply(&queries::delete_node(&active, &subject))?;
        tracing::info!(uri = %subject, graph = %active, "deleted node");
        Ok(())
    }

    /// Replace the stored state of `node` and every typed node it carries.
    ///
    /// Each typed, non-blank subject of `serialize(node)` must not already be
    /// stored under a different class. Those subjects are deleted together
    /// with the blank nodes they own, and the new triples inserted. If the
    /// insert fails, the triples read before the delete are written back and
    /// the insert's error is returned.
    ///
    /// Shared handles are written as references, so a blank node reached
    /// through one is rejected: use [`KgConnector::save_in`] with the graph it
    /// was loaded into.
    pub fn save(&self, node: &Node) -> KgResult<()> {
        self.write(node, serialize(node)?)
    }

    /// Like [`KgConnector::save`], following shared handles through `graph`.
    pub fn save_in(&self, node: &Node, graph: &NodeGraph) -> KgResult<()> {
        self.write(node, serialize_in(node, graph)?)
    }

    fn write(&self, node: &Node, triples: TripleSet) -> KgResult<()> {
        if triples.is_empty() {
            return Err(ConnectorError::validation(
                format!("nothing to save for {}", node.uri()),
                "Nodes of the base class carry no attributes; save a concrete class instead.",
            )
            .into());
        }
        if let Some(blank) = dangling_blank(&triples) {
            return Err(ConnectorError::validation(
                format!("{} references blank node {blank} without its attributes", node.uri()),
                "Blank nodes only exist inside one request; save the node with `save_in` and the graph it was loaded into.",
            )
            .into());
        }
        let active = self.workspace.active();
        let subjects: BTreeSet<&Subject> = triples
            .iter()
            .filter(|t| t.predicate == rdf::TYPE && !t.subject.is_blank())
            .map(|t| &t.subject)
            .collect();
        let subjects: Vec<&Subject> = subjects.into_iter().collect();
        let insert = queries::insert_data(&active, &triples.to_ntriples()?);

        let snapshot = if subjects.is_empty() {
            TripleSet::new()
        } else {
            self.check_types(&active, &subjects, &triples)?;
            let snapshot = self.construct(&queries::load_nodes(&active, &subjects))?;
            self.apply(&queries::delete_nodes(&active, &subjects))?;
            snapshot
        };

        let failure = match self.store.write(&insert) {
            Ok(outcome) if outcome.ok => None,
            Ok(outcome) => Some(ConnectorError::WriteRejected {
                message: outcome.message,
            }
            .into()),
            Err(e) => Some(e.into()),
        };
        match failure {
            None => {
                tracing::info!(
                    uri = %node.uri(),
                    graph = %active,
                    subjects = subjects.len(),
                    triples = triples.len(),
                    "saved node"
                );
                Ok(())
            }
            Some(err) => {
                self.restore(&active, &snapshot);
                Err(err)
            }
        }
    }

    /// Merge a sparse set of attributes into one stored node.
    ///
    /// With `overwrite`, stored triples sharing a (subject, predicate) pair
    /// with the new triples are replaced; otherwise the new values are added
    /// next to the old ones. Removal and insertion go out as one request and
    /// are not rolled back.
    ///
    /// Only the node's own stored triples are considered for removal. New
    /// inverse triples (e.g. a relationship's new target) are added, but the
    /// inverse triples of replaced values stay on the nodes they were on.
    pub fn update(&self, patch: &NodePatch, overwrite: bool) -> KgResult<()> {
        let uri = patch.uri();
        if uri.is_blank() {
            return Err(blank_not_addressable(uri));
        }
        let active = self.workspace.active();
        let class = self.stored_class(&active, uri)?;
        let candidate = serialize(&patch.to_node(class)?)?;
        let current = self.construct(&queries::load_nodes(&active, &[uri]))?;

        let pairs: HashSet<(&Subject, &str)> = candidate
            .iter()
            .map(|t| (&t.subject, t.predicate.as_str()))
            .collect();
        let removal = current.filter(|t| {
            !matches!(t.object, Term::Blank(_))
                && !t.subject.is_blank()
                && if overwrite {
                    pairs.contains(&(&t.subject, t.predicate.as_str()))
                } else {
                    candidate.contains(t)
                }
        });

        let request = queries::delete_insert_data(
            &active,
            &removal.to_ntriples()?,
            &candidate.to_ntriples()?,
        );
        self.apply(&request)?;
        tracing::info!(
            uri = %uri,
            graph = %active,
            overwrite,
            removed = removal.len(),
            inserted = candidate.len(),
            "updated node"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn construct(&self, query: &str) -> KgResult<TripleSet> {
        let body = self.store.read(query, ACCEPT_TURTLE)?;
        Ok(TripleSet::parse_turtle(&body)?)
    }

    fn select(&self, query: &str) -> KgResult<ResultTable> {
        let body = self.store.read(query, ACCEPT_RESULTS_JSON)?;
        Ok(ResultTable::parse(&body)?)
    }

    fn apply(&self, update: &str) -> KgResult<()> {
        let outcome = self.store.write(update)?;
        if outcome.ok {
            Ok(())
        } else {
            tracing::warn!(message = %outcome.message, "store rejected update");
            Err(ConnectorError::WriteRejected {
                message: outcome.message,
            }
            .into())
        }
    }

    /// Stored `rdf:type` identifiers per subject.
    fn stored_types(
        &self,
        graph: &str,
        subjects: &[&Subject],
    ) -> KgResult<HashMap<Subject, Vec<String>>> {
        let table = self.select(&queries::classes_of(graph, subjects))?;
        let mut types: HashMap<Subject, Vec<String>> = HashMap::new();
        for row in table.rows() {
            let (Some(s), Some(class)) = (row.get("s").and_then(term_subject), row.get("class"))
            else {
                continue;
            };
            types.entry(s).or_default().push(class.value.clone());
        }
        Ok(types)
    }

    /// The registered class a node is stored under.
    fn stored_class(&self, graph: &str, uri: &Subject) -> KgResult<NodeClass> {
        let types = self
            .stored_types(graph, &[uri])?
            .remove(uri)
            .unwrap_or_default();
        if types.is_empty() {
            return Err(ConnectorError::NotFound {
                uri: uri.to_string(),
                graph: graph.to_string(),
            }
            .into());
        }
        types
            .iter()
            .find_map(|iri| self.registry.resolve(iri))
            .ok_or_else(|| {
                CodecError::UnregisteredClass {
                    class: types[0].clone(),
                }
                .into()
            })
    }

    fn check_types(&self, graph: &str, subjects: &[&Subject], written: &TripleSet) -> KgResult<()> {
        let stored = self.stored_types(graph, subjects)?;
        for subject in subjects {
            let Some(stored) = stored.get(*subject) else {
                continue;
            };
            let mut new_types = written.types_of(subject).peekable();
            let Some(first) = new_types.peek().copied() else {
                continue;
            };
            if !new_types.any(|t| stored.iter().any(|s| s == t)) {
                return Err(ConnectorError::TypeMismatch {
                    uri: subject.to_string(),
                    stored: stored.join(", "),
                    written: first.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Best-effort write-back of triples removed by a failed save.
    ///
    /// The snapshot holds whole blank closures, so one `INSERT DATA` rebuilds
    /// each blank child with its attributes under a fresh label.
    fn restore(&self, graph: &str, snapshot: &TripleSet) {
        if snapshot.is_empty() {
            return;
        }
        let outcome = snapshot
            .to_ntriples()
            .map_err(|e| e.to_string())
            .and_then(|nt| {
                self.store
                    .write(&queries::insert_data(graph, &nt))
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(o) if o.ok => {
                tracing::warn!(graph, triples = snapshot.len(), "save failed; previous state restored")
            }
            Ok(o) => tracing::error!(
                graph,
                triples = snapshot.len(),
                message = %o.message,
                "save failed and restoring the previous state was rejected"
            ),
            Err(e) => tracing::error!(
                graph,
                triples = snapshot.len(),
                error = %e,
                "save failed and restoring the previous state failed"
            ),
        }
    }
}

impl std::fmt::Debug for KgConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KgConnector")
            .field("store", &self.store.name())
            .field("classes", &self.registry.len())
            .field("workspace", &self.workspace)
            .finish()
    }
}

fn term_subject(term: &RdfTerm) -> Option<Subject> {
    match term.kind.as_str() {
        "uri" => Some(Subject::Iri(term.value.clone())),
        "bnode" => Some(Subject::Blank(term.value.clone())),
        _ => None,
    }
}

/// A blank object whose own typed triples are not part of `triples`.
fn dangling_blank(triples: &TripleSet) -> Option<Subject> {
    triples
        .iter()
        .filter_map(|t| match &t.object {
            Term::Blank(_) => t.object.as_subject(),
            _ => None,
        })
        .find(|blank| triples.types_of(blank).next().is_none())
}

fn blank_not_addressable(subject: &Subject) -> crate::error::KgError {
    ConnectorError::validation(
        format!("blank node {subject} cannot be addressed in the store"),
        "Blank nodes are scoped to one triple set; give the node an IRI to load, update or delete it.",
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn connector() -> KgConnector {
        let store = Arc::new(MemoryStore::new().unwrap());
        KgConnector::new(store, &KgConfig::default()).unwrap()
    }

    #[test]
    fn depth_zero_is_rejected() {
        let err = connector()
            .load_by_uri("http://ex.org/c1", None, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn blank_nodes_cannot_be_deleted() {
        let err = connector().delete("_:b0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn base_nodes_have_nothing_to_save() {
        let node = Node::with_uri(NodeClass::Base, "http://ex.org/x").unwrap();
        let err = connector().save(&node).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn graph_switching() {
        let kg = connector();
        assert_eq!(kg.active_graph(), "http://sindit.sintef.no/2.0#DefaultGraph");
        kg.set_active_graph("line-7").unwrap();
        assert_eq!(kg.active_graph(), "http://sindit.sintef.no/2.0#line-7");
        assert!(format!("{kg:?}").contains("memory"));
    }
}
