//! SPARQL text sent through the persistence port.
//!
//! Every IRI spliced in here has already been validated (a [`Subject`], a
//! registered class, or a workspace-resolved graph name); free text goes
//! through [`string_literal`].

use std::fmt::Write as _;

use crate::model::NodeClass;
use crate::value::Subject;
use crate::vocab::{model_iri, rdf, rdfs, samm};

fn values_clause(var: &str, subjects: &[&Subject]) -> String {
    let mut out = format!("VALUES ?{var} {{");
    for s in subjects {
        let _ = write!(out, " <{}>", s.as_str());
    }
    out.push_str(" }");
    out
}

/// Quote free text as a SPARQL string literal.
pub(crate) fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Nesting depth of blank nodes that travel with their parent.
pub(crate) const BLANK_LEVELS: usize = 3;

/// CONSTRUCT/DELETE template and WHERE pattern covering the outgoing triples
/// of `root` and of the blank nodes reachable from it through blank nodes.
///
/// Blank nodes cannot be addressed in a later request, so every read, delete
/// and rewrite of a node carries its blank closure along.
fn with_blank_closure(root: &str) -> (String, String) {
    let mut template = format!("{root} ?p ?o .");
    let mut pattern = format!("{root} ?p ?o .");
    let mut parent = "?o".to_string();
    for level in 1..=BLANK_LEVELS {
        let (p, o) = (format!("?p{level}"), format!("?o{level}"));
        let _ = write!(template, " {parent} {p} {o} .");
        let _ = write!(pattern, " OPTIONAL {{ {parent} {p} {o} . FILTER(isBlank({parent}))");
        parent = o;
    }
    pattern.push_str(&" }".repeat(BLANK_LEVELS));
    (template, pattern)
}

/// Outgoing triples of one node, plus those of blank nodes it points at.
pub(crate) fn load_node(graph: &str, node: &Subject) -> String {
    let (template, pattern) = with_blank_closure(&format!("<{}>", node.as_str()));
    format!("CONSTRUCT {{ {template} }} WHERE {{ GRAPH <{graph}> {{ {pattern} }} }}")
}

/// Outgoing triples of several nodes and their blank closures.
pub(crate) fn load_nodes(graph: &str, nodes: &[&Subject]) -> String {
    let (template, pattern) = with_blank_closure("?s");
    format!(
        "CONSTRUCT {{ {template} }} WHERE {{ GRAPH <{graph}> {{ {} {pattern} }} }}",
        values_clause("s", nodes)
    )
}

pub(crate) fn uris_by_class(graph: &str, class_iri: &str) -> String {
    format!(
        "SELECT DISTINCT ?node WHERE {{ GRAPH <{graph}> {{ ?node <{}> <{class_iri}> }} }} \
         ORDER BY ?node",
        rdf::TYPE
    )
}

/// Stored `rdf:type`s of several nodes.
pub(crate) fn classes_of(graph: &str, nodes: &[&Subject]) -> String {
    format!(
        "SELECT ?s ?class WHERE {{ GRAPH <{graph}> {{ {} ?s <{}> ?class }} }}",
        values_clause("s", nodes),
        rdf::TYPE
    )
}

pub(crate) fn node_exists(graph: &str, node: &Subject) -> String {
    format!(
        "ASK {{ GRAPH <{graph}> {{ <{}> ?p ?o }} }}",
        node.as_str()
    )
}

/// Remove a node's outgoing triples and its blank closure.
pub(crate) fn delete_node(graph: &str, node: &Subject) -> String {
    delete_nodes(graph, &[node])
}

pub(crate) fn delete_nodes(graph: &str, nodes: &[&Subject]) -> String {
    let (template, pattern) = with_blank_closure("?s");
    format!(
        "DELETE {{ GRAPH <{graph}> {{ {template} }} }} WHERE {{ GRAPH <{graph}> {{ {} {pattern} }} }}",
        values_clause("s", nodes)
    )
}

pub(crate) fn insert_data(graph: &str, ntriples: &str) -> String {
    format!("INSERT DATA {{ GRAPH <{graph}> {{\n{ntriples}}} }}")
}

/// One request removing `remove` and adding `insert`.
pub(crate) fn delete_insert_data(graph: &str, remove: &str, insert: &str) -> String {
    format!(
        "DELETE DATA {{ GRAPH <{graph}> {{\n{remove}}} }} ;\n\
         INSERT DATA {{ GRAPH <{graph}> {{\n{insert}}} }}"
    )
}

pub(crate) fn list_named_graphs() -> &'static str {
    "SELECT DISTINCT ?g WHERE { GRAPH ?g { ?s ?p ?o } } ORDER BY ?g"
}

fn unit_pattern() -> String {
    format!(
        "?unit a <{unit}> . \
         OPTIONAL {{ ?unit <{name}> ?label }} \
         OPTIONAL {{ ?unit <{symbol}> ?symbol }} \
         OPTIONAL {{ ?unit <{code}> ?code }}",
        unit = samm::UNIT,
        name = samm::PREFERRED_NAME,
        symbol = samm::SYMBOL,
        code = samm::CODE,
    )
}

/// Units whose name, symbol or code contains `term`, case-insensitively.
pub(crate) fn find_unit(term: &str) -> String {
    format!(
        "SELECT DISTINCT ?unit ?label ?symbol ?code WHERE {{ {} \
         FILTER(CONTAINS(LCASE(STR(?unit)), LCASE({t})) \
             || CONTAINS(LCASE(STR(COALESCE(?label, \"\"))), LCASE({t})) \
             || CONTAINS(LCASE(STR(COALESCE(?symbol, \"\"))), LCASE({t})) \
             || CONTAINS(LCASE(STR(COALESCE(?code, \"\"))), LCASE({t}))) }} ORDER BY ?unit",
        unit_pattern(),
        t = string_literal(term),
    )
}

pub(crate) fn find_unit_by_uri(unit: &Subject) -> String {
    format!(
        "SELECT ?unit ?label ?symbol ?code WHERE {{ {} FILTER(?unit = <{}>) }} LIMIT 1",
        unit_pattern(),
        unit.as_str()
    )
}

pub(crate) fn all_units() -> String {
    format!(
        "SELECT DISTINCT ?unit ?label ?symbol ?code WHERE {{ {} }} ORDER BY ?unit",
        unit_pattern()
    )
}

/// Ontology subclasses of the abstract relationship, with their comments.
pub(crate) fn relationship_types() -> String {
    format!(
        "SELECT DISTINCT ?s ?d WHERE {{ \
         {{ ?s <{sub}>+ <{root}> }} UNION {{ GRAPH ?g {{ ?s <{sub}>+ <{root}> }} }} \
         OPTIONAL {{ ?s <{comment}> ?d }} }} ORDER BY ?s",
        sub = rdfs::SUB_CLASS_OF,
        root = NodeClass::AbstractRelationship.iri(),
        comment = rdfs::COMMENT,
    )
}

/// Every triple of relationships whose source or target is `node`.
pub(crate) fn relationships_by_node(graph: &str, node: &Subject) -> String {
    format!(
        "CONSTRUCT {{ ?r ?p ?o }} WHERE {{ GRAPH <{graph}> {{ \
         {{ ?r <{source}> <{n}> }} UNION {{ ?r <{target}> <{n}> }} \
         ?r ?p ?o }} }}",
        source = model_iri!("relationshipSource"),
        target = model_iri!("relationshipTarget"),
        n = node.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escaping() {
        assert_eq!(string_literal("m"), "\"m\"");
        assert_eq!(string_literal("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }

    #[test]
    fn values_lists_every_subject() {
        let a = Subject::iri("http://ex.org/a").unwrap();
        let b = Subject::iri("http://ex.org/b").unwrap();
        let q = delete_nodes("http://ex.org/g", &[&a, &b]);
        assert!(q.contains("VALUES ?s { <http://ex.org/a> <http://ex.org/b> }"));
        assert!(q.starts_with("DELETE { GRAPH <http://ex.org/g>"));
    }

    #[test]
    fn blank_closure_nests_one_optional_per_level() {
        let (template, pattern) = with_blank_closure("?s");
        assert_eq!(template, "?s ?p ?o . ?o ?p1 ?o1 . ?o1 ?p2 ?o2 . ?o2 ?p3 ?o3 .");
        assert_eq!(pattern.matches("OPTIONAL").count(), BLANK_LEVELS);
        assert!(pattern.contains("FILTER(isBlank(?o2))"));
        assert!(pattern.ends_with("} } }"));
    }

    #[test]
    fn generated_queries_parse() {
        use oxigraph::sparql::SparqlEvaluator;
        let g = "http://ex.org/g";
        let n = Subject::iri("http://ex.org/n").unwrap();
        for q in [
            load_node(g, &n),
            load_nodes(g, &[&n]),
            uris_by_class(g, NodeClass::Connection.iri()),
            classes_of(g, &[&n]),
            node_exists(g, &n),
            list_named_graphs().to_string(),
            find_unit("me\"tre"),
            find_unit_by_uri(&n),
            all_units(),
            relationship_types(),
            relationships_by_node(g, &n),
        ] {
            SparqlEvaluator::new()
                .parse_query(&q)
                .unwrap_or_else(|e| panic!("{q}: {e}"));
        }
        for u in [
            delete_node(g, &n),
            delete_nodes(g, &[&n]),
            insert_data(g, "<http://ex.org/n> <http://ex.org/p> \"x\" .\n"),
            delete_insert_data(g, "", "<http://ex.org/n> <http://ex.org/p> \"x\" .\n"),
        ] {
            SparqlEvaluator::new()
                .parse_update(&u)
                .unwrap_or_else(|e| panic!("{u}: {e}"));
        }
    }
}
