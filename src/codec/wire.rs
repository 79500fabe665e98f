//! Triple-set wire format.
//!
//! Reads accept Turtle (and therefore N-Triples). Writes produce N-Triples for
//! embedding in SPARQL update data blocks, or prefixed Turtle for humans.

use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{self as ox, GraphName, NamedOrBlankNode, Quad};

use super::{Term, Triple, TripleSet};
use crate::error::CodecError;
use crate::value::{Literal, LiteralKind, Subject};
use crate::vocab;

impl TripleSet {
    /// Parse a Turtle or N-Triples document. Graph names are ignored.
    pub fn parse_turtle(text: &str) -> Result<Self, CodecError> {
        let parser = RdfParser::from_format(RdfFormat::Turtle);
        let mut out = TripleSet::new();
        for quad in parser.for_reader(text.as_bytes()) {
            let quad = quad.map_err(|e| CodecError::Parse {
                message: e.to_string(),
            })?;
            out.insert(from_quad(quad));
        }
        Ok(out)
    }

    /// One N-Triples statement per line.
    pub fn to_ntriples(&self) -> Result<String, CodecError> {
        encode(self, RdfSerializer::from_format(RdfFormat::NTriples))
    }

    /// A Turtle document with the model prefixes declared.
    pub fn to_turtle(&self) -> Result<String, CodecError> {
        let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle);
        for (prefix, iri) in vocab::PREFIXES {
            serializer = serializer
                .with_prefix(*prefix, *iri)
                .map_err(|e| CodecError::Encode {
                    message: e.to_string(),
                })?;
        }
        encode(self, serializer)
    }
}

fn encode(triples: &TripleSet, serializer: RdfSerializer) -> Result<String, CodecError> {
    let mut writer = serializer.for_writer(Vec::new());
    for triple in triples {
        writer
            .serialize_quad(&to_quad(triple)?)
            .map_err(|e| CodecError::Encode {
                message: e.to_string(),
            })?;
    }
    let bytes = writer.finish().map_err(|e| CodecError::Encode {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| CodecError::Encode {
        message: e.to_string(),
    })
}

fn named(iri: &str) -> Result<ox::NamedNode, CodecError> {
    ox::NamedNode::new(iri).map_err(|e| CodecError::Encode {
        message: format!("<{iri}>: {e}"),
    })
}

fn blank(id: &str) -> Result<ox::BlankNode, CodecError> {
    ox::BlankNode::new(id).map_err(|e| CodecError::Encode {
        message: format!("_:{id}: {e}"),
    })
}

fn to_quad(triple: &Triple) -> Result<Quad, CodecError> {
    let subject: NamedOrBlankNode = match &triple.subject {
        Subject::Iri(iri) => named(iri)?.into(),
        Subject::Blank(id) => blank(id)?.into(),
    };
    let object: ox::Term = match &triple.object {
        Term::Iri(iri) => named(iri)?.into(),
        Term::Blank(id) => blank(id)?.into(),
        Term::Literal(literal) => to_literal(literal).into(),
    };
    Ok(Quad::new(
        subject,
        named(&triple.predicate)?,
        object,
        GraphName::DefaultGraph,
    ))
}

fn to_literal(literal: &Literal) -> ox::Literal {
    match literal.kind() {
        LiteralKind::String => ox::Literal::new_simple_literal(literal.lexical()),
        kind => ox::Literal::new_typed_literal(
            literal.lexical(),
            ox::NamedNode::new_unchecked(kind.datatype()),
        ),
    }
}

fn from_quad(quad: Quad) -> Triple {
    let subject = match quad.subject {
        NamedOrBlankNode::NamedNode(n) => Subject::Iri(n.into_string()),
        NamedOrBlankNode::BlankNode(b) => Subject::Blank(b.as_str().to_string()),
    };
    let object = match quad.object {
        ox::Term::NamedNode(n) => Term::Iri(n.into_string()),
        ox::Term::BlankNode(b) => Term::Blank(b.as_str().to_string()),
        ox::Term::Literal(l) => Term::Literal(from_literal(&l)),
    };
    Triple {
        subject,
        predicate: quad.predicate.into_string(),
        object,
    }
}

pub(crate) fn from_literal(literal: &ox::Literal) -> Literal {
    let kind = if literal.language().is_some() {
        LiteralKind::String
    } else {
        LiteralKind::from_datatype(literal.datatype().as_str())
    };
    Literal::new(kind, literal.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{model, rdf};

    fn sample() -> TripleSet {
        let c1 = Subject::iri("http://ex.org/c1").unwrap();
        [
            Triple::new(
                c1.clone(),
                rdf::TYPE,
                Term::Iri(model("Connection")),
            ),
            Triple::new(c1.clone(), model("host"), Literal::string("mqtt \"edge\"")),
            Triple::new(c1.clone(), model("port"), Literal::integer(1883)),
            Triple::new(c1, model("isConnected"), Literal::boolean(true)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn ntriples_is_reparsable() {
        let triples = sample();
        let text = triples.to_ntriples().unwrap();
        assert_eq!(text.lines().count(), 4);
        assert_eq!(TripleSet::parse_turtle(&text).unwrap(), triples);
    }

    #[test]
    fn turtle_uses_prefixes() {
        let text = sample().to_turtle().unwrap();
        assert!(text.contains("@prefix sindit:"));
        assert!(text.contains("sindit:host"));
        assert_eq!(TripleSet::parse_turtle(&text).unwrap(), sample());
    }

    #[test]
    fn datatypes_fold_into_kinds() {
        let doc = r#"
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            <http://ex.org/p> <http://ex.org/v> "2.5"^^xsd:float ;
                <http://ex.org/t> "2024-01-01T00:00:00Z"^^xsd:dateTimeStamp ;
                <http://ex.org/l> "Pumpe"@de .
        "#;
        let triples = TripleSet::parse_turtle(doc).unwrap();
        let kinds: Vec<_> = triples
            .iter()
            .filter_map(|t| match &t.object {
                Term::Literal(l) => Some(l.kind()),
                _ => None,
            })
            .collect();
        assert!(kinds.contains(&LiteralKind::Float));
        assert!(kinds.contains(&LiteralKind::Timestamp));
        assert!(kinds.contains(&LiteralKind::String));
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(matches!(
            TripleSet::parse_turtle("<http://ex.org/a> <http://ex.org/b> ."),
            Err(CodecError::Parse { .. })
        ));
    }
}
