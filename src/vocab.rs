//! Well-known IRIs used by the node model, the codec, and the connector queries.

/// Expand a local name into a `'static` model-namespace IRI.
macro_rules! model_iri {
    ($local:literal) => {
        concat!("urn:samm:sindit.sintef.no:1.0.0#", $local)
    };
}
pub(crate) use model_iri;

/// W3C namespaces.
pub mod ns {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// Asset model vocabulary: classes and attribute predicates.
    pub const MODEL: &str = "urn:samm:sindit.sintef.no:1.0.0#";
    /// Default base namespace for workspaces (named graphs).
    pub const WORKSPACE: &str = "http://sindit.sintef.no/2.0#";
    /// SAMM meta model.
    pub const SAMM: &str = "urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#";
    /// SAMM unit catalogue.
    pub const SAMM_UNIT: &str = "urn:samm:org.eclipse.esmf.samm:unit:2.1.0#";
}

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DATE_TIME_STAMP: &str = "http://www.w3.org/2001/XMLSchema#dateTimeStamp";
}

pub mod samm {
    pub const UNIT: &str = "urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#Unit";
    pub const PREFERRED_NAME: &str = "urn:samm:org.eclipse.esmf.samm:meta-model:2.1.0#preferredName";
    pub const SYMBOL: &str = "urn:samm:org.eclipse.esmf.samm:unit:2.1.0#symbol";
    pub const CODE: &str = "urn:samm:org.eclipse.esmf.samm:unit:2.1.0#code";
}

/// Prefix table used when rendering Turtle.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", ns::RDF),
    ("rdfs", ns::RDFS),
    ("xsd", ns::XSD),
    ("sindit", ns::MODEL),
    ("kg", ns::WORKSPACE),
];

/// Build a model-namespace IRI from a local name.
pub fn model(local: &str) -> String {
    format!("{}{local}", ns::MODEL)
}
