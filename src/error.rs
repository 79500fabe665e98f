//! Rich diagnostic error types for the asset knowledge-graph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. [`KgError::kind`] folds
//! every variant into the small set of [`ErrorKind`]s callers branch on.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::workspace::WorkspaceError;

/// Top-level error type for the engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of failures, stable across subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced node has no stored triples.
    NotFound,
    /// A node's stored class disagrees with the class being written, or a
    /// class identifier is not registered.
    TypeMismatch,
    /// Input is malformed: bad identifiers, unknown attributes, missing uri.
    Validation,
    /// The store cannot be reached.
    StoreUnavailable,
    /// The store answered but refused or failed the request.
    StoreRejected,
    /// A value cannot be expressed as a literal or reference.
    Coercion,
}

impl KgError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Value(e) => e.kind(),
            Self::Codec(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Connector(e) => e.kind(),
            Self::Workspace(_) | Self::Config(_) => ErrorKind::Validation,
        }
    }
}

// ---------------------------------------------------------------------------
// Value errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValueError {
    #[error("cannot coerce {found} into a literal or reference")]
    #[diagnostic(
        code(kg::value::coercion),
        help(
            "Attribute values must be strings, numbers, booleans, timestamps, \
             references (`{{\"uri\": ...}}`), nodes, or flat lists of those."
        )
    )]
    Coercion { found: String },

    #[error("invalid identifier \"{identifier}\": {message}")]
    #[diagnostic(
        code(kg::value::invalid_identifier),
        help("Identifiers must be absolute IRIs (e.g. `http://example.org/x`) or blank ids (`_:b0`).")
    )]
    InvalidIdentifier { identifier: String, message: String },
}

impl ValueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Coercion { .. } => ErrorKind::Coercion,
            Self::InvalidIdentifier { .. } => ErrorKind::Validation,
        }
    }
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    #[error("attribute \"{attribute}\" is not defined for class {class}")]
    #[diagnostic(
        code(kg::codec::unknown_attribute),
        help("Check the attribute name against the class's attribute map, including inherited attributes.")
    )]
    UnknownAttribute { class: String, attribute: String },

    #[error("attribute \"{attribute}\" cannot hold {found}")]
    #[diagnostic(
        code(kg::codec::coercion),
        help(
            "Multi-valued attributes and bidirectional predicates only accept references \
             (nodes, IRIs, blank ids); literals belong on scalar attributes."
        )
    )]
    Coercion { attribute: String, found: String },

    #[error("class {class} is not registered")]
    #[diagnostic(
        code(kg::codec::unregistered_class),
        help("Only classes known to the ClassRegistry can be materialized or loaded.")
    )]
    UnregisteredClass { class: String },

    #[error("no rdf:type resolvable for {uri}")]
    #[diagnostic(
        code(kg::codec::unresolved_type),
        help("The triple set has no type statement for this node; supply the class explicitly or check the uri.")
    )]
    UnresolvedType { uri: String },

    #[error("node {uri} is absent from the triple set")]
    #[diagnostic(
        code(kg::codec::node_absent),
        help("The requested node has no triples; it may not exist in the active graph.")
    )]
    NodeAbsent { uri: String },

    #[error("malformed RDF: {message}")]
    #[diagnostic(
        code(kg::codec::parse),
        help("The store returned a payload that is not valid Turtle/N-Triples.")
    )]
    Parse { message: String },

    #[error("cannot encode triple set: {message}")]
    #[diagnostic(code(kg::codec::encode), help("A term in the triple set is not a valid RDF term."))]
    Encode { message: String },
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAttribute { .. } | Self::Encode { .. } => ErrorKind::Validation,
            Self::Coercion { .. } => ErrorKind::Coercion,
            Self::UnregisteredClass { .. } | Self::UnresolvedType { .. } => ErrorKind::TypeMismatch,
            Self::NodeAbsent { .. } => ErrorKind::NotFound,
            Self::Parse { .. } => ErrorKind::StoreRejected,
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("triple store at {endpoint} is unreachable: {message}")]
    #[diagnostic(
        code(kg::store::unavailable),
        help("Check that the triple store is running and that the configured url and repository are correct.")
    )]
    Unavailable { endpoint: String, message: String },

    #[error("triple store did not become available after {attempts} attempts")]
    #[diagnostic(
        code(kg::store::connect_exhausted),
        help("Raise `connect.max_attempts` or remove it to wait indefinitely.")
    )]
    ConnectExhausted { attempts: u32 },

    #[error("triple store rejected the request (status {status}): {message}")]
    #[diagnostic(
        code(kg::store::rejected),
        help("The store reported a failure; the message above is the store's own explanation.")
    )]
    Rejected { status: u16, message: String },

    #[error("invalid query: {message}")]
    #[diagnostic(code(kg::store::invalid_query), help("The generated query could not be parsed by the store."))]
    InvalidQuery { message: String },

    #[error("malformed result set: {message}")]
    #[diagnostic(
        code(kg::store::results),
        help("Tabular reads expect SPARQL 1.1 JSON results (`application/sparql-results+json`).")
    )]
    Results { message: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } | Self::ConnectExhausted { .. } => ErrorKind::StoreUnavailable,
            Self::Rejected { .. } | Self::InvalidQuery { .. } | Self::Results { .. } => {
                ErrorKind::StoreRejected
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connector errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConnectorError {
    #[error("node {uri} not found in graph {graph}")]
    #[diagnostic(
        code(kg::connector::not_found),
        help("Check the uri and the active graph (`asset-kg graph get`).")
    )]
    NotFound { uri: String, graph: String },

    #[error("node {uri} is stored as {stored} but is being written as {written}")]
    #[diagnostic(
        code(kg::connector::type_mismatch),
        help("A node's class cannot change through save; delete it first if the change is intended.")
    )]
    TypeMismatch {
        uri: String,
        stored: String,
        written: String,
    },

    #[error("write rejected by the store: {message}")]
    #[diagnostic(
        code(kg::connector::write_rejected),
        help("The store refused the update; nothing after the failing step was applied.")
    )]
    WriteRejected { message: String },

    #[error("invalid request: {message}")]
    #[diagnostic(code(kg::connector::validation), help("{hint}"))]
    Validation { message: String, hint: String },
}

impl ConnectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::WriteRejected { .. } => ErrorKind::StoreRejected,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    pub(crate) fn validation(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: hint.into(),
        }
    }
}

/// Convenience alias for engine results.
pub type KgResult<T> = std::result::Result<T, KgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_fold_through_wrapper() {
        let err: KgError = ConnectorError::NotFound {
            uri: "http://x/a".into(),
            graph: "http://x/g".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: KgError = StoreError::Unavailable {
            endpoint: "http://localhost:7200".into(),
            message: "connection refused".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

        let err: KgError = CodecError::Coercion {
            attribute: "assets".into(),
            found: "a string literal".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Coercion);
    }

    #[test]
    fn diagnostic_codes_are_namespaced() {
        let err = StoreError::Rejected {
            status: 400,
            message: "MALFORMED QUERY".into(),
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("kg::store::rejected"));
    }
}
