//! Workspaces: the named graph every connector operation is scoped to.
//!
//! The active graph is process state shared by all threads using one
//! connector. Identifiers that are not absolute IRIs are resolved against the
//! configured base namespace, so `plant-a` becomes `<base>plant-a`.

use std::sync::RwLock;

use miette::Diagnostic;
use oxigraph::model::NamedNode;
use thiserror::Error;

use crate::config::GraphConfig;

/// Errors from workspace selection.
#[derive(Debug, Error, Diagnostic)]
pub enum WorkspaceError {
    #[error("invalid graph identifier \"{identifier}\": {message}")]
    #[diagnostic(
        code(kg::workspace::invalid_graph),
        help(
            "Use an absolute IRI (`http://…`, `urn:…`) or a name that forms a valid IRI \
             when appended to the base namespace (no spaces or angle brackets)."
        )
    )]
    InvalidGraph { identifier: String, message: String },
}

pub type WorkspaceResult<T> = std::result::Result<T, WorkspaceError>;

/// The active named graph plus the namespace used to resolve short names.
#[derive(Debug)]
pub struct Workspace {
    base_namespace: String,
    active: RwLock<String>,
}

impl Workspace {
    pub fn new(config: &GraphConfig) -> WorkspaceResult<Self> {
        let base_namespace = config.base_namespace.clone();
        let active = resolve_against(&base_namespace, &config.default_graph)?;
        Ok(Self {
            base_namespace,
            active: RwLock::new(active),
        })
    }

    pub fn base_namespace(&self) -> &str {
        &self.base_namespace
    }

    /// Resolve an identifier without changing the active graph.
    pub fn resolve(&self, identifier: &str) -> WorkspaceResult<String> {
        resolve_against(&self.base_namespace, identifier)
    }

    /// The active graph identifier.
    pub fn active(&self) -> String {
        self.active
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Switch the active graph; returns the resolved identifier.
    ///
    /// An invalid identifier leaves the active graph unchanged.
    pub fn set_active(&self, identifier: &str) -> WorkspaceResult<String> {
        let resolved = self.resolve(identifier)?;
        let mut active = self
            .active
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::info!(from = %*active, to = %resolved, "switching active graph");
        *active = resolved.clone();
        Ok(resolved)
    }
}

fn resolve_against(base: &str, identifier: &str) -> WorkspaceResult<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(WorkspaceError::InvalidGraph {
            identifier: identifier.to_string(),
            message: "identifier is empty".into(),
        });
    }
    if let Ok(absolute) = NamedNode::new(identifier) {
        return Ok(absolute.into_string());
    }
    NamedNode::new(format!("{base}{identifier}"))
        .map(NamedNode::into_string)
        .map_err(|e| WorkspaceError::InvalidGraph {
            identifier: identifier.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::new(&GraphConfig::default()).unwrap()
    }

    #[test]
    fn starts_on_default_graph() {
        assert_eq!(
            workspace().active(),
            "http://sindit.sintef.no/2.0#DefaultGraph"
        );
    }

    #[test]
    fn short_names_get_the_base_namespace() {
        let ws = workspace();
        assert_eq!(
            ws.set_active("plant-a").unwrap(),
            "http://sindit.sintef.no/2.0#plant-a"
        );
        assert_eq!(ws.active(), "http://sindit.sintef.no/2.0#plant-a");
    }

    #[test]
    fn absolute_identifiers_are_kept() {
        let ws = workspace();
        assert_eq!(
            ws.set_active("urn:graph:line-7").unwrap(),
            "urn:graph:line-7"
        );
        assert_eq!(
            ws.set_active("https://example.org/g").unwrap(),
            "https://example.org/g"
        );
    }

    #[test]
    fn invalid_identifier_keeps_previous_graph() {
        let ws = workspace();
        ws.set_active("plant-a").unwrap();
        assert!(ws.set_active("has space").is_err());
        assert!(ws.set_active("  ").is_err());
        assert!(ws.set_active("<bad>").is_err());
        assert_eq!(ws.active(), "http://sindit.sintef.no/2.0#plant-a");
    }
}
