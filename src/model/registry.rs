//! Class registry: which `rdf:type` identifiers may be materialized.

use std::collections::BTreeMap;

use super::NodeClass;

/// Maps class identifiers to the node classes the codec may build.
///
/// The codec only materializes nodes whose `rdf:type` resolves here; anything
/// else is left as a plain reference.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<&'static str, NodeClass>,
}

impl ClassRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Asset-side classes: connections, properties, assets, the root graph.
    pub fn nodes() -> Self {
        Self::from_classes(
            NodeClass::ALL
                .iter()
                .copied()
                .filter(|c| *c != NodeClass::Base && !c.is_relationship()),
        )
    }

    /// Relationship classes.
    pub fn relationships() -> Self {
        Self::from_classes(NodeClass::ALL.iter().copied().filter(|c| c.is_relationship()))
    }

    /// Every materializable class (nodes and relationships).
    pub fn standard() -> Self {
        let mut registry = Self::nodes();
        registry.extend(&Self::relationships());
        registry
    }

    pub fn from_classes(classes: impl IntoIterator<Item = NodeClass>) -> Self {
        let mut registry = Self::empty();
        for class in classes {
            registry.register(class);
        }
        registry
    }

    pub fn register(&mut self, class: NodeClass) {
        self.classes.insert(class.iri(), class);
    }

    pub fn extend(&mut self, other: &ClassRegistry) {
        self.classes.extend(other.classes.iter().map(|(k, v)| (*k, *v)));
    }

    /// Resolve a class identifier.
    pub fn resolve(&self, iri: &str) -> Option<NodeClass> {
        self.classes.get(iri).copied()
    }

    pub fn contains(&self, class: NodeClass) -> bool {
        self.classes.contains_key(class.iri())
    }

    /// Registered classes, ordered by identifier.
    pub fn classes(&self) -> impl Iterator<Item = NodeClass> + '_ {
        self.classes.values().copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_is_nodes_plus_relationships() {
        let nodes = ClassRegistry::nodes();
        let rels = ClassRegistry::relationships();
        let all = ClassRegistry::standard();
        assert_eq!(all.len(), nodes.len() + rels.len());
        assert!(!all.contains(NodeClass::Base));
        assert_eq!(rels.len(), 11);
        assert!(nodes.contains(NodeClass::RootGraph));
    }

    #[test]
    fn resolve_by_identifier() {
        let registry = ClassRegistry::standard();
        assert_eq!(
            registry.resolve(NodeClass::Connection.iri()),
            Some(NodeClass::Connection)
        );
        assert_eq!(registry.resolve("http://example.org/Unknown"), None);
    }
}
