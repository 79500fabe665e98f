// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # asset-kg
//!
//! Persistence engine for an industrial-asset knowledge graph kept in a remote
//! SPARQL triple store.
//!
//! ## Architecture
//!
//! - **Values** (`value`): typed literals, identifiers and node references
//! - **Typed nodes** (`model`): a closed class hierarchy with declared attribute maps
//! - **Graph codec** (`codec`): nodes to triple sets and back, identity- and cycle-safe
//! - **Persistence port** (`store`): SPARQL over HTTP, or an embedded oxigraph store
//! - **Connector** (`connector`): load, save, update and delete scoped to a named graph
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use asset_kg::config::KgConfig;
//! use asset_kg::connector::KgConnector;
//! use asset_kg::model::{Node, NodeClass};
//!
//! let config = KgConfig::default();
//! let store = config.store.open().unwrap();
//! let kg = KgConnector::connect(store, &config).unwrap();
//!
//! let mut broker = Node::with_uri(NodeClass::Connection, "http://example.org/broker").unwrap();
//! broker.set("type", "MQTT").unwrap();
//! broker.set("host", "localhost").unwrap();
//! broker.set("port", 1883i64).unwrap();
//! kg.save(&broker).unwrap();
//!
//! let loaded = kg.load_by_uri("http://example.org/broker", None, 1).unwrap();
//! assert_eq!(loaded.root(), Some(&broker));
//! ```

pub mod codec;
pub mod config;
pub mod connector;
pub mod error;
pub mod model;
pub mod store;
pub mod value;
pub mod vocab;
pub mod workspace;

pub use connector::KgConnector;
pub use error::{ErrorKind, KgError, KgResult};
