//! The concrete class hierarchy and its attribute tables.
//!
//! Every table lists only the attributes a class adds; inherited attributes
//! come from [`NodeClass::parent`] and `label` is shared by all classes.

use super::{AttributeSpec, NodeClass};
use crate::vocab::{model_iri, rdfs};

pub(super) const LABEL: AttributeSpec = AttributeSpec::scalar("label", rdfs::LABEL);

const CONNECTION: &[AttributeSpec] = &[
    AttributeSpec::scalar("type", model_iri!("type")),
    AttributeSpec::scalar("host", model_iri!("host")),
    AttributeSpec::scalar("port", model_iri!("port")),
    AttributeSpec::scalar("username", model_iri!("username")),
    AttributeSpec::scalar("passwordPath", model_iri!("passwordPath")),
    AttributeSpec::scalar("tokenPath", model_iri!("tokenPath")),
    AttributeSpec::scalar("isConnected", model_iri!("isConnected")),
    AttributeSpec::scalar("connectionDescription", model_iri!("connectionDescription")),
    AttributeSpec::json("configuration", model_iri!("configuration")),
];

const ASSET_PROPERTY: &[AttributeSpec] = &[
    AttributeSpec::scalar("propertyUnit", model_iri!("propertyUnit")),
    AttributeSpec::scalar("propertySemanticID", model_iri!("propertySemanticID")),
    AttributeSpec::scalar("propertyDescription", model_iri!("propertyDescription")),
    AttributeSpec::scalar("propertyDataType", model_iri!("propertyDataType")),
    AttributeSpec::scalar("propertyValue", model_iri!("propertyValue")),
    AttributeSpec::scalar("propertyName", model_iri!("propertyName")),
    AttributeSpec::scalar("propertyValueTimestamp", model_iri!("propertyValueTimestamp")),
    AttributeSpec::scalar("propertyConnection", model_iri!("propertyConnection")),
];

const DATABASE_PROPERTY: &[AttributeSpec] = &[
    AttributeSpec::scalar("query", model_iri!("query")),
    AttributeSpec::json("propertyIdentifiers", model_iri!("propertyIdentifiers")),
];

const STREAMING_PROPERTY: &[AttributeSpec] = &[
    AttributeSpec::scalar("streamingTopic", model_iri!("streamingTopic")),
    AttributeSpec::scalar("streamingPath", model_iri!("streamingPath")),
];

const TIMESERIES_PROPERTY: &[AttributeSpec] = &[
    AttributeSpec::json("timeseriesIdentifiers", model_iri!("timeseriesIdentifiers")),
    AttributeSpec::scalar("timeseriesRetrievalMethod", model_iri!("timeseriesRetrievalMethod")),
    AttributeSpec::json("timeseriesTags", model_iri!("timeseriesTags")),
];

const FILE: &[AttributeSpec] = &[
    AttributeSpec::scalar("fileType", model_iri!("fileType")),
    AttributeSpec::scalar("filePath", model_iri!("filePath")),
];

const S3_OBJECT_PROPERTY: &[AttributeSpec] = &[
    AttributeSpec::scalar("bucket", model_iri!("bucket")),
    AttributeSpec::scalar("key", model_iri!("key")),
    AttributeSpec::scalar("expiration", model_iri!("expiration")),
];

const ASSET: &[AttributeSpec] = &[
    AttributeSpec::scalar("assetDescription", model_iri!("assetDescription")),
    AttributeSpec::multi("assetProperties", model_iri!("assetProperties")),
];

const ROOT_GRAPH: &[AttributeSpec] = &[
    AttributeSpec::multi("assets", model_iri!("assets")),
    AttributeSpec::multi("dataConnections", model_iri!("dataConnections")),
];

const RELATIONSHIP: &[AttributeSpec] = &[
    AttributeSpec::bidirectional(
        "relationshipSource",
        model_iri!("relationshipSource"),
        model_iri!("sourceOfRelationship"),
    ),
    AttributeSpec::bidirectional(
        "relationshipTarget",
        model_iri!("relationshipTarget"),
        model_iri!("targetOfRelationship"),
    ),
    AttributeSpec::scalar("relationshipDescription", model_iri!("relationshipDescription")),
];

impl NodeClass {
    /// Every class, in declaration order.
    pub const ALL: &'static [NodeClass] = &[
        Self::Base,
        Self::Connection,
        Self::AbstractAssetProperty,
        Self::DatabaseProperty,
        Self::StreamingProperty,
        Self::TimeseriesProperty,
        Self::File,
        Self::S3ObjectProperty,
        Self::AbstractAsset,
        Self::RootGraph,
        Self::AbstractRelationship,
        Self::ConsistOf,
        Self::PartOf,
        Self::ConnectedTo,
        Self::DependsOn,
        Self::DerivedFrom,
        Self::Monitors,
        Self::Controls,
        Self::Simulates,
        Self::Uses,
        Self::CommunicatesWith,
    ];

    /// Class identifier written as the node's `rdf:type`.
    pub fn iri(self) -> &'static str {
        match self {
            Self::Base => model_iri!("RDFModel"),
            Self::Connection => model_iri!("Connection"),
            Self::AbstractAssetProperty => model_iri!("AbstractAssetProperty"),
            Self::DatabaseProperty => model_iri!("DatabaseProperty"),
            Self::StreamingProperty => model_iri!("StreamingProperty"),
            Self::TimeseriesProperty => model_iri!("TimeseriesProperty"),
            Self::File => model_iri!("File"),
            Self::S3ObjectProperty => model_iri!("S3ObjectProperty"),
            Self::AbstractAsset => model_iri!("AbstractAsset"),
            Self::RootGraph => model_iri!("SINDITKG"),
            Self::AbstractRelationship => model_iri!("AbstractRelationship"),
            Self::ConsistOf => model_iri!("ConsistOfRelationship"),
            Self::PartOf => model_iri!("PartOfRelationship"),
            Self::ConnectedTo => model_iri!("ConnectedToRelationship"),
            Self::DependsOn => model_iri!("DependsOnRelationship"),
            Self::DerivedFrom => model_iri!("DerivedFromRelationship"),
            Self::Monitors => model_iri!("MonitorsRelationship"),
            Self::Controls => model_iri!("ControlsRelationship"),
            Self::Simulates => model_iri!("SimulatesRelationship"),
            Self::Uses => model_iri!("UsesRelationship"),
            Self::CommunicatesWith => model_iri!("CommunicatesWithRelationship"),
        }
    }

    /// Short name: the IRI's local part.
    pub fn name(self) -> &'static str {
        let iri = self.iri();
        iri.rsplit_once('#').map_or(iri, |(_, local)| local)
    }

    pub fn parent(self) -> Option<NodeClass> {
        match self {
            Self::Base | Self::AbstractRelationship => None,
            Self::Connection
            | Self::AbstractAssetProperty
            | Self::AbstractAsset
            | Self::RootGraph => None,
            Self::DatabaseProperty | Self::StreamingProperty | Self::S3ObjectProperty => {
                Some(Self::AbstractAssetProperty)
            }
            Self::TimeseriesProperty | Self::File => Some(Self::DatabaseProperty),
            Self::ConsistOf
            | Self::PartOf
            | Self::ConnectedTo
            | Self::DependsOn
            | Self::DerivedFrom
            | Self::Monitors
            | Self::Controls
            | Self::Simulates
            | Self::Uses
            | Self::CommunicatesWith => Some(Self::AbstractRelationship),
        }
    }

    /// Attributes declared by this class itself (excluding inherited ones).
    pub fn own_attributes(self) -> &'static [AttributeSpec] {
        match self {
            Self::Connection => CONNECTION,
            Self::AbstractAssetProperty => ASSET_PROPERTY,
            Self::DatabaseProperty => DATABASE_PROPERTY,
            Self::StreamingProperty => STREAMING_PROPERTY,
            Self::TimeseriesProperty => TIMESERIES_PROPERTY,
            Self::File => FILE,
            Self::S3ObjectProperty => S3_OBJECT_PROPERTY,
            Self::AbstractAsset => ASSET,
            Self::RootGraph => ROOT_GRAPH,
            Self::AbstractRelationship => RELATIONSHIP,
            _ => &[],
        }
    }

    pub fn is_relationship(self) -> bool {
        self == Self::AbstractRelationship || self.parent() == Some(Self::AbstractRelationship)
    }
}
