//! Semtab data model
//!
//! In-memory representation of tables annotated with semantic models:
//!
//! - [`EntityId`] / [`Link`]: knowledge-graph entities linked from cell text
//! - [`Context`]: the page a table was extracted from
//! - [`ColumnBasedTable`]: column-major cell values
//! - [`FullTable`]: table + context + a per-cell [`Matrix`] of links
//! - [`SemanticModel`]: class/data/literal nodes joined by property edges
//! - [`Namespace`] / [`KgNamespaceRegistry`]: URI prefixes and knowledge graphs
//!
//! Every persisted type serializes to its current record version and
//! accepts the older versions it has shipped with.

pub mod context;
pub mod error;
pub mod full_table;
pub mod link;
pub mod matrix;
pub mod namespace;
pub mod semantic_model;
pub mod table;

pub use context::{ContentHierarchy, Context};
pub use error::{ModelError, Result};
pub use full_table::{Example, FullTable, Sampleable};
pub use link::{EntityId, Link, DBPEDIA, WIKIDATA};
pub use matrix::Matrix;
pub use namespace::{KgNamespaceRegistry, KnowledgeGraphNamespace, Namespace};
pub use semantic_model::{
    ClassNode, DataNode, Edge, EdgeId, LiteralNode, LiteralNodeDataType, Node, NodeId,
    PrefixedModelRecord, SemanticModel, SemanticModelRecord,
};
pub use table::{Column, ColumnBasedTable};
