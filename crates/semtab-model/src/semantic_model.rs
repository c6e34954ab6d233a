//! Semantic models: directed graphs mapping table columns onto an ontology.
//!
//! Nodes are classes, data nodes bound to a column, or literal values; edges
//! are ontology properties. The graph is a [`StableDiGraph`], so node and
//! edge handles stay valid while other nodes/edges are removed.

use crate::error::{ModelError, Result};
use crate::namespace::Namespace;
use petgraph::algo::is_cyclic_directed;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type NodeId = NodeIndex;
pub type EdgeId = EdgeIndex;

pub const SEMANTIC_MODEL_RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    pub abs_uri: String,
    pub rel_uri: String,
    #[serde(default)]
    pub approximation: bool,
    #[serde(default)]
    pub readable_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    pub col_index: usize,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LiteralNodeDataType {
    #[default]
    #[serde(rename = "string")]
    String,
    #[serde(rename = "entity-id")]
    Entity,
}

impl LiteralNodeDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiteralNodeDataType::String => "string",
            LiteralNodeDataType::Entity => "entity-id",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(LiteralNodeDataType::String),
            "entity-id" => Some(LiteralNodeDataType::Entity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralNode {
    pub value: String,
    #[serde(default)]
    pub readable_label: Option<String>,
    #[serde(default)]
    pub is_in_context: bool,
    #[serde(default)]
    pub datatype: LiteralNodeDataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Class(ClassNode),
    Data(DataNode),
    Literal(LiteralNode),
}

impl Node {
    pub fn is_class_node(&self) -> bool {
        matches!(self, Node::Class(_))
    }

    pub fn is_data_node(&self) -> bool {
        matches!(self, Node::Data(_))
    }

    pub fn as_class(&self) -> Option<&ClassNode> {
        match self {
            Node::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataNode> {
        match self {
            Node::Data(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub abs_uri: String,
    pub rel_uri: String,
    #[serde(default)]
    pub approximation: bool,
    #[serde(default)]
    pub readable_label: Option<String>,
}

impl Edge {
    pub fn new(abs_uri: impl Into<String>, rel_uri: impl Into<String>) -> Self {
        Self {
            abs_uri: abs_uri.into(),
            rel_uri: rel_uri.into(),
            approximation: false,
            readable_label: None,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: usize,
    #[serde(flatten)]
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: usize,
    pub target: usize,
    #[serde(flatten)]
    pub edge: Edge,
}

/// JSON shape of a semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticModelRecord {
    pub version: u32,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

/// Node of a hand-written model whose URIs are prefixed names (`p:local`).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrefixedNodeRecord {
    Class {
        id: usize,
        uri: String,
        #[serde(default)]
        approximation: bool,
        #[serde(default)]
        readable_label: Option<String>,
    },
    Data {
        id: usize,
        col_index: usize,
        #[serde(default)]
        label: String,
    },
    Literal {
        id: usize,
        value: String,
        #[serde(default)]
        readable_label: Option<String>,
        #[serde(default)]
        is_in_context: bool,
        #[serde(default)]
        datatype: LiteralNodeDataType,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixedEdgeRecord {
    pub source: usize,
    pub target: usize,
    pub uri: String,
    #[serde(default)]
    pub approximation: bool,
    #[serde(default)]
    pub readable_label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixedModelRecord {
    pub nodes: Vec<PrefixedNodeRecord>,
    #[serde(default)]
    pub edges: Vec<PrefixedEdgeRecord>,
}

// ============================================================================
// Graph
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    graph: StableDiGraph<Node, Edge>,
}

impl SemanticModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.graph.add_node(node)
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId, edge: Edge) -> Result<EdgeId> {
        for id in [source, target] {
            if !self.graph.contains_node(id) {
                return Err(ModelError::DanglingNode(id.index()));
            }
        }
        Ok(self.graph.add_edge(source, target, edge))
    }

    /// Removes the node and every edge touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.graph.remove_node(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        self.graph.remove_edge(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node_weight(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.graph.edge_weight(id)
    }

    /// `(source, target)` of an edge.
    pub fn edge_endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.graph.edge_endpoints(id)
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_indices().collect()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.graph
            .node_indices()
            .filter_map(move |id| self.graph.node_weight(id).map(|n| (id, n)))
    }

    /// `(edge, source, target, weight)` for every edge.
    pub fn iter_edges(&self) -> impl Iterator<Item = (EdgeId, NodeId, NodeId, &Edge)> {
        self.graph.edge_indices().filter_map(move |id| {
            let (source, target) = self.graph.edge_endpoints(id)?;
            Some((id, source, target, self.graph.edge_weight(id)?))
        })
    }

    pub fn incoming_edges(&self, id: NodeId) -> Vec<EdgeId> {
        self.graph
            .edges_directed(id, Direction::Incoming)
            .map(|e| e.id())
            .collect()
    }

    pub fn outgoing_edges(&self, id: NodeId) -> Vec<EdgeId> {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .map(|e| e.id())
            .collect()
    }

    pub fn in_degree(&self, id: NodeId) -> usize {
        self.graph.edges_directed(id, Direction::Incoming).count()
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.graph.edges_directed(id, Direction::Outgoing).count()
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.in_degree(id) + self.out_degree(id)
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Record with nodes numbered by iteration order.
    pub fn to_record(&self) -> SemanticModelRecord {
        let mut positions: HashMap<NodeId, usize> = HashMap::new();
        let mut nodes = Vec::with_capacity(self.num_nodes());
        for (pos, (id, node)) in self.iter_nodes().enumerate() {
            positions.insert(id, pos);
            nodes.push(NodeRecord {
                id: pos,
                node: node.clone(),
            });
        }
        let edges = self
            .iter_edges()
            .map(|(_, source, target, edge)| EdgeRecord {
                source: positions[&source],
                target: positions[&target],
                edge: edge.clone(),
            })
            .collect();
        SemanticModelRecord {
            version: SEMANTIC_MODEL_RECORD_VERSION,
            nodes,
            edges,
        }
    }

    pub fn from_record(record: SemanticModelRecord) -> Result<Self> {
        if record.version != SEMANTIC_MODEL_RECORD_VERSION {
            return Err(ModelError::UnknownVersion {
                kind: "semantic model",
                version: record.version.to_string(),
            });
        }
        let mut sm = SemanticModel::new();
        let mut ids: HashMap<usize, NodeId> = HashMap::with_capacity(record.nodes.len());
        for rec in record.nodes {
            let id = sm.add_node(rec.node);
            ids.insert(rec.id, id);
        }
        for rec in record.edges {
            let source = *ids.get(&rec.source).ok_or(ModelError::DanglingNode(rec.source))?;
            let target = *ids.get(&rec.target).ok_or(ModelError::DanglingNode(rec.target))?;
            sm.add_edge(source, target, rec.edge)?;
        }
        Ok(sm)
    }

    /// Build a model from a hand-written record, expanding prefixed URIs
    /// through `ns`.
    pub fn from_prefixed_record(record: PrefixedModelRecord, ns: &Namespace) -> Result<Self> {
        let mut sm = SemanticModel::new();
        let mut ids: HashMap<usize, NodeId> = HashMap::with_capacity(record.nodes.len());
        for rec in record.nodes {
            let (rec_id, node) = match rec {
                PrefixedNodeRecord::Class {
                    id,
                    uri,
                    approximation,
                    readable_label,
                } => (
                    id,
                    Node::Class(ClassNode {
                        abs_uri: ns.get_abs_uri(&uri)?,
                        rel_uri: uri,
                        approximation,
                        readable_label,
                    }),
                ),
                PrefixedNodeRecord::Data {
                    id,
                    col_index,
                    label,
                } => (id, Node::Data(DataNode { col_index, label })),
                PrefixedNodeRecord::Literal {
                    id,
                    value,
                    readable_label,
                    is_in_context,
                    datatype,
                } => (
                    id,
                    Node::Literal(LiteralNode {
                        value,
                        readable_label,
                        is_in_context,
                        datatype,
                    }),
                ),
            };
            ids.insert(rec_id, sm.add_node(node));
        }
        for rec in record.edges {
            let source = *ids.get(&rec.source).ok_or(ModelError::DanglingNode(rec.source))?;
            let target = *ids.get(&rec.target).ok_or(ModelError::DanglingNode(rec.target))?;
            let edge = Edge {
                abs_uri: ns.get_abs_uri(&rec.uri)?,
                rel_uri: rec.uri,
                approximation: rec.approximation,
                readable_label: rec.readable_label,
            };
            sm.add_edge(source, target, edge)?;
        }
        Ok(sm)
    }
}

impl PartialEq for SemanticModel {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl Serialize for SemanticModel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SemanticModel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = SemanticModelRecord::deserialize(deserializer)?;
        SemanticModel::from_record(record).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn city_model() -> SemanticModel {
        let mut sm = SemanticModel::new();
        let city = sm.add_node(Node::Class(ClassNode {
            abs_uri: "http://www.wikidata.org/entity/Q515".into(),
            rel_uri: "wd:Q515".into(),
            approximation: false,
            readable_label: Some("city".into()),
        }));
        let name = sm.add_node(Node::Data(DataNode {
            col_index: 0,
            label: "City".into(),
        }));
        let country = sm.add_node(Node::Data(DataNode {
            col_index: 1,
            label: "Country".into(),
        }));
        sm.add_edge(city, name, Edge::new("http://www.w3.org/2000/01/rdf-schema#label", "rdfs:label"))
            .unwrap();
        sm.add_edge(city, country, Edge::new("http://www.wikidata.org/prop/direct/P17", "wdt:P17"))
            .unwrap();
        sm
    }

    #[test]
    fn degrees_and_neighbourhood() {
        let sm = city_model();
        let (city, _) = sm.iter_nodes().find(|(_, n)| n.is_class_node()).unwrap();
        assert_eq!(sm.out_degree(city), 2);
        assert_eq!(sm.in_degree(city), 0);
        assert_eq!(sm.outgoing_edges(city).len(), 2);
        assert!(!sm.has_cycle());
    }

    #[test]
    fn record_round_trip() {
        let sm = city_model();
        let value = serde_json::to_value(&sm).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["nodes"][0]["type"], "class");
        assert_eq!(value["nodes"][1]["col_index"], 0);
        let back: SemanticModel = serde_json::from_value(value).unwrap();
        assert_eq!(back, sm);
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let value = json!({
            "version": 1,
            "nodes": [{"id": 0, "type": "data", "col_index": 0, "label": "a"}],
            "edges": [{"source": 0, "target": 7, "abs_uri": "x", "rel_uri": "x"}]
        });
        assert!(serde_json::from_value::<SemanticModel>(value).is_err());
    }

    #[test]
    fn remove_node_drops_incident_edges() {
        let mut sm = city_model();
        let (city, _) = sm.iter_nodes().find(|(_, n)| n.is_class_node()).unwrap();
        sm.remove_node(city);
        assert_eq!(sm.num_nodes(), 2);
        assert_eq!(sm.num_edges(), 0);
    }

    #[test]
    fn cycle_detection() {
        let mut sm = city_model();
        let ids = sm.node_ids();
        sm.add_edge(ids[1], ids[0], Edge::new("http://example.org/back", "ex:back"))
            .unwrap();
        assert!(sm.has_cycle());
    }
}
