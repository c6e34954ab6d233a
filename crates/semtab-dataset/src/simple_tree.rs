//! Compact tree-shaped YAML rendering of a semantic model.
//!
//! ```yaml
//! version: simple-tree-1
//! model:
//!   - type: wd:Q515
//!     props:
//!       rdfs:label: city            # column by name
//!       wdt:P1082: 2                # column by index
//!       wdt:P17:
//!         type: entity
//!         value: Q142
//! prefixes:
//!   rdfs: http://www.w3.org/2000/01/rdf-schema#
//! ```

use crate::error::{DatasetError, Result};
use semtab_model::{
    ClassNode, ColumnBasedTable, DataNode, Edge, LiteralNode, LiteralNodeDataType, ModelError,
    Namespace, Node, NodeId, SemanticModel,
};
use serde_yaml::{Mapping, Value as YamlValue};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const SIMPLE_TREE_VERSION: &str = "simple-tree-1";

fn yaml_usize(n: usize) -> YamlValue {
    YamlValue::Number((n as u64).into())
}

struct TreeWriter<'a> {
    sm: &'a SemanticModel,
    ns: &'a Namespace,
    col_fmt: HashMap<usize, YamlValue>,
    used_uris: BTreeSet<String>,
}

impl TreeWriter<'_> {
    fn rel_uri(&mut self, abs_uri: &str) -> Result<String> {
        let rel = self.ns.get_rel_uri(abs_uri)?;
        self.used_uris.insert(abs_uri.to_string());
        Ok(rel)
    }

    fn node(&mut self, id: NodeId) -> Result<YamlValue> {
        let sm = self.sm;
        let node = sm.node(id).ok_or(ModelError::DanglingNode(id.index()))?;
        match node {
            Node::Data(data) => self
                .col_fmt
                .get(&data.col_index)
                .cloned()
                .ok_or_else(|| ModelError::MissingColumn(data.col_index).into()),
            Node::Literal(lit) => {
                let kind = match lit.datatype {
                    LiteralNodeDataType::Entity => "entity".to_string(),
                    other => format!("literal:{}", other.as_str()),
                };
                let mut out = Mapping::new();
                out.insert("type".into(), kind.into());
                out.insert("value".into(), lit.value.clone().into());
                Ok(YamlValue::Mapping(out))
            }
            Node::Class(class) => {
                let mut out = Mapping::new();
                out.insert("type".into(), self.rel_uri(&class.abs_uri)?.into());
                let mut props = Mapping::new();
                for edge_id in sm.outgoing_edges(id) {
                    let (_, target) = sm
                        .edge_endpoints(edge_id)
                        .ok_or(ModelError::DanglingNode(id.index()))?;
                    let uri = match sm.edge(edge_id) {
                        Some(edge) => edge.abs_uri.clone(),
                        None => continue,
                    };
                    let key = self.rel_uri(&uri)?;
                    let child = self.node(target)?;
                    props.insert(key.into(), child);
                }
                out.insert("props".into(), YamlValue::Mapping(props));
                Ok(YamlValue::Mapping(out))
            }
        }
    }
}

/// Render `sm` as a simple tree. Columns are referenced by name when the
/// name is unique and non-blank, by index otherwise. Only the prefixes the
/// output actually uses are emitted.
pub fn ser_simple_tree_yaml(
    table: &ColumnBasedTable,
    sm: &SemanticModel,
    ns: &Namespace,
) -> Result<String> {
    if sm.has_cycle() {
        return Err(DatasetError::Inconsistent(
            "a model with cycles cannot be written as a tree".into(),
        ));
    }

    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for col in table.columns() {
        if let Some(name) = col.clean_name() {
            *name_counts.entry(name).or_default() += 1;
        }
    }
    let col_fmt = table
        .columns()
        .iter()
        .map(|col| {
            let fmt = match col.clean_name() {
                Some(name) if name_counts.get(&name) == Some(&1) => YamlValue::String(name),
                _ => yaml_usize(col.index),
            };
            (col.index, fmt)
        })
        .collect();

    let mut writer = TreeWriter {
        sm,
        ns,
        col_fmt,
        used_uris: BTreeSet::new(),
    };
    let roots: Vec<NodeId> = sm
        .iter_nodes()
        .filter(|(id, node)| sm.in_degree(*id) == 0 && !node.is_data_node())
        .map(|(id, _)| id)
        .collect();
    let model = roots
        .into_iter()
        .map(|id| writer.node(id))
        .collect::<Result<Vec<_>>>()?;

    let mut used_prefixes = BTreeMap::new();
    for uri in &writer.used_uris {
        if let Some(prefix) = ns.prefix_of(uri) {
            if let Some(namespace) = ns.namespace_of(prefix) {
                used_prefixes.insert(prefix.to_string(), namespace.to_string());
            }
        }
    }
    let prefixes: Mapping = used_prefixes
        .into_iter()
        .map(|(k, v)| (YamlValue::String(k), YamlValue::String(v)))
        .collect();

    let mut doc = Mapping::new();
    doc.insert("version".into(), SIMPLE_TREE_VERSION.into());
    doc.insert("model".into(), YamlValue::Sequence(model));
    doc.insert("prefixes".into(), YamlValue::Mapping(prefixes));
    Ok(serde_yaml::to_string(&YamlValue::Mapping(doc))?)
}

struct TreeReader<'a> {
    table: &'a ColumnBasedTable,
    ns: Namespace,
    name2col: HashMap<String, usize>,
    sm: SemanticModel,
}

impl TreeReader<'_> {
    fn scalar(value: &YamlValue) -> Option<String> {
        match value {
            YamlValue::String(s) => Some(s.clone()),
            YamlValue::Number(n) => Some(n.to_string()),
            YamlValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn invalid(what: impl Into<String>) -> DatasetError {
        DatasetError::Inconsistent(what.into())
    }

    fn node(&mut self, value: &YamlValue) -> Result<NodeId> {
        match value {
            YamlValue::String(name) => {
                let col_index = *self
                    .name2col
                    .get(name)
                    .ok_or_else(|| Self::invalid(format!("unknown column name `{name}`")))?;
                Ok(self.sm.add_node(Node::Data(DataNode {
                    col_index,
                    label: name.clone(),
                })))
            }
            YamlValue::Number(n) => {
                let col_index = n
                    .as_u64()
                    .ok_or_else(|| Self::invalid(format!("invalid column index `{n}`")))?
                    as usize;
                let column = self
                    .table
                    .get_column_by_index(col_index)
                    .ok_or(ModelError::MissingColumn(col_index))?;
                Ok(self.sm.add_node(Node::Data(DataNode {
                    col_index,
                    label: column.clean_name().unwrap_or_default(),
                })))
            }
            YamlValue::Mapping(map) if map.contains_key("value") => {
                let kind = map
                    .get("type")
                    .and_then(YamlValue::as_str)
                    .ok_or_else(|| Self::invalid("literal node without a type"))?;
                let datatype = if kind == "entity" {
                    LiteralNodeDataType::Entity
                } else {
                    kind.strip_prefix("literal:")
                        .and_then(LiteralNodeDataType::parse)
                        .ok_or_else(|| DatasetError::UnsupportedFormat {
                            kind: "literal type",
                            tag: kind.to_string(),
                        })?
                };
                let value = map
                    .get("value")
                    .and_then(Self::scalar)
                    .ok_or_else(|| Self::invalid("literal value must be a scalar"))?;
                Ok(self.sm.add_node(Node::Literal(LiteralNode {
                    value,
                    readable_label: None,
                    is_in_context: false,
                    datatype,
                })))
            }
            YamlValue::Mapping(map) => {
                let rel_uri = map
                    .get("type")
                    .and_then(YamlValue::as_str)
                    .ok_or_else(|| Self::invalid("class node without a type"))?;
                let id = self.sm.add_node(Node::Class(ClassNode {
                    abs_uri: self.ns.get_abs_uri(rel_uri)?,
                    rel_uri: rel_uri.to_string(),
                    approximation: false,
                    readable_label: None,
                }));
                if let Some(props) = map.get("props") {
                    let props = props
                        .as_mapping()
                        .ok_or_else(|| Self::invalid("`props` must be a mapping"))?;
                    for (key, child) in props {
                        let prop = key
                            .as_str()
                            .ok_or_else(|| Self::invalid("property keys must be strings"))?;
                        let target = self.node(child)?;
                        let edge = Edge::new(self.ns.get_abs_uri(prop)?, prop);
                        self.sm.add_edge(id, target, edge)?;
                    }
                }
                Ok(id)
            }
            other => Err(Self::invalid(format!("unexpected tree node {other:?}"))),
        }
    }
}

/// Parse a simple tree back into a semantic model over `table`.
pub fn deser_simple_tree_yaml(table: &ColumnBasedTable, text: &str) -> Result<SemanticModel> {
    let doc: YamlValue = serde_yaml::from_str(text)?;
    let version = doc.get("version").and_then(YamlValue::as_str).unwrap_or("");
    if version != SIMPLE_TREE_VERSION {
        return Err(DatasetError::UnsupportedFormat {
            kind: "simple tree version",
            tag: version.to_string(),
        });
    }

    let mut prefixes = Vec::new();
    if let Some(map) = doc.get("prefixes").and_then(YamlValue::as_mapping) {
        for (k, v) in map {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                prefixes.push((k.to_string(), v.to_string()));
            }
        }
    }

    let name2col = table
        .columns()
        .iter()
        .filter_map(|col| col.clean_name().map(|name| (name, col.index)))
        .collect();
    let mut reader = TreeReader {
        table,
        ns: Namespace::from_prefix2ns(prefixes),
        name2col,
        sm: SemanticModel::new(),
    };
    if let Some(model) = doc.get("model").and_then(YamlValue::as_sequence) {
        for node in model {
            reader.node(node)?;
        }
    }
    Ok(reader.sm)
}
