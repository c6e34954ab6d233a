//! Semantic-model rewrites used before comparing models.

use crate::error::{EvalError, Result};
use semtab_model::{NodeId, SemanticModel};
use std::collections::HashSet;
use tracing::debug;

/// Collapse every class node that has a subject edge (an outgoing edge whose
/// property is in `id_props`) into that edge's target.
///
/// Incoming edges of the class node are redirected to the subject node,
/// its other outgoing edges now start from the subject node, and the subject
/// edge itself is dropped. Class nodes are removed only after all rewiring
/// is done. A class node with more than one subject edge is an error.
pub fn replace_class_nodes_by_subject_columns(
    sm: &mut SemanticModel,
    id_props: &HashSet<String>,
) -> Result<()> {
    let mut removed: Vec<NodeId> = Vec::new();

    for node_id in sm.node_ids() {
        if !sm.node(node_id).is_some_and(|n| n.is_class_node()) {
            continue;
        }
        let outgoing = sm.outgoing_edges(node_id);
        let subject_edges: Vec<_> = outgoing
            .iter()
            .copied()
            .filter(|&e| sm.edge(e).is_some_and(|edge| id_props.contains(&edge.abs_uri)))
            .collect();
        let subject_edge = match subject_edges.as_slice() {
            [] => continue,
            [only] => *only,
            many => {
                return Err(EvalError::MultipleSubjectEdges {
                    node: node_id.index(),
                    count: many.len(),
                })
            }
        };
        let (_, subject) = sm
            .edge_endpoints(subject_edge)
            .ok_or_else(|| EvalError::Inconsistent("subject edge has no endpoints".into()))?;

        for edge_id in sm.incoming_edges(node_id) {
            let source = sm.edge_endpoints(edge_id).map(|(s, _)| s);
            if let (Some(source), Some(edge)) = (source, sm.remove_edge(edge_id)) {
                sm.add_edge(source, subject, edge)?;
            }
        }
        for edge_id in outgoing {
            if edge_id == subject_edge {
                continue;
            }
            let target = sm.edge_endpoints(edge_id).map(|(_, t)| t);
            if let (Some(target), Some(edge)) = (target, sm.remove_edge(edge_id)) {
                sm.add_edge(subject, target, edge)?;
            }
        }
        sm.remove_edge(subject_edge);
        removed.push(node_id);
    }

    debug!(collapsed = removed.len(), "replaced class nodes by subject columns");
    for node_id in removed {
        sm.remove_node(node_id);
    }
    Ok(())
}

/// Remove every node that has no edges. Isolation is decided before any
/// removal, so one call never cascades.
pub fn remove_isolated_nodes(sm: &mut SemanticModel) {
    let isolated: Vec<NodeId> = sm
        .node_ids()
        .into_iter()
        .filter(|&id| sm.degree(id) == 0)
        .collect();
    for id in isolated {
        sm.remove_node(id);
    }
}
