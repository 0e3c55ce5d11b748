use std::collections::{HashMap, HashSet};

use crate::error::BuildError;
use crate::table::{DataTable, RowToken};

use super::{HierarchicalKey, Link, Node, NodeKind};

/// Attaches to every node the row tokens it stands for.
///
/// Deepest category nodes receive the tokens of rows whose full categorical path equals
/// their key. Shallower nodes take the union of their children in link order, bottom-up
/// over any depth. Stage nodes share their category node's rows.
pub fn annotate(
    nodes: &mut [Node],
    links: &[Link],
    table: &DataTable,
    row_tokens: &[RowToken],
) -> Result<(), BuildError> {
    if row_tokens.len() != table.row_count() {
        return Err(BuildError::failure(format!(
            "{} row tokens supplied for {} rows",
            row_tokens.len(),
            table.row_count()
        )));
    }

    let depth = table.level_count();
    for node in nodes.iter_mut() {
        node.row_selection.clear();
    }

    let leaves = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Category && node.level == depth)
        .map(|node| (node.key.clone(), node.id.index()))
        .collect::<HashMap<HierarchicalKey, usize>>();
    if !leaves.is_empty() {
        for (row, token) in row_tokens.iter().enumerate() {
            let path = HierarchicalKey::from_values(
                (0..depth).filter_map(|level| table.category(level, row).cloned()),
            );
            if let Some(&index) = leaves.get(&path) {
                nodes[index].row_selection.push(*token);
            }
        }
    }

    let mut children = vec![Vec::new(); nodes.len()];
    for link in links {
        if link.is_self_loop() {
            continue;
        }
        let (source, target) = (link.source.index(), link.target.index());
        if source < nodes.len() && target < nodes.len() {
            children[source].push(target);
        }
    }

    let mut order = (0..nodes.len())
        .filter(|&index| match nodes[index].kind {
            NodeKind::Root => true,
            NodeKind::Category => nodes[index].level < depth,
            NodeKind::Stage { .. } => false,
        })
        .collect::<Vec<_>>();
    order.sort_by(|a, b| nodes[*b].level.cmp(&nodes[*a].level));

    for index in order {
        let mut seen = HashSet::new();
        let mut union = Vec::new();
        for &child in &children[index] {
            if matches!(nodes[child].kind, NodeKind::Stage { .. }) {
                continue;
            }
            for token in &nodes[child].row_selection {
                if seen.insert(*token) {
                    union.push(*token);
                }
            }
        }
        nodes[index].row_selection = union;
    }

    for index in 0..nodes.len() {
        if !matches!(nodes[index].kind, NodeKind::Stage { .. }) {
            continue;
        }
        let Some(parent) = nodes[index].parent.map(|parent| parent.index()) else {
            continue;
        };
        if parent < index {
            nodes[index].row_selection = nodes[parent].row_selection.clone();
        }
    }

    Ok(())
}
