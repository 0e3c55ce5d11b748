use eframe::egui::Color32;
use tracing::trace;

use crate::error::{BuildError, PreconditionFailure};
use crate::settings::Settings;
use crate::table::DataTable;

use super::{
    AggregateEvaluator, HierarchicalKey, Link, Node, NodeId, NodeKind, PaletteAssigner,
    distinct_values, percentage,
};

struct HierarchyBuilder<'a> {
    table: &'a DataTable,
    palette: &'a PaletteAssigner,
    aggregates: AggregateEvaluator<'a>,
    stage_measures: Vec<usize>,
    nodes: Vec<Node>,
    links: Vec<Link>,
}

/// Builds the node/link graph: root, one node per distinct value at each level, and the
/// measure-stage chain below every deepest category when several flow-stage measures exist.
pub fn build_graph(
    table: &DataTable,
    settings: &Settings,
    palette: &PaletteAssigner,
) -> Result<(Vec<Node>, Vec<Link>), BuildError> {
    if table.level_count() == 0 {
        return Err(PreconditionFailure::MissingCategories.into());
    }
    let primary = table
        .primary_measure()
        .ok_or(PreconditionFailure::MissingMeasures)?;

    let stages = table.flow_stage_measures();
    let mut builder = HierarchyBuilder {
        table,
        palette,
        aggregates: AggregateEvaluator::new(table, primary),
        stage_measures: if stages.len() > 1 { stages } else { Vec::new() },
        nodes: Vec::new(),
        links: Vec::new(),
    };

    let total = builder.aggregates.total();
    if !total.is_finite() {
        return Err(BuildError::failure(format!(
            "total of `{}` is not finite",
            table.measures[primary].name
        )));
    }
    let root = builder.push_node(Node {
        id: NodeId::ROOT,
        parent: None,
        level: 0,
        kind: NodeKind::Root,
        key: HierarchicalKey::root(),
        display_name: settings.root.text.clone(),
        aggregate_value: total,
        percentage_of_parent: 1.0,
        color: settings.root_color(),
        row_selection: Vec::new(),
    });
    builder.links.push(Link {
        source: root,
        target: root,
        weight: total,
    });

    builder.expand(&HierarchicalKey::root(), 0, root, total);

    Ok((builder.nodes, builder.links))
}

impl HierarchyBuilder<'_> {
    fn push_node(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.id = id;
        self.nodes.push(node);
        id
    }

    fn branch_color(&self, key: &HierarchicalKey) -> Color32 {
        key.first()
            .and_then(|category| self.palette.color_for(category))
            .unwrap_or(Color32::GRAY)
    }

    fn expand(
        &mut self,
        key: &HierarchicalKey,
        level: usize,
        parent: NodeId,
        parent_aggregate: f64,
    ) {
        if level >= self.table.level_count() {
            if !self.stage_measures.is_empty() {
                self.expand_stages(key, parent);
            }
            return;
        }

        let prefix = (!key.is_root()).then_some(key);
        for value in distinct_values(self.table, level, prefix) {
            let child_key = key.child(value);
            let aggregate = self.aggregates.sum(&child_key);
            let display_name = child_key.last().map(ToString::to_string).unwrap_or_default();
            trace!(level, name = %display_name, aggregate, "category node");

            let child = self.push_node(Node {
                id: NodeId::ROOT,
                parent: Some(parent),
                level: level + 1,
                kind: NodeKind::Category,
                color: self.branch_color(&child_key),
                key: child_key.clone(),
                display_name,
                aggregate_value: aggregate,
                percentage_of_parent: percentage(aggregate, parent_aggregate),
                row_selection: Vec::new(),
            });
            self.links.push(Link {
                source: parent,
                target: child,
                weight: aggregate,
            });

            self.expand(&child_key, level + 1, child, aggregate);
        }
    }

    fn expand_stages(&mut self, key: &HierarchicalKey, category: NodeId) {
        let color = self.branch_color(key);
        let base_level = self.nodes[category.index()].level;
        let mut previous = category;
        let mut previous_value = self.nodes[category.index()].aggregate_value;

        for (stage, measure) in self.stage_measures.clone().into_iter().enumerate() {
            let value = AggregateEvaluator::new(self.table, measure).sum(key);
            let share = percentage(value, previous_value);

            let node = self.push_node(Node {
                id: NodeId::ROOT,
                parent: Some(previous),
                level: base_level + stage + 1,
                kind: NodeKind::Stage { measure, stage },
                key: key.clone(),
                display_name: self.table.measures[measure].name.clone(),
                aggregate_value: value,
                percentage_of_parent: share,
                color,
                row_selection: Vec::new(),
            });
            self.links.push(Link {
                source: previous,
                target: node,
                weight: value,
            });

            previous = node;
            previous_value = value;
        }
    }
}
