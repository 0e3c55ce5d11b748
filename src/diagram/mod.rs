//! Hierarchy construction: rows in, colored and annotated nodes/links out.

mod aggregate;
mod build;
mod index;
mod palette;
mod selection;

use eframe::egui::Color32;
use tracing::{debug, info, warn};

use crate::error::{BuildError, DataQualityWarning};
use crate::settings::{RootLabelSource, Settings};
use crate::table::{CategoryValue, DataTable, RowToken};

pub use aggregate::AggregateEvaluator;
pub use build::build_graph;
pub use index::distinct_values;
pub use palette::{ColorGenerator, HashedPalette, PaletteAssigner};
pub use selection::annotate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: Self = Self(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Path of categorical values from the root down to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HierarchicalKey(Vec<CategoryValue>);

impl HierarchicalKey {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_values(values: impl IntoIterator<Item = CategoryValue>) -> Self {
        Self(values.into_iter().collect())
    }

    pub fn child(&self, value: CategoryValue) -> Self {
        let mut components = Vec::with_capacity(self.0.len() + 1);
        components.extend(self.0.iter().cloned());
        components.push(value);
        Self(components)
    }

    pub fn components(&self) -> &[CategoryValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&CategoryValue> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&CategoryValue> {
        self.0.last()
    }

    pub fn matches_row(&self, table: &DataTable, row: usize) -> bool {
        self.0
            .iter()
            .enumerate()
            .all(|(level, component)| table.category(level, row) == Some(component))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Category,
    Stage { measure: usize, stage: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub level: usize,
    pub kind: NodeKind,
    pub key: HierarchicalKey,
    pub display_name: String,
    pub aggregate_value: f64,
    pub percentage_of_parent: f64,
    pub color: Color32,
    pub row_selection: Vec<RowToken>,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
}

impl Link {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub category: CategoryValue,
    pub color: Color32,
    pub row_selection: Vec<RowToken>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowDiagram {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub legend: Vec<LegendEntry>,
    pub warnings: Vec<DataQualityWarning>,
    pub root_label_value: Option<f64>,
}

impl FlowDiagram {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first().filter(|node| node.is_root())
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&Node> {
        self.node(id)?.parent.and_then(|parent| self.node(parent))
    }

    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.links
            .iter()
            .filter(move |link| link.source == id && !link.is_self_loop())
            .filter_map(|link| self.node(link.target))
    }

    /// Largest aggregate among non-root nodes.
    pub fn max_value(&self) -> f64 {
        self.nodes
            .iter()
            .filter(|node| !node.is_root())
            .map(|node| node.aggregate_value)
            .filter(|value| value.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn max_link_weight(&self) -> f64 {
        self.links
            .iter()
            .filter(|link| !link.is_self_loop())
            .map(|link| link.weight)
            .filter(|value| value.is_finite())
            .fold(0.0, f64::max)
    }
}

pub fn percentage(value: f64, parent: f64) -> f64 {
    if parent == 0.0 {
        return 0.0;
    }
    let ratio = value / parent;
    if ratio.is_finite() { ratio } else { 0.0 }
}

/// Validates `table`, builds the graph, colors it, and annotates row selections.
pub fn build_diagram(table: &DataTable, settings: &Settings) -> Result<FlowDiagram, BuildError> {
    build_diagram_with(table, settings, &table.row_tokens(), &HashedPalette::default())
}

pub fn build_diagram_with(
    table: &DataTable,
    settings: &Settings,
    row_tokens: &[RowToken],
    colors: &dyn ColorGenerator,
) -> Result<FlowDiagram, BuildError> {
    let warnings = table.validate().inspect_err(|failure| {
        warn!(%failure, "table does not meet build preconditions");
    })?;
    for warning in &warnings {
        warn!(%warning, "data quality warning");
    }

    let top_level = distinct_values(table, 0, None);
    let palette = PaletteAssigner::assign(&top_level, &settings.color_overrides(), colors);

    let (mut nodes, links) = build_graph(table, settings, &palette)?;
    annotate(&mut nodes, &links, table, row_tokens)?;

    let legend = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Category && node.level == 1)
        .filter_map(|node| {
            let category = node.key.first()?.clone();
            let color = palette.color_for(&category)?;
            Some(LegendEntry {
                category,
                color,
                row_selection: node.row_selection.clone(),
            })
        })
        .collect::<Vec<_>>();

    let root_label_value = table.root_override_measure().and_then(|measure| {
        let column = &table.measures[measure];
        let row = match settings.root.label_source {
            RootLabelSource::First => 0,
            RootLabelSource::Last => table.row_count().checked_sub(1)?,
        };
        (row < table.row_count()).then(|| column.value(row))
    });

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        legend = legend.len(),
        "diagram graph assembled"
    );
    info!(
        rows = table.row_count(),
        levels = table.level_count(),
        warnings = warnings.len(),
        "diagram built"
    );

    Ok(FlowDiagram {
        nodes,
        links,
        legend,
        warnings,
        root_label_value,
    })
}
