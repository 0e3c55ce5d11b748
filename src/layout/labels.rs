use eframe::egui::{Vec2, vec2};

use crate::diagram::{FlowDiagram, NodeId};
use crate::format::label_text;
use crate::settings::Settings;

use super::session::LayoutContext;
use super::{Body, LinearScale};

/// Horizontal distance from the root inside which labels stack above/below their node.
pub const VERTICAL_PLACEMENT_THRESHOLD: f32 = 40.0;
pub const ROOT_LABEL_OFFSET: f32 = 1.25;
pub const LEFT_LABEL_PADDING: f32 = 4.0;
pub const RIGHT_LABEL_PADDING: f32 = 6.0;
pub const RIGHT_LABEL_WIDTH_SHARE: f32 = 0.5;

pub trait TextMeasurer {
    /// Width and height of `text` drawn at `font_size`.
    fn measure(&self, text: &str, font_size: f32) -> Vec2;
}

/// Character-count estimate for hosts without font metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproximateMeasurer;

impl TextMeasurer for ApproximateMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> Vec2 {
        vec2(text.chars().count() as f32 * font_size * 0.6, font_size * 1.2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// `position` is the anchor point on the label's vertical center line.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacement {
    pub node: NodeId,
    pub text: String,
    pub position: Vec2,
    pub anchor: TextAnchor,
}

pub(super) fn node_radius(diagram: &FlowDiagram, id: NodeId, scale: &LinearScale) -> f32 {
    match diagram.node(id) {
        Some(node) if node.is_root() => scale.range_max(),
        Some(node) => scale.size(node.aggregate_value),
        None => 0.0,
    }
}

/// Places one label per node relative to the root's last recorded position.
pub fn place_labels(
    diagram: &FlowDiagram,
    bodies: &[Body],
    context: &mut LayoutContext,
    settings: &Settings,
    measurer: &dyn TextMeasurer,
) -> Vec<LabelPlacement> {
    if !settings.labels.show {
        return Vec::new();
    }

    let font_size = settings.labels.font_size;
    if let Some(root) = diagram.root()
        && let Some(body) = bodies.get(root.id.index())
    {
        context.root_last = Some(body.position);
    }
    let root_position = context.root_last.unwrap_or(Vec2::ZERO);

    let mut placements = Vec::with_capacity(diagram.nodes.len());
    for node in &diagram.nodes {
        let Some(body) = bodies.get(node.id.index()) else {
            continue;
        };
        let text = label_text(node, diagram.root_label_value, settings);
        if text.is_empty() {
            continue;
        }

        let size = measurer.measure(&text, font_size);
        let radius = node_radius(diagram, node.id, &context.radius_scale);
        let position = body.position;

        let (offset, anchor) = if node.is_root() {
            (vec2(radius * ROOT_LABEL_OFFSET, 0.0), TextAnchor::Start)
        } else if (position.x - root_position.x).abs() < VERTICAL_PLACEMENT_THRESHOLD {
            let lift = radius + size.y;
            if position.y < root_position.y {
                (vec2(0.0, -lift), TextAnchor::Middle)
            } else {
                (vec2(0.0, lift), TextAnchor::Middle)
            }
        } else if position.x < root_position.x {
            let gap = radius + context.width_scale.size(node.aggregate_value) + LEFT_LABEL_PADDING;
            (vec2(-gap, 0.0), TextAnchor::End)
        } else {
            let gap = radius + RIGHT_LABEL_PADDING + size.x * RIGHT_LABEL_WIDTH_SHARE;
            (vec2(gap, 0.0), TextAnchor::Middle)
        };

        placements.push(LabelPlacement {
            node: node.id,
            text,
            position: position + offset,
            anchor,
        });
    }
    placements
}
