use std::collections::HashSet;

use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, Painter, PointerButton, Pos2, Sense, Stroke, Ui, Vec2,
    vec2,
};

use crate::diagram::{FlowDiagram, NodeId};
use crate::format::{format_percent, format_value};
use crate::layout::TextMeasurer;
use crate::settings::parse_hex_color;
use crate::table::RowToken;

use super::super::render_utils::{
    anchor_align, blend_color, circle_visible, dim_color, draw_background, edge_visible,
};
use super::super::{Selection, ViewModel};

const MIN_LABEL_FONT: f32 = 5.0;

/// Measures with the fonts egui will actually draw with.
struct PainterMeasurer<'a> {
    painter: &'a Painter,
}

impl TextMeasurer for PainterMeasurer<'_> {
    fn measure(&self, text: &str, font_size: f32) -> Vec2 {
        self.painter
            .layout_no_wrap(
                text.to_owned(),
                FontId::proportional(font_size),
                Color32::WHITE,
            )
            .size()
    }
}

/// Nodes sharing at least one row with the current selection.
fn highlighted_nodes(diagram: &FlowDiagram, rows: &HashSet<RowToken>) -> HashSet<NodeId> {
    diagram
        .nodes
        .iter()
        .filter(|node| node.row_selection.iter().any(|token| rows.contains(token)))
        .map(|node| node.id)
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        let Some(handle) = self.handle else {
            return;
        };
        let selected_rows = self
            .selected_rows()
            .map(|rows| rows.iter().copied().collect::<HashSet<_>>());

        let Some(session) = self.slot.get_mut(handle) else {
            return;
        };
        draw_background(&painter, rect, &session.viewport());
        Self::handle_graph_zoom(ui, rect, &response, session);
        Self::handle_graph_pan(&response, session);
        Self::handle_node_drag(rect, &response, session);
        let dragging = session.dragging().is_some();

        if self.live_layout || dragging || self.labels.is_empty() {
            let measurer = PainterMeasurer { painter: &painter };
            if let Some(frame) = self.slot.tick(handle, &measurer) {
                self.labels = frame.labels;
                if frame.active {
                    ui.ctx().request_repaint();
                }
            }
        }

        let Some(session) = self.slot.get(handle) else {
            return;
        };
        let diagram = session.diagram();
        let viewport = session.viewport();
        let center = rect.center();
        let zoom = viewport.zoom;
        let positions = session
            .simulation()
            .positions()
            .map(|position| viewport.world_to_screen(center, position))
            .collect::<Vec<Pos2>>();

        let highlight = selected_rows.map(|rows| highlighted_nodes(diagram, &rows));
        let is_lit = |id: NodeId| highlight.as_ref().is_none_or(|lit| lit.contains(&id));
        let selected_node = match self.selected {
            Some(Selection::Node(id)) => Some(id),
            _ => None,
        };

        let hovered = Self::hovered_node(ui, rect, session);
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        let canvas = Color32::from_rgb(19, 23, 29);
        for link in diagram.links.iter().filter(|link| !link.is_self_loop()) {
            let (Some(&start), Some(&end)) = (
                positions.get(link.source.index()),
                positions.get(link.target.index()),
            ) else {
                continue;
            };
            let Some(target) = diagram.node(link.target) else {
                continue;
            };
            let width = session.link_width(link) * zoom;
            if width <= 0.0 || !edge_visible(rect, start, end, width) {
                continue;
            }

            let color = blend_color(target.color, canvas, 0.45);
            let color = if is_lit(link.target) {
                color
            } else {
                dim_color(color, 0.35)
            };
            painter.line_segment([start, end], Stroke::new(width.max(0.5), color));
        }

        let selected_color = Color32::from_rgb(245, 206, 93);
        for node in &diagram.nodes {
            let Some(&position) = positions.get(node.id.index()) else {
                continue;
            };
            let radius = session.node_radius(node.id) * zoom;
            if radius <= 0.0 || !circle_visible(rect, position, radius) {
                continue;
            }

            let color = if hovered == Some(node.id) {
                blend_color(node.color, Color32::from_rgb(255, 164, 101), 0.35)
            } else if is_lit(node.id) {
                node.color
            } else {
                dim_color(node.color, 0.4)
            };
            painter.circle_filled(position, radius, color);

            let stroke = if selected_node == Some(node.id) {
                Stroke::new(2.4, selected_color)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, stroke);
        }

        let labels = &self.settings.labels;
        let font_size = labels.font_size * zoom;
        if labels.show && font_size >= MIN_LABEL_FONT {
            let label_color = parse_hex_color(&labels.color).unwrap_or(Color32::from_gray(230));
            let bounds = rect.expand(240.0);
            for label in &self.labels {
                let position = viewport.world_to_screen(center, label.position);
                if !bounds.contains(position) {
                    continue;
                }
                let color = if is_lit(label.node) {
                    label_color
                } else {
                    dim_color(label_color, 0.45)
                };
                painter.text(
                    position,
                    anchor_align(label.anchor),
                    label.text.as_str(),
                    FontId::proportional(font_size),
                    color,
                );
            }
        }

        if let Some(node) = hovered.and_then(|id| diagram.node(id)) {
            let value = if node.is_root() {
                diagram.root_label_value.unwrap_or(node.aggregate_value)
            } else {
                node.aggregate_value
            };
            let mut text = format!(
                "{}  |  {}",
                node.display_name,
                format_value(value, labels.display_units, labels.decimal_places)
            );
            if !node.is_root() {
                text.push_str(&format!(
                    "  |  {} of parent",
                    format_percent(node.percentage_of_parent, labels.decimal_places)
                ));
            }
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if dragging {
            ui.ctx().request_repaint();
        }

        if response.clicked_by(PointerButton::Primary) {
            self.set_selected(hovered.map(Selection::Node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::build_diagram;
    use crate::settings::Settings;
    use crate::table::parse_table;

    #[test]
    fn highlight_follows_shared_rows() {
        let table = parse_table(
            r#"{
                "categories": [{"name": "region", "values": ["Europe", "Asia", "Europe"]}],
                "measures": [{"name": "sales", "values": [1, 2, 3]}]
            }"#,
        )
        .unwrap();
        let diagram = build_diagram(&table, &Settings::default()).unwrap();
        let asia = diagram
            .nodes
            .iter()
            .find(|node| node.display_name == "Asia")
            .unwrap();

        let rows = asia.row_selection.iter().copied().collect::<HashSet<_>>();
        let lit = highlighted_nodes(&diagram, &rows);
        assert!(lit.contains(&asia.id));
        assert!(lit.contains(&NodeId::ROOT));
        assert_eq!(lit.len(), 2);
    }
}
