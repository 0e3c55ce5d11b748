use eframe::egui::{self, PointerButton, Rect, Ui};

use crate::diagram::NodeId;
use crate::layout::LayoutSession;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
        session: &mut LayoutSession,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        session
            .viewport_mut()
            .zoom_at(rect.center(), pointer, zoom_factor);
    }

    pub(in crate::app) fn handle_graph_pan(response: &egui::Response, session: &mut LayoutSession) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            session.viewport_mut().pan_by(response.drag_delta());
        }
    }

    /// Primary drag on a node pins it under the pointer until release.
    pub(in crate::app) fn handle_node_drag(
        rect: Rect,
        response: &egui::Response,
        session: &mut LayoutSession,
    ) {
        let pointer_world = response
            .interact_pointer_pos()
            .map(|pointer| session.viewport().screen_to_world(rect.center(), pointer));

        if response.drag_started_by(PointerButton::Primary)
            && let Some(world) = pointer_world
            && let Some(id) = session.node_at(world)
        {
            session.begin_drag(id);
        }

        let Some(id) = session.dragging() else {
            return;
        };
        if response.dragged_by(PointerButton::Primary)
            && let Some(world) = pointer_world
        {
            session.drag_to(id, world);
        }
        if response.drag_stopped() {
            session.end_drag(id);
        }
    }

    pub(in crate::app) fn hovered_node(
        ui: &Ui,
        rect: Rect,
        session: &LayoutSession,
    ) -> Option<NodeId> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }
        session.node_at(session.viewport().screen_to_world(rect.center(), pointer))
    }
}
