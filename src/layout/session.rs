use eframe::egui::{Pos2, Vec2};
use tracing::{debug, info};

use crate::diagram::{FlowDiagram, Link, NodeId, build_diagram};
use crate::error::BuildError;
use crate::settings::Settings;
use crate::table::DataTable;

use super::labels::node_radius;
use super::{
    DRAG_ALPHA_TARGET, LabelPlacement, LayoutConfig, LinearScale, Simulation, TextMeasurer,
    place_labels,
};

const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 6.0;

/// Pan offset and zoom between world and screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, screen_center: Pos2, world: Vec2) -> Pos2 {
        screen_center + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, screen_center: Pos2, screen: Pos2) -> Vec2 {
        (screen - screen_center - self.pan) / self.zoom
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zooms keeping the world point under `pointer` fixed on screen.
    pub fn zoom_at(&mut self, screen_center: Pos2, pointer: Pos2, factor: f32) {
        let world_before = self.screen_to_world(screen_center, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - screen_center - (world_before * self.zoom);
    }
}

/// State that tick callbacks read and write, owned by one session.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutContext {
    pub viewport: Viewport,
    pub root_last: Option<Vec2>,
    pub max_value: f64,
    pub radius_scale: LinearScale,
    pub width_scale: LinearScale,
}

impl LayoutContext {
    pub fn new(diagram: &FlowDiagram, config: &LayoutConfig, viewport: Viewport) -> Self {
        let max_value = diagram.max_value();
        Self {
            viewport,
            root_last: None,
            max_value,
            radius_scale: LinearScale::new(
                (0.0, max_value),
                (config.min_radius, config.max_radius),
            ),
            width_scale: LinearScale::new(
                (0.0, diagram.max_link_weight()),
                (config.min_link_width, config.max_link_width),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickFrame {
    pub active: bool,
    pub labels: Vec<LabelPlacement>,
}

pub struct LayoutSession {
    generation: u64,
    diagram: FlowDiagram,
    settings: Settings,
    simulation: Simulation,
    context: LayoutContext,
    dragging: Option<NodeId>,
}

impl LayoutSession {
    pub fn new(
        generation: u64,
        diagram: FlowDiagram,
        settings: Settings,
        viewport: Viewport,
    ) -> Result<Self, BuildError> {
        let config = LayoutConfig::from_settings(&settings.layout)?;
        let simulation = Simulation::new(&diagram, &config);
        let context = LayoutContext::new(&diagram, &config, viewport);
        Ok(Self {
            generation,
            diagram,
            settings,
            simulation,
            context,
            dragging: None,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn diagram(&self) -> &FlowDiagram {
        &self.diagram
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn context(&self) -> &LayoutContext {
        &self.context
    }

    pub fn viewport(&self) -> Viewport {
        self.context.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.context.viewport
    }

    pub fn dragging(&self) -> Option<NodeId> {
        self.dragging
    }

    /// One simulation step followed by label placement on the new positions.
    pub fn tick(&mut self, measurer: &dyn TextMeasurer) -> TickFrame {
        let active = self.simulation.tick();
        let labels = place_labels(
            &self.diagram,
            self.simulation.bodies(),
            &mut self.context,
            &self.settings,
            measurer,
        );
        TickFrame { active, labels }
    }

    pub fn node_radius(&self, id: NodeId) -> f32 {
        node_radius(&self.diagram, id, &self.context.radius_scale)
    }

    pub fn link_width(&self, link: &Link) -> f32 {
        self.context.width_scale.size(link.weight)
    }

    /// Topmost node whose circle contains `world`.
    pub fn node_at(&self, world: Vec2) -> Option<NodeId> {
        self.simulation
            .bodies()
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(index, body)| {
                let id = NodeId(index);
                let distance = (body.position - world).length();
                (distance <= self.node_radius(id).max(3.0)).then_some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn begin_drag(&mut self, id: NodeId) -> bool {
        if self.dragging.is_some() {
            return false;
        }
        let Some(position) = self.simulation.position(id) else {
            return false;
        };

        self.simulation.reheat(DRAG_ALPHA_TARGET);
        self.simulation.pin(id, position);
        self.dragging = Some(id);
        true
    }

    pub fn drag_to(&mut self, id: NodeId, world: Vec2) -> bool {
        if self.dragging != Some(id) {
            return false;
        }
        self.simulation.pin(id, world)
    }

    pub fn end_drag(&mut self, id: NodeId) -> bool {
        if self.dragging != Some(id) {
            return false;
        }
        self.simulation.cool();
        self.simulation.unpin(id);
        self.dragging = None;
        true
    }

    /// Puts full energy back into the layout, e.g. after the user shuffled pinned nodes.
    pub fn restart(&mut self) {
        self.simulation.restart(1.0);
    }

    fn stop(&mut self) {
        self.simulation.stop();
        self.dragging = None;
    }
}

/// Proof that a tick belongs to the session that is currently installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle {
    generation: u64,
}

/// Holds at most one live session; every refresh tears the old one down first.
#[derive(Default)]
pub struct SessionSlot {
    generation: u64,
    current: Option<LayoutSession>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn teardown(&mut self) {
        if let Some(mut session) = self.current.take() {
            session.stop();
            debug!(generation = session.generation, "layout session torn down");
        }
    }

    /// Builds the diagram from `table` and installs a fresh session for it.
    pub fn rebuild(
        &mut self,
        table: &DataTable,
        settings: &Settings,
    ) -> Result<TickHandle, BuildError> {
        let viewport = self.viewport();
        self.teardown();
        self.generation += 1;

        let diagram = build_diagram(table, settings)?;
        self.install(diagram, settings.clone(), viewport)
    }

    fn install(
        &mut self,
        diagram: FlowDiagram,
        settings: Settings,
        viewport: Viewport,
    ) -> Result<TickHandle, BuildError> {
        let session = LayoutSession::new(self.generation, diagram, settings, viewport)?;
        info!(
            generation = self.generation,
            nodes = session.diagram.nodes.len(),
            "layout session started"
        );
        self.current = Some(session);
        Ok(TickHandle {
            generation: self.generation,
        })
    }

    fn viewport(&self) -> Viewport {
        self.current
            .as_ref()
            .map(LayoutSession::viewport)
            .unwrap_or_default()
    }

    pub fn get(&self, handle: TickHandle) -> Option<&LayoutSession> {
        self.current
            .as_ref()
            .filter(|session| session.generation == handle.generation)
    }

    pub fn get_mut(&mut self, handle: TickHandle) -> Option<&mut LayoutSession> {
        self.current
            .as_mut()
            .filter(|session| session.generation == handle.generation)
    }

    /// Stale handles from superseded sessions are ignored.
    pub fn tick(&mut self, handle: TickHandle, measurer: &dyn TextMeasurer) -> Option<TickFrame> {
        self.get_mut(handle).map(|session| session.tick(measurer))
    }
}
