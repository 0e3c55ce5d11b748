//! Force simulation, node sizing and label placement.

mod forces;
mod labels;
mod quadtree;
mod scale;
mod session;

use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::diagram::{FlowDiagram, NodeId};
use crate::error::BuildError;
use crate::settings::LayoutSettings;
use forces::{Spring, apply_center, apply_charge, apply_springs};

pub use labels::{ApproximateMeasurer, LabelPlacement, TextAnchor, TextMeasurer, place_labels};
pub use scale::LinearScale;
pub use session::{LayoutContext, LayoutSession, SessionSlot, TickFrame, TickHandle, Viewport};

pub const TRUNK_LINK_STRENGTH: f32 = 0.9;
pub const MIN_BRANCH_LINK_STRENGTH: f32 = 0.05;
pub const MAX_BRANCH_LINK_STRENGTH: f32 = 0.5;
pub const DRAG_ALPHA_TARGET: f32 = 0.3;

const INITIAL_RADIUS: f32 = 10.0;
const ALPHA_MIN: f32 = 0.001;
const VELOCITY_DECAY: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub link_distance: f32,
    pub charge: f32,
    pub center: Vec2,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_link_width: f32,
    pub max_link_width: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::unchecked(&LayoutSettings::default())
    }
}

fn default_alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

impl LayoutConfig {
    pub fn from_settings(settings: &LayoutSettings) -> Result<Self, BuildError> {
        let values = [
            ("link_distance", settings.link_distance),
            ("charge", settings.charge),
            ("min_radius", settings.min_radius),
            ("max_radius", settings.max_radius),
            ("min_link_width", settings.min_link_width),
            ("max_link_width", settings.max_link_width),
        ];
        if let Some((name, _)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(BuildError::failure(format!("layout setting `{name}` is not finite")));
        }
        if settings.link_distance <= 0.0 {
            return Err(BuildError::failure("layout link_distance must be positive"));
        }
        if settings.min_radius < 0.0 || settings.max_radius < settings.min_radius {
            return Err(BuildError::failure("layout radius range is invalid"));
        }
        if settings.min_link_width < 0.0 || settings.max_link_width < settings.min_link_width {
            return Err(BuildError::failure("layout link width range is invalid"));
        }

        Ok(Self::unchecked(settings))
    }

    fn unchecked(settings: &LayoutSettings) -> Self {
        Self {
            link_distance: settings.link_distance,
            charge: settings.charge,
            center: Vec2::ZERO,
            min_radius: settings.min_radius,
            max_radius: settings.max_radius,
            min_link_width: settings.min_link_width,
            max_link_width: settings.max_link_width,
            velocity_decay: VELOCITY_DECAY,
            alpha_min: ALPHA_MIN,
            alpha_decay: default_alpha_decay(),
        }
    }
}

/// Trunk links (targets at depth 1-2) stay near-rigid; deeper and heavier links loosen.
pub fn link_strength(target_level: usize, weight: f64) -> f32 {
    if target_level <= 2 {
        return TRUNK_LINK_STRENGTH;
    }

    let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
    let falloff = (target_level as f64).ln() + (1.0 + weight).log10();
    ((1.0 / (1.0 + falloff)) as f32).clamp(MIN_BRANCH_LINK_STRENGTH, MAX_BRANCH_LINK_STRENGTH)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
}

pub struct Simulation {
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    charge: f32,
    center: Vec2,
    alpha: f32,
    alpha_min: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
    points: Vec<Vec2>,
}

impl Simulation {
    pub fn new(diagram: &FlowDiagram, config: &LayoutConfig) -> Self {
        let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
        let bodies = (0..diagram.nodes.len())
            .map(|index| {
                let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * golden_angle;
                Body {
                    position: config.center + vec2(angle.cos(), angle.sin()) * radius,
                    velocity: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; bodies.len()];
        let links = diagram
            .links
            .iter()
            .filter(|link| {
                !link.is_self_loop()
                    && link.source.index() < bodies.len()
                    && link.target.index() < bodies.len()
            })
            .collect::<Vec<_>>();
        for link in &links {
            degree[link.source.index()] += 1;
            degree[link.target.index()] += 1;
        }

        let springs = links
            .into_iter()
            .map(|link| {
                let (source, target) = (link.source.index(), link.target.index());
                let level = diagram.nodes[target].level;
                Spring {
                    source,
                    target,
                    distance: config.link_distance,
                    strength: link_strength(level, link.weight),
                    bias: degree[source] as f32 / (degree[source] + degree[target]) as f32,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            bodies = bodies.len(),
            springs = springs.len(),
            "simulation configured"
        );

        Self {
            bodies,
            springs,
            charge: config.charge,
            center: config.center,
            alpha: 1.0,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay,
            alpha_target: 0.0,
            velocity_decay: config.velocity_decay,
            points: Vec::new(),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn is_active(&self) -> bool {
        self.alpha >= self.alpha_min || self.alpha_target >= self.alpha_min
    }

    /// Advances one step if the simulation still has energy.
    pub fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.step();
        if !self.is_active() {
            debug!("simulation settled");
        }
        true
    }

    pub fn step(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        apply_springs(&mut self.bodies, &self.springs, self.alpha);
        apply_charge(&mut self.bodies, self.charge, self.alpha, &mut self.points);
        apply_center(&mut self.bodies, self.center);

        let keep = 1.0 - self.velocity_decay;
        for body in &mut self.bodies {
            if let Some(pin) = body.pin {
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }
            body.velocity *= keep;
            body.position += body.velocity;
        }
    }

    /// Raises the energy target so the layout visibly relaxes again.
    pub fn reheat(&mut self, target: f32) {
        self.alpha_target = target.max(0.0);
    }

    pub fn cool(&mut self) {
        self.alpha_target = 0.0;
    }

    pub fn restart(&mut self, alpha: f32) {
        self.alpha = alpha.max(0.0);
    }

    pub fn stop(&mut self) {
        self.alpha = 0.0;
        self.alpha_target = 0.0;
    }

    pub fn pin(&mut self, id: NodeId, position: Vec2) -> bool {
        let Some(body) = self.bodies.get_mut(id.index()) else {
            return false;
        };
        body.pin = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, id: NodeId) -> bool {
        let Some(body) = self.bodies.get_mut(id.index()) else {
            return false;
        };
        body.pin = None;
        true
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.bodies.get(id.index()).map(|body| body.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.bodies.iter().map(|body| body.position)
    }
}
