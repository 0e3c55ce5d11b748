use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::Body;
use super::quadtree::Cell;

const BARNES_HUT_THETA: f32 = 0.9;
const MIN_DISTANCE_SQ: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) distance: f32,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Tiny deterministic nudge for coincident bodies.
fn jiggle(seed: usize) -> Vec2 {
    let angle = ((seed as f32) * 0.618_034 + 0.37) * TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

pub(super) fn apply_springs(bodies: &mut [Body], springs: &[Spring], alpha: f32) {
    for (index, spring) in springs.iter().enumerate() {
        let (source, target) = (bodies[spring.source], bodies[spring.target]);
        let mut delta =
            (target.position + target.velocity) - (source.position + source.velocity);
        if delta.length_sq() == 0.0 {
            delta = jiggle(index);
        }

        let length = delta.length();
        let pull = delta * ((length - spring.distance) / length * alpha * spring.strength);

        bodies[spring.target].velocity -= pull * spring.bias;
        bodies[spring.source].velocity += pull * (1.0 - spring.bias);
    }
}

pub(super) fn apply_charge(bodies: &mut [Body], charge: f32, alpha: f32, points: &mut Vec<Vec2>) {
    if bodies.len() < 2 || charge == 0.0 {
        return;
    }

    points.clear();
    points.extend(bodies.iter().map(|body| body.position));
    let Some(tree) = Cell::build(points) else {
        return;
    };

    let scaled = charge * alpha;
    for (index, body) in bodies.iter_mut().enumerate() {
        let mut impulse = Vec2::ZERO;
        accumulate_charge(&tree, index, points, scaled, &mut impulse);
        body.velocity += impulse;
    }
}

fn charge_impulse(delta: Vec2, weight: f32) -> Vec2 {
    let mut distance_sq = delta.length_sq();
    if distance_sq < MIN_DISTANCE_SQ {
        distance_sq = (MIN_DISTANCE_SQ * distance_sq).sqrt();
    }
    delta * (weight / distance_sq)
}

fn accumulate_charge(cell: &Cell, index: usize, points: &[Vec2], scaled: f32, impulse: &mut Vec2) {
    if cell.count <= 0.0 {
        return;
    }
    let point = points[index];

    if cell.is_leaf() {
        for &other in &cell.members {
            if other == index {
                continue;
            }
            let mut delta = points[other] - point;
            if delta.length_sq() == 0.0 {
                delta = jiggle(index * 31 + other);
            }
            *impulse += charge_impulse(delta, scaled);
        }
        return;
    }

    let delta = cell.centroid - point;
    let distance = delta.length().max(1e-4);
    if !cell.square.contains(point) && cell.square.width() / distance < BARNES_HUT_THETA {
        *impulse += charge_impulse(delta, scaled * cell.count);
        return;
    }

    for child in cell.children() {
        accumulate_charge(child, index, points, scaled, impulse);
    }
}

/// Shifts every body so the mean position sits at `center`.
pub(super) fn apply_center(bodies: &mut [Body], center: Vec2) {
    if bodies.is_empty() {
        return;
    }
    let mean = bodies
        .iter()
        .fold(Vec2::ZERO, |sum, body| sum + body.position)
        / bodies.len() as f32;
    let shift = center - mean;
    for body in bodies {
        body.position += shift;
    }
}
