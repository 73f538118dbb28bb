//! Collision response
//!
//! Two families of response, picked by the reacting entity:
//! - positional: nudge the reacting body out of the other shape in fixed steps
//! - velocity: mirror reflection (projectiles) or a restitution impulse (robots)
//!
//! Resolution is discrete and bounded. It may give up with the shapes still
//! overlapping; that is accepted and only logged.

use glam::Vec2;

use super::entity::{Body, Contact};
use super::shape::ConvexShape;
use crate::consts::{RESOLUTION_MAX_ITERATIONS, RESOLUTION_STEP};

/// Outcome of an interpenetration pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Steps taken
    pub steps: usize,
    /// Whether the shapes are apart afterwards
    pub separated: bool,
}

/// Unit vector pointing from `from` to `to` (zero if they coincide)
#[inline]
pub fn collision_normal(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Push `body` away from `hit` until the shapes stop intersecting
///
/// Moves `RESOLUTION_STEP` units per iteration along the direction from the
/// other entity to this one, for at most `RESOLUTION_MAX_ITERATIONS` steps.
pub fn resolve_interpenetration(body: &mut Body, shape: &ConvexShape, hit: &Contact) -> Resolution {
    let slide = collision_normal(hit.position, body.position());
    let mut colliding = shape.intersects(&hit.shape, body.transform(), &hit.transform);

    // Coincident centers give no direction to slide along
    if slide == Vec2::ZERO {
        return Resolution {
            steps: 0,
            separated: !colliding,
        };
    }

    let mut steps = 0;
    while colliding && steps < RESOLUTION_MAX_ITERATIONS {
        body.translate(slide * RESOLUTION_STEP);
        colliding = shape.intersects(&hit.shape, body.transform(), &hit.transform);
        steps += 1;
    }

    if colliding {
        log::warn!(
            "Interpenetration with {} unresolved after {} steps",
            hit.id,
            steps
        );
    }

    Resolution {
        steps,
        separated: !colliding,
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Velocity change for one side of a restitution impulse
///
/// `normal` points from this body toward the other one. The returned delta is
/// `normal * j / mass` with `j = -(1 + e)(v_rel · n) / (1/m + 1/m_other)`.
pub fn impulse_velocity_change(
    velocity: Vec2,
    mass: f32,
    other_velocity: Vec2,
    other_mass: f32,
    normal: Vec2,
    restitution: f32,
) -> Vec2 {
    let relative = velocity - other_velocity;
    let inverse_masses = 1.0 / mass + 1.0 / other_mass;
    let impulse = -(1.0 + restitution) * relative.dot(normal) / inverse_masses;
    normal * (impulse / mass)
}
