//! Arena Duel - two robots, projectiles and obstacles in a bounded 2D arena
//!
//! Core modules:
//! - `sim`: Entity simulation (kinematics, shapes, collisions, controllers)
//! - `fsm`: Generic finite-state machine sequencing game phases
//! - `game`: Phase states and the host frame loop
//! - `renderer`: Render-side interface (draw requests, light proxies)
//! - `settings` / `tuning`: Data-driven configuration

pub mod error;
pub mod fsm;
pub mod game;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, FsmError, SetupError, ShapeError};
pub use game::Game;
pub use settings::Settings;

use glam::Vec2;
use std::f32::consts::TAU;

/// Fixed geometric constants (not tunable through settings)
pub mod consts {
    /// Largest frame delta the host loop will integrate
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Robot hull (circle approximation)
    pub const ROBOT_RADIUS: f32 = 60.0;
    pub const ROBOT_SUBDIVISIONS: usize = 24;
    /// Distance from robot center to the turret tip
    pub const TURRET_LENGTH: f32 = 75.0;
    pub const TURRET_WIDTH: f32 = 20.0;

    /// Projectile hulls
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    pub const EXPLODING_PROJECTILE_RADIUS: f32 = 13.0;
    pub const PROJECTILE_SUBDIVISIONS: usize = 6;
    pub const OBSTACLE_SUBDIVISIONS: usize = 24;

    /// Fragments of a cluster burst start this far from the burst point
    pub const CLUSTER_SPAWN_MARGIN: f32 = 20.0;

    /// Interpenetration resolution: step length and iteration cap
    pub const RESOLUTION_STEP: f32 = 1.0;
    pub const RESOLUTION_MAX_ITERATIONS: usize = 75;

    /// CPU robots push toward their target at this fraction of the move force
    pub const CPU_FORCE_SCALE: f32 = 0.5;

    /// Starting positions of the two duelists
    pub const PLAYER_START: (f32, f32) = (500.0, 0.0);
    pub const CPU_START: (f32, f32) = (-500.0, 0.0);
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of a vector measured from +x (radians, atan2 convention)
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-5);
        assert_eq!(wrap_angle(0.0), 0.0);
        assert!(wrap_angle(-1e-9) < TAU);
    }

    #[test]
    fn test_polar_round_trip_heading() {
        let v = polar_to_cartesian(2.0, PI / 3.0);
        assert!((v.length() - 2.0).abs() < 1e-5);
        assert!((heading(v) - PI / 3.0).abs() < 1e-5);
    }
}
