//! Duel arena: one player robot, one CPU robot, a column of obstacles

use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::arbiter::{EntityArbiter, SimEvent};
use super::control::{CpuControl, InputState, PlayerControl};
use super::entity::EntityId;
use super::obstacle::Obstacle;
use super::projectile::ProjectileSpec;
use super::robot::{Loadout, Robot};
use super::shape::{ConvexShape, ShapeRegistry};
use crate::consts::{
    CPU_START, EXPLODING_PROJECTILE_RADIUS, OBSTACLE_SUBDIVISIONS, PLAYER_START,
    PROJECTILE_RADIUS, PROJECTILE_SUBDIVISIONS, ROBOT_RADIUS, ROBOT_SUBDIVISIONS,
};
use crate::error::SetupError;
use crate::renderer::{LightId, PointLight, RenderSink};
use crate::settings::Settings;
use crate::tuning::{ArenaTuning, ControlTuning, ExplodingTuning, ProjectileTuning, RobotTuning};

pub const ROBOT_SHAPE: &str = "robot";
pub const PROJECTILE_SHAPE: &str = "projectile";
pub const EXPLODING_SHAPE: &str = "exploding_projectile";
pub const OBSTACLE_SHAPE: &str = "obstacle";

#[derive(Debug)]
pub struct Arena {
    arbiter: EntityArbiter,
    shapes: ShapeRegistry,
    tuning: ArenaTuning,
    player: EntityId,
    cpu: EntityId,
    robot_lights: Vec<(EntityId, LightId)>,
}

impl Arena {
    /// Build the duel from settings; `seed` drives obstacle scatter and the CPU
    pub fn new(settings: &Settings, seed: u64) -> Result<Self, SetupError> {
        let tuning = ArenaTuning::from_settings(settings)?;
        let robot_tuning = RobotTuning::from_settings(settings)?;
        let projectile_tuning = ProjectileTuning::from_settings(settings)?;
        let exploding_tuning = ExplodingTuning::from_settings(settings)?;
        let control_tuning = ControlTuning::from_settings(settings)?;

        let mut shapes = ShapeRegistry::new();
        shapes.insert(ROBOT_SHAPE, ConvexShape::circle(ROBOT_RADIUS, ROBOT_SUBDIVISIONS)?);
        shapes.insert(
            PROJECTILE_SHAPE,
            ConvexShape::circle(PROJECTILE_RADIUS, PROJECTILE_SUBDIVISIONS)?,
        );
        shapes.insert(
            EXPLODING_SHAPE,
            ConvexShape::circle(EXPLODING_PROJECTILE_RADIUS, PROJECTILE_SUBDIVISIONS)?,
        );
        shapes.insert(
            OBSTACLE_SHAPE,
            ConvexShape::circle(tuning.obstacle_radius, OBSTACLE_SUBDIVISIONS)?,
        );

        let primary = Arc::new(ProjectileSpec::plain(
            &projectile_tuning,
            shapes.get(PROJECTILE_SHAPE)?,
        ));
        let secondary = Arc::new(ProjectileSpec::exploding(
            &exploding_tuning,
            shapes.get(EXPLODING_SHAPE)?,
            Arc::clone(&primary),
        ));
        let loadout = Loadout { primary, secondary };

        let mut arbiter = EntityArbiter::new();
        let robot_shape = shapes.get(ROBOT_SHAPE)?;

        let player = arbiter.add(Robot::spawn(
            Vec2::from(PLAYER_START),
            &robot_tuning,
            loadout.clone(),
            Arc::clone(&robot_shape),
            Box::new(PlayerControl::new(&control_tuning)),
        ));

        let mut cpu_control = CpuControl::new(&control_tuning, seed.wrapping_add(1));
        cpu_control.track(player);
        let cpu = arbiter.add(Robot::spawn(
            Vec2::from(CPU_START),
            &robot_tuning,
            loadout,
            robot_shape,
            Box::new(cpu_control),
        ));

        let obstacle_shape = shapes.get(OBSTACLE_SHAPE)?;
        let mut rng = Pcg32::seed_from_u64(seed);
        for position in obstacle_layout(&tuning, &mut rng) {
            arbiter.add(Obstacle::spawn(
                position,
                robot_tuning.mass,
                Arc::clone(&obstacle_shape),
            ));
        }

        log::info!(
            "Arena {}x{} ready: player {}, cpu {}, {} obstacles (seed {})",
            tuning.width,
            tuning.height,
            player,
            cpu,
            tuning.num_obstacles,
            seed
        );

        Ok(Self {
            arbiter,
            shapes,
            tuning,
            player,
            cpu,
            robot_lights: Vec::new(),
        })
    }

    /// Light both robots; call when the duel becomes active
    pub fn begin(&mut self) {
        if !self.robot_lights.is_empty() {
            return;
        }
        for id in [self.player, self.cpu] {
            let position = self.robot_position(id).unwrap_or(Vec2::ZERO);
            let light = self.arbiter.lights_mut().register(PointLight::robot(position));
            self.robot_lights.push((id, light));
        }
    }

    /// Release the robot lights
    pub fn end(&mut self) {
        for (_, light) in self.robot_lights.drain(..) {
            self.arbiter.lights_mut().remove(light);
        }
    }

    pub fn update(&mut self, dt: f32, input: &InputState) {
        self.arbiter.update(dt, input);

        for (id, light) in &self.robot_lights {
            if let Some(position) = self.arbiter.get(*id).map(|e| e.body().position()) {
                self.arbiter.lights_mut().set_position(*light, position);
            }
        }
    }

    pub fn render(&self, sink: &mut dyn RenderSink) {
        self.arbiter.render(sink);
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.arbiter.drain_events()
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn cpu(&self) -> EntityId {
        self.cpu
    }

    /// Health of a live robot
    pub fn health(&self, id: EntityId) -> Option<i32> {
        self.arbiter.get(id)?.robot().map(|r| r.health())
    }

    pub fn robot_position(&self, id: EntityId) -> Option<Vec2> {
        self.arbiter.get(id).map(|e| e.body().position())
    }

    /// First robot at or below zero health, player checked first
    pub fn knocked_out(&self) -> Option<EntityId> {
        [self.player, self.cpu]
            .into_iter()
            .find(|id| self.health(*id).is_some_and(|h| h <= 0))
    }

    pub fn arbiter(&self) -> &EntityArbiter {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut EntityArbiter {
        &mut self.arbiter
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn tuning(&self) -> &ArenaTuning {
        &self.tuning
    }
}

/// Obstacle centers: a column from the top edge down, x scattered
///
/// The first sits `2r` below the top; each next one `2r + y_offset` lower.
/// x is uniform within `2r` of either side wall.
pub fn obstacle_layout(tuning: &ArenaTuning, rng: &mut impl Rng) -> Vec<Vec2> {
    let diameter = 2.0 * tuning.obstacle_radius;
    let half_span = tuning.width / 2.0 - diameter;
    let pitch = diameter + tuning.obstacle_y_offset;

    (0..tuning.num_obstacles)
        .map(|i| {
            let y = tuning.height / 2.0 - diameter - i as f32 * pitch;
            let x = if half_span > 0.0 {
                rng.random_range(-half_span..=half_span)
            } else {
                0.0
            };
            Vec2::new(x, y)
        })
        .collect()
}
