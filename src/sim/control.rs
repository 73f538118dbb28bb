//! Robot controllers
//!
//! A controller is attached to one robot and turns what it can see into a
//! [`ControlCommand`] each update. It never mutates the robot directly.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Contact, EntityId, turret_direction};
use crate::consts::CPU_FORCE_SCALE;
use crate::heading;
use crate::tuning::ControlTuning;

/// Keyboard and pointer state for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Pointer position in world space
    pub aim_target: Vec2,
    pub primary: bool,
    pub secondary: bool,
    /// Menu confirmation (enter / click)
    pub confirm: bool,
}

/// Robot state captured at the start of the update pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RobotSnapshot {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub turret: f32,
    pub health: i32,
}

/// Read-only view of the controlled robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotView {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub turret: f32,
    pub health: i32,
}

/// Everything a controller may look at during one update
#[derive(Debug, Clone, Copy)]
pub struct ControlFrame<'a> {
    pub robot: RobotView,
    pub robots: &'a [RobotSnapshot],
    pub input: &'a InputState,
    pub dt: f32,
}

impl ControlFrame<'_> {
    /// The tracked robot, or the first robot that is not this one
    pub fn opponent(&self, tracked: Option<EntityId>) -> Option<&RobotSnapshot> {
        match tracked {
            Some(id) => self.robots.iter().find(|r| r.id == id),
            None => self.robots.iter().find(|r| r.id != self.robot.id),
        }
    }
}

/// What a controller asks its robot to do this update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlCommand {
    pub force: Vec2,
    /// New turret angle, if the controller aims
    pub turret: Option<f32>,
    pub fire_primary: bool,
    pub fire_secondary: bool,
}

/// Strategy driving one robot
pub trait RobotControl: fmt::Debug {
    /// Point this controller at `robot`, replacing any previous robot
    fn attach(&mut self, robot: EntityId);

    fn attached_to(&self) -> Option<EntityId>;

    /// Only called once attached
    fn update(&mut self, frame: &ControlFrame<'_>) -> ControlCommand;

    fn on_collision(&mut self, _hit: &Contact) {}
}

/// Does nothing; the default for a fresh robot
#[derive(Debug, Default)]
pub struct NoControl {
    robot: Option<EntityId>,
}

impl RobotControl for NoControl {
    fn attach(&mut self, robot: EntityId) {
        self.robot = Some(robot);
    }

    fn attached_to(&self) -> Option<EntityId> {
        self.robot
    }

    fn update(&mut self, _frame: &ControlFrame<'_>) -> ControlCommand {
        ControlCommand::default()
    }
}

/// Maps device input to force, aim and triggers
#[derive(Debug)]
pub struct PlayerControl {
    robot: Option<EntityId>,
    move_force: f32,
}

impl PlayerControl {
    pub fn new(tuning: &ControlTuning) -> Self {
        Self {
            robot: None,
            move_force: tuning.move_force,
        }
    }
}

impl RobotControl for PlayerControl {
    fn attach(&mut self, robot: EntityId) {
        self.robot = Some(robot);
    }

    fn attached_to(&self) -> Option<EntityId> {
        self.robot
    }

    fn update(&mut self, frame: &ControlFrame<'_>) -> ControlCommand {
        let input = frame.input;
        let axis = |positive: bool, negative: bool| positive as i32 as f32 - negative as i32 as f32;
        let direction = Vec2::new(axis(input.right, input.left), axis(input.up, input.down));

        ControlCommand {
            force: direction.normalize_or_zero() * self.move_force,
            turret: Some(heading(input.aim_target - frame.robot.position) - FRAC_PI_2),
            fire_primary: input.primary,
            fire_secondary: input.secondary,
        }
    }
}

/// Chases a target, leads its shots and lobs exploding rounds at random
#[derive(Debug)]
pub struct CpuControl {
    robot: Option<EntityId>,
    target: Option<EntityId>,
    tuning: ControlTuning,
    rng: Pcg32,
}

impl CpuControl {
    pub fn new(tuning: &ControlTuning, seed: u64) -> Self {
        Self {
            robot: None,
            target: None,
            tuning: *tuning,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Track a specific robot instead of the first one in sight
    pub fn track(&mut self, target: EntityId) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }
}

impl RobotControl for CpuControl {
    fn attach(&mut self, robot: EntityId) {
        self.robot = Some(robot);
    }

    fn attached_to(&self) -> Option<EntityId> {
        self.robot
    }

    fn update(&mut self, frame: &ControlFrame<'_>) -> ControlCommand {
        let Some(opponent) = frame.opponent(self.target) else {
            return ControlCommand::default();
        };
        let me = &frame.robot;

        let force = (opponent.position - me.position).normalize_or_zero()
            * self.tuning.move_force
            * CPU_FORCE_SCALE;
        let turret = intercept_turret(
            me.position,
            me.velocity,
            opponent.position,
            opponent.velocity,
            self.tuning.projectile_speed,
            self.tuning.targeting_precision,
        );
        let fire_secondary = self.rng.random::<f32>() < self.tuning.exploding_probability;

        ControlCommand {
            force,
            turret: Some(turret),
            fire_primary: true,
            fire_secondary,
        }
    }
}

/// Turret angle that leads a linearly moving target
///
/// Fixed-point iteration on the time of flight. The first estimate is the
/// straight-line distance over the projectile speed; each round predicts
/// where the target will be, aims there and recomputes the flight time from
/// the shot's real speed (shooter velocity included). After `iterations`
/// rounds the turret aims at the position predicted for the final time.
pub fn intercept_turret(
    shooter: Vec2,
    shooter_velocity: Vec2,
    target: Vec2,
    target_velocity: Vec2,
    projectile_speed: f32,
    iterations: u32,
) -> f32 {
    let aim_at = |point: Vec2| heading(point - shooter) - FRAC_PI_2;
    if projectile_speed <= f32::EPSILON {
        return aim_at(target);
    }

    let mut time = shooter.distance(target) / projectile_speed;
    for _ in 0..iterations {
        let predicted = target + target_velocity * time;
        let shot = shooter_velocity + turret_direction(aim_at(predicted)) * projectile_speed;
        let speed = shot.length();
        if speed <= f32::EPSILON {
            break;
        }
        time = shooter.distance(predicted) / speed;
    }
    aim_at(target + target_velocity * time)
}
