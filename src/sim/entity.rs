//! Entities: shared kinematics plus per-kind behavior
//!
//! Every simulated object is an [`Entity`]: a [`Body`] (kinematic state and
//! world transform), an optional shared [`ConvexShape`], an alive flag and an
//! [`EntityKind`] carrying the per-kind data. The kind decides how the three
//! hooks behave:
//! - `update`: once per frame while alive
//! - `on_collision`: once per contact, with a snapshot of the other entity
//! - `kill`: exactly once, on the frame the entity stops being alive

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::sync::Arc;

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use super::arbiter::{Admissions, SimEvent};
use super::control::{InputState, RobotControl, RobotSnapshot};
use super::obstacle::Obstacle;
use super::projectile::Projectile;
use super::robot::Robot;
use super::shape::ConvexShape;
use crate::error::SetupError;
use crate::renderer::{DrawRequest, Lights, RenderSink};
use crate::wrap_angle;

/// Stable handle to an entity owned by the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Placeholder carried until the arbiter admits the entity
    pub const UNASSIGNED: EntityId = EntityId(0);
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Generic,
    Robot,
    Projectile,
    Obstacle,
}

/// Kinematic state
///
/// `transform` is always rotation by `orientation` followed by translation by
/// `position`; every setter that touches either rebuilds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Radians, kept in [0, 2π)
    orientation: f32,
    pub angular_velocity: f32,
    mass: f32,
    transform: Affine2,
}

impl Body {
    pub fn new(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            orientation: 0.0,
            angular_velocity: 0.0,
            mass,
            transform: Affine2::from_translation(position),
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.rebuild_transform();
    }

    /// Shift the body without touching its velocity
    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    #[inline]
    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: f32) {
        self.orientation = wrap_angle(orientation);
        self.rebuild_transform();
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn transform(&self) -> &Affine2 {
        &self.transform
    }

    /// Semi-implicit Euler step
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.orientation = wrap_angle(self.orientation + self.angular_velocity * dt);
        self.rebuild_transform();
    }

    fn rebuild_transform(&mut self) {
        self.transform = Affine2::from_angle_translation(self.orientation, self.position);
    }
}

/// Per-kind data and behavior
#[derive(Debug)]
pub enum EntityKind {
    Generic,
    Robot(Robot),
    Projectile(Projectile),
    Obstacle(Obstacle),
}

impl EntityKind {
    pub fn tag(&self) -> Kind {
        match self {
            EntityKind::Generic => Kind::Generic,
            EntityKind::Robot(_) => Kind::Robot,
            EntityKind::Projectile(_) => Kind::Projectile,
            EntityKind::Obstacle(_) => Kind::Obstacle,
        }
    }
}

/// Everything an entity may touch during its update
pub struct FrameContext<'a> {
    /// Device state for player-driven controllers
    pub input: &'a InputState,
    /// Robots as they were at the start of this frame's update pass
    pub robots: &'a [RobotSnapshot],
    /// Queue for entities spawned this frame (live next frame)
    pub admissions: &'a mut Admissions,
    pub lights: &'a mut Lights,
    pub events: &'a mut Vec<SimEvent>,
}

/// Snapshot of the other party in a collision, taken before either callback
#[derive(Debug, Clone)]
pub struct Contact {
    pub id: EntityId,
    pub kind: Kind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub transform: Affine2,
    pub shape: Arc<ConvexShape>,
}

/// Effect a collision callback asks the arbiter to apply to the other entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Damage(i32),
}

/// A simulated object
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    alive: bool,
    body: Body,
    shape: Option<Arc<ConvexShape>>,
    kind: EntityKind,
}

impl Entity {
    pub fn new(body: Body, shape: Option<Arc<ConvexShape>>, kind: EntityKind) -> Self {
        Self {
            id: EntityId::UNASSIGNED,
            alive: true,
            body,
            shape,
            kind,
        }
    }

    /// Plain kinematic entity with no per-kind behavior
    pub fn generic(body: Body, shape: Option<Arc<ConvexShape>>) -> Self {
        Self::new(body, shape, EntityKind::Generic)
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Flag for removal at the next kill pass
    pub fn mark_dead(&mut self) {
        self.alive = false;
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    #[inline]
    pub fn shape(&self) -> Option<&Arc<ConvexShape>> {
        self.shape.as_ref()
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    pub fn tag(&self) -> Kind {
        self.kind.tag()
    }

    pub fn robot(&self) -> Option<&Robot> {
        match &self.kind {
            EntityKind::Robot(robot) => Some(robot),
            _ => None,
        }
    }

    pub fn robot_mut(&mut self) -> Option<&mut Robot> {
        match &mut self.kind {
            EntityKind::Robot(robot) => Some(robot),
            _ => None,
        }
    }

    pub fn projectile(&self) -> Option<&Projectile> {
        match &self.kind {
            EntityKind::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }

    pub fn obstacle(&self) -> Option<&Obstacle> {
        match &self.kind {
            EntityKind::Obstacle(obstacle) => Some(obstacle),
            _ => None,
        }
    }

    /// Called by the arbiter when the entity is queued for admission
    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
        if let EntityKind::Robot(robot) = &mut self.kind {
            robot.attach_control_to(id);
        }
    }

    /// Replace a robot's controller, pointing the new one at this robot
    pub fn attach_controller(&mut self, control: Box<dyn RobotControl>) -> Result<(), SetupError> {
        let id = self.id;
        match &mut self.kind {
            EntityKind::Robot(robot) => {
                robot.set_controller(id, control);
                Ok(())
            }
            _ => Err(SetupError::NotARobot { id }),
        }
    }

    /// Robot state visible to controllers
    pub fn robot_snapshot(&self) -> Option<RobotSnapshot> {
        self.robot().map(|robot| RobotSnapshot {
            id: self.id,
            position: self.body.position(),
            velocity: self.body.velocity,
            acceleration: self.body.acceleration,
            turret: robot.turret(),
            health: robot.health(),
        })
    }

    pub fn update(&mut self, dt: f32, ctx: &mut FrameContext<'_>) {
        match &mut self.kind {
            EntityKind::Generic | EntityKind::Obstacle(_) => self.body.integrate(dt),
            EntityKind::Robot(robot) => robot.update(self.id, &mut self.body, dt, ctx),
            EntityKind::Projectile(projectile) => {
                projectile.update(self.id, &mut self.body, &mut self.alive, dt, ctx)
            }
        }
    }

    /// Snapshot used as the other party when this entity collides
    pub fn contact(&self) -> Option<Contact> {
        self.shape.as_ref().map(|shape| Contact {
            id: self.id,
            kind: self.tag(),
            position: self.body.position(),
            velocity: self.body.velocity,
            mass: self.body.mass(),
            transform: *self.body.transform(),
            shape: Arc::clone(shape),
        })
    }

    /// React to touching `hit`; may return an effect for the other entity
    pub fn on_collision(&mut self, hit: &Contact) -> Option<Impact> {
        let shape = self.shape.as_deref()?;
        match &mut self.kind {
            EntityKind::Generic | EntityKind::Obstacle(_) => None,
            EntityKind::Robot(robot) => {
                robot.on_collision(&mut self.body, shape, hit);
                None
            }
            EntityKind::Projectile(projectile) => {
                projectile.on_collision(&mut self.body, &mut self.alive, shape, hit)
            }
        }
    }

    /// Apply an effect produced by another entity's collision callback
    pub fn apply_impact(&mut self, impact: Impact, source: EntityId, events: &mut Vec<SimEvent>) {
        if let (Impact::Damage(amount), EntityKind::Robot(robot)) = (impact, &mut self.kind) {
            robot.apply_damage(amount);
            log::debug!(
                "Robot {} took {} damage from {} (health {})",
                self.id,
                amount,
                source,
                robot.health()
            );
            events.push(SimEvent::ProjectileHit {
                projectile: source,
                robot: self.id,
                damage: amount,
            });
        }
    }

    /// Terminal teardown, run once before removal
    pub fn kill(&mut self, lights: &mut Lights, events: &mut Vec<SimEvent>) {
        if let EntityKind::Projectile(projectile) = &mut self.kind {
            projectile.kill(lights);
        }
        log::debug!("Entity {} ({:?}) removed", self.id, self.tag());
        events.push(SimEvent::Killed {
            id: self.id,
            kind: self.tag(),
        });
    }

    /// Submit draw requests for this entity
    pub fn render(&self, sink: &mut dyn RenderSink) {
        match &self.kind {
            EntityKind::Generic => {}
            EntityKind::Robot(robot) => {
                sink.submit(DrawRequest::new(self.id, "robot", *self.body.transform()));
                sink.submit(DrawRequest::new(
                    self.id,
                    "turret",
                    turret_transform(self.body.position(), robot.turret()),
                ));
            }
            EntityKind::Projectile(projectile) => {
                sink.submit(DrawRequest::new(
                    self.id,
                    projectile.material(),
                    *self.body.transform(),
                ));
            }
            EntityKind::Obstacle(obstacle) => {
                if obstacle.is_visible() {
                    sink.submit(DrawRequest::new(
                        self.id,
                        obstacle.material(),
                        *self.body.transform(),
                    ));
                }
            }
        }
    }
}

/// Turret quad: pushed half its length forward, rotated, placed on the robot
fn turret_transform(position: Vec2, turret: f32) -> Affine2 {
    Affine2::from_translation(position)
        * Affine2::from_angle(turret)
        * Affine2::from_translation(Vec2::new(0.0, crate::consts::TURRET_LENGTH / 2.0))
}

/// Unit vector a turret at `turret` radians fires along ("forward = up")
#[inline]
pub fn turret_direction(turret: f32) -> Vec2 {
    crate::polar_to_cartesian(1.0, turret + FRAC_PI_2)
}
