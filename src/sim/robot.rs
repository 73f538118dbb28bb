//! Robots: force-driven bodies with a turret and two weapons
//!
//! A robot never decides anything itself. Each update it asks its attached
//! controller for a [`ControlCommand`], applies it (force, turret aim,
//! trigger pulls), advances weapon cool-downs, integrates forces and friction
//! and finally runs the shared Euler step.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arbiter::SimEvent;
use super::collision::{collision_normal, impulse_velocity_change, resolve_interpenetration};
use super::control::{ControlCommand, ControlFrame, NoControl, RobotControl, RobotView};
use super::entity::{
    Body, Contact, Entity, EntityId, EntityKind, FrameContext, Kind, turret_direction,
};
use super::projectile::{Projectile, ProjectileSpec};
use super::shape::ConvexShape;
use crate::consts::TURRET_LENGTH;
use crate::tuning::RobotTuning;

/// Weapon slot selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponSlot {
    /// Plain projectile
    Primary,
    /// Exploding projectile
    Secondary,
}

/// A projectile launcher with its own cool-down
#[derive(Debug, Clone)]
pub struct Weapon {
    interval: f32,
    since_last_shot: f32,
    spec: Arc<ProjectileSpec>,
}

impl Weapon {
    /// Starts loaded: the first shot is available immediately
    pub fn new(interval: f32, spec: Arc<ProjectileSpec>) -> Self {
        Self {
            interval,
            since_last_shot: interval,
            spec,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.since_last_shot >= self.interval
    }

    pub fn spec(&self) -> &ProjectileSpec {
        &self.spec
    }
}

/// Projectile templates for the two weapon slots
#[derive(Debug, Clone)]
pub struct Loadout {
    pub primary: Arc<ProjectileSpec>,
    pub secondary: Arc<ProjectileSpec>,
}

#[derive(Debug)]
pub struct Robot {
    health: i32,
    /// Accumulated this frame, cleared after integration
    force: Vec2,
    /// Turret angle; 0 points along +y
    turret: f32,
    friction: f32,
    restitution: f32,
    primary: Weapon,
    secondary: Weapon,
    control: Box<dyn RobotControl>,
}

impl Robot {
    pub fn new(tuning: &RobotTuning, loadout: Loadout) -> Self {
        Self {
            health: tuning.start_health,
            force: Vec2::ZERO,
            turret: 0.0,
            friction: tuning.friction,
            restitution: tuning.restitution,
            primary: Weapon::new(tuning.primary_interval, loadout.primary),
            secondary: Weapon::new(tuning.secondary_interval, loadout.secondary),
            control: Box::new(NoControl::default()),
        }
    }

    /// Build a robot entity at `position` driven by `control`
    pub fn spawn(
        position: Vec2,
        tuning: &RobotTuning,
        loadout: Loadout,
        shape: Arc<ConvexShape>,
        control: Box<dyn RobotControl>,
    ) -> Entity {
        let mut robot = Self::new(tuning, loadout);
        robot.control = control;
        Entity::new(
            Body::new(position, tuning.mass),
            Some(shape),
            EntityKind::Robot(robot),
        )
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    /// Health may go below zero; what that means is up to the caller
    pub fn apply_damage(&mut self, amount: i32) {
        self.health -= amount;
    }

    pub fn turret(&self) -> f32 {
        self.turret
    }

    pub fn set_turret(&mut self, turret: f32) {
        self.turret = turret;
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Force accumulated so far this frame
    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn weapon(&self, slot: WeaponSlot) -> &Weapon {
        match slot {
            WeaponSlot::Primary => &self.primary,
            WeaponSlot::Secondary => &self.secondary,
        }
    }

    pub fn control(&self) -> &dyn RobotControl {
        self.control.as_ref()
    }

    pub(crate) fn attach_control_to(&mut self, id: EntityId) {
        self.control.attach(id);
    }

    pub(crate) fn set_controller(&mut self, id: EntityId, mut control: Box<dyn RobotControl>) {
        control.attach(id);
        self.control = control;
    }

    pub(crate) fn update(
        &mut self,
        id: EntityId,
        body: &mut Body,
        dt: f32,
        ctx: &mut FrameContext<'_>,
    ) {
        let frame = ControlFrame {
            robot: RobotView {
                id,
                position: body.position(),
                velocity: body.velocity,
                turret: self.turret,
                health: self.health,
            },
            robots: ctx.robots,
            input: ctx.input,
            dt,
        };
        if self.control.attached_to().is_some() {
            let command = self.control.update(&frame);
            self.execute(command, id, body, ctx);
        }

        self.primary.since_last_shot += dt;
        self.secondary.since_last_shot += dt;

        let mass = body.mass();
        body.velocity += self.force / mass * dt;

        // Friction opposes motion but never reverses it
        let speed = body.velocity.length();
        let slowdown = (self.friction / mass * dt).min(speed);
        body.velocity -= body.velocity.normalize_or_zero() * slowdown;

        self.force = Vec2::ZERO;
        body.integrate(dt);
    }

    fn execute(
        &mut self,
        command: ControlCommand,
        id: EntityId,
        body: &Body,
        ctx: &mut FrameContext<'_>,
    ) {
        self.force += command.force;
        if let Some(turret) = command.turret {
            self.turret = turret;
        }
        if command.fire_primary {
            self.fire(WeaponSlot::Primary, id, body, ctx);
        }
        if command.fire_secondary {
            self.fire(WeaponSlot::Secondary, id, body, ctx);
        }
    }

    /// Launch from the turret tip if the slot has cooled down
    fn fire(
        &mut self,
        slot: WeaponSlot,
        id: EntityId,
        body: &Body,
        ctx: &mut FrameContext<'_>,
    ) {
        let turret = self.turret;
        let weapon = match slot {
            WeaponSlot::Primary => &mut self.primary,
            WeaponSlot::Secondary => &mut self.secondary,
        };
        if !weapon.is_ready() {
            return;
        }
        weapon.since_last_shot = 0.0;

        let direction = turret_direction(turret);
        let muzzle = body.position() + direction * TURRET_LENGTH;
        let projectile = Projectile::launch(&weapon.spec, muzzle, direction, body.velocity);
        let projectile = ctx.admissions.admit(projectile);

        ctx.events.push(SimEvent::Fired {
            robot: id,
            projectile,
            slot,
        });
    }

    pub(crate) fn on_collision(&mut self, body: &mut Body, shape: &ConvexShape, hit: &Contact) {
        self.control.on_collision(hit);

        // Projectile impacts are handled by the projectile
        if !matches!(hit.kind, Kind::Robot | Kind::Obstacle) {
            return;
        }

        resolve_interpenetration(body, shape, hit);

        let normal = collision_normal(body.position(), hit.position);
        body.velocity += impulse_velocity_change(
            body.velocity,
            body.mass(),
            hit.velocity,
            hit.mass,
            normal,
            self.restitution,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Lights;
    use crate::settings::Settings;
    use crate::sim::arbiter::Admissions;
    use crate::sim::control::InputState;
    use crate::tuning::{ExplodingTuning, ProjectileTuning};
    use glam::Affine2;
    use std::f32::consts::PI;

    /// Always pushes right and holds both triggers
    #[derive(Debug, Default)]
    struct Eager {
        attached: Option<EntityId>,
    }

    impl RobotControl for Eager {
        fn attach(&mut self, robot: EntityId) {
            self.attached = Some(robot);
        }

        fn attached_to(&self) -> Option<EntityId> {
            self.attached
        }

        fn update(&mut self, _frame: &ControlFrame<'_>) -> ControlCommand {
            ControlCommand {
                force: Vec2::new(10.0, 0.0),
                turret: Some(-PI / 2.0),
                fire_primary: true,
                fire_secondary: true,
            }
        }
    }

    fn tuning() -> RobotTuning {
        RobotTuning {
            mass: 2.0,
            start_health: 100,
            friction: 0.0,
            restitution: 1.0,
            primary_interval: 0.25,
            secondary_interval: 1.0,
        }
    }

    fn loadout() -> Loadout {
        let settings = Settings::builtin().unwrap();
        let plain = ProjectileTuning::from_settings(&settings).unwrap();
        let exploding = ExplodingTuning::from_settings(&settings).unwrap();
        let primary = Arc::new(ProjectileSpec::plain(
            &plain,
            Arc::new(ConvexShape::circle(5.0, 6).unwrap()),
        ));
        let secondary = Arc::new(ProjectileSpec::exploding(
            &exploding,
            Arc::new(ConvexShape::circle(13.0, 6).unwrap()),
            Arc::clone(&primary),
        ));
        Loadout { primary, secondary }
    }

    fn run_update(entity: &mut Entity, admissions: &mut Admissions, dt: f32) -> Vec<SimEvent> {
        let input = InputState::default();
        let mut lights = Lights::default();
        let mut events = Vec::new();
        let mut ctx = FrameContext {
            input: &input,
            robots: &[],
            admissions,
            lights: &mut lights,
            events: &mut events,
        };
        entity.update(dt, &mut ctx);
        events
    }

    fn robot_contact(position: Vec2, velocity: Vec2, mass: f32) -> Contact {
        Contact {
            id: EntityId(7),
            kind: Kind::Robot,
            position,
            velocity,
            mass,
            transform: Affine2::from_translation(position),
            shape: Arc::new(ConvexShape::circle(60.0, 24).unwrap()),
        }
    }

    #[test]
    fn test_force_integration_and_reset() {
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut entity = Robot::spawn(
            Vec2::ZERO,
            &tuning(),
            loadout(),
            shape,
            Box::new(NoControl::default()),
        );
        entity.robot_mut().unwrap().apply_force(Vec2::new(4.0, 0.0));

        let mut admissions = Admissions::default();
        run_update(&mut entity, &mut admissions, 0.5);

        // a = F/m = 2, v = 1, x = 0.5
        assert!((entity.body().velocity - Vec2::new(1.0, 0.0)).length() < 1e-5);
        assert!((entity.body().position() - Vec2::new(0.5, 0.0)).length() < 1e-5);
        assert_eq!(entity.robot().unwrap().force(), Vec2::ZERO);
    }

    #[test]
    fn test_friction_never_reverses_motion() {
        let mut tuning = tuning();
        tuning.friction = 1000.0;
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut entity = Robot::spawn(
            Vec2::ZERO,
            &tuning,
            loadout(),
            shape,
            Box::new(NoControl::default()),
        );
        entity.body_mut().velocity = Vec2::new(1.0, 0.0);

        let mut admissions = Admissions::default();
        run_update(&mut entity, &mut admissions, 0.1);
        assert_eq!(entity.body().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_firing_respects_cool_down() {
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut entity = Robot::spawn(
            Vec2::ZERO,
            &tuning(),
            loadout(),
            shape,
            Box::new(Eager::default()),
        );
        entity.assign_id(EntityId(1));
        let mut admissions = Admissions::default();

        // Both weapons start loaded
        let events = run_update(&mut entity, &mut admissions, 0.1);
        assert_eq!(admissions.len(), 2);
        assert_eq!(
            events.iter().filter(|e| matches!(e, SimEvent::Fired { .. })).count(),
            2
        );

        // 0.1s later neither weapon is ready
        run_update(&mut entity, &mut admissions, 0.1);
        assert_eq!(admissions.len(), 2);

        // Primary (0.25s) is ready again after two more updates
        run_update(&mut entity, &mut admissions, 0.1);
        run_update(&mut entity, &mut admissions, 0.1);
        assert_eq!(admissions.len(), 3);
    }

    #[test]
    fn test_fired_event_names_admitted_projectile() {
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut entity = Robot::spawn(
            Vec2::ZERO,
            &tuning(),
            loadout(),
            shape,
            Box::new(Eager::default()),
        );
        entity.assign_id(EntityId(1));
        let mut admissions = Admissions::default();

        let events = run_update(&mut entity, &mut admissions, 0.1);
        let fired: Vec<EntityId> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Fired { projectile, .. } => Some(*projectile),
                _ => None,
            })
            .collect();
        let admitted: Vec<EntityId> = admissions.pending().iter().map(Entity::id).collect();
        assert_eq!(fired, admitted);
    }

    #[test]
    fn test_projectile_spawns_at_turret_tip() {
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut entity = Robot::spawn(
            Vec2::new(10.0,
            0.0),
            &tuning(),
            loadout(),
            shape,
            Box::new(Eager::default()),
        );
        entity.assign_id(EntityId(1));
        let mut admissions = Admissions::default();
        run_update(&mut entity, &mut admissions, 0.01);

        // Turret at -π/2 fires along +x
        let first = admissions.pending().first().unwrap();
        let expected = Vec2::new(10.0 + TURRET_LENGTH, 0.0);
        assert!((first.body().position() - expected).length() < 1e-3);
        assert!(first.body().velocity.x > 0.0);
    }

    #[test]
    fn test_head_on_elastic_bounce() {
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut tuning = tuning();
        tuning.mass = 1.0;
        let mut left = Robot::spawn(
            Vec2::new(-50.0,
            0.0),
            &tuning,
            loadout(),
            Arc::clone(&shape),
            Box::new(NoControl::default()),
        );
        left.body_mut().velocity = Vec2::new(3.0, 0.0);

        let other = robot_contact(Vec2::new(50.0, 0.0), Vec2::new(-3.0, 0.0), 1.0);
        left.on_collision(&other);

        assert!((left.body().velocity - Vec2::new(-3.0, 0.0)).length() < 1e-4);
        // Pushed left, out of the other hull
        assert!(left.body().position().x < -50.0);
    }

    #[test]
    fn test_projectile_contact_ignored_by_robot() {
        let shape = Arc::new(ConvexShape::circle(60.0, 24).unwrap());
        let mut robot = Robot::spawn(
            Vec2::ZERO,
            &tuning(),
            loadout(),
            shape,
            Box::new(NoControl::default()),
        );
        robot.body_mut().velocity = Vec2::new(1.0, 0.0);
        let mut hit = robot_contact(Vec2::new(10.0, 0.0), Vec2::ZERO, 1.0);
        hit.kind = Kind::Projectile;

        assert!(robot.on_collision(&hit).is_none());
        assert_eq!(robot.body().velocity, Vec2::new(1.0, 0.0));
        assert_eq!(robot.body().position(), Vec2::ZERO);
    }

    #[test]
    fn test_damage_is_not_floored() {
        let mut robot = Robot::new(&tuning(), loadout());
        robot.apply_damage(150);
        assert_eq!(robot.health(), -50);
    }
}
