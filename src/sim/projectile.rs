//! Projectiles and exploding cluster rounds
//!
//! Both flavors share one type. A projectile whose spec carries a [`Cluster`]
//! bursts into fragments when its timer runs out instead of just expiring,
//! and drags a point light along while in flight.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;

use super::arbiter::SimEvent;
use super::collision::{collision_normal, reflect_velocity, resolve_interpenetration};
use super::entity::{Body, Contact, Entity, EntityId, EntityKind, FrameContext, Impact, Kind};
use super::shape::ConvexShape;
use crate::consts::CLUSTER_SPAWN_MARGIN;
use crate::polar_to_cartesian;
use crate::renderer::{LightId, Lights, PointLight};
use crate::tuning::{ExplodingTuning, ProjectileTuning};

/// Projectiles never take part in impulse exchange; the mass is nominal
const PROJECTILE_MASS: f32 = 1.0;

pub const PROJECTILE_MATERIAL: &str = "projectile";
pub const EXPLODING_MATERIAL: &str = "exploding_projectile";

/// Burst parameters of an exploding round
#[derive(Debug, Clone)]
pub struct Cluster {
    pub size: u32,
    pub fragment: Arc<ProjectileSpec>,
}

/// Template shared by every projectile a weapon fires
#[derive(Debug, Clone)]
pub struct ProjectileSpec {
    pub lifetime: f32,
    pub speed: f32,
    pub damage: i32,
    pub shape: Arc<ConvexShape>,
    pub material: &'static str,
    pub cluster: Option<Cluster>,
}

impl ProjectileSpec {
    pub fn plain(tuning: &ProjectileTuning, shape: Arc<ConvexShape>) -> Self {
        Self {
            lifetime: tuning.lifetime,
            speed: tuning.speed,
            damage: tuning.damage,
            shape,
            material: PROJECTILE_MATERIAL,
            cluster: None,
        }
    }

    /// Exploding round that bursts into `fragment` projectiles
    pub fn exploding(
        tuning: &ExplodingTuning,
        shape: Arc<ConvexShape>,
        fragment: Arc<ProjectileSpec>,
    ) -> Self {
        Self {
            lifetime: tuning.timer,
            speed: tuning.speed,
            damage: tuning.damage,
            shape,
            material: EXPLODING_MATERIAL,
            cluster: Some(Cluster {
                size: tuning.cluster_size,
                fragment,
            }),
        }
    }
}

#[derive(Debug)]
pub struct Projectile {
    age: f32,
    lifetime: f32,
    damage: i32,
    material: &'static str,
    cluster: Option<Cluster>,
    light: Option<LightId>,
}

impl Projectile {
    /// Build a projectile entity flying along `direction` on top of `inherited`
    pub fn launch(spec: &ProjectileSpec, start: Vec2, direction: Vec2, inherited: Vec2) -> Entity {
        let projectile = Self {
            age: 0.0,
            lifetime: spec.lifetime,
            damage: spec.damage,
            material: spec.material,
            cluster: spec.cluster.clone(),
            light: None,
        };
        let body =
            Body::new(start, PROJECTILE_MASS).with_velocity(inherited + direction * spec.speed);
        Entity::new(body, Some(Arc::clone(&spec.shape)), EntityKind::Projectile(projectile))
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn material(&self) -> &str {
        self.material
    }

    pub fn is_exploding(&self) -> bool {
        self.cluster.is_some()
    }

    pub fn light(&self) -> Option<LightId> {
        self.light
    }

    pub(crate) fn update(
        &mut self,
        id: EntityId,
        body: &mut Body,
        alive: &mut bool,
        dt: f32,
        ctx: &mut FrameContext<'_>,
    ) {
        self.age += dt;
        body.integrate(dt);

        if self.cluster.is_some() {
            self.track_light(body.position(), ctx.lights);
        }

        if self.age >= self.lifetime {
            *alive = false;
            if let Some(cluster) = &self.cluster {
                burst(id, body, cluster, ctx);
            }
        }
    }

    fn track_light(&mut self, position: Vec2, lights: &mut Lights) {
        match self.light {
            Some(light) => lights.set_position(light, position),
            None => self.light = Some(lights.register(PointLight::burst(position))),
        }
    }

    pub(crate) fn on_collision(
        &mut self,
        body: &mut Body,
        alive: &mut bool,
        shape: &ConvexShape,
        hit: &Contact,
    ) -> Option<Impact> {
        // Already spent on something else this frame
        if !*alive {
            return None;
        }

        match hit.kind {
            Kind::Robot => {
                *alive = false;
                Some(Impact::Damage(self.damage))
            }
            Kind::Obstacle | Kind::Projectile => {
                resolve_interpenetration(body, shape, hit);
                let normal = collision_normal(hit.position, body.position());
                if normal != Vec2::ZERO {
                    body.velocity = reflect_velocity(body.velocity, normal);
                }
                None
            }
            Kind::Generic => None,
        }
    }

    pub(crate) fn kill(&mut self, lights: &mut Lights) {
        if let Some(light) = self.light.take() {
            lights.remove(light);
        }
    }
}

/// Queue `cluster.size` fragments radiating from the burst point
fn burst(id: EntityId, body: &Body, cluster: &Cluster, ctx: &mut FrameContext<'_>) {
    let step = TAU / cluster.size as f32;
    for i in 0..cluster.size {
        let direction = polar_to_cartesian(1.0, step * i as f32);
        let start = body.position() + direction * CLUSTER_SPAWN_MARGIN;
        let fragment = Projectile::launch(&cluster.fragment, start, direction, body.velocity);
        ctx.admissions.admit(fragment);
    }

    log::debug!(
        "Projectile {} burst into {} fragments at {:?}",
        id,
        cluster.size,
        body.position()
    );
    ctx.events.push(SimEvent::ClusterBurst {
        id,
        position: body.position(),
        fragments: cluster.size,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arbiter::Admissions;
    use crate::sim::control::InputState;
    use glam::Affine2;

    fn plain_spec(lifetime: f32) -> Arc<ProjectileSpec> {
        Arc::new(ProjectileSpec::plain(
            &ProjectileTuning {
                lifetime,
                speed: 100.0,
                damage: 4,
            },
            Arc::new(ConvexShape::circle(5.0, 6).unwrap()),
        ))
    }

    fn exploding_spec(cluster_size: u32) -> ProjectileSpec {
        ProjectileSpec::exploding(
            &ExplodingTuning {
                timer: 1.0,
                speed: 50.0,
                damage: 15,
                cluster_size,
            },
            Arc::new(ConvexShape::circle(13.0, 6).unwrap()),
            plain_spec(2.0),
        )
    }

    struct Harness {
        input: InputState,
        admissions: Admissions,
        lights: Lights,
        events: Vec<SimEvent>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                input: InputState::default(),
                admissions: Admissions::default(),
                lights: Lights::default(),
                events: Vec::new(),
            }
        }

        fn update(&mut self, entity: &mut Entity, dt: f32) {
            let mut ctx = FrameContext {
                input: &self.input,
                robots: &[],
                admissions: &mut self.admissions,
                lights: &mut self.lights,
                events: &mut self.events,
            };
            entity.update(dt, &mut ctx);
        }
    }

    fn contact(kind: Kind, position: Vec2) -> Contact {
        Contact {
            id: EntityId(50),
            kind,
            position,
            velocity: Vec2::ZERO,
            mass: 1.0,
            transform: Affine2::from_translation(position),
            shape: Arc::new(ConvexShape::circle(40.0, 24).unwrap()),
        }
    }

    #[test]
    fn test_launch_adds_inherited_velocity() {
        let entity = Projectile::launch(&plain_spec(2.0), Vec2::ONE, Vec2::Y, Vec2::new(3.0, 0.0));
        assert_eq!(entity.body().position(), Vec2::ONE);
        assert!((entity.body().velocity - Vec2::new(3.0, 100.0)).length() < 1e-5);
        assert_eq!(entity.tag(), Kind::Projectile);
    }

    #[test]
    fn test_expires_on_fourth_update() {
        let mut entity = Projectile::launch(&plain_spec(2.0), Vec2::ZERO, Vec2::X, Vec2::ZERO);
        let mut harness = Harness::new();

        for _ in 0..3 {
            harness.update(&mut entity, 0.5);
            assert!(entity.is_alive());
        }
        harness.update(&mut entity, 0.5);
        assert!(!entity.is_alive());
        assert!(harness.admissions.is_empty());
    }

    #[test]
    fn test_cluster_burst_spreads_evenly() {
        let mut entity = Projectile::launch(
            &exploding_spec(6),
            Vec2::new(10.0, 10.0),
            Vec2::X,
            Vec2::ZERO,
        );
        let mut harness = Harness::new();
        harness.update(&mut entity, 1.0);
        assert!(!entity.is_alive());

        let origin = entity.body().position();
        let fragments = harness.admissions.pending();
        assert_eq!(fragments.len(), 6);

        let mut sum = Vec2::ZERO;
        for (i, fragment) in fragments.iter().enumerate() {
            let offset = fragment.body().position() - origin;
            assert!((offset.length() - CLUSTER_SPAWN_MARGIN).abs() < 1e-3);

            let direction = offset.normalize();
            let expected = polar_to_cartesian(1.0, i as f32 * TAU / 6.0);
            assert!((direction - expected).length() < 1e-4);
            sum += direction;

            // Burst velocity plus the fragment's own speed
            let own = fragment.body().velocity - entity.body().velocity;
            assert!((own - direction * 100.0).length() < 1e-2);
            assert!(!fragment.projectile().unwrap().is_exploding());
        }
        assert!(sum.length() < 1e-4);
        let burst = |e: &SimEvent| matches!(e, SimEvent::ClusterBurst { fragments: 6, .. });
        assert!(harness.events.iter().any(burst));
    }

    #[test]
    fn test_exploding_light_follows_and_is_released() {
        let mut entity = Projectile::launch(&exploding_spec(3), Vec2::ZERO, Vec2::X, Vec2::ZERO);
        let mut harness = Harness::new();

        harness.update(&mut entity, 0.1);
        let light = entity.projectile().unwrap().light().unwrap();
        assert_eq!(harness.lights.get(light).unwrap().position, entity.body().position());

        harness.update(&mut entity, 0.1);
        assert_eq!(harness.lights.len(), 1);
        assert_eq!(harness.lights.get(light).unwrap().position, entity.body().position());

        entity.kill(&mut harness.lights, &mut harness.events);
        assert!(harness.lights.is_empty());
    }

    #[test]
    fn test_plain_projectile_has_no_light() {
        let mut entity = Projectile::launch(&plain_spec(2.0), Vec2::ZERO, Vec2::X, Vec2::ZERO);
        let mut harness = Harness::new();
        harness.update(&mut entity, 0.1);
        assert!(harness.lights.is_empty());
    }

    #[test]
    fn test_robot_hit_deals_damage_once() {
        let mut entity = Projectile::launch(&plain_spec(2.0), Vec2::ZERO, Vec2::X, Vec2::ZERO);
        let robot = contact(Kind::Robot, Vec2::new(10.0, 0.0));

        assert_eq!(entity.on_collision(&robot), Some(Impact::Damage(4)));
        assert!(!entity.is_alive());
        assert_eq!(entity.on_collision(&robot), None);
    }

    #[test]
    fn test_bounces_off_obstacle() {
        let mut entity = Projectile::launch(
            &plain_spec(2.0),
            Vec2::new(-42.0, 0.0),
            Vec2::X,
            Vec2::ZERO,
        );
        let obstacle = contact(Kind::Obstacle, Vec2::ZERO);

        assert_eq!(entity.on_collision(&obstacle), None);
        assert!(entity.is_alive());
        assert!((entity.body().velocity - Vec2::new(-100.0, 0.0)).length() < 1e-3);
        assert!(entity.body().position().x <= -42.0);
    }
}
