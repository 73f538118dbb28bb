//! Entity arbiter: ownership, per-frame ordering, pairwise collision sweep
//!
//! Frame protocol:
//! 1. Admit everything queued since the last frame
//! 2. Update live entities in list order
//! 3. Kill and drop entities that stopped being alive
//! 4. Sweep every unordered pair once: bounding circles, then the narrow test,
//!    then both collision callbacks
//!
//! Entities spawned during steps 2-4 wait in [`Admissions`] until the next
//! frame's step 1.

use std::mem;

use glam::Vec2;
use serde::Serialize;

use super::control::{InputState, RobotControl, RobotSnapshot};
use super::entity::{Entity, EntityId, FrameContext, Kind};
use super::robot::WeaponSlot;
use crate::error::SetupError;
use crate::renderer::{Lights, RenderSink};

/// Something worth telling the host about
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    Admitted {
        id: EntityId,
        kind: Kind,
    },
    Fired {
        robot: EntityId,
        projectile: EntityId,
        slot: WeaponSlot,
    },
    ProjectileHit {
        projectile: EntityId,
        robot: EntityId,
        damage: i32,
    },
    ClusterBurst {
        id: EntityId,
        position: Vec2,
        fragments: u32,
    },
    Killed {
        id: EntityId,
        kind: Kind,
    },
}

/// Entities waiting to join the live set
///
/// Ids are handed out here, so a spawner learns the id right away even though
/// the entity only goes live next frame.
#[derive(Debug)]
pub struct Admissions {
    pending: Vec<Entity>,
    next_id: u32,
}

impl Default for Admissions {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
        }
    }
}

impl Admissions {
    pub fn admit(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.assign_id(id);
        self.pending.push(entity);
        id
    }

    pub fn pending(&self) -> &[Entity] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn take(&mut self) -> Vec<Entity> {
        mem::take(&mut self.pending)
    }
}

/// What the last collision sweep looked at
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Shape-bearing entities in the sweep, in list order
    pub participants: Vec<EntityId>,
    /// Pairs that reached the bounding-circle check
    pub pairs: usize,
    /// Pairs that passed it and ran the narrow test
    pub narrow_phase: Vec<(EntityId, EntityId)>,
    pub contacts: Vec<(EntityId, EntityId)>,
}

#[derive(Debug, Default)]
pub struct EntityArbiter {
    live: Vec<Entity>,
    admissions: Admissions,
    lights: Lights,
    events: Vec<SimEvent>,
    last_sweep: SweepReport,
    frames: u64,
}

impl EntityArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity; it goes live at the start of the next update
    pub fn add(&mut self, entity: Entity) -> EntityId {
        self.admissions.admit(entity)
    }

    pub fn update(&mut self, dt: f32, input: &InputState) {
        for entity in self.admissions.take() {
            self.events.push(SimEvent::Admitted {
                id: entity.id(),
                kind: entity.tag(),
            });
            self.live.push(entity);
        }

        let robots: Vec<RobotSnapshot> =
            self.live.iter().filter_map(Entity::robot_snapshot).collect();
        let mut ctx = FrameContext {
            input,
            robots: &robots,
            admissions: &mut self.admissions,
            lights: &mut self.lights,
            events: &mut self.events,
        };
        for entity in self.live.iter_mut().filter(|e| e.is_alive()) {
            entity.update(dt, &mut ctx);
        }

        let lights = &mut self.lights;
        let events = &mut self.events;
        self.live.retain_mut(|entity| {
            if entity.is_alive() {
                return true;
            }
            entity.kill(lights, events);
            false
        });

        self.last_sweep = sweep(&mut self.live, &mut self.events);
        self.frames += 1;

        log::trace!(
            "Frame {}: {} live, {} pairs, {} narrow tests, {} contacts",
            self.frames,
            self.live.len(),
            self.last_sweep.pairs,
            self.last_sweep.narrow_phase.len(),
            self.last_sweep.contacts.len()
        );
    }

    /// Submit draw requests for every live entity, then every light
    pub fn render(&self, sink: &mut dyn RenderSink) {
        for entity in &self.live {
            entity.render(sink);
        }
        for (_, light) in self.lights.iter() {
            sink.submit_light(light);
        }
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        mem::take(&mut self.events)
    }

    pub fn last_sweep(&self) -> &SweepReport {
        &self.last_sweep
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.live.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.live.iter_mut().find(|e| e.id() == id)
    }

    /// Swap the controller of a live robot
    pub fn attach_controller(
        &mut self,
        id: EntityId,
        control: Box<dyn RobotControl>,
    ) -> Result<(), SetupError> {
        self.get_mut(id)
            .ok_or(SetupError::UnknownEntity { id })?
            .attach_controller(control)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn pending(&self) -> &Admissions {
        &self.admissions
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut Lights {
        &mut self.lights
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Run the broad and narrow checks for one pair
fn touching(a: &Entity, b: &Entity, report: &mut SweepReport) -> bool {
    let (Some(shape_a), Some(shape_b)) = (a.shape(), b.shape()) else {
        return false;
    };
    let (transform_a, transform_b) = (a.body().transform(), b.body().transform());

    report.pairs += 1;
    if !shape_a.bounds_overlap(shape_b, transform_a, transform_b) {
        return false;
    }
    report.narrow_phase.push((a.id(), b.id()));
    shape_a.intersects(shape_b, transform_a, transform_b)
}

fn sweep(live: &mut [Entity], events: &mut Vec<SimEvent>) -> SweepReport {
    let mut report = SweepReport {
        participants: live.iter().filter(|e| e.shape().is_some()).map(Entity::id).collect(),
        ..Default::default()
    };

    for i in 0..live.len() {
        let (head, tail) = live.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if !touching(a, b, &mut report) {
                continue;
            }
            report.contacts.push((a.id(), b.id()));

            // Both sides react to the other as it was before either callback
            let (Some(seen_by_b), Some(seen_by_a)) = (a.contact(), b.contact()) else {
                continue;
            };
            if let Some(impact) = a.on_collision(&seen_by_a) {
                b.apply_impact(impact, a.id(), events);
            }
            if let Some(impact) = b.on_collision(&seen_by_b) {
                a.apply_impact(impact, b.id(), events);
            }
        }
    }

    report
}
