//! Simulation core
//!
//! Everything that moves or collides lives here. Rules:
//! - No rendering: output goes through `renderer::RenderSink` only
//! - Seeded RNG only (setup scatter, CPU decisions)
//! - Stable iteration order (arbiter list order)

pub mod arbiter;
pub mod arena;
pub mod collision;
pub mod control;
pub mod entity;
pub mod obstacle;
pub mod projectile;
pub mod robot;
pub mod shape;

pub use arbiter::{Admissions, EntityArbiter, SimEvent, SweepReport};
pub use arena::Arena;
pub use collision::{Resolution, reflect_velocity, resolve_interpenetration};
pub use control::{
    ControlCommand, ControlFrame, CpuControl, InputState, NoControl, PlayerControl, RobotControl,
    RobotSnapshot,
};
pub use entity::{Body, Contact, Entity, EntityId, EntityKind, Impact, Kind};
pub use obstacle::Obstacle;
pub use projectile::{Projectile, ProjectileSpec};
pub use robot::{Loadout, Robot, WeaponSlot};
pub use shape::{ConvexShape, ShapeRegistry, intersects};
