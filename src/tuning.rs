//! Data-driven game balance
//!
//! Each record gathers the settings one owner needs. Building a record is the
//! only place settings are read, so a missing key surfaces once, at setup.

use crate::error::ConfigError;
use crate::settings::Settings;

/// Setting keys
pub mod keys {
    pub const PHYSICS_TIME_STEP: &str = "PhysicsTimeStep";

    pub const ARENA_WIDTH: &str = "ArenaWidth";
    pub const ARENA_HEIGHT: &str = "ArenaHeight";
    pub const NUM_OBSTACLES: &str = "NumObstacles";
    pub const OBSTACLE_RADIUS: &str = "ObstacleRadius";
    pub const OBSTACLE_Y_OFFSET: &str = "ObstacleYOffset";

    pub const ROBOT_MASS: &str = "RobotMass";
    pub const ROBOT_START_HEALTH: &str = "RobotStartHealth";
    pub const ROBOT_MOVE_FORCE_MAG: &str = "RobotMoveForceMag";
    pub const FRICTIONAL_COEFFICIENT: &str = "FrictionalCoefficient";
    pub const COEFFICIENT_OF_RESTITUTION: &str = "CoefficientOfRestitution";
    pub const PROJECTILE_FIRE_INTERVAL: &str = "ProjectileFireInterval";
    pub const EXPLODING_PROJECTILE_FIRE_INTERVAL: &str = "ExplodingProjectileFireInterval";

    pub const PROJECTILE_LIFETIME: &str = "ProjectileLifetime";
    pub const PROJECTILE_SPEED: &str = "ProjectileSpeed";
    pub const PROJECTILE_DAMAGE: &str = "ProjectileDamage";

    pub const EXPLODING_PROJECTILE_TIMER: &str = "ExplodingProjectileTimer";
    pub const EXPLODING_PROJECTILE_SPEED: &str = "ExplodingProjectileSpeed";
    pub const EXPLODING_PROJECTILE_DAMAGE: &str = "ExplodingProjectileDamage";
    pub const EXPLODING_PROJECTILE_CLUSTER_SIZE: &str = "ExplodingProjectileClusterSize";
    pub const EXPLODING_PROJECTILE_PROBABILITY: &str = "ExplodingProjectileProbability";

    pub const TARGETING_PRECISION: &str = "TargetingPrecision";
}

/// Physical and weapon tuning for a robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotTuning {
    /// Mass used for force integration and impulse response (> 0)
    pub mass: f32,
    /// Health at spawn
    pub start_health: i32,
    /// Magnitude of the constant friction force opposing motion
    pub friction: f32,
    /// Coefficient of restitution for robot/robot and robot/obstacle bounces
    pub restitution: f32,
    /// Seconds between primary shots
    pub primary_interval: f32,
    /// Seconds between exploding shots
    pub secondary_interval: f32,
}

impl RobotTuning {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            mass: settings.get_positive(keys::ROBOT_MASS)?,
            start_health: settings.get(keys::ROBOT_START_HEALTH)?,
            friction: settings.get_non_negative(keys::FRICTIONAL_COEFFICIENT)?,
            restitution: settings.get_non_negative(keys::COEFFICIENT_OF_RESTITUTION)?,
            primary_interval: settings.get_non_negative(keys::PROJECTILE_FIRE_INTERVAL)?,
            secondary_interval: settings
                .get_non_negative(keys::EXPLODING_PROJECTILE_FIRE_INTERVAL)?,
        })
    }
}

/// Tuning for plain projectiles (also used for cluster fragments)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileTuning {
    /// Seconds before the projectile expires
    pub lifetime: f32,
    /// Launch speed added to the firer's velocity
    pub speed: f32,
    /// Health removed from a robot on impact
    pub damage: i32,
}

impl ProjectileTuning {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            lifetime: settings.get_positive(keys::PROJECTILE_LIFETIME)?,
            speed: settings.get_non_negative(keys::PROJECTILE_SPEED)?,
            damage: settings.get(keys::PROJECTILE_DAMAGE)?,
        })
    }
}

/// Tuning for exploding (cluster) projectiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplodingTuning {
    /// Seconds until the burst
    pub timer: f32,
    pub speed: f32,
    pub damage: i32,
    /// Number of fragments released by the burst (>= 1)
    pub cluster_size: u32,
}

impl ExplodingTuning {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let cluster_size: u32 = settings.get(keys::EXPLODING_PROJECTILE_CLUSTER_SIZE)?;
        if cluster_size == 0 {
            return Err(ConfigError::OutOfRange {
                key: keys::EXPLODING_PROJECTILE_CLUSTER_SIZE.to_string(),
                value: cluster_size.to_string(),
                constraint: "must be >= 1",
            });
        }

        Ok(Self {
            timer: settings.get_positive(keys::EXPLODING_PROJECTILE_TIMER)?,
            speed: settings.get_non_negative(keys::EXPLODING_PROJECTILE_SPEED)?,
            damage: settings.get(keys::EXPLODING_PROJECTILE_DAMAGE)?,
            cluster_size,
        })
    }
}

/// Tuning shared by robot controllers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlTuning {
    /// Magnitude of the movement force a controller applies
    pub move_force: f32,
    /// Iterations of the intercept solver
    pub targeting_precision: u32,
    /// Chance per update that the CPU also fires its exploding weapon
    pub exploding_probability: f32,
    /// Base projectile speed assumed by the intercept solver
    pub projectile_speed: f32,
}

impl ControlTuning {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let exploding_probability: f32 = settings.get(keys::EXPLODING_PROJECTILE_PROBABILITY)?;
        if !(0.0..=1.0).contains(&exploding_probability) {
            return Err(ConfigError::OutOfRange {
                key: keys::EXPLODING_PROJECTILE_PROBABILITY.to_string(),
                value: exploding_probability.to_string(),
                constraint: "must be within [0, 1]",
            });
        }

        Ok(Self {
            move_force: settings.get_non_negative(keys::ROBOT_MOVE_FORCE_MAG)?,
            targeting_precision: settings.get(keys::TARGETING_PRECISION)?,
            exploding_probability,
            projectile_speed: settings.get_non_negative(keys::PROJECTILE_SPEED)?,
        })
    }
}

/// Arena layout and timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
    pub num_obstacles: u32,
    pub obstacle_radius: f32,
    /// Vertical gap between stacked obstacles
    pub obstacle_y_offset: f32,
    /// Fixed physics step in seconds; 0 means integrate the raw frame delta
    pub physics_time_step: f32,
}

impl ArenaTuning {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            width: settings.get_positive(keys::ARENA_WIDTH)?,
            height: settings.get_positive(keys::ARENA_HEIGHT)?,
            num_obstacles: settings.get(keys::NUM_OBSTACLES)?,
            obstacle_radius: settings.get_positive(keys::OBSTACLE_RADIUS)?,
            obstacle_y_offset: settings.get_non_negative(keys::OBSTACLE_Y_OFFSET)?,
            physics_time_step: settings.get_non_negative(keys::PHYSICS_TIME_STEP)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tuning_is_complete() {
        let settings = Settings::builtin().unwrap();
        RobotTuning::from_settings(&settings).unwrap();
        ProjectileTuning::from_settings(&settings).unwrap();
        ExplodingTuning::from_settings(&settings).unwrap();
        ControlTuning::from_settings(&settings).unwrap();
        ArenaTuning::from_settings(&settings).unwrap();
    }

    #[test]
    fn test_missing_robot_mass() {
        let mut settings = Settings::builtin().unwrap();
        settings.remove(keys::ROBOT_MASS);
        let err = RobotTuning::from_settings(&settings).unwrap_err();
        assert_eq!(err.to_string(), "missing setting RobotMass");
    }

    #[test]
    fn test_zero_cluster_rejected() {
        let mut settings = Settings::builtin().unwrap();
        settings.set(keys::EXPLODING_PROJECTILE_CLUSTER_SIZE, 0);
        assert!(matches!(
            ExplodingTuning::from_settings(&settings),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_probability_range() {
        let mut settings = Settings::builtin().unwrap();
        settings.set(keys::EXPLODING_PROJECTILE_PROBABILITY, 1.5);
        assert!(ControlTuning::from_settings(&settings).is_err());
    }
}
