//! Error types for setup and configuration
//!
//! Everything here is raised while building things (settings, shapes,
//! entities, the phase machine). The per-frame simulation has no error path:
//! approximation limits are accepted and logged, never surfaced.

use std::path::PathBuf;

use thiserror::Error;

use crate::fsm::StateId;
use crate::sim::EntityId;

/// Missing or malformed tuning values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing setting {key}")]
    Missing { key: String },

    #[error("setting {key} could not be read as {expected}: {reason}")]
    Malformed {
        key: String,
        expected: &'static str,
        reason: String,
    },

    #[error("setting {key} = {value} is out of range ({constraint})")]
    OutOfRange {
        key: String,
        value: String,
        constraint: &'static str,
    },

    #[error("line {line}: expected `Key: value`, found {text:?}")]
    Syntax { line: usize, text: String },

    #[error("failed to read settings file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected convex shape construction
#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("convex shape needs at least 3 vertices, got {got}")]
    TooFewVertices { got: usize },

    #[error("vertex {index} is not finite")]
    NonFinite { index: usize },

    #[error("convex shape has zero area")]
    Degenerate,

    #[error("no shape registered under {name:?}")]
    UnknownShape { name: String },
}

/// Failures while assembling an arena or a game
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error("entity {id:?} is not a robot")]
    NotARobot { id: EntityId },

    #[error("entity {id:?} is not live")]
    UnknownEntity { id: EntityId },
}

/// State registry misuse
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsmError {
    #[error("state {id} is already registered")]
    DuplicateState { id: StateId },

    #[error("state {id} is not registered")]
    UnknownState { id: StateId },
}
