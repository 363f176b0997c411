//! Error types for the simulation.

use crate::types::{EntityId, EntityKind, Point};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Position occupied: {position}")]
    OccupiedCell { position: Point },

    #[error("Position out of bounds: {position}")]
    OutOfBounds { position: Point },

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("Event fired for removed entity: {0}")]
    DanglingEvent(EntityId),

    #[error("Activity not supported for {0}")]
    UnsupportedActivity(EntityKind),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
