//! Reef world engine.
//!
//! A bounded grid of entities driven by a time-ordered event scheduler.
//! Every behaviour is an action queued against an entity; removing an entity
//! cancels whatever it still has pending.

pub mod action;
pub mod entity;
pub mod images;
pub mod scenario;
pub mod scheduler;
pub mod simulation;
pub mod world;

#[cfg(test)]
mod test_support;

pub use action::{Action, ActionContext};
pub use entity::{Entity, EntitySnapshot};
pub use images::{Background, ImageSequence, ImageSource, ImageStore};
pub use scenario::{LoadReport, Placement, Scenario, ScenarioFile};
pub use scheduler::{Event, EventKey, EventScheduler};
pub use simulation::{Simulation, WorldSnapshot};
pub use world::WorldModel;
