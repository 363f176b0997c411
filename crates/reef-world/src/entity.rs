//! Entity state and per-kind factories.

use crate::images::ImageSequence;
use reef_core::{EntityId, EntityKind, ImageHandle, Point};
use serde::{Deserialize, Serialize};

pub const QUAKE_ID: &str = "quake";

/// A single inhabitant of the grid.
///
/// Positions are only changed by the world so occupancy stays consistent.
#[derive(Debug, Clone)]
pub struct Entity {
    id: String,
    kind: EntityKind,
    position: Point,
    images: ImageSequence,
    image_index: usize,
    resource_count: u32,
    resource_limit: u32,
    action_period: u64,
    animation_period: u64,
}

impl Entity {
    #[allow(clippy::too_many_arguments)]
    fn new(
        kind: EntityKind,
        id: impl Into<String>,
        position: Point,
        images: ImageSequence,
        resource_limit: u32,
        resource_count: u32,
        action_period: u64,
        animation_period: u64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            images,
            image_index: 0,
            resource_count,
            resource_limit,
            action_period,
            animation_period,
        }
    }

    pub fn octo_not_full(
        id: impl Into<String>,
        position: Point,
        resource_limit: u32,
        action_period: u64,
        animation_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(
            EntityKind::OctoNotFull,
            id,
            position,
            images,
            resource_limit,
            0,
            action_period,
            animation_period,
        )
    }

    pub fn octo_full(
        id: impl Into<String>,
        position: Point,
        resource_limit: u32,
        action_period: u64,
        animation_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(
            EntityKind::OctoFull,
            id,
            position,
            images,
            resource_limit,
            resource_limit,
            action_period,
            animation_period,
        )
    }

    pub fn obstacle(id: impl Into<String>, position: Point, images: ImageSequence) -> Self {
        Self::new(EntityKind::Obstacle, id, position, images, 0, 0, 0, 0)
    }

    pub fn fish(
        id: impl Into<String>,
        position: Point,
        action_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(EntityKind::Fish, id, position, images, 0, 0, action_period, 0)
    }

    pub fn crab(
        id: impl Into<String>,
        position: Point,
        action_period: u64,
        animation_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(
            EntityKind::Crab,
            id,
            position,
            images,
            0,
            0,
            action_period,
            animation_period,
        )
    }

    pub fn quake(
        position: Point,
        action_period: u64,
        animation_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(
            EntityKind::Quake,
            QUAKE_ID,
            position,
            images,
            0,
            0,
            action_period,
            animation_period,
        )
    }

    pub fn sgrass(
        id: impl Into<String>,
        position: Point,
        action_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(EntityKind::Sgrass, id, position, images, 0, 0, action_period, 0)
    }

    /// Atlantis never acts on its own; it only animates when an octopus arrives.
    pub fn atlantis(
        id: impl Into<String>,
        position: Point,
        animation_period: u64,
        images: ImageSequence,
    ) -> Self {
        Self::new(
            EntityKind::Atlantis,
            id,
            position,
            images,
            0,
            0,
            0,
            animation_period,
        )
    }

    /// A not-full octopus carrying this one's identity, periods and frames
    pub fn emptied(&self) -> Self {
        Self::octo_not_full(
            self.id.clone(),
            self.position,
            self.resource_limit,
            self.action_period,
            self.animation_period,
            self.images.clone(),
        )
    }

    /// A full octopus carrying this one's identity, periods and frames
    pub fn filled(&self) -> Self {
        Self::octo_full(
            self.id.clone(),
            self.position,
            self.resource_limit,
            self.action_period,
            self.animation_period,
            self.images.clone(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn action_period(&self) -> u64 {
        self.action_period
    }

    pub fn animation_period(&self) -> u64 {
        self.animation_period
    }

    pub fn resource_count(&self) -> u32 {
        self.resource_count
    }

    pub fn resource_limit(&self) -> u32 {
        self.resource_limit
    }

    pub(crate) fn add_resource(&mut self) {
        self.resource_count += 1;
    }

    pub fn images(&self) -> &ImageSequence {
        &self.images
    }

    pub fn image_index(&self) -> usize {
        self.image_index
    }

    pub fn current_image(&self) -> &ImageHandle {
        self.images.frame(self.image_index)
    }

    pub fn next_image(&mut self) {
        self.image_index = (self.image_index + 1) % self.images.len();
    }
}

/// Serializable view of an entity for renderers and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub handle: EntityId,
    pub id: String,
    pub kind: EntityKind,
    pub position: Point,
    pub image: ImageHandle,
    pub resource_count: u32,
}

impl EntitySnapshot {
    pub fn capture(handle: EntityId, entity: &Entity) -> Self {
        Self {
            handle,
            id: entity.id.clone(),
            kind: entity.kind,
            position: entity.position,
            image: entity.current_image().clone(),
            resource_count: entity.resource_count,
        }
    }
}
