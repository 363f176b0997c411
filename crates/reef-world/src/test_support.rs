//! Shared fixtures for unit tests.

use crate::action::{Action, ActionContext};
use crate::entity::Entity;
use crate::images::{
    Background, ImageSequence, ImageStore, CRAB_KEY, FISH_KEY, QUAKE_KEY,
};
use crate::scheduler::EventScheduler;
use crate::world::WorldModel;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use reef_core::{BehaviorConfig, EntityId, EntityKind, ImageHandle, Result, SchedulerConfig};

pub(crate) fn frames(n: usize) -> ImageSequence {
    ImageSequence::new((0..n).map(|i| ImageHandle::new(format!("f{}", i))).collect()).unwrap()
}

pub(crate) struct Fixture {
    pub world: WorldModel,
    pub scheduler: EventScheduler,
    pub images: ImageStore,
    pub rng: ChaCha8Rng,
    pub behavior: BehaviorConfig,
}

impl Fixture {
    pub fn new(rows: i32, cols: i32) -> Self {
        Self::with_scheduler(rows, cols, SchedulerConfig::default())
    }

    pub fn with_scheduler(rows: i32, cols: i32, config: SchedulerConfig) -> Self {
        let mut images = ImageStore::new(ImageHandle::new("default"));
        images.push_image(FISH_KEY, ImageHandle::new("fish"));
        images.push_image(CRAB_KEY, ImageHandle::new("crab1"));
        images.push_image(CRAB_KEY, ImageHandle::new("crab2"));
        images.push_image(QUAKE_KEY, ImageHandle::new("quake"));

        Self {
            world: WorldModel::new(
                rows,
                cols,
                Background::new("water", ImageSequence::single(ImageHandle::new("water"))),
            )
            .unwrap(),
            scheduler: EventScheduler::new(config),
            images,
            rng: ChaCha8Rng::seed_from_u64(42),
            behavior: BehaviorConfig::default(),
        }
    }

    pub fn add(&mut self, entity: Entity) -> EntityId {
        self.world.try_add_entity(entity).unwrap()
    }

    pub fn add_scheduled(&mut self, entity: Entity) -> EntityId {
        let id = self.add(entity);
        self.scheduler
            .schedule_actions(id, self.world.entity(id).unwrap());
        id
    }

    pub fn try_advance(&mut self, time: u64) -> Result<usize> {
        let mut ctx = ActionContext {
            world: &mut self.world,
            images: &self.images,
            rng: &mut self.rng,
            behavior: &self.behavior,
        };
        self.scheduler.advance_to(time, &mut ctx)
    }

    pub fn advance(&mut self, time: u64) -> usize {
        self.try_advance(time).unwrap()
    }

    pub fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.world
            .entities()
            .filter(|(_, entity)| entity.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Firing time of the entity's next activity, if one is queued
    pub fn next_activity(&self, id: EntityId) -> Option<u64> {
        self.scheduler
            .pending_for(id)
            .find(|event| matches!(event.action, Action::Activity { .. }))
            .map(|event| event.time())
    }
}
