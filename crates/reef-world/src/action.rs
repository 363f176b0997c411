//! Deferred units of work and the per-kind behaviour table.
//!
//! Every activity either re-arms itself through the scheduler or ends with
//! the entity leaving the world. Anything that removes an entity goes through
//! `WorldModel::remove_entity`, which cancels its pending events.

use crate::entity::Entity;
use crate::images::{ImageSource, CRAB_KEY, FISH_KEY, QUAKE_KEY};
use crate::scheduler::EventScheduler;
use crate::world::WorldModel;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use reef_core::{BehaviorConfig, EntityId, EntityKind, Error, Result};
use tracing::{debug, error};

pub const FISH_ID_PREFIX: &str = "fish -- ";
pub const CRAB_ID_SUFFIX: &str = " -- crab";

/// Work bound to one entity, fired once by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Advance one animation frame. A `repeat_count` of 0 repeats forever.
    Animation { entity: EntityId, repeat_count: u32 },
    /// Run the entity's kind-specific behaviour
    Activity { entity: EntityId },
}

/// Everything an action may touch besides the scheduler
pub struct ActionContext<'a> {
    pub world: &'a mut WorldModel,
    pub images: &'a dyn ImageSource,
    pub rng: &'a mut ChaCha8Rng,
    pub behavior: &'a BehaviorConfig,
}

impl Action {
    pub fn activity(entity: EntityId) -> Self {
        Action::Activity { entity }
    }

    pub fn animation(entity: EntityId, repeat_count: u32) -> Self {
        Action::Animation {
            entity,
            repeat_count,
        }
    }

    pub fn entity(&self) -> EntityId {
        match self {
            Action::Animation { entity, .. } | Action::Activity { entity } => *entity,
        }
    }

    pub fn execute(self, scheduler: &mut EventScheduler, ctx: &mut ActionContext<'_>) -> Result<()> {
        match self {
            Action::Animation {
                entity,
                repeat_count,
            } => execute_animation(entity, repeat_count, scheduler, ctx),
            Action::Activity { entity } => execute_activity(entity, scheduler, ctx),
        }
    }
}

fn execute_animation(
    id: EntityId,
    repeat_count: u32,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let entity = ctx.world.entity_mut(id).ok_or(Error::DanglingEvent(id))?;
    entity.next_image();

    if repeat_count != 1 {
        let period = entity.animation_period();
        scheduler.schedule_event(Action::animation(id, repeat_count.saturating_sub(1)), period);
    }
    Ok(())
}

fn execute_activity(
    id: EntityId,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let kind = ctx.world.entity(id).ok_or(Error::DanglingEvent(id))?.kind();

    match kind {
        EntityKind::OctoFull => octo_full_activity(id, scheduler, ctx),
        EntityKind::OctoNotFull => octo_not_full_activity(id, scheduler, ctx),
        EntityKind::Fish => fish_activity(id, scheduler, ctx),
        EntityKind::Crab => crab_activity(id, scheduler, ctx),
        EntityKind::Quake | EntityKind::Atlantis => {
            ctx.world.remove_entity(id, scheduler);
            Ok(())
        }
        EntityKind::Sgrass => sgrass_activity(id, scheduler, ctx),
        EntityKind::Obstacle => {
            error!(%id, %kind, "Activity fired for a kind without behaviour");
            Err(Error::UnsupportedActivity(kind))
        }
    }
}

/// Full octopus: head for the nearest atlantis and unload there.
fn octo_full_activity(
    id: EntityId,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let pos = position_of(ctx.world, id)?;

    if let Some(target) = ctx.world.find_nearest(pos, EntityKind::Atlantis) {
        if ctx.world.move_to_full(id, target, scheduler)? {
            if let Some(atlantis) = ctx.world.entity(target) {
                scheduler.schedule_actions(target, atlantis);
            }
            ctx.world.transform_full(id, scheduler)?;
            return Ok(());
        }
    }

    reschedule(id, 1, scheduler, ctx)
}

/// Hungry octopus: chase the nearest fish, eat it, fill up.
fn octo_not_full_activity(
    id: EntityId,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let pos = position_of(ctx.world, id)?;

    let transformed = match ctx.world.find_nearest(pos, EntityKind::Fish) {
        Some(target) => {
            ctx.world.move_to_not_full(id, target, scheduler)?
                && ctx.world.transform_not_full(id, scheduler)?
        }
        None => false,
    };

    // A transformed octopus is a new entity with its own schedule.
    if transformed {
        return Ok(());
    }
    reschedule(id, 1, scheduler, ctx)
}

/// Fish: turn into a crab where it swims.
fn fish_activity(
    id: EntityId,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let fish = ctx
        .world
        .remove_entity(id, scheduler)
        .ok_or(Error::DanglingEvent(id))?;

    let behavior = ctx.behavior;
    let crab = Entity::crab(
        format!("{}{}", fish.id(), CRAB_ID_SUFFIX),
        fish.position(),
        fish.action_period() / behavior.crab_period_scale,
        ctx.rng
            .gen_range(behavior.crab_animation_min..behavior.crab_animation_max),
        ctx.images.image_list(CRAB_KEY),
    );
    spawn(crab, scheduler, ctx);
    Ok(())
}

/// Sea grass: seed a fish in the first free neighbouring cell.
fn sgrass_activity(
    id: EntityId,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let grass = ctx.world.entity(id).ok_or(Error::DanglingEvent(id))?;
    let fish_id = format!("{}{} @{}", FISH_ID_PREFIX, grass.id(), scheduler.now());

    if let Some(open) = ctx.world.find_open_around(grass.position()) {
        let behavior = ctx.behavior;
        let fish = Entity::fish(
            fish_id,
            open,
            ctx.rng
                .gen_range(behavior.fish_corrupt_min..behavior.fish_corrupt_max),
            ctx.images.image_list(FISH_KEY),
        );
        spawn(fish, scheduler, ctx);
    }

    reschedule(id, 1, scheduler, ctx)
}

/// Crab: wreck the nearest sea grass, leaving a quake behind.
fn crab_activity(
    id: EntityId,
    scheduler: &mut EventScheduler,
    ctx: &mut ActionContext<'_>,
) -> Result<()> {
    let pos = position_of(ctx.world, id)?;
    let mut periods = 1;

    if let Some(target) = ctx.world.find_nearest(pos, EntityKind::Sgrass) {
        let target_pos = position_of(ctx.world, target)?;

        if ctx.world.move_to_crab(id, target, scheduler)? {
            let behavior = ctx.behavior;
            let quake = Entity::quake(
                target_pos,
                behavior.quake_action_period,
                behavior.quake_animation_period,
                ctx.images.image_list(QUAKE_KEY),
            );
            spawn(quake, scheduler, ctx);
            // Settle for an extra period after triggering a quake.
            periods = 2;
        }
    }

    reschedule(id, periods, scheduler, ctx)
}

fn position_of(world: &WorldModel, id: EntityId) -> Result<reef_core::Point> {
    world
        .entity(id)
        .map(Entity::position)
        .ok_or(Error::DanglingEvent(id))
}

/// Queue the entity's next activity `periods` action periods from now.
///
/// Entities with a zero action period never re-arm.
fn reschedule(
    id: EntityId,
    periods: u64,
    scheduler: &mut EventScheduler,
    ctx: &ActionContext<'_>,
) -> Result<()> {
    let period = ctx
        .world
        .entity(id)
        .ok_or(Error::DanglingEvent(id))?
        .action_period();
    if period == 0 {
        debug!(%id, "Zero action period, not rescheduling");
        return Ok(());
    }
    scheduler.schedule_event(Action::activity(id), period * periods);
    Ok(())
}

fn spawn(entity: Entity, scheduler: &mut EventScheduler, ctx: &mut ActionContext<'_>) {
    let kind = entity.kind();
    let pos = entity.position();
    match ctx.world.add_entity(entity) {
        Some(new_id) => {
            if let Some(spawned) = ctx.world.entity(new_id) {
                debug!(id = %new_id, entity_id = spawned.id(), %kind, %pos, time = scheduler.now(), "Entity spawned");
                scheduler.schedule_actions(new_id, spawned);
            }
        }
        None => debug!(%kind, %pos, "Spawn skipped, cell unavailable"),
    }
}
