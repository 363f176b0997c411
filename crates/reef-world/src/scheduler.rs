//! Time-ordered event queue driving every entity's behaviour.

use crate::action::{Action, ActionContext};
use crate::entity::Entity;
use crate::world::WorldModel;
use reef_core::{EntityId, EntityKind, Result, SchedulerConfig};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};

/// Shortest gap, in logical milliseconds, between now and a new event
pub const MIN_DELAY: u64 = 1;

/// Ordering key of a pending event.
///
/// Events due at the same time fire in the order they were scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub time: u64,
    pub sequence: u64,
}

/// An action waiting for its firing time
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub key: EventKey,
    pub action: Action,
}

impl Event {
    pub fn time(&self) -> u64 {
        self.key.time
    }

    pub fn entity(&self) -> EntityId {
        self.action.entity()
    }
}

/// Priority queue of pending actions with per-entity cancellation.
///
/// The queue and the per-entity index always hold exactly the same keys.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    queue: BTreeMap<EventKey, Event>,
    pending: HashMap<EntityId, BTreeSet<EventKey>>,
    next_sequence: u64,
    now: u64,
    config: SchedulerConfig,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl EventScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            queue: BTreeMap::new(),
            pending: HashMap::new(),
            next_sequence: 0,
            now: 0,
            config,
        }
    }

    /// Current logical time
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn time_scale(&self) -> f64 {
        self.config.time_scale
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Firing time of the earliest pending event
    pub fn next_event_time(&self) -> Option<u64> {
        self.queue.keys().next().map(|key| key.time)
    }

    pub fn pending_count(&self, entity: EntityId) -> usize {
        self.pending.get(&entity).map_or(0, BTreeSet::len)
    }

    /// Every entity with at least one pending event
    pub fn pending_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.pending.keys().copied()
    }

    /// Pending events of one entity, earliest first
    pub fn pending_for(&self, entity: EntityId) -> impl Iterator<Item = &Event> + '_ {
        self.pending
            .get(&entity)
            .into_iter()
            .flat_map(|keys| keys.iter())
            .filter_map(|key| self.queue.get(key))
    }

    /// Queue `action` to fire `delay` (scaled) after the current time.
    ///
    /// The scaled delay is at least one tick, so an event can never re-arm
    /// itself at the timestamp it is firing at.
    pub fn schedule_event(&mut self, action: Action, delay: u64) -> EventKey {
        let scaled = ((delay as f64 * self.config.time_scale) as u64).max(MIN_DELAY);
        let key = EventKey {
            time: self.now.saturating_add(scaled),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        let entity = action.entity();
        self.pending.entry(entity).or_default().insert(key);
        self.queue.insert(key, Event { key, action });
        key
    }

    /// Drop every pending event bound to `entity`.
    pub fn unschedule_all_events(&mut self, entity: EntityId) {
        if let Some(keys) = self.pending.remove(&entity) {
            for key in &keys {
                self.queue.remove(key);
            }
            if !keys.is_empty() {
                debug!(%entity, cancelled = keys.len(), "Unscheduled pending events");
            }
        }
    }

    fn remove_pending(&mut self, event: &Event) {
        let entity = event.entity();
        if let Some(keys) = self.pending.get_mut(&entity) {
            keys.remove(&event.key);
            if keys.is_empty() {
                self.pending.remove(&entity);
            }
        }
    }

    /// Fire, in order, every event due strictly before `time`.
    ///
    /// While an event fires the clock reads its timestamp, so follow-up events
    /// are placed relative to it and may fire in this same call. Returns the
    /// number of events fired.
    pub fn advance_to(&mut self, time: u64, ctx: &mut ActionContext<'_>) -> Result<usize> {
        let mut fired = 0;
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().time >= time {
                break;
            }
            let event = entry.remove();
            self.remove_pending(&event);
            self.now = self.now.max(event.key.time);

            trace!(time = event.key.time, entity = %event.entity(), action = ?event.action, "Firing event");
            event.action.execute(self, ctx)?;
            fired += 1;
        }
        self.now = self.now.max(time);
        Ok(fired)
    }

    /// Install the starting events for a freshly added entity.
    pub fn schedule_actions(&mut self, id: EntityId, entity: &Entity) {
        match entity.kind() {
            EntityKind::OctoFull | EntityKind::OctoNotFull | EntityKind::Crab => {
                self.schedule_event(Action::activity(id), entity.action_period());
                self.schedule_event(Action::animation(id, 0), entity.animation_period());
            }
            EntityKind::Fish | EntityKind::Sgrass => {
                self.schedule_event(Action::activity(id), entity.action_period());
            }
            EntityKind::Quake => {
                self.schedule_event(Action::activity(id), entity.action_period());
                self.schedule_event(
                    Action::animation(id, self.config.quake_animation_repeat),
                    entity.animation_period(),
                );
            }
            EntityKind::Atlantis => {
                self.schedule_event(
                    Action::animation(id, self.config.atlantis_animation_repeat),
                    entity.animation_period(),
                );
            }
            EntityKind::Obstacle => {}
        }
    }

    /// Seed every entity that acts on its own (`action_period > 0`).
    pub fn schedule_all(&mut self, world: &WorldModel) {
        for (id, entity) in world.entities() {
            if entity.action_period() > 0 {
                self.schedule_actions(id, entity);
            }
        }
        debug!(pending = self.len(), "Seeded world actions");
    }
}
