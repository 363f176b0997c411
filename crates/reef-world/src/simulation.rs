//! Simulation driver owning the world, its scheduler and everything actions need.

use crate::action::ActionContext;
use crate::entity::EntitySnapshot;
use crate::images::ImageStore;
use crate::scenario::ScenarioFile;
use crate::scheduler::EventScheduler;
use crate::world::WorldModel;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use reef_core::{EntityKind, Result, SimConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{event, info, instrument, Level};

pub struct Simulation {
    world: WorldModel,
    scheduler: EventScheduler,
    images: ImageStore,
    config: SimConfig,
    rng: ChaCha8Rng,
    started: bool,
    events_fired: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, world: WorldModel, images: ImageStore) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let scheduler = EventScheduler::new(config.scheduler.clone());

        Ok(Self {
            world,
            scheduler,
            images,
            config,
            rng,
            started: false,
            events_fired: 0,
        })
    }

    /// Build the world described by a scenario file and wrap it.
    pub fn from_scenario(file: &ScenarioFile) -> Result<Self> {
        let images = file.image_store();
        let (world, _) = file.world.build(&images)?;
        Self::new(file.config.clone(), world, images)
    }

    /// Queue the starting actions of every entity. Only the first call has any effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.scheduler.schedule_all(&self.world);
        info!(
            entities = self.world.entity_count(),
            pending = self.scheduler.len(),
            seed = self.config.seed,
            "Simulation started"
        );
    }

    /// Fire every event due before `time`; returns how many fired.
    pub fn advance_to(&mut self, time: u64) -> Result<usize> {
        let mut ctx = ActionContext {
            world: &mut self.world,
            images: &self.images,
            rng: &mut self.rng,
            behavior: &self.config.behavior,
        };
        let fired = self.scheduler.advance_to(time, &mut ctx)?;
        self.events_fired += fired as u64;
        Ok(fired)
    }

    /// Advance the clock by one tick period.
    pub fn step(&mut self) -> Result<usize> {
        let target = self.now().saturating_add(self.config.tick_period_ms);
        self.advance_to(target)
    }

    /// Step until the configured duration has elapsed.
    #[instrument(skip(self), fields(duration_ms = self.config.duration_ms))]
    pub fn run(&mut self) -> Result<usize> {
        self.start();
        let mut fired = 0;
        while self.now() < self.config.duration_ms {
            let target = self
                .now()
                .saturating_add(self.config.tick_period_ms)
                .min(self.config.duration_ms);
            fired += self.advance_to(target)?;
        }
        info!(time = self.now(), fired, entities = self.world.entity_count(), "Run complete");
        Ok(fired)
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Events fired since the simulation was built
    pub fn events_fired(&self) -> u64 {
        self.events_fired
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Live entities per kind, including kinds with none left
    pub fn population(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts: BTreeMap<EntityKind, usize> =
            EntityKind::all().into_iter().map(|kind| (kind, 0)).collect();
        for (_, entity) in self.world.entities() {
            *counts.entry(entity.kind()).or_default() += 1;
        }
        counts
    }

    pub fn emit_population_metrics(&self) {
        let population = self.population();
        let total: usize = population.values().sum();

        info!(
            event = "population_metrics",
            time = self.now(),
            total_population = total,
            pending_events = self.scheduler.len(),
            "Population metrics snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "population_total",
            gauge_value = total,
            time = self.now(),
            "Population gauge"
        );

        for (kind, count) in &population {
            event!(
                Level::INFO,
                gauge_name = "population_by_kind",
                gauge_value = *count,
                kind = kind.name(),
                time = self.now(),
                "Population by kind"
            );
        }

        event!(
            Level::INFO,
            gauge_name = "pending_events",
            gauge_value = self.scheduler.len(),
            time = self.now(),
            "Pending events gauge"
        );
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            rows: self.world.num_rows(),
            cols: self.world.num_cols(),
            time: self.now(),
            entities: self
                .world
                .entities()
                .map(|(handle, entity)| EntitySnapshot::capture(handle, entity))
                .collect(),
        }
    }
}

/// Serializable state of the world at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub rows: i32,
    pub cols: i32,
    pub time: u64,
    pub entities: Vec<EntitySnapshot>,
}
