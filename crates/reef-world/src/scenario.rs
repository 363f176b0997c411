//! Serializable world content: grid size, backgrounds, images and placements.

use crate::entity::Entity;
use crate::images::{
    Background, ImageSequence, ImageSource, ImageStore, ATLANTIS_KEY, BACKGROUND_KEY, FISH_KEY,
    OBSTACLE_KEY, OCTO_KEY, SGRASS_KEY,
};
use crate::world::WorldModel;
use reef_core::{Error, ImageHandle, Point, Result, SimConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// One entity to place when the world is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Octo {
        id: String,
        position: Point,
        resource_limit: u32,
        action_period: u64,
        animation_period: u64,
    },
    Obstacle {
        id: String,
        position: Point,
    },
    Fish {
        id: String,
        position: Point,
        action_period: u64,
    },
    Atlantis {
        id: String,
        position: Point,
        #[serde(default)]
        animation_period: u64,
    },
    Sgrass {
        id: String,
        position: Point,
        action_period: u64,
    },
}

impl Placement {
    pub fn position(&self) -> Point {
        match self {
            Placement::Octo { position, .. }
            | Placement::Obstacle { position, .. }
            | Placement::Fish { position, .. }
            | Placement::Atlantis { position, .. }
            | Placement::Sgrass { position, .. } => *position,
        }
    }

    /// Build the entity, taking its frames from the kind's image key.
    pub fn to_entity(&self, images: &dyn ImageSource) -> Entity {
        match self {
            Placement::Octo {
                id,
                position,
                resource_limit,
                action_period,
                animation_period,
            } => Entity::octo_not_full(
                id.as_str(),
                *position,
                *resource_limit,
                *action_period,
                *animation_period,
                images.image_list(OCTO_KEY),
            ),
            Placement::Obstacle { id, position } => {
                Entity::obstacle(id.as_str(), *position, images.image_list(OBSTACLE_KEY))
            }
            Placement::Fish {
                id,
                position,
                action_period,
            } => Entity::fish(id.as_str(), *position, *action_period, images.image_list(FISH_KEY)),
            Placement::Atlantis {
                id,
                position,
                animation_period,
            } => Entity::atlantis(
                id.as_str(),
                *position,
                *animation_period,
                images.image_list(ATLANTIS_KEY),
            ),
            Placement::Sgrass {
                id,
                position,
                action_period,
            } => Entity::sgrass(
                id.as_str(),
                *position,
                *action_period,
                images.image_list(SGRASS_KEY),
            ),
        }
    }
}

/// A background tile that differs from the default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundPlacement {
    /// Background name, also used as its image key
    pub id: String,
    pub position: Point,
}

/// Outcome of building a world from a scenario
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub placed: usize,
    pub rejected: usize,
}

/// Content of a world before it starts running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub rows: i32,
    pub cols: i32,
    #[serde(default)]
    pub backgrounds: Vec<BackgroundPlacement>,
    #[serde(default)]
    pub entities: Vec<Placement>,
}

impl Scenario {
    pub fn new(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            backgrounds: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Create the world and place every entity that fits.
    ///
    /// Placements on a taken or out-of-bounds cell are logged and skipped;
    /// loading continues with the rest.
    pub fn build(&self, images: &dyn ImageSource) -> Result<(WorldModel, LoadReport)> {
        if self.rows <= 0 || self.cols <= 0 {
            return Err(Error::Validation(format!(
                "world must have positive dimensions, got {}x{}",
                self.rows, self.cols
            )));
        }

        let default_background = Background::new(BACKGROUND_KEY, images.image_list(BACKGROUND_KEY));
        let mut world = WorldModel::new(self.rows, self.cols, default_background)?;

        for tile in &self.backgrounds {
            if !world.within_bounds(tile.position) {
                warn!(id = %tile.id, pos = %tile.position, "Ignoring background outside the grid");
                continue;
            }
            world.set_background(
                tile.position,
                Background::new(tile.id.as_str(), images.image_list(&tile.id)),
            );
        }

        let mut report = LoadReport::default();
        for (index, placement) in self.entities.iter().enumerate() {
            match world.try_add_entity(placement.to_entity(images)) {
                Ok(_) => report.placed += 1,
                Err(err @ (Error::OccupiedCell { .. } | Error::OutOfBounds { .. })) => {
                    warn!(entry = index, error = %err, "Skipping placement");
                    report.rejected += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            rows = self.rows,
            cols = self.cols,
            placed = report.placed,
            rejected = report.rejected,
            "World loaded"
        );
        Ok((world, report))
    }
}

/// Everything needed to run a simulation, as read from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub config: SimConfig,
    /// Image used for any key missing from `images`
    #[serde(default = "default_image")]
    pub default_image: String,
    /// Frames per image key, in playback order
    #[serde(default)]
    pub images: BTreeMap<String, Vec<String>>,
    pub world: Scenario,
}

fn default_image() -> String {
    "default".to_string()
}

impl ScenarioFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Image store holding one frozen sequence per key; empty keys fall back
    /// to the default image.
    pub fn image_store(&self) -> ImageStore {
        let mut store = ImageStore::new(ImageHandle::new(self.default_image.as_str()));
        for (key, frames) in &self.images {
            let frames: Vec<ImageHandle> = frames
                .iter()
                .map(|frame| ImageHandle::new(frame.as_str()))
                .collect();
            match ImageSequence::new(frames) {
                Ok(sequence) => store.insert(key.as_str(), sequence),
                Err(err) => warn!(key = %key, error = %err, "Skipping image key"),
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reef_core::EntityKind;

    fn store() -> ImageStore {
        let mut store = ImageStore::new(ImageHandle::new("default"));
        store.push_image(BACKGROUND_KEY, ImageHandle::new("water"));
        store.push_image(OCTO_KEY, ImageHandle::new("octo1"));
        store.push_image(OCTO_KEY, ImageHandle::new("octo2"));
        store.push_image("rocks", ImageHandle::new("rocks"));
        store
    }

    fn fish(id: &str, x: i32, y: i32) -> Placement {
        Placement::Fish {
            id: id.to_string(),
            position: Point::new(x, y),
            action_period: 25_000,
        }
    }

    #[test]
    fn test_build_places_entities_with_kind_images() {
        let mut scenario = Scenario::new(4, 6);
        scenario.entities.push(Placement::Octo {
            id: "octo".to_string(),
            position: Point::new(1, 1),
            resource_limit: 3,
            action_period: 800,
            animation_period: 100,
        });
        scenario.entities.push(fish("fish", 2, 2));

        let (world, report) = scenario.build(&store()).unwrap();
        assert_eq!(report, LoadReport { placed: 2, rejected: 0 });
        assert_eq!(world.num_rows(), 4);
        assert_eq!(world.num_cols(), 6);

        let (_, octo) = world.get_occupant(Point::new(1, 1)).unwrap();
        assert_eq!(octo.kind(), EntityKind::OctoNotFull);
        assert_eq!(octo.resource_limit(), 3);
        assert_eq!(octo.images().len(), 2);

        // No "fish" frames registered, so the default is used.
        let (_, fish) = world.get_occupant(Point::new(2, 2)).unwrap();
        assert_eq!(fish.current_image(), &ImageHandle::new("default"));
    }

    #[test]
    fn test_duplicate_position_rejected_once() {
        let mut scenario = Scenario::new(5, 5);
        scenario.entities.push(fish("a", 0, 0));
        scenario.entities.push(fish("b", 1, 0));
        scenario.entities.push(fish("c", 0, 0));
        scenario.entities.push(fish("d", 2, 0));

        let (world, report) = scenario.build(&store()).unwrap();
        assert_eq!(report, LoadReport { placed: 3, rejected: 1 });
        assert_eq!(world.entity_count(), 3);

        let (_, first) = world.get_occupant(Point::new(0, 0)).unwrap();
        assert_eq!(first.id(), "a");
        assert!(world.check_consistency().is_ok());
    }

    #[test]
    fn test_out_of_bounds_placement_skipped() {
        let mut scenario = Scenario::new(3, 3);
        scenario.entities.push(fish("inside", 2, 2));
        scenario.entities.push(fish("outside", 3, 0));
        scenario.entities.push(fish("negative", -1, 1));

        let (world, report) = scenario.build(&store()).unwrap();
        assert_eq!(report, LoadReport { placed: 1, rejected: 2 });
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_backgrounds() {
        let mut scenario = Scenario::new(3, 3);
        scenario.backgrounds.push(BackgroundPlacement {
            id: "rocks".to_string(),
            position: Point::new(1, 2),
        });
        scenario.backgrounds.push(BackgroundPlacement {
            id: "rocks".to_string(),
            position: Point::new(9, 9),
        });

        let (world, _) = scenario.build(&store()).unwrap();
        assert_eq!(
            world.get_background_image(Point::new(1, 2)),
            Some(&ImageHandle::new("rocks"))
        );
        assert_eq!(
            world.get_background_image(Point::new(0, 0)),
            Some(&ImageHandle::new("water"))
        );
        assert_eq!(world.get_background_image(Point::new(9, 9)), None);
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let scenario = Scenario::new(0, 4);
        assert!(matches!(scenario.build(&store()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let mut scenario = Scenario::new(50_000, 50_000);
        scenario.entities.push(fish("a", 0, 0));
        assert!(matches!(scenario.build(&store()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_scenario_file_from_json() {
        let json = r#"{
            "config": { "seed": 9 },
            "images": { "fish": ["fish1", "fish2"] },
            "world": {
                "rows": 2,
                "cols": 3,
                "entities": [
                    { "kind": "fish", "id": "f", "position": { "x": 0, "y": 1 }, "action_period": 500 },
                    { "kind": "atlantis", "id": "a", "position": { "x": 2, "y": 0 } },
                    { "kind": "obstacle", "id": "r", "position": { "x": 1, "y": 1 } }
                ]
            }
        }"#;

        let file = ScenarioFile::from_json(json).unwrap();
        assert_eq!(file.config.seed, 9);
        assert_eq!(file.config.tick_period_ms, 100);
        assert_eq!(file.default_image, "default");
        assert_eq!(file.world.entities.len(), 3);

        let images = file.image_store();
        let (world, report) = file.world.build(&images).unwrap();
        assert_eq!(report.placed, 3);
        let (_, fish) = world.get_occupant(Point::new(0, 1)).unwrap();
        assert_eq!(fish.images().len(), 2);
        let (_, atlantis) = world.get_occupant(Point::new(2, 0)).unwrap();
        assert_eq!(atlantis.animation_period(), 0);
    }

    #[test]
    fn test_image_store_keeps_frame_order() {
        let mut file = ScenarioFile::from_json(r#"{ "world": { "rows": 1, "cols": 1 } }"#).unwrap();
        let frames: Vec<String> = (0..500).map(|i| format!("octo{}", i)).collect();
        file.images.insert(OCTO_KEY.to_string(), frames);
        file.images.insert(FISH_KEY.to_string(), Vec::new());

        let store = file.image_store();
        let octo = store.image_list(OCTO_KEY);
        assert_eq!(octo.len(), 500);
        assert_eq!(octo.frame(0), &ImageHandle::new("octo0"));
        assert_eq!(octo.frame(499), &ImageHandle::new("octo499"));

        assert!(!store.contains(FISH_KEY));
        assert_eq!(store.image_list(FISH_KEY), *store.default_images());
    }

    #[test]
    fn test_malformed_json_is_a_serialization_error() {
        let result = ScenarioFile::from_json(r#"{ "world": { "rows": "many" } }"#);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
