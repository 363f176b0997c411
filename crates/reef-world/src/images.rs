//! Image sequences and the keyed store that hands them out.
//!
//! Images are opaque handles; decoding and drawing them is the renderer's job.

use reef_core::{Error, ImageHandle, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub const OCTO_KEY: &str = "octo";
pub const OBSTACLE_KEY: &str = "obstacle";
pub const FISH_KEY: &str = "fish";
pub const CRAB_KEY: &str = "crab";
pub const QUAKE_KEY: &str = "quake";
pub const SGRASS_KEY: &str = "seaGrass";
pub const ATLANTIS_KEY: &str = "atlantis";
pub const BACKGROUND_KEY: &str = "background";

/// A non-empty, cheaply clonable list of animation frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSequence(Arc<[ImageHandle]>);

impl ImageSequence {
    pub fn new(images: Vec<ImageHandle>) -> Result<Self> {
        if images.is_empty() {
            return Err(Error::Validation(
                "image sequence must contain at least one image".to_string(),
            ));
        }
        Ok(Self(Arc::from(images)))
    }

    pub fn single(image: ImageHandle) -> Self {
        Self(Arc::from(vec![image]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Frame at `index`, wrapping past the end
    pub fn frame(&self, index: usize) -> &ImageHandle {
        &self.0[index % self.0.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageHandle> + '_ {
        self.0.iter()
    }
}

/// Anything that can resolve an image key to a frame sequence
pub trait ImageSource {
    /// Sequence registered under `key`, or the default sequence if none is.
    fn image_list(&self, key: &str) -> ImageSequence;
}

/// In-memory keyed image registry with a fallback sequence
#[derive(Debug, Clone)]
pub struct ImageStore {
    images: HashMap<String, ImageSequence>,
    default_images: ImageSequence,
}

impl ImageStore {
    pub fn new(default_image: ImageHandle) -> Self {
        Self {
            images: HashMap::new(),
            default_images: ImageSequence::single(default_image),
        }
    }

    /// Append one frame to the sequence under `key`.
    ///
    /// Copies the existing frames; use `insert` to register a whole sequence.
    pub fn push_image(&mut self, key: &str, image: ImageHandle) {
        let mut frames: Vec<ImageHandle> = self
            .images
            .get(key)
            .map(|seq| seq.iter().cloned().collect())
            .unwrap_or_default();
        frames.push(image);
        self.images
            .insert(key.to_string(), ImageSequence(Arc::from(frames)));
    }

    pub fn insert(&mut self, key: impl Into<String>, sequence: ImageSequence) {
        self.images.insert(key.into(), sequence);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    pub fn default_images(&self) -> &ImageSequence {
        &self.default_images
    }
}

impl ImageSource for ImageStore {
    fn image_list(&self, key: &str) -> ImageSequence {
        self.images
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_images.clone())
    }
}

/// A background tile: a label and the frames used to draw it
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub id: String,
    images: ImageSequence,
    image_index: usize,
}

impl Background {
    pub fn new(id: impl Into<String>, images: ImageSequence) -> Self {
        Self {
            id: id.into(),
            images,
            image_index: 0,
        }
    }

    pub fn current_image(&self) -> &ImageHandle {
        self.images.frame(self.image_index)
    }
}
