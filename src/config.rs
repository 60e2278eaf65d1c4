use std::path::Path;
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::events::{ImageDescriptor, SlideshowId};
use crate::grid::GridShape;
use crate::pattern::Pattern;

/// Durations that drive one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Timing {
    /// Idle time between the end of one cycle and the start of the next.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Length of each cell's fade to transparent.
    #[serde(with = "humantime_serde")]
    pub transition: Duration,
    /// Delay per rank unit before a cell starts fading.
    #[serde(with = "humantime_serde")]
    pub step: Duration,
    /// Pause between restoring the cells and repainting the backdrop.
    #[serde(with = "humantime_serde")]
    pub settle: Duration,
}

impl Timing {
    const fn default_interval() -> Duration {
        Duration::from_millis(3000)
    }

    const fn default_transition() -> Duration {
        Duration::from_millis(400)
    }

    const fn default_step() -> Duration {
        Duration::from_millis(400)
    }

    const fn default_settle() -> Duration {
        Duration::from_millis(100)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
            transition: Self::default_transition(),
            step: Self::default_step(),
            settle: Self::default_settle(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Name of the element hosting the grid.
    pub container: String,
    /// Height of the container in pixels.
    pub container_height: f32,
    /// Identifier of this slideshow, used to tell instances apart in logs.
    pub id: SlideshowId,
    pub grid: GridShape,
    #[serde(flatten)]
    pub timing: Timing,
    /// Reveal pattern, either a preset name or a tagged map.
    pub pattern: Pattern,
    /// Alternative image catalogs; one of them is shown at a time.
    pub image_sets: Vec<Vec<ImageDescriptor>>,
    /// Index into `image_sets` shown at startup.
    pub active_image_set: usize,
    /// Optional deterministic seed for the random reveal pattern.
    pub seed: Option<u64>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(!self.container.is_empty(), "container must be provided");
        ensure!(
            self.container_height.is_finite() && self.container_height > 0.0,
            "container-height must be positive"
        );
        ensure!(
            !self.grid.is_empty(),
            "grid must have at least one row and one column"
        );
        ensure!(
            !self.timing.interval.is_zero(),
            "interval must be greater than zero"
        );
        ensure!(
            !self.image_sets.is_empty(),
            "image-sets must include at least one set"
        );
        ensure!(
            self.active_image_set < self.image_sets.len(),
            "active-image-set {} is out of range ({} sets configured)",
            self.active_image_set,
            self.image_sets.len()
        );
        for (idx, set) in self.image_sets.iter().enumerate() {
            ensure!(!set.is_empty(), "image-sets[{}] must not be empty", idx);
        }
        Ok(self)
    }

    pub fn active_images(&self) -> &[ImageDescriptor] {
        self.image_sets
            .get(self.active_image_set)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            container: "block".to_string(),
            container_height: 600.0,
            id: SlideshowId::default(),
            grid: GridShape::default(),
            timing: Timing::default(),
            pattern: Pattern::default(),
            image_sets: Vec::new(),
            active_image_set: 0,
            seed: None,
        }
    }
}
