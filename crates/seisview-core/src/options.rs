//! Configuration options for seisview.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeisviewError};

/// Global configuration options for seisview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Resident page cache settings.
    pub cache: CacheOptions,

    /// Background extraction worker settings.
    pub workers: WorkerOptions,

    /// Camera and drag interaction settings.
    pub interaction: InteractionOptions,

    /// Name of the color map applied to new slices.
    pub colormap: String,

    /// Background color.
    pub background_color: Vec3,

    /// World-space size of one sample step along x, y and z.
    pub voxel_spacing: Vec3,

    /// Whether the z axis points down (seismic convention).
    pub seismic_coord_system: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            workers: WorkerOptions::default(),
            interaction: InteractionOptions::default(),
            colormap: "grays".to_string(),
            background_color: Vec3::new(1.0, 1.0, 1.0),
            voxel_spacing: Vec3::ONE,
            seismic_coord_system: true,
        }
    }
}

impl Options {
    /// Parses options from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if self.cache.page_size == 0 {
            return Err(SeisviewError::InvalidConfig(
                "cache.page_size must be positive".into(),
            ));
        }
        if self.cache.budget_bytes == 0 {
            return Err(SeisviewError::InvalidConfig(
                "cache.budget_bytes must be positive".into(),
            ));
        }
        if self.workers.threads == 0 || self.workers.queue_depth == 0 {
            return Err(SeisviewError::InvalidConfig(
                "workers.threads and workers.queue_depth must be positive".into(),
            ));
        }
        if self.interaction.min_distance <= 0.0 {
            return Err(SeisviewError::InvalidConfig(
                "interaction.min_distance must be greater than zero".into(),
            ));
        }
        if self.voxel_spacing.min_element() <= 0.0 {
            return Err(SeisviewError::InvalidConfig(
                "voxel_spacing components must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the resident page cache of a [`VolumeStore`](crate::VolumeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Size of one storage page in bytes.
    pub page_size: usize,
    /// Resident memory budget in bytes before least-recently-used pages are evicted.
    pub budget_bytes: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            page_size: 64 * 1024,
            budget_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Settings for the background extraction workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOptions {
    /// Number of worker threads.
    pub threads: usize,
    /// Capacity of the request queue shared by the workers.
    pub queue_depth: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            threads: 2,
            queue_depth: 16,
        }
    }
}

/// Camera and drag interaction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionOptions {
    /// Degrees of rotation per pixel of pointer motion.
    pub rotate_speed: f32,
    /// Exponential zoom rate per pixel of secondary-button drag.
    pub zoom_speed: f32,
    /// Multiplicative zoom per wheel notch.
    pub wheel_zoom_factor: f32,
    /// Smallest allowed camera distance.
    pub min_distance: f32,
    /// Largest allowed absolute elevation in degrees.
    pub elevation_limit: f32,
    /// Radius in pixels of the neighbourhood searched when resolving a pick.
    pub pick_tolerance: u32,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            rotate_speed: 0.5,
            zoom_speed: 0.005,
            wheel_zoom_factor: 1.1,
            min_distance: 1e-3,
            elevation_limit: 89.0,
            pick_tolerance: 2,
        }
    }
}
