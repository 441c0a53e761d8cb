//! Core abstractions for seisview.
//!
//! This crate provides the data-side building blocks that the rest of seisview
//! is assembled from:
//! - [`VolumeStore`] for bounded, paged slice extraction from large volumes
//! - [`PageCache`] with least-recently-used eviction
//! - Pick identity ([`PickId`], [`PickEntity`]) and the id colour encoding
//! - Configuration [`Options`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Index arithmetic on volume dimensions converts between usize/u64/i64 freely
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod axis;
pub mod error;
pub mod options;
pub mod pick;
pub mod volume;

pub use axis::Axis;
pub use error::{Result, SeisviewError};
pub use options::{CacheOptions, InteractionOptions, Options, WorkerOptions};
pub use pick::{
    color_to_index, index_to_color, DragConstraint, MarkerId, PickEntity, PickId, PickOwner,
    SlicePlaneId, MAX_PICK_INDEX,
};
pub use volume::{
    ByteOrder, CacheStats, ElementType, FileBackend, InMemoryBackend, PageCache, Slice2D,
    SliceExtent, StorageBackend, VolumeDescriptor, VolumeLayout, VolumeShape, VolumeStore,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
