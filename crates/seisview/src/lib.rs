//! seisview: interactive slicing of large seismic volumes.
//!
//! A volume is shown as axis-aligned slice planes. Planes are extracted from
//! a paged [`VolumeStore`] on worker threads, picked through an id-buffer and
//! dragged along their normal axis while the selection modifier is held.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use seisview::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let options = Options::default();
//!     let shape = VolumeShape::new(100, 100, 100);
//!     let samples = vec![0.0; shape.num_samples()];
//!     let store = Arc::new(VolumeStore::from_samples(shape, &samples, &options.cache)?);
//!
//!     let mut scene = SceneGraph::threaded(store, options, 1280, 720)?;
//!     scene.add_slices(&[50], &[50], &[50], (-1.0, 1.0))?;
//!     scene.add_axis_legend()?;
//!
//!     let mut viewer = Viewer::new(scene);
//!     viewer.handle_event(InputEvent::KeyDown(Key::Control));
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`SceneGraph`] owns every entity, the [`Camera`] and the
//!   [`PickableRegistry`]
//! - [`DragController`] is the hover/drag state machine
//! - [`ExtractionDispatcher`] runs slice extractions ([`InlineExtractor`],
//!   [`ExtractionWorkerPool`])
//! - [`Viewer`] routes [`InputEvent`]s; [`WinitInput`] produces them from winit

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod drag;
mod extraction;
mod headless;
mod input;
mod picking;
mod scene;
mod viewer;
mod winit_input;

pub use drag::{index_delta, DragController, DragOrigin, DragSession, DragState};
pub use extraction::{ExtractionDispatcher, ExtractionResult, ExtractionWorkerPool, InlineExtractor};
pub use headless::gpu_pick_pass;
pub use input::{Command, InputEvent, Key, PointerButton};
pub use picking::PickableRegistry;
pub use scene::SceneGraph;
pub use viewer::{ScreenshotSink, Viewer};
pub use winit_input::WinitInput;

// Re-export core types
pub use seisview_core::{
    Axis, ByteOrder, CacheOptions, CacheStats, DragConstraint, ElementType, FileBackend,
    InMemoryBackend, InteractionOptions, MarkerId, Options, PickEntity, PickId, PickOwner,
    Result, SeisviewError, Slice2D, SliceExtent, SlicePlaneId, StorageBackend, VolumeDescriptor,
    VolumeLayout, VolumeShape, VolumeStore, WorkerOptions,
    Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use seisview_render::{
    Camera, CameraState, ColorMap, ColorMapRegistry, CpuPickPass, DiscDraw, FrameRenderer,
    IdBuffer, IdRegion, LineSegment, PickPass, PickPrimitive, PickShape, ProjectionMode,
    RecordedFrame, RecordedSlice, RecordingRenderer, RenderError, RenderResult, SliceDraw,
    SliceTexture, WgpuPickPass,
};

// Re-export structures
pub use seisview_structures::{ApplyOutcome, AxisLegend, ExtractionRequest, SlicePlane};

/// Initializes `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Builds one slice plane per requested position per axis, in x, y, z order.
///
/// Positions are clamped to the volume. Planes use the `grays` color map and
/// unit voxel spacing; insert them with [`SceneGraph::insert_slice_plane`].
pub fn create_slices(
    volume: &VolumeStore,
    x_positions: &[i64],
    y_positions: &[i64],
    z_positions: &[i64],
    clim: (f32, f32),
) -> Vec<SlicePlane> {
    let colormap = ColorMapRegistry::new().get_or_default("grays");
    let shape = volume.shape();
    let requested = [
        (Axis::X, x_positions),
        (Axis::Y, y_positions),
        (Axis::Z, z_positions),
    ];
    let mut planes = Vec::new();
    for (axis, positions) in requested {
        for &position in positions {
            let id = SlicePlaneId(planes.len() as u32);
            planes.push(SlicePlane::new(id, axis, position, shape, clim, colormap.clone()));
        }
    }
    planes
}
