//! Rendering layer for seisview.
//!
//! This crate provides:
//! - The turntable [`Camera`] and its replayable [`CameraState`]
//! - Color maps that turn scalar slices into RGBA textures
//! - The id-buffer pick pass interface ([`PickPass`]) with a software
//!   rasterizer ([`CpuPickPass`]) and a wgpu backend ([`WgpuPickPass`])
//! - The [`FrameRenderer`] interface scenes draw through

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod camera;
pub mod color_maps;
pub mod error;
pub mod frame;
pub mod gpu_pick;
pub mod pick;
pub mod texture;

pub use camera::{Camera, CameraState, ProjectionMode};
pub use color_maps::{ColorMap, ColorMapRegistry};
pub use error::{RenderError, RenderResult};
pub use frame::{
    DiscDraw, FrameRenderer, LineSegment, RecordedFrame, RecordedSlice, RecordingRenderer, SliceDraw,
};
pub use gpu_pick::WgpuPickPass;
pub use pick::{
    clip_space_triangles, CpuPickPass, IdBuffer, IdRegion, PickPass, PickPrimitive, PickShape,
};
pub use texture::SliceTexture;
