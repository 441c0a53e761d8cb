//! Scene entities for seisview.
//!
//! This crate provides:
//! - [`SlicePlane`]: an axis-aligned cross-section of a volume with its
//!   colour-mapped texture and request bookkeeping
//! - [`AxisLegend`]: the draggable screen-space XYZ axis marker

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod axis_legend;
pub mod slice_plane;

pub use axis_legend::AxisLegend;
pub use slice_plane::{ApplyOutcome, ExtractionRequest, SlicePlane};
