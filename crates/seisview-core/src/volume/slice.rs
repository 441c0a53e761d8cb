//! Slice extents and extracted 2-D slice images.

use std::ops::Range;

use super::layout::VolumeShape;
use crate::axis::Axis;

/// In-plane bounds of a slice, in sample indices along the slice's `(u, v)` axes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceExtent {
    pub u: Range<usize>,
    pub v: Range<usize>,
}

impl SliceExtent {
    /// Creates an extent.
    pub fn new(u: Range<usize>, v: Range<usize>) -> Self {
        Self { u, v }
    }

    /// The whole cross-section of a volume normal to `axis`.
    pub fn full(shape: &VolumeShape, axis: Axis) -> Self {
        let (u_axis, v_axis) = axis.plane_axes();
        Self {
            u: 0..shape.len(u_axis),
            v: 0..shape.len(v_axis),
        }
    }

    /// Clamps both ranges to the volume's cross-section normal to `axis`.
    pub fn clamped(&self, shape: &VolumeShape, axis: Axis) -> Self {
        let (u_axis, v_axis) = axis.plane_axes();
        let clamp = |r: &Range<usize>, len: usize| {
            let end = r.end.min(len);
            r.start.min(end)..end
        };
        Self {
            u: clamp(&self.u, shape.len(u_axis)),
            v: clamp(&self.v, shape.len(v_axis)),
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.u.len()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.v.len()
    }

    /// Returns true if the extent covers no samples.
    pub fn is_empty(&self) -> bool {
        self.u.is_empty() || self.v.is_empty()
    }
}

/// A 2D array of samples extracted from a volume.
///
/// Samples are stored row-major: `data[v * width + u]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice2D {
    pub axis: Axis,
    pub position: usize,
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Slice2D {
    /// Value used for samples that could not be read.
    pub const BACKGROUND: f32 = f32::NAN;

    /// A slice filled with the background value.
    pub fn background(axis: Axis, position: usize, width: usize, height: usize) -> Self {
        Self {
            axis,
            position,
            width,
            height,
            data: vec![Self::BACKGROUND; width * height],
        }
    }

    /// Returns the sample at column `u`, row `v`.
    pub fn get(&self, u: usize, v: usize) -> Option<f32> {
        if u >= self.width || v >= self.height {
            return None;
        }
        self.data.get(v * self.width + u).copied()
    }

    /// Returns true if every sample is background.
    pub fn is_background(&self) -> bool {
        self.data.iter().all(|s| s.is_nan())
    }

    /// Minimum and maximum of the non-background samples.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|s| !s.is_nan())
            .fold(None, |acc, s| match acc {
                None => Some((s, s)),
                Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
            })
    }
}
