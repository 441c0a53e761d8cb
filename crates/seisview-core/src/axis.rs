//! Volume axes.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One of the three volume axes.
///
/// `X` indexes `i`, `Y` indexes `j` and `Z` indexes `k` in the row-major
/// sample layout `i * Ny * Nz + j * Nz + k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns 0, 1 or 2.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Returns the world unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Returns the two in-plane axes `(u, v)` of a slice normal to this axis.
    ///
    /// Slices are stored with `u` along columns and `v` along rows.
    pub fn plane_axes(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::X, Axis::Z),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Returns the lower-case display name.
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_axes_exclude_normal() {
        for axis in Axis::ALL {
            let (u, v) = axis.plane_axes();
            assert_ne!(u, axis);
            assert_ne!(v, axis);
            assert_ne!(u, v);
        }
    }

    #[test]
    fn test_unit_matches_index() {
        for axis in Axis::ALL {
            assert_eq!(axis.unit()[axis.index()], 1.0);
        }
    }
}
