//! Pick identity and id-buffer colour encoding.
//!
//! Every draggable entity gets a [`PickId`]. The pick pass renders each entity
//! in a flat colour that packs its id into the RGB channels; reading a pixel
//! back and decoding it tells us what is under the cursor. Id 0 is the
//! background and is never assigned.

use std::fmt;
use std::num::NonZeroU32;

use crate::axis::Axis;

/// Largest id representable in a 24-bit RGB pick colour.
pub const MAX_PICK_INDEX: u32 = 0x00FF_FFFF;

/// A live entity's identity in the id-buffer. Never 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(NonZeroU32);

impl PickId {
    /// Wraps a raw id. Returns `None` for the background value 0 or ids
    /// that do not fit in 24 bits.
    pub fn new(raw: u32) -> Option<Self> {
        if raw > MAX_PICK_INDEX {
            return None;
        }
        NonZeroU32::new(raw).map(Self)
    }

    /// Returns the raw id.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns the RGB colour this id is drawn with in the pick pass.
    pub fn to_color(self) -> [u8; 3] {
        index_to_color(self.get())
    }
}

impl fmt::Display for PickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.get())
    }
}

/// Handle of a slice plane inside a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlicePlaneId(pub u32);

/// Handle of a screen-space marker inside a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

/// Back-reference from a pick entity to the visual that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickOwner {
    /// An axis-aligned slice plane.
    SlicePlane(SlicePlaneId),
    /// A screen-space marker such as the axis legend.
    Marker(MarkerId),
}

/// The directions an entity may be dragged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragConstraint {
    /// Motion along a single world axis (the normal of a slice plane).
    Axis(Axis),
    /// Free motion in the screen plane.
    ScreenPlane,
}

/// A registered, pickable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickEntity {
    /// The entity's id in the id-buffer.
    pub id: PickId,
    /// The visual this entity stands for.
    pub owner: PickOwner,
    /// How the entity may be dragged.
    pub constraint: DragConstraint,
}

/// Encodes an index as a pick color.
///
/// Returns [R, G, B] where:
/// - R contains bits 16-23
/// - G contains bits 8-15
/// - B contains bits 0-7
pub fn index_to_color(index: u32) -> [u8; 3] {
    [
        ((index >> 16) & 0xFF) as u8,
        ((index >> 8) & 0xFF) as u8,
        (index & 0xFF) as u8,
    ]
}

/// Decodes a pick color back to an index.
pub fn color_to_index(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}
