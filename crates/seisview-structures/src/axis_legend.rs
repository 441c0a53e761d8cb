//! Draggable XYZ axis legend drawn in screen space.
//!
//! The legend follows the turntable camera's rotation and sits at a fixed
//! pixel location. In selection mode it can be grabbed and dragged; a
//! yellow disc shows where it will land until the drag is committed.

use glam::{Mat4, Vec2, Vec3, Vec4};
use seisview_core::{DragConstraint, MarkerId, PickEntity, PickId, PickOwner};
use seisview_render::{
    Camera, DiscDraw, FrameRenderer, LineSegment, PickPrimitive, PickShape, RenderResult,
};

const HIGHLIGHT_RGB: Vec3 = Vec3::new(1.0, 1.0, 0.0);
const HIGHLIGHT_IDLE_ALPHA: f32 = 0.5;
const HIGHLIGHT_DRAG_ALPHA: f32 = 1.0;

/// A screen-space XYZ axis legend.
#[derive(Debug, Clone)]
pub struct AxisLegend {
    id: MarkerId,
    /// Centre in pixels, measured from the top-left corner.
    loc: Vec2,
    /// Axis length and highlight radius in pixels.
    size: f32,
    line_width: f32,
    visible: bool,
    /// z-down seismic convention: y and z are flipped.
    seismic_coord_system: bool,
    pick_id: Option<PickId>,
    /// Pointer offset from `loc` captured at press.
    anchor: Option<Vec2>,
    /// Pending move, applied by `update_location`.
    offset: Vec2,
    highlight_center: Vec2,
    highlight_alpha: f32,
    highlight_visible: bool,
}

impl AxisLegend {
    /// Creates a legend at `(60, 60)` with size 50.
    pub fn new(id: MarkerId) -> Self {
        Self::with_location(id, Vec2::new(60.0, 60.0), 50.0)
    }

    /// Creates a legend at `loc` with the given size in pixels.
    pub fn with_location(id: MarkerId, loc: Vec2, size: f32) -> Self {
        Self {
            id,
            loc,
            size,
            line_width: 2.0,
            visible: true,
            seismic_coord_system: true,
            pick_id: None,
            anchor: None,
            offset: Vec2::ZERO,
            highlight_center: loc,
            highlight_alpha: HIGHLIGHT_IDLE_ALPHA,
            highlight_visible: false,
        }
    }

    /// Returns the marker id.
    pub fn id(&self) -> MarkerId {
        self.id
    }

    /// Returns the centre in pixels.
    pub fn loc(&self) -> Vec2 {
        self.loc
    }

    /// Returns the size in pixels.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Returns the pending drag offset.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Returns the anchor captured at press, while dragging.
    pub fn anchor(&self) -> Option<Vec2> {
        self.anchor
    }

    /// Returns whether the legend is drawn and pickable.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the legend.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns whether the z-down convention is used.
    pub fn seismic_coord_system(&self) -> bool {
        self.seismic_coord_system
    }

    /// Switches between z-down (seismic) and z-up conventions.
    pub fn set_seismic_coord_system(&mut self, seismic: bool) {
        self.seismic_coord_system = seismic;
    }

    /// Returns the pick id, once registered.
    pub fn pick_id(&self) -> Option<PickId> {
        self.pick_id
    }

    /// Sets the pick id.
    pub fn set_pick_id(&mut self, id: Option<PickId>) {
        self.pick_id = id;
    }

    /// Returns the highlight centre and alpha.
    pub fn highlight(&self) -> (Vec2, f32) {
        (self.highlight_center, self.highlight_alpha)
    }

    /// Returns whether the highlight disc is shown.
    pub fn is_highlighted(&self) -> bool {
        self.highlight_visible
    }

    /// Shows or hides the highlight disc.
    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.highlight_visible = highlighted;
    }

    /// Returns true between `set_anchor` and `update_location`.
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// Hooks the legend to the pointer at press.
    pub fn set_anchor(&mut self, press: Vec2) {
        self.anchor = Some(press - self.loc);
    }

    /// Moves the highlight to follow the pointer; the legend itself stays put.
    pub fn drag_to(&mut self, pointer: Vec2) {
        let new_center = pointer - self.anchor.unwrap_or(Vec2::ZERO);
        self.offset = new_center - self.loc;
        self.highlight_center = new_center;
        self.highlight_alpha = HIGHLIGHT_DRAG_ALPHA;
    }

    /// Puts the highlight back on the legend, translucent.
    pub fn reset_highlight(&mut self) {
        self.highlight_center = self.loc;
        self.highlight_alpha = HIGHLIGHT_IDLE_ALPHA;
    }

    /// Commits the pending offset.
    pub fn update_location(&mut self) {
        self.loc += self.offset;
        self.anchor = None;
        self.offset = Vec2::ZERO;
        self.reset_highlight();
    }

    /// Discards the pending offset.
    pub fn cancel_drag(&mut self) {
        self.anchor = None;
        self.offset = Vec2::ZERO;
        self.reset_highlight();
    }

    /// Maps legend-local axis coordinates to pixels.
    ///
    /// The legend is aligned with the turntable rotation, scaled in the
    /// screen plane only and moved to `loc`.
    pub fn axis_transform(&self, camera: &Camera) -> Mat4 {
        let state = camera.state();
        let flip = if self.seismic_coord_system {
            Mat4::from_scale(Vec3::new(1.0, -1.0, -1.0))
        } else {
            Mat4::IDENTITY
        };
        Mat4::from_translation(self.loc.extend(0.0))
            * Mat4::from_scale(Vec3::new(self.size, self.size, 0.001))
            * Mat4::from_rotation_x(state.elevation.to_radians())
            * Mat4::from_rotation_y(state.azimuth.to_radians())
            * Mat4::from_rotation_x(90f32.to_radians())
            * flip
    }

    /// The three axis lines (x red, y green, z blue) in pixels.
    pub fn axis_segments(&self, camera: &Camera) -> [LineSegment; 3] {
        let m = self.axis_transform(camera);
        let origin = m.transform_point3(Vec3::ZERO);
        let segment = |axis: Vec3| LineSegment {
            start: origin,
            end: m.transform_point3(axis),
            color: axis.extend(1.0),
            width: self.line_width,
            screen_space: true,
        };
        [segment(Vec3::X), segment(Vec3::Y), segment(Vec3::Z)]
    }

    /// Registry entry for this marker, once it has a pick id.
    pub fn pick_entity(&self) -> Option<PickEntity> {
        Some(PickEntity {
            id: self.pick_id?,
            owner: PickOwner::Marker(self.id),
            constraint: DragConstraint::ScreenPlane,
        })
    }

    /// Screen disc covering the legend, drawn in front of world geometry.
    pub fn pick_primitive(&self) -> Option<PickPrimitive> {
        if !self.visible {
            return None;
        }
        Some(PickPrimitive {
            id: self.pick_id?,
            shape: PickShape::ScreenDisc {
                center: self.loc,
                radius: self.size,
            },
        })
    }

    /// Submits the axis lines and, when shown, the highlight disc.
    pub fn draw(&self, renderer: &mut dyn FrameRenderer, camera: &Camera) -> RenderResult<()> {
        if !self.visible {
            return Ok(());
        }
        renderer.draw_lines(&self.axis_segments(camera))?;
        if self.highlight_visible || self.is_dragging() {
            renderer.draw_disc(&DiscDraw {
                center: self.highlight_center,
                radius: self.size,
                color: Vec4::from((HIGHLIGHT_RGB, self.highlight_alpha)),
            })?;
        }
        Ok(())
    }
}
