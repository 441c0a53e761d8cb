//! Modifier-gated hover and drag of pickable entities.
//!
//! ```text
//! Idle --modifier down--> HoverArmed --press on entity--> Dragging
//!  ^ ^                      |   ^                            |
//!  | +-----modifier up------+   +--release (commit)----------+
//!  +-------------------modifier up (cancel)------------------+
//! ```
//!
//! Only `HoverArmed` and `Dragging` hold the modifier, so a cancelled drag
//! returns the left button to the camera. While dragging, slice planes only
//! move their geometry (a preview). The single extraction happens on release.

use glam::Vec2;
use seisview_core::{Axis, DragConstraint, PickEntity, PickId, PickOwner, SlicePlaneId};

use crate::scene::SceneGraph;

/// Where the dragged entity was when the drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOrigin {
    /// A slice plane's committed index and the screen direction of one world
    /// unit along its axis.
    Slice {
        plane: SlicePlaneId,
        axis: Axis,
        position: usize,
        axis_on_screen: Vec2,
        units_per_index: f32,
    },
    /// A screen-space marker.
    Marker,
}

/// State of an active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub entity: PickEntity,
    pub start_pointer: Vec2,
    pub origin: DragOrigin,
    /// Pointer travel since the press.
    pub accumulated: Vec2,
    /// Index the plane would commit to right now.
    pub candidate: Option<i64>,
}

/// Drag controller states.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Selection modifier held; the hovered entity is highlighted.
    HoverArmed { hovered: Option<PickId> },
    Dragging(DragSession),
}

/// Turns pointer and modifier events into hover highlights and drags.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    pointer: Vec2,
}

/// Index steps for a pointer travel along a slice axis.
///
/// The travel is projected onto the screen direction of the axis;
/// `axis_on_screen` is how far one world unit along the axis moves on screen.
pub fn index_delta(travel: Vec2, axis_on_screen: Vec2, units_per_index: f32) -> i64 {
    let len_sq = axis_on_screen.length_squared();
    if len_sq < 1e-8 || units_per_index <= 0.0 {
        return 0;
    }
    let world = travel.dot(axis_on_screen) / len_sq;
    (world / units_per_index).round() as i64
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Returns the active session, if dragging.
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    /// Returns true unless idle.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// Returns true while dragging.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Last pointer position seen, in pixels.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    fn hover(&mut self, scene: &mut SceneGraph) -> Option<PickId> {
        let hovered = scene.resolve(self.pointer.x, self.pointer.y).map(|e| e.id);
        scene.set_highlight(hovered);
        hovered
    }

    /// Selection modifier pressed.
    pub fn modifier_pressed(&mut self, scene: &mut SceneGraph) {
        if matches!(self.state, DragState::Idle) {
            let hovered = self.hover(scene);
            log::debug!("hover armed, hovering {hovered:?}");
            self.state = DragState::HoverArmed { hovered };
        }
    }

    /// Selection modifier released: disarms hover, or cancels a drag.
    pub fn modifier_released(&mut self, scene: &mut SceneGraph) {
        match self.state {
            DragState::Idle => {}
            DragState::HoverArmed { .. } => {
                scene.set_highlight(None);
                self.state = DragState::Idle;
            }
            DragState::Dragging(session) => {
                Self::cancel(scene, &session);
                scene.set_highlight(None);
                self.state = DragState::Idle;
            }
        }
    }

    /// Pointer moved. Returns true if the event was used for hover or drag.
    pub fn pointer_moved(&mut self, scene: &mut SceneGraph, pointer: Vec2) -> bool {
        self.pointer = pointer;
        match self.state {
            DragState::Idle => false,
            DragState::HoverArmed { .. } => {
                let hovered = self.hover(scene);
                self.state = DragState::HoverArmed { hovered };
                true
            }
            DragState::Dragging(mut session) => {
                session.accumulated = pointer - session.start_pointer;
                match session.origin {
                    DragOrigin::Slice {
                        plane,
                        position,
                        axis_on_screen,
                        units_per_index,
                        ..
                    } => {
                        let delta =
                            index_delta(session.accumulated, axis_on_screen, units_per_index);
                        let candidate = position as i64 + delta;
                        session.candidate = Some(candidate);
                        scene.preview_slice_position(plane, candidate);
                    }
                    DragOrigin::Marker => {
                        if let Some(legend) = scene.legend_mut() {
                            legend.drag_to(pointer);
                        }
                    }
                }
                self.state = DragState::Dragging(session);
                true
            }
        }
    }

    /// Primary button pressed. Returns true if a drag started.
    pub fn pointer_pressed(&mut self, scene: &mut SceneGraph) -> bool {
        let DragState::HoverArmed { hovered: Some(id) } = self.state else {
            return false;
        };
        let Some(entity) = scene.registry().get(id).copied() else {
            return false;
        };
        let Some(origin) = Self::origin(scene, &entity, self.pointer) else {
            return false;
        };
        log::debug!("drag start on {id} at {:?}", self.pointer);
        self.state = DragState::Dragging(DragSession {
            entity,
            start_pointer: self.pointer,
            origin,
            accumulated: Vec2::ZERO,
            candidate: None,
        });
        true
    }

    /// Primary button released. Returns true if a drag was committed.
    pub fn pointer_released(&mut self, scene: &mut SceneGraph) -> bool {
        let DragState::Dragging(session) = self.state else {
            return false;
        };
        match session.origin {
            DragOrigin::Slice { plane, position, .. } => {
                let target = session.candidate.unwrap_or(position as i64);
                scene.clear_slice_preview(plane);
                scene.set_slice_position(plane, target);
            }
            DragOrigin::Marker => {
                if let Some(legend) = scene.legend_mut() {
                    legend.update_location();
                }
            }
        }
        log::debug!("drag commit on {}", session.entity.id);
        self.state = DragState::HoverArmed {
            hovered: Some(session.entity.id),
        };
        true
    }

    fn origin(scene: &mut SceneGraph, entity: &PickEntity, pointer: Vec2) -> Option<DragOrigin> {
        match (entity.owner, entity.constraint) {
            (PickOwner::SlicePlane(plane_id), DragConstraint::Axis(axis)) => {
                let plane = scene.plane(plane_id)?;
                let camera = scene.camera();
                let start = plane.center();
                let axis_on_screen = match (camera.project(start), camera.project(start + axis.unit())) {
                    (Some(a), Some(b)) => (b - a).truncate(),
                    _ => Vec2::ZERO,
                };
                Some(DragOrigin::Slice {
                    plane: plane_id,
                    axis,
                    position: plane.position(),
                    axis_on_screen,
                    units_per_index: plane.world_units_per_index(),
                })
            }
            (PickOwner::Marker(_), _) => {
                let legend = scene.legend_mut()?;
                legend.set_anchor(pointer);
                Some(DragOrigin::Marker)
            }
            (PickOwner::SlicePlane(_), DragConstraint::ScreenPlane) => None,
        }
    }

    fn cancel(scene: &mut SceneGraph, session: &DragSession) {
        match session.origin {
            DragOrigin::Slice { plane, .. } => scene.clear_slice_preview(plane),
            DragOrigin::Marker => {
                if let Some(legend) = scene.legend_mut() {
                    legend.cancel_drag();
                }
            }
        }
        log::debug!("drag cancelled on {}", session.entity.id);
    }
}
