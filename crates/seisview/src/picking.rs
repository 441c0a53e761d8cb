//! Registry of pickable entities and screen-space resolution.

use std::collections::BTreeMap;

use seisview_core::{
    DragConstraint, PickEntity, PickId, PickOwner, Result, SeisviewError, MAX_PICK_INDEX,
};
use seisview_render::{Camera, CpuPickPass, IdBuffer, PickPass, PickPrimitive, RenderResult};

/// Owns pick-id allocation and the id-buffer pass used to resolve clicks.
///
/// Ids are allocated monotonically and wrap within the 24-bit space, skipping
/// ids that are still live. The id-buffer is only re-rendered when marked
/// dirty.
pub struct PickableRegistry {
    entities: BTreeMap<PickId, PickEntity>,
    next_id: u32,
    pass: Box<dyn PickPass + Send>,
    tolerance: u32,
    dirty: bool,
}

impl PickableRegistry {
    /// Creates a registry rendering through `pass`, resolving within
    /// `tolerance` pixels.
    pub fn new(pass: Box<dyn PickPass + Send>, tolerance: u32) -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            pass,
            tolerance,
            dirty: true,
        }
    }

    /// Creates a registry with a software pick pass of the given size.
    pub fn with_cpu_pass(width: u32, height: u32, tolerance: u32) -> Self {
        Self::new(Box::new(CpuPickPass::new(width, height)), tolerance)
    }

    /// Registers a new entity and returns its id.
    pub fn register(&mut self, owner: PickOwner, constraint: DragConstraint) -> Result<PickId> {
        let id = self.allocate()?;
        self.entities.insert(
            id,
            PickEntity {
                id,
                owner,
                constraint,
            },
        );
        self.dirty = true;
        log::debug!("registered pick id {id} for {owner:?}");
        Ok(id)
    }

    /// Registers an entity under the id it already carries.
    pub fn register_with_id(&mut self, entity: PickEntity) -> Result<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(SeisviewError::DuplicatePickId(entity.id.get()));
        }
        self.entities.insert(entity.id, entity);
        self.dirty = true;
        Ok(())
    }

    fn allocate(&mut self) -> Result<PickId> {
        for _ in 0..MAX_PICK_INDEX {
            let candidate = PickId::new(self.next_id);
            self.next_id = if self.next_id >= MAX_PICK_INDEX {
                1
            } else {
                self.next_id + 1
            };
            if let Some(id) = candidate {
                if !self.entities.contains_key(&id) {
                    return Ok(id);
                }
            }
        }
        Err(SeisviewError::PickIdSpaceExhausted)
    }

    /// Removes an entity. Its id may be handed out again later.
    pub fn remove(&mut self, id: PickId) -> Option<PickEntity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Looks up a live entity.
    pub fn get(&self, id: PickId) -> Option<&PickEntity> {
        self.entities.get(&id)
    }

    /// Looks up an entity by raw decoded id.
    pub fn lookup(&self, raw: u32) -> Result<PickEntity> {
        PickId::new(raw)
            .and_then(|id| self.entities.get(&id))
            .copied()
            .ok_or(SeisviewError::StalePickId(raw))
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &PickEntity> {
        self.entities.values()
    }

    /// Pixel radius searched by [`PickableRegistry::resolve`].
    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Sets the pixel radius searched by [`PickableRegistry::resolve`].
    pub fn set_tolerance(&mut self, tolerance: u32) {
        self.tolerance = tolerance;
    }

    /// Flags the id-buffer as out of date.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the id-buffer is out of date.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Draws the id-buffer for the given primitives.
    ///
    /// Primitives whose id is not live are skipped.
    pub fn render_id_buffer(
        &mut self,
        camera: &Camera,
        primitives: &[PickPrimitive],
    ) -> RenderResult<()> {
        let live: Vec<PickPrimitive> = primitives
            .iter()
            .filter(|p| self.entities.contains_key(&p.id))
            .copied()
            .collect();
        self.pass.render(camera, &live)?;
        self.dirty = false;
        Ok(())
    }

    /// Returns the entity under a pixel, or `None` for background and stale ids.
    pub fn resolve(&self, x: f32, y: f32) -> Option<PickEntity> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let region = match self.pass.read_region(x as u32, y as u32, self.tolerance) {
            Ok(region) => region,
            Err(err) => {
                log::debug!("pick read at ({x}, {y}) failed: {err}");
                return None;
            }
        };
        let raw = region.nearest_hit()?;
        match self.lookup(raw) {
            Ok(entity) => Some(entity),
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    /// Reads back the whole id-buffer.
    pub fn id_buffer(&self) -> RenderResult<IdBuffer> {
        self.pass.read_buffer()
    }

    /// Returns the pick pass size.
    pub fn size(&self) -> (u32, u32) {
        self.pass.size()
    }
}

impl std::fmt::Debug for PickableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickableRegistry")
            .field("entities", &self.entities.len())
            .field("next_id", &self.next_id)
            .field("tolerance", &self.tolerance)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use seisview_core::{Axis, MarkerId, SlicePlaneId};
    use seisview_render::{CameraState, PickShape};

    fn registry() -> PickableRegistry {
        PickableRegistry::with_cpu_pass(100, 100, 0)
    }

    fn plane_owner(n: u32) -> PickOwner {
        PickOwner::SlicePlane(SlicePlaneId(n))
    }

    #[test]
    fn test_ids_are_unique_and_nonzero() {
        let mut r = registry();
        let a = r.register(plane_owner(0), DragConstraint::Axis(Axis::X)).unwrap();
        let b = r.register(plane_owner(1), DragConstraint::Axis(Axis::Y)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.get(), 1);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut r = registry();
        let id = r.register(plane_owner(0), DragConstraint::Axis(Axis::X)).unwrap();
        let entity = *r.get(id).unwrap();
        assert!(matches!(
            r.register_with_id(entity),
            Err(SeisviewError::DuplicatePickId(1))
        ));
    }

    #[test]
    fn test_allocation_wraps_and_skips_live_ids() {
        let mut r = registry();
        let first = r.register(plane_owner(0), DragConstraint::ScreenPlane).unwrap();
        r.next_id = MAX_PICK_INDEX;
        let last = r.register(plane_owner(1), DragConstraint::ScreenPlane).unwrap();
        assert_eq!(last.get(), MAX_PICK_INDEX);
        // 1 is still live, so the wrap lands on 2.
        let wrapped = r.register(plane_owner(2), DragConstraint::ScreenPlane).unwrap();
        assert_eq!(first.get(), 1);
        assert_eq!(wrapped.get(), 2);
    }

    #[test]
    fn test_lookup_reports_stale_ids() {
        let mut r = registry();
        let id = r.register(plane_owner(0), DragConstraint::ScreenPlane).unwrap();
        r.remove(id);
        assert!(matches!(r.lookup(id.get()), Err(SeisviewError::StalePickId(1))));
        assert!(matches!(r.lookup(0), Err(SeisviewError::StalePickId(0))));
    }

    #[test]
    fn test_resolve_hit_background_and_stale() {
        let mut r = registry();
        let camera = Camera::with_state(100, 100, CameraState::default());
        let id = r
            .register(PickOwner::Marker(MarkerId(0)), DragConstraint::ScreenPlane)
            .unwrap();
        let disc = PickPrimitive {
            id,
            shape: PickShape::ScreenDisc {
                center: Vec2::new(20.0, 20.0),
                radius: 8.0,
            },
        };
        r.render_id_buffer(&camera, &[disc]).unwrap();
        assert!(!r.is_dirty());
        assert_eq!(r.resolve(20.0, 20.0).map(|e| e.id), Some(id));
        assert!(r.resolve(80.0, 80.0).is_none());
        assert!(r.resolve(-1.0, 5.0).is_none());
        assert!(r.resolve(500.0, 5.0).is_none());

        // Removed but not yet re-rendered: the stale pixel resolves to nothing.
        r.remove(id);
        assert!(r.is_dirty());
        assert!(r.resolve(20.0, 20.0).is_none());
    }

    #[test]
    fn test_tolerance_finds_nearby_entity() {
        let mut r = PickableRegistry::with_cpu_pass(100, 100, 3);
        let camera = Camera::new(100, 100);
        let id = r
            .register(PickOwner::Marker(MarkerId(0)), DragConstraint::ScreenPlane)
            .unwrap();
        let disc = PickPrimitive {
            id,
            shape: PickShape::ScreenDisc {
                center: Vec2::new(50.0, 50.0),
                radius: 4.0,
            },
        };
        r.render_id_buffer(&camera, &[disc]).unwrap();
        assert_eq!(r.resolve(56.5, 50.5).map(|e| e.id), Some(id));
        assert!(r.resolve(60.5, 50.5).is_none());
    }

    #[test]
    fn test_unregistered_primitives_are_not_drawn() {
        let mut r = registry();
        let camera = Camera::new(100, 100);
        let ghost = PickPrimitive {
            id: PickId::new(42).unwrap(),
            shape: PickShape::WorldQuad([Vec3::ZERO; 4]),
        };
        r.render_id_buffer(&camera, &[ghost]).unwrap();
        assert!(r.id_buffer().unwrap().ids().iter().all(|&id| id == 0));
    }
}
