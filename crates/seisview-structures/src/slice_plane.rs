//! Axis-aligned slice planes through a volume.
//!
//! A slice plane owns the raw samples of its last successful extraction and
//! a colour-mapped texture derived from them. Moving the plane does not touch
//! storage directly: it hands back an [`ExtractionRequest`] for the caller to
//! run wherever blocking I/O is acceptable, and the result comes back through
//! [`SlicePlane::apply_extraction`]. Every request carries a sequence number
//! and only the newest one is ever applied.

use glam::{Vec3, Vec4};
use seisview_core::{
    Axis, DragConstraint, PickEntity, PickId, PickOwner, Result, Slice2D, SliceExtent,
    SlicePlaneId, VolumeShape,
};
use seisview_render::{
    ColorMap, FrameRenderer, PickPrimitive, PickShape, RenderResult, SliceDraw, SliceTexture,
};

/// A request to (re-)extract a plane's samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub plane: SlicePlaneId,
    /// Staleness token; increases with every request a plane issues.
    pub seq: u64,
    pub axis: Axis,
    pub position: usize,
    pub extent: SliceExtent,
}

/// What happened to an extraction result handed to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The result was the newest request and now backs the texture.
    Applied,
    /// A newer request was issued after this one; the result was dropped.
    Stale,
    /// The extraction failed; the last good texture is kept.
    Failed,
}

/// An axis-aligned cross-section of a volume, displayed as a textured quad.
#[derive(Debug, Clone)]
pub struct SlicePlane {
    id: SlicePlaneId,
    name: String,
    axis: Axis,
    position: usize,
    shape: VolumeShape,
    extent: SliceExtent,
    clim: (f32, f32),
    colormap: ColorMap,
    pick_id: Option<PickId>,
    samples: Option<Slice2D>,
    texture: SliceTexture,
    /// Drag preview position; geometry follows it, the texture does not.
    preview: Option<usize>,
    highlighted: bool,
    visible: bool,
    latest_seq: u64,
    applied_seq: Option<u64>,
    origin: Vec3,
    spacing: Vec3,
}

impl SlicePlane {
    /// Creates a plane normal to `axis` at `position` (clamped) over the full extent.
    pub fn new(
        id: SlicePlaneId,
        axis: Axis,
        position: i64,
        shape: VolumeShape,
        clim: (f32, f32),
        colormap: ColorMap,
    ) -> Self {
        let position = shape.clamp_index(axis, position).unwrap_or(0);
        Self {
            id,
            name: format!("{axis}_slice_{}", id.0),
            axis,
            position,
            shape,
            extent: SliceExtent::full(&shape, axis),
            clim,
            colormap,
            pick_id: None,
            samples: None,
            texture: SliceTexture::new(),
            preview: None,
            highlighted: false,
            visible: true,
            latest_seq: 0,
            applied_seq: None,
            origin: Vec3::ZERO,
            spacing: Vec3::ONE,
        }
    }

    /// Places index `(0, 0, 0)` at `origin` with `spacing` world units per index.
    #[must_use]
    pub fn with_geometry(mut self, origin: Vec3, spacing: Vec3) -> Self {
        self.origin = origin;
        self.spacing = spacing;
        self
    }

    /// Renumbers the plane. Only valid before any request was issued.
    #[must_use]
    pub fn with_id(mut self, id: SlicePlaneId) -> Self {
        self.id = id;
        self
    }

    /// Returns the plane id.
    pub fn id(&self) -> SlicePlaneId {
        self.id
    }

    /// Returns the plane name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the axis normal to the plane.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Returns the committed index along the axis.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the index the geometry is drawn at: the preview if one is set.
    pub fn displayed_position(&self) -> usize {
        self.preview.unwrap_or(self.position)
    }

    /// Returns the number of valid positions along the axis.
    pub fn len(&self) -> usize {
        self.shape.len(self.axis)
    }

    /// Returns true if the volume has no samples along the axis.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the in-plane extent.
    pub fn extent(&self) -> &SliceExtent {
        &self.extent
    }

    /// Returns the scalar range mapped onto the color map.
    pub fn clim(&self) -> (f32, f32) {
        self.clim
    }

    /// Returns the color map.
    pub fn colormap(&self) -> &ColorMap {
        &self.colormap
    }

    /// Returns the pick id, once registered.
    pub fn pick_id(&self) -> Option<PickId> {
        self.pick_id
    }

    /// Sets the pick id.
    pub fn set_pick_id(&mut self, id: Option<PickId>) {
        self.pick_id = id;
    }

    /// Returns the raw samples of the last applied extraction.
    pub fn samples(&self) -> Option<&Slice2D> {
        self.samples.as_ref()
    }

    /// Returns the colour-mapped texture.
    pub fn texture(&self) -> &SliceTexture {
        &self.texture
    }

    /// Returns whether the plane is highlighted.
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Sets the hover highlight.
    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    /// Returns whether the plane is drawn and pickable.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the plane.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Returns the sequence number of the newest request issued.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Returns the sequence number of the request backing the texture.
    pub fn applied_seq(&self) -> Option<u64> {
        self.applied_seq
    }

    /// Issues a request for the current position and extent.
    ///
    /// Any request issued earlier becomes stale.
    pub fn request_extraction(&mut self) -> ExtractionRequest {
        self.latest_seq += 1;
        ExtractionRequest {
            plane: self.id,
            seq: self.latest_seq,
            axis: self.axis,
            position: self.position,
            extent: self.extent.clone(),
        }
    }

    /// Moves the plane to `position`, clamped to the volume.
    ///
    /// Clears any drag preview. Returns the extraction to run if the clamped
    /// position differs from the current one, or `None` if nothing changed.
    ///
    /// The quad moves to the new index at once. Its texture keeps showing the
    /// previous slice until the returned request's result is applied.
    pub fn set_position(&mut self, position: i64) -> Option<ExtractionRequest> {
        self.preview = None;
        let clamped = self.shape.clamp_index(self.axis, position)?;
        if clamped == self.position {
            return None;
        }
        log::debug!("{}: position {} -> {}", self.name, self.position, clamped);
        self.position = clamped;
        Some(self.request_extraction())
    }

    /// Restricts the in-plane extent, clamped to the volume.
    pub fn set_extent(&mut self, extent: &SliceExtent) -> Option<ExtractionRequest> {
        let clamped = extent.clamped(&self.shape, self.axis);
        if clamped == self.extent {
            return None;
        }
        self.extent = clamped;
        Some(self.request_extraction())
    }

    /// Moves the drawn geometry without re-extracting. The index is clamped.
    pub fn set_preview_position(&mut self, position: i64) {
        self.preview = self.shape.clamp_index(self.axis, position);
    }

    /// Drops the drag preview; geometry returns to the committed position.
    pub fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Returns true while a drag preview is shown.
    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Hands the plane the result of an extraction it requested.
    ///
    /// Only the newest request is applied. A failed extraction leaves the
    /// previous texture in place.
    pub fn apply_extraction(&mut self, seq: u64, result: Result<Slice2D>) -> ApplyOutcome {
        if seq != self.latest_seq {
            log::debug!(
                "{}: dropping stale extraction {} (latest {})",
                self.name,
                seq,
                self.latest_seq
            );
            return ApplyOutcome::Stale;
        }
        match result {
            Ok(slice) => {
                self.samples = Some(slice);
                self.applied_seq = Some(seq);
                self.recolor();
                ApplyOutcome::Applied
            }
            Err(err) => {
                log::warn!("{}: extraction failed, keeping last texture: {err}", self.name);
                ApplyOutcome::Failed
            }
        }
    }

    /// Sets the scalar range and recolours from the stored samples.
    ///
    /// Never touches storage.
    pub fn color_map(&mut self, clim: (f32, f32)) {
        self.clim = clim;
        self.recolor();
    }

    /// Replaces the color map and recolours.
    pub fn set_colormap(&mut self, colormap: ColorMap) {
        self.colormap = colormap;
        self.recolor();
    }

    fn recolor(&mut self) {
        let Some(slice) = &self.samples else {
            return;
        };
        let mut rgba = Vec::new();
        self.colormap.map_into(&slice.data, self.clim, &mut rgba);
        self.texture.update(slice.width, slice.height, rgba);
    }

    /// World units moved per index step along the axis.
    pub fn world_units_per_index(&self) -> f32 {
        self.spacing[self.axis.index()]
    }

    /// World-space plane normal.
    pub fn normal(&self) -> Vec3 {
        self.axis.unit()
    }

    /// World-space point at fractional index coordinates.
    pub fn index_to_world(&self, index: Vec3) -> Vec3 {
        self.origin + index * self.spacing
    }

    /// The four world-space corners at the displayed position.
    ///
    /// Corners sit half a voxel outside the outermost samples so each texel
    /// covers one voxel. `corners[0]` is texel `(0, 0)`, then +u, +u+v, +v.
    pub fn quad_corners(&self) -> [Vec3; 4] {
        let (u_axis, v_axis) = self.axis.plane_axes();
        let w = self.displayed_position() as f32;
        let (u0, u1) = (self.extent.u.start as f32 - 0.5, self.extent.u.end as f32 - 0.5);
        let (v0, v1) = (self.extent.v.start as f32 - 0.5, self.extent.v.end as f32 - 0.5);
        let corner = |u: f32, v: f32| {
            let mut index = Vec3::ZERO;
            index[self.axis.index()] = w;
            index[u_axis.index()] = u;
            index[v_axis.index()] = v;
            self.index_to_world(index)
        };
        [corner(u0, v0), corner(u1, v0), corner(u1, v1), corner(u0, v1)]
    }

    /// World-space centre of the displayed quad.
    pub fn center(&self) -> Vec3 {
        let c = self.quad_corners();
        (c[0] + c[2]) * 0.5
    }

    /// Registry entry for this plane, once it has a pick id.
    pub fn pick_entity(&self) -> Option<PickEntity> {
        Some(PickEntity {
            id: self.pick_id?,
            owner: PickOwner::SlicePlane(self.id),
            constraint: DragConstraint::Axis(self.axis),
        })
    }

    /// Geometry for the id-buffer pass.
    pub fn pick_primitive(&self) -> Option<PickPrimitive> {
        if !self.visible || self.extent.is_empty() {
            return None;
        }
        Some(PickPrimitive {
            id: self.pick_id?,
            shape: PickShape::WorldQuad(self.quad_corners()),
        })
    }

    /// Outline colour used while highlighted.
    pub fn highlight_color() -> Vec4 {
        Vec4::new(1.0, 1.0, 0.0, 1.0)
    }

    /// Submits the textured quad.
    pub fn draw(&self, renderer: &mut dyn FrameRenderer) -> RenderResult<()> {
        if !self.visible || self.texture.is_empty() {
            return Ok(());
        }
        renderer.draw_slice(&SliceDraw {
            name: &self.name,
            corners: self.quad_corners(),
            texture: &self.texture,
            highlighted: self.highlighted,
            preview: self.preview.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use seisview_core::SeisviewError;
    use seisview_render::ColorMapRegistry;

    fn grays() -> ColorMap {
        ColorMapRegistry::new().get_or_default("grays")
    }

    fn plane(axis: Axis, position: i64) -> SlicePlane {
        SlicePlane::new(
            SlicePlaneId(1),
            axis,
            position,
            VolumeShape::new(4, 6, 100),
            (0.0, 1.0),
            grays(),
        )
    }

    fn slice_for(request: &ExtractionRequest, value: f32) -> Slice2D {
        let (w, h) = (request.extent.width(), request.extent.height());
        Slice2D {
            axis: request.axis,
            position: request.position,
            width: w,
            height: h,
            data: vec![value; w * h],
        }
    }

    #[test]
    fn test_new_clamps_position() {
        assert_eq!(plane(Axis::Z, 150).position(), 99);
        assert_eq!(plane(Axis::X, -3).position(), 0);
    }

    #[test]
    fn test_set_position_is_idempotent() {
        let mut p = plane(Axis::Z, 50);
        assert!(p.set_position(50).is_none());
        let request = p.set_position(150).unwrap();
        assert_eq!(request.position, 99);
        assert_eq!(p.position(), 99);
        assert!(p.set_position(99).is_none());
        assert!(p.set_position(1000).is_none());
        assert_eq!(p.latest_seq(), 1);
    }

    #[test]
    fn test_apply_updates_texture() {
        let mut p = plane(Axis::Z, 10);
        let request = p.request_extraction();
        assert_eq!(
            p.apply_extraction(request.seq, Ok(slice_for(&request, 1.0))),
            ApplyOutcome::Applied
        );
        assert_eq!(p.texture().width(), 4);
        assert_eq!(p.texture().height(), 6);
        assert_eq!(p.texture().pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(p.applied_seq(), Some(request.seq));
    }

    #[test]
    fn test_failed_extraction_keeps_texture() {
        let mut p = plane(Axis::Z, 10);
        let first = p.request_extraction();
        p.apply_extraction(first.seq, Ok(slice_for(&first, 0.0)));
        let generation = p.texture().generation();

        let second = p.set_position(20).unwrap();
        let err = SeisviewError::StorageIo(std::io::Error::other("disk gone"));
        assert_eq!(p.apply_extraction(second.seq, Err(err)), ApplyOutcome::Failed);
        assert_eq!(p.texture().generation(), generation);
        assert_eq!(p.samples().unwrap().position, 10);
    }

    #[test]
    fn test_set_position_moves_quad_before_texture() {
        let mut p = plane(Axis::Z, 10);
        let first = p.request_extraction();
        p.apply_extraction(first.seq, Ok(slice_for(&first, 0.0)));
        let generation = p.texture().generation();

        let request = p.set_position(15).unwrap();
        assert_eq!(p.displayed_position(), 15);
        assert_eq!(p.texture().generation(), generation);
        assert_eq!(p.samples().unwrap().position, 10);

        p.apply_extraction(request.seq, Ok(slice_for(&request, 0.0)));
        assert_ne!(p.texture().generation(), generation);
        assert_eq!(p.samples().unwrap().position, 15);
    }

    #[test]
    fn test_color_map_recolours_without_request() {
        let mut p = plane(Axis::Z, 10);
        let request = p.request_extraction();
        p.apply_extraction(request.seq, Ok(slice_for(&request, 0.5)));
        let seq = p.latest_seq();

        p.color_map((0.5, 1.0));
        assert_eq!(p.texture().pixel(0, 0), Some([0, 0, 0, 255]));
        p.color_map((0.0, 0.5));
        assert_eq!(p.texture().pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(p.latest_seq(), seq);
    }

    #[test]
    fn test_preview_moves_geometry_only() {
        let mut p = plane(Axis::Z, 10);
        p.set_preview_position(30);
        assert_eq!(p.position(), 10);
        assert_eq!(p.displayed_position(), 30);
        assert!((p.quad_corners()[0].z - 30.0).abs() < 1e-6);
        p.clear_preview();
        assert!((p.quad_corners()[0].z - 10.0).abs() < 1e-6);
        assert_eq!(p.latest_seq(), 0);
    }

    #[test]
    fn test_quad_corners_follow_spacing() {
        let p = plane(Axis::X, 2).with_geometry(Vec3::new(100.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let corners = p.quad_corners();
        for c in corners {
            assert!((c.x - 104.0).abs() < 1e-6);
        }
        assert_eq!(corners[0].y, -0.5);
        assert_eq!(corners[2].y, 5.5);
        assert_eq!(corners[2].z, 99.5);
        assert_eq!(p.world_units_per_index(), 2.0);
    }

    #[test]
    fn test_pick_entity_requires_id() {
        let mut p = plane(Axis::Y, 3);
        assert!(p.pick_entity().is_none());
        assert!(p.pick_primitive().is_none());
        p.set_pick_id(PickId::new(5));
        let entity = p.pick_entity().unwrap();
        assert_eq!(entity.owner, PickOwner::SlicePlane(SlicePlaneId(1)));
        assert_eq!(entity.constraint, DragConstraint::Axis(Axis::Y));
        p.set_visible(false);
        assert!(p.pick_primitive().is_none());
    }

    proptest! {
        #[test]
        fn test_set_position_clamps(position in -1000i64..1000) {
            let mut p = plane(Axis::Z, 0);
            p.set_position(position);
            prop_assert_eq!(p.position() as i64, position.clamp(0, 99));
        }

        #[test]
        fn test_only_latest_request_applies(
            (positions, order) in prop::collection::vec(-20i64..120, 1..8)
                .prop_flat_map(|positions| {
                    let n = positions.len();
                    (Just(positions), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
                })
        ) {
            let mut p = plane(Axis::Z, 50);
            let mut requests = vec![p.request_extraction()];
            for &position in &positions {
                if let Some(request) = p.set_position(position) {
                    requests.push(request);
                }
            }
            // Deliver in a shuffled order; the extra initial request goes last.
            let mut delivery: Vec<&ExtractionRequest> =
                order.iter().filter_map(|&i| requests.get(i)).collect();
            if requests.len() > positions.len() {
                delivery.push(&requests[positions.len()]);
            }
            prop_assert_eq!(delivery.len(), requests.len());

            let latest = requests.last().unwrap();
            let mut applied = 0;
            for request in delivery {
                let outcome = p.apply_extraction(
                    request.seq,
                    Ok(slice_for(request, request.position as f32)),
                );
                if outcome == ApplyOutcome::Applied {
                    applied += 1;
                    prop_assert_eq!(request.seq, latest.seq);
                }
            }
            prop_assert_eq!(applied, 1);
            prop_assert_eq!(p.samples().unwrap().position, latest.position);
            prop_assert_eq!(p.applied_seq(), Some(latest.seq));
        }
    }
}
