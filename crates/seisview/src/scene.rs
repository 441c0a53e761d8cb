//! The scene graph: one owner for slice planes, the axis legend, the camera,
//! the pick registry and the extraction dispatcher.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use seisview_core::{
    Axis, DragConstraint, MarkerId, Options, PickEntity, PickId, PickOwner, Result, SlicePlaneId,
    VolumeStore,
};
use seisview_render::{
    Camera, ColorMapRegistry, CpuPickPass, FrameRenderer, IdBuffer, PickPass, PickPrimitive,
    RenderResult,
};
use seisview_structures::{ApplyOutcome, AxisLegend, ExtractionRequest, SlicePlane};

use crate::extraction::{ExtractionDispatcher, ExtractionWorkerPool, InlineExtractor};
use crate::picking::PickableRegistry;

/// Everything that is drawn, picked and dragged.
pub struct SceneGraph {
    store: Arc<VolumeStore>,
    options: Options,
    planes: BTreeMap<SlicePlaneId, SlicePlane>,
    next_plane: u32,
    legend: Option<AxisLegend>,
    registry: PickableRegistry,
    camera: Camera,
    colormaps: ColorMapRegistry,
    dispatcher: Box<dyn ExtractionDispatcher>,
}

impl SceneGraph {
    /// Creates an empty scene over `store`.
    ///
    /// The camera is framed on the volume and that framing becomes the reset view.
    pub fn new(
        store: Arc<VolumeStore>,
        options: Options,
        dispatcher: Box<dyn ExtractionDispatcher>,
        pick_pass: Box<dyn PickPass + Send>,
    ) -> Result<Self> {
        options.validate()?;
        let (width, height) = pick_pass.size();
        let mut camera = Camera::new(width, height);
        camera.interaction = options.interaction;

        let shape = store.shape();
        let extent = Vec3::new(shape.nx as f32, shape.ny as f32, shape.nz as f32);
        let spacing = options.voxel_spacing;
        camera.look_at_box(-0.5 * spacing, (extent - 0.5) * spacing);

        let registry = PickableRegistry::new(pick_pass, options.interaction.pick_tolerance);
        log::info!(
            "scene over {}x{}x{} volume, {}x{} viewport",
            shape.nx,
            shape.ny,
            shape.nz,
            width,
            height
        );
        Ok(Self {
            store,
            options,
            planes: BTreeMap::new(),
            next_plane: 0,
            legend: None,
            registry,
            camera,
            colormaps: ColorMapRegistry::new(),
            dispatcher,
        })
    }

    /// A scene that extracts synchronously and picks on the CPU.
    pub fn inline(store: Arc<VolumeStore>, options: Options, width: u32, height: u32) -> Result<Self> {
        let dispatcher = Box::new(InlineExtractor::new(Arc::clone(&store)));
        Self::new(store, options, dispatcher, Box::new(CpuPickPass::new(width, height)))
    }

    /// A scene that extracts on a worker pool and picks on the CPU.
    pub fn threaded(
        store: Arc<VolumeStore>,
        options: Options,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let dispatcher = Box::new(ExtractionWorkerPool::new(Arc::clone(&store), &options.workers)?);
        Self::new(store, options, dispatcher, Box::new(CpuPickPass::new(width, height)))
    }

    /// Returns the volume.
    pub fn store(&self) -> &Arc<VolumeStore> {
        &self.store
    }

    /// Returns the options the scene was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Returns the camera for mutation; the id-buffer is marked out of date.
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.registry.mark_dirty();
        &mut self.camera
    }

    /// Returns the pick registry.
    pub fn registry(&self) -> &PickableRegistry {
        &self.registry
    }

    /// Returns the color map registry.
    pub fn colormaps(&self) -> &ColorMapRegistry {
        &self.colormaps
    }

    /// Resizes the viewport and the pick target.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.registry.mark_dirty();
    }

    // ========== Slice planes ==========

    /// Adds a slice plane normal to `axis` at `position` (clamped).
    pub fn add_slice_plane(
        &mut self,
        axis: Axis,
        position: i64,
        clim: (f32, f32),
    ) -> Result<SlicePlaneId> {
        let colormap = self.colormaps.get_or_default(&self.options.colormap);
        let plane = SlicePlane::new(
            SlicePlaneId(self.next_plane),
            axis,
            position,
            self.store.shape(),
            clim,
            colormap,
        )
        .with_geometry(Vec3::ZERO, self.options.voxel_spacing);
        self.insert_slice_plane(plane)
    }

    /// Adds one plane per requested position per axis, using the scene's
    /// color map and voxel spacing.
    pub fn add_slices(
        &mut self,
        x_positions: &[i64],
        y_positions: &[i64],
        z_positions: &[i64],
        clim: (f32, f32),
    ) -> Result<Vec<SlicePlaneId>> {
        let requested = [
            (Axis::X, x_positions),
            (Axis::Y, y_positions),
            (Axis::Z, z_positions),
        ];
        let mut ids = Vec::new();
        for (axis, positions) in requested {
            for &position in positions {
                ids.push(self.add_slice_plane(axis, position, clim)?);
            }
        }
        Ok(ids)
    }

    /// Takes ownership of a plane, registers it for picking and requests its
    /// first extraction. The plane is renumbered to stay unique in this scene.
    ///
    /// # Panics
    ///
    /// Panics if the plane carries a pick id that is already live.
    pub fn insert_slice_plane(&mut self, plane: SlicePlane) -> Result<SlicePlaneId> {
        let id = SlicePlaneId(self.next_plane);
        let mut plane = plane.with_id(id);
        match plane.pick_entity() {
            Some(entity) => self
                .registry
                .register_with_id(PickEntity {
                    owner: PickOwner::SlicePlane(id),
                    ..entity
                })
                .expect("slice plane registered with a live pick id"),
            None => {
                let pick_id = self
                    .registry
                    .register(PickOwner::SlicePlane(id), DragConstraint::Axis(plane.axis()))?;
                plane.set_pick_id(Some(pick_id));
            }
        }
        self.next_plane += 1;
        log::info!(
            "added {} at {} = {}",
            plane.name(),
            plane.axis(),
            plane.position()
        );
        let request = plane.request_extraction();
        self.planes.insert(id, plane);
        self.dispatcher.dispatch(request);
        Ok(id)
    }

    /// Removes a plane and releases its pick id.
    pub fn remove_slice_plane(&mut self, id: SlicePlaneId) -> Option<SlicePlane> {
        let plane = self.planes.remove(&id)?;
        if let Some(pick_id) = plane.pick_id() {
            self.registry.remove(pick_id);
        }
        Some(plane)
    }

    /// Returns a plane.
    pub fn plane(&self, id: SlicePlaneId) -> Option<&SlicePlane> {
        self.planes.get(&id)
    }

    /// Iterates planes in id order.
    pub fn planes(&self) -> impl Iterator<Item = &SlicePlane> {
        self.planes.values()
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    fn dispatch(&mut self, request: Option<ExtractionRequest>) -> bool {
        match request {
            Some(request) => {
                self.dispatcher.dispatch(request);
                true
            }
            None => false,
        }
    }

    /// Moves a plane (clamped). Returns true if an extraction was dispatched.
    ///
    /// The quad moves at once; its texture follows when the extraction is
    /// applied by [`SceneGraph::poll_extractions`].
    pub fn set_slice_position(&mut self, id: SlicePlaneId, position: i64) -> bool {
        let Some(plane) = self.planes.get_mut(&id) else {
            return false;
        };
        let request = plane.set_position(position);
        self.registry.mark_dirty();
        self.dispatch(request)
    }

    /// Moves a plane's geometry without extracting.
    pub fn preview_slice_position(&mut self, id: SlicePlaneId, position: i64) {
        if let Some(plane) = self.planes.get_mut(&id) {
            plane.set_preview_position(position);
            self.registry.mark_dirty();
        }
    }

    /// Drops a plane's drag preview.
    pub fn clear_slice_preview(&mut self, id: SlicePlaneId) {
        if let Some(plane) = self.planes.get_mut(&id) {
            plane.clear_preview();
            self.registry.mark_dirty();
        }
    }

    /// Recolours one plane. Returns false for an unknown plane.
    pub fn set_clim(&mut self, id: SlicePlaneId, clim: (f32, f32)) -> bool {
        match self.planes.get_mut(&id) {
            Some(plane) => {
                plane.color_map(clim);
                true
            }
            None => false,
        }
    }

    /// Recolours every plane.
    pub fn set_all_clim(&mut self, clim: (f32, f32)) {
        for plane in self.planes.values_mut() {
            plane.color_map(clim);
        }
    }

    /// Switches every plane to a registered color map (grays if unknown).
    pub fn set_colormap(&mut self, name: &str) {
        let colormap = self.colormaps.get_or_default(name);
        for plane in self.planes.values_mut() {
            plane.set_colormap(colormap.clone());
        }
        self.options.colormap = colormap.name.clone();
    }

    /// Applies finished extractions. Returns how many were applied.
    pub fn poll_extractions(&mut self) -> usize {
        let mut applied = 0;
        for result in self.dispatcher.drain() {
            let Some(plane) = self.planes.get_mut(&result.plane) else {
                log::debug!("dropping extraction for removed plane {:?}", result.plane);
                continue;
            };
            if plane.apply_extraction(result.seq, result.result) == ApplyOutcome::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Total extractions dispatched since the scene was created.
    pub fn dispatched_extractions(&self) -> u64 {
        self.dispatcher.dispatched()
    }

    // ========== Axis legend ==========

    /// Adds the draggable axis legend, replacing any existing one.
    pub fn add_axis_legend(&mut self) -> Result<MarkerId> {
        if let Some(old) = self.legend.take() {
            if let Some(pick_id) = old.pick_id() {
                self.registry.remove(pick_id);
            }
        }
        let id = MarkerId(0);
        let mut legend = AxisLegend::new(id);
        legend.set_seismic_coord_system(self.options.seismic_coord_system);
        let pick_id = self
            .registry
            .register(PickOwner::Marker(id), DragConstraint::ScreenPlane)?;
        legend.set_pick_id(Some(pick_id));
        self.legend = Some(legend);
        Ok(id)
    }

    /// Returns the axis legend.
    pub fn legend(&self) -> Option<&AxisLegend> {
        self.legend.as_ref()
    }

    /// Returns the axis legend for mutation; the id-buffer is marked out of date.
    pub fn legend_mut(&mut self) -> Option<&mut AxisLegend> {
        self.registry.mark_dirty();
        self.legend.as_mut()
    }

    // ========== Picking ==========

    /// Highlights one entity and clears every other highlight.
    pub fn set_highlight(&mut self, id: Option<PickId>) {
        for plane in self.planes.values_mut() {
            plane.set_highlighted(id.is_some() && plane.pick_id() == id);
        }
        if let Some(legend) = &mut self.legend {
            legend.set_highlighted(id.is_some() && legend.pick_id() == id);
        }
    }

    /// Returns the currently highlighted entity.
    pub fn highlighted(&self) -> Option<PickId> {
        self.planes
            .values()
            .find(|p| p.is_highlighted())
            .and_then(SlicePlane::pick_id)
            .or_else(|| {
                self.legend
                    .as_ref()
                    .filter(|l| l.is_highlighted())
                    .and_then(AxisLegend::pick_id)
            })
    }

    /// Id-buffer geometry of every visible entity.
    pub fn pick_primitives(&self) -> Vec<PickPrimitive> {
        self.planes
            .values()
            .filter_map(SlicePlane::pick_primitive)
            .chain(self.legend.as_ref().and_then(AxisLegend::pick_primitive))
            .collect()
    }

    /// Re-renders the id-buffer if anything changed since the last render.
    ///
    /// Returns true if a render happened.
    pub fn refresh_id_buffer(&mut self) -> RenderResult<bool> {
        if !self.registry.is_dirty() {
            return Ok(false);
        }
        let primitives = self.pick_primitives();
        self.registry.render_id_buffer(&self.camera, &primitives)?;
        Ok(true)
    }

    /// Returns the entity under a pixel.
    pub fn resolve(&mut self, x: f32, y: f32) -> Option<PickEntity> {
        if let Err(err) = self.refresh_id_buffer() {
            log::warn!("id-buffer render failed: {err}");
            return None;
        }
        self.registry.resolve(x, y)
    }

    /// Returns the up-to-date id-buffer.
    pub fn id_buffer(&mut self) -> RenderResult<IdBuffer> {
        self.refresh_id_buffer()?;
        self.registry.id_buffer()
    }

    // ========== Drawing ==========

    /// Draws the scene: slices back to front, then the legend overlay.
    pub fn render_frame(&self, renderer: &mut dyn FrameRenderer) -> RenderResult<()> {
        renderer.begin_frame(&self.camera, self.options.background_color)?;

        let eye = self.camera.eye();
        let mut order: Vec<(f32, &SlicePlane)> = self
            .planes
            .values()
            .map(|p| (p.center().distance_squared(eye), p))
            .collect();
        order.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (_, plane) in order {
            plane.draw(renderer)?;
        }

        if let Some(legend) = &self.legend {
            legend.draw(renderer, &self.camera)?;
        }
        renderer.end_frame()
    }
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("planes", &self.planes.len())
            .field("legend", &self.legend.is_some())
            .field("registry", &self.registry)
            .field("dispatched", &self.dispatcher.dispatched())
            .finish_non_exhaustive()
    }
}
