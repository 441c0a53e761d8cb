//! Id-buffer picking through the scene graph.

use std::sync::Arc;

use seisview::*;

fn scene(n: usize) -> SceneGraph {
    let shape = VolumeShape::new(n, n, n);
    let samples = vec![0.5; shape.num_samples()];
    let store = Arc::new(VolumeStore::from_samples(shape, &samples, &CacheOptions::default()).unwrap());
    let mut scene = SceneGraph::inline(store, Options::default(), 320, 240).unwrap();
    // Nearly top-down so stacked z slices overlap on screen.
    let half = (n as f32 - 1.0) * 0.5;
    scene.camera_mut().set_state(CameraState {
        center: Vec3::splat(half),
        azimuth: 0.0,
        elevation: 80.0,
        distance: 60.0,
        fov: 45.0,
    });
    scene
}

fn owner_at(scene: &mut SceneGraph, x: f32, y: f32) -> Option<PickOwner> {
    scene.resolve(x, y).map(|e| e.owner)
}

#[test]
fn test_resolve_hit_and_background() {
    let mut scene = scene(20);
    let far = scene.add_slice_plane(Axis::Z, 2, (0.0, 1.0)).unwrap();
    assert_eq!(
        owner_at(&mut scene, 160.5, 120.5),
        Some(PickOwner::SlicePlane(far))
    );
    assert_eq!(owner_at(&mut scene, 2.5, 2.5), None);
}

#[test]
fn test_nearer_entity_wins() {
    let mut scene = scene(20);
    let far = scene.add_slice_plane(Axis::Z, 2, (0.0, 1.0)).unwrap();
    let near = scene.add_slice_plane(Axis::Z, 17, (0.0, 1.0)).unwrap();
    assert_eq!(
        owner_at(&mut scene, 160.5, 120.5),
        Some(PickOwner::SlicePlane(near))
    );

    let near_pick = scene.plane(near).unwrap().pick_id().unwrap();
    let buffer = scene.id_buffer().unwrap();
    assert_eq!(buffer.id_at(160, 120), near_pick.get());

    scene.remove_slice_plane(near);
    assert_eq!(
        owner_at(&mut scene, 160.5, 120.5),
        Some(PickOwner::SlicePlane(far))
    );
}

#[test]
fn test_preview_moves_pick_geometry() {
    let mut scene = scene(20);
    let far = scene.add_slice_plane(Axis::Z, 2, (0.0, 1.0)).unwrap();
    let near = scene.add_slice_plane(Axis::Z, 17, (0.0, 1.0)).unwrap();
    // Previewing the far plane above the near one brings it to the front.
    scene.preview_slice_position(far, 19);
    assert_eq!(
        owner_at(&mut scene, 160.5, 120.5),
        Some(PickOwner::SlicePlane(far))
    );
    scene.clear_slice_preview(far);
    assert_eq!(
        owner_at(&mut scene, 160.5, 120.5),
        Some(PickOwner::SlicePlane(near))
    );
}

#[test]
fn test_legend_is_picked_in_front_of_slices() {
    let mut scene = scene(20);
    scene.add_slice_plane(Axis::Z, 10, (0.0, 1.0)).unwrap();
    let marker = scene.add_axis_legend().unwrap();
    let loc = scene.legend().unwrap().loc();
    assert_eq!(
        owner_at(&mut scene, loc.x, loc.y),
        Some(PickOwner::Marker(marker))
    );
    let entity = scene.resolve(loc.x, loc.y).unwrap();
    assert_eq!(entity.constraint, DragConstraint::ScreenPlane);
}

#[test]
fn test_camera_change_invalidates_id_buffer() {
    let mut scene = scene(20);
    let id = scene.add_slice_plane(Axis::Z, 10, (0.0, 1.0)).unwrap();
    assert!(scene.resolve(160.5, 120.5).is_some());
    // Pan far enough that the slice leaves the centre of the screen.
    scene.camera_mut().pan(Vec2::new(-1000.0, 0.0));
    assert!(scene.resolve(160.5, 120.5).is_none());
    scene.camera_mut().set_state(CameraState {
        center: Vec3::splat(9.5),
        azimuth: 0.0,
        elevation: 80.0,
        distance: 60.0,
        fov: 45.0,
    });
    assert_eq!(
        owner_at(&mut scene, 160.5, 120.5),
        Some(PickOwner::SlicePlane(id))
    );
}
