//! Modifier-gated dragging driven through viewer input events.

use std::sync::Arc;

use proptest::prelude::*;
use seisview::*;

const N: usize = 20;

fn viewer() -> (Viewer, SlicePlaneId) {
    let shape = VolumeShape::new(N, N, N);
    let samples: Vec<f32> = (0..shape.num_samples()).map(|i| (i % 97) as f32).collect();
    let store = Arc::new(VolumeStore::from_samples(shape, &samples, &CacheOptions::default()).unwrap());
    let mut scene = SceneGraph::inline(store, Options::default(), 320, 240).unwrap();
    let id = scene.add_slice_plane(Axis::Z, 10, (0.0, 96.0)).unwrap();
    scene.poll_extractions();
    (Viewer::new(scene), id)
}

/// Screen position of the plane centre and the screen step of one world unit
/// along its axis.
fn handle(viewer: &Viewer, id: SlicePlaneId) -> (Vec2, Vec2) {
    let plane = viewer.scene().plane(id).unwrap();
    let camera = viewer.scene().camera();
    let center = plane.center();
    let a = camera.project(center).unwrap().truncate();
    let b = camera.project(center + plane.axis().unit()).unwrap().truncate();
    (a, b - a)
}

fn grab(viewer: &mut Viewer, at: Vec2) {
    viewer.handle_event(InputEvent::PointerMoved(at));
    viewer.handle_event(InputEvent::KeyDown(Key::Control));
    viewer.handle_event(InputEvent::PointerDown(PointerButton::Primary));
}

#[test]
fn test_hover_highlights_plane_under_pointer() {
    let (mut viewer, id) = viewer();
    let (start, _) = handle(&viewer, id);
    viewer.handle_event(InputEvent::PointerMoved(start));
    assert!(!viewer.scene().plane(id).unwrap().is_highlighted());

    viewer.handle_event(InputEvent::KeyDown(Key::Control));
    let pick = viewer.scene().plane(id).unwrap().pick_id();
    assert_eq!(viewer.scene().highlighted(), pick);
    assert!(viewer.scene().plane(id).unwrap().is_highlighted());

    viewer.handle_event(InputEvent::PointerMoved(Vec2::new(2.0, 2.0)));
    assert_eq!(viewer.scene().highlighted(), None);

    viewer.handle_event(InputEvent::KeyUp(Key::Control));
    assert_eq!(*viewer.drag().state(), DragState::Idle);
}

#[test]
fn test_drag_commits_single_extraction() {
    let (mut viewer, id) = viewer();
    let (start, step) = handle(&viewer, id);
    let camera_before = viewer.scene().camera().state();
    grab(&mut viewer, start);
    assert!(viewer.drag().is_dragging());

    for k in 1..=3 {
        viewer.handle_event(InputEvent::PointerMoved(start + step * k as f32));
    }
    {
        let plane = viewer.scene().plane(id).unwrap();
        assert_eq!(plane.position(), 10);
        assert_eq!(plane.displayed_position(), 13);
        assert!(plane.is_preview());
    }
    assert_eq!(viewer.scene().dispatched_extractions(), 1);
    assert_eq!(viewer.drag().session().unwrap().candidate, Some(13));

    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    assert_eq!(viewer.scene().dispatched_extractions(), 2);
    assert!(matches!(
        viewer.drag().state(),
        DragState::HoverArmed { .. }
    ));
    let mut renderer = RecordingRenderer::new();
    assert_eq!(viewer.frame(&mut renderer).unwrap(), 1);

    let plane = viewer.scene().plane(id).unwrap();
    assert_eq!(plane.position(), 13);
    assert!(!plane.is_preview());
    assert_eq!(plane.applied_seq(), Some(plane.latest_seq()));
    // Dragging never orbits the camera.
    assert_eq!(viewer.scene().camera().state(), camera_before);
}

#[test]
fn test_cancel_restores_position() {
    let (mut viewer, id) = viewer();
    let (start, step) = handle(&viewer, id);
    grab(&mut viewer, start);
    viewer.handle_event(InputEvent::PointerMoved(start + step * 4.0));
    assert_eq!(viewer.scene().plane(id).unwrap().displayed_position(), 14);

    viewer.handle_event(InputEvent::KeyUp(Key::Control));
    let plane = viewer.scene().plane(id).unwrap();
    assert_eq!(plane.position(), 10);
    assert_eq!(plane.displayed_position(), 10);
    assert!(!viewer.drag().is_dragging());

    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    assert_eq!(viewer.scene().dispatched_extractions(), 1);
    assert_eq!(viewer.scene().plane(id).unwrap().position(), 10);
    assert_eq!(*viewer.drag().state(), DragState::Idle);
    assert_eq!(viewer.scene().highlighted(), None);
    assert!(!viewer.scene().plane(id).unwrap().is_highlighted());

    // With the modifier up, a click on the plane selects nothing.
    viewer.handle_event(InputEvent::PointerMoved(start));
    viewer.handle_event(InputEvent::PointerDown(PointerButton::Primary));
    assert!(!viewer.drag().is_dragging());
    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    assert_eq!(viewer.scene().dispatched_extractions(), 1);

    // And a left drag orbits the camera again.
    let camera_before = viewer.scene().camera().state();
    viewer.handle_event(InputEvent::PointerDown(PointerButton::Primary));
    viewer.handle_event(InputEvent::PointerMoved(start + Vec2::new(30.0, 0.0)));
    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    assert_ne!(viewer.scene().camera().state().azimuth, camera_before.azimuth);
    assert_eq!(viewer.scene().plane(id).unwrap().position(), 10);
    assert_eq!(viewer.scene().dispatched_extractions(), 1);
}

#[test]
fn test_second_press_while_dragging_is_ignored() {
    let (mut viewer, id) = viewer();
    let (start, step) = handle(&viewer, id);
    grab(&mut viewer, start);
    viewer.handle_event(InputEvent::PointerMoved(start + step * 2.0));
    let session = *viewer.drag().session().unwrap();

    viewer.handle_event(InputEvent::PointerDown(PointerButton::Primary));
    let again = viewer.drag().session().unwrap();
    assert_eq!(again.start_pointer, session.start_pointer);
    assert_eq!(again.candidate, Some(12));
    assert_eq!(viewer.scene().dispatched_extractions(), 1);

    viewer.handle_event(InputEvent::PointerMoved(start + step * 3.0));
    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    assert_eq!(viewer.scene().plane(id).unwrap().position(), 13);
    assert_eq!(viewer.scene().dispatched_extractions(), 2);
}

#[test]
fn test_drag_past_end_clamps() {
    let (mut viewer, id) = viewer();
    let (start, step) = handle(&viewer, id);
    grab(&mut viewer, start);
    viewer.handle_event(InputEvent::PointerMoved(start + step * 40.0));
    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    assert_eq!(viewer.scene().plane(id).unwrap().position(), N - 1);
}

#[test]
fn test_press_on_background_does_not_drag() {
    let (mut viewer, id) = viewer();
    let camera_before = viewer.scene().camera().state();
    grab(&mut viewer, Vec2::new(2.0, 2.0));
    assert!(!viewer.drag().is_dragging());
    viewer.handle_event(InputEvent::PointerMoved(Vec2::new(30.0, 2.0)));
    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    // The modifier reserves the left button for selection.
    assert_eq!(viewer.scene().camera().state(), camera_before);
    assert_eq!(viewer.scene().plane(id).unwrap().position(), 10);
    assert_eq!(viewer.scene().dispatched_extractions(), 1);
}

#[test]
fn test_legend_drag_moves_marker() {
    let (mut viewer, _) = viewer();
    viewer.scene_mut().add_axis_legend().unwrap();
    let start = viewer.scene().legend().unwrap().loc();
    grab(&mut viewer, start);
    assert!(viewer.drag().is_dragging());
    assert!(viewer.scene().legend().unwrap().is_highlighted());

    viewer.handle_event(InputEvent::PointerMoved(Vec2::new(160.0, 150.0)));
    viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
    viewer.handle_event(InputEvent::KeyUp(Key::Control));

    let legend = viewer.scene().legend().unwrap();
    assert_eq!(legend.loc(), Vec2::new(160.0, 150.0));
    assert!(!legend.is_dragging());
    assert!(!legend.is_highlighted());
    assert_eq!(viewer.scene().dispatched_extractions(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn test_drag_lands_on_pointer_steps(steps in -8i32..=8) {
        let (mut viewer, id) = viewer();
        let (start, step) = handle(&viewer, id);
        grab(&mut viewer, start);
        viewer.handle_event(InputEvent::PointerMoved(start + step * steps as f32));
        viewer.handle_event(InputEvent::PointerUp(PointerButton::Primary));
        let expected = (10 + steps as i64) as usize;
        prop_assert_eq!(viewer.scene().plane(id).unwrap().position(), expected);
        let extra = u64::from(steps != 0);
        prop_assert_eq!(viewer.scene().dispatched_extractions(), 1 + extra);
    }
}
