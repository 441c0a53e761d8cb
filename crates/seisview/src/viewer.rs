//! Routes input events to the camera, the drag controller and the scene.

use glam::Vec2;
use seisview_core::Result;
use seisview_render::{FrameRenderer, RenderResult};

use crate::drag::DragController;
use crate::input::{Command, InputEvent, Key, PointerButton};
use crate::scene::SceneGraph;

/// Receives screenshot requests.
pub trait ScreenshotSink {
    fn save_screenshot(&mut self, scene: &SceneGraph) -> Result<()>;
}

/// An interactive view of a [`SceneGraph`].
///
/// Left drag rotates, shift + left drag pans, right drag and the wheel zoom.
/// Holding control switches to selection mode, where the drag controller
/// owns the pointer.
pub struct Viewer {
    scene: SceneGraph,
    drag: DragController,
    pointer: Vec2,
    primary_down: bool,
    secondary_down: bool,
    pan_modifier: bool,
    screenshot: Option<Box<dyn ScreenshotSink>>,
}

impl Viewer {
    pub fn new(scene: SceneGraph) -> Self {
        Self {
            scene,
            drag: DragController::new(),
            pointer: Vec2::ZERO,
            primary_down: false,
            secondary_down: false,
            pan_modifier: false,
            screenshot: None,
        }
    }

    /// Installs the collaborator that handles [`Command::SaveScreenshot`].
    pub fn set_screenshot_sink(&mut self, sink: Box<dyn ScreenshotSink>) {
        self.screenshot = Some(sink);
    }

    /// Returns the scene.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Returns the scene for mutation.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    /// Returns the drag controller.
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Consumes the viewer, returning the scene.
    pub fn into_scene(self) -> SceneGraph {
        self.scene
    }

    /// Handles one input event.
    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved(pointer) => {
                let delta = pointer - self.pointer;
                self.pointer = pointer;
                if self.drag.pointer_moved(&mut self.scene, pointer) {
                    return;
                }
                if self.primary_down {
                    if self.pan_modifier {
                        self.scene.camera_mut().pan(delta);
                    } else {
                        self.scene.camera_mut().rotate(delta);
                    }
                } else if self.secondary_down {
                    self.scene.camera_mut().zoom_drag(delta.y);
                }
            }
            InputEvent::PointerDown(button) => match button {
                PointerButton::Primary => {
                    self.primary_down = true;
                    self.drag.pointer_pressed(&mut self.scene);
                }
                PointerButton::Secondary => self.secondary_down = true,
                PointerButton::Middle => {}
            },
            InputEvent::PointerUp(button) => match button {
                PointerButton::Primary => {
                    self.primary_down = false;
                    self.drag.pointer_released(&mut self.scene);
                }
                PointerButton::Secondary => self.secondary_down = false,
                PointerButton::Middle => {}
            },
            InputEvent::Wheel(notches) => {
                if !self.drag.is_dragging() {
                    self.scene.camera_mut().wheel(notches);
                }
            }
            InputEvent::KeyDown(Key::Control) => self.drag.modifier_pressed(&mut self.scene),
            InputEvent::KeyUp(Key::Control) => self.drag.modifier_released(&mut self.scene),
            InputEvent::KeyDown(Key::Shift) => self.pan_modifier = true,
            InputEvent::KeyUp(Key::Shift) => self.pan_modifier = false,
            InputEvent::Command(command) => self.run_command(command),
            InputEvent::Resized { width, height } => self.scene.set_viewport(width, height),
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::ResetView => {
                self.scene.camera_mut().reset();
                log::debug!("view reset");
            }
            Command::SaveScreenshot => match &mut self.screenshot {
                Some(sink) => {
                    if let Err(err) = sink.save_screenshot(&self.scene) {
                        log::warn!("screenshot failed: {err}");
                    }
                }
                None => log::warn!("screenshot requested but no sink is installed"),
            },
        }
    }

    /// Applies finished extractions and draws the scene.
    ///
    /// Returns how many extraction results were applied.
    pub fn frame(&mut self, renderer: &mut dyn FrameRenderer) -> RenderResult<usize> {
        let applied = self.scene.poll_extractions();
        self.scene.render_frame(renderer)?;
        Ok(applied)
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("scene", &self.scene)
            .field("drag", &self.drag)
            .field("pointer", &self.pointer)
            .finish_non_exhaustive()
    }
}
