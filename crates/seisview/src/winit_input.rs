//! Translation of winit window events into [`InputEvent`]s.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::input::{Command, InputEvent, Key, PointerButton};

/// Tracks modifier state so modifier changes become key down/up events.
#[derive(Debug, Default)]
pub struct WinitInput {
    modifiers: ModifiersState,
}

impl WinitInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps one window event. Most events map to zero or one input event;
    /// a modifier change can produce one per modifier.
    pub fn translate(&mut self, event: &WindowEvent) -> Vec<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                vec![InputEvent::PointerMoved(Vec2::new(
                    position.x as f32,
                    position.y as f32,
                ))]
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return Vec::new(),
                };
                match state {
                    ElementState::Pressed => vec![InputEvent::PointerDown(button)],
                    ElementState::Released => vec![InputEvent::PointerUp(button)],
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                vec![InputEvent::Wheel(notches)]
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers_changed(modifiers.state()),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return Vec::new();
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyR) => {
                        vec![InputEvent::Command(Command::ResetView)]
                    }
                    PhysicalKey::Code(KeyCode::F12) => {
                        vec![InputEvent::Command(Command::SaveScreenshot)]
                    }
                    _ => Vec::new(),
                }
            }
            WindowEvent::Resized(size) => vec![InputEvent::Resized {
                width: size.width,
                height: size.height,
            }],
            _ => Vec::new(),
        }
    }

    fn modifiers_changed(&mut self, state: ModifiersState) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let changes = [
            (Key::Control, self.modifiers.control_key(), state.control_key()),
            (Key::Shift, self.modifiers.shift_key(), state.shift_key()),
        ];
        for (key, was, is) in changes {
            match (was, is) {
                (false, true) => events.push(InputEvent::KeyDown(key)),
                (true, false) => events.push(InputEvent::KeyUp(key)),
                _ => {}
            }
        }
        self.modifiers = state;
        events
    }
}
