//! Backend-independent input events.

use glam::Vec2;

/// Pointer buttons the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Modifier keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Selection modifier: arms hover and drag.
    Control,
    /// Pan modifier.
    Shift,
}

/// Discrete commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ResetView,
    SaveScreenshot,
}

/// One input event, in pixels with y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved(Vec2),
    PointerDown(PointerButton),
    PointerUp(PointerButton),
    /// Wheel notches; positive zooms in.
    Wheel(f32),
    KeyDown(Key),
    KeyUp(Key),
    Command(Command),
    Resized { width: u32, height: u32 },
}
