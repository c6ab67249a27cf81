//! Engine events and input state
//!
//! Window and input happenings flow through one [`Event`] type. The engine
//! offers each event to its layers in a fixed order (engine, scene, then
//! application) and stops at the first that reports [`Handled::Yes`], so
//! lifecycle events like close and resize win over gameplay.

use std::collections::HashSet;

/// Key identifiers the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Letter key A
    A,
    /// Letter key D
    D,
    /// Letter key E
    E,
    /// Letter key G
    G,
    /// Letter key Q
    Q,
    /// Letter key R
    R,
    /// Letter key S
    S,
    /// Letter key W
    W,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Space bar
    Space,
    /// Escape key
    Escape,
}

/// Mouse button identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button
    Left,
    /// Right button
    Right,
    /// Middle button
    Middle,
}

/// A window or input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// The window was asked to close.
    WindowClose,
    /// The framebuffer changed size; zero extents mean minimized.
    WindowResize {
        /// New framebuffer width in pixels
        width: u32,
        /// New framebuffer height in pixels
        height: u32,
    },
    /// A key went down.
    KeyPressed {
        /// Which key
        key: KeyCode,
        /// True when this is an auto-repeat
        repeat: bool,
    },
    /// A key came up.
    KeyReleased {
        /// Which key
        key: KeyCode,
    },
    /// The scroll wheel moved.
    MouseScrolled {
        /// Horizontal scroll offset
        dx: f32,
        /// Vertical scroll offset
        dy: f32,
    },
    /// A mouse button went down.
    MouseButtonPressed {
        /// Which button
        button: MouseButton,
    },
    /// A mouse button came up.
    MouseButtonReleased {
        /// Which button
        button: MouseButton,
    },
    /// The cursor moved, in window coordinates.
    CursorMoved {
        /// X position in pixels
        x: f32,
        /// Y position in pixels
        y: f32,
    },
}

/// Whether a handler consumed an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Event consumed; dispatch stops.
    Yes,
    /// Event not consumed; dispatch continues.
    No,
}

/// Currently-held keys, fed from the event stream
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
}

impl InputState {
    /// Creates an input state with no keys held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates held-key tracking from an event. Other events are ignored.
    pub fn observe(&mut self, event: &Event) {
        match *event {
            Event::KeyPressed { key, .. } => {
                self.held.insert(key);
            }
            Event::KeyReleased { key } => {
                self.held.remove(&key);
            }
            _ => {}
        }
    }

    /// True while `key` is held down.
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// Drops all held keys, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}
