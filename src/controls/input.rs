//! Platform-neutral input model
//!
//! Input surfaces (a winit window, a DOM element, a test double) translate their
//! native events into [`InputEvent`]s and feed them to
//! [`SmoothControls::handle_event`](super::SmoothControls::handle_event).

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

/// Legacy DOM key codes understood by the controls.
pub struct KeyCode;

impl KeyCode {
    pub const PAGE_UP: u32 = 33;
    pub const PAGE_DOWN: u32 = 34;
    pub const LEFT: u32 = 37;
    pub const UP: u32 = 38;
    pub const RIGHT: u32 = 39;
    pub const DOWN: u32 = 40;
}

/// Keys the controls react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    PageUp,
    PageDown,
    Left,
    Up,
    Right,
    Down,
    Other,
}

impl Key {
    pub fn from_key_code(code: u32) -> Self {
        match code {
            KeyCode::PAGE_UP => Key::PageUp,
            KeyCode::PAGE_DOWN => Key::PageDown,
            KeyCode::LEFT => Key::Left,
            KeyCode::UP => Key::Up,
            KeyCode::RIGHT => Key::Right,
            KeyCode::DOWN => Key::Down,
            _ => Key::Other,
        }
    }

    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "PageUp" => Key::PageUp,
            "PageDown" => Key::PageDown,
            "ArrowLeft" | "Left" => Key::Left,
            "ArrowUp" | "Up" => Key::Up,
            "ArrowRight" | "Right" => Key::Right,
            "ArrowDown" | "Down" => Key::Down,
            _ => Key::Other,
        }
    }
}

/// One active touch contact, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
}

impl TouchPoint {
    pub fn new(id: u64, x: f32, y: f32) -> Self {
        Self {
            id,
            position: Vec2::new(x, y),
        }
    }
}

/// Input delivered by a surface.
///
/// Touch events carry every contact still on the surface after the event,
/// mirroring `TouchEvent.touches` in the DOM.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Vec2 },
    PointerMove { position: Vec2 },
    PointerUp,
    /// Positive `delta_y` scrolls down (zooms out), in pixels.
    Wheel { delta_y: f32 },
    KeyDown { key: Key },
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { touches: Vec<TouchPoint> },
    TouchEnd { touches: Vec<TouchPoint> },
}

/// Outcome of handling one input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    /// The event changed at least one goal.
    pub handled: bool,
    /// The surface should suppress the host's default action for the event.
    pub prevent_default: bool,
}

impl EventResponse {
    pub const IGNORED: EventResponse = EventResponse {
        handled: false,
        prevent_default: false,
    };
}

/// Capabilities the controls need from the element receiving input.
pub trait InputSurface {
    /// Size of the surface's bounding rectangle, in the same pixels as event
    /// positions.
    fn bounding_size(&self) -> Vec2;

    /// Whether the surface currently holds keyboard focus.
    fn has_focus(&self) -> bool;

    /// Start delivering input to the controls.
    fn attach(&mut self);

    /// Stop delivering input to the controls.
    fn detach(&mut self);
}

#[derive(Debug)]
struct HeadlessState {
    size: Cell<Vec2>,
    focused: Cell<bool>,
    attached: Cell<bool>,
}

/// Surface without a windowing system behind it.
///
/// Clones share state, so a caller can keep one handle to resize or focus the
/// surface after handing another to the controls.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    state: Rc<HeadlessState>,
}

impl HeadlessSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            state: Rc::new(HeadlessState {
                size: Cell::new(Vec2::new(width, height)),
                focused: Cell::new(true),
                attached: Cell::new(false),
            }),
        }
    }

    pub fn set_size(&self, width: f32, height: f32) {
        self.state.size.set(Vec2::new(width, height));
    }

    pub fn set_focused(&self, focused: bool) {
        self.state.focused.set(focused);
    }

    pub fn is_attached(&self) -> bool {
        self.state.attached.get()
    }
}

impl InputSurface for HeadlessSurface {
    fn bounding_size(&self) -> Vec2 {
        self.state.size.get()
    }

    fn has_focus(&self) -> bool {
        self.state.focused.get()
    }

    fn attach(&mut self) {
        self.state.attached.set(true);
    }

    fn detach(&mut self) {
        self.state.attached.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_map_to_keys() {
        assert_eq!(Key::from_key_code(33), Key::PageUp);
        assert_eq!(Key::from_key_code(34), Key::PageDown);
        assert_eq!(Key::from_key_code(37), Key::Left);
        assert_eq!(Key::from_key_code(38), Key::Up);
        assert_eq!(Key::from_key_code(39), Key::Right);
        assert_eq!(Key::from_key_code(40), Key::Down);
        assert_eq!(Key::from_key_code(9), Key::Other);
    }

    #[test]
    fn dom_key_names_map_to_keys() {
        assert_eq!(Key::from_dom_key("ArrowLeft"), Key::Left);
        assert_eq!(Key::from_dom_key("Down"), Key::Down);
        assert_eq!(Key::from_dom_key("PageUp"), Key::PageUp);
        assert_eq!(Key::from_dom_key("Tab"), Key::Other);
    }

    #[test]
    fn headless_clones_share_state() {
        let handle = HeadlessSurface::new(800.0, 600.0);
        let mut surface = handle.clone();

        surface.attach();
        assert!(handle.is_attached());

        handle.set_focused(false);
        handle.set_size(320.0, 240.0);
        assert!(!surface.has_focus());
        assert_eq!(surface.bounding_size(), Vec2::new(320.0, 240.0));

        surface.detach();
        assert!(!handle.is_attached());
    }
}
