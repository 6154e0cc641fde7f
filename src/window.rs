//! Native input surface using winit
//!
//! [`WindowInput`] translates winit window events into controls input, and
//! [`WindowSurface`] answers the controls' questions about the window. The two
//! share state, so the surface handed to [`SmoothControls`] follows resizes and
//! focus changes seen by the translator.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use thiserror::Error;
use winit::{
    error::{EventLoopError, OsError},
    event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    keyboard::{KeyCode as WinitKeyCode, PhysicalKey},
    window::Window as WinitWindow,
};

use crate::controls::{EventResponse, InputEvent, InputSurface, Key, SmoothControls, TouchPoint};
use crate::error::ControlsError;

/// Pixels one wheel line scrolls, matching common browser behavior.
pub const WHEEL_LINE_PIXELS: f32 = 100.0;

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("Failed to create window: {0}")]
    Os(#[from] OsError),
    #[error(transparent)]
    Controls(#[from] ControlsError),
}

#[derive(Debug)]
struct WindowState {
    size: Cell<Vec2>,
    focused: Cell<bool>,
    attached: Cell<bool>,
}

/// [`InputSurface`] view of a winit window.
#[derive(Debug, Clone)]
pub struct WindowSurface {
    state: Rc<WindowState>,
}

impl InputSurface for WindowSurface {
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

/// Translates winit window events into [`InputEvent`]s.
#[derive(Debug)]
pub struct WindowInput {
    state: Rc<WindowState>,
    cursor: Vec2,
    touches: Vec<TouchPoint>,
}

impl WindowInput {
    /// Create a translator and the surface sharing its state.
    pub fn new(width: u32, height: u32, focused: bool) -> (Self, WindowSurface) {
        let state = Rc::new(WindowState {
            size: Cell::new(Vec2::new(width as f32, height as f32)),
            focused: Cell::new(focused),
            attached: Cell::new(false),
        });
        let input = Self {
            state: Rc::clone(&state),
            cursor: Vec2::ZERO,
            touches: Vec::new(),
        };
        (input, WindowSurface { state })
    }

    pub fn from_window(window: &WinitWindow) -> (Self, WindowSurface) {
        let size = window.inner_size();
        Self::new(size.width, size.height, window.has_focus())
    }

    /// Translate one window event.
    ///
    /// Window state (size, focus, cursor, active touches) is tracked for every
    /// event; input is only produced while the surface is attached.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        let input = match event {
            WindowEvent::Resized(size) => {
                self.state
                    .size
                    .set(Vec2::new(size.width as f32, size.height as f32));
                None
            }
            WindowEvent::Focused(focused) => {
                self.state.focused.set(*focused);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(InputEvent::PointerMove {
                    position: self.cursor,
                })
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => Some(match state {
                ElementState::Pressed => InputEvent::PointerDown {
                    position: self.cursor,
                },
                ElementState::Released => InputEvent::PointerUp,
            }),
            WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Wheel {
                delta_y: wheel_delta_pixels(delta),
            }),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let key = match event.physical_key {
                    PhysicalKey::Code(code) => key_from_code(code),
                    PhysicalKey::Unidentified(_) => Key::Other,
                };
                Some(InputEvent::KeyDown { key })
            }
            WindowEvent::Touch(touch) => {
                let point = TouchPoint::new(
                    touch.id,
                    touch.location.x as f32,
                    touch.location.y as f32,
                );
                Some(self.track_touch(touch.phase, point))
            }
            _ => None,
        };

        input.filter(|_| self.state.attached.get())
    }

    /// Translate `event` and hand the result to `controls`.
    pub fn dispatch(&mut self, controls: &mut SmoothControls, event: &WindowEvent) -> EventResponse {
        match self.translate(event) {
            Some(input) => controls.handle_event(&input),
            None => EventResponse::IGNORED,
        }
    }

    fn track_touch(&mut self, phase: TouchPhase, point: TouchPoint) -> InputEvent {
        let existing = self.touches.iter().position(|touch| touch.id == point.id);
        match phase {
            TouchPhase::Started => {
                match existing {
                    Some(index) => self.touches[index] = point,
                    None => self.touches.push(point),
                }
                InputEvent::TouchStart {
                    touches: self.touches.clone(),
                }
            }
            TouchPhase::Moved => {
                if let Some(index) = existing {
                    self.touches[index] = point;
                }
                InputEvent::TouchMove {
                    touches: self.touches.clone(),
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if let Some(index) = existing {
                    self.touches.remove(index);
                }
                InputEvent::TouchEnd {
                    touches: self.touches.clone(),
                }
            }
        }
    }
}

/// Wheel delta in pixels, positive when scrolling down.
pub fn wheel_delta_pixels(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PIXELS,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

pub fn key_from_code(code: WinitKeyCode) -> Key {
    match code {
        WinitKeyCode::PageUp => Key::PageUp,
        WinitKeyCode::PageDown => Key::PageDown,
        WinitKeyCode::ArrowLeft => Key::Left,
        WinitKeyCode::ArrowUp => Key::Up,
        WinitKeyCode::ArrowRight => Key::Right,
        WinitKeyCode::ArrowDown => Key::Down,
        _ => Key::Other,
    }
}

/// Open a window and orbit `camera` with the window's input until it closes.
///
/// `on_change` runs after every frame in which the camera moved.
#[cfg(not(target_arch = "wasm32"))]
pub fn run<F>(
    title: &str,
    width: u32,
    height: u32,
    camera: crate::scene::Camera,
    options: &crate::controls::SmoothControlsOptions,
    mut on_change: F,
) -> Result<(), WindowError>
where
    F: FnMut(&SmoothControls) + 'static,
{
    use std::time::Instant;
    use winit::{
        dpi::PhysicalSize,
        event::Event,
        event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
        window::WindowBuilder,
    };

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)?;

    let (mut input, surface) = WindowInput::from_window(&window);
    let mut controls = SmoothControls::with_options(camera, Box::new(surface), options)?;
    controls.update_aspect(width as f32 / height.max(1) as f32)?;
    controls.enable_interaction();

    let changed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&changed);
    controls.add_change_listener(move |_| flag.set(true));

    let start = Instant::now();
    let mut last_frame = start;

    log::info!("Orbiting in window '{}' ({}x{})", title, width, height);

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => {
                input.dispatch(&mut controls, &event);

                match event {
                    WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                        let aspect = size.width as f32 / size.height as f32;
                        if let Err(err) = controls.update_aspect(aspect) {
                            log::warn!("Ignoring resize: {}", err);
                        }
                    }
                    WindowEvent::CloseRequested => elwt.exit(),
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                let delta_ms = now.duration_since(last_frame).as_secs_f32() * 1000.0;
                let time_ms = now.duration_since(start).as_secs_f32() * 1000.0;
                last_frame = now;

                controls.update(time_ms, delta_ms);
                if changed.replace(false) {
                    on_change(&controls);
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
