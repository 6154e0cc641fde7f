//! Model Viewer Controls - smooth orbital camera controls for 3D model viewers
//!
//! The controls orbit a camera around a target point. Input and programmatic
//! setters only move *goals*; every frame, critically damped springs carry the
//! camera toward them, so motion stays smooth however input arrives.
//!
//! # Features
//! - Critically damped smoothing with a frame-rate independent closed form
//! - Orbit, zoom (radius), field of view and target goals with configurable bounds
//! - Pointer drag, wheel, keyboard and one/two-finger touch input
//! - Change notifications tagged with their source
//! - Input adapters for winit windows and, on the web, DOM elements

pub mod controls;
pub mod error;
pub mod scene;
pub mod window;

// Web-specific modules
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use controls::{
    ChangeEvent, ChangeSource, Damper, EventResponse, InputEvent, InputSurface,
    SmoothControls, SmoothControlsOptions,
};
pub use error::{ControlsError, ControlsResult};
pub use scene::{Camera, Projection, Spherical};

// Web initialization helper
#[cfg(target_arch = "wasm32")]
pub fn init_web_logging() {
    // Set up panic hook for better error messages in console
    console_error_panic_hook::set_once();
    // A logger may already be installed by the host page
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}
