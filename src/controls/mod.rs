//! Orbital camera controls
//!
//! - [`Damper`]: critically damped smoothing of a single value
//! - [`SmoothControls`]: goal-seeking orbit, zoom and target control driven by
//!   an [`InputSurface`]

mod damper;
mod events;
mod gesture;
mod input;
mod options;
mod smooth_controls;

pub use damper::{Damper, DECAY_MILLISECONDS};
pub use events::{ChangeEvent, ChangeQueue, ChangeSource, ListenerId};
pub use gesture::{GestureMotion, TouchGesture, TouchMode};
pub use input::{
    EventResponse, HeadlessSurface, InputEvent, InputSurface, Key, KeyCode, TouchPoint,
};
pub use options::*;
pub use smooth_controls::SmoothControls;
