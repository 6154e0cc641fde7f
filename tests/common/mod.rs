//! Shared fixtures for controls integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use model_viewer_controls::controls::{
    ChangeSource, HeadlessSurface, SmoothControls, SmoothControlsOptions,
};
use model_viewer_controls::{Camera, Spherical};

/// Simulated frame duration, in milliseconds.
pub const FRAME_MS: f32 = 16.0;

/// Upper bound on frames any settle loop may take.
pub const MAX_SETTLE_FRAMES: u32 = 2000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Controls on an 800x600 headless surface, with every change event recorded.
pub struct Rig {
    pub controls: SmoothControls,
    pub surface: HeadlessSurface,
    pub changes: Rc<RefCell<Vec<ChangeSource>>>,
}

impl Rig {
    /// Camera at radius 5 on +Z, looking at the origin.
    pub fn new(options: SmoothControlsOptions) -> Self {
        Self::at(Spherical::new(5.0, std::f32::consts::FRAC_PI_2, 0.0), options)
    }

    pub fn at(start: Spherical, options: SmoothControlsOptions) -> Self {
        init_logging();

        let surface = HeadlessSurface::new(800.0, 600.0);
        let camera = Camera::new(start.to_vector(), Vec3::ZERO);
        let mut controls = SmoothControls::with_options(camera, Box::new(surface.clone()), &options)
            .expect("valid options");

        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        controls.add_change_listener(move |event| sink.borrow_mut().push(event.source));

        Self {
            controls,
            surface,
            changes,
        }
    }

    pub fn interactive(options: SmoothControlsOptions) -> Self {
        let mut rig = Self::new(options);
        rig.controls.enable_interaction();
        rig
    }

    /// Run frames until the camera stops moving; returns the frame count.
    pub fn settle(&mut self) -> u32 {
        let mut frames = 0;
        while self.controls.update(frames as f32 * FRAME_MS, FRAME_MS) {
            frames += 1;
            assert!(frames < MAX_SETTLE_FRAMES, "controls never settled");
        }
        frames
    }

    pub fn change_count(&self) -> usize {
        self.changes.borrow().len()
    }

    pub fn last_change(&self) -> Option<ChangeSource> {
        self.changes.borrow().last().copied()
    }
}
