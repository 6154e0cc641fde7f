//! Smooth orbital camera controls
//!
//! [`SmoothControls`] turns pointer, touch, wheel and keyboard input into
//! critically damped camera motion around a target point. Every controlled
//! value has a *goal*, written by input handlers and setters and clamped to the
//! configured bounds, and a *current* value that only [`SmoothControls::update`]
//! (or [`SmoothControls::jump_to_goal`]) moves. `update` must be called once per
//! rendered frame.
//!
//! Panning is not supported.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::damper::Damper;
use super::events::{ChangeEvent, ChangeListeners, ChangeSource, ListenerId};
use super::gesture::{GestureMotion, TouchGesture, TouchMode};
use super::input::{EventResponse, InputEvent, InputSurface, Key};
use super::options::{
    ControlsConfig, EventHandlingBehavior, InteractionPolicy, SmoothControlsOptions,
    FOV_SENSITIVITY_REFERENCE_DEGREES, KEYBOARD_ORBIT_INCREMENT, KEYBOARD_ZOOM_STEP,
    MAX_WHEEL_ZOOM_STEP, ORBIT_DRAG_TURNS_PER_HEIGHT, WHEEL_ZOOM_SENSITIVITY,
};
use crate::error::{ensure_finite, ensure_in_range, ControlsResult, MAX_MAGNITUDE};
use crate::scene::{wrap_angle, Camera, Projection, Spherical};

/// The theta goal never gets further than this from current theta.
const THETA_GOAL_LIMIT: f32 = PI - 0.001;

/// Radius and field of view stay strictly positive whatever the bounds say.
const MIN_GOAL_RADIUS: f32 = 1e-6;
const MIN_GOAL_FIELD_OF_VIEW: f32 = 1e-3;

/// Goals are also kept within `±MAX_MAGNITUDE` so repeated adjustments under
/// unbounded options cannot overflow.
fn cap(value: f32) -> f32 {
    value.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE)
}

/// Clamp without panicking on inverted bounds (their result is unspecified).
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Critically damped orbital camera controls.
///
/// The controls own the [`Camera`] they drive and the [`InputSurface`] that
/// feeds them input. Change listeners are notified at most once per
/// [`update`](Self::update), and only when the camera actually moved.
pub struct SmoothControls {
    camera: Camera,
    surface: Box<dyn InputSurface>,
    config: ControlsConfig,
    interaction_enabled: bool,
    is_user_change: bool,

    spherical: Spherical,
    goal_spherical: Spherical,
    theta_damper: Damper,
    phi_damper: Damper,
    radius_damper: Damper,

    log_fov: f32,
    goal_log_fov: f32,
    fov_damper: Damper,

    target: Vec3,
    goal_target: Vec3,
    target_dampers: [Damper; 3],

    /// Last pointer position while the pointer is down.
    pointer: Option<Vec2>,
    touch: TouchGesture,
    listeners: ChangeListeners,
}

impl SmoothControls {
    /// Create controls whose initial state is read from `camera`.
    ///
    /// Goals start at the camera's state clamped to the default options.
    /// Interaction starts disabled.
    pub fn new(camera: Camera, surface: Box<dyn InputSurface>) -> Self {
        let target = camera.target;
        let mut spherical = Spherical::from_vector(camera.position - target);
        spherical.make_safe();

        let fov = if camera.fov().is_finite() && camera.fov() > 0.0 {
            camera.fov()
        } else {
            Projection::default().fov_y_degrees
        };
        let log_fov = fov.ln();

        let mut controls = Self {
            camera,
            surface,
            config: ControlsConfig::default(),
            interaction_enabled: false,
            is_user_change: false,
            spherical,
            goal_spherical: spherical,
            theta_damper: Damper::new(),
            phi_damper: Damper::new(),
            radius_damper: Damper::new(),
            log_fov,
            goal_log_fov: log_fov,
            fov_damper: Damper::new(),
            target,
            goal_target: target,
            target_dampers: Default::default(),
            pointer: None,
            touch: TouchGesture::default(),
            listeners: ChangeListeners::default(),
        };
        controls.clamp_goals();
        controls
    }

    pub fn with_options(
        camera: Camera,
        surface: Box<dyn InputSurface>,
        options: &SmoothControlsOptions,
    ) -> ControlsResult<Self> {
        let mut controls = Self::new(camera, surface);
        controls.apply_options(options)?;
        Ok(controls)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The resolved configuration currently in effect.
    pub fn options(&self) -> &ControlsConfig {
        &self.config
    }

    /// Merge `options` over the current configuration and re-clamp every goal.
    pub fn apply_options(&mut self, options: &SmoothControlsOptions) -> ControlsResult<()> {
        self.config.merge(options)?;
        log::debug!("Applied controls options: {:?}", self.config);
        self.clamp_goals();
        Ok(())
    }

    pub fn interaction_enabled(&self) -> bool {
        self.interaction_enabled
    }

    pub fn enable_interaction(&mut self) {
        if self.interaction_enabled {
            return;
        }
        self.surface.attach();
        self.interaction_enabled = true;
        log::debug!("Controls interaction enabled");
    }

    pub fn disable_interaction(&mut self) {
        if !self.interaction_enabled {
            return;
        }
        self.surface.detach();
        self.interaction_enabled = false;
        self.pointer = None;
        self.touch.reset();
        log::debug!("Controls interaction disabled");
    }

    pub fn add_change_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Current orbital position. Theta is reported in (-π, π] when the azimuth
    /// is unbounded.
    pub fn camera_spherical(&self) -> Spherical {
        let mut spherical = self.spherical;
        if self.config.azimuth_is_unbounded() {
            spherical.theta = wrap_angle(spherical.theta);
        }
        spherical
    }

    pub fn goal_spherical(&self) -> Spherical {
        self.goal_spherical
    }

    /// Current vertical field of view in degrees.
    pub fn field_of_view(&self) -> f32 {
        self.log_fov.exp()
    }

    pub fn goal_field_of_view(&self) -> f32 {
        self.goal_log_fov.exp()
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn goal_target(&self) -> Vec3 {
        self.goal_target
    }

    /// Set the absolute orbital goal. `None` keeps the current goal for that
    /// coordinate.
    ///
    /// Returns true if any goal changed.
    pub fn set_orbit(
        &mut self,
        goal_theta: Option<f32>,
        goal_phi: Option<f32>,
        goal_radius: Option<f32>,
    ) -> ControlsResult<bool> {
        let theta = match goal_theta {
            Some(theta) => ensure_in_range("theta", theta)?,
            None => self.goal_spherical.theta,
        };
        let phi = match goal_phi {
            Some(phi) => ensure_in_range("phi", phi)?,
            None => self.goal_spherical.phi,
        };
        let radius = match goal_radius {
            Some(radius) => ensure_in_range("radius", radius)?,
            None => self.goal_spherical.radius,
        };

        let changed = self.set_orbit_goal(theta, phi, radius);
        if changed {
            self.is_user_change = false;
        }
        Ok(changed)
    }

    /// Adjust the orbital goal relative to the current goal.
    ///
    /// The theta goal is never allowed more than π ahead of current theta, so
    /// interpolation keeps moving in the direction of the delta. `delta_fov` is
    /// applied in log space.
    pub fn adjust_orbit(
        &mut self,
        delta_theta: f32,
        delta_phi: f32,
        delta_radius: f32,
        delta_fov: f32,
    ) -> ControlsResult<bool> {
        ensure_in_range("deltaTheta", delta_theta)?;
        ensure_in_range("deltaPhi", delta_phi)?;
        ensure_in_range("deltaRadius", delta_radius)?;
        ensure_in_range("deltaFov", delta_fov)?;

        let changed = self.adjust_goals(delta_theta, delta_phi, delta_radius, delta_fov);
        if changed {
            self.is_user_change = false;
        }
        Ok(changed)
    }

    pub fn set_radius(&mut self, radius: f32) -> ControlsResult<bool> {
        self.set_orbit(None, None, Some(radius))
    }

    /// Set the goal vertical field of view, in degrees.
    pub fn set_field_of_view(&mut self, fov: f32) -> ControlsResult<bool> {
        ensure_in_range("fieldOfView", fov)?;
        let changed = self.set_fov_goal(fov);
        if changed {
            self.is_user_change = false;
        }
        Ok(changed)
    }

    /// Set the goal point the camera looks at.
    pub fn set_target(&mut self, x: f32, y: f32, z: f32) -> ControlsResult<bool> {
        let goal = Vec3::new(
            ensure_in_range("x", x)?,
            ensure_in_range("y", y)?,
            ensure_in_range("z", z)?,
        );
        if goal == self.goal_target {
            return Ok(false);
        }
        self.goal_target = goal;
        self.is_user_change = false;
        Ok(true)
    }

    pub fn update_near_far(&mut self, near: f32, far: f32) -> ControlsResult<()> {
        self.camera
            .set_near_far(ensure_finite("near", near)?, ensure_finite("far", far)?);
        Ok(())
    }

    pub fn update_aspect(&mut self, aspect: f32) -> ControlsResult<()> {
        self.camera.set_aspect(ensure_finite("aspect", aspect)?);
        Ok(())
    }

    /// Move every value to its goal instantly and re-project the camera.
    pub fn jump_to_goal(&mut self) {
        let moved = !self.is_stationary();

        self.spherical = self.goal_spherical;
        self.log_fov = self.goal_log_fov;
        self.target = self.goal_target;
        for damper in self.dampers_mut() {
            damper.reset();
        }

        self.move_camera(moved);
    }

    /// Advance every value one damped step toward its goal.
    ///
    /// Time and delta are in milliseconds. Does nothing, and notifies nobody,
    /// when every value already rests at its goal or when `delta_ms` is not a
    /// positive number. Returns whether the camera moved.
    pub fn update(&mut self, _time_ms: f32, delta_ms: f32) -> bool {
        if self.is_stationary() {
            return false;
        }
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            log::trace!("Skipping controls update with delta {}ms", delta_ms);
            return false;
        }

        if self.config.azimuth_is_unbounded() {
            let offset = self.spherical.theta - self.goal_spherical.theta;
            if offset.abs() > PI {
                self.spherical.theta -= offset.signum() * TAU;
            }
        }

        let goal = self.goal_spherical;
        let radius_scale = self.radius_normalization();

        self.spherical.theta = self
            .theta_damper
            .update(self.spherical.theta, goal.theta, delta_ms, PI);
        self.spherical.phi = self
            .phi_damper
            .update(self.spherical.phi, goal.phi, delta_ms, PI);
        self.spherical.radius = self.radius_damper.update(
            self.spherical.radius,
            goal.radius,
            delta_ms,
            radius_scale,
        );
        self.log_fov = self
            .fov_damper
            .update(self.log_fov, self.goal_log_fov, delta_ms, 1.0);

        let mut target = self.target.to_array();
        let goal_target = self.goal_target.to_array();
        for ((value, goal), damper) in target
            .iter_mut()
            .zip(goal_target)
            .zip(self.target_dampers.iter_mut())
        {
            *value = damper.update(*value, goal, delta_ms, radius_scale);
        }
        self.target = Vec3::from_array(target);

        self.move_camera(true);
        true
    }

    /// Handle one event from the input surface.
    pub fn handle_event(&mut self, event: &InputEvent) -> EventResponse {
        if !self.interaction_enabled {
            return EventResponse::IGNORED;
        }

        let (relevant, handled) = match event {
            InputEvent::PointerDown { position } => {
                self.pointer = Some(*position);
                (false, false)
            }
            InputEvent::PointerMove { position } => self.handle_pointer_move(*position),
            InputEvent::PointerUp => {
                self.pointer = None;
                (false, false)
            }
            InputEvent::Wheel { delta_y } => self.handle_wheel(*delta_y),
            InputEvent::KeyDown { key } => self.handle_key(*key),
            InputEvent::TouchStart { touches } | InputEvent::TouchEnd { touches } => {
                self.touch.set_contacts(touches);
                (false, false)
            }
            InputEvent::TouchMove { touches } => {
                let motion = self.touch.advance(touches);
                self.handle_touch_motion(motion)
            }
        };

        let prevent_default = handled
            || (relevant && self.config.event_handling_behavior == EventHandlingBehavior::PreventAll);
        EventResponse {
            handled,
            prevent_default,
        }
    }

    /// Active two-finger gesture mode, if one has been decided.
    pub fn touch_mode(&self) -> Option<TouchMode> {
        self.touch.mode()
    }

    fn set_orbit_goal(&mut self, goal_theta: f32, goal_phi: f32, goal_radius: f32) -> bool {
        let config = self.config;

        let mut next_theta = cap(clamp(
            goal_theta,
            config.minimum_azimuthal_angle,
            config.maximum_azimuthal_angle,
        ));
        if config.azimuth_is_unbounded() {
            next_theta = wrap_angle(next_theta);
            // Re-express current theta within π of the goal so the damper takes
            // the short way around.
            let offset = self.spherical.theta - next_theta;
            if offset.abs() > PI {
                self.spherical.theta = wrap_angle(offset) + next_theta;
            }
        }

        let mut next = Spherical::new(
            cap(clamp(goal_radius, config.minimum_radius, config.maximum_radius))
                .max(MIN_GOAL_RADIUS),
            clamp(goal_phi, config.minimum_polar_angle, config.maximum_polar_angle),
            next_theta,
        );
        next.make_safe();

        if next == self.goal_spherical {
            return false;
        }
        self.goal_spherical = next;
        true
    }

    fn set_fov_goal(&mut self, fov: f32) -> bool {
        let fov = cap(clamp(
            fov,
            self.config.minimum_field_of_view,
            self.config.maximum_field_of_view,
        ))
        .max(MIN_GOAL_FIELD_OF_VIEW);
        let log_fov = fov.ln();
        if log_fov == self.goal_log_fov {
            return false;
        }
        self.goal_log_fov = log_fov;
        true
    }

    fn clamp_goals(&mut self) {
        let goal = self.goal_spherical;
        self.set_orbit_goal(goal.theta, goal.phi, goal.radius);

        // Compare in degrees so an in-range goal is not disturbed by a log/exp
        // round trip.
        let fov = self.goal_log_fov.exp();
        let clamped = clamp(
            fov,
            self.config.minimum_field_of_view,
            self.config.maximum_field_of_view,
        );
        if clamped != fov {
            self.set_fov_goal(clamped);
        }
    }

    fn adjust_goals(
        &mut self,
        delta_theta: f32,
        delta_phi: f32,
        delta_radius: f32,
        delta_fov: f32,
    ) -> bool {
        let goal = self.goal_spherical;
        let lead = self.spherical.theta - goal.theta;
        let delta_theta = clamp(delta_theta, lead - THETA_GOAL_LIMIT, lead + THETA_GOAL_LIMIT);

        let orbit_changed = self.set_orbit_goal(
            goal.theta + delta_theta,
            goal.phi + delta_phi,
            goal.radius + delta_radius,
        );
        let fov_changed = delta_fov != 0.0 && self.set_fov_goal((self.goal_log_fov + delta_fov).exp());
        orbit_changed || fov_changed
    }

    /// Goal adjustment on behalf of user input; tags the next change event.
    fn user_adjust_orbit(
        &mut self,
        delta_theta: f32,
        delta_phi: f32,
        delta_radius: f32,
        delta_fov: f32,
    ) -> bool {
        let deltas = [delta_theta, delta_phi, delta_radius, delta_fov];
        if deltas.iter().any(|delta| !delta.is_finite()) {
            log::warn!("Ignoring non-finite input deltas {:?}", deltas);
            return false;
        }

        let changed = self.adjust_goals(delta_theta, delta_phi, delta_radius, delta_fov);
        if changed {
            self.is_user_change = true;
        }
        changed
    }

    fn can_interact(&self) -> bool {
        match self.config.interaction_policy {
            InteractionPolicy::AlwaysAllow => true,
            InteractionPolicy::AllowWhenFocused => self.surface.has_focus(),
        }
    }

    fn handle_pointer_move(&mut self, position: Vec2) -> (bool, bool) {
        let Some(last) = self.pointer else {
            return (false, false);
        };
        self.pointer = Some(position);
        if !self.can_interact() {
            return (false, false);
        }
        (true, self.orbit_by_pixels(position - last))
    }

    fn handle_wheel(&mut self, delta_y: f32) -> (bool, bool) {
        if !self.can_interact() {
            return (false, false);
        }
        let step = clamp(
            delta_y * WHEEL_ZOOM_SENSITIVITY,
            -MAX_WHEEL_ZOOM_STEP,
            MAX_WHEEL_ZOOM_STEP,
        );
        let handled = step != 0.0
            && self.user_adjust_orbit(0.0, 0.0, self.goal_spherical.radius * step, 0.0);
        (true, handled)
    }

    fn handle_key(&mut self, key: Key) -> (bool, bool) {
        if !self.can_interact() {
            return (false, false);
        }
        let zoom = self.goal_spherical.radius * KEYBOARD_ZOOM_STEP;
        let (delta_theta, delta_phi, delta_radius) = match key {
            Key::PageUp => (0.0, 0.0, -zoom),
            Key::PageDown => (0.0, 0.0, zoom),
            Key::Left => (KEYBOARD_ORBIT_INCREMENT, 0.0, 0.0),
            Key::Right => (-KEYBOARD_ORBIT_INCREMENT, 0.0, 0.0),
            Key::Up => (0.0, KEYBOARD_ORBIT_INCREMENT, 0.0),
            Key::Down => (0.0, -KEYBOARD_ORBIT_INCREMENT, 0.0),
            Key::Other => return (false, false),
        };
        (
            true,
            self.user_adjust_orbit(delta_theta, delta_phi, delta_radius, 0.0),
        )
    }

    fn handle_touch_motion(&mut self, motion: GestureMotion) -> (bool, bool) {
        if !self.can_interact() {
            return (false, false);
        }
        match motion {
            GestureMotion::None => (self.touch.is_active(), false),
            GestureMotion::Orbit(delta) => (true, self.orbit_by_pixels(delta)),
            GestureMotion::Pinch(ratio) => {
                let radius = self.goal_spherical.radius;
                (
                    true,
                    self.user_adjust_orbit(0.0, 0.0, radius * (ratio - 1.0), 0.0),
                )
            }
        }
    }

    /// Dragging right decreases theta; dragging down decreases phi.
    fn orbit_by_pixels(&mut self, delta: Vec2) -> bool {
        let delta_theta = self.pixel_length_to_spherical_angle(delta.x);
        let delta_phi = self.pixel_length_to_spherical_angle(delta.y)
            * (FOV_SENSITIVITY_REFERENCE_DEGREES / self.field_of_view());
        if delta_theta == 0.0 && delta_phi == 0.0 {
            return false;
        }
        self.user_adjust_orbit(-delta_theta, -delta_phi, 0.0, 0.0)
    }

    fn pixel_length_to_spherical_angle(&self, pixel_length: f32) -> f32 {
        let height = self.surface.bounding_size().y;
        if !height.is_finite() || height <= 0.0 {
            return 0.0;
        }
        ORBIT_DRAG_TURNS_PER_HEIGHT * TAU * self.config.orbit_sensitivity * pixel_length / height
    }

    fn radius_normalization(&self) -> f32 {
        self.goal_spherical
            .radius
            .max(self.spherical.radius)
            .max(MIN_GOAL_RADIUS)
    }

    fn dampers_mut(&mut self) -> impl Iterator<Item = &mut Damper> {
        [
            &mut self.theta_damper,
            &mut self.phi_damper,
            &mut self.radius_damper,
            &mut self.fov_damper,
        ]
        .into_iter()
        .chain(self.target_dampers.iter_mut())
    }

    fn is_stationary(&self) -> bool {
        self.goal_spherical == self.spherical
            && self.goal_log_fov == self.log_fov
            && self.goal_target == self.target
            && self.theta_damper.is_at_rest()
            && self.phi_damper.is_at_rest()
            && self.radius_damper.is_at_rest()
            && self.fov_damper.is_at_rest()
            && self.target_dampers.iter().all(Damper::is_at_rest)
    }

    fn move_camera(&mut self, notify: bool) {
        self.spherical.make_safe();
        self.camera.set_position(self.target + self.spherical.to_vector());
        self.camera.look_at(self.target);

        let fov = self.log_fov.exp();
        if self.camera.fov() != fov {
            self.camera.set_fov(fov);
        }

        if notify {
            let source = if self.is_user_change {
                ChangeSource::UserInteraction
            } else {
                ChangeSource::None
            };
            log::trace!(
                "Camera moved to {:?} (source: {})",
                self.camera.position,
                source
            );
            self.listeners.dispatch(&ChangeEvent { source });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::input::{HeadlessSurface, TouchPoint};
    use std::cell::RefCell;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;

    const FRAME_MS: f32 = 16.0;

    fn controls_with(options: SmoothControlsOptions) -> (SmoothControls, HeadlessSurface) {
        let surface = HeadlessSurface::new(800.0, 600.0);
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let controls =
            SmoothControls::with_options(camera, Box::new(surface.clone()), &options).unwrap();
        (controls, surface)
    }

    fn interactive(options: SmoothControlsOptions) -> (SmoothControls, HeadlessSurface) {
        let (mut controls, surface) = controls_with(options);
        controls.enable_interaction();
        (controls, surface)
    }

    fn settle(controls: &mut SmoothControls) -> usize {
        let mut frames = 0;
        while controls.update(frames as f32 * FRAME_MS, FRAME_MS) {
            frames += 1;
            assert!(frames < 1000, "controls never settled");
        }
        frames
    }

    fn record_sources(controls: &mut SmoothControls) -> Rc<RefCell<Vec<ChangeSource>>> {
        let sources = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&sources);
        controls.add_change_listener(move |event| sink.borrow_mut().push(event.source));
        sources
    }

    #[test]
    fn initial_state_comes_from_camera() {
        let (controls, _) = controls_with(SmoothControlsOptions::new());
        let spherical = controls.camera_spherical();
        assert!((spherical.radius - 5.0).abs() < 1e-5);
        assert!((spherical.phi - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(spherical.theta, 0.0);
        assert_eq!(controls.goal_spherical(), controls.camera_spherical());
        assert!((controls.field_of_view() - 45.0).abs() < 1e-3);
        assert!(!controls.interaction_enabled());
    }

    #[test]
    fn fresh_controls_are_stationary() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let sources = record_sources(&mut controls);
        assert!(!controls.update(0.0, FRAME_MS));
        assert!(sources.borrow().is_empty());
    }

    #[test]
    fn radius_goal_is_clamped_and_approached_from_below() {
        let (mut controls, _) =
            controls_with(SmoothControlsOptions::new().with_radius_range(1.0, 10.0));

        assert!(controls.set_radius(100.0).unwrap());
        assert_eq!(controls.goal_spherical().radius, 10.0);

        let mut previous = controls.camera_spherical().radius;
        for frame in 0..200 {
            controls.update(frame as f32 * FRAME_MS, FRAME_MS);
            let radius = controls.camera_spherical().radius;
            assert!(radius <= 10.0, "overshot to {radius}");
            assert!(radius >= previous);
            previous = radius;
        }
        assert_eq!(previous, 10.0);
    }

    #[test]
    fn long_frames_settle_without_overshoot() {
        let (mut controls, _) =
            controls_with(SmoothControlsOptions::new().with_radius_range(1.0, 10.0));
        controls.set_radius(100.0).unwrap();

        for frame in 0..5 {
            controls.update(frame as f32 * 1000.0, 1000.0);
            assert!(controls.camera_spherical().radius <= 10.0);
        }
        assert_eq!(controls.camera_spherical().radius, 10.0);
        assert!(!controls.update(5000.0, 1000.0));
    }

    #[test]
    fn unchanged_goal_reports_false() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        assert!(!controls.set_orbit(None, None, None).unwrap());
        assert!(!controls.set_radius(5.0).unwrap());
        assert!(controls.set_radius(6.0).unwrap());
        assert!(!controls.set_radius(6.0).unwrap());
    }

    #[test]
    fn non_finite_input_is_rejected_before_state() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let before = controls.goal_spherical();

        assert!(controls.set_radius(f32::NAN).is_err());
        assert!(controls.set_orbit(Some(f32::INFINITY), None, None).is_err());
        assert!(controls.adjust_orbit(0.0, f32::NAN, 0.0, 0.0).is_err());
        assert!(controls.set_field_of_view(f32::NEG_INFINITY).is_err());
        assert!(controls.set_target(0.0, f32::NAN, 0.0).is_err());
        assert!(controls.update_aspect(f32::NAN).is_err());

        assert_eq!(controls.goal_spherical(), before);
        assert!(!controls.update(0.0, FRAME_MS));
    }

    #[test]
    fn theta_takes_the_short_way_around() {
        let start = PI - 0.1;
        let goal = -PI + 0.1;
        let surface = HeadlessSurface::new(800.0, 600.0);
        let camera = Camera::new(Spherical::new(5.0, FRAC_PI_2, start).to_vector(), Vec3::ZERO);
        let mut controls = SmoothControls::new(camera, Box::new(surface));

        assert!(controls.set_orbit(Some(goal), None, None).unwrap());

        let mut previous = controls.camera_spherical().theta;
        let mut travelled = 0.0;
        while controls.update(0.0, FRAME_MS) {
            let theta = controls.camera_spherical().theta;
            let step = wrap_angle(theta - previous);
            assert!(step >= 0.0, "theta reversed direction");
            travelled += step;
            previous = theta;
        }

        assert!(travelled < 0.2 + 1e-3, "travelled {travelled} rad");
        assert!((controls.camera_spherical().theta - goal).abs() < 1e-5);
    }

    #[test]
    fn large_theta_adjustment_stays_within_half_turn() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        assert!(controls.adjust_orbit(4.0, 0.0, 0.0, 0.0).unwrap());

        let current = controls.camera_spherical().theta;
        let goal = controls.goal_spherical().theta;
        assert!((goal - current).abs() <= PI);
        assert!(goal > 0.0, "goal should lead in the direction of the delta");

        // Repeating the adjustment cannot push the goal further ahead.
        controls.adjust_orbit(4.0, 0.0, 0.0, 0.0).unwrap();
        assert!((controls.goal_spherical().theta - current).abs() <= PI);
    }

    #[test]
    fn bounded_azimuth_clamps_instead_of_wrapping() {
        let (mut controls, _) =
            controls_with(SmoothControlsOptions::new().with_azimuthal_range(-1.0, 1.0));
        controls.set_orbit(Some(3.0), None, None).unwrap();
        assert_eq!(controls.goal_spherical().theta, 1.0);
        controls.set_orbit(Some(-3.0), None, None).unwrap();
        assert_eq!(controls.goal_spherical().theta, -1.0);
    }

    #[test]
    fn polar_goal_never_reaches_a_pole() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new().with_polar_range(0.0, PI));
        controls.set_orbit(None, Some(0.0), None).unwrap();
        assert!(controls.goal_spherical().phi > 0.0);
        controls.set_orbit(None, Some(PI), None).unwrap();
        assert!(controls.goal_spherical().phi < PI);
    }

    #[test]
    fn jump_then_update_is_quiet() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let sources = record_sources(&mut controls);

        controls.set_orbit(Some(1.0), Some(1.0), Some(3.0)).unwrap();
        controls.set_target(0.5, 0.0, 0.0).unwrap();
        controls.jump_to_goal();
        assert_eq!(sources.borrow().len(), 1);
        assert_eq!(controls.camera_spherical(), controls.goal_spherical());

        assert!(!controls.update(0.0, FRAME_MS));
        assert_eq!(sources.borrow().len(), 1);

        let expected = Vec3::new(0.5, 0.0, 0.0) + Spherical::new(3.0, 1.0, 1.0).to_vector();
        assert!((controls.camera().position - expected).length() < 1e-5);
        assert_eq!(controls.camera().target, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn jump_when_settled_does_not_notify() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let sources = record_sources(&mut controls);
        controls.jump_to_goal();
        assert!(sources.borrow().is_empty());
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let sources = record_sources(&mut controls);
        controls.set_radius(8.0).unwrap();

        assert!(!controls.update(0.0, 0.0));
        assert!(!controls.update(0.0, f32::NAN));
        assert!(sources.borrow().is_empty());
        assert_eq!(controls.camera_spherical().radius, 5.0);
    }

    #[test]
    fn field_of_view_is_clamped_and_animated() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        controls.set_field_of_view(1.0).unwrap();
        assert!((controls.goal_field_of_view() - 10.0).abs() < 1e-4);

        settle(&mut controls);
        assert!((controls.field_of_view() - 10.0).abs() < 1e-4);
        assert!((controls.camera().fov() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn target_is_animated_and_looked_at() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        assert!(controls.set_target(1.0, 2.0, 3.0).unwrap());
        assert!(!controls.set_target(1.0, 2.0, 3.0).unwrap());

        controls.update(0.0, FRAME_MS);
        assert_ne!(controls.target(), Vec3::new(1.0, 2.0, 3.0));

        settle(&mut controls);
        assert_eq!(controls.target(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(controls.camera().target, Vec3::new(1.0, 2.0, 3.0));
        let offset = controls.camera().position - controls.target();
        assert!((offset.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn projection_updates_leave_goals_alone() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let goal = controls.goal_spherical();

        controls.update_near_far(0.5, 200.0).unwrap();
        controls.update_aspect(2.0).unwrap();

        assert_eq!(controls.goal_spherical(), goal);
        assert_eq!(controls.camera().projection.near, 0.5);
        assert_eq!(controls.camera().projection.far, 200.0);
        assert_eq!(controls.camera().projection.aspect, 2.0);
        assert!(!controls.update(0.0, FRAME_MS));
    }

    #[test]
    fn apply_options_reclamps_goals() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        controls.set_radius(20.0).unwrap();
        controls
            .apply_options(&SmoothControlsOptions::new().with_radius_range(1.0, 8.0))
            .unwrap();
        assert_eq!(controls.goal_spherical().radius, 8.0);
        assert_eq!(controls.options().maximum_radius, 8.0);
    }

    #[test]
    fn interaction_toggles_are_idempotent() {
        let (mut controls, surface) = controls_with(SmoothControlsOptions::new());
        controls.enable_interaction();
        controls.enable_interaction();
        assert!(surface.is_attached());
        assert!(controls.interaction_enabled());

        controls.disable_interaction();
        controls.disable_interaction();
        assert!(!surface.is_attached());

        let response = controls.handle_event(&InputEvent::KeyDown { key: Key::Left });
        assert_eq!(response, EventResponse::IGNORED);
    }

    #[test]
    fn dragging_right_decreases_theta_goal() {
        let (mut controls, _) = interactive(SmoothControlsOptions::new());
        controls.handle_event(&InputEvent::PointerDown {
            position: Vec2::new(100.0, 100.0),
        });
        let response = controls.handle_event(&InputEvent::PointerMove {
            position: Vec2::new(160.0, 100.0),
        });

        assert!(response.handled);
        assert!(response.prevent_default);
        let expected = -TAU * 60.0 / 600.0;
        assert!((controls.goal_spherical().theta - expected).abs() < 1e-5);
    }

    #[test]
    fn moves_without_pointer_down_are_ignored() {
        let (mut controls, _) = interactive(SmoothControlsOptions::new());
        let response = controls.handle_event(&InputEvent::PointerMove {
            position: Vec2::new(160.0, 100.0),
        });
        assert_eq!(response, EventResponse::IGNORED);

        controls.handle_event(&InputEvent::PointerDown {
            position: Vec2::new(0.0, 0.0),
        });
        controls.handle_event(&InputEvent::PointerUp);
        let response = controls.handle_event(&InputEvent::PointerMove {
            position: Vec2::new(50.0, 0.0),
        });
        assert!(!response.handled);
    }

    #[test]
    fn zero_sized_surface_does_not_orbit() {
        let (mut controls, surface) = interactive(SmoothControlsOptions::new());
        surface.set_size(0.0, 0.0);
        controls.handle_event(&InputEvent::PointerDown {
            position: Vec2::ZERO,
        });
        let response = controls.handle_event(&InputEvent::PointerMove {
            position: Vec2::new(40.0, 40.0),
        });
        assert!(!response.handled);
        assert!(controls.goal_spherical().theta.is_finite());
        assert_eq!(controls.goal_spherical().theta, 0.0);
    }

    #[test]
    fn narrow_field_of_view_increases_polar_drag() {
        let polar_change = |fov: f32| {
            let surface = HeadlessSurface::new(800.0, 600.0);
            let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
                .with_projection(Projection::perspective(fov, 1.0, 0.1, 100.0));
            let mut controls = SmoothControls::new(camera, Box::new(surface));
            controls.enable_interaction();
            let start = controls.goal_spherical().phi;
            controls.handle_event(&InputEvent::PointerDown {
                position: Vec2::ZERO,
            });
            controls.handle_event(&InputEvent::PointerMove {
                position: Vec2::new(0.0, 30.0),
            });
            start - controls.goal_spherical().phi
        };

        let wide = polar_change(45.0);
        let narrow = polar_change(22.5);
        assert!(wide > 0.0);
        assert!((narrow - 2.0 * wide).abs() < 1e-4);
    }

    #[test]
    fn pinch_in_decreases_radius_goal() {
        let (mut controls, _) = interactive(SmoothControlsOptions::new());
        controls.handle_event(&InputEvent::TouchStart {
            touches: vec![TouchPoint::new(1, 100.0, 100.0)],
        });
        controls.handle_event(&InputEvent::TouchStart {
            touches: vec![
                TouchPoint::new(1, 100.0, 100.0),
                TouchPoint::new(2, 100.0, 200.0),
            ],
        });
        let response = controls.handle_event(&InputEvent::TouchMove {
            touches: vec![
                TouchPoint::new(1, 100.0, 120.0),
                TouchPoint::new(2, 100.0, 180.0),
            ],
        });

        assert!(response.handled);
        assert_eq!(controls.touch_mode(), Some(TouchMode::Zoom));
        assert!((controls.goal_spherical().radius - 3.0).abs() < 1e-4);

        controls.update(0.0, FRAME_MS);
        assert!(controls.camera_spherical().radius < 5.0);

        controls.handle_event(&InputEvent::TouchEnd { touches: vec![] });
        assert_eq!(controls.touch_mode(), None);
    }

    #[test]
    fn wheel_zoom_is_clamped_per_event() {
        let (mut controls, _) = interactive(SmoothControlsOptions::new());
        let response = controls.handle_event(&InputEvent::Wheel { delta_y: 10_000.0 });
        assert!(response.handled);
        assert!((controls.goal_spherical().radius - 5.0 * (1.0 + MAX_WHEEL_ZOOM_STEP)).abs() < 1e-4);
    }

    #[test]
    fn keys_adjust_orbit_and_radius() {
        let (mut controls, _) = interactive(SmoothControlsOptions::new());
        controls.handle_event(&InputEvent::KeyDown { key: Key::Left });
        assert!((controls.goal_spherical().theta - KEYBOARD_ORBIT_INCREMENT).abs() < 1e-6);

        controls.handle_event(&InputEvent::KeyDown { key: Key::PageUp });
        assert!((controls.goal_spherical().radius - 4.5).abs() < 1e-5);

        let response = controls.handle_event(&InputEvent::KeyDown { key: Key::Other });
        assert_eq!(response, EventResponse::IGNORED);
    }

    #[test]
    fn unfocused_surface_blocks_focused_policy() {
        let (mut controls, surface) = interactive(SmoothControlsOptions::new());
        surface.set_focused(false);
        let response = controls.handle_event(&InputEvent::KeyDown { key: Key::Left });
        assert_eq!(response, EventResponse::IGNORED);
        assert_eq!(controls.goal_spherical().theta, 0.0);

        controls
            .apply_options(
                &SmoothControlsOptions::new().with_interaction_policy(InteractionPolicy::AlwaysAllow),
            )
            .unwrap();
        let response = controls.handle_event(&InputEvent::KeyDown { key: Key::Left });
        assert!(response.handled);
    }

    #[test]
    fn change_source_follows_latest_goal_writer() {
        let (mut controls, _) = interactive(SmoothControlsOptions::new());
        let sources = record_sources(&mut controls);

        controls.handle_event(&InputEvent::KeyDown { key: Key::Right });
        controls.update(0.0, FRAME_MS);
        assert_eq!(sources.borrow().last(), Some(&ChangeSource::UserInteraction));

        settle(&mut controls);
        controls.set_radius(7.0).unwrap();
        controls.update(0.0, FRAME_MS);
        assert_eq!(sources.borrow().last(), Some(&ChangeSource::None));
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let (mut controls, _) = controls_with(SmoothControlsOptions::new());
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = controls.add_change_listener(move |_| *counter.borrow_mut() += 1);

        controls.set_radius(6.0).unwrap();
        controls.update(0.0, FRAME_MS);
        assert_eq!(*count.borrow(), 1);

        assert!(controls.remove_change_listener(id));
        controls.update(0.0, FRAME_MS);
        assert_eq!(*count.borrow(), 1);
    }
}
