//! Controls configuration
//!
//! [`SmoothControlsOptions`] is the user-facing, all-optional form (it is what
//! JSON configuration deserializes into). [`ControlsConfig`] is the resolved
//! form the controller works with, produced by merging options over
//! [`ControlsConfig::default`].
//!
//! Bounds where `minimum > maximum` are not validated; the resulting clamping
//! behavior is undefined.

use std::f32::consts::{FRAC_PI_8, PI};

use serde::{Deserialize, Serialize};

use crate::error::{ensure_not_nan, ControlsError, ControlsResult};

/// Angular change per keyboard press, in radians.
pub const KEYBOARD_ORBIT_INCREMENT: f32 = FRAC_PI_8;

/// Fractional radius change per PageUp/PageDown press.
pub const KEYBOARD_ZOOM_STEP: f32 = 0.1;

/// Fractional radius change per wheel pixel.
pub const WHEEL_ZOOM_SENSITIVITY: f32 = 0.001;

/// Upper bound on the fractional radius change of a single wheel event.
pub const MAX_WHEEL_ZOOM_STEP: f32 = 0.25;

/// Fraction of a full turn a drag across the surface height produces.
pub const ORBIT_DRAG_TURNS_PER_HEIGHT: f32 = 1.0;

/// Field of view at which vertical drag sensitivity is unmodulated.
/// Narrower fields of view scale polar drags up proportionally.
pub const FOV_SENSITIVITY_REFERENCE_DEGREES: f32 = 45.0;

/// How the host's default handling of an input event is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventHandlingBehavior {
    /// Suppress the default action of every relevant event.
    #[default]
    PreventAll,
    /// Suppress only events the controls actually consumed.
    PreventHandled,
}

/// When the controls respond to input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionPolicy {
    AlwaysAllow,
    /// Only respond while the input surface holds focus.
    #[default]
    AllowWhenFocused,
}

/// Partial configuration; absent fields keep their current value when applied.
///
/// Angles are in radians, fields of view in degrees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmoothControlsOptions {
    pub minimum_radius: Option<f32>,
    pub maximum_radius: Option<f32>,
    pub minimum_polar_angle: Option<f32>,
    pub maximum_polar_angle: Option<f32>,
    pub minimum_azimuthal_angle: Option<f32>,
    pub maximum_azimuthal_angle: Option<f32>,
    pub minimum_field_of_view: Option<f32>,
    pub maximum_field_of_view: Option<f32>,
    pub orbit_sensitivity: Option<f32>,
    pub event_handling_behavior: Option<EventHandlingBehavior>,
    pub interaction_policy: Option<InteractionPolicy>,
}

impl SmoothControlsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object such as
    /// `{"minimumRadius": 1, "interactionPolicy": "always-allow"}`.
    pub fn from_json(json: &str) -> ControlsResult<Self> {
        serde_json::from_str(json).map_err(|e| ControlsError::InvalidOptions(e.to_string()))
    }

    pub fn with_radius_range(mut self, min: f32, max: f32) -> Self {
        self.minimum_radius = Some(min);
        self.maximum_radius = Some(max);
        self
    }

    pub fn with_polar_range(mut self, min: f32, max: f32) -> Self {
        self.minimum_polar_angle = Some(min);
        self.maximum_polar_angle = Some(max);
        self
    }

    pub fn with_azimuthal_range(mut self, min: f32, max: f32) -> Self {
        self.minimum_azimuthal_angle = Some(min);
        self.maximum_azimuthal_angle = Some(max);
        self
    }

    pub fn with_field_of_view_range(mut self, min: f32, max: f32) -> Self {
        self.minimum_field_of_view = Some(min);
        self.maximum_field_of_view = Some(max);
        self
    }

    pub fn with_orbit_sensitivity(mut self, sensitivity: f32) -> Self {
        self.orbit_sensitivity = Some(sensitivity);
        self
    }

    pub fn with_event_handling_behavior(mut self, behavior: EventHandlingBehavior) -> Self {
        self.event_handling_behavior = Some(behavior);
        self
    }

    pub fn with_interaction_policy(mut self, policy: InteractionPolicy) -> Self {
        self.interaction_policy = Some(policy);
        self
    }
}

/// Fully resolved controls configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlsConfig {
    pub minimum_radius: f32,
    pub maximum_radius: f32,
    pub minimum_polar_angle: f32,
    pub maximum_polar_angle: f32,
    pub minimum_azimuthal_angle: f32,
    pub maximum_azimuthal_angle: f32,
    pub minimum_field_of_view: f32,
    pub maximum_field_of_view: f32,
    pub orbit_sensitivity: f32,
    pub event_handling_behavior: EventHandlingBehavior,
    pub interaction_policy: InteractionPolicy,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            minimum_radius: 0.0,
            maximum_radius: f32::INFINITY,
            minimum_polar_angle: PI / 8.0,
            maximum_polar_angle: PI - PI / 8.0,
            minimum_azimuthal_angle: f32::NEG_INFINITY,
            maximum_azimuthal_angle: f32::INFINITY,
            minimum_field_of_view: 10.0,
            maximum_field_of_view: 45.0,
            orbit_sensitivity: 1.0,
            event_handling_behavior: EventHandlingBehavior::PreventAll,
            interaction_policy: InteractionPolicy::AllowWhenFocused,
        }
    }
}

impl ControlsConfig {
    /// Merge `options` into this config. Nothing is written if any value is NaN.
    pub fn merge(&mut self, options: &SmoothControlsOptions) -> ControlsResult<()> {
        let bounds = [
            ("minimumRadius", options.minimum_radius),
            ("maximumRadius", options.maximum_radius),
            ("minimumPolarAngle", options.minimum_polar_angle),
            ("maximumPolarAngle", options.maximum_polar_angle),
            ("minimumAzimuthalAngle", options.minimum_azimuthal_angle),
            ("maximumAzimuthalAngle", options.maximum_azimuthal_angle),
            ("minimumFieldOfView", options.minimum_field_of_view),
            ("maximumFieldOfView", options.maximum_field_of_view),
            ("orbitSensitivity", options.orbit_sensitivity),
        ];
        for (name, value) in bounds {
            if let Some(value) = value {
                ensure_not_nan(name, value)?;
            }
        }

        let mut merged = *self;
        let fields = [
            (&mut merged.minimum_radius, options.minimum_radius),
            (&mut merged.maximum_radius, options.maximum_radius),
            (&mut merged.minimum_polar_angle, options.minimum_polar_angle),
            (&mut merged.maximum_polar_angle, options.maximum_polar_angle),
            (&mut merged.minimum_azimuthal_angle, options.minimum_azimuthal_angle),
            (&mut merged.maximum_azimuthal_angle, options.maximum_azimuthal_angle),
            (&mut merged.minimum_field_of_view, options.minimum_field_of_view),
            (&mut merged.maximum_field_of_view, options.maximum_field_of_view),
            (&mut merged.orbit_sensitivity, options.orbit_sensitivity),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(behavior) = options.event_handling_behavior {
            merged.event_handling_behavior = behavior;
        }
        if let Some(policy) = options.interaction_policy {
            merged.interaction_policy = policy;
        }

        if merged.minimum_radius > merged.maximum_radius
            || merged.minimum_polar_angle > merged.maximum_polar_angle
            || merged.minimum_azimuthal_angle > merged.maximum_azimuthal_angle
            || merged.minimum_field_of_view > merged.maximum_field_of_view
        {
            log::warn!("Controls options contain a minimum above its maximum: {:?}", merged);
        }

        *self = merged;
        Ok(())
    }

    /// Whether theta may wrap freely around the full circle.
    pub fn azimuth_is_unbounded(&self) -> bool {
        !self.minimum_azimuthal_angle.is_finite() && !self.maximum_azimuthal_angle.is_finite()
    }

    /// Snapshot of this config as fully populated options.
    pub fn to_options(&self) -> SmoothControlsOptions {
        SmoothControlsOptions {
            minimum_radius: Some(self.minimum_radius),
            maximum_radius: Some(self.maximum_radius),
            minimum_polar_angle: Some(self.minimum_polar_angle),
            maximum_polar_angle: Some(self.maximum_polar_angle),
            minimum_azimuthal_angle: Some(self.minimum_azimuthal_angle),
            maximum_azimuthal_angle: Some(self.maximum_azimuthal_angle),
            minimum_field_of_view: Some(self.minimum_field_of_view),
            maximum_field_of_view: Some(self.maximum_field_of_view),
            orbit_sensitivity: Some(self.orbit_sensitivity),
            event_handling_behavior: Some(self.event_handling_behavior),
            interaction_policy: Some(self.interaction_policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ControlsConfig::default();
        assert_eq!(config.minimum_field_of_view, 10.0);
        assert_eq!(config.maximum_field_of_view, 45.0);
        assert!(config.azimuth_is_unbounded());
        assert_eq!(config.event_handling_behavior, EventHandlingBehavior::PreventAll);
        assert_eq!(config.interaction_policy, InteractionPolicy::AllowWhenFocused);
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let mut config = ControlsConfig::default();
        config
            .merge(&SmoothControlsOptions::new().with_radius_range(1.0, 10.0))
            .unwrap();
        config
            .merge(&SmoothControlsOptions {
                maximum_field_of_view: Some(60.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.minimum_radius, 1.0);
        assert_eq!(config.maximum_radius, 10.0);
        assert_eq!(config.maximum_field_of_view, 60.0);
        assert_eq!(config.minimum_field_of_view, 10.0);
    }

    #[test]
    fn merge_rejects_nan_without_partial_writes() {
        let mut config = ControlsConfig::default();
        let result = config.merge(&SmoothControlsOptions {
            minimum_radius: Some(2.0),
            maximum_radius: Some(f32::NAN),
            ..Default::default()
        });
        assert_eq!(
            result,
            Err(ControlsError::NotANumber {
                name: "maximumRadius"
            })
        );
        assert_eq!(config, ControlsConfig::default());
    }

    #[test]
    fn finite_azimuth_bound_disables_wrapping() {
        let mut config = ControlsConfig::default();
        config
            .merge(&SmoothControlsOptions::new().with_azimuthal_range(-1.0, f32::INFINITY))
            .unwrap();
        assert!(!config.azimuth_is_unbounded());
    }

    #[test]
    fn parses_camel_case_json() {
        let options = SmoothControlsOptions::from_json(
            r#"{
                "minimumRadius": 1.5,
                "maximumFieldOfView": 30,
                "eventHandlingBehavior": "prevent-handled",
                "interactionPolicy": "always-allow"
            }"#,
        )
        .unwrap();

        assert_eq!(options.minimum_radius, Some(1.5));
        assert_eq!(options.maximum_field_of_view, Some(30.0));
        assert_eq!(options.maximum_radius, None);
        assert_eq!(
            options.event_handling_behavior,
            Some(EventHandlingBehavior::PreventHandled)
        );
        assert_eq!(options.interaction_policy, Some(InteractionPolicy::AlwaysAllow));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SmoothControlsOptions::from_json(r#"{"interactionPolicy": "sometimes"}"#)
            .unwrap_err();
        assert!(matches!(err, ControlsError::InvalidOptions(_)));
    }

    #[test]
    fn snapshot_round_trips_through_merge() {
        let mut config = ControlsConfig::default();
        config
            .merge(&SmoothControlsOptions::new().with_polar_range(0.2, 2.0))
            .unwrap();
        let mut copy = ControlsConfig::default();
        copy.merge(&config.to_options()).unwrap();
        assert_eq!(copy, config);
    }
}
