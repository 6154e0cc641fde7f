//! Error types for the controls

use thiserror::Error;

/// Controls error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlsError {
    #[error("{name} must be a finite number, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error("{name} must not be NaN")]
    NotANumber { name: &'static str },
    #[error("{name} is too large in magnitude, got {value}")]
    OutOfRange { name: &'static str, value: f32 },
    #[error("Invalid controls options: {0}")]
    InvalidOptions(String),
}

pub type ControlsResult<T> = Result<T, ControlsError>;

/// Largest magnitude accepted for a goal or delta. Squared lengths of camera
/// positions built from such values stay representable in `f32`.
pub const MAX_MAGNITUDE: f32 = 1.0e18;

/// Reject NaN and infinities before they reach damper state.
pub(crate) fn ensure_finite(name: &'static str, value: f32) -> ControlsResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ControlsError::NonFinite { name, value })
    }
}

/// Finite and small enough that damped motion toward it cannot overflow.
pub(crate) fn ensure_in_range(name: &'static str, value: f32) -> ControlsResult<f32> {
    let value = ensure_finite(name, value)?;
    if value.abs() <= MAX_MAGNITUDE {
        Ok(value)
    } else {
        Err(ControlsError::OutOfRange { name, value })
    }
}

/// Bounds may be infinite (unbounded) but never NaN.
pub(crate) fn ensure_not_nan(name: &'static str, value: f32) -> ControlsResult<f32> {
    if value.is_nan() {
        Err(ControlsError::NotANumber { name })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_values_pass_through() {
        assert_eq!(ensure_finite("radius", 2.5), Ok(2.5));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            ensure_finite("radius", f32::NAN),
            Err(ControlsError::NonFinite { name: "radius", .. })
        ));
        assert!(ensure_finite("radius", f32::INFINITY).is_err());
    }

    #[test]
    fn huge_values_are_out_of_range() {
        assert_eq!(ensure_in_range("radius", -MAX_MAGNITUDE), Ok(-MAX_MAGNITUDE));
        assert_eq!(
            ensure_in_range("radius", 3.0e38),
            Err(ControlsError::OutOfRange {
                name: "radius",
                value: 3.0e38
            })
        );
        assert!(matches!(
            ensure_in_range("radius", f32::NAN),
            Err(ControlsError::NonFinite { .. })
        ));
    }

    #[test]
    fn infinite_bounds_are_allowed() {
        assert_eq!(ensure_not_nan("maximumRadius", f32::INFINITY), Ok(f32::INFINITY));
        assert_eq!(
            ensure_not_nan("maximumRadius", f32::NAN),
            Err(ControlsError::NotANumber { name: "maximumRadius" })
        );
    }

    #[test]
    fn error_messages() {
        let err = ControlsError::NonFinite {
            name: "fov",
            value: f32::INFINITY,
        };
        assert_eq!(err.to_string(), "fov must be a finite number, got inf");
    }
}
