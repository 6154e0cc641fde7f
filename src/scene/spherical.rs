//! Spherical coordinates for orbital camera placement

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Distance kept between the polar angle and either pole.
pub const POLE_EPSILON: f32 = 1e-6;

/// Orbital position relative to a look-at point.
///
/// `theta` is the azimuthal angle around +Y, measured from +Z toward +X.
/// `phi` is the polar angle measured down from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Default for Spherical {
    fn default() -> Self {
        Self {
            radius: 1.0,
            phi: 0.0,
            theta: 0.0,
        }
    }
}

impl Spherical {
    pub fn new(radius: f32, phi: f32, theta: f32) -> Self {
        Self { radius, phi, theta }
    }

    /// Compute spherical coordinates of an offset from the origin.
    pub fn from_vector(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    /// Cartesian offset from the origin.
    pub fn to_vector(&self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep phi strictly between the poles.
    pub fn make_safe(&mut self) -> &mut Self {
        self.phi = self.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self
    }
}

/// Wrap an angle into (-π, π]. Angles already in range are returned unchanged.
pub fn wrap_angle(radians: f32) -> f32 {
    if radians > -PI && radians <= PI {
        return radians;
    }
    let wrapped = (radians + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn round_trips_through_cartesian() {
        let spherical = Spherical::new(4.0, 1.1, -2.3);
        let back = Spherical::from_vector(spherical.to_vector());
        assert!((back.radius - 4.0).abs() < 1e-5);
        assert!((back.phi - 1.1).abs() < 1e-5);
        assert!((back.theta + 2.3).abs() < 1e-5);
    }

    #[test]
    fn zero_angles_face_positive_z() {
        let position = Spherical::new(10.0, FRAC_PI_2, 0.0).to_vector();
        assert!(position.x.abs() < 1e-5);
        assert!(position.y.abs() < 1e-5);
        assert!((position.z - 10.0).abs() < 1e-5);
    }

    #[test]
    fn zero_vector_has_zero_radius() {
        assert_eq!(Spherical::from_vector(Vec3::ZERO), Spherical::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn make_safe_excludes_poles() {
        let mut top = Spherical::new(1.0, 0.0, 0.0);
        top.make_safe();
        assert!(top.phi > 0.0);

        let mut bottom = Spherical::new(1.0, PI, 0.0);
        bottom.make_safe();
        assert!(bottom.phi < PI);
    }

    #[test]
    fn wrap_angle_range() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(0.1), 0.1);
        assert_eq!(wrap_angle(-3.0), -3.0);
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(5.0 * TAU + 0.25) - 0.25).abs() < 1e-4);
    }
}
