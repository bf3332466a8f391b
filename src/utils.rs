// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! contains useful type definitions and conversion functions.
use nalgebra::{DVector, Isometry3, Translation3, UnitQuaternion, Vector3, Vector6};
use std::time::Duration;

/// A joint-space vector (positions, velocities or limits) with one entry per chain joint.
pub type JntArray = DVector<f64>;

/// Converts an URDF origin (xyz translation and roll-pitch-yaw rotation) to an Isometry.
///
/// The rotation follows the URDF convention: roll about X, then pitch about Y, then yaw about Z,
/// all about fixed axes.
pub fn origin_to_isometry(xyz: &[f64; 3], rpy: &[f64; 3]) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(xyz[0], xyz[1], xyz[2]),
        UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]),
    )
}

/// Stacks a linear and an angular part into a 6-vector {vx, vy, vz, wx, wy, wz}.
pub fn stack_twist(linear: &Vector3<f64>, angular: &Vector3<f64>) -> Vector6<f64> {
    Vector6::new(
        linear.x, linear.y, linear.z, angular.x, angular.y, angular.z,
    )
}

/// Period of a rate given in Hz.
///
/// # Return
/// `None` if the rate is not positive or not finite, which disables the rate-limited action.
/// A rate so small that its period does not fit into a [`Duration`] never triggers either and
/// also gives `None`.
pub fn period_from_rate(rate: f64) -> Option<Duration> {
    if rate > 0. && rate.is_finite() {
        Duration::try_from_secs_f64(1. / rate).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use crate::utils::{origin_to_isometry, period_from_rate, stack_twist};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;
    use std::time::Duration;

    #[test]
    fn origin_yaw_rotates_x_onto_y() {
        let iso = origin_to_isometry(&[1., 2., 3.], &[0., 0., FRAC_PI_2]);
        let rotated = iso.rotation * Vector3::x();
        assert_relative_eq!(rotated, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(iso.translation.vector, Vector3::new(1., 2., 3.));
    }

    #[test]
    fn origin_roll_rotates_y_onto_z() {
        let iso = origin_to_isometry(&[0.; 3], &[FRAC_PI_2, 0., 0.]);
        assert_relative_eq!(iso.rotation * Vector3::y(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn twist_stacking_order() {
        let v = stack_twist(&Vector3::new(1., 2., 3.), &Vector3::new(4., 5., 6.));
        assert_eq!(v.as_slice(), &[1., 2., 3., 4., 5., 6.]);
    }

    #[test]
    fn period_of_rate() {
        assert_eq!(period_from_rate(4.), Some(Duration::from_millis(250)));
        assert_eq!(period_from_rate(0.), None);
        assert_eq!(period_from_rate(-10.), None);
        assert_eq!(period_from_rate(f64::NAN), None);
    }

    #[test]
    fn period_of_tiny_rate_does_not_overflow() {
        assert_eq!(period_from_rate(1e-20), None);
        assert_eq!(period_from_rate(f64::MIN_POSITIVE), None);
        assert!(period_from_rate(1e-12).is_some());
    }
}
