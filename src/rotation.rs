//! # Body orientation from IAU-style rotation elements
//!
//! A [`RotationModel`] gives the attitude of a body as a function of simulation time from
//! three quadratic polynomials, all in degrees:
//!
//! - right ascension `α(T)` and declination `δ(T)` of the north pole, `T` in Julian
//!   centuries since J2000,
//! - prime meridian angle `W(d)`, `d` in days since J2000.
//!
//! The pole is expressed in the J2000 equator; the orientation is returned in the
//! ecliptic frame used by the ephemerides:
//!
//! ```text
//! R = Rx(−ε) · Rz(π/2 + α) · Rx(π/2 − δ) · Rz(W)
//! ```
//!
//! with `ε` the J2000 obliquity.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{
    Degree, Radian, Second, DAYS_PER_CENTURY, OBLIQUITY_J2000, RADEG, SECONDS_PER_DAY,
};

/// Rotation elements of a body (degrees, quadratic in time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationModel {
    /// Pole right ascension, coefficients of `1, T, T²` (T in centuries).
    pub right_ascension: [Degree; 3],
    /// Pole declination, coefficients of `1, T, T²` (T in centuries).
    pub declination: [Degree; 3],
    /// Prime meridian, coefficients of `1, d, d²` (d in days).
    pub prime_meridian: [Degree; 3],
}

fn quadratic(coefficients: &[Degree; 3], x: f64) -> Degree {
    coefficients[0] + (coefficients[1] + coefficients[2] * x) * x
}

impl RotationModel {
    /// Earth: slow precession of the pole and the sidereal day.
    pub fn earth() -> Self {
        RotationModel {
            right_ascension: [0.0, -0.641, 0.0],
            declination: [90.0, -0.557, 0.0],
            prime_meridian: [190.147, 360.985_623_5, 0.0],
        }
    }

    /// Moon: fixed pole, synchronous rotation.
    pub fn moon() -> Self {
        RotationModel {
            right_ascension: [270.0, 0.0, 0.0],
            declination: [66.534, 0.0, 0.0],
            prime_meridian: [38.314, 13.176_358_1, 0.0],
        }
    }

    /// Sun: IAU pole and Carrington rotation rate.
    pub fn sun() -> Self {
        RotationModel {
            right_ascension: [286.13, 0.0, 0.0],
            declination: [63.87, 0.0, 0.0],
            prime_meridian: [84.176, 14.184_4, 0.0],
        }
    }

    /// Pole right ascension, declination and prime meridian angle at `time`, in radians.
    ///
    /// Arguments
    /// ---------
    /// * `time`: simulation seconds since J2000.
    ///
    /// Return
    /// ------
    /// * `(α, δ, W)` in radians, `W` not reduced modulo 2π.
    pub fn angles_at(&self, time: Second) -> (Radian, Radian, Radian) {
        let days = time / SECONDS_PER_DAY;
        let centuries = days / DAYS_PER_CENTURY;
        (
            quadratic(&self.right_ascension, centuries) * RADEG,
            quadratic(&self.declination, centuries) * RADEG,
            quadratic(&self.prime_meridian, days) * RADEG,
        )
    }

    /// Attitude of the body at `time`, mapping body-fixed vectors into the ecliptic frame.
    pub fn orientation_at(&self, time: Second) -> UnitQuaternion<f64> {
        let (ra, dec, pm) = self.angles_at(time);
        let x = Vector3::x_axis();
        let z = Vector3::z_axis();

        UnitQuaternion::from_axis_angle(&x, -OBLIQUITY_J2000 * RADEG)
            * UnitQuaternion::from_axis_angle(&z, std::f64::consts::FRAC_PI_2 + ra)
            * UnitQuaternion::from_axis_angle(&x, std::f64::consts::FRAC_PI_2 - dec)
            * UnitQuaternion::from_axis_angle(&z, pm)
    }

    /// Same as [`RotationModel::orientation_at`], as a rotation matrix.
    pub fn matrix_at(&self, time: Second) -> Matrix3<f64> {
        self.orientation_at(time).to_rotation_matrix().into_inner()
    }

    /// Direction of the north pole in the ecliptic frame at `time`.
    pub fn pole_at(&self, time: Second) -> Vector3<f64> {
        self.orientation_at(time) * Vector3::z()
    }
}

/// Rotation model selection in a system description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPreset {
    Earth,
    Moon,
    Sun,
    Custom(RotationModel),
}

impl RotationPreset {
    pub fn model(&self) -> RotationModel {
        match self {
            RotationPreset::Earth => RotationModel::earth(),
            RotationPreset::Moon => RotationModel::moon(),
            RotationPreset::Sun => RotationModel::sun(),
            RotationPreset::Custom(model) => *model,
        }
    }
}

impl From<RotationPreset> for RotationModel {
    fn from(preset: RotationPreset) -> Self {
        preset.model()
    }
}
