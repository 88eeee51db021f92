//! # Keplerian orbital elements
//!
//! This module defines the [`crate::orbit_type::keplerian_element::KeplerianElements`] struct
//! and the two-body conversions between the **classical orbital element
//! representation** and Cartesian state vectors.
//!
//! ## What are Keplerian elements?
//!
//! The six Keplerian elements are:
//!
//! 1. **a** – Semi-major axis (km)
//! 2. **e** – Eccentricity (unitless)
//! 3. **i** – Inclination (radians)
//! 4. **Ω** – Longitude of ascending node (radians)
//! 5. **ω** – Argument of periapsis (radians)
//! 6. **M** – Mean anomaly at the reference epoch (radians)
//!
//! Together with the reference epoch (simulation seconds since J2000) and the combined
//! gravitational weight `μ` of the two orbiting bodies, they fully describe a two-body
//! orbit.
//!
//! ## Provided functionality
//!
//! - [`KeplerianElements::position_at`] / [`KeplerianElements::velocity_at`] /
//!   [`KeplerianElements::state_at`] – elements → Cartesian state in the parent frame.
//! - [`KeplerianElements::from_state`] – Cartesian state → elements, used to re-fit
//!   perturbed state vectors (lunar theory) into an orbit.
//!
//! ## Degeneracies
//!
//! Circular (`e → 0`) and equatorial (`i → 0`) orbits make ω and Ω ill-defined.
//! [`KeplerianElements::from_state`] does not special-case them: the angles it returns
//! stay finite (cosines are clamped before `acos`, 0/0 ratios read as 0) but may be
//! arbitrary.
//!
//! ## See also
//!
//! - [`EquinoctialElements`](crate::orbit_type::equinoctial_element::EquinoctialElements) – non-singular form produced by the planetary theory.
//! - [`solve_kepler_equation`](crate::kepler::solve_kepler_equation) – eccentric anomaly solver.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    constants::{Garam, Kilometer, Radian, Second, DPI},
    kepler::solve_kepler_equation,
};

/// Keplerian orbital elements (osculating, two-body).
///
/// Units
/// -----
/// * `reference_epoch`: simulation seconds since J2000 (TT).
/// * `semi_major_axis`: kilometers.
/// * `eccentricity`: unitless.
/// * `inclination`: radians.
/// * `ascending_node_longitude`: radians (Ω).
/// * `periapsis_argument`: radians (ω).
/// * `mean_anomaly`: radians (M at `reference_epoch`).
///
/// See also
/// --------
/// * [`EquinoctialElements`](crate::orbit_type::equinoctial_element::EquinoctialElements) – Regularized element set.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub reference_epoch: Second,
    pub semi_major_axis: Kilometer,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node_longitude: Radian,
    pub periapsis_argument: Radian,
    pub mean_anomaly: Radian,
}

impl KeplerianElements {
    /// Mean motion `n = sqrt(μ / a³)` in rad/s.
    pub fn mean_motion(&self, combined_weight: Garam) -> f64 {
        (combined_weight / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Orbital period `2π / n` in seconds.
    pub fn period(&self, combined_weight: Garam) -> Second {
        DPI / self.mean_motion(combined_weight)
    }

    fn eccentric_anomaly_at(&self, time: Second, combined_weight: Garam) -> Radian {
        let mean_anomaly =
            self.mean_anomaly + (time - self.reference_epoch) * self.mean_motion(combined_weight);
        solve_kepler_equation(mean_anomaly, self.eccentricity)
    }

    /// Rotation from the perifocal frame to the parent frame: `Rz(Ω)·Rx(i)·Rz(ω)`.
    fn perifocal_to_parent(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), self.ascending_node_longitude)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.inclination)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.periapsis_argument)
    }

    /// Position and velocity in the perifocal frame for a given eccentric anomaly.
    fn perifocal_state(
        &self,
        eccentric_anomaly: Radian,
        combined_weight: Garam,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let a = self.semi_major_axis;
        let e = self.eccentricity;
        let semi_minor = a * (1. - e * e).sqrt();
        let (sin_e, cos_e) = eccentric_anomaly.sin_cos();

        let position = Vector3::new(a * (cos_e - e), semi_minor * sin_e, 0.);

        // dE/dt = n / (1 − e·cos E), so v = n·a / (1 − e·cos E) · (−sin E, √(1−e²)·cos E)
        let radius = a * (1. - e * cos_e);
        let factor = (combined_weight * a).sqrt() / radius;
        let velocity = Vector3::new(
            -factor * sin_e,
            factor * (1. - e * e).sqrt() * cos_e,
            0.,
        );

        (position, velocity)
    }

    /// Cartesian position at `time`, relative to the focus, in the parent frame.
    ///
    /// Arguments
    /// ---------
    /// * `time`: simulation seconds since J2000.
    /// * `combined_weight`: `μ` of the two bodies (km³/s²).
    ///
    /// Return
    /// ------
    /// * Position in kilometers.
    pub fn position_at(&self, time: Second, combined_weight: Garam) -> Vector3<f64> {
        self.state_at(time, combined_weight).0
    }

    /// Cartesian velocity at `time` in the parent frame (km/s).
    pub fn velocity_at(&self, time: Second, combined_weight: Garam) -> Vector3<f64> {
        self.state_at(time, combined_weight).1
    }

    /// Cartesian position and velocity at `time`.
    ///
    /// The mean anomaly is propagated as `M₀ + (t − t₀)·sqrt(μ/a³)`, Kepler's equation is
    /// solved for `E`, and the perifocal state is rotated by ω about z, i about x and Ω
    /// about z into the parent frame.
    pub fn state_at(
        &self,
        time: Second,
        combined_weight: Garam,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let eccentric_anomaly = self.eccentric_anomaly_at(time, combined_weight);
        let (position, velocity) = self.perifocal_state(eccentric_anomaly, combined_weight);
        let rotation = self.perifocal_to_parent();
        (rotation * position, rotation * velocity)
    }

    /// Fit Keplerian elements to a Cartesian state vector.
    ///
    /// Arguments
    /// ---------
    /// * `position`: position relative to the focus (km).
    /// * `velocity`: velocity relative to the focus (km/s).
    /// * `combined_weight`: `μ` of the two bodies (km³/s²).
    /// * `reference_epoch`: epoch of the state vector, stored as the elements' epoch.
    ///
    /// Return
    /// ------
    /// * Elements such that [`KeplerianElements::state_at`] at `reference_epoch`
    ///   reproduces the input state.
    ///
    /// Remarks
    /// -------
    /// * The argument of periapsis is measured from the node vector `ẑ × h` to the
    ///   eccentricity vector and flipped to `2π − ω` when the eccentricity vector points
    ///   below the reference plane.
    /// * The eccentric anomaly is taken in `[π, 2π)` when the body approaches periapsis
    ///   (`r·v < 0`).
    pub fn from_state(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        combined_weight: Garam,
        reference_epoch: Second,
    ) -> Self {
        let mu = combined_weight;
        let radius = position.norm();
        let radial_velocity = position.dot(velocity);

        let angular_momentum = position.cross(velocity);
        let node_vector = Vector3::z().cross(&angular_momentum);

        let eccentricity_vector = (position * (velocity.norm_squared() - mu / radius)
            - velocity * radial_velocity)
            / mu;
        let eccentricity = eccentricity_vector.norm();

        let energy = velocity.norm_squared() * 0.5 - mu / radius;
        let semi_major_axis = -mu / (energy * 2.);

        let inclination = clamped_acos(angular_momentum.z / angular_momentum.norm());
        let ascending_node_longitude = node_vector.y.atan2(node_vector.x);

        let mut periapsis_argument = clamped_acos(
            node_vector.dot(&eccentricity_vector) / (node_vector.norm() * eccentricity),
        );
        if eccentricity_vector.z < 0. {
            periapsis_argument = DPI - periapsis_argument;
        }

        let cos_true_anomaly = eccentricity_vector.dot(position) / (eccentricity * radius);
        let cos_eccentric_anomaly =
            (eccentricity + cos_true_anomaly) / (1. + eccentricity * cos_true_anomaly);
        let mut eccentric_anomaly = clamped_acos(cos_eccentric_anomaly);
        if radial_velocity < 0. {
            eccentric_anomaly = DPI - eccentric_anomaly;
        }
        let mean_anomaly = eccentric_anomaly - eccentricity * eccentric_anomaly.sin();

        KeplerianElements {
            reference_epoch,
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude,
            periapsis_argument,
            mean_anomaly,
        }
    }
}

/// `acos` with its argument clamped to [-1, 1]; an undefined ratio (0/0) maps to 0.
fn clamped_acos(x: f64) -> f64 {
    if x.is_nan() {
        0.
    } else {
        x.clamp(-1., 1.).acos()
    }
}

/// One-line summary used in trace logs: `a` in km, angles in radians, epoch in TT seconds.
impl fmt::Display for KeplerianElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:.1}s a={:.3}km e={:.6} i={:.6} node={:.6} peri={:.6} M={:.6}",
            self.reference_epoch,
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
            self.mean_anomaly
        )
    }
}
