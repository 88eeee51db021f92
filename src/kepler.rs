use log::warn;

use crate::constants::{Radian, DPI};
use std::f64::consts::PI;

/// Maximum number of Newton steps taken by [`solve_kepler_equation`].
///
/// Elliptic inputs (`e < 1`) converge in well under twenty steps; the cap only
/// protects against corrupted or non-elliptic elements.
pub const KEPLER_MAX_ITERATIONS: usize = 100;

/// Newton step size below which the eccentric anomaly is considered converged (radians).
pub const KEPLER_TOLERANCE: f64 = 1e-10;

/// Eccentricity above which the Newton iteration is seeded at π instead of M.
const HIGH_ECCENTRICITY: f64 = 0.8;

/// Return the principal value of an angle in radians, in [0, 2π).
pub fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Return the principal difference between two angles, in [-π, π].
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let a = principal_angle(a);
    let b = principal_angle(b);

    let mut diff = a - b;

    if diff > PI {
        diff -= DPI;
    } else if diff < -PI {
        diff += DPI;
    }

    diff
}

/// Solve Kepler's equation `E − e·sin(E) = M` for the eccentric anomaly.
///
/// The mean anomaly is first reduced to [0, 2π). The Newton iteration is seeded at
/// `M`, or at `π` when `e > 0.8` where seeding at `M` can overshoot near periapsis.
/// Iteration stops once the Newton correction drops below [`KEPLER_TOLERANCE`].
///
/// Arguments
/// ---------
/// * `mean_anomaly`: mean anomaly `M` in radians (any value).
/// * `eccentricity`: orbital eccentricity `e`, expected in [0, 1).
///
/// Return
/// ------
/// * The eccentric anomaly `E` in radians, consistent with the reduced `M`.
///
/// Remarks
/// -------
/// * The loop is capped at [`KEPLER_MAX_ITERATIONS`]. When the cap is hit the last
///   estimate is returned and a warning is logged; no error is raised.
pub fn solve_kepler_equation(mean_anomaly: Radian, eccentricity: f64) -> Radian {
    let mean_anomaly = mean_anomaly - (mean_anomaly / DPI).floor() * DPI;

    let mut guess = if eccentricity > HIGH_ECCENTRICITY {
        PI
    } else {
        mean_anomaly
    };

    for _ in 0..KEPLER_MAX_ITERATIONS {
        let correction = (guess - (mean_anomaly + eccentricity * guess.sin()))
            / (1. - eccentricity * guess.cos());
        guess -= correction;
        if correction.abs() < KEPLER_TOLERANCE {
            return guess;
        }
    }

    warn!(
        "Kepler solver reached {KEPLER_MAX_ITERATIONS} iterations without converging \
         (M = {mean_anomaly}, e = {eccentricity}), returning last estimate {guess}"
    );
    guess
}
