//! # ELP2000-82B lunar theory
//!
//! Geocentric position and velocity of the Moon from the 36 ELP2000-82B tables.
//!
//! ## Pipeline
//!
//! 1. The tables ([`tables`]) are reduced once, at construction:
//!    * main-problem rows (files 1–3) whose amplitude is below the precision are dropped,
//!      the remaining amplitudes are corrected for the fitted constants
//!      ([`arguments::MainProblemCorrections`]) and get a degree-4 Delaunay phase;
//!    * perturbation rows (files 4–36) below the precision are dropped and get a linear
//!      phase built from ζ, the Delaunay arguments and the planetary longitudes.
//! 2. At evaluation time the three composite series give longitude `V` and latitude `U`
//!    (arcseconds) and distance `R` (km), with their τ-derivatives.
//! 3. `(W1 + V, U, R)` are converted to Cartesian coordinates in the mean ecliptic of
//!    date, then rotated onto the ecliptic and equinox of J2000 with the Laskar `(P, Q)`
//!    precession matrix. The velocity includes the derivative of that matrix.
//!
//! τ is measured in Julian centuries from J2000; outputs are in km and km/s.
//!
//! ## Precision
//!
//! The precision is an angle in radians. Longitude and latitude terms are kept when
//! their amplitude reaches `precision` converted to arcseconds; distance terms when it
//! reaches `precision · a`, with `a` the lunar semi-major axis of the tables.

pub mod arguments;
pub mod tables;

use camino::Utf8Path;
use itertools::Itertools;
use log::{debug, info};
use nalgebra::{Matrix3, Vector3};

use crate::{
    constants::{Garam, Kilometer, Second, DAYS_PER_CENTURY, RADSEC, SECONDS_PER_DAY},
    orbit::ElementSource,
    orbit_type::keplerian_element::KeplerianElements,
    orrery_errors::OrreryError,
    series::{compute_all, derivative_all, HarmonicSeries, PeriodicTerm, TimePowers},
};

use self::{
    arguments::{LunarArguments, MainProblemCorrections},
    tables::{load_tables, ElpTable, LunarCoordinate, TableFamily},
};

/// Semi-major axis fitted to DE200 (km).
const SEMI_MAJOR_AXIS_FITTED: Kilometer = 384_747.980_644_895_4;

/// Semi-major axis used to build the tables (km).
const SEMI_MAJOR_AXIS_TABLES: Kilometer = 384_747.980_674_316_5;

/// Laskar coefficients of `P = sin(π/2)·sin(Π)`, as `τ · Σ Pₖ τᵏ`.
const LASKAR_P: [f64; 5] = [
    0.101_803_91e-4,
    0.470_204_39e-6,
    -0.541_736_7e-9,
    -0.250_794_8e-11,
    0.463_486e-14,
];

/// Laskar coefficients of `Q = sin(π/2)·cos(Π)`, as `τ · Σ Qₖ τᵏ`.
const LASKAR_Q: [f64; 5] = [
    -0.113_469_002e-3,
    0.123_726_74e-6,
    0.126_541_7e-8,
    -0.137_180_8e-11,
    -0.320_334e-14,
];

/// Rescaling of the tabulated distance to the fitted semi-major axis.
const DISTANCE_SCALE: f64 = SEMI_MAJOR_AXIS_FITTED / SEMI_MAJOR_AXIS_TABLES;

/// Seconds in a Julian century.
const SECONDS_PER_CENTURY: f64 = SECONDS_PER_DAY * DAYS_PER_CENTURY;

/// Convert simulation seconds since J2000 into Julian centuries.
pub fn centuries_since_j2000(time: Second) -> f64 {
    time / SECONDS_PER_CENTURY
}

/// `τ · Σ cₖ τᵏ` and its derivative.
fn laskar_polynomial(coefficients: &[f64; 5], tau: f64) -> (f64, f64) {
    let (inner, inner_rate) = coefficients
        .iter()
        .rev()
        .fold((0.0, 0.0), |(value, rate), &c| {
            (value * tau + c, rate * tau + value)
        });
    (inner * tau, inner + inner_rate * tau)
}

/// Rotation from the mean ecliptic of date to the ecliptic and equinox of J2000, and
/// its derivative with respect to τ.
pub fn precession_matrix(tau: f64) -> (Matrix3<f64>, Matrix3<f64>) {
    let (p, p_rate) = laskar_polynomial(&LASKAR_P, tau);
    let (q, q_rate) = laskar_polynomial(&LASKAR_Q, tau);

    let root = (1.0 - p * p - q * q).sqrt();
    let ra = 2.0 * root;
    let ra_rate = -2.0 * (p * p_rate + q * q_rate) / root;

    let pq = 2.0 * p * q;
    let pq_rate = 2.0 * (p * q_rate + p_rate * q);
    let pp = 1.0 - 2.0 * p * p;
    let pp_rate = -4.0 * p * p_rate;
    let qq = 1.0 - 2.0 * q * q;
    let qq_rate = -4.0 * q * q_rate;
    let p_ra = p * ra;
    let p_ra_rate = p * ra_rate + p_rate * ra;
    let q_ra = q * ra;
    let q_ra_rate = q * ra_rate + q_rate * ra;

    let matrix = Matrix3::new(
        pp,
        pq,
        p_ra,
        pq,
        qq,
        -q_ra,
        -p_ra,
        q_ra,
        pp + qq - 1.0,
    );
    let rate = Matrix3::new(
        pp_rate,
        pq_rate,
        p_ra_rate,
        pq_rate,
        qq_rate,
        -q_ra_rate,
        -p_ra_rate,
        q_ra_rate,
        pp_rate + qq_rate,
    );
    (matrix, rate)
}

/// Spherical `(λ, β, r)` to Cartesian, with the derivative of the result given the
/// derivatives of the spherical coordinates.
fn spherical_to_cartesian(
    spherical: [f64; 3],
    rates: [f64; 3],
) -> (Vector3<f64>, Vector3<f64>) {
    let [longitude, latitude, distance] = spherical;
    let [longitude_rate, latitude_rate, distance_rate] = rates;
    let (sin_lon, cos_lon) = longitude.sin_cos();
    let (sin_lat, cos_lat) = latitude.sin_cos();

    let position = Vector3::new(
        distance * cos_lon * cos_lat,
        distance * sin_lon * cos_lat,
        distance * sin_lat,
    );
    let velocity = Vector3::new(
        distance_rate * cos_lon * cos_lat
            - distance * sin_lon * longitude_rate * cos_lat
            - distance * cos_lon * sin_lat * latitude_rate,
        distance_rate * sin_lon * cos_lat + distance * cos_lon * longitude_rate * cos_lat
            - distance * sin_lon * sin_lat * latitude_rate,
        distance_rate * sin_lat + distance * cos_lat * latitude_rate,
    );
    (position, velocity)
}

/// The ELP2000-82B solution reduced to a given precision.
///
/// Immutable after construction: every query is a pure function of time.
#[derive(Debug, Clone, PartialEq)]
pub struct LunarTheory {
    arguments: LunarArguments,
    /// Longitude, latitude and distance series, main problem first.
    coordinates: [Vec<HarmonicSeries>; 3],
}

impl LunarTheory {
    /// Build the theory from parsed tables.
    ///
    /// Arguments
    /// ---------
    /// * `tables`: ELP tables, in any order. A missing file number contributes nothing.
    /// * `precision`: truncation level in radians.
    ///
    /// Return
    /// ------
    /// * The reduced theory.
    pub fn from_tables(tables: &[ElpTable], precision: f64) -> Self {
        let arguments = LunarArguments::default();
        let corrections = MainProblemCorrections::default();
        let angle_threshold = precision / RADSEC - 1e-12;
        let distance_threshold = precision * SEMI_MAJOR_AXIS_TABLES;

        let mut coordinates: [Vec<HarmonicSeries>; 3] = Default::default();

        for table in tables.iter().sorted_by_key(|table| table.file_number) {
            let coordinate = table.coordinate();
            let threshold = match coordinate {
                LunarCoordinate::Distance => distance_threshold,
                LunarCoordinate::Longitude | LunarCoordinate::Latitude => angle_threshold,
            };
            let series = match table.family() {
                TableFamily::Main => {
                    main_series(table, &arguments, &corrections, threshold)
                }
                TableFamily::Delaunay | TableFamily::Planetary => {
                    perturbation_series(table, &arguments, threshold)
                }
            };
            debug!(
                "{}: kept {} of {} terms",
                table.name(),
                series.len(),
                table.rows.len()
            );
            coordinates[coordinate as usize].push(series);
        }

        let kept: usize = coordinates.iter().flatten().map(HarmonicSeries::len).sum();
        info!("Lunar theory built with {kept} terms (precision {precision:e} rad)");

        LunarTheory {
            arguments,
            coordinates,
        }
    }

    /// Load `ELP1` … `ELP36` from `directory` and build the theory.
    pub fn from_directory(directory: &Utf8Path, precision: f64) -> Result<Self, OrreryError> {
        let tables = load_tables(directory)?;
        Ok(LunarTheory::from_tables(&tables, precision))
    }

    /// Raw series values `(V ″, U ″, R km)`.
    fn series_at(&self, t: &TimePowers) -> [f64; 3] {
        self.coordinates.each_ref().map(|s| compute_all(s, t))
    }

    /// τ-derivatives of [`LunarTheory::series_at`].
    fn series_rates_at(&self, t: &TimePowers) -> [f64; 3] {
        self.coordinates.each_ref().map(|s| derivative_all(s, t))
    }

    /// Ecliptic `(λ, β, r)` of date from the raw series values.
    fn spherical(&self, [v, u, r]: [f64; 3], t: &TimePowers) -> [f64; 3] {
        [
            v * RADSEC + self.arguments.mean_longitude.value(t),
            u * RADSEC,
            r * DISTANCE_SCALE,
        ]
    }

    /// Rates of [`LunarTheory::spherical`] per century.
    fn spherical_rates(&self, [v, u, r]: [f64; 3], t: &TimePowers) -> [f64; 3] {
        [
            v * RADSEC + self.arguments.mean_longitude.rate(t),
            u * RADSEC,
            r * DISTANCE_SCALE,
        ]
    }

    /// Geocentric position (km) and velocity (km/s) in the ecliptic and equinox of J2000.
    ///
    /// Arguments
    /// ---------
    /// * `time`: simulation seconds since J2000 (TT).
    ///
    /// Return
    /// ------
    /// * `(position, velocity)`; the velocity is the exact time derivative of the position,
    ///   precession included.
    pub fn state_at(&self, time: Second) -> (Vector3<f64>, Vector3<f64>) {
        let tau = centuries_since_j2000(time);
        let t = TimePowers::new(tau);
        let spherical = self.spherical(self.series_at(&t), &t);
        let rates = self.spherical_rates(self.series_rates_at(&t), &t);
        let (position, velocity) = spherical_to_cartesian(spherical, rates);
        let (rotation, rotation_rate) = precession_matrix(tau);

        let velocity_per_century = rotation * velocity + rotation_rate * position;
        (
            rotation * position,
            velocity_per_century / SECONDS_PER_CENTURY,
        )
    }

    /// Geocentric position (km) in the ecliptic and equinox of J2000.
    pub fn position_at(&self, time: Second) -> Vector3<f64> {
        let tau = centuries_since_j2000(time);
        let t = TimePowers::new(tau);
        let (position, _) = spherical_to_cartesian(self.spherical(self.series_at(&t), &t), [0.0; 3]);
        precession_matrix(tau).0 * position
    }

    pub fn velocity_at(&self, time: Second) -> Vector3<f64> {
        self.state_at(time).1
    }
}

fn main_series(
    table: &ElpTable,
    arguments: &LunarArguments,
    corrections: &MainProblemCorrections,
    threshold: f64,
) -> HarmonicSeries {
    let is_distance = table.coordinate() == LunarCoordinate::Distance;
    let terms = table
        .rows
        .iter()
        .filter(|row| {
            row.coefficients
                .first()
                .is_some_and(|amplitude| amplitude.abs() >= threshold)
        })
        .map(|row| {
            let amplitude = corrections.corrected_amplitude(&row.coefficients, is_distance);
            let phase = arguments.main_phase(&row.multipliers);
            if is_distance {
                PeriodicTerm::cosine(amplitude, phase)
            } else {
                PeriodicTerm::sine(amplitude, phase)
            }
        })
        .collect();
    HarmonicSeries::new(0, terms)
}

fn perturbation_series(
    table: &ElpTable,
    arguments: &LunarArguments,
    threshold: f64,
) -> HarmonicSeries {
    let family = table.family();
    let terms = table.rows.iter().map(|row| {
        let phase_offset = row.coefficients.first().copied().unwrap_or(0.0);
        let amplitude = row.coefficients.get(1).copied().unwrap_or(0.0);
        let phase = match family {
            TableFamily::Planetary => {
                arguments.planetary_phase(table.file_number, phase_offset, &row.multipliers)
            }
            _ => arguments.delaunay_phase(phase_offset, &row.multipliers),
        };
        PeriodicTerm::sine(amplitude, phase)
    });
    HarmonicSeries::from_terms(table.time_power(), terms, |term| {
        term.sin_amplitude.abs() >= threshold
    })
}

impl ElementSource for LunarTheory {
    /// Fit osculating elements to the ELP state vector at `time`.
    fn elements_at(&self, time: Second, combined_weight: Garam) -> KeplerianElements {
        let (position, velocity) = self.state_at(time);
        KeplerianElements::from_state(&position, &velocity, combined_weight, time)
    }
}

#[cfg(test)]
pub(crate) mod lunar_test {
    use super::*;
    use crate::{
        constants::{GM_EARTH, GM_MOON},
        lunar::tables::ElpRow,
    };
    use approx::assert_relative_eq;

    fn row(multipliers: &[i32], coefficients: &[f64]) -> ElpRow {
        ElpRow {
            multipliers: multipliers.to_vec(),
            coefficients: coefficients.to_vec(),
        }
    }

    fn table(file_number: usize, rows: Vec<ElpRow>) -> ElpTable {
        ElpTable { file_number, rows }
    }

    /// A handful of the largest ELP2000-82B terms, one or two per family.
    pub(crate) fn sample_tables() -> Vec<ElpTable> {
        vec![
            table(
                1,
                vec![
                    row(&[0, 0, 1, 0], &[22_639.585_78, -0.03, 4_586_438.71, -6.92, -20.44, 0.0, -0.17]),
                    row(&[2, 0, -1, 0], &[4_586.438_49, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[2, 0, 0, 0], &[2_369.911_94, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[0, 1, 0, 0], &[-666.417_86, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[0, 0, 0, 2], &[-411.602_87, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[2, 0, -2, 0], &[1e-7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ],
            ),
            table(
                2,
                vec![
                    row(&[0, 0, 0, 1], &[18_461.400_00, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[0, 0, 1, 1], &[1_010.180_00, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[0, 0, 1, -1], &[999.700_00, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ],
            ),
            table(
                3,
                vec![
                    row(&[0, 0, 0, 0], &[385_000.527_19, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[0, 0, 1, 0], &[-20_905.322_06, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[2, 0, -1, 0], &[-3_699.104_68, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                    row(&[2, 0, 0, 0], &[-2_955.967_56, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ],
            ),
            table(4, vec![row(&[0, 0, 0, 0, 1], &[270.0, 0.003_04, 0.075])]),
            table(7, vec![row(&[0, 0, 0, 0, 1], &[0.0, 0.000_32, 0.075])]),
            table(
                10,
                vec![row(&[0, 18, -16, 0, 0, 0, 0, 0, 1, -1, 0], &[26.54261, 14.244_34, 0.36])],
            ),
            table(
                18,
                vec![row(&[0, 0, 1, 0, 0, 0, 0, 2, 0, -1, 0], &[180.0, 0.6, 0.5])],
            ),
            table(
                25,
                vec![row(&[0, 0, 0, 1, 0], &[180.0, 0.015, 0.5])],
            ),
            table(
                34,
                vec![row(&[0, 0, 0, 1, 0], &[0.0, 0.2, 0.5])],
            ),
        ]
    }

    #[test]
    fn test_laskar_polynomial() {
        let tau = 0.37;
        let (value, rate) = laskar_polynomial(&LASKAR_P, tau);
        let expected: f64 = LASKAR_P
            .iter()
            .enumerate()
            .map(|(k, c)| c * tau.powi(k as i32 + 1))
            .sum();
        let expected_rate: f64 = LASKAR_P
            .iter()
            .enumerate()
            .map(|(k, c)| (k as f64 + 1.0) * c * tau.powi(k as i32))
            .sum();
        assert_relative_eq!(value, expected, max_relative = 1e-14);
        assert_relative_eq!(rate, expected_rate, max_relative = 1e-14);
    }

    #[test]
    fn test_precession_matrix() {
        let (identity, rate) = precession_matrix(0.0);
        assert_relative_eq!(identity, Matrix3::identity(), epsilon = 1e-15);
        assert_relative_eq!(rate[(0, 2)], 2.0 * LASKAR_P[0], epsilon = 1e-18);

        // orthogonal away from J2000
        let (rotation, rate) = precession_matrix(1.3);
        assert_relative_eq!(
            rotation * rotation.transpose(),
            Matrix3::identity(),
            epsilon = 1e-14
        );

        let h = 1e-5;
        let numeric = (precession_matrix(1.3 + h).0 - precession_matrix(1.3 - h).0) / (2. * h);
        assert_relative_eq!(rate, numeric, epsilon = 1e-10);
    }

    #[test]
    fn test_precision_truncation() {
        let tables = sample_tables();
        let full = LunarTheory::from_tables(&tables, 0.0);
        let truncated = LunarTheory::from_tables(&tables, 1e-5);

        assert_eq!(full.coordinates[0][0].len(), 6);
        // 1e-5 rad ≈ 2.06″: the 1e-7″ main term and all longitude perturbations
        // except the 14.2″ planetary one go
        assert_eq!(truncated.coordinates[0][0].len(), 5);
        let perturbation_terms = |theory: &LunarTheory, i: usize| -> usize {
            theory.coordinates[i][1..]
                .iter()
                .map(HarmonicSeries::len)
                .sum()
        };
        assert_eq!(perturbation_terms(&full, 0), 5);
        assert_eq!(perturbation_terms(&truncated, 0), 1);
        // 1e-5 × a ≈ 3.85 km: nothing dropped from the distance main problem
        assert_eq!(truncated.coordinates[2][0].len(), 4);
    }

    #[test]
    fn test_main_series_first_and_corrected() {
        let theory = LunarTheory::from_tables(&sample_tables(), 0.0);
        let corrections = MainProblemCorrections::default();
        let first = theory.coordinates[0][0].terms()[0];
        assert_relative_eq!(
            first.sin_amplitude,
            corrections.corrected_amplitude(
                &[22_639.585_78, -0.03, 4_586_438.71, -6.92, -20.44, 0.0, -0.17],
                false
            ),
            max_relative = 1e-15
        );
        assert_eq!(first.cos_amplitude, 0.0);

        let constant_distance = theory.coordinates[2][0].terms()[0];
        assert_eq!(constant_distance.sin_amplitude, 0.0);
        assert_relative_eq!(
            constant_distance.cos_amplitude,
            corrections.corrected_amplitude(&[385_000.527_19], true),
            max_relative = 1e-15
        );
    }

    #[test]
    fn test_time_power_of_perturbations() {
        let tables = vec![table(34, vec![row(&[0, 0, 0, 0, 0], &[90.0, 0.2, 0.5])])];
        let theory = LunarTheory::from_tables(&tables, 0.0);
        for tau in [0.0, 0.5, -1.2] {
            let t = TimePowers::new(tau);
            let [v, _, _] = theory.series_at(&t);
            let [v_rate, _, _] = theory.series_rates_at(&t);
            assert_relative_eq!(v, 0.2 * tau * tau, epsilon = 1e-15);
            assert_relative_eq!(v_rate, 0.4 * tau, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_position_magnitude() {
        let theory = LunarTheory::from_tables(&sample_tables(), 1e-8);
        for time in [0.0, 5.0e6, -3.3e8, 6.0e8] {
            let position = theory.position_at(time);
            let distance = position.norm();
            assert!(
                (350_000.0..420_000.0).contains(&distance),
                "distance {distance} at {time}"
            );
            assert!((position.z / distance).asin().abs() < 6.0_f64.to_radians());
        }
    }

    #[test]
    fn test_state_consistency() {
        let theory = LunarTheory::from_tables(&sample_tables(), 0.0);
        let time = 3.1e8;
        let (position, velocity) = theory.state_at(time);
        assert_relative_eq!(position, theory.position_at(time), max_relative = 1e-14);
        assert_eq!(velocity, theory.velocity_at(time));
    }

    #[test]
    fn test_velocity_matches_position_derivative() {
        let theory = LunarTheory::from_tables(&sample_tables(), 0.0);
        let h = 1.0;
        for time in [0.0, 1.7e7, -4.4e8, 9.0e8] {
            let numeric = (theory.position_at(time + h) - theory.position_at(time - h)) / (2. * h);
            let analytic = theory.velocity_at(time);
            assert_relative_eq!(analytic, numeric, epsilon = 1e-6);
            // mean orbital speed ~1.02 km/s
            assert!((0.9..1.2).contains(&analytic.norm()), "speed {}", analytic.norm());
        }
    }

    #[test]
    fn test_elements_reproduce_state() {
        let theory = LunarTheory::from_tables(&sample_tables(), 0.0);
        let mu = GM_EARTH + GM_MOON;
        let time = 2.0e8;
        let elements = theory.elements_at(time, mu);
        assert_eq!(elements.reference_epoch, time);
        assert!(elements.eccentricity > 0.02 && elements.eccentricity < 0.09);
        assert!((elements.inclination.to_degrees() - 5.1).abs() < 0.5);

        let (position, velocity) = theory.state_at(time);
        let (fitted_position, fitted_velocity) = elements.state_at(time, mu);
        assert_relative_eq!(fitted_position, position, max_relative = 1e-8, epsilon = 1e-6);
        assert_relative_eq!(fitted_velocity, velocity, max_relative = 1e-8, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_directory() {
        let directory = Utf8Path::new("/nonexistent/elp");
        assert_eq!(
            LunarTheory::from_directory(directory, 1e-5).unwrap_err(),
            OrreryError::TableNotFound(directory.join("ELP1"))
        );
    }
}
