//! Fundamental arguments of the ELP2000-82B solution.
//!
//! All polynomials are in radians with τ in Julian centuries from J2000.

use crate::{
    constants::{ArcSec, Degree, Radian, RADEG, RADSEC},
    series::{combine_arguments, PhasePolynomial},
};

/// Sexagesimal angle to radians.
fn dms(degrees: Degree, minutes: f64, seconds: ArcSec) -> Radian {
    (degrees + minutes / 60.0 + seconds / 3600.0) * RADEG
}

/// Polynomial whose constant is given in sexagesimal degrees and the other
/// coefficients in arcseconds per power of century.
fn polynomial(constant: Radian, arcsec: [ArcSec; 4]) -> PhasePolynomial {
    PhasePolynomial([
        constant,
        arcsec[0] * RADSEC,
        arcsec[1] * RADSEC,
        arcsec[2] * RADSEC,
        arcsec[3] * RADSEC,
    ])
}

/// Mean longitude of the Moon, W1.
pub fn moon_mean_longitude() -> PhasePolynomial {
    polynomial(
        dms(218., 18., 59.955_71),
        [1_732_559_343.736_04, -5.888_3, 0.660_4e-2, -0.316_9e-4],
    )
}

/// Mean longitude of the lunar perigee, W2.
fn moon_perigee() -> PhasePolynomial {
    polynomial(
        dms(83., 21., 11.674_75),
        [14_643_420.263_2, -38.277_6, -0.450_47e-1, 0.213_01e-3],
    )
}

/// Mean longitude of the lunar ascending node, W3.
fn moon_node() -> PhasePolynomial {
    polynomial(
        dms(125., 2., 40.398_16),
        [-6_967_919.362_2, 6.362_2, 0.762_5e-2, -0.358_6e-4],
    )
}

/// Mean heliocentric longitude of the Earth-Moon barycenter, T.
fn earth_mean_longitude() -> PhasePolynomial {
    polynomial(
        dms(100., 27., 59.220_59),
        [129_597_742.275_8, -0.020_2, 0.9e-5, 0.15e-6],
    )
}

/// Mean longitude of the perihelion of the Earth-Moon barycenter, ϖ'.
fn earth_perihelion() -> PhasePolynomial {
    polynomial(
        dms(102., 56., 14.427_53),
        [1_161.228_3, 0.532_7, -0.138e-3, 0.0],
    )
}

/// General precession in longitude (arcsec per century).
const PRECESSION_RATE: ArcSec = 5_029.096_6;

/// Delaunay arguments `[D, l', l, F]`.
///
/// `D` carries an extra π, as in the published tables.
pub fn delaunay_arguments() -> [PhasePolynomial; 4] {
    let w1 = moon_mean_longitude();
    let earth = earth_mean_longitude();
    let mut elongation = w1 + earth * -1.0;
    elongation.0[0] += std::f64::consts::PI;
    [
        elongation,
        earth + earth_perihelion() * -1.0,
        w1 + moon_perigee() * -1.0,
        w1 + moon_node() * -1.0,
    ]
}

/// Mean longitudes of Mercury to Neptune (linear), the Earth entry being T.
pub fn planetary_arguments() -> [PhasePolynomial; 8] {
    let linear = |constant: Radian, rate: ArcSec| PhasePolynomial::linear(constant, rate * RADSEC);
    [
        linear(dms(252., 15., 3.259_86), 538_101_628.688_98),
        linear(dms(181., 58., 47.283_05), 210_664_136.433_55),
        earth_mean_longitude().linear_part(),
        linear(dms(355., 25., 59.788_66), 68_905_077.592_84),
        linear(dms(34., 21., 5.342_12), 10_925_660.428_61),
        linear(dms(50., 4., 38.896_94), 4_399_609.659_32),
        linear(dms(314., 3., 18.018_41), 1_542_481.193_93),
        linear(dms(304., 20., 55.195_75), 786_550.320_74),
    ]
}

/// ζ: mean longitude of the Moon referred to the moving equinox of date.
pub fn zeta() -> PhasePolynomial {
    let w1 = moon_mean_longitude();
    PhasePolynomial::linear(w1.0[0], w1.0[1] + PRECESSION_RATE * RADSEC)
}

/// All arguments needed to build the perturbation phases.
#[derive(Debug, Clone, PartialEq)]
pub struct LunarArguments {
    pub mean_longitude: PhasePolynomial,
    pub delaunay: [PhasePolynomial; 4],
    pub planets: [PhasePolynomial; 8],
    pub zeta: PhasePolynomial,
}

impl Default for LunarArguments {
    fn default() -> Self {
        LunarArguments {
            mean_longitude: moon_mean_longitude(),
            delaunay: delaunay_arguments(),
            planets: planetary_arguments(),
            zeta: zeta(),
        }
    }
}

impl LunarArguments {
    /// Phase of a main-problem row (degree 4).
    pub fn main_phase(&self, multipliers: &[i32]) -> PhasePolynomial {
        combine_arguments(multipliers, &self.delaunay)
    }

    /// Phase of a `ζ + Delaunay` perturbation row, truncated to degree 1.
    pub fn delaunay_phase(&self, phase: Degree, multipliers: &[i32]) -> PhasePolynomial {
        let zeta_multiplier = multipliers.first().copied().unwrap_or(0);
        let delaunay = multipliers.get(1..).unwrap_or(&[]);
        let mut argument =
            self.zeta * zeta_multiplier as f64 + combine_arguments(delaunay, &self.delaunay);
        argument.0[0] += phase * RADEG;
        argument.linear_part()
    }

    /// Phase of a planetary perturbation row, truncated to degree 1.
    ///
    /// Files 10–15 combine the eight planets with `D`, `l`, `F` (multipliers 8, 9, 10);
    /// files 16–21 combine seven planets with `D`, `l'`, `l`, `F` (multipliers 7 to 10).
    pub fn planetary_phase(
        &self,
        file_number: usize,
        phase: Degree,
        multipliers: &[i32],
    ) -> PhasePolynomial {
        let m = |i: usize| multipliers.get(i).copied().unwrap_or(0) as f64;
        let [d, l_sun, l, f] = self.delaunay;
        let mut argument = if file_number <= 15 {
            combine_arguments(&multipliers[..multipliers.len().min(8)], &self.planets)
                + d * m(8)
                + l * m(9)
                + f * m(10)
        } else {
            combine_arguments(&multipliers[..multipliers.len().min(7)], &self.planets)
                + d * m(7)
                + l_sun * m(8)
                + l * m(9)
                + f * m(10)
        };
        argument.0[0] += phase * RADEG;
        argument.linear_part()
    }
}

/// Corrections of the main-problem amplitudes for constants fitted after the
/// tables were computed (mean motion, eccentricities, inclination).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainProblemCorrections {
    /// Ratio of the mean motions of the Sun and the Moon.
    pub am: f64,
    /// `2α / 3m`
    pub dtasm: f64,
    pub delnu: f64,
    pub dele: f64,
    pub delg: f64,
    pub delnp: f64,
    pub delep: f64,
}

impl Default for MainProblemCorrections {
    fn default() -> Self {
        let am = 0.074_801_329_518;
        let alpha = 0.002_571_881_335;
        let moon_rate = moon_mean_longitude().0[1];
        MainProblemCorrections {
            am,
            dtasm: 2.0 * alpha / (3.0 * am),
            delnu: 0.556_04 * RADSEC / moon_rate,
            dele: 0.017_89 * RADSEC,
            delg: -0.080_66 * RADSEC,
            delnp: -0.064_24 * RADSEC / moon_rate,
            delep: -0.128_79 * RADSEC,
        }
    }
}

impl MainProblemCorrections {
    /// Corrected amplitude of a main-problem row.
    ///
    /// Arguments
    /// ---------
    /// * `coefficients`: the seven floats of the row: amplitude, then its partial
    ///   derivatives with respect to m, Γ, E, e', α and a fitted term.
    /// * `coordinate_is_distance`: the distance table also absorbs the change of the
    ///   mean motion in the semi-major axis.
    pub fn corrected_amplitude(&self, coefficients: &[f64], coordinate_is_distance: bool) -> f64 {
        let c = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        let tgv = c(1) + self.dtasm * c(5);
        let mut amplitude = c(0)
            + tgv * (self.delnp - self.am * self.delnu)
            + c(2) * self.delg
            + c(3) * self.dele
            + c(4) * self.delep;
        if coordinate_is_distance {
            amplitude -= 2.0 * c(0) * self.delnu / 3.0;
        }
        amplitude
    }
}

#[cfg(test)]
mod arguments_test {
    use super::*;
    use crate::series::TimePowers;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_longitude_at_j2000() {
        let w1 = moon_mean_longitude();
        assert_relative_eq!(w1.0[0], 218.316_654_36_f64.to_radians(), epsilon = 1e-9);
        // 1 732 559 343.736″ per century
        let per_day = w1.0[1] / 36_525.0;
        assert_relative_eq!(
            per_day.to_degrees(),
            1_732_559_343.736 / 3_600.0 / 36_525.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(per_day.to_degrees(), 13.176_358, epsilon = 1e-6);
    }

    #[test]
    fn test_delaunay_arguments() {
        let [d, l_sun, l, f] = delaunay_arguments();
        let t = TimePowers::new(0.0);
        let w1 = moon_mean_longitude().value(&t);
        let earth = earth_mean_longitude().value(&t);
        assert_relative_eq!(d.value(&t), w1 - earth + std::f64::consts::PI, epsilon = 1e-14);
        assert_relative_eq!(
            l_sun.value(&t),
            earth - earth_perihelion().value(&t),
            epsilon = 1e-14
        );
        assert_relative_eq!(l.value(&t), w1 - moon_perigee().value(&t), epsilon = 1e-14);
        assert_relative_eq!(f.value(&t), w1 - moon_node().value(&t), epsilon = 1e-14);
        // F advances by roughly 483202 degrees per century
        assert_relative_eq!(f.0[1].to_degrees(), 483_202.017, epsilon = 0.01);
    }

    #[test]
    fn test_zeta_rate() {
        let z = zeta();
        let w1 = moon_mean_longitude();
        assert_eq!(z.0[0], w1.0[0]);
        assert_relative_eq!(z.0[1] - w1.0[1], 5_029.096_6 * RADSEC, epsilon = 1e-12);
        assert_eq!(z.0[2], 0.0);
    }

    #[test]
    fn test_delaunay_phase() {
        let arguments = LunarArguments::default();
        let phase = arguments.delaunay_phase(270.0, &[1, 0, 0, 1, 0]);
        let expected = (arguments.zeta + arguments.delaunay[2]).linear_part();
        assert_relative_eq!(phase.0[0], expected.0[0] + 270f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(phase.0[1], expected.0[1], epsilon = 1e-9);
        assert_eq!(&phase.0[2..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_planetary_phase_layouts() {
        let arguments = LunarArguments::default();
        let [d, l_sun, l, f] = arguments.delaunay;
        let p = arguments.planets;

        let first = arguments.planetary_phase(10, 0.0, &[0, 18, -16, 0, 0, 0, 0, 0, 1, -1, 0]);
        let expected = (p[1] * 18.0 + p[2] * -16.0 + d + l * -1.0).linear_part();
        assert_relative_eq!(first.0[0], expected.0[0], epsilon = 1e-9);
        assert_relative_eq!(first.0[1], expected.0[1], epsilon = 1e-6);

        let second = arguments.planetary_phase(16, 90.0, &[0, 0, 1, 0, 0, 0, 0, 2, 1, 0, -1]);
        let expected = (p[2] + d * 2.0 + l_sun + f * -1.0).linear_part();
        assert_relative_eq!(
            second.0[0],
            expected.0[0] + std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );
        assert_relative_eq!(second.0[1], expected.0[1], epsilon = 1e-6);
    }

    #[test]
    fn test_main_problem_correction() {
        let corrections = MainProblemCorrections::default();
        let row = [22_639.585_78, -0.03, 4_586_438.71, -6.92, -20.44, 0.0, -0.17];

        let longitude = corrections.corrected_amplitude(&row, false);
        let expected = row[0]
            + (row[1] + corrections.dtasm * row[5]) * (corrections.delnp - corrections.am * corrections.delnu)
            + row[2] * corrections.delg
            + row[3] * corrections.dele
            + row[4] * corrections.delep;
        assert_relative_eq!(longitude, expected, max_relative = 1e-15);
        // the Γ partial dominates: 4586438.71 × (−0.08066″ in rad)
        assert_relative_eq!(longitude - row[0], -1.7936, epsilon = 1e-3);

        let distance = corrections.corrected_amplitude(&row, true);
        assert_relative_eq!(
            distance,
            longitude - 2.0 * row[0] * corrections.delnu / 3.0,
            max_relative = 1e-15
        );
    }
}
