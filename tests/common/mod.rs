#![allow(dead_code)]

use std::fs;

use approx::assert_relative_eq;
use camino::Utf8Path;
use orrery::orbit_type::keplerian_element::KeplerianElements;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_orbit_close(actual: &KeplerianElements, expected: &KeplerianElements, epsilon: f64) {
    assert_relative_eq!(
        actual.reference_epoch,
        expected.reference_epoch,
        epsilon = epsilon
    );
    assert_relative_eq!(
        actual.semi_major_axis,
        expected.semi_major_axis,
        max_relative = epsilon
    );
    assert_relative_eq!(
        actual.eccentricity,
        expected.eccentricity,
        epsilon = epsilon
    );
    assert_relative_eq!(actual.inclination, expected.inclination, epsilon = epsilon);
    assert_relative_eq!(
        actual.ascending_node_longitude,
        expected.ascending_node_longitude,
        epsilon = epsilon
    );
}

pub fn circular(radius: f64, inclination: f64) -> KeplerianElements {
    KeplerianElements {
        reference_epoch: 0.0,
        semi_major_axis: radius,
        eccentricity: 0.0,
        inclination,
        ascending_node_longitude: 0.7,
        periapsis_argument: 0.0,
        mean_anomaly: 0.0,
    }
}

// -------------------------------------------------------------------------------------------------
// Synthetic coefficient tables
// -------------------------------------------------------------------------------------------------

const VSOP_LAYOUT: [(usize, usize); 17] = [
    (0, 3),
    (0, 3),
    (0, 3),
    (0, 3),
    (1, 3),
    (0, 3),
    (0, 3),
    (0, 3),
    (0, 3),
    (1, 4),
    (0, 4),
    (0, 4),
    (0, 4),
    (1, 6),
    (1, 3),
    (0, 3),
    (0, 3),
];

fn vsop_header(variable: i64, exponent: usize, term_count: usize) -> String {
    format!(
        "{:<12}{variable:>3}{exponent:>3}{term_count:>7}",
        " VSOP2013  3"
    )
}

fn vsop_amplitude(value: f64) -> String {
    if value == 0.0 {
        return format!("{:>20.16} {:+03}", 0.0, 0);
    }
    let exponent = value.abs().log10().floor() as i32 + 1;
    format!("{:>20.16} {:+03}", value / 10f64.powi(exponent), exponent)
}

fn vsop_term(index: usize, multipliers: [i32; 17], s: f64, c: f64) -> String {
    let mut line = format!("{index:>6}");
    for (m, (blank, width)) in multipliers.iter().zip(VSOP_LAYOUT) {
        line.push_str(&" ".repeat(blank));
        line.push_str(&format!("{m:>width$}"));
    }
    line.push_str(&vsop_amplitude(s));
    line.push_str(&vsop_amplitude(c));
    line
}

/// Earth-Moon barycenter-like VSOP2013 table: 1 AU, Earth eccentricity, small inclination.
pub fn planetary_table() -> String {
    let mut earth = [0; 17];
    earth[2] = 1;
    let mut jupiter = [0; 17];
    jupiter[4] = 1;
    [
        vsop_header(1, 0, 1),
        vsop_term(1, [0; 17], 0.0, 1.000_001_02),
        vsop_header(2, 0, 2),
        vsop_term(1, [0; 17], 0.0, 1.753_470_369_433),
        vsop_term(2, jupiter, 2.0e-6, -1.0e-6),
        vsop_header(2, 1, 1),
        vsop_term(1, [0; 17], 0.0, 6_283.075_850_353_215),
        vsop_header(3, 0, 1),
        vsop_term(1, [0; 17], 0.0, -0.003_740_816),
        vsop_header(4, 0, 1),
        vsop_term(1, [0; 17], 0.0, 0.016_284_477),
        vsop_header(5, 1, 1),
        vsop_term(1, [0; 17], 0.0, -0.000_113_5),
        vsop_header(6, 1, 1),
        vsop_term(1, earth, 0.0, 0.001_018_4),
    ]
    .join("\n")
}

fn elp_row(multipliers: &[i32], coefficients: &[f64]) -> String {
    let ints: String = multipliers.iter().map(|m| format!("{m:>3}")).collect();
    let floats: String = coefficients.iter().map(|c| format!("{c:>15.5}")).collect();
    format!("{ints}{floats}")
}

/// ELP2000-82B-like tables: the largest main problem terms and one small term per
/// perturbation file.
pub fn lunar_table(file_number: usize) -> String {
    let zeros = [0.0; 6];
    let main = |multipliers: &[i32], amplitude: f64| {
        let mut coefficients = vec![amplitude];
        coefficients.extend_from_slice(&zeros);
        elp_row(multipliers, &coefficients)
    };
    let rows = match file_number {
        1 => vec![
            main(&[0, 0, 1, 0], 22_639.585_78),
            main(&[2, 0, -1, 0], 4_586.438_49),
            main(&[2, 0, 0, 0], 2_369.911_94),
            main(&[0, 1, 0, 0], -666.417_86),
            main(&[0, 0, 0, 2], -411.602_87),
        ],
        2 => vec![
            main(&[0, 0, 0, 1], 18_461.400_00),
            main(&[0, 0, 1, 1], 1_010.180_00),
            main(&[0, 0, 1, -1], 999.700_00),
        ],
        3 => vec![
            main(&[0, 0, 0, 0], 385_000.527_19),
            main(&[0, 0, 1, 0], -20_905.322_06),
            main(&[2, 0, -1, 0], -3_699.104_68),
            main(&[2, 0, 0, 0], -2_955.967_56),
        ],
        10..=21 => vec![elp_row(
            &[0, 18, -16, 0, 0, 0, 0, 0, 1, -1, 0],
            &[26.542_61, 0.001_05, 0.36],
        )],
        _ => vec![elp_row(&[0, 0, 0, 0, 1], &[270.0, 0.003_04, 0.075])],
    };
    format!("ELP2000-82B TABLE {file_number}\n{}\n", rows.join("\n"))
}

/// Write `VSOP2013p3.dat` and `ELP1` … `ELP36` into `directory`.
pub fn write_tables(directory: &Utf8Path) {
    fs::write(directory.join("VSOP2013p3.dat"), planetary_table()).unwrap();
    for file_number in 1..=36 {
        fs::write(
            directory.join(format!("ELP{file_number}")),
            lunar_table(file_number),
        )
        .unwrap();
    }
}
