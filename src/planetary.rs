//! # VSOP2013 planetary theory
//!
//! Evaluates the six equinoctial variables of one VSOP2013 body table and converts them
//! into the Keplerian elements consumed by an [`Orbit`](crate::orbit::Orbit).
//!
//! ## Table layout
//!
//! A table is a sequence of blocks. Each block starts with a header line
//!
//! | columns (0-based) | content |
//! |---|---|
//! | `12..15` | variable index, 1 to 6 (a, λ, k, h, q, p) |
//! | `15..18` | power `α` of τ multiplying the block |
//! | `18..25` | number of term lines that follow |
//!
//! followed by term lines, each holding 17 integer multipliers of the fundamental
//! angles and two amplitudes written as a 20-column mantissa and a 3-column decimal
//! exponent (`S·10^e`, `C·10^e`):
//!
//! ```text
//! cols  6..18   4 × i3   Mercury .. Mars
//!       19..34  5 × i3   Jupiter .. Pluto
//!       35..51  4 × i4   Delaunay D, F, l, Moon λ
//!       52..58  1 × i6   μ (precession)
//!       59..68  3 × i3   ζ-type arguments
//!       68..88  S mantissa,   89..92 S exponent
//!       92..112 C mantissa,  113..116 C exponent
//! ```
//!
//! ## Units
//!
//! τ is measured in Julian millennia (365 250 days) from J2000. The semi-major axis is
//! tabulated in AU and returned in kilometers.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    str::FromStr,
};

use camino::Utf8Path;
use log::{debug, info};

use crate::{
    constants::{Garam, Second, AU, DAYS_PER_MILLENNIUM, SECONDS_PER_DAY},
    orbit::ElementSource,
    orbit_type::{
        equinoctial_element::EquinoctialElements, keplerian_element::KeplerianElements,
    },
    orrery_errors::OrreryError,
    series::{compute_all, derivative_all, HarmonicSeries, PeriodicTerm, PhasePolynomial, TimePowers},
};

/// Number of fundamental angles of the VSOP2013 solution.
pub const NUM_ANGLES: usize = 17;

/// Number of equinoctial variables per body.
pub const NUM_VARIABLES: usize = 6;

/// Value of the fundamental angles at J2000 (radians).
const ANGLE_CONSTANT: [f64; NUM_ANGLES] = [
    0.440_260_863_166_900_0e1,
    0.317_613_446_157_600_0e1,
    0.175_347_036_943_300_0e1,
    0.620_350_001_414_100_0e1,
    0.409_136_000_305_000_0e1,
    0.171_374_071_917_300_0e1,
    0.559_864_129_228_700_0e1,
    0.280_513_636_040_800_0e1,
    0.232_698_973_462_000_0e1,
    0.599_546_107_035_000_0e0,
    0.874_018_510_107_000_0e0,
    0.548_122_539_566_300_0e1,
    0.531_189_793_316_400_0e1,
    0.0,
    5.198_466_400_63,
    1.627_905_136_02,
    2.355_555_638_75,
];

/// Rate of the fundamental angles (radians per Julian millennium).
const ANGLE_RATE: [f64; NUM_ANGLES] = [
    0.260_879_031_406_855_5e5,
    0.102_132_855_474_344_5e5,
    0.628_307_585_035_321_5e4,
    0.334_061_243_414_545_7e4,
    0.173_117_045_272_185_5e4,
    0.170_445_085_502_720_1e4,
    0.142_894_891_784_427_3e4,
    0.136_475_651_362_999_0e4,
    0.136_192_320_763_284_2e4,
    0.529_690_961_562_325_0e3,
    0.213_299_086_108_488_0e3,
    0.747_816_590_307_780_0e2,
    0.381_329_722_261_250_0e2,
    0.359_536_228_504_930_9e0,
    77_713.771_448_180_4,
    84_334.661_571_783_7,
    83_286.914_247_714_7,
];

/// Width of each integer multiplier field, with the number of blank columns before it.
const MULTIPLIER_LAYOUT: [(usize, usize); NUM_ANGLES] = [
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

/// Column at which the first multiplier starts.
const FIRST_MULTIPLIER_COLUMN: usize = 6;

/// Convert simulation seconds since J2000 into Julian millennia.
pub fn millennia_since_j2000(time: Second) -> f64 {
    time / SECONDS_PER_DAY / DAYS_PER_MILLENNIUM
}

/// Fixed-width reader over one table line.
struct LineCursor<'a> {
    table: &'a str,
    line_number: usize,
    line: &'a str,
    column: usize,
}

impl<'a> LineCursor<'a> {
    fn new(table: &'a str, line_number: usize, line: &'a str, column: usize) -> Self {
        LineCursor {
            table,
            line_number,
            line,
            column,
        }
    }

    fn error(&self, reason: String) -> OrreryError {
        OrreryError::TableFormat {
            table: self.table.to_string(),
            line: self.line_number,
            reason,
        }
    }

    fn skip(&mut self, width: usize) {
        self.column += width;
    }

    fn take_str(&mut self, width: usize) -> Result<&'a str, OrreryError> {
        let range = self.column..self.column + width;
        let field = self.line.get(range.clone()).ok_or_else(|| {
            self.error(format!(
                "line too short: expected a field at columns {range:?}, line has {} bytes",
                self.line.len()
            ))
        })?;
        self.column += width;
        Ok(field.trim())
    }

    fn take<T: FromStr>(&mut self, width: usize) -> Result<T, OrreryError> {
        let start = self.column;
        let field = self.take_str(width)?;
        field.parse::<T>().map_err(|_| {
            self.error(format!(
                "invalid numeric field {field:?} at columns {start}..{}",
                start + width
            ))
        })
    }

    /// Amplitude written as a 20-column mantissa, a blank, and a 3-column exponent.
    fn take_amplitude(&mut self) -> Result<f64, OrreryError> {
        let mantissa: f64 = self.take(20)?;
        self.skip(1);
        let exponent: i32 = self.take(3)?;
        Ok(mantissa * 10f64.powi(exponent))
    }
}

/// One parsed term line.
struct TableTerm {
    multipliers: [i32; NUM_ANGLES],
    sin_amplitude: f64,
    cos_amplitude: f64,
}

impl TableTerm {
    fn parse(table: &str, line_number: usize, line: &str) -> Result<Self, OrreryError> {
        let mut cursor = LineCursor::new(table, line_number, line, FIRST_MULTIPLIER_COLUMN);
        let mut multipliers = [0; NUM_ANGLES];
        for (multiplier, (blank, width)) in multipliers.iter_mut().zip(MULTIPLIER_LAYOUT) {
            cursor.skip(blank);
            *multiplier = cursor.take(width)?;
        }
        let sin_amplitude = cursor.take_amplitude()?;
        let cos_amplitude = cursor.take_amplitude()?;
        Ok(TableTerm {
            multipliers,
            sin_amplitude,
            cos_amplitude,
        })
    }

    /// Collapse the integer combination of linear angles into a single linear phase.
    fn into_periodic_term(self) -> PeriodicTerm {
        let (constant, rate) = self
            .multipliers
            .iter()
            .zip(ANGLE_CONSTANT.iter().zip(ANGLE_RATE.iter()))
            .fold((0.0, 0.0), |(c, r), (&m, (&c0, &r0))| {
                (c + m as f64 * c0, r + m as f64 * r0)
            });
        PeriodicTerm {
            sin_amplitude: self.sin_amplitude,
            cos_amplitude: self.cos_amplitude,
            phase: PhasePolynomial::linear(constant, rate),
        }
    }
}

/// Block header: `(variable index 0..6, power of τ, number of terms)`.
fn parse_header(
    table: &str,
    line_number: usize,
    line: &str,
) -> Result<(usize, usize, usize), OrreryError> {
    let mut cursor = LineCursor::new(table, line_number, line, 12);
    let variable: i64 = cursor.take(3)?;
    let exponent: usize = cursor.take(3)?;
    let term_count: usize = cursor.take(7)?;
    if !(1..=NUM_VARIABLES as i64).contains(&variable) {
        return Err(OrreryError::InvalidVariableIndex(variable));
    }
    Ok(((variable - 1) as usize, exponent, term_count))
}

/// A loaded VSOP2013 body solution.
///
/// Immutable after loading; every query is a pure function of time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetaryTheory {
    name: String,
    variables: [Vec<HarmonicSeries>; NUM_VARIABLES],
}

impl PlanetaryTheory {
    /// Parse a VSOP2013 table.
    ///
    /// Arguments
    /// ---------
    /// * `reader`: source of the table lines.
    /// * `name`: table name used in error messages and logs.
    /// * `precision`: a term is kept when `S² + C² > precision`.
    ///
    /// Return
    /// ------
    /// * The theory, or an [`OrreryError`] if the table is malformed, truncated, or empty.
    pub fn from_reader<R: BufRead>(
        reader: R,
        name: &str,
        precision: f64,
    ) -> Result<Self, OrreryError> {
        let mut variables: [Vec<HarmonicSeries>; NUM_VARIABLES] = Default::default();
        let mut lines = reader.lines().enumerate();
        let mut block_count = 0usize;

        while let Some((index, header)) = lines.next() {
            let header = header?;
            if header.trim().is_empty() {
                continue;
            }
            let (variable, exponent, term_count) = parse_header(name, index + 1, &header)?;

            let mut terms = Vec::with_capacity(term_count);
            for expected in 0..term_count {
                let (index, line) = lines.next().ok_or_else(|| OrreryError::TableFormat {
                    table: name.to_string(),
                    line: index + 1 + expected,
                    reason: format!(
                        "unexpected end of table: block announced {term_count} terms, found {expected}"
                    ),
                })?;
                terms.push(TableTerm::parse(name, index + 1, &line?)?.into_periodic_term());
            }

            variables[variable].push(HarmonicSeries::from_terms(exponent, terms, |term| {
                term.squared_amplitude() > precision
            }));
            block_count += 1;
        }

        if block_count == 0 {
            return Err(OrreryError::EmptyTable(name.to_string()));
        }

        let kept: usize = variables.iter().flatten().map(HarmonicSeries::len).sum();
        info!("Loaded planetary theory {name}: {block_count} blocks, {kept} terms kept");

        Ok(PlanetaryTheory {
            name: name.to_string(),
            variables,
        })
    }

    /// Load a VSOP2013 table from disk.
    pub fn from_path(path: &Utf8Path, precision: f64) -> Result<Self, OrreryError> {
        if !path.is_file() {
            return Err(OrreryError::TableNotFound(path.to_path_buf()));
        }
        debug!("Reading planetary table {path}");
        let file = File::open(path)?;
        let name = path.file_name().unwrap_or(path.as_str());
        PlanetaryTheory::from_reader(BufReader::new(file), name, precision)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The six variables `(a [AU], λ, k, h, q, p)` at `tau` Julian millennia from J2000.
    pub fn variables_at(&self, tau: f64) -> [f64; NUM_VARIABLES] {
        let t = TimePowers::new(tau);
        self.variables.each_ref().map(|series| compute_all(series, &t))
    }

    /// Derivatives of [`PlanetaryTheory::variables_at`] with respect to τ (per millennium).
    pub fn variable_rates_at(&self, tau: f64) -> [f64; NUM_VARIABLES] {
        let t = TimePowers::new(tau);
        self.variables
            .each_ref()
            .map(|series| derivative_all(series, &t))
    }

    /// Equinoctial elements at simulation `time`, with the semi-major axis in kilometers.
    pub fn equinoctial_at(&self, time: Second) -> EquinoctialElements {
        let [a, lambda, k, h, q, p] = self.variables_at(millennia_since_j2000(time));
        EquinoctialElements {
            reference_epoch: time,
            semi_major_axis: a * AU,
            mean_longitude: lambda,
            eccentricity_cos_lon: k,
            eccentricity_sin_lon: h,
            sin_half_incl_cos_node: q,
            sin_half_incl_sin_node: p,
        }
    }
}

impl ElementSource for PlanetaryTheory {
    fn elements_at(&self, time: Second, _combined_weight: Garam) -> KeplerianElements {
        KeplerianElements::from(&self.equinoctial_at(time))
    }
}
