//! # ELP2000-82B coefficient tables
//!
//! The lunar solution is distributed as 36 whitespace-separated files `ELP1` … `ELP36`.
//! Each file starts with a one-line title, then one row per term. Rows mix integer
//! argument multipliers and floating coefficients, in one of three shapes:
//!
//! | files | family | integers | floats |
//! |---|---|---|---|
//! | 1–3 | [`TableFamily::Main`] | 4 Delaunay multipliers | amplitude + 6 partial derivatives |
//! | 4–9, 22–36 | [`TableFamily::Delaunay`] | ζ + 4 Delaunay multipliers | phase (deg), amplitude, period |
//! | 10–21 | [`TableFamily::Planetary`] | 11 planetary/Delaunay multipliers | phase (deg), amplitude, period |
//!
//! Negative numbers are frequently glued to the previous field (`0 18-16  0`), so a
//! `-` always starts a new token.
//!
//! Files come in triplets: file `n` feeds longitude, latitude or distance according to
//! `(n − 1) mod 3`.

use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use camino::Utf8Path;
use log::debug;

use crate::orrery_errors::OrreryError;

/// Number of files in the lunar solution.
pub const NUM_TABLES: usize = 36;

/// Column layout of an ELP file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFamily {
    /// Main problem (files 1–3).
    Main,
    /// Perturbations with Delaunay arguments and ζ (files 4–9 and 22–36).
    Delaunay,
    /// Planetary perturbations (files 10–21).
    Planetary,
}

impl TableFamily {
    pub fn of_file(file_number: usize) -> Self {
        match file_number {
            1..=3 => TableFamily::Main,
            10..=21 => TableFamily::Planetary,
            _ => TableFamily::Delaunay,
        }
    }

    pub fn int_count(self) -> usize {
        match self {
            TableFamily::Main => 4,
            TableFamily::Delaunay => 5,
            TableFamily::Planetary => 11,
        }
    }

    pub fn float_count(self) -> usize {
        match self {
            TableFamily::Main => 7,
            TableFamily::Delaunay | TableFamily::Planetary => 3,
        }
    }
}

/// Ecliptic coordinate fed by a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunarCoordinate {
    Longitude = 0,
    Latitude = 1,
    Distance = 2,
}

/// One row of an ELP file.
#[derive(Debug, Clone, PartialEq)]
pub struct ElpRow {
    pub multipliers: Vec<i32>,
    pub coefficients: Vec<f64>,
}

/// A parsed ELP file.
#[derive(Debug, Clone, PartialEq)]
pub struct ElpTable {
    pub file_number: usize,
    pub rows: Vec<ElpRow>,
}

impl ElpTable {
    /// File name of table `file_number`, e.g. `ELP17`.
    pub fn file_name(file_number: usize) -> String {
        format!("ELP{file_number}")
    }

    pub fn name(&self) -> String {
        ElpTable::file_name(self.file_number)
    }

    pub fn family(&self) -> TableFamily {
        TableFamily::of_file(self.file_number)
    }

    pub fn coordinate(&self) -> LunarCoordinate {
        match self.file_number.saturating_sub(1) % 3 {
            0 => LunarCoordinate::Longitude,
            1 => LunarCoordinate::Latitude,
            _ => LunarCoordinate::Distance,
        }
    }

    /// Power of τ multiplying the whole table.
    pub fn time_power(&self) -> usize {
        match self.file_number.saturating_sub(1) / 3 {
            2 | 4 | 6 | 8 => 1,
            11 => 2,
            _ => 0,
        }
    }

    /// Parse one ELP file.
    ///
    /// Arguments
    /// ---------
    /// * `reader`: file content; the first line is a title and is skipped.
    /// * `file_number`: 1 to 36, selects the column layout.
    ///
    /// Return
    /// ------
    /// * The table, or [`OrreryError::TableFormat`] on a malformed row,
    ///   [`OrreryError::EmptyTable`] if the file holds no row.
    pub fn from_reader<R: BufRead>(reader: R, file_number: usize) -> Result<Self, OrreryError> {
        let name = ElpTable::file_name(file_number);
        let family = TableFamily::of_file(file_number);
        let mut rows = Vec::new();

        for (index, line) in reader.lines().enumerate().skip(1) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            rows.push(parse_row(&name, index + 1, &line, family)?);
        }

        if rows.is_empty() {
            return Err(OrreryError::EmptyTable(name));
        }
        debug!("{name}: {} rows", rows.len());
        Ok(ElpTable { file_number, rows })
    }

    /// Read table `file_number` from `directory`.
    pub fn from_directory(directory: &Utf8Path, file_number: usize) -> Result<Self, OrreryError> {
        let path = directory.join(ElpTable::file_name(file_number));
        if !path.is_file() {
            return Err(OrreryError::TableNotFound(path));
        }
        ElpTable::from_reader(BufReader::new(File::open(&path)?), file_number)
    }
}

fn parse_row(
    table: &str,
    line_number: usize,
    line: &str,
    family: TableFamily,
) -> Result<ElpRow, OrreryError> {
    let format_error = |reason: String| OrreryError::TableFormat {
        table: table.to_string(),
        line: line_number,
        reason,
    };

    let spaced = line.replace('-', " -");
    let mut tokens = spaced.split_whitespace();
    let mut next_token = |kind: &str| {
        tokens
            .next()
            .ok_or_else(|| format_error(format!("missing {kind} field")))
    };

    let multipliers = (0..family.int_count())
        .map(|_| {
            let token = next_token("integer")?;
            token
                .parse::<i32>()
                .map_err(|_| format_error(format!("invalid integer {token:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let coefficients = (0..family.float_count())
        .map(|_| {
            let token = next_token("coefficient")?;
            token
                .parse::<f64>()
                .map_err(|_| format_error(format!("invalid coefficient {token:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ElpRow {
        multipliers,
        coefficients,
    })
}

/// Read all 36 tables from `directory`, failing on the first missing or malformed file.
pub fn load_tables(directory: &Utf8Path) -> Result<Vec<ElpTable>, OrreryError> {
    (1..=NUM_TABLES)
        .map(|file_number| ElpTable::from_directory(directory, file_number))
        .collect()
}

#[cfg(test)]
mod tables_test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_families() {
        assert_eq!(TableFamily::of_file(1), TableFamily::Main);
        assert_eq!(TableFamily::of_file(3), TableFamily::Main);
        assert_eq!(TableFamily::of_file(4), TableFamily::Delaunay);
        assert_eq!(TableFamily::of_file(10), TableFamily::Planetary);
        assert_eq!(TableFamily::of_file(21), TableFamily::Planetary);
        assert_eq!(TableFamily::of_file(22), TableFamily::Delaunay);
        assert_eq!(TableFamily::of_file(36), TableFamily::Delaunay);
    }

    #[test]
    fn test_coordinates_and_powers() {
        let table = |file_number| ElpTable {
            file_number,
            rows: vec![],
        };
        assert_eq!(table(1).coordinate(), LunarCoordinate::Longitude);
        assert_eq!(table(17).coordinate(), LunarCoordinate::Latitude);
        assert_eq!(table(36).coordinate(), LunarCoordinate::Distance);

        let powers: Vec<usize> = (1..=NUM_TABLES).map(|n| table(n).time_power()).collect();
        assert_eq!(
            powers,
            [
                0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1,
                0, 0, 0, 0, 0, 0, 2, 2, 2
            ]
        );
    }

    #[test]
    fn test_parse_main_table() {
        let content = " MAIN PROBLEM. LONGITUDE (1)\n\
            \x20  0   0   0   2   -411.60287    168.48   -18433.81   -121.62      0.40     -0.18     -0.00\n\
            \x20  0   0   1   0  22639.58578    -0.03  4586438.71    -6.92    -20.44      0.00     -0.17\n";
        let table = ElpTable::from_reader(Cursor::new(content), 1).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].multipliers, vec![0, 0, 0, 2]);
        assert_eq!(table.rows[0].coefficients[0], -411.60287);
        assert_eq!(table.rows[1].coefficients[2], 4_586_438.71);
        assert_eq!(table.rows[1].coefficients.len(), 7);
    }

    #[test]
    fn test_glued_negative_fields() {
        let content = "PLANETARY PERTURBATIONS. TABLE 1. LONGITUDE (10)\n\
            \x20 0 18-16  0  0  0  0  0  1 -1  0  259.25749  0.00105      0.36\n";
        let table = ElpTable::from_reader(Cursor::new(content), 10).unwrap();
        assert_eq!(
            table.rows[0].multipliers,
            vec![0, 18, -16, 0, 0, 0, 0, 0, 1, -1, 0]
        );
        assert_eq!(table.rows[0].coefficients, vec![259.25749, 0.00105, 0.36]);
    }

    #[test]
    fn test_malformed_rows() {
        let missing = "title\n  0  0  0  0  1  270.00000\n";
        assert!(matches!(
            ElpTable::from_reader(Cursor::new(missing), 4),
            Err(OrreryError::TableFormat { line: 2, .. })
        ));

        let invalid = "title\n  0  0  0  0  1  270.00000   0.00003     0.075\n  0  x  0  0  1  1.0 1.0 1.0\n";
        let err = ElpTable::from_reader(Cursor::new(invalid), 4).unwrap_err();
        assert_eq!(
            err,
            OrreryError::TableFormat {
                table: "ELP4".into(),
                line: 3,
                reason: "invalid integer \"x\"".into()
            }
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            ElpTable::from_reader(Cursor::new("title only\n"), 5).unwrap_err(),
            OrreryError::EmptyTable("ELP5".into())
        );
    }

    #[test]
    fn test_missing_directory() {
        let directory = Utf8Path::new("/nonexistent/elp");
        assert_eq!(
            load_tables(directory).unwrap_err(),
            OrreryError::TableNotFound(directory.join("ELP1"))
        );
    }
}
