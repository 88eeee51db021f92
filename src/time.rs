//! # Simulation clock conversions
//!
//! The body hierarchy runs on a single scalar clock: TT seconds elapsed since J2000.0
//! (2000-01-01 12:00:00 TT, JD 2451545.0). This module converts between that clock and
//! calendar epochs through [`hifitime`].

use hifitime::{Duration, Epoch, TimeScale};
use std::str::FromStr;

use crate::{
    constants::{Second, JD_J2000, SECONDS_PER_DAY},
    orrery_errors::OrreryError,
};

/// Offset between Julian Date and Modified Julian Date.
const MJD_OFFSET: f64 = 2_400_000.5;

/// J2000.0 reference epoch in TT.
pub fn j2000() -> Epoch {
    Epoch::from_mjd_in_time_scale(JD_J2000 - MJD_OFFSET, TimeScale::TT)
}

/// TT seconds elapsed between J2000.0 and `epoch`.
pub fn seconds_since_j2000(epoch: Epoch) -> Second {
    (epoch - j2000()).to_seconds()
}

/// Epoch (TT) reached `seconds` after J2000.0.
pub fn epoch_from_seconds(seconds: Second) -> Epoch {
    j2000() + Duration::from_seconds(seconds)
}

/// Simulation time of a Gregorian TT calendar date.
///
/// Arguments
/// ---------
/// * `year`, `month`, `day`: calendar date.
/// * `hour`, `minute`, `second`: time of day, TT.
///
/// Return
/// ------
/// * TT seconds since J2000.0.
pub fn seconds_from_gregorian(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Second {
    let epoch = Epoch::from_gregorian(year, month, day, hour, minute, second, 0, TimeScale::TT);
    seconds_since_j2000(epoch)
}

/// Simulation time of a Julian Date expressed in TT.
pub fn seconds_from_julian_date(jd: f64) -> Second {
    (jd - JD_J2000) * SECONDS_PER_DAY
}

/// Parse a calendar string such as `2017-11-04T12:00:00 TT`.
///
/// Strings without an explicit time scale are read as UTC, as hifitime does.
///
/// Return
/// ------
/// * The epoch, or [`OrreryError::InvalidEpoch`] holding the rejected string.
pub fn parse_epoch(text: &str) -> Result<Epoch, OrreryError> {
    Epoch::from_str(text.trim()).map_err(|_| OrreryError::InvalidEpoch(text.to_string()))
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_j2000_is_zero() {
        assert_eq!(seconds_since_j2000(j2000()), 0.0);
        assert_relative_eq!(seconds_from_gregorian(2000, 1, 1, 12, 0, 0), 0.0, epsilon = 1e-6);
        assert_eq!(seconds_from_julian_date(JD_J2000), 0.0);
    }

    #[test]
    fn test_gregorian_offsets() {
        // one day later
        assert_relative_eq!(
            seconds_from_gregorian(2000, 1, 2, 12, 0, 0),
            SECONDS_PER_DAY,
            epsilon = 1e-6
        );
        // 2017-11-04 12:00 is 6517 days after J2000
        assert_relative_eq!(
            seconds_from_gregorian(2017, 11, 4, 12, 0, 0),
            6517.0 * SECONDS_PER_DAY,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            seconds_from_gregorian(2000, 1, 1, 0, 0, 0),
            -43_200.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_julian_date() {
        assert_relative_eq!(
            seconds_from_julian_date(2_469_000.5),
            17_455.5 * SECONDS_PER_DAY
        );
    }

    #[test]
    fn test_round_trip() {
        let seconds = 5.63e8;
        let epoch = epoch_from_seconds(seconds);
        assert_relative_eq!(seconds_since_j2000(epoch), seconds, epsilon = 1e-6);
        assert_eq!(epoch.time_scale, TimeScale::TT);
    }

    #[test]
    fn test_parse_epoch() {
        let epoch = parse_epoch("2017-11-04T12:00:00 TT").unwrap();
        assert_relative_eq!(
            seconds_since_j2000(epoch),
            seconds_from_gregorian(2017, 11, 4, 12, 0, 0),
            epsilon = 1e-6
        );

        assert_eq!(
            parse_epoch("yesterday at noon").unwrap_err(),
            OrreryError::InvalidEpoch("yesterday at noon".into())
        );
    }
}
