//! # Constants and type definitions for Orrery
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! aliases** used throughout the `orrery` library.
//!
//! ## Overview
//!
//! - Time scale anchors (J2000, days per century / millennium)
//! - Unit conversions (degrees ↔ radians, arcseconds ↔ radians, AU ↔ km)
//! - Gravitational parameters of the bodies of the default sun/earth/moon hierarchy
//! - Core type aliases used across the crate
//!
//! The working units of the body hierarchy are **kilometers** and **seconds**
//! (TT seconds elapsed since J2000.0). Gravitational weights ("garam") are
//! `G·M` products in km³/s², so that `sqrt(garam / a³)` is a mean motion in rad/s.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Number of days in a Julian millennium
pub const DAYS_PER_MILLENNIUM: f64 = 365_250.0;

/// Julian Date of J2000.0 (2000-01-01 12:00:00 TT)
pub const JD_J2000: f64 = 2_451_545.0;

/// Astronomical Unit in kilometers, as used by the VSOP2013 solution
pub const AU: f64 = 0.149_597_870_691e9;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648_000.0;

/// Mean obliquity of the ecliptic at J2000 in degrees
pub const OBLIQUITY_J2000: Degree = 23.439_281_1;

/// Heliocentric gravitational constant (km³/s²)
pub const GM_SUN: Garam = 1.327_124_400_19e11;

/// Geocentric gravitational constant (km³/s²)
pub const GM_EARTH: Garam = 3.986_004_419e5;

/// Selenocentric gravitational constant (km³/s²)
pub const GM_MOON: Garam = 4.904_869_6e3;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Simulation time: TT seconds elapsed since J2000.0
pub type Second = f64;
/// Gravitational weight of a body (`G·M`, km³/s²), only ever used in ratios and sums
pub type Garam = f64;
