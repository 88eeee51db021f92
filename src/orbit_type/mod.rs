//! # Orbital element representations
//!
//! This module defines the element sets produced and consumed by the ephemeris engine:
//!
//! - [`keplerian_element`](crate::orbit_type::keplerian_element): Classical Keplerian elements `(a, e, i, Ω, ω, M)`,
//!   the representation propagated by every [`Orbit`](crate::orbit::Orbit).
//! - [`equinoctial_element`](crate::orbit_type::equinoctial_element): Equinoctial elements `(a, λ, k, h, q, p)`,
//!   the **non-singular** variables evaluated by the planetary theory.
//!
//! ## Typical workflow
//!
//! ```rust, no_run
//! use orrery::orbit_type::{
//!     equinoctial_element::EquinoctialElements, keplerian_element::KeplerianElements,
//! };
//!
//! let equ = EquinoctialElements {
//!     reference_epoch: 0.0,
//!     semi_major_axis: 1.496e8,
//!     mean_longitude: 1.75,
//!     eccentricity_cos_lon: -0.0037,
//!     eccentricity_sin_lon: 0.0163,
//!     sin_half_incl_cos_node: 0.0,
//!     sin_half_incl_sin_node: 0.0,
//! };
//! let kep = KeplerianElements::from(&equ);
//! let position = kep.position_at(0.0, 1.327e11);
//! println!("|r| = {} km", position.norm());
//! ```

/// Equinoctial orbital elements and their conversion to Keplerian elements.
pub mod equinoctial_element;

/// Classical Keplerian elements structure and utilities.
pub mod keplerian_element;
