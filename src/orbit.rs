//! # Orbits driven by an element source
//!
//! An [`Orbit`] pairs the current osculating [`KeplerianElements`] of a satellite with the
//! combined gravitational weight `μ` of the two orbiting bodies and the
//! [`ElementSource`] that re-derives those elements at every simulation step.
//!
//! Element sources in this crate:
//!
//! - [`PlanetaryTheory`](crate::planetary::PlanetaryTheory) – VSOP2013 equinoctial variables.
//! - [`LunarTheory`](crate::lunar::LunarTheory) – ELP2000-82B state vector, re-fitted into elements.
//! - [`KeplerianElements`] itself – fixed, unperturbed two-body elements.
//!
//! Sources are immutable after construction and are shared by [`Arc`] between every orbit
//! that references them.

use std::{fmt, sync::Arc};

use nalgebra::Vector3;

use crate::{
    constants::{Garam, Second},
    orbit_type::keplerian_element::KeplerianElements,
};

/// Anything able to produce osculating Keplerian elements at a given simulation time.
pub trait ElementSource: fmt::Debug + Send + Sync {
    /// Osculating elements at `time`.
    ///
    /// Arguments
    /// ---------
    /// * `time`: simulation seconds since J2000 (TT).
    /// * `combined_weight`: `μ` of the two orbiting bodies (km³/s²), used by sources that
    ///   fit elements from a state vector.
    ///
    /// Return
    /// ------
    /// * The elements, with `reference_epoch` set to the epoch they are valid at.
    fn elements_at(&self, time: Second, combined_weight: Garam) -> KeplerianElements;
}

impl ElementSource for KeplerianElements {
    fn elements_at(&self, _time: Second, _combined_weight: Garam) -> KeplerianElements {
        self.clone()
    }
}

/// A satellite orbit: element source, cached elements and combined weight.
#[derive(Debug, Clone)]
pub struct Orbit {
    source: Arc<dyn ElementSource>,
    elements: Option<KeplerianElements>,
    combined_weight: Garam,
}

impl Orbit {
    /// Create an orbit around nothing yet; the combined weight is set when the orbit is
    /// bound to a satellite in a [`BodyTree`](crate::body_system::BodyTree).
    pub fn new(source: Arc<dyn ElementSource>) -> Self {
        Orbit {
            source,
            elements: None,
            combined_weight: 0.0,
        }
    }

    /// Orbit with fixed two-body elements.
    pub fn fixed(elements: KeplerianElements) -> Self {
        Orbit::new(Arc::new(elements))
    }

    pub fn combined_weight(&self) -> Garam {
        self.combined_weight
    }

    pub(crate) fn set_combined_weight(&mut self, combined_weight: Garam) {
        self.combined_weight = combined_weight;
    }

    /// Elements computed by the last [`Orbit::update_from_time`], if any.
    pub fn elements(&self) -> Option<&KeplerianElements> {
        self.elements.as_ref()
    }

    pub fn source(&self) -> &Arc<dyn ElementSource> {
        &self.source
    }

    /// Re-derive the elements from the source at `time` and return the satellite position
    /// relative to the focus at that time.
    pub fn update_from_time(&mut self, time: Second) -> Vector3<f64> {
        let elements = self.source.elements_at(time, self.combined_weight);
        let position = elements.position_at(time, self.combined_weight);
        self.elements = Some(elements);
        position
    }

    /// Propagate the cached elements to `time` without querying the source.
    ///
    /// Return
    /// ------
    /// * `None` if the orbit has never been updated.
    pub fn position_at(&self, time: Second) -> Option<Vector3<f64>> {
        self.elements
            .as_ref()
            .map(|elements| elements.position_at(time, self.combined_weight))
    }
}
