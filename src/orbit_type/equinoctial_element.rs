use crate::{
    constants::{Kilometer, Radian, Second},
    orbit_type::keplerian_element::KeplerianElements,
};

/// Equinoctial orbital elements, in the layout of the planetary theory variables.
/// Units:
/// - a: km
/// - λ: radians (mean longitude)
/// - k, h: dimensionless (related to eccentricity)
/// - q, p: dimensionless (related to inclination, `sin(i/2)` scaling)
#[derive(Debug, PartialEq, Clone)]
pub struct EquinoctialElements {
    pub reference_epoch: Second,        // Simulation seconds since J2000
    pub semi_major_axis: Kilometer,     // a
    pub mean_longitude: Radian,         // λ = M + ϖ
    pub eccentricity_cos_lon: f64,      // k = e · cos(ϖ)
    pub eccentricity_sin_lon: f64,      // h = e · sin(ϖ)
    pub sin_half_incl_cos_node: f64,    // q = sin(i/2) · cos(Ω)
    pub sin_half_incl_sin_node: f64,    // p = sin(i/2) · sin(Ω)
}

impl EquinoctialElements {
    /// Longitude of periapsis `ϖ = atan2(h, k)`.
    pub fn periapsis_longitude(&self) -> Radian {
        self.eccentricity_sin_lon.atan2(self.eccentricity_cos_lon)
    }

    /// Longitude of the ascending node `Ω = atan2(p, q)`.
    pub fn ascending_node_longitude(&self) -> Radian {
        self.sin_half_incl_sin_node
            .atan2(self.sin_half_incl_cos_node)
    }
}

impl From<&EquinoctialElements> for KeplerianElements {
    /// `i = acos(1 − 2(p² + q²))`, `e = |(k, h)|`, `ω = ϖ − Ω`, `M = λ − ϖ`.
    fn from(equinoctial: &EquinoctialElements) -> Self {
        let ascending_node_longitude = equinoctial.ascending_node_longitude();
        let periapsis_longitude = equinoctial.periapsis_longitude();

        let sin_half_incl_sqr = equinoctial.sin_half_incl_cos_node.powi(2)
            + equinoctial.sin_half_incl_sin_node.powi(2);

        KeplerianElements {
            reference_epoch: equinoctial.reference_epoch,
            semi_major_axis: equinoctial.semi_major_axis,
            eccentricity: (equinoctial.eccentricity_cos_lon.powi(2)
                + equinoctial.eccentricity_sin_lon.powi(2))
            .sqrt(),
            inclination: (1. - 2. * sin_half_incl_sqr).clamp(-1., 1.).acos(),
            ascending_node_longitude,
            periapsis_argument: periapsis_longitude - ascending_node_longitude,
            mean_anomaly: equinoctial.mean_longitude - periapsis_longitude,
        }
    }
}

impl From<EquinoctialElements> for KeplerianElements {
    fn from(equinoctial: EquinoctialElements) -> Self {
        KeplerianElements::from(&equinoctial)
    }
}
