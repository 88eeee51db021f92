//! # SolarSystem: simulation façade
//!
//! [`SolarSystem`] ties the pieces together for an embedding application (renderer,
//! camera controller, command-line driver):
//!
//! 1. **Theories** are loaded once from the [`SystemConfig`] through a
//!    [`TheoryCache`](crate::config::TheoryCache); any missing or malformed table aborts
//!    construction.
//! 2. **Hierarchy**: the [`BodyTree`] built from the configuration.
//! 3. **Clock**: the current simulation time, set with [`SolarSystem::update`] or advanced
//!    with [`SolarSystem::step`] (driver seconds scaled by `time_scale`).
//!
//! After each update the façade exposes, for every body, its absolute position and its
//! orientation ([`SolarSystem::snapshot`]), plus the translation that keeps the anchor
//! body at the origin ([`SolarSystem::anchor`]).
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use camino::Utf8Path;
//! use orrery::solar_system::SolarSystem;
//!
//! let mut system = SolarSystem::sun_earth_moon(Utf8Path::new("data")).unwrap();
//! system.step(1.0 / 60.0);
//!
//! let anchor = system.anchor();
//! for body in system.snapshot() {
//!     println!("{}: {}", body.name, body.position + anchor);
//! }
//! ```

use camino::Utf8Path;
use hifitime::Epoch;
use log::info;
use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    body_system::{BodyTree, NodeId},
    config::{SystemConfig, TheoryCache},
    constants::Second,
    orrery_errors::OrreryError,
    time::{epoch_from_seconds, parse_epoch, seconds_since_j2000},
};

/// Position and attitude of one body after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub name: String,
    /// Absolute position (km) in the frame of the hierarchy root.
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

#[derive(Debug, Clone)]
pub struct SolarSystem {
    tree: BodyTree,
    root: NodeId,
    anchor: Option<NodeId>,
    time: Second,
    time_scale: f64,
}

impl SolarSystem {
    /// Load the theories, build the hierarchy and update it at the start epoch.
    ///
    /// Arguments
    /// ---------
    /// * `config`: system description.
    ///
    /// Return
    /// ------
    /// * The updated system, or the first loading / validation error:
    ///   [`OrreryError::UnknownBody`] for an undeclared anchor,
    ///   [`OrreryError::InvalidEpoch`] for an unparsable start epoch.
    pub fn new(config: &SystemConfig) -> Result<Self, OrreryError> {
        let (tree, root) = config.build(&mut TheoryCache::new())?;

        let anchor = config
            .anchor
            .as_deref()
            .map(|name| {
                tree.find(name)
                    .ok_or_else(|| OrreryError::UnknownBody(name.to_string()))
            })
            .transpose()?;

        let start = config
            .start
            .as_deref()
            .map(parse_epoch)
            .transpose()?
            .map_or(0.0, seconds_since_j2000);

        let mut system = SolarSystem {
            tree,
            root,
            anchor,
            time: start,
            time_scale: config.time_scale,
        };
        system.update(start);
        info!(
            "solar system ready at {} ({} bodies)",
            system.epoch(),
            system.tree.bodies().count()
        );
        Ok(system)
    }

    /// Sun, Earth and Moon from the tables in `data_dir`.
    pub fn sun_earth_moon(data_dir: &Utf8Path) -> Result<Self, OrreryError> {
        SolarSystem::new(&SystemConfig::sun_earth_moon(data_dir))
    }

    /// Current simulation time (TT seconds since J2000).
    pub fn time(&self) -> Second {
        self.time
    }

    pub fn epoch(&self) -> Epoch {
        epoch_from_seconds(self.time)
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn tree(&self) -> &BodyTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Move the whole hierarchy to `time`.
    pub fn update(&mut self, time: Second) {
        self.time = time;
        self.tree.update_from_time(time);
    }

    /// Advance the clock by `dt` driver seconds, i.e. `dt · time_scale` simulation seconds.
    pub fn step(&mut self, dt: f64) {
        self.update(self.time + dt * self.time_scale);
    }

    /// Translation bringing the anchor body to the origin; zero without anchor.
    pub fn anchor(&self) -> Vector3<f64> {
        self.anchor
            .and_then(|id| self.tree.anchor(id).ok())
            .unwrap_or_else(Vector3::zeros)
    }

    /// Absolute position of the body called `name`.
    pub fn body_position(&self, name: &str) -> Result<Vector3<f64>, OrreryError> {
        let id = self
            .tree
            .find(name)
            .ok_or_else(|| OrreryError::UnknownBody(name.to_string()))?;
        self.tree.absolute_position(id)
    }

    /// Position and orientation of every body, in declaration order.
    pub fn snapshot(&self) -> Vec<BodyState> {
        self.tree
            .bodies()
            .filter_map(|(id, body)| {
                Some(BodyState {
                    name: body.name().to_string(),
                    position: self.tree.absolute_position(id).ok()?,
                    orientation: body.orientation(),
                })
            })
            .collect()
    }
}
