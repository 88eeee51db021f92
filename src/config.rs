//! # System description
//!
//! A [`SystemConfig`] describes the bodies of a simulation, how they nest into systems,
//! which theory drives each orbit and where the coefficient tables live. It is read from
//! JSON:
//!
//! ```json
//! {
//!   "bodies": [
//!     { "name": "sun", "garam": 1.32712440019e11, "rotation": "sun" },
//!     { "name": "earth", "garam": 398600.4419, "rotation": "earth" }
//!   ],
//!   "hierarchy": {
//!     "type": "system",
//!     "main": { "type": "body", "body": "sun" },
//!     "satellites": [
//!       {
//!         "orbit": { "type": "planetary", "table": "VSOP2013p3.dat", "precision": 1e-16 },
//!         "node": { "type": "body", "body": "earth" }
//!       }
//!     ]
//!   },
//!   "anchor": "earth",
//!   "start": "2017-11-04T12:00:00 TT"
//! }
//! ```
//!
//! Relative table paths are resolved against the directory of the configuration file when
//! it is loaded with [`SystemConfig::from_path`].
//!
//! Theories are loaded through a [`TheoryCache`], so several orbits referencing the same
//! table at the same precision share one immutable instance.

use std::{collections::HashMap, fs, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    body_system::{BodyTree, NodeId},
    constants::{Garam, GM_EARTH, GM_MOON, GM_SUN},
    lunar::LunarTheory,
    orbit::Orbit,
    orbit_type::keplerian_element::KeplerianElements,
    orrery_errors::OrreryError,
    planetary::PlanetaryTheory,
    rotation::RotationPreset,
};

/// VSOP2013 file holding the Earth-Moon barycenter.
pub const EMB_TABLE: &str = "VSOP2013p3.dat";
/// Truncation used for the planetary theory of the default system.
pub const DEFAULT_PLANETARY_PRECISION: f64 = 1e-16;
/// Truncation (radians) used for the lunar theory of the default system.
pub const DEFAULT_LUNAR_PRECISION: f64 = 1e-5;
/// Simulation seconds per driver second.
pub const DEFAULT_TIME_SCALE: f64 = 300.0;

fn default_time_scale() -> f64 {
    DEFAULT_TIME_SCALE
}

/// One body of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    pub garam: Garam,
    #[serde(default)]
    pub rotation: Option<RotationPreset>,
}

/// Source of the osculating elements of an orbit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrbitConfig {
    /// VSOP2013 table file.
    Planetary { table: Utf8PathBuf, precision: f64 },
    /// Directory holding `ELP1` … `ELP36`, precision in radians.
    Lunar { directory: Utf8PathBuf, precision: f64 },
    /// Unperturbed two-body elements.
    Fixed { elements: KeplerianElements },
}

/// A satellite: its orbit and the node on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteConfig {
    pub orbit: OrbitConfig,
    pub node: NodeConfig,
}

/// Node of the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    Body {
        body: String,
    },
    System {
        main: Box<NodeConfig>,
        #[serde(default)]
        satellites: Vec<SatelliteConfig>,
    },
}

/// Complete description of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub bodies: Vec<BodyConfig>,
    pub hierarchy: NodeConfig,
    /// Body kept at the origin of the rendered frame.
    #[serde(default)]
    pub anchor: Option<String>,
    /// Initial epoch, hifitime syntax; J2000 if absent.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl SystemConfig {
    pub fn from_json_str(json: &str) -> Result<Self, OrreryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON description, resolving relative table paths against its directory.
    pub fn from_path(path: &Utf8Path) -> Result<Self, OrreryError> {
        let mut config = SystemConfig::from_json_str(&fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Prefix every relative table path with `base`.
    pub fn resolve_paths(&mut self, base: &Utf8Path) {
        fn visit(node: &mut NodeConfig, base: &Utf8Path) {
            if let NodeConfig::System { main, satellites } = node {
                visit(main, base);
                for satellite in satellites {
                    match &mut satellite.orbit {
                        OrbitConfig::Planetary { table: path, .. }
                        | OrbitConfig::Lunar {
                            directory: path, ..
                        } if path.is_relative() => *path = base.join(&*path),
                        _ => {}
                    }
                    visit(&mut satellite.node, base);
                }
            }
        }
        visit(&mut self.hierarchy, base);
    }

    /// Sun, Earth and Moon: the Earth-Moon system on the VSOP2013 barycenter orbit, the
    /// Moon on ELP2000-82B, anchored on the Earth.
    ///
    /// Arguments
    /// ---------
    /// * `data_dir`: directory holding `VSOP2013p3.dat` and `ELP1` … `ELP36`.
    pub fn sun_earth_moon(data_dir: &Utf8Path) -> Self {
        let body = |name: &str| NodeConfig::Body { body: name.into() };
        SystemConfig {
            bodies: vec![
                BodyConfig {
                    name: "sun".into(),
                    garam: GM_SUN,
                    rotation: Some(RotationPreset::Sun),
                },
                BodyConfig {
                    name: "earth".into(),
                    garam: GM_EARTH,
                    rotation: Some(RotationPreset::Earth),
                },
                BodyConfig {
                    name: "moon".into(),
                    garam: GM_MOON,
                    rotation: Some(RotationPreset::Moon),
                },
            ],
            hierarchy: NodeConfig::System {
                main: Box::new(body("sun")),
                satellites: vec![SatelliteConfig {
                    orbit: OrbitConfig::Planetary {
                        table: data_dir.join(EMB_TABLE),
                        precision: DEFAULT_PLANETARY_PRECISION,
                    },
                    node: NodeConfig::System {
                        main: Box::new(body("earth")),
                        satellites: vec![SatelliteConfig {
                            orbit: OrbitConfig::Lunar {
                                directory: data_dir.to_owned(),
                                precision: DEFAULT_LUNAR_PRECISION,
                            },
                            node: body("moon"),
                        }],
                    },
                }],
            },
            anchor: Some("earth".into()),
            start: Some("2017-11-04T12:00:00 TT".into()),
            time_scale: DEFAULT_TIME_SCALE,
        }
    }

    /// Build the body tree.
    ///
    /// Arguments
    /// ---------
    /// * `cache`: theories already loaded; new ones are added to it.
    ///
    /// Return
    /// ------
    /// * The tree and the id of the hierarchy root.
    ///
    /// Errors
    /// ------
    /// * Any table loading error, fatal for the whole build.
    /// * [`OrreryError::UnknownBody`] for a hierarchy node naming an undeclared body.
    /// * [`OrreryError::DuplicateBody`] / [`OrreryError::NodeAlreadyAttached`] when a body
    ///   is declared or placed twice.
    pub fn build(&self, cache: &mut TheoryCache) -> Result<(BodyTree, NodeId), OrreryError> {
        let mut tree = BodyTree::new();
        for body in &self.bodies {
            tree.add_body(
                body.name.as_str(),
                body.garam,
                body.rotation.map(|preset| preset.model()),
            )?;
        }
        let root = build_node(&self.hierarchy, &mut tree, cache)?;
        info!(
            "built hierarchy of {} bodies ({} nodes)",
            self.bodies.len(),
            tree.len()
        );
        Ok((tree, root))
    }
}

fn build_node(
    node: &NodeConfig,
    tree: &mut BodyTree,
    cache: &mut TheoryCache,
) -> Result<NodeId, OrreryError> {
    match node {
        NodeConfig::Body { body } => tree
            .find(body)
            .ok_or_else(|| OrreryError::UnknownBody(body.clone())),
        NodeConfig::System { main, satellites } => {
            let main = build_node(main, tree, cache)?;
            let system = tree.add_system(main)?;
            for satellite in satellites {
                let child = build_node(&satellite.node, tree, cache)?;
                let orbit = cache.orbit(&satellite.orbit)?;
                tree.add_satellite(system, child, orbit)?;
            }
            Ok(system)
        }
    }
}

type CacheKey = (Utf8PathBuf, u64);

fn cache_key(path: &Utf8Path, precision: f64) -> CacheKey {
    (path.to_owned(), precision.to_bits())
}

/// Loaded theories, keyed by table location and precision.
#[derive(Debug, Default)]
pub struct TheoryCache {
    planetary: HashMap<CacheKey, Arc<PlanetaryTheory>>,
    lunar: HashMap<CacheKey, Arc<LunarTheory>>,
}

impl TheoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.planetary.len() + self.lunar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn planetary(
        &mut self,
        table: &Utf8Path,
        precision: f64,
    ) -> Result<Arc<PlanetaryTheory>, OrreryError> {
        let key = cache_key(table, precision);
        if let Some(theory) = self.planetary.get(&key) {
            debug!("reusing planetary theory {table}");
            return Ok(Arc::clone(theory));
        }
        let theory = Arc::new(PlanetaryTheory::from_path(table, precision)?);
        self.planetary.insert(key, Arc::clone(&theory));
        Ok(theory)
    }

    pub fn lunar(
        &mut self,
        directory: &Utf8Path,
        precision: f64,
    ) -> Result<Arc<LunarTheory>, OrreryError> {
        let key = cache_key(directory, precision);
        if let Some(theory) = self.lunar.get(&key) {
            debug!("reusing lunar theory {directory}");
            return Ok(Arc::clone(theory));
        }
        let theory = Arc::new(LunarTheory::from_directory(directory, precision)?);
        self.lunar.insert(key, Arc::clone(&theory));
        Ok(theory)
    }

    /// Orbit driven by the source `config` describes.
    pub fn orbit(&mut self, config: &OrbitConfig) -> Result<Orbit, OrreryError> {
        Ok(match config {
            OrbitConfig::Planetary { table, precision } => {
                Orbit::new(self.planetary(table, *precision)?)
            }
            OrbitConfig::Lunar {
                directory,
                precision,
            } => Orbit::new(self.lunar(directory, *precision)?),
            OrbitConfig::Fixed { elements } => Orbit::fixed(elements.clone()),
        })
    }
}
