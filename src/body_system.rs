//! # Hierarchical body systems
//!
//! Bodies are composed into a tree: a *system* node holds one main node and any number of
//! satellites, each satellite revolving around the main node on an [`Orbit`]. Both the
//! main node and the satellites may themselves be systems (a planet with its moon orbiting
//! a star).
//!
//! All nodes live in a single arena, [`BodyTree`], and are referenced by [`NodeId`]. A
//! node knows its parent system by id; absolute positions are resolved by walking that
//! chain up to the root.
//!
//! ## Barycentric displacement
//!
//! A satellite at position `r` relative to its main node pulls the main node toward it:
//! the main node is displaced by
//!
//! ```text
//! d = −r · W_sat / (W_sat + W_main)
//! ```
//!
//! The displacements of all satellites are summed into `D`. After an update:
//!
//! * the main node sits at `D` relative to the system,
//! * satellite `k` sits at `r_k + D` relative to the system,
//!
//! so the origin of a system frame is its center of mass, and that center of mass is what
//! the parent level puts on an orbit.
//!
//! ## Weights
//!
//! The weight (`garam`) of a system is the sum of the weights of its members, kept up to
//! date when satellites are attached, including for every enclosing system. The combined
//! weight of every orbit bound to a node whose weight changed is refreshed at the same
//! time.
//!
//! ## Example
//!
//! ```rust
//! use orrery::body_system::BodyTree;
//! use orrery::orbit::Orbit;
//! use orrery::orbit_type::keplerian_element::KeplerianElements;
//!
//! let mut tree = BodyTree::new();
//! let star = tree.add_body("star", 1.0e6, None)?;
//! let planet = tree.add_body("planet", 1.0e3, None)?;
//! let system = tree.add_system(star)?;
//!
//! let circular = KeplerianElements {
//!     reference_epoch: 0.0,
//!     semi_major_axis: 1.0e5,
//!     eccentricity: 0.0,
//!     inclination: 0.0,
//!     ascending_node_longitude: 0.0,
//!     periapsis_argument: 0.0,
//!     mean_anomaly: 0.0,
//! };
//! tree.add_satellite(system, planet, Orbit::fixed(circular))?;
//! tree.update_from_time(0.0);
//!
//! let separation = tree.absolute_position(planet)? - tree.absolute_position(star)?;
//! assert!((separation.norm() - 1.0e5).abs() < 1e-6);
//! # Ok::<(), orrery::orrery_errors::OrreryError>(())
//! ```

use log::trace;
use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    constants::{Garam, Second},
    orbit::Orbit,
    orrery_errors::OrreryError,
    rotation::RotationModel,
};

/// Index of a node in a [`BodyTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single body: name and attitude.
#[derive(Debug, Clone)]
pub struct Body {
    name: String,
    rotation: Option<RotationModel>,
    orientation: UnitQuaternion<f64>,
}

impl Body {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rotation(&self) -> Option<&RotationModel> {
        self.rotation.as_ref()
    }

    /// Attitude computed by the last update; identity for bodies without rotation model.
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    fn update_from_time(&mut self, time: Second) {
        if let Some(rotation) = &self.rotation {
            self.orientation = rotation.orientation_at(time);
        }
    }
}

/// A satellite bound to the main node of a system.
#[derive(Debug, Clone)]
pub struct Satellite {
    node: NodeId,
    orbit: Orbit,
    position: Vector3<f64>,
    displacement: Vector3<f64>,
}

impl Satellite {
    /// Node orbiting the main node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    /// Orbit position relative to the main node, from the last update.
    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    /// Displacement this satellite imposes on the main node, from the last update.
    pub fn displacement(&self) -> Vector3<f64> {
        self.displacement
    }
}

/// A main node and its satellites.
#[derive(Debug, Clone)]
pub struct BodySystem {
    main: NodeId,
    satellites: Vec<Satellite>,
    main_displacement: Vector3<f64>,
}

impl BodySystem {
    pub fn main(&self) -> NodeId {
        self.main
    }

    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    /// Sum of the satellite displacements, i.e. the main node position in the system frame.
    pub fn main_displacement(&self) -> Vector3<f64> {
        self.main_displacement
    }
}

/// Leaf body or composite system.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Body(Body),
    System(BodySystem),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    garam: Garam,
    relative_position: Vector3<f64>,
}

/// Arena holding every body and system of a simulation.
#[derive(Debug, Clone, Default)]
pub struct BodyTree {
    nodes: Vec<Node>,
}

impl BodyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> Result<&Node, OrreryError> {
        self.nodes.get(id.0).ok_or(OrreryError::InvalidNodeId(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, OrreryError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(OrreryError::InvalidNodeId(id.0))
    }

    fn push(&mut self, kind: NodeKind, garam: Garam) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            garam,
            relative_position: Vector3::zeros(),
        });
        id
    }

    /// Add a detached body.
    ///
    /// Arguments
    /// ---------
    /// * `name`: unique body name.
    /// * `garam`: gravitational weight (km³/s²).
    /// * `rotation`: optional rotation model evaluated at every update.
    ///
    /// Return
    /// ------
    /// * The new node id, or [`OrreryError::DuplicateBody`] if the name is taken.
    pub fn add_body(
        &mut self,
        name: impl Into<String>,
        garam: Garam,
        rotation: Option<RotationModel>,
    ) -> Result<NodeId, OrreryError> {
        let name = name.into();
        if self.find(&name).is_some() {
            return Err(OrreryError::DuplicateBody(name));
        }
        Ok(self.push(
            NodeKind::Body(Body {
                name,
                rotation,
                orientation: UnitQuaternion::identity(),
            }),
            garam,
        ))
    }

    /// Wrap a detached node into a new system, as its main node.
    pub fn add_system(&mut self, main: NodeId) -> Result<NodeId, OrreryError> {
        let main_node = self.node(main)?;
        if main_node.parent.is_some() {
            return Err(OrreryError::NodeAlreadyAttached(main.0));
        }
        let garam = main_node.garam;

        let id = self.push(
            NodeKind::System(BodySystem {
                main,
                satellites: Vec::new(),
                main_displacement: Vector3::zeros(),
            }),
            garam,
        );
        self.node_mut(main)?.parent = Some(id);
        Ok(id)
    }

    /// Attach a detached node as a satellite of `system`.
    ///
    /// The orbit combined weight is set to the weight of the satellite plus the weight of
    /// the main node. The weight of `system` and of every enclosing system grows by the
    /// satellite weight.
    ///
    /// Errors
    /// ------
    /// * [`OrreryError::InvalidNodeId`] for an unknown id.
    /// * [`OrreryError::NotASystem`] if `system` is a single body.
    /// * [`OrreryError::NodeAlreadyAttached`] if `satellite` already has a parent.
    /// * [`OrreryError::CyclicAttachment`] if `system` lies inside `satellite`.
    pub fn add_satellite(
        &mut self,
        system: NodeId,
        satellite: NodeId,
        mut orbit: Orbit,
    ) -> Result<(), OrreryError> {
        let satellite_garam = {
            let node = self.node(satellite)?;
            if node.parent.is_some() {
                return Err(OrreryError::NodeAlreadyAttached(satellite.0));
            }
            node.garam
        };
        let main = self.system(system)?.main;
        if self.root_of(system)? == satellite {
            return Err(OrreryError::CyclicAttachment {
                parent: system.0,
                child: satellite.0,
            });
        }

        orbit.set_combined_weight(satellite_garam + self.node(main)?.garam);
        self.system_mut(system)?.satellites.push(Satellite {
            node: satellite,
            orbit,
            position: Vector3::zeros(),
            displacement: Vector3::zeros(),
        });
        self.node_mut(satellite)?.parent = Some(system);

        self.propagate_garam(system, satellite_garam)
    }

    /// Add `delta` to the weight of `id` and of all its ancestors, refreshing the orbits
    /// that depend on those weights.
    fn propagate_garam(&mut self, id: NodeId, delta: Garam) -> Result<(), OrreryError> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node_mut(node_id)?;
            node.garam += delta;
            current = node.parent;
            if let Some(parent) = current {
                self.refresh_orbit_weights(parent)?;
            }
        }
        Ok(())
    }

    fn refresh_orbit_weights(&mut self, system: NodeId) -> Result<(), OrreryError> {
        let main_garam = self.node(self.system(system)?.main)?.garam;
        let weights = self
            .system(system)?
            .satellites
            .iter()
            .map(|satellite| Ok(self.node(satellite.node)?.garam + main_garam))
            .collect::<Result<Vec<_>, OrreryError>>()?;

        for (satellite, weight) in self.system_mut(system)?.satellites.iter_mut().zip(weights) {
            satellite.orbit.set_combined_weight(weight);
        }
        Ok(())
    }

    fn root_of(&self, id: NodeId) -> Result<NodeId, OrreryError> {
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind, OrreryError> {
        Ok(&self.node(id)?.kind)
    }

    pub fn body(&self, id: NodeId) -> Option<&Body> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Body(body) => Some(body),
            NodeKind::System(_) => None,
        }
    }

    pub fn system(&self, id: NodeId) -> Result<&BodySystem, OrreryError> {
        match &self.node(id)?.kind {
            NodeKind::System(system) => Ok(system),
            NodeKind::Body(_) => Err(OrreryError::NotASystem(id.0)),
        }
    }

    fn system_mut(&mut self, id: NodeId) -> Result<&mut BodySystem, OrreryError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::System(system) => Ok(system),
            NodeKind::Body(_) => Err(OrreryError::NotASystem(id.0)),
        }
    }

    /// Id of the body called `name`.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.bodies()
            .find(|(_, body)| body.name == name)
            .map(|(id, _)| id)
    }

    /// All leaf bodies, in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (NodeId, &Body)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| match &node.kind {
                NodeKind::Body(body) => Some((NodeId(index), body)),
                NodeKind::System(_) => None,
            })
    }

    /// Nodes without parent.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| NodeId(index))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, OrreryError> {
        Ok(self.node(id)?.parent)
    }

    pub fn garam(&self, id: NodeId) -> Result<Garam, OrreryError> {
        Ok(self.node(id)?.garam)
    }

    pub fn relative_position(&self, id: NodeId) -> Result<Vector3<f64>, OrreryError> {
        Ok(self.node(id)?.relative_position)
    }

    /// Translate a node within its parent frame; meant for roots; any other node is
    /// overwritten at the next update.
    pub fn set_relative_position(
        &mut self,
        id: NodeId,
        position: Vector3<f64>,
    ) -> Result<(), OrreryError> {
        self.node_mut(id)?.relative_position = position;
        Ok(())
    }

    /// Relative position of `id` plus the absolute position of its parent, recursively.
    pub fn absolute_position(&self, id: NodeId) -> Result<Vector3<f64>, OrreryError> {
        let mut node = self.node(id)?;
        let mut position = node.relative_position;
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            position += node.relative_position;
        }
        Ok(position)
    }

    /// Translation that brings `id` to the origin.
    pub fn anchor(&self, id: NodeId) -> Result<Vector3<f64>, OrreryError> {
        Ok(-self.absolute_position(id)?)
    }

    /// Attitude of body `id`, `None` for systems.
    pub fn orientation(&self, id: NodeId) -> Result<Option<UnitQuaternion<f64>>, OrreryError> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Body(body) => Some(body.orientation),
            NodeKind::System(_) => None,
        })
    }

    /// Update every tree in the arena to simulation time `time`.
    pub fn update_from_time(&mut self, time: Second) {
        let roots: Vec<NodeId> = self.roots().collect();
        trace!("updating {} root(s) at t = {time} s", roots.len());
        for root in roots {
            self.update_node(root, time);
        }
    }

    /// Update the subtree rooted at `id` to simulation time `time`.
    ///
    /// For a system: the main node is updated, then every satellite orbit is evaluated,
    /// its displacement of the main node computed and its own subtree updated; finally the
    /// relative positions of the main node and of the satellites are written.
    pub fn update_node(&mut self, id: NodeId, time: Second) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        let (main, satellite_count) = match &mut node.kind {
            NodeKind::Body(body) => {
                body.update_from_time(time);
                return;
            }
            NodeKind::System(system) => (system.main, system.satellites.len()),
        };

        self.update_node(main, time);
        let main_garam = self.nodes.get(main.0).map_or(0.0, |node| node.garam);

        let mut total_displacement = Vector3::zeros();
        for index in 0..satellite_count {
            let Some(satellite_node) = self.satellite(id, index).map(|s| s.node) else {
                continue;
            };
            let satellite_garam = self.nodes.get(satellite_node.0).map_or(0.0, |n| n.garam);
            let total_garam = satellite_garam + main_garam;
            let fraction = if total_garam > 0.0 {
                satellite_garam / total_garam
            } else {
                0.0
            };

            if let Some(satellite) = self.satellite_mut(id, index) {
                satellite.position = satellite.orbit.update_from_time(time);
                if let Some(elements) = satellite.orbit.elements() {
                    trace!("node {}: {elements}", satellite.node.0);
                }
                satellite.displacement = -satellite.position * fraction;
                total_displacement += satellite.displacement;
            }
            self.update_node(satellite_node, time);
        }

        if let Some(main_node) = self.nodes.get_mut(main.0) {
            main_node.relative_position = total_displacement;
        }

        let Ok(system) = self.system_mut(id) else {
            return;
        };
        system.main_displacement = total_displacement;
        let placements: Vec<(NodeId, Vector3<f64>)> = system
            .satellites
            .iter()
            .map(|satellite| (satellite.node, satellite.position + total_displacement))
            .collect();
        for (node, position) in placements {
            if let Some(satellite_node) = self.nodes.get_mut(node.0) {
                satellite_node.relative_position = position;
            }
        }
    }

    fn satellite(&self, system: NodeId, index: usize) -> Option<&Satellite> {
        self.system(system).ok()?.satellites.get(index)
    }

    fn satellite_mut(&mut self, system: NodeId, index: usize) -> Option<&mut Satellite> {
        self.system_mut(system).ok()?.satellites.get_mut(index)
    }
}
