pub mod body_system;
pub mod config;
pub mod constants;
pub mod kepler;
pub mod lunar;
pub mod orbit;
pub mod orbit_type;
pub mod orrery_errors;
pub mod planetary;
pub mod rotation;
pub mod series;
pub mod solar_system;
pub mod time;

pub use body_system::{BodyTree, NodeId};
pub use config::SystemConfig;
pub use orrery_errors::OrreryError;
pub use solar_system::{BodyState, SolarSystem};
