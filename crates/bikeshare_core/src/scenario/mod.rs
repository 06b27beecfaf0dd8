//! Scenario setup: run parameters and the world they are built into.

mod build;
mod params;

pub use build::build_simulation;
pub use params::SimulationConfig;
