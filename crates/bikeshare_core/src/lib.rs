pub mod clock;
pub mod distributions;
pub mod error;
pub mod network;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod stations;
pub mod systems;
pub mod telemetry;
pub mod validation;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
