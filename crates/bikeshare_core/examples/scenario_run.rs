//! Run a day on a 20-station uniform network and print the report.
//!
//! Run with: cargo run -p bikeshare_core --example scenario_run

use bikeshare_core::scenario::SimulationConfig;
use bikeshare_core::simulation::Simulation;
use bikeshare_core::stations::StationCapacity;
use bikeshare_core::test_helpers::uniform_network;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const STATIONS: usize = 20;
    const BIKES_PER_STATION: u32 = 10;

    let config = SimulationConfig::default()
        .with_bikes_per_station(StationCapacity::Finite(BIKES_PER_STATION))
        .with_seed(123);
    let end_time = config.end_time;

    let mut simulation = Simulation::new(config, uniform_network(STATIONS))?;
    let result = simulation.run();

    println!(
        "--- Scenario run ({} stations, {} bikes each, {} min, seed 123) ---",
        STATIONS, BIKES_PER_STATION, end_time
    );
    for (name, entry) in &result.report {
        println!("  {name:<24} {:>10.2}", entry.estimate);
    }
    if let Some(validation) = &result.validation {
        println!(
            "\nMax normalized validation error: {:.3}",
            validation.max_normalized_error()
        );
    }

    println!("\nFinal inventory:");
    for station in &result.final_inventory {
        println!("  {station:?}");
    }
    Ok(())
}
