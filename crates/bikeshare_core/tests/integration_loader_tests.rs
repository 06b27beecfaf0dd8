use std::fs;

use bikeshare_core::error::LoadError;
use bikeshare_core::network::{load_network, UnknownStationPolicy, CATCH_ALL_STATION};
use bikeshare_core::scenario::SimulationConfig;
use bikeshare_core::simulation::Simulation;
use bikeshare_core::stations::StationId;
use tempfile::TempDir;

fn write_inputs(
    dir: &TempDir,
    start: &str,
    trips: &str,
) -> (std::path::PathBuf, std::path::PathBuf) {
    let start_path = dir.path().join("start_station_probs.csv");
    let trips_path = dir.path().join("trip_stats.csv");
    fs::write(&start_path, start).expect("write start table");
    fs::write(&trips_path, trips).expect("write trip table");
    (start_path, trips_path)
}

#[test]
fn loads_tables_from_disk_and_runs() {
    let dir = TempDir::new().expect("temp dir");
    let (start, trips) = write_inputs(
        &dir,
        "station,probability\nDupont Circle,0.6\nUnion Station,0.4\n",
        "start,end,count,mean,std\n\
         Dupont Circle,Union Station,30,12.1,3.0\n\
         Union Station,Dupont Circle,10,11.0,2.5\n\
         Union Station,Union Station,10,5.0,1.0\n\
         Union Station,Closed Dock,5,9.0,2.0\n",
    );

    let network = load_network(&start, &trips, UnknownStationPolicy::CatchAll).expect("network");
    assert_eq!(network.station_count(), 3);
    assert_eq!(network.station_id(CATCH_ALL_STATION), Some(StationId(2)));
    assert_eq!(network.transitions().row(StationId(0)), &[0.0, 1.0, 0.0]);
    assert_eq!(network.transitions().row(StationId(1)), &[0.4, 0.4, 0.2]);

    let config = SimulationConfig::default()
        .with_num_riders(50)
        .with_end_time(120)
        .with_seed(1);
    let mut sim = Simulation::new(config, network).expect("simulation");
    let result = sim.run();
    assert_eq!(result.stations.len(), 3);
    assert_eq!(result.start_probabilities[2], 0.0);
}

#[test]
fn missing_file_reports_its_path() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("nope.csv");
    let err = load_network(&missing, &missing, UnknownStationPolicy::Reject).unwrap_err();
    match err {
        LoadError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_trip_row_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let (start, trips) = write_inputs(
        &dir,
        "station,probability\nA,1.0\n",
        "start,end,count\nA,A\n",
    );
    let err = load_network(&start, &trips, UnknownStationPolicy::CatchAll).unwrap_err();
    assert!(matches!(err, LoadError::MissingField { line: 2, .. }), "{err}");
}
