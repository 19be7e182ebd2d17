use std::{fs, path::PathBuf};

use pfg_config::{Config, RangeBoundsPolicy};
use pfg_factorgraph::GraphState;
use pfg_goats::{find_dataset_files, ingest, GoatsParser, IngestError};
use pfg_geometry::{Dimension, Orientation};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const STATE_HEADER: &str = "insXYZ_1,insXYZ_2,iNav_GT_1,iNav_GT_2,insRPY_3,insVel_1,insVel_2";

/// A run on disk. Each row is the ranges of every beacon, in the order
/// `ranges_*` then `filtered_ranges_*`. The robot moves one metre along x per
/// row.
struct Dataset {
    dir:     TempDir,
    data:    PathBuf,
    beacons: PathBuf,
}

impl Dataset {
    fn new(num_beacons: usize, ranges: &[Vec<&str>]) -> Self {
        let range_header = (1..=num_beacons)
            .map(|i| format!("ranges_{i}"))
            .chain((1..=num_beacons).map(|i| format!("filtered_ranges_{i}")))
            .collect::<Vec<_>>()
            .join(",");
        let mut data = format!("{STATE_HEADER},{range_header}\n");
        for (row, readings) in ranges.iter().enumerate() {
            let x = row as f64;
            data.push_str(&format!("{x},0,{x},0.5,0,1,0,{}\n", readings.join(",")));
        }

        let beacons = (0..2)
            .map(|coordinate| {
                (0..num_beacons)
                    .map(|b| (10 * b + coordinate).to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self::from_contents(&data, &beacons)
    }

    fn from_contents(data: &str, beacons: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let data_path = dir.path().join("goats_14.csv");
        let beacon_path = dir.path().join("beacon_locations.csv");
        fs::write(&data_path, data).expect("writable");
        fs::write(&beacon_path, beacons).expect("writable");
        Self {
            dir,
            data: data_path,
            beacons: beacon_path,
        }
    }
}

/// One beacon, raw and filtered columns agree.
fn one_beacon<'a>(readings: &[&'a str]) -> Vec<Vec<&'a str>> {
    readings.iter().map(|&r| vec![r, r]).collect()
}

#[test]
fn sparse_beacon_is_not_a_landmark() {
    // beacon 1 has a single reading, but a 2D position needs two
    let dataset = Dataset::new(
        2,
        &[
            vec!["5", "", "5", ""],
            vec!["5", "7", "5", "7"],
            vec!["5", "", "5", ""],
        ],
    );
    let (graph, report) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");

    assert!(graph.landmark_exists("L0"));
    assert!(!graph.landmark_exists("L1"));
    assert_eq!(graph.num_landmarks(), 1);
    assert_eq!(report.admitted_beacons, vec![0]);
    assert_eq!(report.dropped_beacons.len(), 1);
    assert_eq!(report.dropped_beacons[0].beacon, 1);
    assert_eq!(report.dropped_beacons[0].readings, 1);
    // the reading of the dropped beacon does not become a measurement
    assert!(graph
        .range_measurements()
        .iter()
        .all(|r| r.landmark_key() == "L0"));
}

#[test]
fn silent_row_is_skipped_and_odometry_bridges_it() {
    let dataset = Dataset::new(1, &one_beacon(&["4", "5", "", "6", "7"]));
    let (graph, report) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");

    let names: Vec<_> = graph.pose_trajectory(0).iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["A0", "A1", "A3", "A4"]);
    assert_eq!(report.skipped_rows, vec![2]);
    assert_eq!(report.admitted_rows, vec![0, 1, 3, 4]);

    let chain: Vec<_> = graph
        .odom_measurements(0)
        .iter()
        .map(|m| (m.base_pose(), m.to_pose()))
        .collect();
    assert_eq!(chain, vec![("A0", "A1"), ("A1", "A3"), ("A3", "A4")]);
    // the robot moves one metre per row, so skipping a row doubles the step
    approx::assert_abs_diff_eq!(graph.odom_measurements(0)[1].x(), 2.0, epsilon = 1e-12);
}

#[test]
fn row_zero_is_always_a_pose() {
    let dataset = Dataset::new(1, &one_beacon(&["", "5", "6"]));
    let (graph, report) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");
    assert!(graph.pose_exists("A0"));
    assert!(report.skipped_rows.is_empty());
    assert_eq!(graph.odom_measurements(0).len(), 2);
}

#[test]
fn nan_is_excluded_and_short_range_is_kept() {
    let dataset = Dataset::new(1, &one_beacon(&["3", "nan", "1.0", "4"]));
    let (graph, report) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");

    let ranges: Vec<_> = graph
        .range_measurements()
        .iter()
        .map(|r| (r.pose_key().to_string(), r.dist()))
        .collect();
    assert_eq!(
        ranges,
        vec![
            ("A0".to_string(), 3.0),
            ("A2".to_string(), 1.0),
            ("A3".to_string(), 4.0),
        ]
    );
    assert_eq!(report.missing_ranges, 1);
    assert_eq!(report.out_of_bounds_ranges.len(), 1);
    assert_eq!(report.out_of_bounds_ranges[0].row, 2);
    assert_eq!(report.bounds_policy, RangeBoundsPolicy::Keep);
    for range in graph.range_measurements() {
        approx::assert_relative_eq!(range.stddev(), 0.75);
    }
}

#[test]
fn out_of_bounds_ranges_can_be_excluded() {
    let dataset = Dataset::new(1, &one_beacon(&["3", "1.0", "200", "4"]));
    let mut config = Config::default();
    config.range.bounds_policy = RangeBoundsPolicy::Exclude;
    let (graph, report) = ingest(&dataset.data, &dataset.beacons, &config).expect("valid run");

    assert_eq!(graph.range_measurements().len(), 2);
    assert_eq!(report.out_of_bounds_ranges.len(), 2);
    // the poses stay, only the measurements go
    assert_eq!(graph.num_poses(), 4);
}

#[test]
fn infinite_and_non_numeric_ranges_are_excluded() {
    let dataset = Dataset::new(1, &one_beacon(&["3", "inf", "lost", "4"]));
    let (graph, report) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");

    assert_eq!(graph.range_measurements().len(), 2);
    assert_eq!(report.non_finite_ranges.len(), 1);
    assert_eq!(report.non_finite_ranges[0].row, 1);
    // both the raw and the filtered cell of row 2 are non-numeric
    assert_eq!(report.non_numeric_cells.len(), 2);
    assert_eq!(report.non_numeric_cells[0].value, "lost");
    // an infinite reading is still a reading, a non-numeric one is not
    assert!(graph.pose_exists("A1"));
    assert!(!graph.pose_exists("A2"));
}

#[test]
fn raw_ranges_can_be_selected() {
    let dataset = Dataset::new(1, &[vec!["3", "30"], vec!["4", "40"]]);
    let mut config = Config::default();
    config.dataset.filter_ranges = false;
    let (graph, _) = ingest(&dataset.data, &dataset.beacons, &config).expect("valid run");
    let dists: Vec<_> = graph.range_measurements().iter().map(|r| r.dist()).collect();
    assert_eq!(dists, vec![3.0, 4.0]);

    let (graph, _) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");
    let dists: Vec<_> = graph.range_measurements().iter().map(|r| r.dist()).collect();
    assert_eq!(dists, vec![30.0, 40.0]);
}

#[test]
fn robot_prefix_and_index_are_configurable() {
    let dataset = Dataset::new(1, &one_beacon(&["3", "4"]));
    let mut config = Config::default();
    config.dataset.robot_prefix = 'B';
    config.dataset.robot_index = 1;
    let (graph, _) = ingest(&dataset.data, &dataset.beacons, &config).expect("valid run");
    assert!(graph.pose_trajectory(0).is_empty());
    assert_eq!(graph.pose_trajectory(1).len(), 2);
    assert_eq!(graph.range_measurements()[0].pose_key(), "B0");
}

#[test]
fn beacon_column_mismatch_is_structural() {
    // three beacon locations, two beacons worth of range columns
    let dataset = Dataset::new(2, &[vec!["5", "5", "5", "5"]]);
    fs::write(&dataset.beacons, "0,10,20\n0,0,0\n").expect("writable");
    let result = GoatsParser::new(&dataset.data, &dataset.beacons, &Config::default());
    assert!(matches!(
        result,
        Err(IngestError::BeaconCountMismatch {
            raw: 2,
            filtered: 2,
            beacons: 3,
        })
    ));

    // a filtered column short
    let data = format!("{STATE_HEADER},ranges_1,ranges_2,filtered_ranges_1\n0,0,0,0,0,0,0,5,5,5\n");
    fs::write(&dataset.data, data).expect("writable");
    fs::write(&dataset.beacons, "0,10\n0,0\n").expect("writable");
    let result = GoatsParser::new(&dataset.data, &dataset.beacons, &Config::default());
    assert!(matches!(
        result,
        Err(IngestError::BeaconCountMismatch {
            raw: 2,
            filtered: 1,
            beacons: 2,
        })
    ));
}

#[test]
fn beacon_table_needs_a_row_per_coordinate() {
    let dataset = Dataset::new(1, &one_beacon(&["5"]));
    fs::write(&dataset.beacons, "0\n").expect("writable");
    let result = GoatsParser::new(&dataset.data, &dataset.beacons, &Config::default());
    assert!(matches!(
        result,
        Err(IngestError::BeaconTableTooShort {
            rows: 1,
            dimension: Dimension::Two,
        })
    ));
}

#[test]
fn paths_must_be_csv_files() {
    let dataset = Dataset::new(1, &one_beacon(&["5"]));
    let config = Config::default();

    let missing = dataset.dir.path().join("missing.csv");
    assert!(matches!(
        GoatsParser::new(&missing, &dataset.beacons, &config),
        Err(IngestError::NotFound(_))
    ));

    assert!(matches!(
        GoatsParser::new(dataset.dir.path(), &dataset.beacons, &config),
        Err(IngestError::NotAFile(_))
    ));

    let text = dataset.dir.path().join("beacons.txt");
    fs::write(&text, "0\n0\n").expect("writable");
    assert!(matches!(
        GoatsParser::new(&dataset.data, &text, &config),
        Err(IngestError::WrongExtension(_))
    ));
}

#[test]
fn graph_is_finalized() {
    let dataset = Dataset::new(1, &one_beacon(&["5", "6"]));
    let (graph, _) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");
    assert_eq!(graph.state(), GraphState::Finalized);
    assert_eq!(graph.dimension(), Dimension::Two);
}

#[test]
fn dataset_files_are_found() {
    let dataset = Dataset::new(1, &one_beacon(&["5"]));
    let (data, beacons) = find_dataset_files(dataset.dir.path()).expect("two csv files");
    assert_eq!(data, dataset.data);
    assert_eq!(beacons, dataset.beacons);

    fs::write(dataset.dir.path().join("extra.csv"), "").expect("writable");
    assert!(matches!(
        find_dataset_files(dataset.dir.path()),
        Err(IngestError::DatasetDirectory { .. })
    ));
}

#[test]
fn dataset_directory_needs_a_beacon_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("a.csv"), "").expect("writable");
    fs::write(dir.path().join("b.csv"), "").expect("writable");
    fs::write(dir.path().join("notes.txt"), "").expect("writable");
    assert!(matches!(
        find_dataset_files(dir.path()),
        Err(IngestError::DatasetDirectory { .. })
    ));
}

#[test]
fn graph_and_report_serialize_to_json() {
    let dataset = Dataset::new(1, &one_beacon(&["5", "", "6"]));
    let (graph, report) =
        ingest(&dataset.data, &dataset.beacons, &Config::default()).expect("valid run");

    let graph = serde_json::to_value(&graph).expect("serializable");
    assert_eq!(graph["dimension"], 2);
    assert_eq!(graph["landmark_variables"]["L0"]["true_position"], serde_json::json!([0.0, 1.0]));
    assert_eq!(graph["pose_variables"][0].as_array().map(Vec::len), Some(2));
    assert!(graph.get("pose_lookup").is_none());

    let report = serde_json::to_value(&report).expect("serializable");
    assert_eq!(report["skipped_rows"], serde_json::json!([1]));
    assert_eq!(report["bounds_policy"], "keep");
}

#[test]
fn spatial_run_builds_a_spatial_graph() {
    let header = "insXYZ_1,insXYZ_2,insXYZ_3,iNav_GT_1,iNav_GT_2,iNav_GT_3,\
                  insRPY_1,insRPY_2,insRPY_3,insVel_1,insVel_2,insVel_3,\
                  ranges_1,filtered_ranges_1";
    let rows = [
        "0,0,-1,0,0,-1.5,0,0,0,1,0,0,9,9",
        "1,0,-1,1,0,-1.5,0,0,0,1,0,0,8,8",
        "2,0,-1,2,0,-1.5,0,0,0,1,0,0,,",
        "3,0,-2,3,0,-2.5,0.1,0,0.2,1,0,0,7,7",
    ];
    let data = std::iter::once(header).chain(rows).collect::<Vec<_>>().join("\n");
    // one beacon, one row per coordinate
    let dataset = Dataset::from_contents(&data, "10\n0\n-5\n");
    let mut config = Config::default();
    config.dataset.dimension = Dimension::Three;

    let (graph, report) = ingest(&dataset.data, &dataset.beacons, &config).expect("valid run");
    assert_eq!(graph.dimension(), Dimension::Three);
    assert_eq!(report.admitted_rows, vec![0, 1, 3]);
    assert_eq!(report.skipped_rows, vec![2]);

    let landmark = graph.landmark("L0").expect("beacon with three ranges");
    assert_eq!(landmark.dimension(), Dimension::Three);
    assert_eq!(landmark.true_z(), Some(-5.0));

    let pose = graph.pose("A3").expect("row with a range");
    assert_eq!(pose.dimension(), Dimension::Three);
    assert_eq!(pose.true_z(), Some(-2.5));
    approx::assert_abs_diff_eq!(pose.true_theta(), 0.2);

    let odometry = graph.odom_measurements(0);
    let chain: Vec<_> = odometry
        .iter()
        .map(|m| (m.base_pose(), m.to_pose()))
        .collect();
    assert_eq!(chain, vec![("A0", "A1"), ("A1", "A3")]);
    for odom in odometry {
        assert_eq!(odom.dimension(), Dimension::Three);
        assert!(odom.z().is_some());
        assert_eq!(odom.transformation_matrix().dim(), (4, 4));
        let diagonal = odom.covariance().diag().to_vec();
        assert_eq!(diagonal.len(), 6);
        for variance in &diagonal[..3] {
            approx::assert_relative_eq!(*variance, 0.02 * 0.02, max_relative = 1e-9);
        }
        for variance in &diagonal[3..] {
            approx::assert_relative_eq!(*variance, 0.002 * 0.002, max_relative = 1e-9);
        }
    }

    // identical orientations, so the first step is a pure translation
    approx::assert_abs_diff_eq!(odometry[0].x(), 1.0, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(odometry[0].z().unwrap_or_default(), 0.0, epsilon = 1e-12);
    let Orientation::Spatial { roll, yaw, .. } = odometry[1].orientation() else {
        panic!("spatial odometry has a spatial orientation");
    };
    approx::assert_abs_diff_eq!(roll, 0.1, epsilon = 1e-9);
    approx::assert_abs_diff_eq!(yaw, 0.2, epsilon = 1e-9);

    assert_eq!(graph.range_measurements().len(), 3);
}
