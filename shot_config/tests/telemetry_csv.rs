use shot_config::{load_telemetry, parse_telemetry_csv, parse_telemetry_json};
use std::fs;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn empty_cells_are_missing_not_zero() {
    let csv = "time_s,stage,weight_g,pressure_bar,flow_ml_s,piston_position\n\
               0.0,Fill,0.0,,4.2,\n\
               0.5,Fill,0.1,0.0,4.0,12.5\n";
    let rows = parse_telemetry_csv(csv.as_bytes()).expect("parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].pressure_bar, None);
    assert_eq!(rows[0].weight_g, Some(0.0));
    assert_eq!(rows[1].pressure_bar, Some(0.0));
    assert_eq!(rows[1].piston_position, Some(12.5));
}

#[test]
fn rejects_wrong_headers() {
    let csv = "t,stage,weight\n0,Fill,0\n";
    let err = parse_telemetry_csv(csv.as_bytes()).expect_err("bad header");
    assert!(err.to_string().contains("telemetry CSV must have headers"));
}

#[test]
fn reports_bad_row_number() {
    let csv = "time_s,stage,weight_g,pressure_bar,flow_ml_s,piston_position\n\
               0.0,Fill,0.0,1.0,4.2,\n\
               abc,Fill,0.1,1.0,4.0,\n";
    let err = parse_telemetry_csv(csv.as_bytes()).expect_err("bad row");
    assert!(err.to_string().contains("row 3"));
}

#[test]
fn json_rows_parse() {
    let rows = parse_telemetry_json(
        r#"[{"time_s": 0.0, "stage": "Fill", "pressure_bar": 1.5},
            {"time_s": 0.2, "stage": "Fill", "pressure_bar": 1.7, "flow_ml_s": 3.9}]"#,
    )
    .unwrap();
    assert_eq!(rows[1].flow_ml_s, Some(3.9));
    assert_eq!(rows[0].weight_g, None);
}

#[test]
fn load_dispatches_on_extension() {
    let dir = tempdir().unwrap();
    let json_path = dir.path().join("shot.json");
    fs::write(&json_path, r#"[{"time_s": 1.0, "stage": "Hold"}]"#).unwrap();
    assert_eq!(load_telemetry(&json_path).unwrap().len(), 1);

    let csv_path = dir.path().join("shot.csv");
    let mut f = fs::File::create(&csv_path).unwrap();
    writeln!(f, "time_s,stage,weight_g,pressure_bar,flow_ml_s,piston_position").unwrap();
    writeln!(f, "1.0,Hold,2.0,9.0,2.1,").unwrap();
    assert_eq!(load_telemetry(&csv_path).unwrap()[0].pressure_bar, Some(9.0));
}
