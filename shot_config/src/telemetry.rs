//! Telemetry sample files handed over by the shot history.
//!
//! CSV schema (exact headers, empty cell = channel not recorded):
//!
//! ```text
//! time_s,stage,weight_g,pressure_bar,flow_ml_s,piston_position
//! 0.0,Preinfusion,0.0,1.2,4.1,
//! ```
//!
//! JSON is an array of objects with the same field names.
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

pub const TELEMETRY_CSV_HEADERS: [&str; 6] = [
    "time_s",
    "stage",
    "weight_g",
    "pressure_bar",
    "flow_ml_s",
    "piston_position",
];

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TelemetryRow {
    pub time_s: f64,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub weight_g: Option<f64>,
    #[serde(default)]
    pub pressure_bar: Option<f64>,
    #[serde(default)]
    pub flow_ml_s: Option<f64>,
    #[serde(default)]
    pub piston_position: Option<f64>,
}

pub fn parse_telemetry_csv<R: Read>(reader: R) -> eyre::Result<Vec<TelemetryRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read telemetry CSV headers: {}", e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != TELEMETRY_CSV_HEADERS {
        eyre::bail!(
            "telemetry CSV must have headers '{}', got: {}",
            TELEMETRY_CSV_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<TelemetryRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid telemetry CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

pub fn load_telemetry_csv(path: &Path) -> eyre::Result<Vec<TelemetryRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open telemetry CSV {:?}: {}", path, e))?;
    parse_telemetry_csv(file)
}

pub fn parse_telemetry_json(s: &str) -> eyre::Result<Vec<TelemetryRow>> {
    serde_json::from_str::<Vec<TelemetryRow>>(s)
        .map_err(|e| eyre::eyre!("invalid telemetry JSON: {}", e))
}

/// Load a telemetry file, choosing the parser from the extension (`.json` or CSV otherwise).
pub fn load_telemetry(path: &Path) -> eyre::Result<Vec<TelemetryRow>> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("open telemetry JSON {:?}: {}", path, e))?;
        parse_telemetry_json(&text)
    } else {
        load_telemetry_csv(path)
    }
}
