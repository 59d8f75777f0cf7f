#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and input document parsing for the shot analyzer.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `ProfileDoc` mirrors the extraction profile JSON as stored by the
//!   profile store, accepting both dynamics encodings.
//! - Telemetry loaders enforce CSV headers and accept a JSON row array.
use serde::Deserialize;
use std::path::Path;

pub mod profile;
pub mod telemetry;

pub use profile::{
    ComparisonDoc, ConditionDoc, ConditionKindDoc, ControlTypeDoc, DomainDoc, DynamicsDoc,
    InterpolationDoc, PointDoc, ProfileDoc, StageDoc, ValueDoc, VariableDoc, load_profile_json,
    parse_profile_json,
};
pub use telemetry::{
    TELEMETRY_CSV_HEADERS, TelemetryRow, load_telemetry, load_telemetry_csv, parse_telemetry_csv,
    parse_telemetry_json,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Seconds from stage start during which flow readings are treated as transient.
    pub transient_window_s: f64,
    /// Fraction of the target that counts as "reached" (0.0..=1.0].
    pub reach_tolerance: f64,
    /// Estimated duration for stages without a time exit trigger (profile-only preview).
    pub default_stage_duration_s: f64,
    /// Reject sample streams longer than this.
    pub max_samples: usize,
    /// Final weight within this many grams of the target counts as on target.
    pub weight_tolerance_g: f64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            transient_window_s: 3.5,
            reach_tolerance: 0.95,
            default_stage_duration_s: 10.0,
            max_samples: 50_000,
            weight_tolerance_g: 1.0,
        }
    }
}

/// Minimum |end - start| change, per channel, before a stage is described as rising/declining.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrendSection {
    pub pressure_bar: f64,
    pub flow_ml_s: f64,
    pub power: f64,
}

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            pressure_bar: 0.5,
            flow_ml_s: 0.5,
            power: 0.5,
        }
    }
}

/// Slack granted to exit conditions to absorb sampling granularity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TriggerSection {
    pub time_s: f64,
    pub weight_g: f64,
    pub pressure_bar: f64,
    pub flow_ml_s: f64,
    pub piston_position: f64,
}

impl Default for TriggerSection {
    fn default() -> Self {
        Self {
            time_s: 0.3,
            weight_g: 0.2,
            pressure_bar: 0.2,
            flow_ml_s: 0.2,
            piston_position: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PreinfusionSection {
    /// First pressure stage targeting at least this many bar starts the main extraction.
    pub main_pressure_bar: f64,
    /// First flow stage (not the opening stage) targeting at least this much flow starts it.
    pub main_flow_ml_s: f64,
}

impl Default for PreinfusionSection {
    fn default() -> Self {
        Self {
            main_pressure_bar: 6.0,
            main_flow_ml_s: 1.5,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSection,
    pub trend: TrendSection,
    pub triggers: TriggerSection,
    pub preinfusion: PreinfusionSection,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn finite_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn finite_non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Analysis
        let a = &self.analysis;
        if !finite_non_negative(a.transient_window_s) {
            eyre::bail!("analysis.transient_window_s must be >= 0");
        }
        if a.transient_window_s > 60.0 {
            eyre::bail!("analysis.transient_window_s is unreasonably large (>60s)");
        }
        if !(a.reach_tolerance > 0.0 && a.reach_tolerance <= 1.0) {
            eyre::bail!("analysis.reach_tolerance must be in (0.0, 1.0]");
        }
        if !finite_positive(a.default_stage_duration_s) {
            eyre::bail!("analysis.default_stage_duration_s must be > 0");
        }
        if a.max_samples == 0 {
            eyre::bail!("analysis.max_samples must be >= 1");
        }
        if !finite_non_negative(a.weight_tolerance_g) {
            eyre::bail!("analysis.weight_tolerance_g must be >= 0");
        }

        // Trend
        for (name, v) in [
            ("trend.pressure_bar", self.trend.pressure_bar),
            ("trend.flow_ml_s", self.trend.flow_ml_s),
            ("trend.power", self.trend.power),
        ] {
            if !finite_non_negative(v) {
                eyre::bail!("{name} must be >= 0");
            }
        }

        // Triggers
        let t = &self.triggers;
        for (name, v) in [
            ("triggers.time_s", t.time_s),
            ("triggers.weight_g", t.weight_g),
            ("triggers.pressure_bar", t.pressure_bar),
            ("triggers.flow_ml_s", t.flow_ml_s),
            ("triggers.piston_position", t.piston_position),
        ] {
            if !finite_non_negative(v) {
                eyre::bail!("{name} must be >= 0");
            }
        }

        // Pre-infusion
        if !finite_positive(self.preinfusion.main_pressure_bar) {
            eyre::bail!("preinfusion.main_pressure_bar must be > 0");
        }
        if !finite_positive(self.preinfusion.main_flow_ml_s) {
            eyre::bail!("preinfusion.main_flow_ml_s must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
