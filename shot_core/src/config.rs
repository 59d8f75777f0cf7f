//! Configuration types for the analysis engine.
//!
//! These are the runtime configuration structs used by the analyzers.
//! They are separate from the TOML-deserialized config in `shot_config`.

use crate::types::{ConditionKind, ControlType};

/// Seconds from stage start whose flow readings are excluded from avg/max/min.
pub const FLOW_TRANSIENT_WINDOW_S: f64 = 3.5;
/// Minimum |end - start| before a stage counts as rising or declining.
pub const TREND_STEADY_THRESHOLD: f64 = 0.5;
/// Fraction of the target an upward goal must reach to count as reached.
pub const REACH_TOLERANCE: f64 = 0.95;
/// Duration assumed for a stage without a time exit trigger in profile-only estimates.
pub const DEFAULT_STAGE_DURATION_S: f64 = 10.0;
/// Inputs above this many samples are rejected.
pub const DEFAULT_MAX_SAMPLES: usize = 50_000;

/// Per-channel steady-state thresholds for trend classification.
#[derive(Debug, Clone)]
pub struct TrendCfg {
    pub pressure_bar: f64,
    pub flow_ml_s: f64,
    pub power: f64,
}

impl TrendCfg {
    pub fn threshold(&self, control: ControlType) -> f64 {
        match control {
            ControlType::Pressure => self.pressure_bar,
            ControlType::Flow => self.flow_ml_s,
            ControlType::Power => self.power,
        }
    }
}

impl Default for TrendCfg {
    fn default() -> Self {
        Self {
            pressure_bar: TREND_STEADY_THRESHOLD,
            flow_ml_s: TREND_STEADY_THRESHOLD,
            power: TREND_STEADY_THRESHOLD,
        }
    }
}

/// Slack granted to exit conditions, per measured quantity.
#[derive(Debug, Clone)]
pub struct TriggerCfg {
    pub time_s: f64,
    pub weight_g: f64,
    pub pressure_bar: f64,
    pub flow_ml_s: f64,
    pub piston_position: f64,
}

impl TriggerCfg {
    pub fn tolerance(&self, kind: ConditionKind) -> f64 {
        match kind {
            ConditionKind::Time => self.time_s,
            ConditionKind::Weight => self.weight_g,
            ConditionKind::Pressure => self.pressure_bar,
            ConditionKind::Flow => self.flow_ml_s,
            ConditionKind::PistonPosition => self.piston_position,
            ConditionKind::Power | ConditionKind::UserInteraction => 0.0,
        }
    }

    /// No slack at all; conditions compare exactly.
    pub fn exact() -> Self {
        Self {
            time_s: 0.0,
            weight_g: 0.0,
            pressure_bar: 0.0,
            flow_ml_s: 0.0,
            piston_position: 0.0,
        }
    }
}

impl Default for TriggerCfg {
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

/// Thresholds that mark where pre-infusion ends and the main extraction starts.
#[derive(Debug, Clone)]
pub struct PreinfusionCfg {
    pub main_pressure_bar: f64,
    pub main_flow_ml_s: f64,
}

impl Default for PreinfusionCfg {
    fn default() -> Self {
        Self {
            main_pressure_bar: 6.0,
            main_flow_ml_s: 1.5,
        }
    }
}

/// Everything the orchestrator needs besides the profile and the samples.
#[derive(Debug, Clone)]
pub struct AnalysisCfg {
    /// See [`FLOW_TRANSIENT_WINDOW_S`].
    pub transient_window_s: f64,
    /// See [`REACH_TOLERANCE`].
    pub reach_tolerance: f64,
    /// See [`DEFAULT_STAGE_DURATION_S`].
    pub default_stage_duration_s: f64,
    pub max_samples: usize,
    /// Final weight within this many grams of the target is on target.
    pub weight_tolerance_g: f64,
    pub trend: TrendCfg,
    pub triggers: TriggerCfg,
    pub preinfusion: PreinfusionCfg,
}

impl Default for AnalysisCfg {
    fn default() -> Self {
        Self {
            transient_window_s: FLOW_TRANSIENT_WINDOW_S,
            reach_tolerance: REACH_TOLERANCE,
            default_stage_duration_s: DEFAULT_STAGE_DURATION_S,
            max_samples: DEFAULT_MAX_SAMPLES,
            weight_tolerance_g: 1.0,
            trend: TrendCfg::default(),
            triggers: TriggerCfg::default(),
            preinfusion: PreinfusionCfg::default(),
        }
    }
}
