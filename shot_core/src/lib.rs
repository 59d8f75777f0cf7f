#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Espresso extraction analysis engine (IO-free).
//!
//! Compares a shot's recorded telemetry against the extraction profile that
//! drove it and explains where the run diverged from intent. Inputs arrive
//! fully materialized; nothing here performs IO or keeps state between calls.
//!
//! ## Architecture
//!
//! - **Interpolation**: piecewise-linear axis mapping (`interpolate`)
//! - **Dynamics**: `$variable` resolution and breakpoint checks (`dynamics`)
//! - **Segmentation**: samples split into per-stage windows (`segment`)
//! - **Statistics**: per-channel aggregates with flow transient suppression (`stats`)
//! - **Exit triggers**: which condition ended a stage, and at what value (`exit`)
//! - **Target curves**: overlays from telemetry or from the profile alone (`curve`)
//! - **Narration**: trend labels and stage assessments (`narrate`)
//! - **Orchestration**: one report per shot (`analysis`), many shots in parallel (`batch`)
//!
//! ## Units
//!
//! Seconds, grams, bar and ml/s throughout; no other units are introduced.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod conversions;
pub mod curve;
pub mod dynamics;
pub mod error;
pub mod exit;
pub mod interpolate;
pub mod narrate;
pub mod segment;
pub mod stats;
pub mod types;

pub use analysis::{
    AnalysisReport, PreinfusionSummary, ShotSummary, WeightAccuracy, WeightStatus, analyze,
    estimate_target_curves,
};
pub use batch::analyze_batch;
pub use config::{AnalysisCfg, PreinfusionCfg, TrendCfg, TriggerCfg};
pub use curve::{StageSpans, TargetCurvePoint};
pub use error::{AnalysisError, AnalysisFlag, Result};
pub use narrate::{StageAssessment, StageStatus, Trend, TrendDescription};
pub use segment::{Segmentation, StageWindow};
pub use stats::{ChannelStats, WindowStats};
pub use types::{
    Breakpoint, Channel, Comparison, Condition, ConditionKind, ControlType, Domain, DynamicValue,
    Dynamics, Interpolation, ProfileDefinition, StageDefinition, TelemetrySample, Variable,
};
