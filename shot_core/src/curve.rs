//! Time-aligned target overlays built from a profile's dynamics.
//!
//! Two modes share one output shape:
//!
//! - [`build_from_telemetry`] anchors each reached stage to where it actually
//!   ran. Time-domain breakpoints are offsets from the real stage start (clamped
//!   to the real duration); weight and piston domains are mapped to shot time
//!   through the recorded channel-vs-time curve.
//! - [`estimate`] previews a profile that has not run yet. Stage lengths come
//!   from the first time exit trigger (or a default) and breakpoint positions
//!   are rescaled to fill that length.
//!
//! All curves are piecewise-linear, including stages declared with `curve`
//! interpolation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dynamics;
use crate::error::AnalysisFlag;
use crate::interpolate::{first_crossing_pairs, interpolate};
use crate::types::{
    Channel, ControlType, Domain, ProfileDefinition, StageDefinition, TelemetrySample, Variable,
};

/// Actual `(start, end)` shot time of each reached stage, keyed by stage name.
pub type StageSpans = BTreeMap<String, (f64, f64)>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetCurvePoint {
    pub time_s: f64,
    pub stage_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_flow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_power: Option<f64>,
}

impl TargetCurvePoint {
    pub fn new(time_s: f64, stage_name: &str, control: ControlType, value: f64) -> Self {
        let mut p = Self {
            time_s,
            stage_name: stage_name.to_string(),
            target_pressure: None,
            target_flow: None,
            target_power: None,
        };
        match control {
            ControlType::Pressure => p.target_pressure = Some(value),
            ControlType::Flow => p.target_flow = Some(value),
            ControlType::Power => p.target_power = Some(value),
        }
        p
    }

    /// Whichever target field is set.
    pub fn target(&self) -> Option<f64> {
        self.target_pressure
            .or(self.target_flow)
            .or(self.target_power)
    }
}

/// Mode A: overlay anchored to the real stage timings.
pub fn build_from_telemetry(
    stages: &[StageDefinition],
    spans: &StageSpans,
    samples: &[TelemetrySample],
    variables: &[Variable],
    flags: &mut Vec<AnalysisFlag>,
) -> Vec<TargetCurvePoint> {
    let mut out = Vec::new();
    for stage in stages {
        let Some(&(start, end)) = spans.get(&stage.name) else {
            continue;
        };
        let points = dynamics::resolved_points(stage, variables, flags);
        if points.is_empty() {
            continue;
        }
        let duration = (end - start).max(0.0);
        match stage.dynamics.domain {
            Domain::Time => {
                for (pos, value) in points {
                    let t = start + pos.clamp(0.0, duration);
                    out.push(TargetCurvePoint::new(t, &stage.name, stage.control_type, value));
                }
            }
            Domain::Weight | Domain::PistonPosition => {
                let channel = match stage.dynamics.domain {
                    Domain::Weight => Channel::Weight,
                    _ => Channel::PistonPosition,
                };
                let Some(progress) = progress_curve(samples, start, end, channel) else {
                    flags.push(AnalysisFlag::MissingChannelData {
                        stage: stage.name.clone(),
                        channel,
                    });
                    continue;
                };
                for (pos, value) in points {
                    // progress is non-empty, so interpolation always yields a time
                    if let Some(t) = interpolate(&progress, pos) {
                        out.push(TargetCurvePoint::new(t, &stage.name, stage.control_type, value));
                    }
                }
            }
        }
    }
    out
}

/// Channel progress since stage start mapped to shot time, first crossing wins.
///
/// Weight is measured relative to the stage's opening reading; piston position is
/// taken as recorded.
fn progress_curve(
    samples: &[TelemetrySample],
    start: f64,
    end: f64,
    channel: Channel,
) -> Option<Vec<(f64, f64)>> {
    let in_span = samples
        .iter()
        .filter(|s| s.elapsed_time_s >= start && s.elapsed_time_s <= end)
        .filter_map(|s| s.read(channel).map(|v| (v, s.elapsed_time_s)));
    let readings: Vec<(f64, f64)> = in_span.collect();
    let base = match channel {
        Channel::Weight => readings.first()?.0,
        _ => 0.0,
    };
    let pairs = first_crossing_pairs(readings.into_iter().map(|(v, t)| (v - base, t)));
    if pairs.is_empty() { None } else { Some(pairs) }
}

/// Estimated length of a stage that has not run: its first time exit trigger, or `default_s`.
pub fn estimated_duration(
    stage: &StageDefinition,
    variables: &[Variable],
    default_s: f64,
    flags: &mut Vec<AnalysisFlag>,
) -> f64 {
    stage
        .time_trigger()
        .and_then(|c| dynamics::resolve_number(&c.value, variables, &stage.name, flags))
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(default_s)
}

/// Mode B: profile-only preview with stages laid end to end from t = 0.
pub fn estimate(
    profile: &ProfileDefinition,
    default_stage_duration_s: f64,
    flags: &mut Vec<AnalysisFlag>,
) -> Vec<TargetCurvePoint> {
    let mut out = Vec::new();
    let mut stage_start = 0.0;
    for stage in &profile.stages {
        let duration =
            estimated_duration(stage, &profile.variables, default_stage_duration_s, flags);
        // scale by the last declared breakpoint, whether or not its value resolves
        let last_pos = dynamics::valid_points(stage)
            .0
            .last()
            .map_or(0.0, |bp| bp.position);
        let points = dynamics::resolved_points(stage, &profile.variables, flags);
        let scale = if last_pos > 0.0 {
            duration / last_pos
        } else {
            1.0
        };
        for (pos, value) in points {
            out.push(TargetCurvePoint::new(
                stage_start + pos * scale,
                &stage.name,
                stage.control_type,
                value,
            ));
        }
        stage_start += duration;
    }
    out
}
