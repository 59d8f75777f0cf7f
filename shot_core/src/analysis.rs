//! One report per (profile, samples) pair.
//!
//! `analyze` is a pure function of its inputs: no state survives a call and the
//! report contains no hash-ordered collections, so identical inputs serialize
//! to identical bytes.

use serde::Serialize;

use crate::config::AnalysisCfg;
use crate::curve::{self, StageSpans, TargetCurvePoint};
use crate::dynamics;
use crate::error::{AnalysisError, AnalysisFlag, Result};
use crate::narrate::{self, StageAssessment};
use crate::segment::{self, Segmentation};
use crate::types::{Channel, ControlType, ProfileDefinition, TelemetrySample};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotSummary {
    pub sample_count: usize,
    pub duration_s: f64,
    pub final_weight_g: Option<f64>,
    pub peak_pressure_bar: Option<f64>,
    pub peak_flow_ml_s: Option<f64>,
    pub stages_executed: usize,
    pub stages_declared: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStatus {
    OnTarget,
    Over,
    Under,
}

impl WeightStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightStatus::OnTarget => "on target",
            WeightStatus::Over => "over",
            WeightStatus::Under => "under",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightAccuracy {
    pub target_g: f64,
    pub actual_g: f64,
    pub deviation_g: f64,
    pub deviation_pct: Option<f64>,
    pub status: WeightStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreinfusionSummary {
    /// Declared stages before the main extraction.
    pub stages: Vec<String>,
    /// Stage that starts the main extraction, when one is recognised.
    pub main_stage: Option<String>,
    pub executed: bool,
    pub duration_s: f64,
    pub weight_gain_g: Option<f64>,
    pub share_of_shot: Option<f64>,
    pub peak_pressure_bar: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub profile_name: String,
    pub shot: ShotSummary,
    pub weight: Option<WeightAccuracy>,
    pub preinfusion: PreinfusionSummary,
    pub stages: Vec<StageAssessment>,
    pub unreached_stages: Vec<String>,
    pub target_curves: Vec<TargetCurvePoint>,
    pub flags: Vec<AnalysisFlag>,
}

/// Reject inputs that violate caller preconditions.
pub fn validate_inputs(
    profile: &ProfileDefinition,
    samples: &[TelemetrySample],
    cfg: &AnalysisCfg,
) -> Result<()> {
    if profile.stages.is_empty() {
        return Err(AnalysisError::EmptyProfile.into());
    }
    if samples.len() > cfg.max_samples {
        return Err(AnalysisError::TooManySamples {
            count: samples.len(),
            max: cfg.max_samples,
        }
        .into());
    }
    let mut previous = f64::NEG_INFINITY;
    for (index, s) in samples.iter().enumerate() {
        let t = s.elapsed_time_s;
        if !t.is_finite() {
            return Err(AnalysisError::NonFiniteTime { index }.into());
        }
        if t < previous {
            return Err(AnalysisError::UnorderedSamples {
                index,
                time_s: t,
                previous_s: previous,
            }
            .into());
        }
        previous = t;
    }
    Ok(())
}

/// Analyze one shot against its profile.
pub fn analyze(
    profile: &ProfileDefinition,
    samples: &[TelemetrySample],
    cfg: &AnalysisCfg,
) -> Result<AnalysisReport> {
    validate_inputs(profile, samples, cfg)?;
    let mut flags = Vec::new();

    let seg = segment::segment(samples, profile, cfg.transient_window_s);
    let shot = summarize_shot(samples, profile, &seg);

    let mut stages = Vec::with_capacity(profile.stages.len());
    let mut spans = StageSpans::new();
    for stage in &profile.stages {
        match seg.window(&stage.name) {
            Some(window) => {
                for channel in window.stats.missing_channels() {
                    // piston-domain stages flag a missing piston channel in the curve builder
                    if channel == Channel::PistonPosition {
                        continue;
                    }
                    flags.push(AnalysisFlag::MissingChannelData {
                        stage: stage.name.clone(),
                        channel,
                    });
                }
                spans.insert(stage.name.clone(), (window.start_time, window.end_time));
                stages.push(narrate::assess_stage(
                    stage,
                    window,
                    shot.duration_s,
                    &profile.variables,
                    cfg,
                    &mut flags,
                ));
            }
            None => {
                flags.push(AnalysisFlag::EmptyStageWindow {
                    stage: stage.name.clone(),
                });
                stages.push(StageAssessment::not_executed(stage, &profile.variables));
            }
        }
    }

    let target_curves = curve::build_from_telemetry(
        &profile.stages,
        &spans,
        samples,
        &profile.variables,
        &mut flags,
    );
    let preinfusion = summarize_preinfusion(profile, &seg, shot.duration_s, cfg);
    let weight = weight_accuracy(profile.final_weight_target, shot.final_weight_g, cfg);

    dedup_in_order(&mut flags);
    for f in &flags {
        tracing::warn!(flag = %f, "analysis flag");
    }
    tracing::info!(
        profile = %profile.name,
        samples = samples.len(),
        executed = shot.stages_executed,
        unreached = seg.unreached.len(),
        flags = flags.len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        profile_name: profile.name.clone(),
        shot,
        weight,
        preinfusion,
        stages,
        unreached_stages: seg.unreached,
        target_curves,
        flags,
    })
}

/// Mode-B preview for a profile that has not run yet.
pub fn estimate_target_curves(
    profile: &ProfileDefinition,
    cfg: &AnalysisCfg,
) -> Result<(Vec<TargetCurvePoint>, Vec<AnalysisFlag>)> {
    if profile.stages.is_empty() {
        return Err(AnalysisError::EmptyProfile.into());
    }
    let mut flags = Vec::new();
    let points = curve::estimate(profile, cfg.default_stage_duration_s, &mut flags);
    dedup_in_order(&mut flags);
    Ok((points, flags))
}

fn dedup_in_order(flags: &mut Vec<AnalysisFlag>) {
    let mut seen: Vec<AnalysisFlag> = Vec::with_capacity(flags.len());
    flags.retain(|f| {
        if seen.contains(f) {
            false
        } else {
            seen.push(f.clone());
            true
        }
    });
}

fn channel_peak(samples: &[TelemetrySample], channel: Channel) -> Option<f64> {
    samples
        .iter()
        .filter_map(|s| s.read(channel))
        .reduce(f64::max)
}

fn summarize_shot(
    samples: &[TelemetrySample],
    profile: &ProfileDefinition,
    seg: &Segmentation,
) -> ShotSummary {
    let duration_s = match (samples.first(), samples.last()) {
        (Some(a), Some(b)) => b.elapsed_time_s - a.elapsed_time_s,
        _ => 0.0,
    };
    ShotSummary {
        sample_count: samples.len(),
        duration_s,
        final_weight_g: samples.iter().rev().find_map(|s| s.weight_g),
        peak_pressure_bar: channel_peak(samples, Channel::Pressure),
        peak_flow_ml_s: channel_peak(samples, Channel::Flow),
        stages_executed: seg.windows.len(),
        stages_declared: profile.stages.len(),
    }
}

fn weight_accuracy(
    target: Option<f64>,
    actual: Option<f64>,
    cfg: &AnalysisCfg,
) -> Option<WeightAccuracy> {
    let (target_g, actual_g) = (target?, actual?);
    let deviation_g = actual_g - target_g;
    let status = if deviation_g.abs() <= cfg.weight_tolerance_g {
        WeightStatus::OnTarget
    } else if deviation_g > 0.0 {
        WeightStatus::Over
    } else {
        WeightStatus::Under
    };
    Some(WeightAccuracy {
        target_g,
        actual_g,
        deviation_g,
        deviation_pct: (target_g > 0.0).then(|| deviation_g / target_g * 100.0),
        status,
    })
}

/// Index of the first stage that belongs to the main extraction.
///
/// That is the first pressure stage aiming at `main_pressure_bar` or more, or the
/// first flow stage after the opening one aiming at `main_flow_ml_s` or more.
pub fn main_stage_index(profile: &ProfileDefinition, cfg: &AnalysisCfg) -> Option<usize> {
    profile.stages.iter().enumerate().position(|(i, stage)| {
        let Some(peak) = dynamics::stage_peak_target(stage, &profile.variables) else {
            return false;
        };
        match stage.control_type {
            ControlType::Pressure => peak >= cfg.preinfusion.main_pressure_bar,
            ControlType::Flow => i > 0 && peak >= cfg.preinfusion.main_flow_ml_s,
            ControlType::Power => false,
        }
    })
}

fn summarize_preinfusion(
    profile: &ProfileDefinition,
    seg: &Segmentation,
    shot_duration_s: f64,
    cfg: &AnalysisCfg,
) -> PreinfusionSummary {
    let Some(main) = main_stage_index(profile, cfg).filter(|&i| i > 0) else {
        return PreinfusionSummary::default();
    };
    let pre = &profile.stages[..main];
    let windows: Vec<_> = pre
        .iter()
        .filter_map(|s| seg.window(&s.name))
        .collect();

    let duration_s = match (windows.first(), windows.last()) {
        (Some(a), Some(b)) => b.end_time - a.start_time,
        _ => 0.0,
    };
    let weights: Vec<f64> = windows
        .iter()
        .filter_map(|w| w.stats.weight.map(|s| s.end))
        .collect();
    let first_weight = windows.iter().find_map(|w| w.stats.weight.map(|s| s.start));
    let weight_gain_g = first_weight.zip(weights.last().copied()).map(|(a, b)| b - a);
    let peak_pressure_bar = windows
        .iter()
        .filter_map(|w| w.stats.pressure.map(|s| s.max))
        .reduce(f64::max);

    PreinfusionSummary {
        stages: pre.iter().map(|s| s.name.clone()).collect(),
        main_stage: Some(profile.stages[main].name.clone()),
        executed: !windows.is_empty(),
        duration_s,
        weight_gain_g,
        share_of_shot: (shot_duration_s > 0.0).then(|| duration_s / shot_duration_s),
        peak_pressure_bar,
    }
}
