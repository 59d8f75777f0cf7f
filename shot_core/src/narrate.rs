//! Trend labels and per-stage execution assessment.

use serde::Serialize;

use crate::config::AnalysisCfg;
use crate::dynamics::{self, TargetDirection};
use crate::error::AnalysisFlag;
use crate::exit::{self, ExitEvaluation, LimitCheck};
use crate::segment::StageWindow;
use crate::stats::ChannelStats;
use crate::types::{Channel, ControlType, StageDefinition, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Steady,
    Rising,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDescription {
    pub trend: Trend,
    pub text: String,
}

/// Classify a stage's realized movement on its controlled channel.
///
/// Steady when `|end - start| < threshold`, otherwise rising or declining.
pub fn describe_trend(
    control: ControlType,
    duration: f64,
    start: f64,
    end: f64,
    max: f64,
    threshold: f64,
) -> TrendDescription {
    let unit = control.unit();
    let label = capitalize(control.as_str());
    let trend = if (end - start).abs() < threshold {
        Trend::Steady
    } else if end > start {
        Trend::Rising
    } else {
        Trend::Declining
    };
    let text = match trend {
        Trend::Steady => {
            format!("{label} held steady around {end:.1} {unit} for {duration:.1}s")
        }
        Trend::Rising => format!(
            "{label} rose from {start:.1} to {end:.1} {unit} over {duration:.1}s (peak {max:.1} {unit})"
        ),
        Trend::Declining => {
            format!("{label} declined from {start:.1} to {end:.1} {unit} over {duration:.1}s")
        }
    };
    TrendDescription { trend, text }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Goal reached and the stage ran its course.
    Reached,
    /// Stage ended before its time trigger; see the message for whether the goal was met.
    Incomplete,
    NotReached,
    /// No telemetry for the controlled channel, or the target did not resolve.
    Unverified,
    NotExecuted,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Reached => "reached",
            StageStatus::Incomplete => "incomplete",
            StageStatus::NotReached => "not_reached",
            StageStatus::Unverified => "unverified",
            StageStatus::NotExecuted => "not_executed",
        }
    }
}

/// How the achieved value is read for a control type.
#[derive(Debug, Clone, Copy)]
pub struct AchievedRule {
    pub control: ControlType,
    pub channel: Channel,
    pub pick: fn(&ChannelStats) -> f64,
    /// Verb used in messages ("ended at", "peaked at").
    pub verb: &'static str,
}

fn pick_end(s: &ChannelStats) -> f64 {
    s.end
}

fn pick_max(s: &ChannelStats) -> f64 {
    s.max
}

/// Flow is judged where it ended (the opening spike is transient); pressure by its peak.
pub const ACHIEVED_RULES: &[AchievedRule] = &[
    AchievedRule {
        control: ControlType::Flow,
        channel: Channel::Flow,
        pick: pick_end,
        verb: "ended at",
    },
    AchievedRule {
        control: ControlType::Pressure,
        channel: Channel::Pressure,
        pick: pick_max,
        verb: "peaked at",
    },
];

pub fn achieved_rule(control: ControlType) -> Option<&'static AchievedRule> {
    ACHIEVED_RULES.iter().find(|r| r.control == control)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageAssessment {
    pub stage_name: String,
    pub control_type: ControlType,
    pub executed: bool,
    pub profile_target: Option<f64>,
    pub achieved_value: Option<f64>,
    pub status: StageStatus,
    pub message: String,
    pub duration_s: Option<f64>,
    /// Fraction of the whole shot spent in this stage.
    pub share_of_shot: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitEvaluation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub limits_hit: Vec<LimitCheck>,
}

impl StageAssessment {
    pub fn not_executed(stage: &StageDefinition, variables: &[Variable]) -> Self {
        let mut scratch = Vec::new();
        Self {
            stage_name: stage.name.clone(),
            control_type: stage.control_type,
            executed: false,
            profile_target: dynamics::stage_target(stage, variables, &mut scratch),
            achieved_value: None,
            status: StageStatus::NotExecuted,
            message: "Stage was never reached".to_string(),
            duration_s: None,
            share_of_shot: None,
            trend: None,
            exit: None,
            limits_hit: Vec::new(),
        }
    }
}

/// Whether the stage stopped before its time trigger would have fired.
///
/// Window duration spans first to last sample, so it reads one sample interval
/// short of the stage's wall-clock length; `[triggers] time_s` absorbs that gap
/// and should be at least the recording interval.
fn ended_early(exit: &ExitEvaluation) -> bool {
    exit.time_result().is_some_and(|t| !t.triggered)
}

/// Upward goals count as reached at `target × tolerance` or above, downward
/// goals at `target / tolerance` or below.
#[inline]
fn goal_reached(achieved: f64, target: f64, tolerance: f64, direction: TargetDirection) -> bool {
    match direction {
        TargetDirection::Upward => achieved >= target * tolerance,
        TargetDirection::Downward => achieved <= target / tolerance,
    }
}

/// Assess one executed stage against its declared target.
pub fn assess_stage(
    stage: &StageDefinition,
    window: &StageWindow,
    shot_duration_s: f64,
    variables: &[Variable],
    cfg: &AnalysisCfg,
    flags: &mut Vec<AnalysisFlag>,
) -> StageAssessment {
    let target = dynamics::stage_target(stage, variables, flags);
    let exit = exit::evaluate(window, &stage.exit_triggers, variables, &cfg.triggers, flags);
    let limits_hit: Vec<LimitCheck> =
        exit::check_limits(window, &stage.limits, variables, &cfg.triggers, flags)
            .into_iter()
            .filter(|l| l.hit)
            .collect();

    let direction = dynamics::target_direction(stage, variables);
    let rule = achieved_rule(stage.control_type);
    let stats = rule.and_then(|r| window.stats.channel(r.channel));
    // a declining target is judged where the channel ended, never by its peak
    let (pick, verb) = match (rule, direction) {
        (Some(r), TargetDirection::Upward) => (r.pick, r.verb),
        _ => (pick_end as fn(&ChannelStats) -> f64, "ended at"),
    };
    let achieved = stats.map(pick);
    let trend = stats.map(|s| {
        describe_trend(
            stage.control_type,
            window.duration,
            s.start,
            s.end,
            s.max,
            cfg.trend.threshold(stage.control_type),
        )
    });

    let unit = stage.control_type.unit();
    let control = stage.control_type.as_str();
    let early = ended_early(&exit);
    let how = exit
        .primary_result()
        .map_or_else(|| "without a matching exit trigger".to_string(), |p| {
            format!("via {}", p.describe())
        });

    let (status, message) = match (rule, achieved, target) {
        (None, _, _) => (
            StageStatus::Unverified,
            format!("{control} is not recorded in telemetry; target cannot be verified"),
        ),
        (Some(r), None, _) => (
            StageStatus::Unverified,
            format!("No {} readings during this stage", r.channel),
        ),
        (Some(_), Some(_), None) => (
            StageStatus::Unverified,
            "Stage target did not resolve to a number".to_string(),
        ),
        (Some(_), Some(a), Some(t)) => {
            let reached = goal_reached(a, t, cfg.reach_tolerance, direction);
            let detail = format!("{control} {verb} {a:.1} {unit} (target {t:.1} {unit})");
            match (early, reached) {
                (true, true) => (
                    StageStatus::Incomplete,
                    format!(
                        "Ended early {how} after {:.1}s, goal reached: {detail}",
                        window.duration
                    ),
                ),
                (true, false) => (
                    StageStatus::NotReached,
                    format!(
                        "Ended early {how} after {:.1}s before reaching the goal: {detail}",
                        window.duration
                    ),
                ),
                (false, true) => (StageStatus::Reached, format!("Goal reached: {detail}")),
                (false, false) => (StageStatus::NotReached, format!("Goal not reached: {detail}")),
            }
        }
    };

    let share = if shot_duration_s > 0.0 {
        Some(window.duration / shot_duration_s)
    } else {
        None
    };

    StageAssessment {
        stage_name: stage.name.clone(),
        control_type: stage.control_type,
        executed: true,
        profile_target: target,
        achieved_value: achieved,
        status,
        message,
        duration_s: Some(window.duration),
        share_of_shot: share,
        trend,
        exit: Some(exit),
        limits_hit,
    }
}
