//! Attribute which exit condition ended a stage.
//!
//! The value attributed to a condition depends on its direction:
//! - `>=` reads the channel's maximum over the window (did it ever get there),
//! - `<=` reads the value at the end of the window (where a declining channel
//!   settled), not the minimum.
//!
//! Zero is an ordinary reading in both cases.

use serde::Serialize;

use crate::config::TriggerCfg;
use crate::dynamics;
use crate::error::AnalysisFlag;
use crate::segment::StageWindow;
use crate::types::{Comparison, Condition, ConditionKind, Variable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerResult {
    pub kind: ConditionKind,
    pub comparison: Comparison,
    pub relative: bool,
    /// Resolved threshold; `None` when it references an unknown variable.
    pub target: Option<f64>,
    /// Value attributed from telemetry; `None` when the quantity was not recorded.
    pub actual: Option<f64>,
    pub triggered: bool,
}

impl TriggerResult {
    /// Short label such as `weight >= 36.0 g`.
    pub fn describe(&self) -> String {
        let unit = self.kind.unit();
        let target = self
            .target
            .map_or_else(|| "?".to_string(), |t| format!("{t:.1}"));
        let prefix = if self.relative { "relative " } else { "" };
        format!(
            "{prefix}{} {} {target}{}{unit}",
            self.kind.as_str(),
            self.comparison.symbol(),
            if unit.is_empty() { "" } else { " " }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExitEvaluation {
    /// One entry per declared condition, in declaration order.
    pub results: Vec<TriggerResult>,
    /// Indices into `results` of every satisfied condition.
    pub satisfied: Vec<usize>,
    /// First satisfied condition in declaration order.
    pub primary: Option<usize>,
}

impl ExitEvaluation {
    pub fn primary_result(&self) -> Option<&TriggerResult> {
        self.primary.and_then(|i| self.results.get(i))
    }

    /// Result of the first time condition, if the stage declares one.
    pub fn time_result(&self) -> Option<&TriggerResult> {
        self.results.iter().find(|r| r.kind == ConditionKind::Time)
    }
}

/// Value of `kind` attributed to `window` for a condition in direction `cmp`.
pub fn attributed_value(
    window: &StageWindow,
    kind: ConditionKind,
    cmp: Comparison,
    relative: bool,
) -> Option<f64> {
    if kind == ConditionKind::Time {
        // Time only grows, so max and end coincide.
        return Some(if relative {
            window.duration
        } else {
            window.end_time
        });
    }
    let stats = window.stats.channel(kind.channel()?)?;
    let raw = match cmp {
        Comparison::AtLeast => stats.max,
        Comparison::AtMost => stats.end,
    };
    Some(if relative { raw - stats.start } else { raw })
}

/// Evaluate every exit condition of a stage against its window.
pub fn evaluate(
    window: &StageWindow,
    conditions: &[Condition],
    variables: &[Variable],
    tolerances: &TriggerCfg,
    flags: &mut Vec<AnalysisFlag>,
) -> ExitEvaluation {
    let mut eval = ExitEvaluation::default();
    for (idx, cond) in conditions.iter().enumerate() {
        let target = dynamics::resolve_number(&cond.value, variables, &window.stage_name, flags);
        let actual = attributed_value(window, cond.kind, cond.comparison, cond.relative);
        let triggered = match (actual, target) {
            (Some(a), Some(t)) => cond
                .comparison
                .holds(a, t, tolerances.tolerance(cond.kind)),
            _ => false,
        };
        if triggered {
            eval.satisfied.push(idx);
            eval.primary.get_or_insert(idx);
        }
        eval.results.push(TriggerResult {
            kind: cond.kind,
            comparison: cond.comparison,
            relative: cond.relative,
            target,
            actual,
            triggered,
        });
    }
    if let Some(primary) = eval.primary_result() {
        tracing::debug!(
            stage = %window.stage_name,
            trigger = %primary.describe(),
            actual = primary.actual,
            "exit trigger attributed"
        );
    }
    eval
}

/// A safety limit checked against a stage window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitCheck {
    pub kind: ConditionKind,
    pub comparison: Comparison,
    pub limit: Option<f64>,
    /// Peak (for ceilings) or trough (for floors) reached during the stage.
    pub extreme: Option<f64>,
    pub hit: bool,
}

/// Check each limit: a `<=` ceiling is hit when the channel's max reaches it,
/// a `>=` floor when the channel's min falls to it.
pub fn check_limits(
    window: &StageWindow,
    limits: &[Condition],
    variables: &[Variable],
    tolerances: &TriggerCfg,
    flags: &mut Vec<AnalysisFlag>,
) -> Vec<LimitCheck> {
    limits
        .iter()
        .map(|cond| {
            let limit = dynamics::resolve_number(&cond.value, variables, &window.stage_name, flags);
            let extreme = if cond.kind == ConditionKind::Time {
                Some(window.duration)
            } else {
                cond.kind
                    .channel()
                    .and_then(|c| window.stats.channel(c))
                    .map(|s| match cond.comparison {
                        Comparison::AtMost => s.max,
                        Comparison::AtLeast => s.min,
                    })
            };
            let slack = tolerances.tolerance(cond.kind);
            let hit = match (extreme, limit) {
                (Some(x), Some(l)) => match cond.comparison {
                    Comparison::AtMost => x >= l - slack,
                    Comparison::AtLeast => x <= l + slack,
                },
                _ => false,
            };
            LimitCheck {
                kind: cond.kind,
                comparison: cond.comparison,
                limit,
                extreme,
                hit,
            }
        })
        .collect()
}
