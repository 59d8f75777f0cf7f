//! Breakpoint value resolution and dynamics sanity checks.
//!
//! Variable substitution is a lookup performed wherever a value is read
//! (statistics, triggers, assessments, curves); profiles are never rewritten.

use serde::Serialize;

use crate::error::AnalysisFlag;
use crate::types::{Breakpoint, DynamicValue, Interpolation, StageDefinition, Variable};

/// Prefix that marks a value as a variable reference (`"$key"`).
pub const REFERENCE_MARKER: char = '$';

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Number(f64),
    /// The original reference text, kept as a placeholder.
    Unresolved(String),
}

impl ResolvedValue {
    pub fn number(&self) -> Option<f64> {
        match self {
            ResolvedValue::Number(v) => Some(*v),
            ResolvedValue::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: ResolvedValue,
    /// Variable name for references (bare key when unresolved); `None` for literals.
    pub display_name: Option<String>,
}

impl Resolved {
    pub fn number(&self) -> Option<f64> {
        self.value.number()
    }

    /// Bare key of an unresolved reference.
    pub fn unresolved_key(&self) -> Option<&str> {
        match self.value {
            ResolvedValue::Unresolved(_) => self.display_name.as_deref(),
            ResolvedValue::Number(_) => None,
        }
    }
}

/// Resolve a literal or `"$key"` reference against `variables`.
///
/// Never fails: an unknown key comes back as [`ResolvedValue::Unresolved`]
/// holding the original text, with the bare key as display name.
pub fn resolve(value: &DynamicValue, variables: &[Variable]) -> Resolved {
    match value {
        DynamicValue::Number(v) => Resolved {
            value: ResolvedValue::Number(*v),
            display_name: None,
        },
        DynamicValue::Reference(raw) => {
            let key = raw.strip_prefix(REFERENCE_MARKER).unwrap_or(raw);
            match variables.iter().find(|v| v.key == key) {
                Some(var) => Resolved {
                    value: ResolvedValue::Number(var.value),
                    display_name: Some(if var.name.is_empty() {
                        var.key.clone()
                    } else {
                        var.name.clone()
                    }),
                },
                None => Resolved {
                    value: ResolvedValue::Unresolved(raw.clone()),
                    display_name: Some(key.to_string()),
                },
            }
        }
    }
}

/// Resolve to a number, recording an [`AnalysisFlag::UnresolvedVariable`] on failure.
pub fn resolve_number(
    value: &DynamicValue,
    variables: &[Variable],
    stage: &str,
    flags: &mut Vec<AnalysisFlag>,
) -> Option<f64> {
    let r = resolve(value, variables);
    if let Some(key) = r.unresolved_key() {
        flags.push(AnalysisFlag::UnresolvedVariable {
            stage: stage.to_string(),
            key: key.to_string(),
        });
    }
    r.number()
}

/// Longest leading run of breakpoints with finite, non-decreasing positions,
/// plus a [`AnalysisFlag::MalformedDynamics`] when the stage's points were cut
/// or too few remain for its interpolation.
pub fn valid_points(stage: &StageDefinition) -> (&[Breakpoint], Option<AnalysisFlag>) {
    let points = &stage.dynamics.points;
    let mut end = 0;
    let mut prev = f64::NEG_INFINITY;
    for p in points {
        if !p.position.is_finite() || p.position < prev {
            break;
        }
        prev = p.position;
        end += 1;
    }
    let valid = &points[..end];

    let min = stage.dynamics.interpolation.min_points();
    let reason = if end < points.len() {
        Some(format!(
            "breakpoint #{} is out of order; using the first {end} of {}",
            end + 1,
            points.len()
        ))
    } else if valid.len() < min {
        let interp = match stage.dynamics.interpolation {
            Interpolation::Linear => "linear",
            Interpolation::Curve => "curve",
        };
        Some(format!(
            "{} breakpoint(s), {interp} interpolation needs at least {min}",
            valid.len()
        ))
    } else {
        None
    };
    let flag = reason.map(|reason| AnalysisFlag::MalformedDynamics {
        stage: stage.name.clone(),
        reason,
    });
    (valid, flag)
}

/// Valid breakpoints of a stage as `(position, value)` pairs, skipping values that
/// do not resolve. All problems are appended to `flags`.
pub fn resolved_points(
    stage: &StageDefinition,
    variables: &[Variable],
    flags: &mut Vec<AnalysisFlag>,
) -> Vec<(f64, f64)> {
    let (valid, malformed) = valid_points(stage);
    flags.extend(malformed);
    valid
        .iter()
        .filter_map(|bp| {
            resolve_number(&bp.value, variables, &stage.name, flags).map(|v| (bp.position, v))
        })
        .collect()
}

/// Resolved value of the last usable breakpoint: the level the stage drives toward.
pub fn stage_target(
    stage: &StageDefinition,
    variables: &[Variable],
    flags: &mut Vec<AnalysisFlag>,
) -> Option<f64> {
    let (valid, _) = valid_points(stage);
    let last = valid.last()?;
    resolve_number(&last.value, variables, &stage.name, flags)
}

/// Which way a stage's declared dynamics move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDirection {
    Upward,
    Downward,
}

/// Downward when the last resolved breakpoint sits below the first; a single
/// point (or a flat line) counts as upward.
pub fn target_direction(stage: &StageDefinition, variables: &[Variable]) -> TargetDirection {
    let (valid, _) = valid_points(stage);
    let mut values = valid
        .iter()
        .filter_map(|bp| resolve(&bp.value, variables).number());
    match (values.next(), values.last()) {
        (Some(first), Some(last)) if last < first => TargetDirection::Downward,
        _ => TargetDirection::Upward,
    }
}

/// Highest resolved breakpoint value of a stage.
pub fn stage_peak_target(stage: &StageDefinition, variables: &[Variable]) -> Option<f64> {
    let (valid, _) = valid_points(stage);
    valid
        .iter()
        .filter_map(|bp| resolve(&bp.value, variables).number())
        .reduce(f64::max)
}
