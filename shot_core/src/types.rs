//! Canonical in-memory profile and telemetry types.
//!
//! Everything here is built once per request by the ingestion adapters in
//! `conversions` and is read-only afterwards.

use serde::Serialize;
use std::fmt;

/// One timestamped sensor reading. Channels are optional: a channel that was
/// not recorded is `None`, which is different from a recorded `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub elapsed_time_s: f64,
    pub stage_label: String,
    pub weight_g: Option<f64>,
    pub pressure_bar: Option<f64>,
    pub flow_ml_s: Option<f64>,
    pub piston_position: Option<f64>,
}

impl TelemetrySample {
    /// Sample with only a time and label; channels filled with the `with_*` setters.
    pub fn new(elapsed_time_s: f64, stage_label: impl Into<String>) -> Self {
        Self {
            elapsed_time_s,
            stage_label: stage_label.into(),
            weight_g: None,
            pressure_bar: None,
            flow_ml_s: None,
            piston_position: None,
        }
    }

    pub fn with_weight(mut self, g: f64) -> Self {
        self.weight_g = Some(g);
        self
    }

    pub fn with_pressure(mut self, bar: f64) -> Self {
        self.pressure_bar = Some(bar);
        self
    }

    pub fn with_flow(mut self, ml_s: f64) -> Self {
        self.flow_ml_s = Some(ml_s);
        self
    }

    pub fn with_piston(mut self, pos: f64) -> Self {
        self.piston_position = Some(pos);
        self
    }

    #[inline]
    pub fn read(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Weight => self.weight_g,
            Channel::Pressure => self.pressure_bar,
            Channel::Flow => self.flow_ml_s,
            Channel::PistonPosition => self.piston_position,
        }
    }
}

/// Recorded telemetry channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Weight,
    Pressure,
    Flow,
    PistonPosition,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Weight,
        Channel::Pressure,
        Channel::Flow,
        Channel::PistonPosition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Weight => "weight",
            Channel::Pressure => "pressure",
            Channel::Flow => "flow",
            Channel::PistonPosition => "piston_position",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Channel::Weight => "g",
            Channel::Pressure => "bar",
            Channel::Flow => "ml/s",
            Channel::PistonPosition => "mm",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The channel a stage drives toward its target curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    Power,
    Flow,
    Pressure,
}

impl ControlType {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlType::Power => "power",
            ControlType::Flow => "flow",
            ControlType::Pressure => "pressure",
        }
    }

    /// Telemetry channel that measures this control; power is not recorded.
    pub fn channel(self) -> Option<Channel> {
        match self {
            ControlType::Power => None,
            ControlType::Flow => Some(Channel::Flow),
            ControlType::Pressure => Some(Channel::Pressure),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ControlType::Power => "%",
            ControlType::Flow => "ml/s",
            ControlType::Pressure => "bar",
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis a stage's breakpoints are laid out over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Time,
    Weight,
    PistonPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Rendered piecewise-linear for overlays.
    Curve,
}

impl Interpolation {
    /// Fewest breakpoints that make the declared interpolation meaningful.
    pub fn min_points(self) -> usize {
        match self {
            Interpolation::Linear => 1,
            Interpolation::Curve => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::AtLeast => ">=",
            Comparison::AtMost => "<=",
        }
    }

    /// Whether `actual` satisfies the comparison against `target`, granting `slack` in the
    /// satisfying direction.
    #[inline]
    pub fn holds(self, actual: f64, target: f64, slack: f64) -> bool {
        match self {
            Comparison::AtLeast => actual >= target - slack,
            Comparison::AtMost => actual <= target + slack,
        }
    }
}

/// What a condition measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Time,
    Weight,
    Pressure,
    Flow,
    PistonPosition,
    Power,
    UserInteraction,
}

impl ConditionKind {
    pub fn channel(self) -> Option<Channel> {
        match self {
            ConditionKind::Weight => Some(Channel::Weight),
            ConditionKind::Pressure => Some(Channel::Pressure),
            ConditionKind::Flow => Some(Channel::Flow),
            ConditionKind::PistonPosition => Some(Channel::PistonPosition),
            ConditionKind::Time | ConditionKind::Power | ConditionKind::UserInteraction => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionKind::Time => "time",
            ConditionKind::Weight => "weight",
            ConditionKind::Pressure => "pressure",
            ConditionKind::Flow => "flow",
            ConditionKind::PistonPosition => "piston_position",
            ConditionKind::Power => "power",
            ConditionKind::UserInteraction => "user_interaction",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ConditionKind::Time => "s",
            ConditionKind::Power => "%",
            ConditionKind::UserInteraction => "",
            other => other.channel().map_or("", Channel::unit),
        }
    }
}

/// A breakpoint value or threshold: a literal number or a `"$key"` variable reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DynamicValue {
    Number(f64),
    Reference(String),
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        DynamicValue::Number(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::Reference(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub value: DynamicValue,
    pub comparison: Comparison,
    pub relative: bool,
}

impl Condition {
    pub fn new(kind: ConditionKind, comparison: Comparison, value: impl Into<DynamicValue>) -> Self {
        Self {
            kind,
            value: value.into(),
            comparison,
            relative: false,
        }
    }

    pub fn relative(mut self) -> Self {
        self.relative = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub key: String,
    pub name: String,
    pub kind: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakpoint {
    pub position: f64,
    pub value: DynamicValue,
}

impl Breakpoint {
    pub fn new(position: f64, value: impl Into<DynamicValue>) -> Self {
        Self {
            position,
            value: value.into(),
        }
    }
}

/// Canonical dynamics shape, whichever encoding the source document used.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dynamics {
    pub points: Vec<Breakpoint>,
    pub domain: Domain,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageDefinition {
    pub name: String,
    pub key: String,
    pub control_type: ControlType,
    pub dynamics: Dynamics,
    pub exit_triggers: Vec<Condition>,
    pub limits: Vec<Condition>,
}

impl StageDefinition {
    /// First exit trigger measuring time, if any.
    pub fn time_trigger(&self) -> Option<&Condition> {
        self.exit_triggers
            .iter()
            .find(|c| c.kind == ConditionKind::Time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDefinition {
    pub name: String,
    pub temperature: Option<f64>,
    pub final_weight_target: Option<f64>,
    pub variables: Vec<Variable>,
    pub stages: Vec<StageDefinition>,
}
