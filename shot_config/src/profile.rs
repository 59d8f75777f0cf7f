//! Extraction profile JSON schema.
//!
//! The profile store hands out documents in two shapes for a stage's dynamics:
//!
//! ```json
//! { "dynamics": { "points": [[0, 2], [4, "$peak"]], "over": "time", "interpolation": "linear" } }
//! { "dynamics_points": [[0, 2], [4, "$peak"]], "dynamics_over": "time", "dynamics_interpolation": "linear" }
//! ```
//!
//! Both are accepted here; [`StageDoc::dynamics`] folds them into one
//! [`DynamicsDoc`] so nothing downstream needs to know which was used.
use serde::Deserialize;
use std::path::Path;

/// A breakpoint value or condition threshold: a literal number or a `"$key"` reference.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ValueDoc {
    Number(f64),
    Text(String),
}

/// One `[position, value]` breakpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PointDoc(pub f64, pub ValueDoc);

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DomainDoc {
    #[default]
    Time,
    Weight,
    PistonPosition,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationDoc {
    #[default]
    Linear,
    Curve,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlTypeDoc {
    Power,
    Flow,
    Pressure,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKindDoc {
    Time,
    Weight,
    Pressure,
    Flow,
    PistonPosition,
    Power,
    UserInteraction,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonDoc {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "<=")]
    AtMost,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct DynamicsDoc {
    #[serde(default)]
    pub points: Vec<PointDoc>,
    #[serde(default, alias = "domain")]
    pub over: DomainDoc,
    #[serde(default)]
    pub interpolation: InterpolationDoc,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ConditionDoc {
    #[serde(rename = "type")]
    pub kind: ConditionKindDoc,
    pub value: ValueDoc,
    /// Absent on most limits; the consumer picks the default per list.
    #[serde(default)]
    pub comparison: Option<ComparisonDoc>,
    #[serde(default)]
    pub relative: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VariableDoc {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StageDoc {
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub control_type: ControlTypeDoc,
    // Nested encoding
    #[serde(default)]
    pub dynamics: Option<DynamicsDoc>,
    // Flat encoding
    #[serde(default)]
    pub dynamics_points: Option<Vec<PointDoc>>,
    #[serde(default)]
    pub dynamics_over: Option<DomainDoc>,
    #[serde(default)]
    pub dynamics_interpolation: Option<InterpolationDoc>,
    #[serde(default)]
    pub exit_triggers: Vec<ConditionDoc>,
    #[serde(default)]
    pub limits: Vec<ConditionDoc>,
}

impl StageDoc {
    /// Canonical dynamics for this stage regardless of source encoding.
    /// The nested object wins when a document carries both.
    pub fn dynamics(&self) -> DynamicsDoc {
        if let Some(nested) = &self.dynamics {
            return nested.clone();
        }
        DynamicsDoc {
            points: self.dynamics_points.clone().unwrap_or_default(),
            over: self.dynamics_over.unwrap_or_default(),
            interpolation: self.dynamics_interpolation.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProfileDoc {
    pub name: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default, alias = "final_weight")]
    pub final_weight_target: Option<f64>,
    #[serde(default)]
    pub variables: Vec<VariableDoc>,
    #[serde(default)]
    pub stages: Vec<StageDoc>,
}

pub fn parse_profile_json(s: &str) -> eyre::Result<ProfileDoc> {
    serde_json::from_str::<ProfileDoc>(s).map_err(|e| eyre::eyre!("invalid profile JSON: {}", e))
}

pub fn load_profile_json(path: &Path) -> eyre::Result<ProfileDoc> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("open profile {:?}: {}", path, e))?;
    parse_profile_json(&text)
}
