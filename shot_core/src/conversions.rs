//! `From` implementations bridging `shot_config` documents to `shot_core` types.
//!
//! This is the ingestion boundary: profile documents arrive in either dynamics
//! encoding and leave as one canonical [`Dynamics`].

use crate::config::{AnalysisCfg, PreinfusionCfg, TrendCfg, TriggerCfg};
use crate::dynamics::REFERENCE_MARKER;
use crate::types::{
    Breakpoint, Comparison, Condition, ConditionKind, ControlType, Domain, DynamicValue,
    Dynamics, Interpolation, ProfileDefinition, StageDefinition, TelemetrySample, Variable,
};
use shot_config::{
    ComparisonDoc, ConditionDoc, ConditionKindDoc, ControlTypeDoc, DomainDoc, InterpolationDoc,
    ProfileDoc, StageDoc, TelemetryRow, ValueDoc, VariableDoc,
};

// ── Config ───────────────────────────────────────────────────────────────────

impl From<&shot_config::TrendSection> for TrendCfg {
    fn from(c: &shot_config::TrendSection) -> Self {
        Self {
            pressure_bar: c.pressure_bar,
            flow_ml_s: c.flow_ml_s,
            power: c.power,
        }
    }
}

impl From<&shot_config::TriggerSection> for TriggerCfg {
    fn from(c: &shot_config::TriggerSection) -> Self {
        Self {
            time_s: c.time_s,
            weight_g: c.weight_g,
            pressure_bar: c.pressure_bar,
            flow_ml_s: c.flow_ml_s,
            piston_position: c.piston_position,
        }
    }
}

impl From<&shot_config::PreinfusionSection> for PreinfusionCfg {
    fn from(c: &shot_config::PreinfusionSection) -> Self {
        Self {
            main_pressure_bar: c.main_pressure_bar,
            main_flow_ml_s: c.main_flow_ml_s,
        }
    }
}

impl From<&shot_config::Config> for AnalysisCfg {
    fn from(c: &shot_config::Config) -> Self {
        Self {
            transient_window_s: c.analysis.transient_window_s,
            reach_tolerance: c.analysis.reach_tolerance,
            default_stage_duration_s: c.analysis.default_stage_duration_s,
            max_samples: c.analysis.max_samples,
            weight_tolerance_g: c.analysis.weight_tolerance_g,
            trend: (&c.trend).into(),
            triggers: (&c.triggers).into(),
            preinfusion: (&c.preinfusion).into(),
        }
    }
}

// ── Telemetry ────────────────────────────────────────────────────────────────

impl From<&TelemetryRow> for TelemetrySample {
    fn from(r: &TelemetryRow) -> Self {
        Self {
            elapsed_time_s: r.time_s,
            stage_label: r.stage.clone(),
            weight_g: r.weight_g,
            pressure_bar: r.pressure_bar,
            flow_ml_s: r.flow_ml_s,
            piston_position: r.piston_position,
        }
    }
}

/// Convert a whole row list, preserving order.
pub fn samples_from_rows(rows: &[TelemetryRow]) -> Vec<TelemetrySample> {
    rows.iter().map(TelemetrySample::from).collect()
}

// ── Profile ──────────────────────────────────────────────────────────────────

impl From<&ValueDoc> for DynamicValue {
    fn from(v: &ValueDoc) -> Self {
        match v {
            ValueDoc::Number(n) => DynamicValue::Number(*n),
            // Numeric strings show up in hand-edited profiles
            ValueDoc::Text(s) if !s.starts_with(REFERENCE_MARKER) => s
                .trim()
                .parse::<f64>()
                .map_or_else(|_| DynamicValue::Reference(s.clone()), DynamicValue::Number),
            ValueDoc::Text(s) => DynamicValue::Reference(s.clone()),
        }
    }
}

impl From<DomainDoc> for Domain {
    fn from(d: DomainDoc) -> Self {
        match d {
            DomainDoc::Time => Domain::Time,
            DomainDoc::Weight => Domain::Weight,
            DomainDoc::PistonPosition => Domain::PistonPosition,
        }
    }
}

impl From<InterpolationDoc> for Interpolation {
    fn from(i: InterpolationDoc) -> Self {
        match i {
            InterpolationDoc::Linear => Interpolation::Linear,
            InterpolationDoc::Curve => Interpolation::Curve,
        }
    }
}

impl From<ControlTypeDoc> for ControlType {
    fn from(c: ControlTypeDoc) -> Self {
        match c {
            ControlTypeDoc::Power => ControlType::Power,
            ControlTypeDoc::Flow => ControlType::Flow,
            ControlTypeDoc::Pressure => ControlType::Pressure,
        }
    }
}

impl From<ConditionKindDoc> for ConditionKind {
    fn from(k: ConditionKindDoc) -> Self {
        match k {
            ConditionKindDoc::Time => ConditionKind::Time,
            ConditionKindDoc::Weight => ConditionKind::Weight,
            ConditionKindDoc::Pressure => ConditionKind::Pressure,
            ConditionKindDoc::Flow => ConditionKind::Flow,
            ConditionKindDoc::PistonPosition => ConditionKind::PistonPosition,
            ConditionKindDoc::Power => ConditionKind::Power,
            ConditionKindDoc::UserInteraction => ConditionKind::UserInteraction,
        }
    }
}

impl From<ComparisonDoc> for Comparison {
    fn from(c: ComparisonDoc) -> Self {
        match c {
            ComparisonDoc::AtLeast => Comparison::AtLeast,
            ComparisonDoc::AtMost => Comparison::AtMost,
        }
    }
}

fn condition(doc: &ConditionDoc, default_cmp: Comparison) -> Condition {
    Condition {
        kind: doc.kind.into(),
        value: (&doc.value).into(),
        comparison: doc.comparison.map_or(default_cmp, Comparison::from),
        relative: doc.relative.unwrap_or(false),
    }
}

impl From<&VariableDoc> for Variable {
    fn from(v: &VariableDoc) -> Self {
        Self {
            key: v.key.clone(),
            name: v.name.clone(),
            kind: v.kind.clone(),
            value: v.value,
        }
    }
}

impl From<&StageDoc> for StageDefinition {
    fn from(s: &StageDoc) -> Self {
        let dynamics = s.dynamics();
        Self {
            name: s.name.clone(),
            key: s.key.clone().unwrap_or_else(|| s.name.clone()),
            control_type: s.control_type.into(),
            dynamics: Dynamics {
                points: dynamics
                    .points
                    .iter()
                    .map(|p| Breakpoint {
                        position: p.0,
                        value: (&p.1).into(),
                    })
                    .collect(),
                domain: dynamics.over.into(),
                interpolation: dynamics.interpolation.into(),
            },
            // Exit triggers fire on reaching a value; limits cap one.
            exit_triggers: s
                .exit_triggers
                .iter()
                .map(|c| condition(c, Comparison::AtLeast))
                .collect(),
            limits: s
                .limits
                .iter()
                .map(|c| condition(c, Comparison::AtMost))
                .collect(),
        }
    }
}

impl From<&ProfileDoc> for ProfileDefinition {
    fn from(p: &ProfileDoc) -> Self {
        Self {
            name: p.name.clone(),
            temperature: p.temperature,
            final_weight_target: p.final_weight_target,
            variables: p.variables.iter().map(Variable::from).collect(),
            stages: p.stages.iter().map(StageDefinition::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_become_numbers() {
        assert_eq!(
            DynamicValue::from(&ValueDoc::Text(" 7.5 ".into())),
            DynamicValue::Number(7.5)
        );
        assert_eq!(
            DynamicValue::from(&ValueDoc::Text("$p".into())),
            DynamicValue::Reference("$p".into())
        );
    }

    #[test]
    fn stage_key_defaults_to_name() {
        let doc: StageDoc =
            serde_json::from_str(r#"{"name": "Bloom", "type": "flow", "limits": [{"type": "pressure", "value": 3}]}"#)
                .unwrap();
        let stage = StageDefinition::from(&doc);
        assert_eq!(stage.key, "Bloom");
        assert_eq!(stage.limits[0].comparison, Comparison::AtMost);
    }

    #[test]
    fn toml_sections_reach_engine_settings() {
        let cfg: shot_config::Config = toml::from_str(
            "[analysis]\nreach_tolerance = 0.9\n[triggers]\nweight_g = 1.0\n[preinfusion]\nmain_pressure_bar = 7.0\n",
        )
        .unwrap();
        let a = AnalysisCfg::from(&cfg);
        assert_eq!(a.reach_tolerance, 0.9);
        assert_eq!(a.triggers.tolerance(ConditionKind::Weight), 1.0);
        assert_eq!(a.preinfusion.main_pressure_bar, 7.0);
        // untouched sections keep their defaults
        assert_eq!(a.transient_window_s, crate::config::FLOW_TRANSIENT_WINDOW_S);
        assert_eq!(a.triggers.time_s, 0.3);
    }
}
