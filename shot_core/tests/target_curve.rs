use shot_core::curve::{StageSpans, TargetCurvePoint, build_from_telemetry, estimate};
use shot_core::{
    AnalysisFlag, Breakpoint, Channel, Comparison, Condition, ConditionKind, ControlType, Domain,
    Dynamics, Interpolation, ProfileDefinition, StageDefinition, TelemetrySample, Variable,
};

fn stage(
    name: &str,
    control: ControlType,
    domain: Domain,
    points: &[(f64, f64)],
    time_trigger: Option<f64>,
) -> StageDefinition {
    StageDefinition {
        name: name.into(),
        key: name.to_lowercase(),
        control_type: control,
        dynamics: Dynamics {
            points: points.iter().map(|&(p, v)| Breakpoint::new(p, v)).collect(),
            domain,
            interpolation: Interpolation::Linear,
        },
        exit_triggers: time_trigger
            .map(|t| vec![Condition::new(ConditionKind::Time, Comparison::AtLeast, t).relative()])
            .unwrap_or_default(),
        limits: vec![],
    }
}

fn profile(stages: Vec<StageDefinition>) -> ProfileDefinition {
    ProfileDefinition {
        name: "test".into(),
        temperature: Some(93.0),
        final_weight_target: Some(36.0),
        variables: vec![],
        stages,
    }
}

fn times(points: &[TargetCurvePoint]) -> Vec<f64> {
    points.iter().map(|p| p.time_s).collect()
}

#[test]
fn estimate_rescales_points_to_trigger_duration() {
    let p = profile(vec![stage(
        "Only",
        ControlType::Pressure,
        Domain::Time,
        &[(0.0, 2.0), (5.0, 6.0), (10.0, 9.0)],
        Some(20.0),
    )]);
    let mut flags = Vec::new();
    let pts = estimate(&p, 10.0, &mut flags);
    assert_eq!(times(&pts), vec![0.0, 10.0, 20.0]);
    let values: Vec<_> = pts.iter().map(|p| p.target_pressure.unwrap()).collect();
    assert_eq!(values, vec![2.0, 6.0, 9.0]);
    assert!(flags.is_empty());
}

#[test]
fn estimate_scales_by_last_breakpoint_even_when_unresolved() {
    let p = profile(vec![StageDefinition {
        dynamics: Dynamics {
            points: vec![
                Breakpoint::new(0.0, 2.0),
                Breakpoint::new(5.0, 6.0),
                Breakpoint::new(10.0, "$gone"),
            ],
            ..Dynamics::default()
        },
        ..stage("Only", ControlType::Pressure, Domain::Time, &[], Some(20.0))
    }]);
    let mut flags = Vec::new();
    let pts = estimate(&p, 10.0, &mut flags);
    assert_eq!(times(&pts), vec![0.0, 10.0]);
    assert_eq!(
        flags,
        vec![AnalysisFlag::UnresolvedVariable {
            stage: "Only".into(),
            key: "gone".into()
        }]
    );
}

#[test]
fn estimate_lays_stages_end_to_end() {
    let p = profile(vec![
        stage("S1", ControlType::Flow, Domain::Time, &[(0.0, 4.0), (1.0, 4.0)], Some(5.0)),
        stage("S2", ControlType::Pressure, Domain::Time, &[(0.0, 3.0), (4.0, 9.0)], Some(8.0)),
    ]);
    let pts = estimate(&p, 10.0, &mut Vec::new());
    let s2: Vec<_> = pts.iter().filter(|p| p.stage_name == "S2").collect();
    assert_eq!(s2.first().unwrap().time_s, 5.0);
    assert_eq!(s2.last().unwrap().time_s, 13.0);
    assert!(pts.iter().filter(|p| p.stage_name == "S1").all(|p| p.target_flow == Some(4.0)));
}

#[test]
fn estimate_defaults_duration_and_guards_zero_last_position() {
    let p = profile(vec![
        stage("Flat", ControlType::Pressure, Domain::Time, &[(0.0, 6.0)], None),
        stage("Next", ControlType::Pressure, Domain::Time, &[(0.0, 9.0), (2.0, 9.0)], None),
    ]);
    let pts = estimate(&p, 10.0, &mut Vec::new());
    // single point at position 0: unscaled, no division by zero
    assert_eq!(pts[0].time_s, 0.0);
    // second stage starts after the 10 s default and is stretched to fill it
    assert_eq!(times(&pts[1..]), vec![10.0, 20.0]);
}

#[test]
fn estimate_resolves_variables_and_flags_unknown() {
    let mut p = profile(vec![StageDefinition {
        dynamics: Dynamics {
            points: vec![Breakpoint::new(0.0, "$start"), Breakpoint::new(4.0, "$gone")],
            ..Dynamics::default()
        },
        ..stage("Ramp", ControlType::Pressure, Domain::Time, &[], Some(4.0))
    }]);
    p.variables.push(Variable {
        key: "start".into(),
        name: "Start Pressure".into(),
        kind: "pressure".into(),
        value: 2.5,
    });
    let mut flags = Vec::new();
    let pts = estimate(&p, 10.0, &mut flags);
    assert_eq!(pts.len(), 1);
    assert_eq!(pts[0].target_pressure, Some(2.5));
    assert_eq!(
        flags,
        vec![AnalysisFlag::UnresolvedVariable {
            stage: "Ramp".into(),
            key: "gone".into()
        }]
    );
}

#[test]
fn telemetry_time_domain_offsets_from_actual_start() {
    let stages = vec![stage(
        "Hold",
        ControlType::Pressure,
        Domain::Time,
        &[(0.0, 9.0), (4.0, 8.0), (30.0, 6.0)],
        Some(30.0),
    )];
    let mut spans = StageSpans::new();
    spans.insert("Hold".into(), (12.0, 22.0));
    let pts = build_from_telemetry(&stages, &spans, &[], &[], &mut Vec::new());
    // no rescaling; the last point clamps to the real 10 s duration
    assert_eq!(times(&pts), vec![12.0, 16.0, 22.0]);
}

#[test]
fn telemetry_skips_unreached_stages() {
    let stages = vec![stage("Never", ControlType::Flow, Domain::Time, &[(0.0, 2.0)], None)];
    let pts = build_from_telemetry(&stages, &StageSpans::new(), &[], &[], &mut Vec::new());
    assert!(pts.is_empty());
}

#[test]
fn telemetry_weight_domain_maps_through_recorded_weight() {
    let stages = vec![stage(
        "Decline",
        ControlType::Flow,
        Domain::Weight,
        &[(0.0, 2.5), (10.0, 1.8), (20.0, 1.2)],
        None,
    )];
    // stage starts at 10 g and gains 1 g/s; a noisy dip at t=14 must not create a second crossing
    let samples: Vec<TelemetrySample> = [
        (5.0, 10.0),
        (10.0, 15.0),
        (14.0, 14.0),
        (15.0, 20.0),
        (20.0, 25.0),
        (25.0, 30.0),
    ]
    .iter()
    .map(|&(t, w)| TelemetrySample::new(t, "Decline").with_weight(w))
    .collect();
    let mut spans = StageSpans::new();
    spans.insert("Decline".into(), (5.0, 25.0));
    let pts = build_from_telemetry(&stages, &spans, &samples, &[], &mut Vec::new());
    assert_eq!(times(&pts), vec![5.0, 15.0, 25.0]);
    assert_eq!(pts[1].target_flow, Some(1.8));
}

#[test]
fn telemetry_weight_domain_without_weight_is_flagged() {
    let stages = vec![stage("Decline", ControlType::Flow, Domain::Weight, &[(0.0, 2.5)], None)];
    let samples = vec![TelemetrySample::new(1.0, "Decline").with_flow(2.0)];
    let mut spans = StageSpans::new();
    spans.insert("Decline".into(), (1.0, 1.0));
    let mut flags = Vec::new();
    let pts = build_from_telemetry(&stages, &spans, &samples, &[], &mut flags);
    assert!(pts.is_empty());
    assert_eq!(
        flags,
        vec![AnalysisFlag::MissingChannelData {
            stage: "Decline".into(),
            channel: Channel::Weight
        }]
    );
}

#[test]
fn points_serialize_with_control_specific_field() {
    let p = TargetCurvePoint::new(1.5, "Ramp", ControlType::Power, 80.0);
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, r#"{"time_s":1.5,"stage_name":"Ramp","target_power":80.0}"#);
}
