use proptest::prelude::*;
use shot_core::interpolate::interpolate;
use shot_core::{
    AnalysisCfg, Breakpoint, ControlType, Dynamics, ProfileDefinition, StageDefinition,
    TelemetrySample, analyze,
};

fn profile() -> ProfileDefinition {
    ProfileDefinition {
        name: "p".into(),
        temperature: None,
        final_weight_target: None,
        variables: vec![],
        stages: ["A", "B"]
            .iter()
            .map(|n| StageDefinition {
                name: (*n).into(),
                key: n.to_lowercase(),
                control_type: ControlType::Flow,
                dynamics: Dynamics {
                    points: vec![Breakpoint::new(0.0, 2.0), Breakpoint::new(5.0, 1.0)],
                    ..Dynamics::default()
                },
                exit_triggers: vec![],
                limits: vec![],
            })
            .collect(),
    }
}

/// Increasing times with a stage label and a flow reading each.
fn shot() -> impl Strategy<Value = Vec<TelemetrySample>> {
    prop::collection::vec((0.01f64..2.0, any::<bool>(), 0.0f64..8.0), 1..80).prop_map(|steps| {
        let mut t = 0.0;
        steps
            .into_iter()
            .map(|(dt, second, flow)| {
                t += dt;
                TelemetrySample::new(t, if second { "B" } else { "A" }).with_flow(flow)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn windows_span_first_to_last_sample(samples in shot(), transient in 0.0f64..10.0) {
        let cfg = AnalysisCfg { transient_window_s: transient, ..AnalysisCfg::default() };
        let seg = shot_core::segment::segment(&samples, &profile(), cfg.transient_window_s);
        for w in &seg.windows {
            let first = w.samples.first().unwrap();
            let last = w.samples.last().unwrap();
            prop_assert_eq!(w.start_time, first.elapsed_time_s);
            prop_assert_eq!(w.end_time, last.elapsed_time_s);
            // the transient filter only touches avg/max/min
            let flow = w.stats.flow.unwrap();
            prop_assert_eq!(flow.start, first.flow_ml_s.unwrap());
            prop_assert_eq!(flow.end, last.flow_ml_s.unwrap());
            prop_assert!(flow.min <= flow.avg + 1e-9 && flow.avg <= flow.max + 1e-9);
        }
        prop_assert_eq!(seg.windows.len() + seg.unreached.len(), 2);
    }

    #[test]
    fn analysis_is_total_on_ordered_input(samples in shot()) {
        let report = analyze(&profile(), &samples, &AnalysisCfg::default()).unwrap();
        prop_assert_eq!(report.stages.len(), 2);
        for p in &report.target_curves {
            prop_assert!(p.time_s >= samples[0].elapsed_time_s);
            prop_assert!(p.time_s <= samples[samples.len() - 1].elapsed_time_s);
        }
    }

    #[test]
    fn interpolation_stays_within_value_range(
        mut xs in prop::collection::vec(-100.0f64..100.0, 1..12),
        ys in prop::collection::vec(-50.0f64..50.0, 12),
        q in -200.0f64..200.0,
    ) {
        xs.sort_by(f64::total_cmp);
        let pairs: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        let lo = pairs.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let hi = pairs.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let v = interpolate(&pairs, q).unwrap();
        prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
    }
}
