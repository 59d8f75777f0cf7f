#![no_main]
use libfuzzer_sys::fuzz_target;
use shot_core::{AnalysisCfg, TelemetrySample};

fuzz_target!(|data: &str| {
    // Any profile the parser accepts must be analyzable: flags, never panics.
    let Ok(doc) = shot_config::parse_profile_json(data) else {
        return;
    };
    let profile: shot_core::ProfileDefinition = (&doc).into();
    let cfg = AnalysisCfg::default();
    let _ = shot_core::estimate_target_curves(&profile, &cfg);

    // Label a short synthetic shot with every declared stage in turn
    let samples: Vec<TelemetrySample> = profile
        .stages
        .iter()
        .enumerate()
        .flat_map(|(i, s)| {
            (0..3).map(move |j| {
                let t = (i * 3 + j) as f64;
                TelemetrySample::new(t, s.name.clone())
                    .with_weight(t)
                    .with_pressure(9.0)
                    .with_flow(2.0)
                    .with_piston(t * 0.5)
            })
        })
        .collect();
    let _ = shot_core::analyze(&profile, &samples, &cfg);
});
