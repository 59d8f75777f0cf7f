use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use shot_core::{
    AnalysisCfg, Breakpoint, Comparison, Condition, ConditionKind, ControlType, Domain,
    Dynamics, Interpolation, ProfileDefinition, StageDefinition, TelemetrySample, analyze,
    analyze_batch,
};

fn stage(name: &str, control: ControlType, domain: Domain, points: &[(f64, f64)]) -> StageDefinition {
    StageDefinition {
        name: name.into(),
        key: name.to_lowercase(),
        control_type: control,
        dynamics: Dynamics {
            points: points.iter().map(|&(p, v)| Breakpoint::new(p, v)).collect(),
            domain,
            interpolation: Interpolation::Linear,
        },
        exit_triggers: vec![Condition::new(ConditionKind::Weight, Comparison::AtLeast, 36.0)],
        limits: vec![Condition::new(ConditionKind::Pressure, Comparison::AtMost, 10.0)],
    }
}

fn profile() -> ProfileDefinition {
    ProfileDefinition {
        name: "bench".into(),
        temperature: Some(93.0),
        final_weight_target: Some(36.0),
        variables: vec![],
        stages: vec![
            stage("Fill", ControlType::Flow, Domain::Time, &[(0.0, 8.0), (3.0, 8.0)]),
            stage("Bloom", ControlType::Pressure, Domain::Time, &[(0.0, 3.0), (10.0, 3.0)]),
            stage("Ramp", ControlType::Pressure, Domain::Time, &[(0.0, 3.0), (5.0, 9.0)]),
            stage("Decline", ControlType::Flow, Domain::Weight, &[(0.0, 2.5), (30.0, 1.2)]),
        ],
    }
}

// Synthetic 10 Hz shot with noisy channels, split evenly across the stages
fn synth_shot(n: usize, seed: u32) -> Vec<TelemetrySample> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut noise = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0) - 0.5
    };
    let labels = ["Fill", "Bloom", "Ramp", "Decline"];
    (0..n)
        .map(|i| {
            let t = i as f64 / 10.0;
            let label = labels[(i * labels.len() / n).min(labels.len() - 1)];
            TelemetrySample::new(t, label)
                .with_weight(t * 1.1 + noise() * 0.1)
                .with_pressure(9.0 * (t / 20.0).min(1.0) + noise() * 0.2)
                .with_flow(2.0 + noise() * 0.3)
                .with_piston(t * 0.8)
        })
        .collect()
}

pub fn bench_analyze(c: &mut Criterion) {
    let mut g = c.benchmark_group("analyze");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p shot_core --bench analyze
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let profile = profile();
    let cfg = AnalysisCfg::default();
    for &n in &[500usize, 5_000, 50_000] {
        let shot = synth_shot(n, 0xC0FFEE);
        g.bench_function(format!("single_{n}"), |b| {
            b.iter(|| {
                let r = analyze(black_box(&profile), black_box(&shot), &cfg);
                black_box(r.is_ok());
            })
        });
    }

    let shots: Vec<_> = (0..32).map(|s| synth_shot(600, s + 1)).collect();
    g.bench_function("batch_32x600", |b| {
        b.iter_batched(
            || shots.clone(),
            |s| black_box(analyze_batch(&profile, &s, &cfg, 0).len()),
            BatchSize::LargeInput,
        )
    });
    g.finish();
}

criterion_group!(analysis, bench_analyze);
criterion_main!(analysis);
