//! Plain-text rendering of reports for terminal use.

use shot_core::{AnalysisFlag, AnalysisReport, ProfileDefinition, TargetCurvePoint};
use std::fmt::Write;

fn pct(share: f64) -> String {
    format!("{:.0}%", share * 100.0)
}

pub fn report(r: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Profile: {} ({} samples, {:.1}s, {}/{} stages executed)",
        r.profile_name,
        r.shot.sample_count,
        r.shot.duration_s,
        r.shot.stages_executed,
        r.shot.stages_declared
    );
    if let Some(w) = &r.weight {
        let _ = writeln!(
            out,
            "Final weight: {:.1} g (target {:.1} g, {:+.1} g, {})",
            w.actual_g,
            w.target_g,
            w.deviation_g,
            w.status.as_str()
        );
    }
    let pre = &r.preinfusion;
    if !pre.stages.is_empty() {
        if pre.executed {
            let _ = write!(out, "Pre-infusion: {:.1}s", pre.duration_s);
            if let Some(share) = pre.share_of_shot {
                let _ = write!(out, " ({} of shot)", pct(share));
            }
            if let Some(g) = pre.weight_gain_g {
                let _ = write!(out, ", {g:.1} g in cup");
            }
            let _ = writeln!(out);
        } else {
            let _ = writeln!(out, "Pre-infusion: not executed");
        }
    }

    let _ = writeln!(out, "Stages:");
    for s in &r.stages {
        let _ = writeln!(out, "  [{}] {}: {}", s.status.as_str(), s.stage_name, s.message);
        if let Some(t) = &s.trend {
            let _ = writeln!(out, "      {}", t.text);
        }
        for l in &s.limits_hit {
            let _ = writeln!(
                out,
                "      limit hit: {} {} {} (reached {})",
                l.kind.as_str(),
                l.comparison.symbol(),
                fmt_opt(l.limit),
                fmt_opt(l.extreme)
            );
        }
    }
    flags(&mut out, &r.flags);
    out
}

pub fn one_line(r: &AnalysisReport) -> String {
    let reached = r
        .stages
        .iter()
        .filter(|s| s.status == shot_core::StageStatus::Reached)
        .count();
    let weight = r
        .weight
        .as_ref()
        .map_or_else(String::new, |w| format!(", {:.1} g {}", w.actual_g, w.status.as_str()));
    format!(
        "{:.1}s, {}/{} stages reached{weight}, {} flag(s)",
        r.shot.duration_s,
        reached,
        r.stages.len(),
        r.flags.len()
    )
}

pub fn estimate(
    profile: &ProfileDefinition,
    points: &[TargetCurvePoint],
    flag_list: &[AnalysisFlag],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Profile: {} (estimated)", profile.name);
    for p in points {
        let (label, unit) = if p.target_pressure.is_some() {
            ("pressure", "bar")
        } else if p.target_flow.is_some() {
            ("flow", "ml/s")
        } else {
            ("power", "%")
        };
        let _ = writeln!(
            out,
            "  {:>7.2}s  {:<16} {label} {} {unit}",
            p.time_s,
            p.stage_name,
            fmt_opt(p.target())
        );
    }
    flags(&mut out, flag_list);
    out
}

fn flags(out: &mut String, flags: &[AnalysisFlag]) {
    if flags.is_empty() {
        return;
    }
    let _ = writeln!(out, "Flags:");
    for f in flags {
        let _ = writeln!(out, "  - {f}");
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "?".to_string(), |v| format!("{v:.1}"))
}
