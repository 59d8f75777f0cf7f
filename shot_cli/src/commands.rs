//! Subcommand handlers: load inputs, run the engine, print results.

use eyre::{Result, WrapErr};
use serde_json::json;
use shot_core::conversions::samples_from_rows;
use shot_core::{AnalysisCfg, ProfileDefinition, TelemetrySample};
use std::path::{Path, PathBuf};

use crate::render;

fn load_profile(path: &Path) -> Result<ProfileDefinition> {
    let doc = shot_config::load_profile_json(path)
        .wrap_err_with(|| format!("load profile {}", path.display()))?;
    Ok((&doc).into())
}

fn load_shot(path: &Path) -> Result<Vec<TelemetrySample>> {
    let rows = shot_config::load_telemetry(path)
        .wrap_err_with(|| format!("load telemetry {}", path.display()))?;
    Ok(samples_from_rows(&rows))
}

pub fn analyze(profile: &Path, shot: &Path, cfg: &AnalysisCfg, json: bool) -> Result<()> {
    let profile = load_profile(profile)?;
    let samples = load_shot(shot)?;
    let report = shot_core::analyze(&profile, &samples, cfg)?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print!("{}", render::report(&report));
    }
    Ok(())
}

pub fn estimate(profile: &Path, cfg: &AnalysisCfg, json: bool) -> Result<()> {
    let profile = load_profile(profile)?;
    let (points, flags) = shot_core::estimate_target_curves(&profile, cfg)?;
    if json {
        let out = json!({
            "profile_name": profile.name,
            "target_curves": points,
            "flags": flags,
        });
        println!("{out}");
    } else {
        print!("{}", render::estimate(&profile, &points, &flags));
    }
    Ok(())
}

/// One line per shot, in argument order. Fails (after printing everything) when any shot failed.
pub fn batch(
    profile: &Path,
    shots: &[PathBuf],
    workers: usize,
    cfg: &AnalysisCfg,
    json: bool,
) -> Result<()> {
    let profile = load_profile(profile)?;
    // Unreadable files count as failed shots rather than aborting the batch
    let mut readable: Vec<Vec<TelemetrySample>> = Vec::with_capacity(shots.len());
    let load_errors: Vec<Option<eyre::Report>> = shots
        .iter()
        .map(|p| match load_shot(p) {
            Ok(samples) => {
                readable.push(samples);
                None
            }
            Err(e) => Some(e),
        })
        .collect();
    let mut reports = shot_core::analyze_batch(&profile, &readable, cfg, workers).into_iter();

    let mut failed = 0usize;
    for (path, load_error) in shots.iter().zip(load_errors) {
        let result = match load_error {
            None => reports
                .next()
                .unwrap_or_else(|| Err(eyre::eyre!("no result for {}", path.display()))),
            Some(e) => Err(e),
        };
        let shot = path.display().to_string();
        match result {
            Ok(report) => {
                if json {
                    println!("{}", json!({ "shot": shot, "report": report }));
                } else {
                    println!("{shot}: {}", render::one_line(&report));
                }
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(shot = %shot, error = %e, "shot analysis failed");
                if json {
                    println!("{}", json!({ "shot": shot, "error": format!("{e:#}") }));
                } else {
                    println!("{shot}: error: {e:#}");
                }
            }
        }
    }
    tracing::info!(total = shots.len(), failed, "batch complete");
    if failed > 0 {
        eyre::bail!("{failed} of {} shots failed analysis", shots.len());
    }
    Ok(())
}
