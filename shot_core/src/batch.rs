//! Analyze many shots of one profile on worker threads.
//!
//! Each worker pulls `(index, samples)` jobs from a bounded channel and sends
//! back `(index, result)`. Analyses share only immutable inputs, so no locking
//! is involved; results are returned in input order.
use crossbeam_channel as xch;

use crate::analysis::{AnalysisReport, analyze};
use crate::config::AnalysisCfg;
use crate::error::Result;
use crate::types::{ProfileDefinition, TelemetrySample};

/// Worker count used when the caller passes 0.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

pub fn analyze_batch(
    profile: &ProfileDefinition,
    shots: &[Vec<TelemetrySample>],
    cfg: &AnalysisCfg,
    workers: usize,
) -> Vec<Result<AnalysisReport>> {
    if shots.is_empty() {
        return Vec::new();
    }
    let workers = if workers == 0 {
        default_workers()
    } else {
        workers
    }
    .min(shots.len());

    let (job_tx, job_rx) = xch::bounded::<(usize, &[TelemetrySample])>(workers * 2);
    let (res_tx, res_rx) = xch::unbounded::<(usize, Result<AnalysisReport>)>();

    std::thread::scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            scope.spawn(move || {
                for (idx, samples) in job_rx.iter() {
                    let report = analyze(profile, samples, cfg);
                    // If send fails, the collector is gone; exit gracefully
                    if res_tx.send((idx, report)).is_err() {
                        break;
                    }
                }
                tracing::trace!(worker, "batch worker exiting");
            });
        }
        drop(res_tx);
        for (idx, shot) in shots.iter().enumerate() {
            if job_tx.send((idx, shot.as_slice())).is_err() {
                break;
            }
        }
        drop(job_tx);
    });

    let mut slots: Vec<Option<Result<AnalysisReport>>> = (0..shots.len()).map(|_| None).collect();
    for (idx, report) in res_rx.try_iter() {
        slots[idx] = Some(report);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.unwrap_or_else(|| Err(eyre::eyre!("shot {idx} was not analyzed")))
        })
        .collect()
}
