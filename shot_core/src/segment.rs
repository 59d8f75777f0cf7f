//! Partition a shot's samples into per-stage windows.

use crate::stats::{self, WindowStats};
use crate::types::{ProfileDefinition, StageDefinition, TelemetrySample};

/// The samples recorded while one stage was active, with their statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StageWindow {
    pub stage_name: String,
    pub stage_key: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub samples: Vec<TelemetrySample>,
    pub stats: WindowStats,
}

impl StageWindow {
    /// Build a window from a non-empty, time-ordered run of samples.
    pub fn new(
        stage: &StageDefinition,
        samples: Vec<TelemetrySample>,
        transient_window_s: f64,
    ) -> Option<Self> {
        let start_time = samples.first()?.elapsed_time_s;
        let end_time = samples.last()?.elapsed_time_s;
        let stats = stats::compute(&samples, start_time, transient_window_s);
        Some(Self {
            stage_name: stage.name.clone(),
            stage_key: stage.key.clone(),
            start_time,
            end_time,
            duration: end_time - start_time,
            samples,
            stats,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    /// Windows of reached stages, in declaration order.
    pub windows: Vec<StageWindow>,
    /// Names of stages no sample was labelled with, in declaration order.
    pub unreached: Vec<String>,
}

impl Segmentation {
    pub fn window(&self, stage_name: &str) -> Option<&StageWindow> {
        self.windows.iter().find(|w| w.stage_name == stage_name)
    }
}

/// Whether a sample label refers to `stage` (by name or key, ignoring case and padding).
pub fn label_matches(label: &str, stage: &StageDefinition) -> bool {
    let label = label.trim();
    !label.is_empty()
        && (label.eq_ignore_ascii_case(stage.name.trim())
            || label.eq_ignore_ascii_case(stage.key.trim()))
}

/// Split `samples` by stage label following the profile's declared stage order.
pub fn segment(
    samples: &[TelemetrySample],
    profile: &ProfileDefinition,
    transient_window_s: f64,
) -> Segmentation {
    let mut out = Segmentation::default();
    for stage in &profile.stages {
        let matched: Vec<TelemetrySample> = samples
            .iter()
            .filter(|s| label_matches(&s.stage_label, stage))
            .cloned()
            .collect();
        match StageWindow::new(stage, matched, transient_window_s) {
            Some(window) => {
                tracing::debug!(
                    stage = %window.stage_name,
                    samples = window.samples.len(),
                    start_s = window.start_time,
                    duration_s = window.duration,
                    "stage window"
                );
                out.windows.push(window);
            }
            None => {
                tracing::debug!(stage = %stage.name, "stage not reached");
                out.unreached.push(stage.name.clone());
            }
        }
    }
    out
}
