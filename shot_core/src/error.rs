use serde::Serialize;
use thiserror::Error;

use crate::types::Channel;

/// Caller-precondition violations. These reject the request outright.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("profile has no stages")]
    EmptyProfile,
    #[error("samples are not time-ordered: sample {index} at {time_s}s follows {previous_s}s")]
    UnorderedSamples {
        index: usize,
        time_s: f64,
        previous_s: f64,
    },
    #[error("sample {index} has a non-finite timestamp")]
    NonFiniteTime { index: usize },
    #[error("too many samples: {count} exceeds the limit of {max}")]
    TooManySamples { count: usize, max: usize },
}

/// Diagnostics recorded in the report. None of these stop an analysis.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisFlag {
    #[error("stage '{stage}': no {channel} readings recorded")]
    MissingChannelData { stage: String, channel: Channel },
    #[error("stage '{stage}': variable '{key}' is not defined")]
    UnresolvedVariable { stage: String, key: String },
    #[error("stage '{stage}' was never reached")]
    EmptyStageWindow { stage: String },
    #[error("stage '{stage}': malformed dynamics ({reason})")]
    MalformedDynamics { stage: String, reason: String },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
