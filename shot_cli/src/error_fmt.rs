//! Human-readable error descriptions and structured JSON error formatting.

use shot_core::AnalysisError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::EmptyProfile => {
                "What happened: The profile declares no stages.\nLikely causes: Wrong file, or the profile was exported before any stage was added.\nHow to fix: Pass a profile JSON with a non-empty \"stages\" array.".to_string()
            }
            AnalysisError::UnorderedSamples { index, time_s, previous_s } => format!(
                "What happened: Telemetry is not in time order (row {index} at {time_s}s comes after {previous_s}s).\nLikely causes: Rows were merged from several recordings or re-sorted by another column.\nHow to fix: Sort the telemetry by time_s and rerun."
            ),
            AnalysisError::NonFiniteTime { index } => format!(
                "What happened: Telemetry row {index} has no usable timestamp.\nLikely causes: A NaN or infinite time_s value in the export.\nHow to fix: Remove or repair that row and rerun."
            ),
            AnalysisError::TooManySamples { count, max } => format!(
                "What happened: The shot has {count} samples, more than the limit of {max}.\nLikely causes: Several shots concatenated into one file, or an unusually high sample rate.\nHow to fix: Split the file, or raise analysis.max_samples in the config."
            ),
        };
    }

    // String-based heuristics for errors coming from loaders or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("telemetry csv must have headers") {
        return format!(
            "Invalid headers in telemetry CSV. Expected '{}'.",
            shot_config::TELEMETRY_CSV_HEADERS.join(",")
        );
    }

    if lower.contains("invalid profile json") {
        return format!(
            "What happened: The profile could not be parsed.\nLikely causes: Not a profile export, or a stage without \"name\"/\"type\".\nHow to fix: Check the file against a known-good profile. Detail: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: A typo in a section name or an out-of-range value.\nHow to fix: Edit the TOML config and try again. Detail: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable short name for JSON output.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::EmptyProfile) => "EmptyProfile",
        Some(AnalysisError::UnorderedSamples { .. }) => "UnorderedSamples",
        Some(AnalysisError::NonFiniteTime { .. }) => "NonFiniteTime",
        Some(AnalysisError::TooManySamples { .. }) => "TooManySamples",
        None => "Error",
    }
}

/// Map rejected inputs to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::EmptyProfile) => 3,
        Some(AnalysisError::UnorderedSamples { .. } | AnalysisError::NonFiniteTime { .. }) => 4,
        Some(AnalysisError::TooManySamples { .. }) => 5,
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    let details = match err.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::UnorderedSamples { index, time_s, previous_s }) => {
            Some(json!({ "index": index, "time_s": time_s, "previous_s": previous_s }))
        }
        Some(AnalysisError::NonFiniteTime { index }) => Some(json!({ "index": index })),
        Some(AnalysisError::TooManySamples { count, max }) => {
            Some(json!({ "count": count, "max": max }))
        }
        _ => None,
    };
    let obj = match details {
        Some(d) => json!({ "reason": reason_name(err), "details": d, "message": msg }),
        None => json!({ "reason": reason_name(err), "message": msg }),
    };
    obj.to_string()
}
