//! Per-channel aggregates over a stage window.
//!
//! Flow readings in the first seconds of a stage carry the piston-retraction
//! transient, so flow `avg`/`max`/`min` skip samples inside the transient
//! window (measured from stage start). `start`/`end` never skip anything.

use serde::Serialize;

use crate::types::{Channel, TelemetrySample};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStats {
    pub start: f64,
    pub end: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

impl ChannelStats {
    /// `end - start`.
    #[inline]
    pub fn change(&self) -> f64 {
        self.end - self.start
    }
}

/// Statistics for every channel; `None` means no sample in the window carried it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowStats {
    pub weight: Option<ChannelStats>,
    pub pressure: Option<ChannelStats>,
    pub flow: Option<ChannelStats>,
    pub piston_position: Option<ChannelStats>,
}

impl WindowStats {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelStats> {
        match channel {
            Channel::Weight => self.weight.as_ref(),
            Channel::Pressure => self.pressure.as_ref(),
            Channel::Flow => self.flow.as_ref(),
            Channel::PistonPosition => self.piston_position.as_ref(),
        }
    }

    /// Weight accumulated during the window.
    pub fn weight_gain(&self) -> Option<f64> {
        self.weight.map(|w| w.change())
    }

    /// Channels with no readings at all.
    pub fn missing_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL
            .into_iter()
            .filter(|c| self.channel(*c).is_none())
    }
}

/// Compute statistics for `samples`, a stage window starting at `stage_start_s`.
pub fn compute(samples: &[TelemetrySample], stage_start_s: f64, transient_window_s: f64) -> WindowStats {
    WindowStats {
        weight: channel_stats(samples, Channel::Weight, None),
        pressure: channel_stats(samples, Channel::Pressure, None),
        flow: channel_stats(
            samples,
            Channel::Flow,
            Some(stage_start_s + transient_window_s),
        ),
        piston_position: channel_stats(samples, Channel::PistonPosition, None),
    }
}

/// Aggregate one channel. When `settled_from_s` is set, `avg`/`max`/`min` use only
/// samples at or after that time, falling back to all samples if none qualify.
fn channel_stats(
    samples: &[TelemetrySample],
    channel: Channel,
    settled_from_s: Option<f64>,
) -> Option<ChannelStats> {
    let readings: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| s.read(channel).map(|v| (s.elapsed_time_s, v)))
        .collect();
    let (&(_, start), &(_, end)) = (readings.first()?, readings.last()?);

    let settled: Vec<f64> = match settled_from_s {
        Some(from) => readings
            .iter()
            .filter(|(t, _)| *t >= from)
            .map(|(_, v)| *v)
            .collect(),
        None => Vec::new(),
    };
    let basis: Vec<f64> = if settled.is_empty() {
        readings.iter().map(|(_, v)| *v).collect()
    } else {
        settled
    };

    let n = basis.len() as f64;
    let avg = basis.iter().sum::<f64>() / n;
    let max = basis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = basis.iter().copied().fold(f64::INFINITY, f64::min);
    Some(ChannelStats {
        start,
        end,
        avg,
        max,
        min,
    })
}
