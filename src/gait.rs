//! Gait event detection and spatiotemporal parameters.
//!
//! Event detection is a two-state threshold machine over a vertical force
//! series: crossing above the threshold is a heel-strike, dropping back
//! below is a toe-off. No debounce or hysteresis band is applied; a single
//! noisy sample crossing the threshold produces an event. That sensitivity
//! trade-off is part of the observable contract.

use crate::container::Point3;

/// Discrete gait event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GaitEventKind {
    HeelStrike,
    ToeOff,
}

/// A detected gait event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GaitEvent {
    pub kind: GaitEventKind,
    /// Time in seconds from the start of the force series.
    pub time: f64,
    /// Index of the sample that triggered the transition.
    pub sample: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum FootState {
    Unloaded,
    Loaded,
}

/// Detect heel-strike and toe-off events from a force series.
///
/// Starts `Unloaded`; `force > threshold` transitions emit events at the
/// crossing sample's timestamp. Events come out in ascending time order by
/// construction.
pub fn detect_gait_events(force: &[f64], sample_rate: f64, threshold: f64) -> Vec<GaitEvent> {
    if !(sample_rate > 0.0) {
        return Vec::new();
    }
    let mut events = Vec::new();
    let mut state = FootState::Unloaded;
    for (i, &f) in force.iter().enumerate() {
        let loaded = f > threshold;
        match (state, loaded) {
            (FootState::Unloaded, true) => {
                state = FootState::Loaded;
                events.push(GaitEvent {
                    kind: GaitEventKind::HeelStrike,
                    time: i as f64 / sample_rate,
                    sample: i,
                });
            }
            (FootState::Loaded, false) => {
                state = FootState::Unloaded;
                events.push(GaitEvent {
                    kind: GaitEventKind::ToeOff,
                    time: i as f64 / sample_rate,
                    sample: i,
                });
            }
            _ => {}
        }
    }
    events
}

/// Aggregate spatiotemporal gait parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpatiotemporalStats {
    /// Number of complete strides (consecutive heel-strike pairs).
    pub stride_count: usize,
    /// Mean stride time (s).
    pub stride_time: f64,
    /// Mean stance time (s), heel-strike to the next toe-off.
    pub stance_time: f64,
    /// Steps per minute; 0 when no valid stride exists.
    pub cadence: f64,
    /// Mean 3D displacement of the reference marker per stride, in capture
    /// units; 0 when no stride had both endpoints visible.
    pub stride_length: f64,
    /// Mean gait speed, `stride_length / stride_time`.
    pub speed: f64,
    /// Stance phase as a percentage of stride time.
    pub stance_pct: f64,
    /// Swing phase, the complement of stance.
    pub swing_pct: f64,
}

/// Compute spatiotemporal parameters from detected events and a reference
/// marker's position series (sampled at `sample_rate`, aligned with the
/// force series the events came from).
///
/// Returns `None` with fewer than two heel-strikes or zero toe-offs.
pub fn spatiotemporal(
    events: &[GaitEvent],
    reference: &[Option<Point3>],
    sample_rate: f64,
) -> Option<SpatiotemporalStats> {
    let heel_strikes: Vec<&GaitEvent> = events
        .iter()
        .filter(|e| e.kind == GaitEventKind::HeelStrike)
        .collect();
    let toe_offs: Vec<&GaitEvent> = events
        .iter()
        .filter(|e| e.kind == GaitEventKind::ToeOff)
        .collect();
    if heel_strikes.len() < 2 || toe_offs.is_empty() {
        return None;
    }

    // Stride times: gaps between consecutive heel-strikes.
    let stride_times: Vec<f64> = heel_strikes
        .windows(2)
        .map(|w| w[1].time - w[0].time)
        .collect();
    let stride_time = mean(&stride_times);

    // Stance times: each heel-strike to the first toe-off strictly after it.
    let stance_times: Vec<f64> = heel_strikes
        .iter()
        .filter_map(|hs| {
            toe_offs
                .iter()
                .find(|to| to.time > hs.time)
                .map(|to| to.time - hs.time)
        })
        .collect();
    let stance_time = mean(&stance_times);

    // Stride lengths: reference marker displacement between consecutive
    // heel-strike samples, counted only when both endpoints are visible.
    // `sample_rate` is the reference series' own rate, which may differ
    // from the force rate the events were detected at.
    let sample_index = |e: &GaitEvent| (e.time * sample_rate).round().max(0.0) as usize;
    let stride_lengths: Vec<f64> = heel_strikes
        .windows(2)
        .filter_map(|w| {
            let a = reference.get(sample_index(w[0])).copied().flatten()?;
            let b = reference.get(sample_index(w[1])).copied().flatten()?;
            Some(distance(a, b))
        })
        .collect();
    let stride_length = if stride_lengths.is_empty() {
        0.0
    } else {
        mean(&stride_lengths)
    };

    let cadence = if stride_time > 0.0 {
        60.0 / stride_time
    } else {
        0.0
    };
    let speed = if stride_time > 0.0 {
        stride_length / stride_time
    } else {
        0.0
    };
    let stance_pct = if stride_time > 0.0 {
        100.0 * stance_time / stride_time
    } else {
        0.0
    };

    Some(SpatiotemporalStats {
        stride_count: stride_times.len(),
        stride_time,
        stance_time,
        cadence,
        stride_length,
        speed,
        stance_pct,
        swing_pct: 100.0 - stance_pct,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn distance(a: Point3, b: Point3) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
