//! Embedded event record extraction.
//!
//! Events are stored as parallel `EVENT:LABELS` / `EVENT:TIMES` /
//! `EVENT:CONTEXTS` parameter arrays. The time array appears in two layouts
//! in the wild: `[2, N]` (two interleaved values per event, only the first
//! of each pair is the timestamp) or a flat `[N]` array. Both are accepted.

use crate::container::params::ParameterDict;

/// A discrete labeled event on the capture timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event {
    pub label: String,
    /// Time in seconds from capture start.
    pub time: f64,
    /// Frame index derived as `round(time * frame_rate)`.
    pub frame: usize,
    /// Optional context tag, e.g. a body side ("Left"/"Right").
    pub context: Option<String>,
}

/// Decode all events from the parameter dictionary, sorted ascending by
/// time. Captures without event parameters yield an empty list.
pub fn extract(params: &ParameterDict, frame_rate: f64) -> Vec<Event> {
    let Some(raw_times) = params.floats("EVENT", "TIMES") else {
        return Vec::new();
    };
    let dims = params.dimensions("EVENT", "TIMES").unwrap_or(&[]);

    // [2, N] stores pairs; only the first of each pair is the timestamp.
    let times: Vec<f64> = if dims.len() >= 2 && dims[0] == 2 {
        raw_times.chunks(2).map(|pair| f64::from(pair[0])).collect()
    } else {
        raw_times.iter().map(|&t| f64::from(t)).collect()
    };

    let labels = params.strings("EVENT", "LABELS").unwrap_or(&[]);
    let contexts = params.strings("EVENT", "CONTEXTS").unwrap_or(&[]);

    let mut events: Vec<Event> = times
        .iter()
        .enumerate()
        .map(|(i, &time)| Event {
            label: labels
                .get(i)
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| format!("EVENT{}", i + 1)),
            time,
            frame: (time * frame_rate).round().max(0.0) as usize,
            context: contexts
                .get(i)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
        .collect();

    events.sort_by(|a, b| a.time.total_cmp(&b.time));
    events
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
