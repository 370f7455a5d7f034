//! EMG signal conditioning pipeline.
//!
//! Ordered whole-vector stages: band-pass, optional mains notch, optional
//! full-wave rectification, low-pass envelope. Each stage returns a new
//! vector; no streaming state is retained between calls.

use crate::filter;

/// EMG pipeline configuration. The defaults suit surface EMG sampled in the
/// 1-2 kHz range: 20-450 Hz band, rectification on, 6 Hz linear envelope.
#[derive(Debug, Clone)]
pub struct EmgConfig {
    /// Band-pass low cutoff (Hz); `None` skips the high-pass stage.
    pub band_low: Option<f64>,
    /// Band-pass high cutoff (Hz); `None` skips the low-pass stage.
    pub band_high: Option<f64>,
    /// Mains notch frequency (Hz), typically 50 or 60; `None` disables.
    pub notch: Option<f64>,
    /// Full-wave rectification (absolute value).
    pub rectify: bool,
    /// Envelope low-pass cutoff (Hz); `None` skips the envelope stage.
    pub envelope: Option<f64>,
}

impl Default for EmgConfig {
    fn default() -> Self {
        Self {
            band_low: Some(20.0),
            band_high: Some(450.0),
            notch: None,
            rectify: true,
            envelope: Some(6.0),
        }
    }
}

/// Run the EMG conditioning pipeline over a raw sample vector.
pub fn process_emg(raw: &[f64], sample_rate: f64, config: &EmgConfig) -> Vec<f64> {
    let mut signal = raw.to_vec();

    if let Some(low) = config.band_low {
        signal = filter::highpass(&signal, sample_rate, low, 2);
    }
    if let Some(high) = config.band_high {
        signal = filter::lowpass(&signal, sample_rate, high, 2);
    }
    if let Some(freq) = config.notch {
        signal = filter::notch(&signal, sample_rate, freq);
    }
    if config.rectify {
        for s in &mut signal {
            *s = s.abs();
        }
    }
    if let Some(cutoff) = config.envelope {
        signal = filter::lowpass(&signal, sample_rate, cutoff, 2);
    }

    signal
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
