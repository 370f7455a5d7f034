//! Digital IIR filtering for signal conditioning.
//!
//! One second-order section ([`Biquad`]) with a Butterworth-flat low-pass
//! design and a constant-Q notch design, applied zero-phase by running the
//! section forward and then backward over the sample vector.
//!
//! Signal functions never error: degenerate arguments (empty input,
//! non-positive rate or cutoff, cutoff at or above Nyquist) pass the input
//! through unfiltered.

use std::f64::consts::PI;

/// Fixed notch bandwidth (Hz).
const NOTCH_BANDWIDTH: f64 = 2.0;

/// A five-coefficient second-order IIR section (a0 normalized to 1).
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Butterworth-style low-pass section at `cutoff` Hz.
    ///
    /// Design: `wn = cutoff / (rate/2)`, `k = tan(pi * wn)`, damping
    /// `q = sqrt(2)`. Returns `None` for degenerate arguments.
    pub fn lowpass(cutoff: f64, sample_rate: f64) -> Option<Self> {
        if !(sample_rate > 0.0) || !(cutoff > 0.0) || cutoff >= sample_rate / 2.0 {
            return None;
        }
        let wn = cutoff / (sample_rate / 2.0);
        let k = (PI * wn).tan();
        let q = 2.0_f64.sqrt();
        let norm = 1.0 / (1.0 + q * k + k * k);
        let b0 = k * k * norm;
        Some(Self {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: 2.0 * (k * k - 1.0) * norm,
            a2: (1.0 - q * k + k * k) * norm,
        })
    }

    /// Constant-Q notch at `freq` Hz with a fixed 2 Hz bandwidth.
    pub fn notch(freq: f64, sample_rate: f64) -> Option<Self> {
        if !(sample_rate > 0.0) || !(freq > 0.0) || freq >= sample_rate / 2.0 {
            return None;
        }
        let q = freq / NOTCH_BANDWIDTH;
        let w0 = 2.0 * PI * freq / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;
        Some(Self {
            b0: 1.0 / a0,
            b1: -2.0 * cos_w0 / a0,
            b2: 1.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        })
    }

    /// Run the section causally over `samples` (direct form II transposed).
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(samples.len());
        let mut z1 = 0.0;
        let mut z2 = 0.0;
        for &x in samples {
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            out.push(y);
        }
        out
    }

    /// Zero-phase run: filter forward, then filter the reversed result and
    /// reverse again. Doubles the attenuation and cancels phase delay.
    pub fn filtfilt(&self, samples: &[f64]) -> Vec<f64> {
        let mut forward = self.apply(samples);
        forward.reverse();
        let mut backward = self.apply(&forward);
        backward.reverse();
        backward
    }
}

/// Zero-phase low-pass at `cutoff` Hz.
///
/// `order` is accepted for API compatibility but ignored: a single
/// second-order section is applied regardless. Consumers calibrated against
/// the resulting (gentler) roll-off, so this stays a documented
/// simplification rather than a true higher-order cascade.
pub fn lowpass(samples: &[f64], sample_rate: f64, cutoff: f64, order: usize) -> Vec<f64> {
    let _ = order;
    match Biquad::lowpass(cutoff, sample_rate) {
        Some(section) => section.filtfilt(samples),
        None => samples.to_vec(),
    }
}

/// Zero-phase high-pass at `cutoff` Hz, derived as `x - lowpass(x)` rather
/// than a dedicated high-pass section.
pub fn highpass(samples: &[f64], sample_rate: f64, cutoff: f64, order: usize) -> Vec<f64> {
    let low = lowpass(samples, sample_rate, cutoff, order);
    samples.iter().zip(&low).map(|(x, l)| x - l).collect()
}

/// Zero-phase band-pass: high-pass at `low_cutoff`, then low-pass at
/// `high_cutoff`.
pub fn bandpass(
    samples: &[f64],
    sample_rate: f64,
    low_cutoff: f64,
    high_cutoff: f64,
) -> Vec<f64> {
    let high = highpass(samples, sample_rate, low_cutoff, 2);
    lowpass(&high, sample_rate, high_cutoff, 2)
}

/// Zero-phase notch at `freq` Hz (2 Hz bandwidth), for mains interference.
pub fn notch(samples: &[f64], sample_rate: f64, freq: f64) -> Vec<f64> {
    match Biquad::notch(freq, sample_rate) {
        Some(section) => section.filtfilt(samples),
        None => samples.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn variance(x: &[f64]) -> f64 {
        let mean = x.iter().sum::<f64>() / x.len() as f64;
        x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / x.len() as f64
    }

    /// 2 Hz + 30 Hz mix at 1 kHz.
    fn mixed_signal() -> Vec<f64> {
        (0..2000)
            .map(|i| {
                let t = i as f64 / 1000.0;
                (2.0 * PI * 2.0 * t).sin() + (2.0 * PI * 30.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn lowpass_attenuates_high_frequency_energy() {
        let input = mixed_signal();
        let output = lowpass(&input, 1000.0, 10.0, 2);
        assert_eq!(output.len(), input.len());
        assert!(
            variance(&output) < 0.75 * variance(&input),
            "high-frequency energy not attenuated: {} vs {}",
            variance(&output),
            variance(&input)
        );
    }

    #[test]
    fn order_argument_is_ignored() {
        let input = mixed_signal();
        assert_eq!(
            lowpass(&input, 1000.0, 10.0, 2),
            lowpass(&input, 1000.0, 10.0, 8)
        );
    }

    #[test]
    fn highpass_removes_dc() {
        let input: Vec<f64> = (0..1000)
            .map(|i| 5.0 + (2.0 * PI * 40.0 * i as f64 / 1000.0).sin())
            .collect();
        let output = highpass(&input, 1000.0, 10.0, 2);
        let mean = output.iter().sum::<f64>() / output.len() as f64;
        assert!(mean.abs() < 0.1, "residual DC {mean}");
    }

    #[test]
    fn notch_attenuates_target_frequency() {
        let input: Vec<f64> = (0..4000)
            .map(|i| (2.0 * PI * 50.0 * i as f64 / 1000.0).sin())
            .collect();
        let output = notch(&input, 1000.0, 50.0);
        // Compare steady-state amplitude away from the edges.
        let peak_in = input[1000..3000].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let peak_out = output[1000..3000].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(
            peak_out < 0.2 * peak_in,
            "50 Hz not rejected: {peak_out} vs {peak_in}"
        );
    }

    #[test]
    fn degenerate_arguments_pass_through() {
        let input = vec![1.0, 2.0, 3.0];
        assert_eq!(lowpass(&input, 1000.0, 0.0, 2), input);
        assert_eq!(lowpass(&input, 0.0, 10.0, 2), input);
        assert_eq!(lowpass(&input, 1000.0, 600.0, 2), input); // above Nyquist
        assert_eq!(notch(&input, 1000.0, -50.0), input);
        assert!(lowpass(&[], 1000.0, 10.0, 2).is_empty());
    }

    #[test]
    fn filtfilt_preserves_length() {
        let section = Biquad::lowpass(10.0, 1000.0).unwrap();
        assert_eq!(section.filtfilt(&[0.5; 37]).len(), 37);
    }
}
