//! Analog channel extraction (force plates, EMG, auxiliary voltages).
//!
//! Analog samples follow each frame's point records, sample-major: sample 0
//! of every channel, then sample 1 of every channel, and so on. Raw values
//! are retained unscaled; per-channel calibration is exposed as a derived
//! view so source samples are never mutated.

use crate::codec;
use crate::container::header::Header;
use crate::container::params::ParameterDict;
use crate::error::Result;

/// One analog channel with its calibration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Channel {
    pub label: String,
    pub unit: String,
    /// Raw decoded samples, unscaled.
    pub samples: Vec<f64>,
    /// Per-channel scale applied by [`Channel::scaled`].
    pub scale: f64,
    /// Per-channel offset subtracted before scaling.
    pub offset: f64,
}

impl Channel {
    /// Calibrated view: `(raw - offset) * scale` per sample.
    pub fn scaled(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|&s| (s - self.offset) * self.scale)
            .collect()
    }
}

/// All analog channels of a capture, sharing one sample rate.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelSeries {
    pub channels: Vec<Channel>,
    /// Samples per second: `frame_rate * samples_per_frame`.
    pub sample_rate: f64,
}

impl ChannelSeries {
    /// Extract every analog channel described by `header`.
    pub fn extract(data: &[u8], header: &Header, params: &ParameterDict) -> Result<Self> {
        let order = header.byte_order;
        let channel_count = header.analog_channels();
        let spf = header.samples_per_frame as usize;
        let frames = header.frame_count();
        let sample_rate = f64::from(header.frame_rate) * spf as f64;

        if channel_count == 0 {
            return Ok(Self {
                channels: Vec::new(),
                sample_rate,
            });
        }

        let labels = params.strings("ANALOG", "LABELS").unwrap_or(&[]);
        let units = params.strings("ANALOG", "UNITS").unwrap_or(&[]);
        let scales = params.floats("ANALOG", "SCALE").unwrap_or_default();
        let offsets = params.floats("ANALOG", "OFFSET").unwrap_or_default();

        let mut raw: Vec<Vec<f64>> = vec![Vec::with_capacity(frames * spf); channel_count];
        let base = header.data_offset();
        let stride = header.frame_stride();
        let point_block = header.point_count as usize * header.point_record_size();
        let size = header.analog_sample_size();

        for frame in 0..frames {
            let analog_start = base + frame * stride + point_block;
            for s in 0..spf {
                for (c, samples) in raw.iter_mut().enumerate() {
                    let off = analog_start + (s * channel_count + c) * size;
                    let val = if header.is_float() {
                        f64::from(codec::read_f32(data, off, order)?)
                    } else {
                        f64::from(codec::read_i16(data, off, order)?)
                    };
                    samples.push(val);
                }
            }
        }

        let channels = raw
            .into_iter()
            .enumerate()
            .map(|(c, samples)| Channel {
                label: labels
                    .get(c)
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| format!("ANALOG{}", c + 1)),
                unit: units.get(c).cloned().unwrap_or_default(),
                samples,
                scale: scales.get(c).copied().map(f64::from).unwrap_or(1.0),
                offset: offsets.get(c).copied().map(f64::from).unwrap_or(0.0),
            })
            .collect();

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Find a channel by label.
    pub fn channel(&self, label: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.label == label)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_view_leaves_raw_untouched() {
        let ch = Channel {
            label: "FZ1".into(),
            unit: "N".into(),
            samples: vec![10.0, 20.0, 30.0],
            scale: 2.0,
            offset: 10.0,
        };
        assert_eq!(ch.scaled(), vec![0.0, 20.0, 40.0]);
        assert_eq!(ch.samples, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn defaults_without_calibration_parameters() {
        let ch = Channel {
            label: "ANALOG1".into(),
            unit: String::new(),
            samples: vec![5.0],
            scale: 1.0,
            offset: 0.0,
        };
        assert_eq!(ch.scaled(), vec![5.0]);
    }
}
