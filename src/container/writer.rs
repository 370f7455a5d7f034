//! Minimal container encoder.
//!
//! Produces a complete single-capture container (header block, parameter
//! section, float-mode sample data) that [`parse`](crate::container::parse)
//! reads back. Exists for round-trip fidelity checks and for re-exporting
//! edited captures; it writes only the documented mainstream layout, always
//! in float mode.

use crate::codec::{self, ByteOrder};
use crate::container::Capture;
use crate::container::header::{BLOCK_SIZE, MAGIC};

const TYPE_CHAR: u8 = (-1i8) as u8;
const TYPE_FLOAT: u8 = 4;

/// Encoder for the capture container format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Writer {
    pub order: ByteOrder,
}

impl Writer {
    pub fn new(order: ByteOrder) -> Self {
        Self { order }
    }

    /// Encode a capture into a complete container byte buffer.
    pub fn encode(&self, capture: &Capture) -> Vec<u8> {
        let order = self.order;
        let markers = &capture.markers;
        let frames = markers.frame_count();
        let points = markers.marker_count() as u16;

        let channels = capture.analog.channels.len() as u16;
        let spf: u16 = if channels == 0 {
            0
        } else {
            (capture.analog.sample_rate / capture.frame_rate.max(1.0))
                .round()
                .max(1.0) as u16
        };

        let params = self.encode_parameters(capture);
        let param_blocks = params.len().div_ceil(BLOCK_SIZE).max(1);
        let data_block = (2 + param_blocks) as u16;

        let header = super::Header {
            param_block: 2,
            point_count: points,
            analog_total: channels * spf,
            first_frame: capture.first_frame.max(1),
            last_frame: capture.first_frame.max(1) + frames.saturating_sub(1) as u16,
            max_gap: capture.max_gap,
            scale: -1.0,
            data_block,
            samples_per_frame: spf,
            frame_rate: capture.frame_rate as f32,
            byte_order: order,
        };

        let mut out = header.encode();
        out.extend_from_slice(&params);
        out.resize(BLOCK_SIZE + param_blocks * BLOCK_SIZE, 0);
        self.encode_data(&mut out, capture, spf);
        let total_blocks = out.len().div_ceil(BLOCK_SIZE);
        out.resize(total_blocks * BLOCK_SIZE, 0);
        out
    }

    fn encode_parameters(&self, capture: &Capture) -> Vec<u8> {
        let order = self.order;
        let markers = &capture.markers;

        // (name, group id, payload) triples; the payload of a group record
        // is its empty description, parameters carry type/dims/elements.
        let mut records: Vec<(String, i8, Vec<u8>)> = Vec::new();

        records.push(("POINT".into(), -1, vec![0]));
        records.push(("LABELS".into(), 1, char_param(&markers.labels)));
        records.push(("UNITS".into(), 1, char_param(&[markers.units.clone()])));
        records.push(("RATE".into(), 1, float_param(&[markers.frame_rate as f32], order)));

        if !capture.analog.is_empty() {
            let labels: Vec<String> =
                capture.analog.channels.iter().map(|c| c.label.clone()).collect();
            let units: Vec<String> =
                capture.analog.channels.iter().map(|c| c.unit.clone()).collect();
            let scales: Vec<f32> =
                capture.analog.channels.iter().map(|c| c.scale as f32).collect();
            let offsets: Vec<f32> =
                capture.analog.channels.iter().map(|c| c.offset as f32).collect();
            records.push(("ANALOG".into(), -2, vec![0]));
            records.push(("LABELS".into(), 2, char_param(&labels)));
            records.push(("UNITS".into(), 2, char_param(&units)));
            records.push(("SCALE".into(), 2, float_param(&scales, order)));
            records.push(("OFFSET".into(), 2, float_param(&offsets, order)));
        }

        if let Some(subject) = &capture.subject {
            records.push(("SUBJECTS".into(), -4, vec![0]));
            records.push(("NAMES".into(), 4, char_param(&[subject.clone()])));
        }

        if !capture.events.is_empty() {
            let times: Vec<f32> = capture.events.iter().map(|e| e.time as f32).collect();
            let labels: Vec<String> = capture.events.iter().map(|e| e.label.clone()).collect();
            records.push(("EVENT".into(), -3, vec![0]));
            records.push(("TIMES".into(), 3, float_param(&times, order)));
            records.push(("LABELS".into(), 3, char_param(&labels)));
            if capture.events.iter().any(|e| e.context.is_some()) {
                let contexts: Vec<String> = capture
                    .events
                    .iter()
                    .map(|e| e.context.clone().unwrap_or_default())
                    .collect();
                records.push(("CONTEXTS".into(), 3, char_param(&contexts)));
            }
        }

        // Prologue, then the chain with the last record's next-offset zeroed.
        let mut buf = vec![0x01, MAGIC, 0x00, order.processor_byte()];
        let last = records.len() - 1;
        for (i, (name, group_id, payload)) in records.iter().enumerate() {
            buf.push(name.len() as u8);
            buf.push(*group_id as u8);
            buf.extend_from_slice(name.as_bytes());
            // Next-record offsets count from the byte after the i16 field.
            let next = if i == last { 0 } else { payload.len() as i16 };
            codec::write_i16(&mut buf, next, order);
            buf.extend_from_slice(payload);
        }
        // Patch the block count now that the section size is known.
        buf[2] = buf.len().div_ceil(BLOCK_SIZE) as u8;
        buf
    }

    fn encode_data(&self, out: &mut Vec<u8>, capture: &Capture, spf: u16) {
        let order = self.order;
        let markers = &capture.markers;
        for (frame, row) in markers.positions.iter().enumerate() {
            for (m, pos) in row.iter().enumerate() {
                match pos {
                    Some([x, y, z]) => {
                        codec::write_f32(out, *x as f32, order);
                        codec::write_f32(out, *y as f32, order);
                        codec::write_f32(out, *z as f32, order);
                        let residual = markers
                            .residuals
                            .get(frame)
                            .and_then(|r| r.get(m))
                            .copied()
                            .unwrap_or(0.0)
                            .max(0.0);
                        codec::write_f32(out, residual as f32, order);
                    }
                    None => {
                        // Occlusion renders as the all-zero sentinel plus a
                        // negative residual.
                        for _ in 0..3 {
                            codec::write_f32(out, 0.0, order);
                        }
                        codec::write_f32(out, -1.0, order);
                    }
                }
            }
            for s in 0..spf as usize {
                for ch in &capture.analog.channels {
                    let idx = frame * spf as usize + s;
                    let raw = ch.samples.get(idx).copied().unwrap_or(0.0);
                    codec::write_f32(out, raw as f32, order);
                }
            }
        }
    }
}

/// Char parameter payload: `[width, count]` with space padding.
fn char_param(strings: &[String]) -> Vec<u8> {
    let width = strings.iter().map(|s| s.len()).max().unwrap_or(0).max(1);
    let mut payload = vec![TYPE_CHAR, 2, width as u8, strings.len() as u8];
    for s in strings {
        payload.extend_from_slice(s.as_bytes());
        payload.extend(std::iter::repeat_n(b' ', width - s.len()));
    }
    payload
}

/// Flat float parameter payload `[n]`.
fn float_param(values: &[f32], order: ByteOrder) -> Vec<u8> {
    let mut payload = vec![TYPE_FLOAT, 1, values.len() as u8];
    for &v in values {
        codec::write_f32(&mut payload, v, order);
    }
    payload
}
