//! Marker trajectory extraction from the interleaved sample data section.
//!
//! Each frame stores one point record per marker (3 coordinates + residual),
//! followed by that frame's analog samples. Point records are 4 x f32
//! (16 bytes) in float mode, 4 x i16 (8 bytes) in integer mode; integer
//! coordinates are multiplied by `abs(scale)`.

use crate::codec;
use crate::container::header::Header;
use crate::container::params::ParameterDict;
use crate::error::Result;

/// A 3D marker position in capture units (typically mm).
pub type Point3 = [f64; 3];

/// Per-frame, per-marker 3D trajectories with explicit occlusion.
///
/// The grid is `positions[frame][marker]`; `None` denotes an occluded
/// sample and must never be treated as a reading at the origin.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MarkerSeries {
    /// Marker labels, unique by construction (duplicates and gaps fall back
    /// to generated `MARKERn` names).
    pub labels: Vec<String>,
    /// Coordinate unit, e.g. `"mm"`.
    pub units: String,
    /// `[frame][marker]` position grid.
    pub positions: Vec<Vec<Option<Point3>>>,
    /// `[frame][marker]` reconstruction residuals (negative = invalid).
    pub residuals: Vec<Vec<f64>>,
    /// Video frame rate (Hz).
    pub frame_rate: f64,
    /// First frame index as stored (1-indexed).
    pub first_frame: u16,
}

impl MarkerSeries {
    /// Extract all marker trajectories described by `header`.
    pub fn extract(data: &[u8], header: &Header, params: &ParameterDict) -> Result<Self> {
        let order = header.byte_order;
        let markers = header.point_count as usize;
        let frames = header.frame_count();
        let labels = resolve_labels(params, markers);
        let units = params
            .strings("POINT", "UNITS")
            .and_then(|u| u.first().cloned())
            .unwrap_or_else(|| "mm".to_string());

        let stride = header.frame_stride();
        let record = header.point_record_size();
        let scale = f64::from(header.scale.abs());
        let base = header.data_offset();

        let mut positions = Vec::with_capacity(frames);
        let mut residuals = Vec::with_capacity(frames);
        for frame in 0..frames {
            let frame_start = base + frame * stride;
            let mut row = Vec::with_capacity(markers);
            let mut res_row = Vec::with_capacity(markers);
            for m in 0..markers {
                let off = frame_start + m * record;
                let (pos, residual) = if header.is_float() {
                    decode_float_point(data, off, order)?
                } else {
                    decode_int_point(data, off, order, scale)?
                };
                row.push(pos);
                res_row.push(residual);
            }
            positions.push(row);
            residuals.push(res_row);
        }

        Ok(Self {
            labels,
            units,
            positions,
            residuals,
            frame_rate: f64::from(header.frame_rate),
            first_frame: header.first_frame,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.positions.len()
    }

    pub fn marker_count(&self) -> usize {
        self.labels.len()
    }

    /// Column index of a marker label, if present.
    pub fn marker_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Position of a labeled marker at a frame; `None` when occluded or
    /// out of range.
    pub fn position(&self, frame: usize, label: &str) -> Option<Point3> {
        let m = self.marker_index(label)?;
        *self.positions.get(frame)?.get(m)?
    }

    /// Full per-frame series for one labeled marker.
    pub fn trajectory(&self, label: &str) -> Option<Vec<Option<Point3>>> {
        let m = self.marker_index(label)?;
        Some(self.positions.iter().map(|row| row[m]).collect())
    }
}

/// Occlusion rule: a negative residual, or all three coordinates exactly
/// zero, marks the sample invalid. The all-zero check is a heuristic that
/// conflates a true origin reading with missing data; origin readings are
/// never anatomically meaningful for marker data, and existing captures
/// depend on this exact behavior.
fn classify(x: f64, y: f64, z: f64, residual: f64) -> Option<Point3> {
    if residual < 0.0 || (x == 0.0 && y == 0.0 && z == 0.0) {
        None
    } else {
        Some([x, y, z])
    }
}

fn decode_float_point(
    data: &[u8],
    off: usize,
    order: codec::ByteOrder,
) -> Result<(Option<Point3>, f64)> {
    let x = f64::from(codec::read_f32(data, off, order)?);
    let y = f64::from(codec::read_f32(data, off + 4, order)?);
    let z = f64::from(codec::read_f32(data, off + 8, order)?);
    let residual = f64::from(codec::read_f32(data, off + 12, order)?);
    Ok((classify(x, y, z, residual), residual))
}

fn decode_int_point(
    data: &[u8],
    off: usize,
    order: codec::ByteOrder,
    scale: f64,
) -> Result<(Option<Point3>, f64)> {
    let xi = codec::read_i16(data, off, order)?;
    let yi = codec::read_i16(data, off + 2, order)?;
    let zi = codec::read_i16(data, off + 4, order)?;
    let ri = codec::read_i16(data, off + 6, order)?;
    let x = f64::from(xi) * scale;
    let y = f64::from(yi) * scale;
    let z = f64::from(zi) * scale;
    let residual = if ri < 0 {
        f64::from(ri)
    } else {
        f64::from(ri) * scale
    };
    Ok((classify(x, y, z, f64::from(ri)), residual))
}

/// Resolve marker labels from `POINT:LABELS`, synthesizing positional
/// `MARKERn` names for missing entries, blanks, and duplicates.
fn resolve_labels(params: &ParameterDict, markers: usize) -> Vec<String> {
    let stored = params.strings("POINT", "LABELS").unwrap_or(&[]);
    let mut labels: Vec<String> = Vec::with_capacity(markers);
    for i in 0..markers {
        let candidate = stored.get(i).map(|s| s.trim().to_string());
        let label = match candidate {
            Some(s) if !s.is_empty() && !labels.contains(&s) => s,
            _ => format!("MARKER{}", i + 1),
        };
        labels.push(label);
    }
    labels
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_residual_is_occluded() {
        assert_eq!(classify(1.0, 2.0, 3.0, -1.0), None);
    }

    #[test]
    fn all_zero_coordinates_are_occluded() {
        assert_eq!(classify(0.0, 0.0, 0.0, 0.5), None);
    }

    #[test]
    fn valid_point_passes_through() {
        assert_eq!(classify(1.0, 0.0, 0.0, 0.0), Some([1.0, 0.0, 0.0]));
        assert_eq!(classify(-4.5, 2.0, 9.0, 3.2), Some([-4.5, 2.0, 9.0]));
    }

    #[test]
    fn int_point_scaling() {
        let order = codec::ByteOrder::Little;
        let mut buf = Vec::new();
        codec::write_i16(&mut buf, 100, order);
        codec::write_i16(&mut buf, -200, order);
        codec::write_i16(&mut buf, 40, order);
        codec::write_i16(&mut buf, 2, order);
        let (pos, residual) = decode_int_point(&buf, 0, order, 0.5).unwrap();
        assert_eq!(pos, Some([50.0, -100.0, 20.0]));
        assert_eq!(residual, 1.0);
    }

    #[test]
    fn int_point_negative_residual() {
        let order = codec::ByteOrder::Little;
        let mut buf = Vec::new();
        for v in [10i16, 10, 10, -1] {
            codec::write_i16(&mut buf, v, order);
        }
        let (pos, residual) = decode_int_point(&buf, 0, order, 1.0).unwrap();
        assert_eq!(pos, None);
        assert!(residual < 0.0);
    }

    #[test]
    fn synthesized_and_deduplicated_labels() {
        let dict = ParameterDict::default();
        assert_eq!(resolve_labels(&dict, 2), ["MARKER1", "MARKER2"]);
    }
}
