//! Joint-angle trigonometry and finite-difference kinematics.
//!
//! Angle convention: the interior angle at the center marker, in degrees;
//! 180 is fully extended, smaller values are more flexed. Angle series are
//! gated per frame by marker occlusion with no interpolation; gap filling
//! is an explicit, separate operation over position data.

use crate::container::{MarkerSeries, Point3};
use crate::error::{CaptureError, Result};

/// Segment lengths below this are treated as degenerate.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Interior angle (degrees) at `center` formed by `proximal` and `distal`.
///
/// Returns 0.0 when either segment is shorter than [`MIN_SEGMENT_LENGTH`],
/// never NaN. The `acos` argument is clamped to [-1, 1] to guard
/// floating-point overshoot on collinear points.
pub fn joint_angle(proximal: Point3, center: Point3, distal: Point3) -> f64 {
    let u = sub(proximal, center);
    let v = sub(distal, center);
    let lu = norm(u);
    let lv = norm(v);
    if lu < MIN_SEGMENT_LENGTH || lv < MIN_SEGMENT_LENGTH {
        return 0.0;
    }
    let cos = (dot(u, v) / (lu * lv)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Per-frame joint-angle series for three labeled markers.
///
/// A frame yields `None` when any of the three markers is occluded. Unknown
/// labels are an error: an angle over a nonexistent marker has no sane
/// default.
pub fn joint_angle_series(
    markers: &MarkerSeries,
    proximal: &str,
    center: &str,
    distal: &str,
) -> Result<Vec<Option<f64>>> {
    let idx = |label: &str| {
        markers.marker_index(label).ok_or_else(|| {
            CaptureError::MissingRequiredData(format!("marker label {label:?} not present"))
        })
    };
    let (p, c, d) = (idx(proximal)?, idx(center)?, idx(distal)?);

    Ok(markers
        .positions
        .iter()
        .map(|row| match (row[p], row[c], row[d]) {
            (Some(pp), Some(cp), Some(dp)) => Some(joint_angle(pp, cp, dp)),
            _ => None,
        })
        .collect())
}

/// Finite-difference derivative of a scalar series sampled at `sample_rate`.
///
/// Central difference for interior samples, one-sided forward/backward at
/// the two boundaries. Series shorter than 2 samples return zeros.
pub fn derivative(samples: &[f64], sample_rate: f64) -> Vec<f64> {
    let n = samples.len();
    if n < 2 || !(sample_rate > 0.0) {
        return vec![0.0; n];
    }
    let dt = 1.0 / sample_rate;
    let mut out = Vec::with_capacity(n);
    out.push((samples[1] - samples[0]) / dt);
    for i in 1..n - 1 {
        out.push((samples[i + 1] - samples[i - 1]) / (2.0 * dt));
    }
    out.push((samples[n - 1] - samples[n - 2]) / dt);
    out
}

/// Per-frame 3D velocity of a marker trajectory.
///
/// Occluded samples are zero-filled for the differencing itself; output
/// validity at those frames is gated by the caller against the original
/// occlusion mask.
pub fn velocity(positions: &[Option<Point3>], sample_rate: f64) -> Vec<Point3> {
    let filled: Vec<Point3> = positions
        .iter()
        .map(|p| p.unwrap_or([0.0, 0.0, 0.0]))
        .collect();
    differentiate3(&filled, sample_rate)
}

/// Per-frame 3D acceleration: the derivative applied twice.
pub fn acceleration(positions: &[Option<Point3>], sample_rate: f64) -> Vec<Point3> {
    differentiate3(&velocity(positions, sample_rate), sample_rate)
}

fn differentiate3(series: &[Point3], sample_rate: f64) -> Vec<Point3> {
    let mut axes = [vec![], vec![], vec![]];
    for axis in 0..3 {
        let scalar: Vec<f64> = series.iter().map(|p| p[axis]).collect();
        axes[axis] = derivative(&scalar, sample_rate);
    }
    (0..series.len())
        .map(|i| [axes[0][i], axes[1][i], axes[2][i]])
        .collect()
}

fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
