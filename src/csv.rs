//! CSV interchange for marker trajectories.
//!
//! Contract: header row `Frame,Time,<Label>_X,<Label>_Y,<Label>_Z,...`, one
//! data row per frame, occluded markers rendered as three consecutive empty
//! fields. No quoting; labels therefore must not contain commas.

use crate::container::{MarkerSeries, Point3};
use crate::error::{CaptureError, Result};

/// Render a marker series in the interchange format.
pub fn export_markers(markers: &MarkerSeries) -> String {
    let mut out = String::from("Frame,Time");
    for label in &markers.labels {
        for axis in ["X", "Y", "Z"] {
            out.push(',');
            out.push_str(label);
            out.push('_');
            out.push_str(axis);
        }
    }
    out.push('\n');

    let rate = if markers.frame_rate > 0.0 {
        markers.frame_rate
    } else {
        1.0
    };
    for (i, row) in markers.positions.iter().enumerate() {
        let frame = markers.first_frame as usize + i;
        let time = i as f64 / rate;
        out.push_str(&format!("{frame},{time:.5}"));
        for pos in row {
            match pos {
                Some([x, y, z]) => out.push_str(&format!(",{x:.5},{y:.5},{z:.5}")),
                None => out.push_str(",,,"),
            }
        }
        out.push('\n');
    }
    out
}

/// Parse the interchange format back into a marker series.
///
/// The frame rate is not carried by the format and must be supplied.
pub fn import_markers(text: &str, frame_rate: f64) -> Result<MarkerSeries> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| CaptureError::InvalidFormat("empty CSV document".into()))?;

    let columns: Vec<&str> = header.split(',').collect();
    if columns.len() < 2 || columns[0] != "Frame" || columns[1] != "Time" {
        return Err(CaptureError::InvalidFormat(
            "CSV header must start with Frame,Time".into(),
        ));
    }
    if (columns.len() - 2) % 3 != 0 {
        return Err(CaptureError::InvalidFormat(
            "CSV marker columns must come in X/Y/Z triples".into(),
        ));
    }

    let mut labels = Vec::new();
    for triple in columns[2..].chunks(3) {
        let label = triple[0]
            .strip_suffix("_X")
            .ok_or_else(|| {
                CaptureError::InvalidFormat(format!("expected <Label>_X column, got {:?}", triple[0]))
            })?
            .to_string();
        labels.push(label);
    }

    let mut positions: Vec<Vec<Option<Point3>>> = Vec::new();
    let mut first_frame: Option<u16> = None;
    for (line_no, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 + labels.len() * 3 {
            return Err(CaptureError::InvalidFormat(format!(
                "CSV row {} has {} fields, expected {}",
                line_no + 1,
                fields.len(),
                2 + labels.len() * 3,
            )));
        }
        if first_frame.is_none() {
            first_frame = fields[0].trim().parse::<u16>().ok();
        }

        let mut row = Vec::with_capacity(labels.len());
        for triple in fields[2..].chunks(3) {
            if triple.iter().all(|f| f.trim().is_empty()) {
                row.push(None);
                continue;
            }
            let mut coords = [0.0; 3];
            for (axis, field) in triple.iter().enumerate() {
                coords[axis] = field.trim().parse::<f64>().map_err(|_| {
                    CaptureError::InvalidFormat(format!(
                        "unparseable coordinate {field:?} in row {}",
                        line_no + 1
                    ))
                })?;
            }
            row.push(Some(coords));
        }
        positions.push(row);
    }

    Ok(MarkerSeries {
        labels,
        units: "mm".into(),
        residuals: vec![vec![0.0; positions.first().map_or(0, Vec::len)]; positions.len()],
        positions,
        frame_rate,
        first_frame: first_frame.unwrap_or(1),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> MarkerSeries {
        MarkerSeries {
            labels: vec!["LHEE".into(), "RTOE".into()],
            units: "mm".into(),
            positions: vec![
                vec![Some([1.0, 2.0, 3.0]), Some([4.0, 5.0, 6.0])],
                vec![None, Some([7.0, 8.0, 9.0])],
            ],
            residuals: vec![vec![0.0; 2]; 2],
            frame_rate: 100.0,
            first_frame: 1,
        }
    }

    #[test]
    fn export_header_and_occlusion_rendering() {
        let csv = export_markers(&sample_series());
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Frame,Time,LHEE_X,LHEE_Y,LHEE_Z,RTOE_X,RTOE_Y,RTOE_Z"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,0.00000,1.00000,2.00000,3.00000,4.00000,5.00000,6.00000"
        );
        // Occluded marker renders as three consecutive empty fields.
        assert_eq!(
            lines.next().unwrap(),
            "2,0.01000,,,,7.00000,8.00000,9.00000"
        );
    }

    #[test]
    fn round_trip() {
        let original = sample_series();
        let csv = export_markers(&original);
        let back = import_markers(&csv, 100.0).unwrap();
        assert_eq!(back.labels, original.labels);
        assert_eq!(back.frame_count(), 2);
        assert_eq!(back.first_frame, 1);
        assert_eq!(back.positions[1][0], None);
        let p = back.positions[1][1].unwrap();
        assert!((p[0] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn bad_header_is_invalid_format() {
        assert!(matches!(
            import_markers("Sample,Time,A_X,A_Y,A_Z\n", 100.0),
            Err(CaptureError::InvalidFormat(_))
        ));
        assert!(matches!(
            import_markers("Frame,Time,A_X,A_Y\n", 100.0),
            Err(CaptureError::InvalidFormat(_))
        ));
        assert!(matches!(
            import_markers("", 100.0),
            Err(CaptureError::InvalidFormat(_))
        ));
    }

    #[test]
    fn short_row_names_row_and_field_counts() {
        let text = "Frame,Time,A_X,A_Y,A_Z\n1,0.0,1.0,2.0\n";
        let err = import_markers(text, 100.0).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidFormat(_)));
        assert_eq!(
            err.to_string(),
            "invalid container format: CSV row 1 has 4 fields, expected 5"
        );
    }
}
