//! Capture container decoding.
//!
//! - [`parse`] — decode a whole in-memory buffer into a [`Capture`]
//! - [`Capture::from_file`] — read + decode, the only I/O touchpoint
//! - [`Writer`] — minimal encoder for round-trips and re-export
//!
//! Decoding is a synchronous pure function over the buffer: header first
//! (which discovers the byte order), then the two-pass parameter dictionary,
//! then the marker / analog / event extractors. All scratch state is local,
//! so concurrent parses need no coordination.

pub mod analog;
pub mod events;
pub mod header;
pub mod params;
pub mod points;
pub mod writer;

use std::path::Path;

pub use analog::{Channel, ChannelSeries};
pub use events::Event;
pub use header::Header;
pub use params::{ParamValue, ParameterDict, ParameterRecord};
pub use points::{MarkerSeries, Point3};
pub use writer::Writer;

use crate::error::{CaptureError, Result};

/// A fully decoded capture: marker trajectories, analog channels, and
/// embedded events. Immutable once constructed; derived analyses produce
/// new values rather than mutating these.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Capture {
    pub markers: MarkerSeries,
    pub analog: ChannelSeries,
    pub events: Vec<Event>,
    /// Video frame rate (Hz).
    pub frame_rate: f64,
    /// First/last frame indices as stored (1-indexed, inclusive).
    pub first_frame: u16,
    pub last_frame: u16,
    /// Maximum interpolation gap declared by the writer, in frames.
    pub max_gap: u16,
    /// Source file name, when decoded via [`Capture::from_file`].
    pub source: Option<String>,
    /// Subject name from the `SUBJECTS:NAMES` parameter, when declared.
    pub subject: Option<String>,
}

impl Capture {
    pub fn frame_count(&self) -> usize {
        self.markers.frame_count()
    }

    /// Read and decode a container file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| CaptureError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let mut capture = parse(&data)?;
        capture.source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(capture)
    }
}

/// Decode a complete container buffer.
pub fn parse(data: &[u8]) -> Result<Capture> {
    let header = Header::decode(data)?;
    let params = ParameterDict::decode(data, &header)?;
    let markers = MarkerSeries::extract(data, &header, &params)?;
    let analog = ChannelSeries::extract(data, &header, &params)?;
    let events = events::extract(&params, f64::from(header.frame_rate));
    let subject = params
        .strings("SUBJECTS", "NAMES")
        .and_then(|names| names.first())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(Capture {
        markers,
        analog,
        events,
        frame_rate: f64::from(header.frame_rate),
        first_frame: header.first_frame,
        last_frame: header.last_frame,
        max_gap: header.max_gap,
        source: None,
        subject,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
