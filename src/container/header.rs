//! Fixed-offset header block decoding.
//!
//! Layout (u16/f32 fields in the container's byte order):
//! ```text
//! [0]  u8   parameter block pointer (1-indexed, 512-byte blocks)
//! [1]  u8   magic 0x50
//! [2]  u16  marker (point) count
//! [4]  u16  total analog samples per frame (channels x samples/frame)
//! [6]  u16  first frame (1-indexed)
//! [8]  u16  last frame
//! [10] u16  max interpolation gap
//! [12] f32  scale factor (negative = float sample encoding)
//! [16] u16  data block pointer (1-indexed)
//! [18] u16  analog samples per frame
//! [20] f32  frame rate (Hz)
//! ```
//!
//! Byte order itself is discovered from the processor-type byte at offset 3
//! of the parameter block, so that byte is peeked before any multi-byte read.

use crate::codec::{self, ByteOrder};
use crate::error::{CaptureError, Result};

/// Size of one storage block.
pub const BLOCK_SIZE: usize = 512;

/// Magic byte at header offset 1.
pub const MAGIC: u8 = 0x50;

/// Decoded fixed header. Transient: consumed by the section extractors,
/// not part of the public [`Capture`](crate::Capture).
#[derive(Debug, Clone)]
pub struct Header {
    /// 1-indexed parameter block pointer.
    pub param_block: u8,
    /// Number of tracked markers per frame.
    pub point_count: u16,
    /// Total analog samples stored per frame (channels x samples/frame).
    pub analog_total: u16,
    /// First frame index (1-indexed, inclusive).
    pub first_frame: u16,
    /// Last frame index (inclusive).
    pub last_frame: u16,
    /// Maximum interpolation gap, in frames.
    pub max_gap: u16,
    /// Coordinate scale factor; sign selects the sample encoding
    /// (negative = 32-bit float, positive = scaled 16-bit integer).
    pub scale: f32,
    /// 1-indexed data block pointer.
    pub data_block: u16,
    /// Analog samples per frame per channel.
    pub samples_per_frame: u16,
    /// Video frame rate (Hz).
    pub frame_rate: f32,
    /// Byte order of every multi-byte field in the container.
    pub byte_order: ByteOrder,
}

impl Header {
    /// Parse the header block, discovering byte order from the parameter
    /// block's processor-type byte.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 24 {
            return Err(CaptureError::short_read("header block", 0, 24, data.len()));
        }
        if data[1] != MAGIC {
            return Err(CaptureError::InvalidFormat(format!(
                "bad magic byte (expected 0x{MAGIC:02X}, got 0x{:02X})",
                data[1]
            )));
        }

        let param_block = data[0];
        if param_block == 0 {
            return Err(CaptureError::InvalidFormat(
                "parameter block pointer is zero".into(),
            ));
        }

        // Processor type lives inside the parameter block; peek it before
        // any multi-byte read.
        let proc_offset = (param_block as usize - 1) * BLOCK_SIZE + 3;
        let byte_order = match data.get(proc_offset) {
            Some(&b) => ByteOrder::from_processor_byte(b),
            None => {
                return Err(CaptureError::short_read(
                    "processor type byte",
                    proc_offset,
                    1,
                    data.len(),
                ));
            }
        };

        let header = Self {
            param_block,
            point_count: codec::read_u16(data, 2, byte_order)?,
            analog_total: codec::read_u16(data, 4, byte_order)?,
            first_frame: codec::read_u16(data, 6, byte_order)?,
            last_frame: codec::read_u16(data, 8, byte_order)?,
            max_gap: codec::read_u16(data, 10, byte_order)?,
            scale: codec::read_f32(data, 12, byte_order)?,
            data_block: codec::read_u16(data, 16, byte_order)?,
            samples_per_frame: codec::read_u16(data, 18, byte_order)?,
            frame_rate: codec::read_f32(data, 20, byte_order)?,
            byte_order,
        };

        if header.last_frame < header.first_frame {
            return Err(CaptureError::InvalidFormat(format!(
                "last frame {} precedes first frame {}",
                header.last_frame, header.first_frame
            )));
        }

        Ok(header)
    }

    /// Number of frames described by this header. Never negative: decode
    /// rejects headers with `last < first`.
    pub fn frame_count(&self) -> usize {
        (self.last_frame - self.first_frame) as usize + 1
    }

    /// True when sample data is stored as 32-bit floats.
    pub fn is_float(&self) -> bool {
        self.scale < 0.0
    }

    /// Number of analog channels (0 when no analog data is present).
    pub fn analog_channels(&self) -> usize {
        if self.samples_per_frame == 0 {
            0
        } else {
            self.analog_total as usize / self.samples_per_frame as usize
        }
    }

    /// Size in bytes of one point record (3 coordinates + residual).
    pub fn point_record_size(&self) -> usize {
        if self.is_float() { 16 } else { 8 }
    }

    /// Size in bytes of one analog scalar.
    pub fn analog_sample_size(&self) -> usize {
        if self.is_float() { 4 } else { 2 }
    }

    /// Byte stride of one interleaved frame in the data section.
    pub fn frame_stride(&self) -> usize {
        self.point_count as usize * self.point_record_size()
            + self.analog_channels() * self.samples_per_frame as usize * self.analog_sample_size()
    }

    /// Byte offset of the parameter block.
    pub fn param_offset(&self) -> usize {
        (self.param_block as usize - 1) * BLOCK_SIZE
    }

    /// Byte offset of the sample data section.
    pub fn data_offset(&self) -> usize {
        (self.data_block as usize).saturating_sub(1) * BLOCK_SIZE
    }

    /// Encode the fixed header fields into a full 512-byte block.
    pub fn encode(&self) -> Vec<u8> {
        let order = self.byte_order;
        let mut buf = Vec::with_capacity(BLOCK_SIZE);
        buf.push(self.param_block);
        buf.push(MAGIC);
        codec::write_u16(&mut buf, self.point_count, order);
        codec::write_u16(&mut buf, self.analog_total, order);
        codec::write_u16(&mut buf, self.first_frame, order);
        codec::write_u16(&mut buf, self.last_frame, order);
        codec::write_u16(&mut buf, self.max_gap, order);
        codec::write_f32(&mut buf, self.scale, order);
        codec::write_u16(&mut buf, self.data_block, order);
        codec::write_u16(&mut buf, self.samples_per_frame, order);
        codec::write_f32(&mut buf, self.frame_rate, order);
        buf.resize(BLOCK_SIZE, 0);
        buf
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{PROC_INTEL, PROC_MIPS};

    fn minimal_buffer(order: ByteOrder) -> Vec<u8> {
        let header = Header {
            param_block: 2,
            point_count: 3,
            analog_total: 4,
            first_frame: 1,
            last_frame: 10,
            max_gap: 0,
            scale: -1.0,
            data_block: 3,
            samples_per_frame: 2,
            frame_rate: 100.0,
            byte_order: order,
        };
        let mut buf = header.encode();
        // Parameter block with the processor byte at offset 3.
        let mut param = vec![0u8; BLOCK_SIZE];
        param[1] = MAGIC;
        param[3] = order.processor_byte();
        buf.extend_from_slice(&param);
        buf
    }

    #[test]
    fn decode_little_endian() {
        let buf = minimal_buffer(ByteOrder::Little);
        let h = Header::decode(&buf).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Little);
        assert_eq!(h.point_count, 3);
        assert_eq!(h.frame_count(), 10);
        assert!(h.is_float());
        assert_eq!(h.analog_channels(), 2);
        assert_eq!(h.frame_stride(), 3 * 16 + 2 * 2 * 4);
    }

    #[test]
    fn decode_big_endian() {
        let buf = minimal_buffer(ByteOrder::Big);
        let h = Header::decode(&buf).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Big);
        assert_eq!(h.point_count, 3);
        assert_eq!(h.frame_rate, 100.0);
    }

    #[test]
    fn unknown_processor_defaults_little() {
        let mut buf = minimal_buffer(ByteOrder::Little);
        buf[BLOCK_SIZE + 3] = 0x99;
        let h = Header::decode(&buf).unwrap();
        assert_eq!(h.byte_order, ByteOrder::Little);
    }

    #[test]
    fn bad_magic() {
        let mut buf = minimal_buffer(ByteOrder::Little);
        buf[1] = 0x00;
        assert!(matches!(
            Header::decode(&buf),
            Err(CaptureError::InvalidFormat(_))
        ));
    }

    #[test]
    fn frame_order_inverted() {
        let mut buf = minimal_buffer(ByteOrder::Little);
        // first = 10, last = 1
        buf[6] = 10;
        buf[8] = 1;
        assert!(matches!(
            Header::decode(&buf),
            Err(CaptureError::InvalidFormat(_))
        ));
    }

    #[test]
    fn truncated_header() {
        assert!(matches!(
            Header::decode(&[0x02, MAGIC, 0x00]),
            Err(CaptureError::CorruptedData { .. })
        ));
    }

    #[test]
    fn integer_mode_sizes() {
        let mut buf = minimal_buffer(ByteOrder::Little);
        // scale = +0.05 selects integer encoding
        buf[12..16].copy_from_slice(&0.05f32.to_le_bytes());
        let h = Header::decode(&buf).unwrap();
        assert!(!h.is_float());
        assert_eq!(h.point_record_size(), 8);
        assert_eq!(h.analog_sample_size(), 2);
    }

    #[test]
    fn proc_bytes() {
        assert_eq!(ByteOrder::Little.processor_byte(), PROC_INTEL);
        assert_eq!(ByteOrder::Big.processor_byte(), PROC_MIPS);
    }
}
