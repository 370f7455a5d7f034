//! Primitive field codecs for the capture container.
//!
//! Unlike fixed-endian wire formats, the container's byte order is discovered
//! while parsing the header itself (from the writer's processor type), so
//! every multi-byte read is parameterized by a [`ByteOrder`]. All reads are
//! bounds-checked; nothing here assumes alignment.

use crate::error::{CaptureError, Result};

/// Processor-type byte values historically written into the parameter block.
pub const PROC_INTEL: u8 = 0x54;
pub const PROC_DEC: u8 = 0x55;
pub const PROC_MIPS: u8 = 0x56;

/// Byte order of all multi-byte fields in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Map a processor-type byte to a byte order.
    ///
    /// Only `PROC_MIPS` selects big-endian. Unrecognized values fall back to
    /// little-endian rather than failing; nonstandard writers rely on this.
    pub fn from_processor_byte(b: u8) -> Self {
        match b {
            PROC_MIPS => Self::Big,
            PROC_INTEL | PROC_DEC => Self::Little,
            _ => Self::Little,
        }
    }

    pub fn processor_byte(self) -> u8 {
        match self {
            Self::Little => PROC_INTEL,
            Self::Big => PROC_MIPS,
        }
    }
}

// ---------------------------------------------------------------------------
// Read helpers
// ---------------------------------------------------------------------------

/// Read a signed 16-bit integer.
pub fn read_i16(data: &[u8], offset: usize, order: ByteOrder) -> Result<i16> {
    check_len(data, offset, 2, "INT16")?;
    let b = [data[offset], data[offset + 1]];
    Ok(match order {
        ByteOrder::Little => i16::from_le_bytes(b),
        ByteOrder::Big => i16::from_be_bytes(b),
    })
}

/// Read an unsigned 16-bit integer.
pub fn read_u16(data: &[u8], offset: usize, order: ByteOrder) -> Result<u16> {
    check_len(data, offset, 2, "UINT16")?;
    let b = [data[offset], data[offset + 1]];
    Ok(match order {
        ByteOrder::Little => u16::from_le_bytes(b),
        ByteOrder::Big => u16::from_be_bytes(b),
    })
}

/// Read a 32-bit IEEE 754 float.
pub fn read_f32(data: &[u8], offset: usize, order: ByteOrder) -> Result<f32> {
    check_len(data, offset, 4, "FLOAT32")?;
    let b = [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ];
    Ok(match order {
        ByteOrder::Little => f32::from_le_bytes(b),
        ByteOrder::Big => f32::from_be_bytes(b),
    })
}

/// Read a signed byte (i8). Single bytes are order-independent.
pub fn read_i8(data: &[u8], offset: usize) -> Result<i8> {
    check_len(data, offset, 1, "INT8")?;
    Ok(data[offset] as i8)
}

// ---------------------------------------------------------------------------
// Write helpers
// ---------------------------------------------------------------------------

/// Write a signed 16-bit integer.
pub fn write_i16(buf: &mut Vec<u8>, val: i16, order: ByteOrder) {
    match order {
        ByteOrder::Little => buf.extend_from_slice(&val.to_le_bytes()),
        ByteOrder::Big => buf.extend_from_slice(&val.to_be_bytes()),
    }
}

/// Write an unsigned 16-bit integer.
pub fn write_u16(buf: &mut Vec<u8>, val: u16, order: ByteOrder) {
    match order {
        ByteOrder::Little => buf.extend_from_slice(&val.to_le_bytes()),
        ByteOrder::Big => buf.extend_from_slice(&val.to_be_bytes()),
    }
}

/// Write a 32-bit IEEE 754 float.
pub fn write_f32(buf: &mut Vec<u8>, val: f32, order: ByteOrder) {
    match order {
        ByteOrder::Little => buf.extend_from_slice(&val.to_le_bytes()),
        ByteOrder::Big => buf.extend_from_slice(&val.to_be_bytes()),
    }
}

// ---------------------------------------------------------------------------
// Internal
// ---------------------------------------------------------------------------

fn check_len(data: &[u8], offset: usize, need: usize, name: &'static str) -> Result<()> {
    if data.len() < offset + need {
        Err(CaptureError::short_read(name, offset, need, data.len()))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
