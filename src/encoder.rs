//! The frame encoder: start delimiter, escaped length, escaped payload,
//! escaped checksum trailer. Stateless per call; writes go straight to the
//! transport with no buffering, threading a running checksum accumulator the
//! way the teacher's `stuffed_tx_byte` threads its CRC accumulator.

use log::trace;

use crate::error::Error;
use crate::transport::{write_all, Transport};

pub(crate) const START_DELIMITER: u8 = 0x7E;
pub(crate) const ESCAPE: u8 = 0x7D;
pub(crate) const XOR: u8 = 0x20;

fn needs_escape(byte: u8) -> bool {
    matches!(byte, 0x7E | 0x7D | 0x11 | 0x13)
}

fn write_escaped<T: Transport + ?Sized>(transport: &mut T, byte: u8) -> Result<(), Error> {
    if needs_escape(byte) {
        write_all(transport, &[ESCAPE, byte ^ XOR])
    } else {
        write_all(transport, &[byte])
    }
}

/// Threads the running checksum accumulator across a frame's payload bytes
/// as they are escaped and written directly to the transport.
struct FrameWriter<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    checksum: u8,
}

impl<'a, T: Transport + ?Sized> FrameWriter<'a, T> {
    /// Emits the start delimiter (never escaped) and the escaped,
    /// big-endian length field, and resets the checksum accumulator to 0 so
    /// it covers only what follows.
    fn start(transport: &'a mut T, payload_len: u16) -> Result<Self, Error> {
        write_all(transport, &[START_DELIMITER])?;
        let [hi, lo] = payload_len.to_be_bytes();
        write_escaped(transport, hi)?;
        write_escaped(transport, lo)?;
        Ok(FrameWriter {
            transport,
            checksum: 0,
        })
    }

    /// Escapes and writes one payload byte, accumulating it into the
    /// checksum.
    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.checksum = self.checksum.wrapping_add(byte);
        write_escaped(self.transport, byte)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Finalizes the accumulator as `0xFF - sum` and writes the escaped
    /// checksum byte.
    fn finish(self) -> Result<(), Error> {
        let checksum = 0xFFu8.wrapping_sub(self.checksum);
        write_escaped(self.transport, checksum)
    }
}

/// Emits a complete frame whose payload is the concatenation of `parts`, in
/// order, without materializing the concatenated payload in memory.
pub(crate) fn send_frame_parts<T: Transport + ?Sized>(
    transport: &mut T,
    parts: &[&[u8]],
) -> Result<(), Error> {
    let total_len: usize = parts.iter().map(|p| p.len()).sum();
    trace!("encoding frame: {total_len} payload bytes");
    let mut writer = FrameWriter::start(transport, total_len as u16)?;
    for part in parts {
        writer.write_bytes(part)?;
    }
    writer.finish()
}

/// Emits a complete frame for `payload` (§4.1).
pub fn send_frame<T: Transport + ?Sized>(transport: &mut T, payload: &[u8]) -> Result<(), Error> {
    send_frame_parts(transport, &[payload])
}
