//! Parses a decoded frame payload into a typed [`Response`] (§4.5).
//!
//! Responses borrow from the caller's decode buffer rather than copying —
//! the variable-length tail (`data`/`payload`) lives as long as the buffer
//! that `decode_frame` wrote into.

use crate::api;
use crate::error::Error;

/// A parsed incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// Unsolicited module status notification.
    ModemStatus { status: u8 },
    /// Acknowledges a `TRANSMIT_64`/`TRANSMIT_16` frame.
    TransmitStatus { frame_id: u8, status: u8 },
    /// Answers an `AT_COMMAND`/`AT_QUEUE_PARAMETER` frame.
    AtResponse {
        frame_id: u8,
        at_command: [u8; 2],
        status: u8,
        data: &'a [u8],
    },
    /// Answers a `REMOTE_AT_COMMAND` frame.
    RemoteAtResponse {
        frame_id: u8,
        responder_addr64: u64,
        responder_addr16: u16,
        at_command: [u8; 2],
        status: u8,
        data: &'a [u8],
    },
    /// Data received addressed by 64-bit address.
    Receive64 {
        src_addr64: u64,
        rssi: u8,
        options: u8,
        payload: &'a [u8],
    },
    /// Data received addressed by 16-bit address.
    Receive16 {
        src_addr16: u16,
        rssi: u8,
        options: u8,
        payload: &'a [u8],
    },
}

/// Folds 8 big-endian bytes into a `u64` by repeated shift-and-or, avoiding
/// the historical reference bug of seeding the fold with a negative shift
/// (§9).
fn fold_addr64(bytes: &[u8]) -> u64 {
    let mut addr: u64 = 0;
    for &b in bytes {
        addr = (addr << 8) | b as u64;
    }
    addr
}

fn fold_addr16(hi: u8, lo: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

fn check_len(api: u8, got: usize, want: usize, exact: bool) -> Result<(), Error> {
    let ok = if exact { got == want } else { got >= want };
    if ok {
        Ok(())
    } else {
        Err(Error::WrongLengthForApi { api, got, want })
    }
}

/// Parses `payload` (a decoded frame's bytes, API id first) into a
/// [`Response`] borrowing from `payload`.
pub fn parse_frame(payload: &[u8]) -> Result<Response<'_>, Error> {
    let id = *payload.first().ok_or(Error::UnknownApiId(0))?;
    match id {
        api::MODEM_STATUS => {
            check_len(id, payload.len(), 2, true)?;
            Ok(Response::ModemStatus { status: payload[1] })
        }
        api::TRANSMIT_STATUS => {
            check_len(id, payload.len(), 3, true)?;
            Ok(Response::TransmitStatus {
                frame_id: payload[1],
                status: payload[2],
            })
        }
        api::AT_RESPONSE => {
            check_len(id, payload.len(), 5, false)?;
            Ok(Response::AtResponse {
                frame_id: payload[1],
                at_command: [payload[2], payload[3]],
                status: payload[4],
                data: &payload[5..],
            })
        }
        api::REMOTE_AT_RESPONSE => {
            check_len(id, payload.len(), 15, false)?;
            Ok(Response::RemoteAtResponse {
                frame_id: payload[1],
                responder_addr64: fold_addr64(&payload[2..10]),
                responder_addr16: fold_addr16(payload[10], payload[11]),
                at_command: [payload[12], payload[13]],
                status: payload[14],
                data: &payload[15..],
            })
        }
        api::RECEIVE_64 => {
            check_len(id, payload.len(), 11, false)?;
            Ok(Response::Receive64 {
                src_addr64: fold_addr64(&payload[1..9]),
                rssi: payload[9],
                options: payload[10],
                payload: &payload[11..],
            })
        }
        api::RECEIVE_16 => {
            check_len(id, payload.len(), 5, false)?;
            Ok(Response::Receive16 {
                src_addr16: fold_addr16(payload[1], payload[2]),
                rssi: payload[3],
                options: payload[4],
                payload: &payload[5..],
            })
        }
        other => Err(Error::UnknownApiId(other)),
    }
}
