//! The startup sequence (§4.6) that drives the transport out of transparent
//! AT mode into API mode 2 with hardware flow control.

use log::{debug, warn};

use crate::command;
use crate::error::{Error, InitStage};
use crate::response::Response;
use crate::ring::RingBuffer;
use crate::transport::{write_all, Transport};
use crate::{decoder, response};

/// Configuration for [`initialize`]; also consumed by `XBee::open`.
///
/// Defaults match the module's factory AT guard time and a conventional
/// choice of distinct query frame ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitConfig {
    /// The silent period (seconds) held before and after `+++`.
    pub guard_time_seconds: f64,
    /// Frame ids used for the `AP`, `D7`, `D6` queries, in that order.
    pub query_frame_ids: [u8; 3],
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            guard_time_seconds: 1.0,
            query_frame_ids: [1, 2, 3],
        }
    }
}

const AT_QUERIES: [[u8; 2]; 3] = [[b'A', b'P'], [b'D', b'7'], [b'D', b'6']];
const EXPECTED_DATA: [u8; 3] = [0x02, 0x01, 0x01];
const CONFIG_LINE: &[u8] = b"ATAP 2\rATD7 1\rATD6 1\rATCN\r";

/// Bounds polling loops against a transport that never produces the
/// expected bytes, so a genuinely stuck transport fails with an `Init`
/// error instead of hanging forever. Not part of the wire protocol; a
/// practical necessity the reference's blocking, bare `read` loop left
/// implicit.
const MAX_POLL_ATTEMPTS: u32 = 1000;

fn drain<T: Transport + ?Sized>(transport: &mut T) {
    let mut scratch = [0u8; 64];
    for _ in 0..MAX_POLL_ATTEMPTS {
        match transport.read(&mut scratch) {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }
}

/// Polls `read` until `buf` is filled or polling is exhausted. Does not
/// itself fail on a short read — the caller compares the (possibly
/// partially-filled, stale-tailed) buffer against the expected bytes, which
/// naturally rejects a short read.
fn read_exact_polled<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Result<(), Error> {
    let mut filled = 0;
    for _ in 0..MAX_POLL_ATTEMPTS {
        if filled == buf.len() {
            break;
        }
        let n = transport.read(&mut buf[filled..])?;
        filled += n;
    }
    Ok(())
}

fn expect_ok<T: Transport + ?Sized>(transport: &mut T, stage: InitStage) -> Result<(), Error> {
    let mut buf = [0u8; 3];
    read_exact_polled(transport, &mut buf)?;
    if &buf != b"OK\r" {
        warn!("initializer: expected \"OK\\r\" at stage {stage:?}, got {buf:02x?}");
        return Err(Error::Init { stage });
    }
    Ok(())
}

/// Polls for one decoded frame, refilling `ring` from `transport` as
/// needed, up to [`MAX_POLL_ATTEMPTS`] refills.
fn poll_for_frame<T: Transport + ?Sized>(
    transport: &mut T,
    ring: &mut RingBuffer,
    out: &mut [u8],
) -> Result<Option<usize>, Error> {
    for _ in 0..MAX_POLL_ATTEMPTS {
        if let Some(n) = decoder::decode_frame(ring, out)? {
            return Ok(Some(n));
        }
        ring.fill(transport)?;
    }
    Ok(None)
}

/// Runs the initializer (§4.6). `ring` must be empty (freshly constructed);
/// on success the transport is in API mode 2 with RTS/CTS flow control
/// enabled and ready for [`crate::encoder::send_frame`] /
/// [`crate::decoder::decode_frame`] traffic.
pub(crate) fn initialize<T: Transport + ?Sized>(
    transport: &mut T,
    ring: &mut RingBuffer,
    config: &InitConfig,
) -> Result<(), Error> {
    debug!("initializer: draining transport");
    drain(transport);

    transport.sleep(config.guard_time_seconds);
    for &b in b"+++" {
        write_all(transport, &[b])?;
    }
    transport.sleep(config.guard_time_seconds);

    expect_ok(transport, InitStage::NoOk)?;

    write_all(transport, CONFIG_LINE).map_err(|_| Error::Init {
        stage: InitStage::ConfigWrite,
    })?;

    for (i, at) in AT_QUERIES.iter().enumerate() {
        command::at_command(transport, config.query_frame_ids[i], *at, &[])?;
    }

    transport.sleep(1.0);

    let ack_stages = [
        InitStage::BadApSetAck,
        InitStage::BadD7SetAck,
        InitStage::BadD6SetAck,
        InitStage::BadCnAck,
    ];
    for stage in ack_stages {
        expect_ok(transport, stage)?;
    }

    for (i, at) in AT_QUERIES.iter().enumerate() {
        let mut frame_buf = [0u8; 64];
        let n = poll_for_frame(transport, ring, &mut frame_buf)?
            .ok_or(Error::Init { stage: InitStage::FrameIdMismatch })?;
        match response::parse_frame(&frame_buf[..n])? {
            Response::AtResponse {
                frame_id,
                at_command,
                data,
                ..
            } => {
                if frame_id != config.query_frame_ids[i] || at_command != *at {
                    warn!(
                        "initializer: AT response mismatch for query {i}: frame_id={frame_id}, at={at_command:?}"
                    );
                    return Err(Error::Init {
                        stage: InitStage::FrameIdMismatch,
                    });
                }
                if data.len() != 1 || data[0] != EXPECTED_DATA[i] {
                    let stage = match i {
                        0 => InitStage::ApResponseMismatch,
                        1 => InitStage::D7ResponseMismatch,
                        _ => InitStage::D6ResponseMismatch,
                    };
                    warn!("initializer: unexpected AT response data for query {i}: {data:?}");
                    return Err(Error::Init { stage });
                }
            }
            _ => {
                return Err(Error::Init {
                    stage: InitStage::FrameIdMismatch,
                })
            }
        }
    }

    debug!("initializer: API mode 2 configured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::send_frame;
    use crate::transport::LoopbackTransport;

    /// Wraps a [`LoopbackTransport`] so reads return nothing until after the
    /// first write. `initialize`'s opening `drain()` call runs before any
    /// write, and a real module can't have replied to a command it hasn't
    /// received yet — without this gate, a scripted reply queued up front
    /// would be indistinguishable from stale noise and `drain()` would
    /// swallow it whole.
    struct ScriptedTransport {
        inner: LoopbackTransport,
        armed: bool,
    }

    impl ScriptedTransport {
        fn new(inner: LoopbackTransport) -> Self {
            ScriptedTransport { inner, armed: false }
        }
    }

    impl Transport for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
            self.armed = true;
            self.inner.write(buf)
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
            if !self.armed {
                return Ok(0);
            }
            self.inner.read(buf)
        }

        fn sleep(&mut self, seconds: f64) {
            self.inner.sleep(seconds)
        }
    }

    fn script_happy_path(t: &mut LoopbackTransport, config: &InitConfig) {
        t.push_incoming(b"OK\r");
        t.push_incoming(b"OK\rOK\rOK\rOK\r");
        for (i, at) in AT_QUERIES.iter().enumerate() {
            let payload = [
                0x88,
                config.query_frame_ids[i],
                at[0],
                at[1],
                0x00,
                EXPECTED_DATA[i],
            ];
            let mut wire_transport = LoopbackTransport::new();
            send_frame(&mut wire_transport, &payload).unwrap();
            t.push_incoming(&wire_transport.take_sent());
        }
    }

    #[test]
    fn happy_path_succeeds() {
        let config = InitConfig::default();
        let mut inner = LoopbackTransport::new();
        script_happy_path(&mut inner, &config);
        let mut t = ScriptedTransport::new(inner);
        let mut ring = RingBuffer::new(256);
        initialize(&mut t, &mut ring, &config).unwrap();
    }

    #[test]
    fn missing_initial_ok_fails_with_no_ok_stage() {
        let config = InitConfig::default();
        let mut inner = LoopbackTransport::new();
        inner.push_incoming(b"XX\r");
        let mut t = ScriptedTransport::new(inner);
        let mut ring = RingBuffer::new(256);
        let err = initialize(&mut t, &mut ring, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Init {
                stage: InitStage::NoOk
            }
        ));
    }

    #[test]
    fn missing_config_ack_fails() {
        let config = InitConfig::default();
        let mut inner = LoopbackTransport::new();
        inner.push_incoming(b"OK\r");
        // Withhold the four config acks entirely.
        let mut t = ScriptedTransport::new(inner);
        let mut ring = RingBuffer::new(256);
        let err = initialize(&mut t, &mut ring, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Init {
                stage: InitStage::BadApSetAck
            }
        ));
    }

    #[test]
    fn wrong_ap_response_data_fails() {
        let config = InitConfig::default();
        let mut inner = LoopbackTransport::new();
        inner.push_incoming(b"OK\r");
        inner.push_incoming(b"OK\rOK\rOK\rOK\r");
        // AP response carries the wrong data byte (0x00 instead of 0x02).
        let payload = [0x88, config.query_frame_ids[0], b'A', b'P', 0x00, 0x00];
        let mut wt = LoopbackTransport::new();
        send_frame(&mut wt, &payload).unwrap();
        inner.push_incoming(&wt.take_sent());

        let mut t = ScriptedTransport::new(inner);
        let mut ring = RingBuffer::new(256);
        let err = initialize(&mut t, &mut ring, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Init {
                stage: InitStage::ApResponseMismatch
            }
        ));
    }
}
