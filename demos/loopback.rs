//! Drives the initializer and a command/response round trip entirely over
//! [`LoopbackTransport`], with no real serial port involved. Useful for
//! seeing the log instrumentation without hardware.

use log::info;
use xbee_core::{parse_frame, Address, Error, InitConfig, LoopbackTransport, Transport, XBee};

/// Builds the wire bytes for an unescaped frame: delimiter, big-endian
/// length, payload, checksum. None of the bytes used by this demo need
/// escaping.
fn wire_frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u16;
    let sum: u8 = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    let mut wire = vec![0x7E];
    wire.extend_from_slice(&len.to_be_bytes());
    wire.extend_from_slice(payload);
    wire.push(0xFFu8.wrapping_sub(sum));
    wire
}

/// Wraps a [`LoopbackTransport`] so reads return nothing until after the
/// first write. `XBee::open`'s opening buffer drain runs before any write,
/// and a real module can't have replied to a command it hasn't received
/// yet — without this gate, the scripted handshake queued up front would be
/// indistinguishable from stale noise and get drained away with it.
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

/// Scripts a [`LoopbackTransport`] to answer the initializer's `+++`/`ATAP
/// 2` handshake the way a real module would, then queues one unsolicited
/// Receive16 frame behind it.
fn scripted_transport(config: &InitConfig) -> ScriptedTransport {
    let mut t = LoopbackTransport::new();
    t.push_incoming(b"OK\r");
    t.push_incoming(b"OK\rOK\rOK\rOK\r");

    let queries: [([u8; 2], u8); 3] = [
        ([b'A', b'P'], 0x02),
        ([b'D', b'7'], 0x01),
        ([b'D', b'6'], 0x01),
    ];
    for (i, (at, data)) in queries.iter().enumerate() {
        let payload = [0x88, config.query_frame_ids[i], at[0], at[1], 0x00, *data];
        t.push_incoming(&wire_frame(&payload));
    }

    t.push_incoming(&wire_frame(&[0x81, 0x12, 0x34, 0x28, 0x00, b'h', b'i']));
    ScriptedTransport::new(t)
}

fn main() {
    env_logger::init();

    let config = InitConfig::default();
    let transport = scripted_transport(&config);
    let mut xbee = XBee::open(transport, 256, &config).expect("initializer failed");
    info!("initializer complete, module is in API mode 2");

    xbee.at_command(0x10, [b'N', b'I'], &[]).unwrap();
    xbee.remote_at_command(0x11, Address::Addr16(0x1234), 0x02, [b'D', b'7'], &[])
        .unwrap();

    let mut out = [0u8; 64];
    match xbee.recv_frame(&mut out).unwrap() {
        Some(n) => match parse_frame(&out[..n]) {
            Ok(response) => info!("received {response:?}"),
            Err(e) => info!("could not parse received frame: {e}"),
        },
        None => info!("no frame ready yet"),
    }
}
