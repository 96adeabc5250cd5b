//! A host-side driver core for a Digi XBee 802.15.4 radio module running in
//! API mode 2 (escaped frames, hardware flow control).
//!
//! The core owns framing, checksums, escaping, and the receive ring buffer.
//! It knows nothing about how bytes actually reach the radio — that's
//! [`Transport`], implemented by the caller against a real serial port (or,
//! for tests and demos, [`LoopbackTransport`]).

mod address;
mod api;
mod command;
mod decoder;
mod encoder;
mod error;
mod init;
mod response;
mod ring;
mod transport;

pub use address::Address;
pub use error::{Error, InitStage};
pub use init::InitConfig;
pub use response::{parse_frame, Response};
pub use transport::{LoopbackTransport, Transport};

use ring::RingBuffer;

/// A handle to an initialized XBee radio.
///
/// Built by [`XBee::open`], which runs the module through the `+++`/`ATAP 2`
/// initializer (§4.6) before handing back a handle ready for
/// [`XBee::send_frame`]/[`XBee::recv_frame`] traffic.
pub struct XBee<T: Transport> {
    transport: T,
    ring: RingBuffer,
}

impl<T: Transport> XBee<T> {
    /// Runs the initializer over `transport` and returns a ready handle.
    ///
    /// `recv_capacity` sizes the internal receive ring buffer; it must be
    /// large enough to hold the largest frame the caller expects, plus the
    /// framing overhead (start delimiter, length, checksum).
    pub fn open(mut transport: T, recv_capacity: usize, config: &InitConfig) -> Result<Self, Error> {
        let mut ring = RingBuffer::new(recv_capacity);
        init::initialize(&mut transport, &mut ring, config)?;
        Ok(XBee { transport, ring })
    }

    /// Sends a raw frame with `payload` as its body (§4.1).
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<(), Error> {
        encoder::send_frame(&mut self.transport, payload)
    }

    /// Refills the internal receive buffer from the transport. Returns the
    /// number of bytes added; `0` means the transport had nothing ready.
    pub fn fill_buffer(&mut self) -> Result<usize, Error> {
        self.ring.fill(&mut self.transport)
    }

    /// Attempts to decode one frame already buffered internally, without
    /// touching the transport. See [`decoder::decode_frame`] for the
    /// resynchronization contract.
    pub fn decode_frame(&mut self, out: &mut [u8]) -> Result<Option<usize>, Error> {
        decoder::decode_frame(&mut self.ring, out)
    }

    /// Convenience wrapper: attempts to decode a frame already buffered, and
    /// if none is available, refills from the transport and tries once more.
    /// Call in a loop; `Ok(None)` means "try again once more data arrives".
    pub fn recv_frame(&mut self, out: &mut [u8]) -> Result<Option<usize>, Error> {
        if let Some(n) = self.decode_frame(out)? {
            return Ok(Some(n));
        }
        self.fill_buffer()?;
        self.decode_frame(out)
    }

    /// Queries or sets a local AT parameter.
    pub fn at_command(&mut self, frame_id: u8, at: [u8; 2], params: &[u8]) -> Result<(), Error> {
        command::at_command(&mut self.transport, frame_id, at, params)
    }

    /// Queues a local AT parameter change without an immediate apply.
    pub fn at_queue_parameter(
        &mut self,
        frame_id: u8,
        at: [u8; 2],
        params: &[u8],
    ) -> Result<(), Error> {
        command::at_queue_parameter(&mut self.transport, frame_id, at, params)
    }

    /// Queries or sets an AT parameter on a remote module.
    pub fn remote_at_command(
        &mut self,
        frame_id: u8,
        addr: Address,
        options: u8,
        at: [u8; 2],
        params: &[u8],
    ) -> Result<(), Error> {
        command::remote_at_command(&mut self.transport, frame_id, addr, options, at, params)
    }

    /// Transmits `data` to `addr`.
    pub fn transmit(
        &mut self,
        frame_id: u8,
        addr: Address,
        options: u8,
        data: &[u8],
    ) -> Result<(), Error> {
        command::transmit(&mut self.transport, frame_id, addr, options, data)
    }

    /// Gives back the underlying transport, discarding any buffered but
    /// undecoded bytes.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
