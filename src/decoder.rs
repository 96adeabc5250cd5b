//! The receive state machine (§4.3): an escape-aware, self-resynchronizing
//! frame extractor over a [`RingBuffer`]. This is the hard part of the
//! crate — misaligned escapes, checksum failures, truncated frames, and
//! wrap-around arithmetic must never stall the stream or silently corrupt
//! the next frame.

use log::{debug, trace, warn};

use crate::encoder::{ESCAPE, START_DELIMITER};
use crate::error::Error;
use crate::ring::RingBuffer;

const MIN_VIABLE_FRAME: usize = 6;

/// The outcome of unescaping one logical byte starting at a raw ring
/// offset, used identically for the length field and the payload/checksum
/// run: the start delimiter is the sole synchronization point, so finding
/// it anywhere past offset 0 always means "a new frame has begun here",
/// regardless of which field we thought we were reading.
enum Unescaped {
    /// The decoded value, and how many raw ring bytes it consumed (1, or 2
    /// if it was an escape pair).
    Byte(u8, usize),
    /// An unescaped start delimiter was found mid-frame.
    FoundDelimiter,
    /// Not enough bytes are in the ring yet to resolve this position.
    NotEnoughData,
}

fn unescape_at(ring: &RingBuffer, raw_idx: usize) -> Unescaped {
    match ring.byte_at(raw_idx) {
        None => Unescaped::NotEnoughData,
        Some(START_DELIMITER) => Unescaped::FoundDelimiter,
        Some(ESCAPE) => match ring.byte_at(raw_idx + 1) {
            None => Unescaped::NotEnoughData,
            Some(b) => Unescaped::Byte(b ^ 0x20, 2),
        },
        Some(b) => Unescaped::Byte(b, 1),
    }
}

/// What to do after an unescape ran out of data before the ring had enough
/// bytes to resolve it (spec §4.3 step 5's `NOT_ENOUGH_DATA` branch,
/// generalized to the length field as well as the payload/checksum run).
enum NotEnoughDataOutcome {
    /// Drop one byte from the head and retry the whole frame from scratch.
    DropAndRetry,
    /// Genuinely need more bytes from the transport before retrying.
    NeedMoreData,
}

fn resolve_not_enough_data(ring: &RingBuffer) -> NotEnoughDataOutcome {
    if ring.is_full() {
        // The ring can't grow; holding out for more data would stall forever.
        NotEnoughDataOutcome::DropAndRetry
    } else if ring.find_from(START_DELIMITER, 1).is_some() {
        // A later start delimiter proves this attempt is already dead.
        NotEnoughDataOutcome::DropAndRetry
    } else {
        NotEnoughDataOutcome::NeedMoreData
    }
}

/// Attempts to decode exactly one frame from `ring` into `out`.
///
/// `Ok(None)` means no complete frame is available yet (refill and retry).
/// `Ok(Some(n))` means a validated frame of `n` payload bytes is in
/// `out[..n]`. Every loop iteration either drops at least one byte from the
/// ring or returns, so this always terminates in `O(ring.len())`.
pub fn decode_frame(ring: &mut RingBuffer, out: &mut [u8]) -> Result<Option<usize>, Error> {
    loop {
        if ring.len() < MIN_VIABLE_FRAME {
            return Ok(None);
        }

        if ring.byte_at(0) != Some(START_DELIMITER) {
            trace!("decoder: resync, dropping non-delimiter byte");
            ring.drop_front(1);
            continue;
        }

        let (hi, hi_len) = match unescape_at(ring, 1) {
            Unescaped::Byte(b, n) => (b, n),
            Unescaped::FoundDelimiter => {
                trace!("decoder: delimiter found while reading length, resync");
                ring.drop_front(1);
                continue;
            }
            Unescaped::NotEnoughData => match resolve_not_enough_data(ring) {
                NotEnoughDataOutcome::DropAndRetry => {
                    ring.drop_front(1);
                    continue;
                }
                NotEnoughDataOutcome::NeedMoreData => return Ok(None),
            },
        };

        let lo_raw_idx = 1 + hi_len;
        let (lo, lo_len) = match unescape_at(ring, lo_raw_idx) {
            Unescaped::Byte(b, n) => (b, n),
            Unescaped::FoundDelimiter => {
                trace!("decoder: delimiter found while reading length, resync");
                ring.drop_front(1);
                continue;
            }
            Unescaped::NotEnoughData => match resolve_not_enough_data(ring) {
                NotEnoughDataOutcome::DropAndRetry => {
                    ring.drop_front(1);
                    continue;
                }
                NotEnoughDataOutcome::NeedMoreData => return Ok(None),
            },
        };

        let length = ((hi as u16) << 8) | lo as u16;
        let required_raw_bytes = length as usize + 4;
        if length as usize + 1 > out.len() || required_raw_bytes > ring.capacity() {
            debug!("decoder: frame length {length} cannot fit, resync");
            ring.drop_front(1);
            continue;
        }

        let payload_start = lo_raw_idx + lo_len;
        let mut raw_idx = payload_start;
        let mut sum: u8 = 0;
        let mut out_idx = 0;
        let want = length as usize + 1; // payload + checksum byte

        let outcome = 'unescape: loop {
            if out_idx == want {
                break 'unescape None;
            }
            match unescape_at(ring, raw_idx) {
                Unescaped::Byte(b, n) => {
                    out[out_idx] = b;
                    sum = sum.wrapping_add(b);
                    out_idx += 1;
                    raw_idx += n;
                }
                Unescaped::FoundDelimiter => break 'unescape Some(true),
                Unescaped::NotEnoughData => break 'unescape Some(false),
            }
        };

        match outcome {
            Some(true) => {
                trace!("decoder: delimiter found mid-frame, abandoning and resyncing");
                ring.drop_front(1);
                continue;
            }
            Some(false) => match resolve_not_enough_data(ring) {
                NotEnoughDataOutcome::DropAndRetry => {
                    ring.drop_front(1);
                    continue;
                }
                NotEnoughDataOutcome::NeedMoreData => return Ok(None),
            },
            None => {}
        }

        if sum == 0xFF {
            ring.drop_front(raw_idx);
            return Ok(Some(length as usize));
        }

        warn!("decoder: checksum mismatch (sum=0x{sum:02x}), dropping and resyncing");
        ring.drop_front(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::send_frame;
    use crate::transport::LoopbackTransport;

    fn encode(payload: &[u8]) -> Vec<u8> {
        let mut t = LoopbackTransport::new();
        send_frame(&mut t, payload).unwrap();
        t.take_sent()
    }

    fn ring_with(bytes: &[u8], capacity: usize) -> RingBuffer {
        let mut ring = RingBuffer::new(capacity);
        let mut t = LoopbackTransport::new();
        t.push_incoming(bytes);
        ring.fill(&mut t).unwrap();
        ring
    }

    #[test]
    fn round_trips_a_simple_payload() {
        let payload = [0x08, 0x01, 0x41, 0x50];
        let wire = encode(&payload);
        let mut ring = ring_with(&wire, 256);
        let mut out = [0u8; 256];
        let n = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n], &payload);
        assert!(ring.is_empty());
    }

    #[test]
    fn returns_none_on_too_little_data() {
        let mut ring = ring_with(&[0x7E, 0x00], 256);
        let mut out = [0u8; 256];
        assert_eq!(decode_frame(&mut ring, &mut out).unwrap(), None);
    }

    #[test]
    fn resyncs_past_leading_garbage() {
        let payload = [0x08, 0x02, 0x41, 0x50];
        let wire = encode(&payload);
        let mut garbage = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        garbage.extend_from_slice(&wire);
        let mut ring = ring_with(&garbage, 256);
        let mut out = [0u8; 256];
        let n = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n], &payload);
    }

    #[test]
    fn mid_frame_delimiter_resyncs_to_next_frame() {
        // Spec §8 scenario (c).
        let wire = [
            0x7E, 0x00, 0x04, 0x08, 0x01, 0x41, 0x50, 0x7E, 0x00, 0x04, 0x08, 0x02, 0x41, 0x50,
            0x64,
        ];
        let mut ring = ring_with(&wire, 256);
        let mut out = [0u8; 256];
        let n = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n], &[0x08, 0x02, 0x41, 0x50]);
    }

    #[test]
    fn checksum_failure_drops_and_returns_none_then_recovers() {
        // Spec §8 scenario (d): bad checksum byte, nothing follows.
        let wire = [0x7E, 0x00, 0x04, 0x08, 0x01, 0x41, 0x50, 0x00];
        let mut ring = ring_with(&wire, 256);
        let mut out = [0u8; 256];
        assert_eq!(decode_frame(&mut ring, &mut out).unwrap(), None);

        // A well-formed frame appended afterwards still decodes fine.
        let mut t = LoopbackTransport::new();
        t.push_incoming(&encode(&[0x08, 0x03, 0x41, 0x50]));
        ring.fill(&mut t).unwrap();
        let n = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n], &[0x08, 0x03, 0x41, 0x50]);
    }

    #[test]
    fn two_frames_back_to_back_decode_in_order() {
        let a = [0x08, 0x01, 0x41, 0x50];
        let b = [0x08, 0x02, 0x44, 0x37];
        let mut wire = encode(&a);
        wire.extend(encode(&b));
        let mut ring = ring_with(&wire, 256);
        let mut out = [0u8; 256];

        let n1 = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n1], &a);
        let n2 = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n2], &b);
    }

    #[test]
    fn escaped_payload_round_trips() {
        let payload = [0x7E, 0x7D, 0x11, 0x13, 0xAA];
        let wire = encode(&payload);
        let mut ring = ring_with(&wire, 256);
        let mut out = [0u8; 256];
        let n = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..n], &payload);
    }

    #[test]
    fn frame_wrapping_across_ring_boundary_decodes_correctly() {
        // Spec §8 scenario (e): C=16, head placed near the end so the frame
        // wraps across the physical boundary.
        let payload = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE];
        let wire = encode(&payload); // 5 + 4 = 9 raw bytes, no escapes needed
        assert_eq!(wire.len(), 9);

        let mut ring = RingBuffer::new(16);
        let mut t = LoopbackTransport::new();
        // Push 12 filler bytes, fill, then drop 12 so head sits at physical
        // offset 12 (near the end of a 16-byte ring) before the real frame.
        t.push_incoming(&[0u8; 12]);
        ring.fill(&mut t).unwrap();
        ring.drop_front(12);

        let mut t2 = LoopbackTransport::new();
        t2.push_incoming(&wire);
        let n = ring.fill(&mut t2).unwrap();
        assert_eq!(n, 9);

        let mut out = [0u8; 16];
        let decoded = decode_frame(&mut ring, &mut out).unwrap().unwrap();
        assert_eq!(&out[..decoded], &payload);
        assert!(ring.is_empty());
    }

    #[test]
    fn oversize_frame_for_output_buffer_resyncs() {
        let payload = [0u8; 10];
        let wire = encode(&payload);
        let mut ring = ring_with(&wire, 256);
        let mut out = [0u8; 4]; // too small for a 10-byte payload
        assert_eq!(decode_frame(&mut ring, &mut out).unwrap(), None);
    }

    #[test]
    fn terminates_on_all_garbage_input() {
        let garbage = vec![0x7Eu8; 64];
        let mut ring = ring_with(&garbage, 256);
        let mut out = [0u8; 256];
        assert_eq!(decode_frame(&mut ring, &mut out).unwrap(), None);
        assert!(ring.len() <= ring.capacity());
    }
}
