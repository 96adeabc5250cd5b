//! Outgoing frame builders (§4.4). Each function assembles its payload as a
//! handful of logical slices and hands them straight to
//! [`crate::encoder::send_frame_parts`] — no intermediate buffer.

use crate::address::Address;
use crate::api;
use crate::encoder::send_frame_parts;
use crate::error::Error;
use crate::transport::Transport;

/// Queries or sets a local AT parameter.
pub fn at_command<T: Transport + ?Sized>(
    transport: &mut T,
    frame_id: u8,
    at: [u8; 2],
    params: &[u8],
) -> Result<(), Error> {
    send_frame_parts(
        transport,
        &[&[api::AT_COMMAND, frame_id, at[0], at[1]], params],
    )
}

/// Queues a local AT parameter change without forcing an immediate radio
/// reconfiguration.
pub fn at_queue_parameter<T: Transport + ?Sized>(
    transport: &mut T,
    frame_id: u8,
    at: [u8; 2],
    params: &[u8],
) -> Result<(), Error> {
    send_frame_parts(
        transport,
        &[&[api::AT_QUEUE_PARAMETER, frame_id, at[0], at[1]], params],
    )
}

/// Queries or sets an AT parameter on a remote module addressed by `addr`.
pub fn remote_at_command<T: Transport + ?Sized>(
    transport: &mut T,
    frame_id: u8,
    addr: Address,
    options: u8,
    at: [u8; 2],
    params: &[u8],
) -> Result<(), Error> {
    let addr64 = addr.as_addr64_bytes();
    let addr16 = addr.as_addr16_bytes();
    send_frame_parts(
        transport,
        &[
            &[api::REMOTE_AT_COMMAND, frame_id],
            &addr64,
            &addr16,
            &[options, at[0], at[1]],
            params,
        ],
    )
}

/// Transmits `data` to `addr`, using the 64-bit or 16-bit transmit frame
/// depending on which kind of address was given.
pub fn transmit<T: Transport + ?Sized>(
    transport: &mut T,
    frame_id: u8,
    addr: Address,
    options: u8,
    data: &[u8],
) -> Result<(), Error> {
    match addr {
        Address::Addr64(_) | Address::Addr64Broadcast => {
            let addr64 = addr.as_addr64_bytes();
            send_frame_parts(
                transport,
                &[&[api::TRANSMIT_64, frame_id], &addr64, &[options], data],
            )
        }
        Address::Addr16(_) | Address::Addr16Broadcast => {
            let addr16 = addr.as_addr16_bytes();
            send_frame_parts(
                transport,
                &[&[api::TRANSMIT_16, frame_id], &addr16, &[options], data],
            )
        }
    }
}
