//! XBee API frame id constants (the first payload byte of every frame).
//!
//! Modeled as plain consts rather than an enum: unknown ids are a runtime
//! [`crate::error::Error::UnknownApiId`], not a type-level impossibility.

// Outgoing (host -> module)
pub const AT_COMMAND: u8 = 0x08;
pub const AT_QUEUE_PARAMETER: u8 = 0x09;
pub const TRANSMIT_64: u8 = 0x00;
pub const TRANSMIT_16: u8 = 0x01;
pub const REMOTE_AT_COMMAND: u8 = 0x17;

// Incoming (module -> host)
pub const MODEM_STATUS: u8 = 0x8A;
pub const TRANSMIT_STATUS: u8 = 0x89;
pub const AT_RESPONSE: u8 = 0x88;
pub const REMOTE_AT_RESPONSE: u8 = 0x97;
pub const RECEIVE_64: u8 = 0x80;
pub const RECEIVE_16: u8 = 0x81;
