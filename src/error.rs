//! Error types for the XBee driver core.
//!
//! The crate surfaces a `thiserror`-derived [`Error`] as its primary API, but
//! also preserves the module's historical dense negative-integer error-code
//! numbering via [`Error::code`] for callers that log or match against it.

/// Which step of [`crate::init::initialize`] failed.
///
/// Discriminants match the `-1..-10` error-code range from the wire
/// protocol's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// The `"+++"` escape sequence was not acknowledged with `"OK\r"`.
    NoOk = 1,
    /// Write of the `ATAP 2\r...` configuration line failed.
    ConfigWrite = 2,
    /// Did not see the `"OK\r"` acknowledging `ATAP 2`.
    BadApSetAck = 3,
    /// Did not see the `"OK\r"` acknowledging `ATD7 1`.
    BadD7SetAck = 4,
    /// Did not see the `"OK\r"` acknowledging `ATD6 1`.
    BadD6SetAck = 5,
    /// Did not see the `"OK\r"` acknowledging `ATCN`.
    BadCnAck = 6,
    /// The `AP` query's AT response did not echo back `0x02`.
    ApResponseMismatch = 7,
    /// The `D7` query's AT response did not echo back `0x01`.
    D7ResponseMismatch = 8,
    /// The `D6` query's AT response did not echo back `0x01`.
    D6ResponseMismatch = 9,
    /// An AT response's frame id or AT command did not match the query sent.
    FrameIdMismatch = 10,
}

/// Errors produced by the XBee driver core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport wrote fewer bytes than requested.
    #[error("transport write failed: wrote {written} of {requested} bytes")]
    ShortWrite { written: usize, requested: usize },

    /// The transport reported an I/O failure.
    #[error("transport io error: {0}")]
    Io(String),

    /// Initialization failed at a specific, named stage.
    #[error("initializer failed at stage {stage:?}")]
    Init { stage: InitStage },

    /// A decoded payload had the wrong length for its API id.
    #[error("wrong payload length for api 0x{api:02x}: got {got}, need at least {want}")]
    WrongLengthForApi { api: u8, got: usize, want: usize },

    /// A decoded payload's leading byte did not match a known API id.
    #[error("unknown api id 0x{0:02x}")]
    UnknownApiId(u8),
}

impl Error {
    /// The stable, dense negative-integer code for this error, matching the
    /// wire protocol's historical error-code space.
    pub fn code(&self) -> i32 {
        match self {
            Error::Init { stage } => -(*stage as i32),
            Error::ShortWrite { .. } => -11,
            Error::Io(_) => -12,
            Error::WrongLengthForApi { .. } => -20,
            Error::UnknownApiId(_) => -21,
        }
    }
}
