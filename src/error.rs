use thiserror::Error;

/// Errors surfaced at the crate boundary.
///
/// Decode failures that corrupt the read cursor (truncated header, bad
/// flowset length, bad template) fail the whole packet with `Malformed`.
/// Accessors report `InvalidArgument` for out-of-range indices and
/// `NotFound` for data that is absent from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The packet does not conform to the NetFlow v9 wire format.
    #[error("malformed NetFlow v9 packet")]
    Malformed,

    /// The caller supplied an out-of-range index or an otherwise
    /// unusable argument.
    #[error("invalid argument")]
    InvalidArgument,

    /// The requested field, option or sampling rate does not exist in
    /// the current state.
    #[error("not found")]
    NotFound,

    /// The memory ceiling was reached and expiry freed nothing.
    #[error("memory limit reached")]
    OutOfMemory,

    /// A template was located but had aged past its expiry time.
    #[error("template expired")]
    Outdated,
}
