use std::fmt;

/// Errors surfaced by ETag computation and verification.
/// Nothing is retried or swallowed internally; every failure reaches the caller.
#[derive(Debug)]
pub enum EtagError {
    /// Zero block size, or a reference tag that cannot be parsed.
    InvalidInput(String),
    Io(std::io::Error),
    /// A planned range ran out of file before it was fully read.
    /// Indicates a planning bug or the file being mutated concurrently.
    ShortRead { expected: u64, got: u64 },
    /// Failure surfaced from a parallel hashing worker.
    Worker(Box<EtagError>),
}

impl From<std::io::Error> for EtagError {
    fn from(e: std::io::Error) -> Self {
        EtagError::Io(e)
    }
}

impl fmt::Display for EtagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtagError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EtagError::Io(e) => write!(f, "io error: {e}"),
            EtagError::ShortRead { expected, got } => {
                write!(f, "short read: expected {expected} bytes, got {got}")
            }
            EtagError::Worker(e) => write!(f, "hash worker failed: {e}"),
        }
    }
}

impl std::error::Error for EtagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EtagError::Io(e) => Some(e),
            EtagError::Worker(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
