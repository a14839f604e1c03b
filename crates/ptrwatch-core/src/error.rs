use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("short read at address {address:#x}: requested {requested} bytes, got {available}")]
    ShortRead {
        address: u64,
        requested: usize,
        available: usize,
    },

    #[error("zero-length read at address {address:#x}")]
    EmptyRead { address: u64 },

    #[error("address out of range after shift: {0:#x}")]
    AddressOutOfRange(i64),

    #[error("invalid resolver settings: {0}")]
    InvalidSettings(String),

    #[error("invalid end pattern: {0}")]
    InvalidPattern(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check whether this is a short read, as opposed to a hard I/O failure.
    /// Short reads near the end of a memory image are sometimes recoverable
    /// by the caller; hard failures never are.
    pub fn is_short_read(&self) -> bool {
        matches!(self, Error::ShortRead { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_read_detection() {
        let err = Error::ShortRead {
            address: 0x100,
            requested: 4,
            available: 1,
        };
        assert!(err.is_short_read());

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::Io(io_err).is_short_read());
    }

    #[test]
    fn test_short_read_message_names_address() {
        let err = Error::ShortRead {
            address: 0x1234,
            requested: 2,
            available: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x1234"));
        assert!(msg.contains("requested 2"));
    }
}
