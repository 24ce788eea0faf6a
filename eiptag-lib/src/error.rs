use thiserror::Error;

/// Errors that can occur while talking to a PLC
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid tag address: {0}")]
    InvalidAddress(String),

    #[error("operation timed out")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("connect failed: {0}")]
    ConnectFailed(std::io::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encapsulation status 0x{0:08X}")]
    Encapsulation(u32),

    #[error("read failed, CIP status 0x{0:02X}")]
    ReadFailed(u8),

    #[error("write failed, CIP status 0x{0:02X}")]
    WriteFailed(u8),

    #[error("truncated response: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("unsupported reply service 0x{0:02X}")]
    UnsupportedService(u8),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// True for the encapsulation status codes that mean the request was too
    /// large or the session handle went stale. Observed on hardware as 3 and
    /// 101; widen only against the vendor documentation.
    pub fn is_oversize(&self) -> bool {
        matches!(
            self,
            ClientError::Encapsulation(3) | ClientError::Encapsulation(101)
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
