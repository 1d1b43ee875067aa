use std::fmt::Display;

/// Reasons a received packet could not be turned into a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    TooShort { minimum: usize, actual: usize },
    LengthMismatch { declared: usize, actual: usize },
    Checksum { expected: u16, computed: u16 },
}

impl Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::TooShort { minimum, actual } => write!(
                f,
                "Packet less than {} bytes ({} bytes received)",
                minimum, actual
            ),
            FrameError::LengthMismatch { declared, actual } => write!(
                f,
                "Specified packet length does not match actual packet length ({} != {})",
                declared, actual
            ),
            FrameError::Checksum { expected, computed } => write!(
                f,
                "Packet CRC {:#06X} does not match computed CRC {:#06X}",
                expected, computed
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// Errors raised while starting or controlling a server
#[derive(Debug)]
pub enum Error {
    Bind {
        address: String,
        source: std::io::Error,
    },
    Address(String),
    Serial(String),
    Lock(String),
    DispatcherStopped,
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Bind { address, source } => {
                write!(f, "Failed to bind to address {}. [{}]", address, source)
            }
            Error::Address(address) => write!(f, "Invalid address specified: {}", address),
            Error::Serial(e) => write!(f, "Serial port error: {}", e),
            Error::Lock(e) => write!(f, "Failed to lock function table: {}", e),
            Error::DispatcherStopped => write!(f, "Request dispatcher is not running"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Bind { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tokio_serial::Error> for Error {
    fn from(e: tokio_serial::Error) -> Self {
        Error::Serial(e.to_string())
    }
}
