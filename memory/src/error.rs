use crate::Range;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    OutOfBounds(Range),
    LengthMismatch { expected: usize, actual: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OutOfBounds(range) => write!(f, "Range {} exceeds the memory bank", range),
            Error::LengthMismatch { expected, actual } => write!(
                f,
                "Range too large/small for given value slice ({} != {})",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for Error {}
