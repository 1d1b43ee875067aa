use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Half-open address range `[start, end)`
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl Range {
    /// Create a range of `size` slots, the end saturates at `usize::MAX`
    pub fn new(start: usize, size: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(size),
        }
    }

    pub fn length(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the range lies completely inside `[0, size)`
    pub fn fits(&self, size: usize) -> bool {
        self.start <= self.end && self.end <= size
    }
}
