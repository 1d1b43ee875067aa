use crate::range::Range;
use serde::{Deserialize, Serialize};

/// Initial values of a contiguous block of one bank
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub start: usize,
    pub values: Vec<u16>,
}

impl Preset {
    pub fn new(start: usize, values: Vec<u16>) -> Self {
        Self { start, values }
    }

    pub fn range(&self) -> Range {
        Range::new(self.start, self.values.len())
    }
}

/// Presets applied to a fresh memory. Bit banks treat any non-zero value as set.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub coils: Vec<Preset>,
    pub discrete_inputs: Vec<Preset>,
    pub holding_registers: Vec<Preset>,
    pub input_registers: Vec<Preset>,
}
