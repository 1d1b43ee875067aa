use memory::Config as MemoryConfig;

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Initial values of the memory banks
    pub memory: MemoryConfig,

    /// Built-in function codes answered with an illegal function exception
    pub disabled_functions: Vec<u8>,
}

impl Config {
    /// Read configuration from file, JSON is tried first and TOML second
    pub fn read(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        if let Ok(c) = serde_json::from_reader(reader) {
            Ok(c)
        } else {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| e.into())
        }
    }
}
