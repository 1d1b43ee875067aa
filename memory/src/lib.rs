mod bank;
mod config;
mod error;
mod memory;
mod range;

pub use bank::{BANK_SIZE, Bank};
pub use config::{Config, Preset};
pub use error::Error;
pub use memory::Memory;
pub use range::Range;
