pub(crate) mod server;

use crate::Error;

use clap::Args;
use serde::{Deserialize, Serialize};
use tokio_serial::{DataBits, Parity, SerialPortBuilder, SerialStream, StopBits};

#[derive(Serialize, Deserialize, Clone, Debug, Default, Args)]
pub struct Config {
    /// The device path to use for communication.
    pub path: String,

    /// The baud rate to use for the serial connection.
    #[arg(short, long, default_value_t = 115200)]
    pub baud_rate: u32,

    /// The parity bit [values: even, odd, none]
    #[arg(short, long)]
    pub parity: Option<String>,

    /// The data bits [values: 5, 6, 7, 8]
    #[arg(short, long)]
    pub data_bits: Option<u8>,

    /// The stop bits [values: 1, 2]
    #[arg(short, long)]
    pub stop_bits: Option<u8>,
}

impl Config {
    /// Translate the configuration into a port builder without touching the device
    pub fn builder(&self) -> Result<SerialPortBuilder, Error> {
        let mut builder = tokio_serial::new(&self.path, self.baud_rate);
        if let Some(v) = self.data_bits {
            builder = builder.data_bits(match v {
                5 => DataBits::Five,
                6 => DataBits::Six,
                7 => DataBits::Seven,
                8 => DataBits::Eight,
                _ => return Err(Error::Serial(format!("Invalid data bits specified: {}", v))),
            });
        }
        if let Some(v) = self.stop_bits {
            builder = builder.stop_bits(match v {
                1 => StopBits::One,
                2 => StopBits::Two,
                _ => return Err(Error::Serial(format!("Invalid stop bits specified: {}", v))),
            });
        }
        if let Some(ref v) = self.parity {
            builder = builder.parity(match v.to_lowercase().as_str() {
                "odd" => Parity::Odd,
                "even" => Parity::Even,
                "none" => Parity::None,
                _ => return Err(Error::Serial(format!("Invalid parity specified: {}", v))),
            });
        }
        Ok(builder)
    }

    pub fn open(&self) -> Result<SerialStream, Error> {
        let builder = self.builder()?;
        Ok(SerialStream::open(&builder)?)
    }
}
