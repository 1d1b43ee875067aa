pub(crate) mod server;

use crate::Error;
use util::str;

use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Serialize, Deserialize, Clone, Debug, Args)]
pub struct Config {
    /// The interface to use for the service.
    #[arg(short, long, default_value_t = String::from("127.0.0.1"))]
    pub ip: String,

    /// The port to use for the service.
    #[arg(short, long, default_value_t = 502)]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: str!("127.0.0.1"),
            port: 502,
        }
    }
}

impl Config {
    pub fn address(&self) -> Result<SocketAddr, Error> {
        let address = format!("{}:{}", self.ip, self.port);
        address.parse().map_err(|_| Error::Address(address))
    }
}
