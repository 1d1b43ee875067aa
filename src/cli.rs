use net::rtu::Config as RtuConfig;
use net::tcp::Config as TcpConfig;

use clap::{Parser, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Serve Modbus TCP
    Tcp(TcpConfig),

    /// Serve Modbus RTU on a serial device
    Rtu(RtuConfig),
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct ArgParser {
    /// Path to the JSON or TOML configuration file providing the memory presets.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level (v: info, vv: debug, vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl ArgParser {
    /// Default filter directive for the given verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
