mod cli;
mod config;

use crate::cli::{ArgParser, Commands};
use crate::config::Config;

use clap::Parser;
use memory::Memory;
use net::ServerBuilder;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;
use util::Expect;

fn run() -> Result<(), anyhow::Error> {
    // Parse all arguments
    let args = ArgParser::parse();

    // RUST_LOG takes precedence over the verbosity flag
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    // Read configuration
    let config = if let Some(ref path) = args.config {
        Config::read(path)?
    } else {
        Config::default()
    };
    let memory = Memory::from_config(&config.memory)?;

    // Initialize tokio runtime for modbus server
    let runtime = Runtime::new().panic(|e| format!("Failed to create runtime. [{}]", e));

    runtime.block_on(async move {
        let mut builder = ServerBuilder::new()
            .memory(memory)
            .on_connection_accepted(|info| info!("Connection {} accepted", info))
            .on_connection_closed(|info| info!("Connection {} closed", info))
            .on_server_stopped(|info| info!("Listener tcp://{} stopped", info.local_addr));
        for code in config.disabled_functions.iter() {
            builder = builder.remove_function(*code);
        }
        let server = builder.build();

        match args.command {
            Commands::Tcp(ref tcp_config) => {
                server.listen_tcp(tcp_config.address()?).await?;
            }
            Commands::Rtu(ref rtu_config) => {
                server.listen_rtu(rtu_config).await?;
            }
        }

        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, shutting down");
        server.shutdown().await;
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> Result<(), anyhow::Error> {
    run()
}
