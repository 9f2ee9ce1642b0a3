use std::path::Path;

use tracing::{error, info};

use tcpchat::config::{port_from_args, USAGE};
use tcpchat::{ChatServer, Config};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let port_override = match port_from_args(&args) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    // Load configuration; a missing config.toml just means defaults.
    let mut config = if Path::new("config.toml").exists() {
        match Config::load("config.toml") {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config.toml: {e}");
                eprintln!("Using default configuration.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(port) = port_override {
        config.server.port = port;
    }

    // Initialize logging
    if let Err(e) = tcpchat::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        tcpchat::logging::init_console_only(&config.logging.level);
    }

    info!("tcpchat - multi-user TCP chat server");
    info!(
        "Server configured on {}:{} (max {} users)",
        config.server.host, config.server.port, config.server.max_users
    );

    let server = match ChatServer::bind(&config.server).await {
        Ok(server) => server,
        Err(e) => {
            error!(
                "Failed to bind {}:{}: {}",
                config.server.host, config.server.port, e
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server terminated: {e}");
        std::process::exit(1);
    }
}
