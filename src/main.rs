//! # Web Server - Entry Point
//! src/main.rs
//!
//! Lee la CLI, carga la configuración (generándola si falta) y deja el
//! servidor escuchando. Cualquier error de arranque termina con código 1.

use clap::Parser;
use tracing::{error, info};
use webserver::config::Cli;
use webserver::logging;
use webserver::server::Server;

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let config = cli.resolve();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!(
        port = config.port,
        root = %config.root_directory.display(),
        default_page = %config.default_page.display(),
        workers = config.max_workers,
        "Configuration"
    );

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Fatal error: {}", e);
            std::process::exit(1);
        }
    };

    // Bloquea el thread principal
    if let Err(e) = server.run() {
        error!("Fatal error: {}", e);
        server.shutdown();
        std::process::exit(1);
    }
}
