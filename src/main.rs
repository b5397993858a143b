//! # HTTP Dispatch - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: lee la configuración, inicializa el
//! logging, registra los handlers de ejemplo y bloquea en el accept loop.

use http_dispatch::commands;
use http_dispatch::config::Config;
use http_dispatch::logging;
use http_dispatch::server::Server;
use tracing::{error, info};

fn main() {
    let config = Config::new();
    logging::init(&config.log_level);

    if let Err(e) = config.validate() {
        error!(error = %e, "configuración inválida");
        std::process::exit(2);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.address(),
        "iniciando http_dispatch"
    );

    let mut server = Server::from_config(&config, commands::default_registry());

    if let Err(e) = server.start() {
        error!(error = %e, "error fatal al iniciar");
        std::process::exit(1);
    }

    // El accept loop corre en su propio thread; acá solo esperamos
    if let Err(e) = server.join() {
        error!(error = %e, "el accept loop terminó con error");
        std::process::exit(1);
    }
}
