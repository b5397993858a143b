//! # Logging
//! src/logging.rs
//!
//! Inicialización de `tracing-subscriber`. `RUST_LOG` tiene prioridad; si no
//! está definida se usa el nivel de la configuración.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global
///
/// Llamarla más de una vez no falla: la segunda instalación se ignora.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_ascii_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init();
}

/// Subscriber para tests: nivel DEBUG y salida capturada por el harness
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(true)
        .with_thread_names(true)
        .with_test_writer()
        .try_init();
}
