//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber` con un filtro por entorno.
//! `RUST_LOG` tiene prioridad sobre el nivel pasado por CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala el subscriber global
///
/// Llamarla más de una vez no falla (útil en tests): solo el primer
/// subscriber queda instalado.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("webserver={level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init();
}
