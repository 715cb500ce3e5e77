//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber` con salida `fmt`. La variable `RUST_LOG`
//! tiene prioridad sobre el nivel pasado por línea de comandos.
//!
//! Cada línea muestra el nombre del hilo (`acceptor`, `worker-3`, ...), lo
//! que permite seguir una conexión desde que se acepta hasta que se cierra.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala el subscriber global.
///
/// Si ya había uno instalado (por ejemplo, en tests) no hace nada.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_names(true)
                .with_target(false),
        )
        .try_init();
}
