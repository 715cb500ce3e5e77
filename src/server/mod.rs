//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! 1. `tcp`: socket de escucha y hilo acceptor
//! 2. `queue`: cola acotada acceptor → workers
//! 3. `worker`: pool de workers y atención de cada conexión

pub mod queue;
pub mod tcp;
pub mod worker;

// Re-exportar para facilitar el uso
pub use queue::ConnectionQueue;
pub use tcp::Server;
pub use worker::{ConnectionSettings, WorkerPool};
