//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Hilo `acceptor` + cola acotada + pool de workers.
//!
//! ```text
//! accept() → ConnectionQueue (N slots) → worker-0..worker-M → respuesta
//! ```
//!
//! El acceptor usa un listener no bloqueante y revisa la bandera de
//! ejecución cada `ACCEPT_POLL_INTERVAL`. La única forma de control de
//! admisión es la cola: con la cola llena, el acceptor se bloquea.
//!
//! Al apagar: se deja de aceptar, se despierta a los workers y se espera
//! a que terminen (como mucho `SHUTDOWN_GRACE`).

use super::queue::ConnectionQueue;
use super::worker::{handle_connection, ConnectionSettings, WorkerPool};
use crate::config::Config;
use crate::error::ServerError;
use crate::handlers;
use crate::router::{App, Router};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cada cuánto el acceptor revisa la bandera cuando no hay conexiones
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tiempo máximo de espera por los workers al apagar
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Servidor HTTP con pool de workers
pub struct Server {
    config: Config,
    listener: TcpListener,
    router: Arc<Router>,
    app: Arc<App>,
}

impl Server {
    /// Abre el socket de escucha. Es el único error fatal del servidor.
    pub fn bind(config: Config, app: App) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        Ok(Self {
            config,
            listener,
            router: Arc::new(handlers::routes()),
            app: Arc::new(app),
        })
    }

    /// Dirección real de escucha (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Atiende conexiones hasta que `running` pase a `false`.
    ///
    /// Retorna cuando el acceptor terminó y los workers fueron esperados.
    pub fn run(self, running: Arc<AtomicBool>) -> Result<(), ServerError> {
        self.listener.set_nonblocking(true)?;

        let queue = Arc::new(ConnectionQueue::new(self.config.queue_capacity, Arc::clone(&running)));

        let settings = ConnectionSettings::from_config(&self.config);
        let pool = {
            let router = Arc::clone(&self.router);
            let app = Arc::clone(&self.app);
            WorkerPool::spawn(self.config.workers, Arc::clone(&queue), move |stream: TcpStream| {
                handle_connection(stream, &router, &app, &settings)
            })?
        };

        tracing::info!(
            addr = %self.local_addr()?,
            workers = pool.size(),
            queue_capacity = queue.capacity(),
            "server listening"
        );

        let acceptor = {
            let listener = self.listener;
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("acceptor".to_string())
                .spawn(move || accept_loop(&listener, &queue, &running))?
        };

        if acceptor.join().is_err() {
            tracing::error!("acceptor thread panicked");
        }

        tracing::info!(pending = queue.len(), "shutting down, waiting for workers");
        queue.shutdown();

        let stragglers = pool.join(SHUTDOWN_GRACE);
        if stragglers == 0 {
            tracing::info!("all workers finished");
        }

        Ok(())
    }
}

fn accept_loop(listener: &TcpListener, queue: &ConnectionQueue<TcpStream>, running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                // El socket aceptado hereda el modo no bloqueante
                if let Err(e) = stream.set_nonblocking(false) {
                    tracing::warn!(peer = %peer, error = %e, "failed to configure accepted socket");
                    continue;
                }
                tracing::debug!(peer = %peer, queued = queue.len(), "connection accepted");

                if queue.push(stream).is_err() {
                    tracing::debug!(peer = %peer, "shutdown in progress, connection dropped");
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }

    tracing::info!("acceptor stopped");
}
