//! # Pool de Workers
//! src/server/worker.rs
//!
//! Número fijo de hilos (`worker-0`, `worker-1`, ...) que sacan conexiones
//! de la cola y atienden una petición por conexión:
//!
//! 1. Deadline total de lectura y deadline de escritura en el socket
//! 2. Framing (si falla: se cierra sin responder)
//! 3. Parsing (si falla: `400 Bad Request`)
//! 4. Dispatch (un panic en un handler se convierte en `500`)
//! 5. Escritura de la respuesta y cierre
//!
//! Ningún error de una conexión termina el worker.

use super::queue::ConnectionQueue;
use crate::config::Config;
use crate::http::{Method, Request, RequestFramer, Response, StatusCode};
use crate::router::{App, Reply, Router};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Parámetros de cada conexión
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub request_buffer: usize,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
            request_buffer: config.request_buffer,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Pool de workers de tamaño fijo
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `size` workers que consumen `queue` hasta que `pop` devuelve `None`.
    ///
    /// `handler` se llama una vez por elemento; si entra en pánico el
    /// worker lo registra y sigue con el próximo.
    pub fn spawn<C, H>(size: usize, queue: Arc<ConnectionQueue<C>>, handler: H) -> io::Result<Self>
    where
        C: Send + 'static,
        H: Fn(C) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let mut handles = Vec::with_capacity(size);

        for id in 0..size {
            let queue = Arc::clone(&queue);
            let handler = Arc::clone(&handler);

            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    tracing::debug!("worker started");
                    while let Some(conn) = queue.pop() {
                        if panic::catch_unwind(AssertUnwindSafe(|| handler(conn))).is_err() {
                            tracing::error!("connection handler panicked");
                        }
                    }
                    tracing::debug!("worker finished");
                })?;

            handles.push(handle);
        }

        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Espera a los workers hasta `timeout`. Retorna cuántos no terminaron a tiempo.
    pub fn join(self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut pending = self.handles;

        loop {
            let (finished, still_running): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|h| h.is_finished());

            for handle in finished {
                if handle.join().is_err() {
                    tracing::error!("worker thread panicked");
                }
            }

            pending = still_running;
            if pending.is_empty() {
                return 0;
            }
            if Instant::now() >= deadline {
                let names: Vec<_> = pending
                    .iter()
                    .map(|h| h.thread().name().unwrap_or("?").to_string())
                    .collect();
                tracing::warn!(stragglers = ?names, "workers did not finish before the shutdown deadline");
                return pending.len();
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Socket cuya lectura tiene un deadline total, no por cada `read`.
///
/// Antes de cada lectura el timeout del socket se achica a lo que queda,
/// así un cliente que manda de a un byte no retiene al worker.
struct DeadlineStream {
    stream: TcpStream,
    deadline: Instant,
}

impl DeadlineStream {
    fn new(stream: TcpStream, read_timeout: Duration) -> Self {
        Self {
            stream,
            deadline: Instant::now() + read_timeout,
        }
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "request read deadline elapsed"));
        }
        self.stream.set_read_timeout(Some(remaining))?;
        self.stream.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Atiende una conexión aceptada. El socket se cierra al salir.
pub fn handle_connection(stream: TcpStream, router: &Router, app: &App, settings: &ConnectionSettings) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if let Err(e) = stream.set_write_timeout(Some(settings.write_timeout)) {
        tracing::warn!(peer = %peer, error = %e, "failed to set socket deadlines");
        return;
    }

    let mut conn = DeadlineStream::new(stream, settings.read_timeout);
    serve(&mut conn, router, app, settings.request_buffer, &peer);
}

/// Lee, despacha y responde una petición sobre `conn`
pub fn serve<S: Read + Write>(conn: &mut S, router: &Router, app: &App, request_buffer: usize, peer: &str) {
    let started = Instant::now();

    let framed = match RequestFramer::new(request_buffer).frame(conn) {
        Ok(framed) => framed,
        Err(e) => {
            tracing::debug!(peer, error = %e, "dropping connection without response");
            return;
        }
    };

    let request = match Request::parse(framed.as_bytes()) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(peer, error = %e, "malformed request");
            let response = Response::text(StatusCode::BadRequest, "Bad Request");
            if let Err(e) = response.write_to(conn, false) {
                tracing::debug!(peer, error = %e, "failed to send 400");
            }
            return;
        }
    };

    if !framed.body_complete() {
        tracing::debug!(peer, path = request.path(), "request body incomplete");
    }

    let head_only = request.method() == Method::HEAD;

    let reply = panic::catch_unwind(AssertUnwindSafe(|| router.route(&request, app))).unwrap_or_else(|_| {
        tracing::error!(peer, path = request.path(), "handler panicked");
        Reply::Full(Response::text(StatusCode::InternalServerError, "Internal Server Error"))
    });

    let status = reply.status();
    match reply.write_to(conn, head_only) {
        Ok(sent) => tracing::info!(
            peer,
            method = request.method().as_str(),
            path = request.path(),
            status = status.as_u16(),
            bytes = sent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request served"
        ),
        Err(e) => tracing::debug!(
            peer,
            path = request.path(),
            error = %e,
            "client went away while sending response"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::router::{Access, Context, PathPattern};
    use crate::store::MemoryStore;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Conexión falsa: lee de `input` y escribe en `output`
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Duplex {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
            }
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn hello(_req: &Request, _ctx: &Context) -> Result<crate::router::Reply, AppError> {
        Ok(Response::text(StatusCode::Ok, "hello").into())
    }

    fn boom(_req: &Request, _ctx: &Context) -> Result<crate::router::Reply, AppError> {
        panic!("handler bug");
    }

    fn fixture() -> (Router, App) {
        let mut router = Router::new(hello);
        router
            .get(PathPattern::Exact("/hello"), Access::Public, hello)
            .get(PathPattern::Exact("/boom"), Access::Public, boom);
        let app = App {
            store: Arc::new(MemoryStore::in_memory()),
            static_dir: PathBuf::from("static"),
            video_dir: PathBuf::from("videos"),
        };
        (router, app)
    }

    #[test]
    fn test_serve_ok() {
        let (router, app) = fixture();
        let mut conn = Duplex::new(b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n");
        serve(&mut conn, &router, &app, 8192, "test");

        let out = conn.output();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.ends_with("hello"));
    }

    #[test]
    fn test_serve_head_has_no_body() {
        let (router, app) = fixture();
        let mut conn = Duplex::new(b"HEAD /hello HTTP/1.1\r\n\r\n");
        serve(&mut conn, &router, &app, 8192, "test");

        let out = conn.output();
        assert!(out.contains("Content-Length: 5\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_malformed_request_gets_400() {
        let (router, app) = fixture();
        let mut conn = Duplex::new(b"\x00\x01garbage\r\n\r\n");
        serve(&mut conn, &router, &app, 8192, "test");

        let out = conn.output();
        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn test_incomplete_request_gets_no_response() {
        let (router, app) = fixture();
        let mut conn = Duplex::new(b"GET /hello HTTP/1.1\r\nHost:");
        serve(&mut conn, &router, &app, 8192, "test");
        assert!(conn.output.is_empty());
    }

    #[test]
    fn test_oversized_request_gets_no_response() {
        let (router, app) = fixture();
        let mut raw = b"GET /hello HTTP/1.1\r\nX-Pad: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(20_000));
        let mut conn = Duplex::new(&raw);
        serve(&mut conn, &router, &app, 8192, "test");
        assert!(conn.output.is_empty());
    }

    #[test]
    fn test_panicking_handler_becomes_500() {
        let (router, app) = fixture();
        let mut conn = Duplex::new(b"GET /boom HTTP/1.1\r\n\r\n");
        serve(&mut conn, &router, &app, 8192, "test");
        assert!(conn.output().starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[test]
    fn test_read_deadline_covers_whole_request() {
        use crate::http::{FrameError, RequestFramer};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        // Un byte cada 100 ms: ninguna lectura individual vence
        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            for byte in b"GET /slow HTTP/1.1\r\nX-Pad: aaaaaaaaaaaaaaaa".iter() {
                if stream.write_all(&[*byte]).is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(100));
            }
        });

        let (stream, _) = listener.accept().unwrap();
        let mut conn = DeadlineStream::new(stream, Duration::from_millis(400));

        let started = Instant::now();
        let result = RequestFramer::default().frame(&mut conn);
        assert!(matches!(result, Err(FrameError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_millis(1500));

        drop(conn);
        client.join().unwrap();
    }

    #[test]
    fn test_pool_processes_every_item_and_survives_panics() {
        let running = Arc::new(AtomicBool::new(true));
        let queue = Arc::new(ConnectionQueue::with_poll_interval(
            4,
            Arc::clone(&running),
            Duration::from_millis(50),
        ));
        let processed = Arc::new(AtomicUsize::new(0));

        let pool = {
            let processed = Arc::clone(&processed);
            WorkerPool::spawn(3, Arc::clone(&queue), move |n: u32| {
                if n % 5 == 0 {
                    panic!("bad item");
                }
                processed.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        };
        assert_eq!(pool.size(), 3);

        for n in 1..=20u32 {
            queue.push(n).unwrap();
        }
        queue.shutdown();

        assert_eq!(pool.join(Duration::from_secs(5)), 0);
        assert_eq!(processed.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_join_reports_stragglers() {
        let running = Arc::new(AtomicBool::new(true));
        let queue = Arc::new(ConnectionQueue::with_poll_interval(
            1,
            Arc::clone(&running),
            Duration::from_millis(50),
        ));

        let pool = WorkerPool::spawn(1, Arc::clone(&queue), |_: ()| {
            thread::sleep(Duration::from_millis(800));
        })
        .unwrap();

        queue.push(()).unwrap();
        thread::sleep(Duration::from_millis(100));
        queue.shutdown();

        assert_eq!(pool.join(Duration::from_millis(100)), 1);
    }
}
