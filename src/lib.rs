//! # OTT Server
//! src/lib.rs
//!
//! Servidor HTTP de streaming de video: autentica usuarios, lista un
//! catálogo y entrega los archivos con soporte de `Range`, guardando la
//! posición de reproducción de cada usuario.
//!
//! ## Arquitectura
//!
//! - `http`: framing y parsing de peticiones, construcción de respuestas
//! - `server`: acceptor, cola acotada de conexiones y pool de workers
//! - `streaming`: ventana de bytes de un `Range` y copia en bloques
//! - `router`: tabla de rutas y sesión por cookie
//! - `handlers`: páginas, login/registro, video y API JSON
//! - `store`: usuarios, sesiones, catálogo e historial
//! - `media`: duración y miniaturas vía ffmpeg
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use ott_server::config::Config;
//! use ott_server::router::App;
//! use ott_server::server::Server;
//! use ott_server::store::MemoryStore;
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let app = App {
//!     store: Arc::new(MemoryStore::in_memory()),
//!     static_dir: config.static_dir.clone(),
//!     video_dir: config.video_dir.clone(),
//! };
//! let server = Server::bind(config, app).unwrap();
//! server.run(Arc::new(AtomicBool::new(true))).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod logging;
pub mod media;
pub mod router;
pub mod server;
pub mod store;
pub mod streaming;
