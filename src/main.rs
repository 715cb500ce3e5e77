//! # OTT Server - Entry Point
//! src/main.rs
//!
//! Arma la configuración, el store y el catálogo, y corre el servidor
//! hasta recibir SIGINT/SIGTERM.

use ott_server::config::Config;
use ott_server::logging::init_tracing;
use ott_server::media::{scan_videos, FfmpegProbe};
use ott_server::router::App;
use ott_server::server::Server;
use ott_server::store::{MemoryStore, Store};
use std::fs;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let config = Config::new();
    init_tracing(&config.log_level);

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuración inválida: {}", e);
        process::exit(1);
    }
    config.print_summary();

    for dir in [config.data_dir.clone(), config.thumbnail_dir()] {
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot create directory");
        }
    }

    let store = match MemoryStore::open(config.store_path()) {
        Ok(store) => store.with_session_ttl(Duration::from_secs(config.session_ttl_secs)),
        Err(e) => {
            tracing::error!(path = %config.store_path().display(), error = %e, "cannot open store");
            process::exit(1);
        }
    };
    let store: Arc<dyn Store> = Arc::new(store);

    match scan_videos(&config.video_dir, &config.thumbnail_dir(), store.as_ref(), &FfmpegProbe::new()) {
        Ok(added) => tracing::info!(added, total = store.count_videos().unwrap_or(0), "video catalog ready"),
        Err(e) => tracing::warn!(error = %e, "video scan failed"),
    }

    let app = App {
        store: Arc::clone(&store),
        static_dir: config.static_dir.clone(),
        video_dir: config.video_dir.clone(),
    };

    let server = match Server::bind(config, app) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "💥 cannot start server");
            process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::info!("signal received, shutting down");
            running.store(false, Ordering::SeqCst);
        }) {
            tracing::warn!(error = %e, "cannot install signal handler");
        }
    }

    if let Err(e) = server.run(running) {
        tracing::error!(error = %e, "server stopped with error");
        process::exit(1);
    }

    if let Err(e) = store.flush() {
        tracing::warn!(error = %e, "final store flush failed");
    }
    tracing::info!("bye");
}
