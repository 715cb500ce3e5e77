//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor OTT: argumentos CLI con variables de entorno
//! como respaldo.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./ott_server 8080 \
//!   --workers 8 \
//!   --queue-capacity 100 \
//!   --video-dir ./videos
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 VIDEO_DIR=/srv/videos ./ott_server
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Mínimo razonable para el buffer de petición
pub const MIN_REQUEST_BUFFER: usize = 1024;

/// Configuración del servidor OTT
#[derive(Debug, Clone, Parser)]
#[command(name = "ott_server")]
#[command(about = "Servidor de streaming de video sobre HTTP con pool de workers")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    // === Concurrencia ===

    /// Número de workers que atienden conexiones
    #[arg(long, default_value = "8", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar un worker
    #[arg(long = "queue-capacity", default_value = "100", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Timeouts ===

    /// Deadline de lectura de la petición en milisegundos
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Deadline de escritura por operación en milisegundos
    #[arg(long = "write-timeout-ms", default_value = "30000", env = "WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    /// Tamaño máximo de una petición (cabeceras + body) en bytes
    #[arg(long = "request-buffer", default_value = "8192", env = "REQUEST_BUFFER")]
    pub request_buffer: usize,

    // === Directorios ===

    /// Directorio con los archivos `.mp4`
    #[arg(long = "video-dir", default_value = "videos", env = "VIDEO_DIR")]
    pub video_dir: PathBuf,

    /// Raíz de los archivos estáticos (HTML, CSS, JS, miniaturas)
    #[arg(long = "static-dir", default_value = "static", env = "STATIC_DIR")]
    pub static_dir: PathBuf,

    /// Directorio del snapshot del store
    #[arg(long = "data-dir", default_value = "data", env = "DATA_DIR")]
    pub data_dir: PathBuf,

    // === Sesiones y logs ===

    /// Duración de una sesión en segundos
    #[arg(long = "session-ttl-secs", default_value = "3600", env = "SESSION_TTL_SECS")]
    pub session_ttl_secs: u64,

    /// Nivel de log si `RUST_LOG` no está definido
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Parsea argumentos CLI (y variables de entorno)
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use ott_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Las miniaturas viven dentro de los estáticos para servirse tal cual
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.static_dir.join("thumbnails")
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be > 0".to_string());
        }
        if self.write_timeout_ms == 0 {
            return Err("Write timeout must be > 0".to_string());
        }
        if self.request_buffer < MIN_REQUEST_BUFFER {
            return Err(format!("Request buffer must be >= {} bytes", MIN_REQUEST_BUFFER));
        }
        if self.session_ttl_secs == 0 {
            return Err("Session TTL must be > 0".to_string());
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              OTT Streaming Server Configuration              ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Read timeout: {} ms", self.read_timeout_ms);
        println!("   Write timeout:{} ms", self.write_timeout_ms);
        println!("   Max request:  {} bytes", self.request_buffer);
        println!();
        println!("👷 Workers:");
        println!("   Workers:      {}", self.workers);
        println!("   Queue cap:    {}", self.queue_capacity);
        println!();
        println!("📁 Directories:");
        println!("   Videos:       {}", self.video_dir.display());
        println!("   Static:       {}", self.static_dir.display());
        println!("   Thumbnails:   {}", self.thumbnail_dir().display());
        println!("   Store:        {}", self.store_path().display());
        println!();
        println!("🔑 Sessions:     {} seconds ({:.1} hours)",
            self.session_ttl_secs,
            self.session_ttl_secs as f64 / 3600.0
        );
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Mismos valores que los defaults de la CLI
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            workers: 8,
            queue_capacity: 100,
            read_timeout_ms: 5_000,
            write_timeout_ms: 30_000,
            request_buffer: 8192,
            video_dir: PathBuf::from("videos"),
            static_dir: PathBuf::from("static"),
            data_dir: PathBuf::from("data"),
            session_ttl_secs: 3600,
            log_level: "info".to_string(),
        }
    }
}
