//! # Tipos del Catálogo
//! src/store/types.rs
//!
//! Usuarios, videos, sesiones e historial de reproducción.

use serde::{Deserialize, Serialize};

/// Usuario registrado
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,

    /// SHA-256 de `salt + password`, en hex
    pub password_hash: String,

    pub salt: String,
}

/// Video del catálogo. `filename` es relativo al directorio de videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: u32,
    pub title: String,
    pub filename: String,

    /// Ruta pública de la miniatura (ej: `thumbnails/intro.jpg`)
    pub thumbnail: String,

    /// Duración en segundos (0 si no se conoce)
    pub duration_secs: u64,

    #[serde(default)]
    pub description: String,
}

/// Datos para registrar un video
#[derive(Debug, Clone, Default)]
pub struct NewVideo {
    pub title: String,
    pub filename: String,
    pub thumbnail: String,
    pub duration_secs: u64,
    pub description: String,
}

/// Sesión autenticada. Vive solo en memoria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 64 caracteres alfanuméricos
    pub token: String,
    pub user_id: u32,

    /// Segundos UNIX
    pub expires_at: u64,
}

/// Última posición vista de un video por un usuario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchHistory {
    pub user_id: u32,
    pub video_id: u32,
    pub last_pos_secs: u64,

    /// Segundos UNIX
    pub updated_at: u64,
}
