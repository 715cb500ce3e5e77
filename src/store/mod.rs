//! # Persistencia
//! src/store/mod.rs
//!
//! El trait `Store` es la única puerta a usuarios, sesiones, videos e
//! historial. Cada método puede llamarse desde cualquier worker; la
//! implementación serializa internamente y ninguna operación abarca más
//! de una llamada.

pub mod memory;
pub mod types;

pub use memory::MemoryStore;
pub use types::{NewVideo, Session, User, Video, WatchHistory};

use sha2::{Digest, Sha256};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Un hilo entró en pánico con el lock tomado
    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Colaborador de persistencia, compartido por todos los workers como `Arc<dyn Store>`
pub trait Store: Send + Sync {
    fn find_user_by_name(&self, username: &str) -> StoreResult<Option<User>>;

    fn find_user_by_id(&self, id: u32) -> StoreResult<Option<User>>;

    /// Compara `password` contra el hash guardado
    fn verify_password(&self, user: &User, password: &str) -> bool {
        hash_password(&user.salt, password) == user.password_hash
    }

    /// Registra un usuario nuevo
    ///
    /// # Errores
    ///
    /// - `UserExists` si el nombre ya está tomado
    /// - `InvalidInput` si el nombre o la contraseña están vacíos
    fn create_user(&self, username: &str, password: &str) -> StoreResult<User>;

    fn create_session(&self, user_id: u32) -> StoreResult<Session>;

    /// Sesión vigente para `token` (las vencidas no se devuelven)
    fn find_session(&self, token: &str) -> StoreResult<Option<Session>>;

    fn destroy_session(&self, token: &str) -> StoreResult<()>;

    fn find_video(&self, id: u32) -> StoreResult<Option<Video>>;

    fn find_video_by_filename(&self, filename: &str) -> StoreResult<Option<Video>>;

    /// Todos los videos, ordenados por id
    fn list_videos(&self) -> StoreResult<Vec<Video>>;

    fn count_videos(&self) -> StoreResult<usize>;

    /// Registra un video; si el archivo ya estaba, actualiza sus datos
    fn add_video(&self, video: NewVideo) -> StoreResult<Video>;

    fn find_history(&self, user_id: u32, video_id: u32) -> StoreResult<Option<WatchHistory>>;

    fn upsert_history(&self, user_id: u32, video_id: u32, position_secs: u64) -> StoreResult<()>;

    /// Historial del usuario, el más reciente primero
    fn list_user_history(&self, user_id: u32, limit: usize) -> StoreResult<Vec<WatchHistory>>;

    /// Fuerza la escritura a disco
    fn flush(&self) -> StoreResult<()>;
}

/// SHA-256 de `salt + password` en hex
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("salt-a", "secret");
        let b = hash_password("salt-b", "secret");

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, hash_password("salt-a", "secret"));
    }
}
