//! # Store en Memoria
//! src/store/memory.rs
//!
//! Implementación de `Store` con todo el estado detrás de un único `Mutex`.
//!
//! Usuarios, videos e historial se guardan en un snapshot JSON
//! (`data/store.json`) después de cada cambio y al llamar a `flush`. Las
//! sesiones no se persisten: un reinicio obliga a volver a iniciar sesión.
//!
//! El estado se serializa con el lock tomado y se escribe a disco después
//! de soltarlo; cada snapshot lleva una generación y uno viejo nunca pisa
//! a uno más nuevo. La escritura es atómica: un `.tmp` que luego se
//! renombra. Si falla, el cambio se revierte en memoria.

use super::{hash_password, NewVideo, Session, Store, StoreError, StoreResult, User, Video, WatchHistory};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Vida por defecto de una sesión
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Sesiones vivas como máximo; al superarlo se descarta la más próxima a vencer
pub const MAX_SESSIONS: usize = 100;

/// Largo de los tokens de sesión
pub const TOKEN_LEN: usize = 64;

const SALT_LEN: usize = 16;

/// Cuentas creadas en el primer arranque
const SEED_USERS: [(&str, &str); 3] = [("admin", "admin123"), ("user1", "password"), ("test", "test")];

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    users: Vec<User>,
    videos: Vec<Video>,

    /// Orden de actualización: el último registro es el más reciente
    history: Vec<WatchHistory>,

    next_user_id: u32,
    next_video_id: u32,

    #[serde(skip)]
    sessions: HashMap<String, Session>,

    /// Cambios persistentes aplicados desde que se abrió el store
    #[serde(skip)]
    generation: u64,
}

/// Estado serializado bajo el lock, escrito a disco fuera de él
struct Snapshot {
    generation: u64,
    bytes: Vec<u8>,
}

/// Store thread-safe con snapshot JSON opcional
pub struct MemoryStore {
    /// Ruta del snapshot (`None` = solo memoria)
    path: Option<PathBuf>,

    data: Mutex<StoreData>,

    /// Generación del último snapshot escrito. Serializa las escrituras.
    persisted: Mutex<u64>,

    session_ttl: Duration,
}

impl MemoryStore {
    /// Abre (o crea) el store respaldado por `path`
    ///
    /// Un snapshot ilegible se renombra a `<path>.corrupt-<segundos>` y se
    /// empieza limpio; nunca se sobreescribe.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            StoreData::default()
        };

        let store = Self::with_data(Some(path), data);
        store.seed_if_empty()?;

        Ok(store)
    }

    /// Store sin disco (tests y pruebas locales), con los usuarios iniciales
    pub fn in_memory() -> Self {
        let store = Self::with_data(None, StoreData::default());
        // Sin ruta no hay I/O que pueda fallar
        let _ = store.seed_if_empty();
        store
    }

    fn with_data(path: Option<PathBuf>, data: StoreData) -> Self {
        Self {
            path,
            data: Mutex::new(data),
            persisted: Mutex::new(0),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Cambia la vida de las sesiones nuevas
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Sesiones vivas (incluye vencidas aún no purgadas)
    pub fn session_count(&self) -> usize {
        self.lock().map(|data| data.sessions.len()).unwrap_or(0)
    }

    fn load_from_file(path: &Path) -> StoreResult<StoreData> {
        let reader = BufReader::new(File::open(path)?);

        match serde_json::from_reader(reader) {
            Ok(data) => Ok(data),
            Err(e) => {
                let mut backup = path.as_os_str().to_owned();
                backup.push(format!(".corrupt-{}", now_secs()));
                let backup = PathBuf::from(backup);

                fs::rename(path, &backup)?;
                tracing::warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "corrupt store snapshot moved aside, starting empty"
                );
                Ok(StoreData::default())
            }
        }
    }

    fn snapshot(&self, data: &StoreData) -> StoreResult<Option<Snapshot>> {
        if self.path.is_none() {
            return Ok(None);
        }
        Ok(Some(Snapshot {
            generation: data.generation,
            bytes: serde_json::to_vec_pretty(data)?,
        }))
    }

    /// Escribe `snapshot` salvo que ya haya en disco uno más nuevo
    fn persist(&self, snapshot: Option<Snapshot>) -> StoreResult<()> {
        let (Some(path), Some(snapshot)) = (&self.path, snapshot) else {
            return Ok(());
        };

        let mut persisted = self.persisted.lock().map_err(|_| StoreError::Poisoned)?;
        if *persisted >= snapshot.generation {
            return Ok(());
        }

        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        let mut writer = BufWriter::new(File::create(&temp_path)?);
        writer.write_all(&snapshot.bytes)?;
        writer.flush()?;
        drop(writer);

        fs::rename(&temp_path, path)?;
        *persisted = snapshot.generation;
        Ok(())
    }

    /// Confirma un cambio ya aplicado en `data` y lo guarda en disco.
    ///
    /// Si no se puede guardar, `undo` revierte el cambio en memoria y se
    /// devuelve el error: el llamador nunca ve un cambio que falló.
    fn commit(&self, mut data: MutexGuard<'_, StoreData>, undo: impl FnOnce(&mut StoreData)) -> StoreResult<()> {
        data.generation += 1;
        let snapshot = match self.snapshot(&data) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                undo(&mut *data);
                return Err(e);
            }
        };
        drop(data);

        if let Err(e) = self.persist(snapshot) {
            tracing::warn!(error = %e, "store snapshot not written, change rolled back");
            if let Ok(mut data) = self.lock() {
                undo(&mut *data);
            }
            return Err(e);
        }
        Ok(())
    }

    fn seed_if_empty(&self) -> StoreResult<()> {
        let mut data = self.lock()?;
        if !data.users.is_empty() {
            return Ok(());
        }

        for (username, password) in SEED_USERS {
            insert_user(&mut data, username, password);
        }
        tracing::info!(users = SEED_USERS.len(), "seeded default accounts");

        self.commit(data, |data| data.users.clear())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreData>> {
        self.data.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn find_user_by_name(&self, username: &str) -> StoreResult<Option<User>> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|u| u.username == username).cloned())
    }

    fn find_user_by_id(&self, id: u32) -> StoreResult<Option<User>> {
        let data = self.lock()?;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    fn create_user(&self, username: &str, password: &str) -> StoreResult<User> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::InvalidInput("username and password are required"));
        }

        let mut data = self.lock()?;
        if data.users.iter().any(|u| u.username == username) {
            return Err(StoreError::UserExists(username.to_string()));
        }

        let user = insert_user(&mut data, username, password);
        let id = user.id;
        self.commit(data, move |data| data.users.retain(|u| u.id != id))?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    fn create_session(&self, user_id: u32) -> StoreResult<Session> {
        let now = now_secs();
        let mut data = self.lock()?;

        data.sessions.retain(|_, s| s.expires_at > now);

        if data.sessions.len() >= MAX_SESSIONS {
            let victim = data
                .sessions
                .values()
                .min_by_key(|s| s.expires_at)
                .map(|s| s.token.clone());
            if let Some(token) = victim {
                data.sessions.remove(&token);
            }
        }

        let session = Session {
            token: random_string(TOKEN_LEN),
            user_id,
            expires_at: now + self.session_ttl.as_secs(),
        };
        data.sessions.insert(session.token.clone(), session.clone());

        Ok(session)
    }

    fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        if token.is_empty() {
            return Ok(None);
        }
        let now = now_secs();
        let data = self.lock()?;
        Ok(data
            .sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .cloned())
    }

    fn destroy_session(&self, token: &str) -> StoreResult<()> {
        self.lock()?.sessions.remove(token);
        Ok(())
    }

    fn find_video(&self, id: u32) -> StoreResult<Option<Video>> {
        let data = self.lock()?;
        Ok(data.videos.iter().find(|v| v.id == id).cloned())
    }

    fn find_video_by_filename(&self, filename: &str) -> StoreResult<Option<Video>> {
        let data = self.lock()?;
        Ok(data.videos.iter().find(|v| v.filename == filename).cloned())
    }

    fn list_videos(&self) -> StoreResult<Vec<Video>> {
        let data = self.lock()?;
        let mut videos = data.videos.clone();
        videos.sort_by_key(|v| v.id);
        Ok(videos)
    }

    fn count_videos(&self) -> StoreResult<usize> {
        Ok(self.lock()?.videos.len())
    }

    fn add_video(&self, new: NewVideo) -> StoreResult<Video> {
        let mut data = self.lock()?;
        let previous = data.videos.iter().find(|v| v.filename == new.filename).cloned();

        let video = match data.videos.iter_mut().find(|v| v.filename == new.filename) {
            Some(existing) => {
                existing.title = new.title;
                existing.thumbnail = new.thumbnail;
                existing.duration_secs = new.duration_secs;
                if !new.description.is_empty() {
                    existing.description = new.description;
                }
                existing.clone()
            }
            None => {
                data.next_video_id += 1;
                let video = Video {
                    id: data.next_video_id,
                    title: new.title,
                    filename: new.filename,
                    thumbnail: new.thumbnail,
                    duration_secs: new.duration_secs,
                    description: new.description,
                };
                data.videos.push(video.clone());
                video
            }
        };

        let id = video.id;
        self.commit(data, move |data| match previous {
            Some(old) => {
                if let Some(slot) = data.videos.iter_mut().find(|v| v.id == id) {
                    *slot = old;
                }
            }
            None => data.videos.retain(|v| v.id != id),
        })?;

        Ok(video)
    }

    fn find_history(&self, user_id: u32, video_id: u32) -> StoreResult<Option<WatchHistory>> {
        let data = self.lock()?;
        Ok(data
            .history
            .iter()
            .find(|h| h.user_id == user_id && h.video_id == video_id)
            .cloned())
    }

    fn upsert_history(&self, user_id: u32, video_id: u32, position_secs: u64) -> StoreResult<()> {
        let mut data = self.lock()?;

        // El registro actualizado pasa al final
        let existing = data
            .history
            .iter()
            .position(|h| h.user_id == user_id && h.video_id == video_id);
        let previous = existing.map(|pos| (pos, data.history.remove(pos)));
        data.history.push(WatchHistory {
            user_id,
            video_id,
            last_pos_secs: position_secs,
            updated_at: now_secs(),
        });

        self.commit(data, move |data| {
            data.history
                .retain(|h| !(h.user_id == user_id && h.video_id == video_id));
            if let Some((pos, old)) = previous {
                let pos = pos.min(data.history.len());
                data.history.insert(pos, old);
            }
        })
    }

    fn list_user_history(&self, user_id: u32, limit: usize) -> StoreResult<Vec<WatchHistory>> {
        let data = self.lock()?;
        Ok(data
            .history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn flush(&self) -> StoreResult<()> {
        let snapshot = {
            let data = self.lock()?;
            self.snapshot(&data)?
        };
        self.persist(snapshot)
    }
}

fn insert_user(data: &mut StoreData, username: &str, password: &str) -> User {
    data.next_user_id += 1;
    let salt = random_string(SALT_LEN);
    let user = User {
        id: data.next_user_id,
        username: username.to_string(),
        password_hash: hash_password(&salt, password),
        salt,
    };
    data.users.push(user.clone());
    user
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
