//! # Handlers
//! src/handlers/mod.rs
//!
//! Tabla de rutas del servidor:
//!
//! | Path | Método | Acceso |
//! |------|--------|--------|
//! | `/css/*`, `/js/*`, `/thumbnails/*` | cualquiera | público |
//! | `/`, `/index.html`, `/login.html`, `/register.html` | cualquiera | público |
//! | `/login`, `/register` | POST | público |
//! | `/logout` | cualquiera | público |
//! | `/list.html`, `/player.html` | cualquiera | sesión |
//! | `/video/{id}` | GET/HEAD | sesión |
//! | `/api/videos`, `/api/videos/{id}` | GET | sesión |
//! | `/api/history` | GET | sesión |
//! | `/api/history/{id}` | POST | sesión |
//! | `/api/user` | GET | sesión |
//!
//! Todo lo demás se busca como archivo estático.

pub mod api;
pub mod auth;
pub mod static_files;
pub mod video;

use crate::router::{Access, PathPattern, Router};

/// Construye el router con todas las rutas
pub fn routes() -> Router {
    use Access::{Protected, Public};
    use PathPattern::{Exact, Prefix};

    let mut router = Router::new(static_files::serve);
    router
        .any(Prefix("/css/"), Public, static_files::serve)
        .any(Prefix("/js/"), Public, static_files::serve)
        .any(Prefix("/thumbnails/"), Public, static_files::serve)
        .any(Exact("/"), Public, auth::root)
        .any(Exact("/login.html"), Public, static_files::serve)
        .any(Exact("/register.html"), Public, static_files::serve)
        .any(Exact("/index.html"), Public, auth::index)
        .post(Exact("/login"), Public, auth::login)
        .post(Exact("/register"), Public, auth::register)
        .any(Exact("/logout"), Public, auth::logout)
        .any(Exact("/list.html"), Protected, static_files::serve)
        .any(Exact("/player.html"), Protected, static_files::serve)
        .get(Prefix("/video/"), Protected, video::stream)
        .get(Exact("/api/videos"), Protected, api::list_videos)
        .get(Prefix("/api/videos/"), Protected, api::get_video)
        .get(Exact("/api/history"), Protected, api::list_history)
        .post(Prefix("/api/history/"), Protected, api::update_history)
        .get(Exact("/api/user"), Protected, api::current_user)
        .any(Prefix("/api/"), Protected, api::not_found);
    router
}

/// Id numérico al final de un path (`/video/3` → 3)
pub(crate) fn parse_id(path: &str, prefix: &str) -> Option<u32> {
    path.strip_prefix(prefix)?.trim_end_matches('/').parse().ok()
}
