//! # Archivos Estáticos
//! src/handlers/static_files.rs
//!
//! Sirve archivos bajo el directorio estático. El chequeo de `..` se hace
//! sobre el path crudo, tal como llegó en el request.

use crate::error::AppError;
use crate::http::Request;
use crate::router::{Context, Reply};
use crate::streaming::FileStream;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Handler: sirve `request.path()` desde el directorio estático
pub fn serve(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    serve_path(&ctx.app.static_dir, request.path())
}

/// Resuelve `raw_path` bajo `root` y lo envía completo.
///
/// - Path con `..` → 403
/// - Directorio o archivo inexistente → se prueba `<path>/index.html`
/// - Si tampoco existe → 404
pub fn serve_path(root: &Path, raw_path: &str) -> Result<Reply, AppError> {
    if raw_path.contains("..") {
        tracing::warn!(path = raw_path, "path traversal attempt");
        return Err(AppError::Forbidden("Forbidden".into()));
    }

    let full_path = resolve(root, raw_path).ok_or_else(|| AppError::NotFound("Not Found".into()))?;

    let file = File::open(&full_path).map_err(|_| AppError::NotFound("Not Found".into()))?;
    let total = file.metadata()?.len();

    Ok(Reply::Stream(FileStream::whole(file, total, &content_type(&full_path))))
}

/// Content-Type según la extensión
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn resolve(root: &Path, raw_path: &str) -> Option<PathBuf> {
    let full_path = root.join(raw_path.trim_start_matches('/'));
    if full_path.is_file() {
        return Some(full_path);
    }

    let index = full_path.join("index.html");
    index.is_file().then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("css/style.css"), b"body{}").unwrap();
        fs::write(dir.path().join("login.html"), b"<form></form>").unwrap();
        fs::write(dir.path().join("docs/index.html"), b"<h1>docs</h1>").unwrap();
        dir
    }

    fn head_of(reply: Reply) -> (StatusCode, String) {
        let mut out = Vec::new();
        let status = reply.status();
        reply.write_to(&mut out, false).unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_serves_file_with_content_type() {
        let dir = site();
        let (status, text) = head_of(serve_path(dir.path(), "/css/style.css").unwrap());

        assert_eq!(status, StatusCode::Ok);
        assert!(text.contains("Content-Type: text/css\r\n"));
        assert!(text.contains("Content-Length: 6\r\n"));
        assert!(text.ends_with("body{}"));
    }

    #[test]
    fn test_directory_falls_back_to_index() {
        let dir = site();
        let (_, text) = head_of(serve_path(dir.path(), "/docs").unwrap());
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.ends_with("<h1>docs</h1>"));
    }

    #[test]
    fn test_missing_file() {
        let dir = site();
        let err = serve_path(dir.path(), "/nope.html").unwrap_err();
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_dotdot_forbidden() {
        let dir = site();
        for path in ["/../etc/passwd", "/css/../../secret", "/a..b"] {
            let err = serve_path(dir.path(), path).unwrap_err();
            assert_eq!(err.status(), StatusCode::Forbidden);
        }
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type(Path::new("a/b.mp4")), "video/mp4");
        assert_eq!(content_type(Path::new("thumb.jpg")), "image/jpeg");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
