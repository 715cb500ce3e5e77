//! # Media
//! src/media/mod.rs
//!
//! Metadatos de video (duración, miniaturas) y registro del catálogo a
//! partir del directorio de videos.

pub mod ffmpeg;

pub use ffmpeg::FfmpegProbe;

use crate::store::{NewVideo, Store, StoreError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Segundo del video del que se saca la miniatura
pub const THUMBNAIL_AT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("media tool failed: {0}")]
    Failed(String),
}

/// Colaborador de metadatos de media
pub trait MediaProbe: Send + Sync {
    /// ¿Están las herramientas instaladas?
    fn available(&self) -> bool;

    /// Duración en segundos, 0 si no se puede determinar
    fn duration_secs(&self, video: &Path) -> u64;

    /// Escribe un JPEG del cuadro en `at_secs`
    fn extract_thumbnail(&self, video: &Path, output: &Path, at_secs: u64) -> Result<(), MediaError>;
}

/// Registra en el store cada `*.mp4` de `video_dir` que aún no esté.
///
/// Genera las miniaturas faltantes en `thumbnail_dir`. Retorna cuántos
/// videos se agregaron. Si el directorio no existe, no agrega nada.
pub fn scan_videos(
    video_dir: &Path,
    thumbnail_dir: &Path,
    store: &dyn Store,
    probe: &dyn MediaProbe,
) -> Result<usize, StoreError> {
    tracing::info!(dir = %video_dir.display(), "scanning video directory");

    let mut files = match list_videos(video_dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(dir = %video_dir.display(), error = %e, "cannot open video directory");
            return Ok(0);
        }
    };
    files.sort();

    let has_tools = probe.available();
    if !has_tools {
        tracing::warn!("ffmpeg not found, registering videos without thumbnails or duration");
    }

    let mut added = 0;
    for path in files {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(basename) = path.file_stem().and_then(|n| n.to_str()) else {
            continue;
        };

        let thumb_path = thumbnail_dir.join(format!("{}.jpg", basename));
        if has_tools && !thumb_path.exists() {
            if let Err(e) = probe.extract_thumbnail(&path, &thumb_path, THUMBNAIL_AT_SECS) {
                tracing::warn!(video = %filename, error = %e, "thumbnail extraction failed");
            }
        }

        if store.find_video_by_filename(filename)?.is_some() {
            continue;
        }

        let duration_secs = if has_tools { probe.duration_secs(&path) } else { 0 };
        let video = store.add_video(NewVideo {
            title: basename.replace('_', " "),
            filename: filename.to_string(),
            thumbnail: format!("thumbnails/{}.jpg", basename),
            duration_secs,
            description: String::new(),
        })?;

        tracing::info!(id = video.id, title = %video.title, duration_secs, "added video");
        added += 1;
    }

    Ok(added)
}

fn list_videos(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_mp4 = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mp4"))
            .unwrap_or(false);
        if is_mp4 && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
