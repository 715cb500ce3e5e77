//! # Streaming de Video
//! src/handlers/video.rs
//!
//! `GET /video/{id}` con soporte de `Range` y `?start=<segundos>`.

use super::{parse_id, static_files};
use crate::error::AppError;
use crate::http::Request;
use crate::router::{Context, Reply};
use crate::streaming::{resolve_window, FileStream};
use std::fs::File;

/// Envía la ventana pedida del archivo del video
pub fn stream(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let not_found = || AppError::NotFound("Video not found".into());

    let id = parse_id(request.path(), "/video/").ok_or_else(not_found)?;
    let video = ctx.app.store.find_video(id)?.ok_or_else(not_found)?;

    let path = ctx.app.video_dir.join(&video.filename);
    let file = File::open(&path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "cannot open video file");
        AppError::NotFound("Video file not found".into())
    })?;
    let total = file.metadata()?.len();

    let start_secs = request
        .query_param("start")
        .and_then(|s| s.trim().parse::<u64>().ok());

    let (window, ranged) = resolve_window(total, request.range(), start_secs, video.duration_secs)?;

    tracing::debug!(
        video_id = id,
        start = window.start(),
        end = window.end(),
        total,
        ranged,
        "streaming video"
    );

    let content_type = static_files::content_type(&path);
    Ok(Reply::Stream(FileStream::media(file, window, ranged, &content_type)))
}
