//! # API JSON
//! src/handlers/api.rs
//!
//! Endpoints bajo `/api/`. Todos requieren sesión (lo garantiza el router).

use super::parse_id;
use crate::error::AppError;
use crate::http::{Request, Response, StatusCode};
use crate::router::{Context, Reply};
use crate::store::Video;
use serde_json::{json, Value};

/// Máximo de entradas devueltas por `/api/history`
pub const HISTORY_LIMIT: usize = 100;

fn video_json(video: &Video, last_pos: u64) -> Value {
    json!({
        "id": video.id,
        "title": video.title,
        "thumbnail": video.thumbnail,
        "duration": video.duration_secs,
        "last_pos": last_pos,
    })
}

fn unauthorized() -> Reply {
    Response::error(StatusCode::Unauthorized, "Not authenticated").into()
}

fn last_position(ctx: &Context, user_id: u32, video_id: u32) -> Result<u64, AppError> {
    Ok(ctx
        .app
        .store
        .find_history(user_id, video_id)?
        .map(|h| h.last_pos_secs)
        .unwrap_or(0))
}

/// `GET /api/videos`
pub fn list_videos(_request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let Some(user_id) = ctx.user_id() else {
        return Ok(unauthorized());
    };

    let mut items = Vec::new();
    for video in ctx.app.store.list_videos()? {
        let last_pos = last_position(ctx, user_id, video.id)?;
        items.push(video_json(&video, last_pos));
    }

    Ok(Response::json(StatusCode::Ok, &Value::Array(items).to_string()).into())
}

/// `GET /api/videos/{id}`: como en la lista, más `filename`
pub fn get_video(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let Some(user_id) = ctx.user_id() else {
        return Ok(unauthorized());
    };

    let video = match parse_id(request.path(), "/api/videos/") {
        Some(id) => ctx.app.store.find_video(id)?,
        None => None,
    };
    let Some(video) = video else {
        return Ok(Response::error(StatusCode::NotFound, "Video not found").into());
    };

    let mut body = video_json(&video, last_position(ctx, user_id, video.id)?);
    body["filename"] = json!(video.filename);

    Ok(Response::json(StatusCode::Ok, &body.to_string()).into())
}

/// `GET /api/history`: el más reciente primero
pub fn list_history(_request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let Some(user_id) = ctx.user_id() else {
        return Ok(unauthorized());
    };

    let store = &ctx.app.store;
    let mut items = Vec::new();
    for entry in store.list_user_history(user_id, HISTORY_LIMIT)? {
        // Videos borrados del catálogo se omiten
        let Some(video) = store.find_video(entry.video_id)? else {
            continue;
        };
        items.push(json!({
            "video_id": entry.video_id,
            "title": video.title,
            "last_pos": entry.last_pos_secs,
            "duration": video.duration_secs,
        }));
    }

    Ok(Response::json(StatusCode::Ok, &Value::Array(items).to_string()).into())
}

/// `POST /api/history/{id}` con `position` en el body o en la query
pub fn update_history(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let Some(user_id) = ctx.user_id() else {
        return Ok(unauthorized());
    };
    let Some(video_id) = parse_id(request.path(), "/api/history/") else {
        return Ok(Response::error(StatusCode::NotFound, "Video not found").into());
    };

    let position = request
        .form_param("position")
        .filter(|p| !p.is_empty())
        .or_else(|| request.query_param("position").map(str::to_string))
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(0);

    match ctx.app.store.upsert_history(user_id, video_id, position) {
        Ok(()) => Ok(Response::json(StatusCode::Ok, r#"{"success":true}"#).into()),
        Err(e) => {
            tracing::error!(user_id, video_id, error = %e, "failed to update history");
            Ok(Response::error(StatusCode::InternalServerError, "Failed to update history").into())
        }
    }
}

/// `GET /api/user`
pub fn current_user(_request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let user = match ctx.user_id() {
        Some(id) => ctx.app.store.find_user_by_id(id)?,
        None => None,
    };
    let Some(user) = user else {
        return Ok(unauthorized());
    };

    let body = json!({ "id": user.id, "username": user.username });
    Ok(Response::json(StatusCode::Ok, &body.to_string()).into())
}

/// Cualquier otra ruta o método bajo `/api/`
pub fn not_found(_request: &Request, _ctx: &Context) -> Result<Reply, AppError> {
    Ok(Response::error(StatusCode::NotFound, "Not found").into())
}
