//! # Autenticación
//! src/handlers/auth.rs
//!
//! Login, registro y logout con formularios `application/x-www-form-urlencoded`.
//! Todas las respuestas son redirecciones 302.

use super::static_files;
use crate::error::AppError;
use crate::http::{Request, Response};
use crate::router::{Context, Reply, LOGIN_PAGE, SESSION_COOKIE};
use crate::store::StoreError;

/// Página de inicio tras autenticarse
pub const HOME_PAGE: &str = "/list.html";

/// `/`: a la lista si hay sesión, al login si no
pub fn root(_request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let target = if ctx.is_logged_in() { HOME_PAGE } else { LOGIN_PAGE };
    Ok(Response::redirect(target).into())
}

/// `/index.html`: redirige a la lista si hay sesión
pub fn index(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    if ctx.is_logged_in() {
        return Ok(Response::redirect(HOME_PAGE).into());
    }
    static_files::serve(request, ctx)
}

/// `POST /login`
pub fn login(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let (Some(username), Some(password)) = credentials(request) else {
        return Ok(Response::redirect("/login.html?error=missing").into());
    };

    let store = &ctx.app.store;
    let user = match store.find_user_by_name(&username)? {
        Some(user) if store.verify_password(&user, &password) => user,
        _ => {
            tracing::warn!(username = %username, "login failed");
            return Ok(Response::redirect("/login.html?error=invalid").into());
        }
    };

    let session = store.create_session(user.id)?;
    tracing::info!(user_id = user.id, username = %user.username, "user logged in");

    let cookie = format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, session.token);
    Ok(Response::redirect(HOME_PAGE).with_cookie(&cookie).into())
}

/// `POST /register`
pub fn register(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    let (Some(username), Some(password)) = credentials(request) else {
        return Ok(Response::redirect("/register.html?error=missing").into());
    };

    let location = match ctx.app.store.create_user(&username, &password) {
        Ok(_) => "/login.html?registered=true",
        Err(StoreError::UserExists(_)) => {
            tracing::warn!(username = %username, "registration failed: user already exists");
            "/register.html?error=exists"
        }
        Err(StoreError::InvalidInput(_)) => "/register.html?error=missing",
        Err(e) => {
            tracing::error!(username = %username, error = %e, "registration failed");
            "/register.html?error=failed"
        }
    };

    Ok(Response::redirect(location).into())
}

/// `/logout`: destruye la sesión y borra la cookie
pub fn logout(request: &Request, ctx: &Context) -> Result<Reply, AppError> {
    if let Some(token) = request.cookie_value(SESSION_COOKIE).filter(|t| !t.is_empty()) {
        ctx.app.store.destroy_session(token)?;
    }

    let cookie = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    Ok(Response::redirect(LOGIN_PAGE).with_cookie(&cookie).into())
}

/// Usuario y contraseña del body; un campo vacío cuenta como ausente
fn credentials(request: &Request) -> (Option<String>, Option<String>) {
    let field = |name| request.form_param(name).filter(|v| !v.is_empty());
    (field("username"), field("password"))
}
