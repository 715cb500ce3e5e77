//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea cada request a un handler.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → (sesión) → Handler → Reply
//! ```
//!
//! Las rutas se prueban en orden de registro y gana la primera que
//! coincide. Una ruta protegida sin sesión válida responde con una
//! redirección a `/login.html`. Si ninguna coincide se usa el fallback.

use crate::error::AppError;
use crate::http::{Method, Request, Response, StatusCode};
use crate::store::{Session, Store};
use crate::streaming::FileStream;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Nombre de la cookie de sesión
pub const SESSION_COOKIE: &str = "session";

/// Destino de las rutas protegidas sin sesión
pub const LOGIN_PAGE: &str = "/login.html";

/// Estado compartido por todos los workers
pub struct App {
    pub store: Arc<dyn Store>,
    pub static_dir: PathBuf,
    pub video_dir: PathBuf,
}

/// Contexto de un request: el estado de la app y la sesión resuelta
pub struct Context<'a> {
    pub app: &'a App,
    pub session: Option<Session>,
}

impl Context<'_> {
    pub fn user_id(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.user_id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }
}

/// Respuesta de un handler: en memoria o en streaming desde disco
#[derive(Debug)]
pub enum Reply {
    Full(Response),
    Stream(FileStream),
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Full(response) => response.status(),
            Reply::Stream(stream) => stream.head().status(),
        }
    }

    /// Escribe la respuesta; con `head_only` solo los headers. Retorna los bytes de body enviados.
    pub fn write_to<W: Write>(self, out: &mut W, head_only: bool) -> io::Result<u64> {
        match self {
            Reply::Full(response) => {
                response.write_to(out, head_only)?;
                Ok(if head_only { 0 } else { response.body().len() as u64 })
            }
            Reply::Stream(stream) => stream.write_to(out, head_only),
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Full(response)
    }
}

/// Tipo de función handler
pub type Handler = fn(&Request, &Context) -> Result<Reply, AppError>;

/// Cómo se compara el path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    Exact(&'static str),

    /// El path empieza con el prefijo (ej: `/video/`)
    Prefix(&'static str),
}

impl PathPattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == *p,
            PathPattern::Prefix(p) => path.starts_with(p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,

    /// Requiere sesión
    Protected,
}

/// Una entrada de la tabla de rutas
#[derive(Clone)]
pub struct Route {
    /// `None` = cualquier método. `GET` también acepta `HEAD`.
    method: Option<Method>,
    pattern: PathPattern,
    access: Access,
    handler: Handler,
}

impl Route {
    pub fn new(method: Option<Method>, pattern: PathPattern, access: Access, handler: Handler) -> Self {
        Self {
            method,
            pattern,
            access,
            handler,
        }
    }

    fn matches(&self, method: Method, path: &str) -> bool {
        let method_ok = match self.method {
            None => true,
            Some(Method::GET) => matches!(method, Method::GET | Method::HEAD),
            Some(expected) => method == expected,
        };
        method_ok && self.pattern.matches(path)
    }
}

/// Router con tabla ordenada y handler de fallback
pub struct Router {
    routes: Vec<Route>,
    fallback: Handler,
}

impl Router {
    /// Crea un router vacío; lo que no coincida va a `fallback`
    pub fn new(fallback: Handler) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
        }
    }

    /// Registra una ruta al final de la tabla
    pub fn register(&mut self, route: Route) -> &mut Self {
        self.routes.push(route);
        self
    }

    pub fn get(&mut self, pattern: PathPattern, access: Access, handler: Handler) -> &mut Self {
        self.register(Route::new(Some(Method::GET), pattern, access, handler))
    }

    pub fn post(&mut self, pattern: PathPattern, access: Access, handler: Handler) -> &mut Self {
        self.register(Route::new(Some(Method::POST), pattern, access, handler))
    }

    pub fn any(&mut self, pattern: PathPattern, access: Access, handler: Handler) -> &mut Self {
        self.register(Route::new(None, pattern, access, handler))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resuelve la sesión, busca la ruta y ejecuta el handler.
    ///
    /// Nunca falla: los errores del handler se convierten en respuestas.
    pub fn route(&self, request: &Request, app: &App) -> Reply {
        let session = match resolve_session(request, app) {
            Ok(session) => session,
            Err(e) => return Reply::Full(e.into_response()),
        };
        let ctx = Context { app, session };

        let route = self
            .routes
            .iter()
            .find(|r| r.matches(request.method(), request.path()));

        let result = match route {
            Some(route) if route.access == Access::Protected && !ctx.is_logged_in() => {
                tracing::debug!(path = request.path(), "anonymous access to protected route");
                Ok(Response::redirect(LOGIN_PAGE).into())
            }
            Some(route) => (route.handler)(request, &ctx),
            None => (self.fallback)(request, &ctx),
        };

        result.unwrap_or_else(|e| Reply::Full(e.into_response()))
    }
}

fn resolve_session(request: &Request, app: &App) -> Result<Option<Session>, AppError> {
    match request.cookie_value(SESSION_COOKIE) {
        Some(token) if !token.is_empty() => Ok(app.store.find_session(token)?),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn ok_handler(_req: &Request, _ctx: &Context) -> Result<Reply, AppError> {
        Ok(Response::text(StatusCode::Ok, "ok").into())
    }

    fn whoami_handler(_req: &Request, ctx: &Context) -> Result<Reply, AppError> {
        let body = ctx.user_id().map(|id| id.to_string()).unwrap_or_default();
        Ok(Response::text(StatusCode::Ok, &body).into())
    }

    fn failing_handler(_req: &Request, _ctx: &Context) -> Result<Reply, AppError> {
        Err(AppError::NotFound("Video not found".into()))
    }

    fn fallback(_req: &Request, _ctx: &Context) -> Result<Reply, AppError> {
        Ok(Response::text(StatusCode::NotFound, "Not Found").into())
    }

    fn app() -> App {
        App {
            store: Arc::new(MemoryStore::in_memory()),
            static_dir: PathBuf::from("static"),
            video_dir: PathBuf::from("videos"),
        }
    }

    fn body(reply: Reply) -> (StatusCode, String, Response) {
        match reply {
            Reply::Full(r) => (r.status(), String::from_utf8_lossy(r.body()).into_owned(), r),
            Reply::Stream(_) => panic!("unexpected stream"),
        }
    }

    fn request(raw: &str) -> Request {
        Request::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new(fallback);
        router
            .get(PathPattern::Exact("/a"), Access::Public, ok_handler)
            .get(PathPattern::Prefix("/a"), Access::Public, failing_handler);

        let (status, _, _) = body(router.route(&request("GET /a HTTP/1.1\r\n\r\n"), &app()));
        assert_eq!(status, StatusCode::Ok);

        let (status, text, _) = body(router.route(&request("GET /abc HTTP/1.1\r\n\r\n"), &app()));
        assert_eq!(status, StatusCode::NotFound);
        assert_eq!(text, "Video not found");
    }

    #[test]
    fn test_get_route_accepts_head_but_not_post() {
        let mut router = Router::new(fallback);
        router.get(PathPattern::Exact("/a"), Access::Public, ok_handler);

        let (status, _, _) = body(router.route(&request("HEAD /a HTTP/1.1\r\n\r\n"), &app()));
        assert_eq!(status, StatusCode::Ok);

        let (status, text, _) = body(router.route(&request("POST /a HTTP/1.1\r\n\r\n"), &app()));
        assert_eq!(status, StatusCode::NotFound);
        assert_eq!(text, "Not Found");
    }

    #[test]
    fn test_protected_route_redirects_anonymous() {
        let mut router = Router::new(fallback);
        router.get(PathPattern::Exact("/list.html"), Access::Protected, ok_handler);

        let (status, _, response) = body(router.route(&request("GET /list.html HTTP/1.1\r\n\r\n"), &app()));
        assert_eq!(status, StatusCode::Found);
        assert_eq!(response.header("Location"), Some(LOGIN_PAGE));

        let raw = "GET /list.html HTTP/1.1\r\nCookie: session=bogus\r\n\r\n";
        let (status, _, _) = body(router.route(&request(raw), &app()));
        assert_eq!(status, StatusCode::Found);
    }

    #[test]
    fn test_session_cookie_resolves_user() {
        let app = app();
        let session = app.store.create_session(7).unwrap();

        let mut router = Router::new(fallback);
        router.get(PathPattern::Exact("/me"), Access::Protected, whoami_handler);

        let raw = format!("GET /me HTTP/1.1\r\nCookie: theme=dark; session={}\r\n\r\n", session.token);
        let (status, text, _) = body(router.route(&request(&raw), &app));
        assert_eq!(status, StatusCode::Ok);
        assert_eq!(text, "7");
    }

    #[test]
    fn test_any_method_route() {
        let mut router = Router::new(fallback);
        router.any(PathPattern::Exact("/logout"), Access::Public, ok_handler);
        assert_eq!(router.len(), 1);

        for raw in ["GET /logout HTTP/1.1\r\n\r\n", "POST /logout HTTP/1.1\r\n\r\n"] {
            let (status, _, _) = body(router.route(&request(raw), &app()));
            assert_eq!(status, StatusCode::Ok);
        }
    }
}
