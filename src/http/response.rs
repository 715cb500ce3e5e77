//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.1 y convertirlas a bytes.
//! Todas las respuestas llevan `Content-Length` y `Connection: close`
//! (una petición por conexión, sin keep-alive).
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 302 Found\r\n
//! Location: /list.html\r\n
//! Set-Cookie: session=abc; Path=/; HttpOnly\r\n
//! Content-Length: 0\r\n
//! Connection: close\r\n
//! \r\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use ott_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "application/json")
//!     .with_body(r#"{"success":true}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::io::{self, Write};

/// Valor del header `Server`
pub const SERVER_NAME: &str = concat!("ott-server/", env!("CARGO_PKG_VERSION"));

/// Representa una respuesta HTTP completa (headers + body en memoria)
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers en orden de inserción; un nombre aparece una sola vez
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body desde un string
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el body desde bytes
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Respuesta JSON con el status indicado
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::{Response, StatusCode};
    ///
    /// let response = Response::json(StatusCode::Ok, r#"{"success":true}"#);
    /// assert_eq!(response.header("Content-Type"), Some("application/json"));
    /// ```
    pub fn json(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Respuesta de error con mensaje JSON: `{"error": "mensaje"}`
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::json(status, &body)
    }

    /// Respuesta de texto plano
    pub fn text(status: StatusCode, message: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain")
            .with_body(message)
    }

    /// Redirección 302 a `location`
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::Found).with_header("Location", location)
    }

    /// Agrega un `Set-Cookie`
    pub fn with_cookie(self, cookie: &str) -> Self {
        self.with_header("Set-Cookie", cookie)
    }

    /// Serializa solo el bloque de headers, anunciando `content_length`.
    ///
    /// Lo usan también las respuestas en streaming, cuyo body no vive en memoria.
    pub fn head_bytes(&self, content_length: u64) -> Vec<u8> {
        let mut result = Vec::with_capacity(256);

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        // 2. Headers propios
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("Content-Length") || name.eq_ignore_ascii_case("Connection") {
                continue;
            }
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Headers obligatorios
        if self.header("Server").is_none() {
            result.extend_from_slice(format!("Server: {}\r\n", SERVER_NAME).as_bytes());
        }
        result.extend_from_slice(format!("Content-Length: {}\r\n", content_length).as_bytes());
        result.extend_from_slice(b"Connection: close\r\n");

        // 4. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        result
    }

    /// Convierte la respuesta completa a bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes(self.body.len() as u64);
        result.extend_from_slice(&self.body);
        result
    }

    /// Escribe la respuesta en `out`. Con `head_only` se omite el body (HEAD).
    pub fn write_to<W: Write>(&self, out: &mut W, head_only: bool) -> io::Result<()> {
        if head_only {
            out.write_all(&self.head_bytes(self.body.len() as u64))?;
        } else {
            out.write_all(&self.to_bytes())?;
        }
        out.flush()
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Valor de un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Headers en orden de inserción
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
