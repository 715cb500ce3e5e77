//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser de requests HTTP/1.0 y HTTP/1.1 (una petición por conexión).
//!
//! ## Formato de un Request
//!
//! ```text
//! GET /video/3?start=120 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Cookie: session=abc123\r\n
//! Range: bytes=1000-1999\r\n
//! \r\n
//! ```
//!
//! ## Límites
//!
//! Todos los campos están acotados. Path y query demasiado largos se
//! rechazan (400); el body se trunca a `MAX_BODY_LEN` y el truncamiento
//! queda visible en `body_truncated()`.
//!
//! El path se guarda **sin decodificar**, para que el chequeo de `..` al
//! servir archivos vea exactamente lo que mandó el cliente.

use super::bounded::BoundedBuf;
use super::framer::{find_terminator, HEADER_TERMINATOR};
use std::collections::HashMap;
use thiserror::Error;

/// Largo máximo del path (sin query)
pub const MAX_PATH_LEN: usize = 512;

/// Largo máximo de la query string cruda
pub const MAX_QUERY_LEN: usize = 512;

/// Máximo de headers aceptados
pub const MAX_HEADERS: usize = 64;

/// Capacidad del body; lo que exceda se descarta
pub const MAX_BODY_LEN: usize = 4096;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Login, registro e historial
    POST,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no es soportado
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
        }
    }
}

/// Rango de bytes pedido con `Range: bytes=<start>-<end>`
///
/// Cualquiera de los extremos puede faltar: sin `start` significa "desde
/// el principio", sin `end` significa "hasta el final".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl ByteRange {
    /// Parsea el valor del header `Range`
    ///
    /// Solo se reconoce un rango simple en unidades `bytes`. Rangos
    /// múltiples o malformados retornan `None` (se sirve sin rango).
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::ByteRange;
    ///
    /// let range = ByteRange::parse("bytes=1000-1999").unwrap();
    /// assert_eq!(range.start, Some(1000));
    /// assert_eq!(range.end, Some(1999));
    ///
    /// assert!(ByteRange::parse("bytes=0-10,20-30").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }

        let (start, end) = spec.split_once('-')?;
        let start = parse_bound(start)?;
        let end = parse_bound(end)?;

        if start.is_none() && end.is_none() {
            return None;
        }

        Some(Self { start, end })
    }
}

/// `Some(None)` para un extremo vacío, `None` si no es un número
fn parse_bound(s: &str) -> Option<Option<u64>> {
    let s = s.trim();
    if s.is_empty() {
        Some(None)
    } else {
        s.parse().ok().map(Some)
    }
}

/// Representa un request HTTP parseado. Inmutable una vez construido.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP (GET, HEAD, POST)
    method: Method,

    /// Path crudo, sin decodificar y sin query (ej: "/video/3")
    path: String,

    /// Query string cruda (ej: "start=120")
    query: String,

    /// Query parameters decodificados (ej: {"start": "120"})
    query_params: HashMap<String, String>,

    /// Headers con nombre en minúsculas
    headers: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,

    /// Content-Length declarado
    content_length: Option<usize>,

    /// Rango de bytes pedido
    range: Option<ByteRange>,

    /// Body acotado
    body: BoundedBuf,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Falta el separador `\r\n\r\n`
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Método HTTP no soportado
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Versión HTTP distinta de 1.0 / 1.1
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Más de `MAX_HEADERS` headers
    #[error("Too many headers")]
    TooManyHeaders,

    /// Path más largo que `MAX_PATH_LEN`
    #[error("Path too long: {0} bytes")]
    PathTooLong(usize),

    /// Query más larga que `MAX_QUERY_LEN`
    #[error("Query string too long: {0} bytes")]
    QueryTooLong(usize),

    /// Content-Length no numérico
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,
}

impl Request {
    /// Parsea un request desde los bytes enmarcados
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use ott_server::http::Request;
    ///
    /// let raw = b"GET /video/3?start=120 HTTP/1.1\r\nRange: bytes=0-99\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/video/3");
    /// assert_eq!(request.query_param("start"), Some("120"));
    /// assert_eq!(request.range().unwrap().end, Some(99));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ParseError::EmptyRequest);
        }

        let head_end = find_terminator(buffer).ok_or(ParseError::IncompleteRequest)?;
        let head = std::str::from_utf8(&buffer[..head_end])
            .map_err(|_| ParseError::InvalidRequestLine)?;

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;

        // 1. Request line
        let (method, path, query, version) = Self::parse_request_line(request_line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        let content_length = match headers.get("content-length") {
            Some(value) => Some(
                value
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidContentLength(value.clone()))?,
            ),
            None => None,
        };

        let range = headers.get("range").and_then(|v| ByteRange::parse(v));

        // 3. Body: lo declarado, hasta donde haya llegado, acotado
        let available = &buffer[head_end + HEADER_TERMINATOR.len()..];
        let declared = content_length.unwrap_or(0).min(available.len());
        let body = BoundedBuf::from_slice(&available[..declared], MAX_BODY_LEN);

        let query_params = parse_form(&query);

        Ok(Request {
            method,
            path,
            query,
            query_params,
            headers,
            version,
            content_length,
            range,
            body,
        })
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path?query HTTP/1.1`
    fn parse_request_line(line: &str) -> Result<(Method, String, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD TARGET VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        let target = parts[1];
        if !target.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }

        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        if path.len() > MAX_PATH_LEN {
            return Err(ParseError::PathTooLong(path.len()));
        }
        if query.len() > MAX_QUERY_LEN {
            return Err(ParseError::QueryTooLong(query.len()));
        }

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path.to_string(), query.to_string(), version))
    }

    /// Parsea los headers. Cada header tiene formato `Name: Value`.
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.is_empty() {
                continue;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

            let name = name.trim();
            if name.is_empty() {
                return Err(ParseError::InvalidHeader(line.to_string()));
            }
            if headers.len() >= MAX_HEADERS {
                return Err(ParseError::TooManyHeaders);
            }

            headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path crudo, sin decodificar
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string cruda
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Obtiene un query parameter específico (decodificado)
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Obtiene un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    pub fn host(&self) -> Option<&str> {
        self.header("host")
    }

    pub fn cookie(&self) -> Option<&str> {
        self.header("cookie")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Rango de bytes pedido, si el header era válido
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// `true` si el body declarado no cupo en `MAX_BODY_LEN`
    pub fn body_truncated(&self) -> bool {
        self.body.is_truncated()
    }

    /// Valor de una cookie (ej: `session`)
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::Request;
    ///
    /// let raw = b"GET / HTTP/1.1\r\nCookie: theme=dark; session=abc123\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    /// assert_eq!(request.cookie_value("session"), Some("abc123"));
    /// ```
    pub fn cookie_value(&self, name: &str) -> Option<&str> {
        self.cookie()?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }

    /// Parámetro de un body `application/x-www-form-urlencoded`
    pub fn form_param(&self, name: &str) -> Option<String> {
        let body = String::from_utf8_lossy(self.body());
        parse_form(&body).remove(name)
    }
}

/// Parsea `a=1&b=hola%20mundo` en un HashMap (valores decodificados)
pub fn parse_form(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for param in query.split('&') {
        if param.is_empty() {
            continue;
        }

        match param.split_once('=') {
            Some((key, value)) => {
                params.insert(url_decode(key), url_decode(value));
            }
            // Parámetro sin valor (ej: "?debug")
            None => {
                params.insert(url_decode(param), String::new());
            }
        }
    }

    params
}

/// Decodifica `%XX` y `+` (espacio)
pub fn url_decode(s: &str) -> String {
    let plus_decoded = s.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(plus_decoded.as_bytes()))
            .into_owned(),
    }
}
