//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos que usa el servidor de streaming. Son pocos a propósito:
//!
//! - **2xx**: 200 OK, 206 Partial Content (respuestas con Range)
//! - **3xx**: 302 Found (login/logout y páginas protegidas)
//! - **4xx**: 400, 401, 403, 404, 416
//! - **5xx**: 500

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 206 Partial Content - Se entrega solo una ventana del recurso
    PartialContent = 206,

    /// 302 Found - Redirección (se acompaña de `Location`)
    Found = 302,

    /// 400 Bad Request - Request malformado
    BadRequest = 400,

    /// 401 Unauthorized - Sesión inexistente para un endpoint de API
    Unauthorized = 401,

    /// 403 Forbidden - Intento de escapar del directorio estático
    Forbidden = 403,

    /// 404 Not Found - Ruta, video o archivo no encontrado
    NotFound = 404,

    /// 416 Range Not Satisfiable - El inicio del rango cae fuera del archivo
    RangeNotSatisfiable = 416,

    /// 500 Internal Server Error - Falla del store o de I/O local
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::StatusCode;
    /// assert_eq!(StatusCode::PartialContent.as_u16(), 206);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::Found => "Found",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::RangeNotSatisfiable => "Range Not Satisfiable",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok | StatusCode::PartialContent)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "206 Partial Content"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::PartialContent.as_u16(), 206);
        assert_eq!(StatusCode::Found.as_u16(), 302);
        assert_eq!(StatusCode::RangeNotSatisfiable.as_u16(), 416);
        assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(StatusCode::PartialContent.reason_phrase(), "Partial Content");
        assert_eq!(StatusCode::Unauthorized.reason_phrase(), "Unauthorized");
        assert_eq!(StatusCode::RangeNotSatisfiable.reason_phrase(), "Range Not Satisfiable");
    }

    #[test]
    fn test_is_success() {
        assert!(StatusCode::Ok.is_success());
        assert!(StatusCode::PartialContent.is_success());
        assert!(!StatusCode::Found.is_success());
        assert!(!StatusCode::NotFound.is_success());
    }

    #[test]
    fn test_error_classes() {
        assert!(StatusCode::Forbidden.is_client_error());
        assert!(StatusCode::RangeNotSatisfiable.is_client_error());
        assert!(!StatusCode::InternalServerError.is_client_error());
        assert!(StatusCode::InternalServerError.is_server_error());
        assert!(!StatusCode::BadRequest.is_server_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::PartialContent.to_string(), "206 Partial Content");
        assert_eq!(StatusCode::Found.to_string(), "302 Found");
    }
}
