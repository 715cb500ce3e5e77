//! # Errores
//! src/error.rs
//!
//! - `ServerError`: fallos al levantar el servidor (el único caso fatal es
//!   no poder abrir el socket).
//! - `AppError`: fallos de un handler. Cada variante se traduce a una
//!   respuesta HTTP; nunca termina el worker.

use crate::http::{Response, StatusCode};
use crate::store::StoreError;
use crate::streaming::RangeError;
use std::io;
use thiserror::Error;

/// Errores al arrancar el servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errores de dispatch que terminan en una respuesta de error
#[derive(Debug, Error)]
pub enum AppError {
    /// Recurso inexistente (404, texto plano)
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Path con `..` (403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Inicio fuera del archivo (416)
    #[error("range not satisfiable (total {total})")]
    RangeNotSatisfiable { total: u64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<RangeError> for AppError {
    fn from(err: RangeError) -> Self {
        AppError::RangeNotSatisfiable { total: err.total() }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NotFound,
            AppError::BadRequest(_) => StatusCode::BadRequest,
            AppError::Forbidden(_) => StatusCode::Forbidden,
            AppError::RangeNotSatisfiable { .. } => StatusCode::RangeNotSatisfiable,
            AppError::Store(_) | AppError::Io(_) => StatusCode::InternalServerError,
        }
    }

    /// Convierte el error en la respuesta que ve el cliente.
    ///
    /// Los errores internos se loguean con detalle; el cliente recibe un
    /// cuerpo genérico.
    pub fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::NotFound(message) | AppError::BadRequest(message) | AppError::Forbidden(message) => {
                Response::text(status, &message)
            }
            AppError::RangeNotSatisfiable { total } => Response::text(status, "Range Not Satisfiable")
                .with_header("Content-Range", &format!("bytes */{}", total)),
            other => {
                tracing::error!(error = %other, "request failed");
                Response::text(status, "Internal Server Error")
            }
        }
    }
}
