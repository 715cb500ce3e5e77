//! # Streaming de Archivos
//! src/streaming/stream.rs
//!
//! Respuesta cuyo body se copia desde un archivo en bloques de a lo sumo
//! `STREAM_BUFFER` bytes, sin cargarlo en memoria.

use super::range::RangeWindow;
use crate::http::{Response, StatusCode};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Tamaño del bloque de copia (64 KiB)
pub const STREAM_BUFFER: usize = 64 * 1024;

/// Body en streaming: una fuente posicionable más la ventana a enviar
#[derive(Debug)]
pub struct FileStream<S = File> {
    source: S,
    window: RangeWindow,
    ranged: bool,
    content_type: String,
    accept_ranges: bool,
}

impl<S: Read + Seek> FileStream<S> {
    /// Respuesta de media: siempre anuncia `Accept-Ranges: bytes`
    pub fn media(source: S, window: RangeWindow, ranged: bool, content_type: &str) -> Self {
        Self {
            source,
            window,
            ranged,
            content_type: content_type.to_string(),
            accept_ranges: true,
        }
    }

    /// Archivo completo sin soporte de rangos (archivos estáticos)
    pub fn whole(source: S, total: u64, content_type: &str) -> Self {
        Self {
            source,
            window: RangeWindow::whole(total),
            ranged: false,
            content_type: content_type.to_string(),
            accept_ranges: false,
        }
    }

    pub fn window(&self) -> RangeWindow {
        self.window
    }

    pub fn is_ranged(&self) -> bool {
        self.ranged
    }

    /// Status y headers, sin body
    pub fn head(&self) -> Response {
        let status = if self.ranged {
            StatusCode::PartialContent
        } else {
            StatusCode::Ok
        };

        let mut response = Response::new(status).with_header("Content-Type", &self.content_type);
        if self.ranged {
            response.add_header("Content-Range", &self.window.content_range());
        }
        if self.accept_ranges {
            response.add_header("Accept-Ranges", "bytes");
        }
        response
    }

    /// Escribe headers y (salvo `head_only`) el body.
    ///
    /// Retorna los bytes de body enviados. Si la fuente se agota antes de
    /// tiempo se corta y se registra; el `Content-Length` ya enviado queda
    /// sin cumplir y el cliente lo detecta al cerrarse la conexión.
    pub fn write_to<W: Write>(mut self, out: &mut W, head_only: bool) -> io::Result<u64> {
        out.write_all(&self.head().head_bytes(self.window.len()))?;
        if head_only || self.window.is_empty() {
            out.flush()?;
            return Ok(0);
        }

        self.source.seek(SeekFrom::Start(self.window.start()))?;

        let wanted = self.window.len();
        let mut limited = (&mut self.source).take(wanted);
        let mut buffer = vec![0u8; STREAM_BUFFER];
        let mut sent: u64 = 0;

        while sent < wanted {
            let n = match limited.read(&mut buffer) {
                Ok(0) => {
                    tracing::warn!(sent, wanted, "source ended before the window was complete");
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(sent, wanted, error = %e, "read failed while streaming");
                    break;
                }
            };

            out.write_all(&buffer[..n])?;
            sent += n as u64;
        }

        out.flush()?;
        Ok(sent)
    }
}
