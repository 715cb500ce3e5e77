//! # Framing de Requests
//! src/http/framer.rs
//!
//! Lee bytes crudos de una conexión hasta tener un request completo:
//!
//! 1. **Headers**: se lee de forma incremental hasta encontrar `\r\n\r\n`.
//!    Si el buffer se llena antes, el request se rechaza.
//! 2. **Body**: si hay `Content-Length` y faltan bytes, se sigue leyendo
//!    (con el mismo tope de buffer) hasta completarlo.
//!
//! Nunca se asume que el request llega en una sola lectura y nunca se
//! lee más allá de la capacidad del buffer. El deadline lo impone el
//! lector (el worker usa uno total por request); aquí solo se interpreta
//! el error `WouldBlock`/`TimedOut`.

use std::io::{self, Read};
use thiserror::Error;

/// Separador entre headers y body
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Capacidad por defecto del buffer de request (8 KiB)
pub const DEFAULT_REQUEST_BUFFER: usize = 8192;

/// Errores de framing. En todos los casos la conexión se abandona sin respuesta.
#[derive(Debug, Error)]
pub enum FrameError {
    /// El peer cerró antes de completar el bloque de headers
    #[error("connection closed before a complete header block ({received} bytes received)")]
    Closed { received: usize },

    /// Se agotó el deadline de lectura antes de completar los headers
    #[error("read deadline elapsed before a complete header block ({received} bytes received)")]
    TimedOut { received: usize },

    /// El buffer se llenó sin encontrar `\r\n\r\n`
    #[error("header block exceeds {capacity} bytes")]
    HeadersTooLarge { capacity: usize },

    /// Error de transporte
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// Request enmarcado: bytes crudos listos para `Request::parse`
#[derive(Debug, Clone)]
pub struct FramedRequest {
    bytes: Vec<u8>,
    header_len: usize,
    body_complete: bool,
}

impl FramedRequest {
    /// Bytes leídos (headers + body recibido)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Longitud del bloque de headers, incluyendo `\r\n\r\n`
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// `false` si el body declarado no llegó completo (peer cerró,
    /// deadline o buffer lleno). El request se procesa igual.
    pub fn body_complete(&self) -> bool {
        self.body_complete
    }
}

/// Lector de requests con buffer de capacidad fija
#[derive(Debug, Clone, Copy)]
pub struct RequestFramer {
    capacity: usize,
}

impl RequestFramer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lee un request completo desde `reader`
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::RequestFramer;
    /// use std::io::Cursor;
    ///
    /// let mut conn = Cursor::new(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n".to_vec());
    /// let framed = RequestFramer::new(8192).frame(&mut conn).unwrap();
    /// assert!(framed.body_complete());
    /// ```
    pub fn frame<R: Read>(&self, reader: &mut R) -> Result<FramedRequest, FrameError> {
        let mut buffer = vec![0u8; self.capacity];
        let mut total = 0;

        // Fase 1: headers
        let header_len = loop {
            if let Some(pos) = find_terminator(&buffer[..total]) {
                break pos + HEADER_TERMINATOR.len();
            }
            if total == self.capacity {
                return Err(FrameError::HeadersTooLarge { capacity: self.capacity });
            }

            match read_some(reader, &mut buffer[total..]) {
                Ok(0) => return Err(FrameError::Closed { received: total }),
                Ok(n) => total += n,
                Err(e) if is_timeout(&e) => return Err(FrameError::TimedOut { received: total }),
                Err(e) => return Err(FrameError::Io(e)),
            }
        };

        // Fase 2: body con longitud conocida
        let wanted = declared_content_length(&buffer[..header_len]).unwrap_or(0);
        let mut body_complete = true;

        while total - header_len < wanted {
            if total == self.capacity {
                tracing::debug!(capacity = self.capacity, wanted, "request body truncated at buffer capacity");
                body_complete = false;
                break;
            }
            match read_some(reader, &mut buffer[total..]) {
                Ok(0) => {
                    body_complete = false;
                    break;
                }
                Ok(n) => total += n,
                Err(e) if is_timeout(&e) => {
                    body_complete = false;
                    break;
                }
                Err(e) => return Err(FrameError::Io(e)),
            }
        }

        buffer.truncate(total);

        Ok(FramedRequest {
            bytes: buffer,
            header_len,
            body_complete,
        })
    }
}

impl Default for RequestFramer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_BUFFER)
    }
}

/// Posición de `\r\n\r\n` dentro de `bytes`
pub fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Busca `Content-Length` (sin distinguir mayúsculas) en el bloque de headers.
/// Un valor ilegible cuenta como ausente; el parser lo rechazará después.
fn declared_content_length(head: &[u8]) -> Option<usize> {
    let head = String::from_utf8_lossy(head);
    head.split("\r\n").skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Entrega los datos de a `step` bytes por lectura
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Entrega los datos y luego simula el deadline del socket
    struct Stall {
        data: Cursor<Vec<u8>>,
    }

    impl Read for Stall {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out"));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_single_read_request() {
        let raw = b"GET /video/1 HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let framed = RequestFramer::default().frame(&mut Cursor::new(raw.to_vec())).unwrap();

        assert_eq!(framed.as_bytes(), raw);
        assert_eq!(framed.header_len(), raw.len());
        assert!(framed.body_complete());
    }

    #[test]
    fn test_headers_split_across_reads() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\nCookie: session=abc\r\n\r\n".to_vec();
        let mut reader = Trickle { data: raw.clone(), pos: 0, step: 1 };

        let framed = RequestFramer::default().frame(&mut reader).unwrap();
        assert_eq!(framed.as_bytes(), &raw[..]);
    }

    #[test]
    fn test_body_read_until_content_length() {
        let raw = b"POST /login HTTP/1.1\r\ncontent-length: 31\r\n\r\nusername=admin&password=admin12".to_vec();
        let mut reader = Trickle { data: raw.clone(), pos: 0, step: 7 };

        let framed = RequestFramer::default().frame(&mut reader).unwrap();
        assert!(framed.body_complete());
        assert_eq!(framed.as_bytes().len(), raw.len());
        assert_eq!(&framed.as_bytes()[framed.header_len()..], b"username=admin&password=admin12");
    }

    #[test]
    fn test_body_arrives_in_later_read() {
        let head = b"POST /x HTTP/1.1\r\nContent-Length: 3\r\n\r\n".to_vec();
        let mut data = head.clone();
        data.extend_from_slice(b"abc");
        let mut reader = Trickle { data, pos: 0, step: head.len() };

        let framed = RequestFramer::default().frame(&mut reader).unwrap();
        assert_eq!(&framed.as_bytes()[framed.header_len()..], b"abc");
    }

    #[test]
    fn test_oversized_headers_rejected() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(10_000));
        let mut reader = Cursor::new(raw);

        let result = RequestFramer::new(1024).frame(&mut reader);
        assert!(matches!(result, Err(FrameError::HeadersTooLarge { capacity: 1024 })));
        // No se leyó más allá de la capacidad
        assert_eq!(reader.position(), 1024);
    }

    #[test]
    fn test_peer_closes_before_terminator() {
        let mut reader = Cursor::new(b"GET / HTTP/1.1\r\nHost: x\r\n".to_vec());
        let result = RequestFramer::default().frame(&mut reader);
        assert!(matches!(result, Err(FrameError::Closed { received: 25 })));
    }

    #[test]
    fn test_empty_connection() {
        let result = RequestFramer::default().frame(&mut Cursor::new(Vec::new()));
        assert!(matches!(result, Err(FrameError::Closed { received: 0 })));
    }

    #[test]
    fn test_deadline_before_headers() {
        let mut reader = Stall { data: Cursor::new(b"GET / HTTP/1.1\r\n".to_vec()) };
        let result = RequestFramer::default().frame(&mut reader);
        assert!(matches!(result, Err(FrameError::TimedOut { .. })));
    }

    #[test]
    fn test_deadline_during_body_keeps_partial_body() {
        let mut reader = Stall {
            data: Cursor::new(b"POST /x HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc".to_vec()),
        };
        let framed = RequestFramer::default().frame(&mut reader).unwrap();
        assert!(!framed.body_complete());
        assert_eq!(&framed.as_bytes()[framed.header_len()..], b"abc");
    }

    #[test]
    fn test_body_bounded_by_buffer() {
        let mut raw = b"POST /x HTTP/1.1\r\nContent-Length: 5000\r\n\r\n".to_vec();
        raw.extend(std::iter::repeat(b'z').take(5000));

        let framed = RequestFramer::new(256).frame(&mut Cursor::new(raw)).unwrap();
        assert!(!framed.body_complete());
        assert_eq!(framed.as_bytes().len(), 256);
    }

    #[test]
    fn test_find_terminator() {
        assert_eq!(find_terminator(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
        assert_eq!(find_terminator(b"GET / HTTP/1.1\r\n"), None);
    }
}
