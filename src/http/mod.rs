//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementa el protocolo HTTP desde cero, sin librerías de alto nivel:
//!
//! - Framing de requests sobre el socket (headers + body con longitud conocida)
//! - Parsing de requests acotados
//! - Construcción de responses
//! - Códigos de estado
//!
//! ## Alcance
//!
//! Una petición por conexión. No hay keep-alive ni chunked
//! transfer-encoding: toda respuesta lleva `Content-Length` y
//! `Connection: close`.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /video/3 HTTP/1.1\r\n
//! Range: bytes=1000-1999\r\n
//! \r\n
//! ```

pub mod bounded; // Buffers con tope de capacidad
pub mod framer; // Lectura de requests desde el socket
pub mod request; // Parsing de HTTP requests
pub mod response; // Construcción de HTTP responses
pub mod status; // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use bounded::BoundedBuf;
pub use framer::{FrameError, FramedRequest, RequestFramer};
pub use request::{ByteRange, Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
