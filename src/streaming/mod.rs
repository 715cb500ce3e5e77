//! # Streaming
//! src/streaming/mod.rs
//!
//! - `range`: cálculo de la ventana de bytes (`Range`, `start=`, tope por respuesta)
//! - `stream`: copia de la ventana al socket en bloques acotados

pub mod range;
pub mod stream;

pub use range::{resolve_window, start_hint_offset, RangeError, RangeWindow, CHUNK_MAX};
pub use stream::{FileStream, STREAM_BUFFER};
