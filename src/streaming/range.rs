//! # Ventanas de Bytes
//! src/streaming/range.rs
//!
//! Calcula qué porción de un recurso se envía a partir del header `Range`
//! y del parámetro `start=<segundos>`.
//!
//! ## Reglas
//!
//! 1. Sin rango: se envía el recurso completo (`200`).
//! 2. Con rango: `start` pedido (o 0) hasta `end` pedido (o el último byte).
//!    Un `end` más allá del final se recorta al último byte.
//! 3. `start=S` con duración `D > 0` conocida reemplaza el inicio por
//!    `floor(S * T / D)` y convierte la petición en ranged.
//! 4. Una ventana ranged nunca supera `CHUNK_MAX` bytes.
//! 5. Inicio fuera del archivo, o `start > end`: `RangeError`.

use crate::http::ByteRange;
use thiserror::Error;

/// Tope de bytes por respuesta ranged (1 MiB)
pub const CHUNK_MAX: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range {start}-{end:?} not satisfiable for {total} bytes")]
    Unsatisfiable {
        start: u64,
        end: Option<u64>,
        total: u64,
    },
}

impl RangeError {
    /// Tamaño total del recurso, para `Content-Range: bytes */T`
    pub fn total(&self) -> u64 {
        match self {
            RangeError::Unsatisfiable { total, .. } => *total,
        }
    }
}

/// Ventana inclusiva `[start, start + len - 1]` dentro de un recurso de `total` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    start: u64,
    len: u64,
    total: u64,
}

impl RangeWindow {
    /// Recurso completo
    pub fn whole(total: u64) -> Self {
        Self { start: 0, len: total, total }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// Último byte incluido. Para una ventana vacía coincide con `start`.
    pub fn end(&self) -> u64 {
        (self.start + self.len).saturating_sub(1).max(self.start)
    }

    /// Bytes a enviar
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Valor del header `Content-Range`
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end(), self.total)
    }
}

/// Convierte `start=S` (segundos) en un offset de bytes: `floor(S * T / D)`.
///
/// Retorna `None` si `S` o `D` son 0.
///
/// # Ejemplo
/// ```
/// use ott_server::streaming::start_hint_offset;
///
/// assert_eq!(start_hint_offset(30, 5000, 100), Some(1500));
/// assert_eq!(start_hint_offset(30, 5000, 0), None);
/// ```
pub fn start_hint_offset(start_secs: u64, total: u64, duration_secs: u64) -> Option<u64> {
    if start_secs == 0 || duration_secs == 0 {
        return None;
    }
    let offset = u128::from(start_secs) * u128::from(total) / u128::from(duration_secs);
    Some(u64::try_from(offset).unwrap_or(u64::MAX))
}

/// Resuelve la ventana a enviar.
///
/// Retorna la ventana y si la respuesta es parcial (`206`).
///
/// # Ejemplo
/// ```
/// use ott_server::http::ByteRange;
/// use ott_server::streaming::resolve_window;
///
/// let range = ByteRange { start: Some(1000), end: Some(1999) };
/// let (window, ranged) = resolve_window(5000, Some(range), None, 0).unwrap();
///
/// assert!(ranged);
/// assert_eq!(window.len(), 1000);
/// assert_eq!(window.content_range(), "bytes 1000-1999/5000");
/// ```
pub fn resolve_window(
    total: u64,
    range: Option<ByteRange>,
    start_secs: Option<u64>,
    duration_secs: u64,
) -> Result<(RangeWindow, bool), RangeError> {
    let hint = start_secs.and_then(|s| start_hint_offset(s, total, duration_secs));

    if range.is_none() && hint.is_none() {
        return Ok((RangeWindow::whole(total), false));
    }

    let requested_end = range.and_then(|r| r.end);
    let start = hint.or(range.and_then(|r| r.start)).unwrap_or(0);

    let unsatisfiable = RangeError::Unsatisfiable {
        start,
        end: requested_end,
        total,
    };

    if total == 0 || start >= total {
        return Err(unsatisfiable);
    }

    let end = match requested_end {
        Some(end) if end < total => end,
        _ => total - 1,
    };

    if start > end {
        return Err(unsatisfiable);
    }

    let len = (end - start + 1).min(CHUNK_MAX);

    Ok((RangeWindow { start, len, total }, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Option<u64>, end: Option<u64>) -> Option<ByteRange> {
        Some(ByteRange { start, end })
    }

    #[test]
    fn test_no_range_sends_everything() {
        let (window, ranged) = resolve_window(5000, None, None, 0).unwrap();
        assert!(!ranged);
        assert_eq!(window.start(), 0);
        assert_eq!(window.len(), 5000);
        assert_eq!(window.end(), 4999);
    }

    #[test]
    fn test_no_range_is_never_clamped() {
        let total = 3 * CHUNK_MAX;
        let (window, ranged) = resolve_window(total, None, None, 0).unwrap();
        assert!(!ranged);
        assert_eq!(window.len(), total);
    }

    #[test]
    fn test_explicit_range() {
        let (window, ranged) = resolve_window(5000, range(Some(1000), Some(1999)), None, 0).unwrap();
        assert!(ranged);
        assert_eq!(window.len(), 1000);
        assert_eq!(window.content_range(), "bytes 1000-1999/5000");
    }

    #[test]
    fn test_open_ended_range() {
        let (window, _) = resolve_window(5000, range(Some(4000), None), None, 0).unwrap();
        assert_eq!(window.content_range(), "bytes 4000-4999/5000");
    }

    #[test]
    fn test_missing_start_means_from_beginning() {
        let (window, _) = resolve_window(5000, range(None, Some(99)), None, 0).unwrap();
        assert_eq!(window.content_range(), "bytes 0-99/5000");
    }

    #[test]
    fn test_end_past_total_is_trimmed() {
        let (window, _) = resolve_window(5000, range(Some(10), Some(999_999)), None, 0).unwrap();
        assert_eq!(window.end(), 4999);
        assert_eq!(window.len(), 4990);
    }

    #[test]
    fn test_ranged_window_clamped_to_chunk_max() {
        let total = 10 * CHUNK_MAX;
        let (window, _) = resolve_window(total, range(Some(5), None), None, 0).unwrap();
        assert_eq!(window.len(), CHUNK_MAX);
        assert_eq!(window.end(), 5 + CHUNK_MAX - 1);
    }

    #[test]
    fn test_window_of_exactly_chunk_max_untouched() {
        let total = 2 * CHUNK_MAX;
        let (window, _) = resolve_window(total, range(Some(0), Some(CHUNK_MAX - 1)), None, 0).unwrap();
        assert_eq!(window.len(), CHUNK_MAX);
    }

    #[test]
    fn test_clamp_matches_min_formula() {
        let total = 5 * CHUNK_MAX;
        for (a, b) in [(0, total - 1), (17, 17), (100, CHUNK_MAX + 500), (total - 10, total - 1)] {
            let (window, _) = resolve_window(total, range(Some(a), Some(b)), None, 0).unwrap();
            let expected_end = b.min(a + CHUNK_MAX - 1);
            assert_eq!(window.len(), expected_end - a + 1);
            assert_eq!(window.content_range(), format!("bytes {}-{}/{}", a, expected_end, total));
        }
    }

    #[test]
    fn test_start_hint_offset() {
        // 120 s de un video de 600 s y 6000 bytes
        assert_eq!(start_hint_offset(120, 6000, 600), Some(1200));
        // floor
        assert_eq!(start_hint_offset(1, 1000, 3), Some(333));
        assert_eq!(start_hint_offset(0, 1000, 3), None);
        // sin overflow con archivos grandes
        assert_eq!(start_hint_offset(u64::MAX / 2, 1 << 40, u64::MAX), Some((1 << 40) / 2 - 1));
    }

    #[test]
    fn test_start_hint_makes_request_ranged() {
        let (window, ranged) = resolve_window(6000, None, Some(120), 600).unwrap();
        assert!(ranged);
        assert_eq!(window.start(), 1200);
        assert_eq!(window.end(), 5999);
    }

    #[test]
    fn test_start_hint_replaces_requested_start() {
        let (window, _) = resolve_window(6000, range(Some(10), Some(3000)), Some(120), 600).unwrap();
        assert_eq!(window.content_range(), "bytes 1200-3000/6000");
    }

    #[test]
    fn test_start_hint_ignored_without_duration() {
        let (window, ranged) = resolve_window(6000, None, Some(120), 0).unwrap();
        assert!(!ranged);
        assert_eq!(window.len(), 6000);
    }

    #[test]
    fn test_start_past_end_of_file() {
        let err = resolve_window(5000, range(Some(5000), None), None, 0).unwrap_err();
        assert_eq!(err.total(), 5000);
    }

    #[test]
    fn test_start_after_end() {
        assert!(resolve_window(5000, range(Some(300), Some(200)), None, 0).is_err());
    }

    #[test]
    fn test_hint_beyond_duration() {
        assert!(resolve_window(5000, None, Some(200), 100).is_err());
    }

    #[test]
    fn test_ranged_request_on_empty_file() {
        assert!(resolve_window(0, range(Some(0), None), None, 0).is_err());

        let (window, ranged) = resolve_window(0, None, None, 0).unwrap();
        assert!(!ranged);
        assert!(window.is_empty());
    }
}
