//! # Buffers acotados
//! src/http/bounded.rs
//!
//! Contenedor de bytes con capacidad máxima fija. Lo que no cabe se
//! descarta, pero queda registrado en `is_truncated()` para que quien
//! consuma el buffer pueda decidir qué hacer (loguear, rechazar, etc.).

/// Buffer de bytes con tope de capacidad y marca de truncamiento
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedBuf {
    data: Vec<u8>,
    capacity: usize,
    truncated: bool,
}

impl BoundedBuf {
    /// Crea un buffer vacío que nunca superará `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
            truncated: false,
        }
    }

    /// Crea un buffer a partir de un slice, truncando si excede la capacidad
    ///
    /// # Ejemplo
    /// ```
    /// use ott_server::http::BoundedBuf;
    ///
    /// let buf = BoundedBuf::from_slice(b"hello world", 5);
    /// assert_eq!(buf.as_bytes(), b"hello");
    /// assert!(buf.is_truncated());
    /// ```
    pub fn from_slice(bytes: &[u8], capacity: usize) -> Self {
        let mut buf = Self::new(capacity);
        buf.extend(bytes);
        buf
    }

    /// Agrega bytes; retorna cuántos se aceptaron
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        let room = self.capacity - self.data.len();
        let accepted = bytes.len().min(room);
        self.data.extend_from_slice(&bytes[..accepted]);
        if accepted < bytes.len() {
            self.truncated = true;
        }
        accepted
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` si alguna vez se descartaron bytes por falta de espacio
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_without_truncation() {
        let buf = BoundedBuf::from_slice(b"abc", 8);
        assert_eq!(buf.as_bytes(), b"abc");
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_truncated());
    }

    #[test]
    fn test_extend_reports_accepted_bytes() {
        let mut buf = BoundedBuf::new(4);
        assert_eq!(buf.extend(b"ab"), 2);
        assert_eq!(buf.extend(b"cdef"), 2);
        assert_eq!(buf.extend(b"g"), 0);
        assert_eq!(buf.as_bytes(), b"abcd");
        assert!(buf.is_truncated());
    }

    #[test]
    fn test_exact_capacity_is_not_truncation() {
        let buf = BoundedBuf::from_slice(b"abcd", 4);
        assert!(!buf.is_truncated());
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn test_zero_capacity() {
        let buf = BoundedBuf::from_slice(b"x", 0);
        assert!(buf.is_empty());
        assert!(buf.is_truncated());
    }
}
