//! # Cola de Conexiones
//! src/server/queue.rs
//!
//! Cola FIFO acotada y thread-safe entre el acceptor (productor) y los
//! workers (consumidores).
//!
//! - `push` bloquea mientras la cola está llena.
//! - `pop` bloquea mientras está vacía y el servidor sigue corriendo.
//! - Al apagar, `pop` retorna `None` ("no hay más trabajo") apenas la
//!   cola se vacía.
//!
//! Las esperas usan `wait_timeout`: cada consumidor bloqueado vuelve a
//! mirar la bandera de ejecución al menos una vez por `poll_interval`,
//! así que el apagado no depende de que un `notify` llegue a todos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Capacidad por defecto de la cola
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Cota superior del tiempo que tarda un worker bloqueado en ver el apagado
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cola acotada con `Mutex` + dos `Condvar` (no vacía / no llena)
pub struct ConnectionQueue<T> {
    /// Slots ocupados, en orden de llegada
    slots: Mutex<VecDeque<T>>,

    /// Se señala al insertar
    not_empty: Condvar,

    /// Se señala al retirar
    not_full: Condvar,

    /// Capacidad fija
    capacity: usize,

    /// Bandera global de ejecución (compartida con el acceptor y el handler de señales)
    running: Arc<AtomicBool>,

    poll_interval: Duration,
}

impl<T> ConnectionQueue<T> {
    /// Crea una cola de capacidad fija atada a la bandera `running`
    ///
    /// # Panics
    ///
    /// Si `capacity` es 0 (la configuración se valida antes de llegar aquí).
    pub fn new(capacity: usize, running: Arc<AtomicBool>) -> Self {
        Self::with_poll_interval(capacity, running, DEFAULT_POLL_INTERVAL)
    }

    /// Igual que `new` pero con otro intervalo de sondeo
    pub fn with_poll_interval(capacity: usize, running: Arc<AtomicBool>, poll_interval: Duration) -> Self {
        assert!(capacity > 0, "queue capacity must be >= 1");
        Self {
            slots: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
            running,
            poll_interval,
        }
    }

    /// Encola al final, bloqueando mientras la cola esté llena.
    ///
    /// Si el servidor se está apagando, devuelve el elemento al llamador
    /// (`Err(item)`) en vez de encolarlo.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut slots = self.lock();

        loop {
            if !self.is_running() {
                return Err(item);
            }
            if slots.len() < self.capacity {
                break;
            }
            slots = self
                .not_full
                .wait_timeout(slots, self.poll_interval)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        slots.push_back(item);
        drop(slots);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Retira el primer elemento, bloqueando mientras la cola esté vacía.
    ///
    /// Retorna `None` cuando el servidor se apaga y no queda nada por atender.
    pub fn pop(&self) -> Option<T> {
        let mut slots = self.lock();

        loop {
            if let Some(item) = slots.pop_front() {
                drop(slots);
                self.not_full.notify_one();
                return Some(item);
            }
            if !self.is_running() {
                return None;
            }
            slots = self
                .not_empty
                .wait_timeout(slots, self.poll_interval)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Baja la bandera de ejecución y despierta a todos los que esperan
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        // Tomar el lock evita que un waiter pierda la notificación entre
        // su chequeo de la bandera y el `wait`
        let _slots = self.lock();
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cantidad de conexiones en espera
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // El estado es un VecDeque: un panic a mitad de operación no lo deja inconsistente
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    fn running() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn test_fifo_order() {
        let queue = ConnectionQueue::new(10, running());
        for i in 0..10 {
            queue.push(i).unwrap();
        }
        assert!(queue.is_full());

        let popped: Vec<i32> = (0..10).map(|_| queue.pop().unwrap()).collect();
        assert_eq!(popped, (0..10).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_blocks_until_pop_frees_a_slot() {
        let queue = Arc::new(ConnectionQueue::new(8, running()));

        // 8 productores concurrentes llenan la cola
        let producers: Vec<_> = (0..8)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.push(i).unwrap())
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }
        assert!(queue.is_full());

        // El noveno push debe quedar bloqueado
        let (tx, rx) = mpsc::channel();
        let ninth = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                queue.push(99).unwrap();
                tx.send(()).unwrap();
            })
        };
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

        // Un pop libera un slot y el push termina
        assert!(queue.pop().is_some());
        rx.recv_timeout(Duration::from_secs(5)).expect("ninth push never completed");
        ninth.join().unwrap();
        assert_eq!(queue.len(), 8);
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(ConnectionQueue::new(4, running()));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!consumer.is_finished());

        queue.push(7).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn test_shutdown_wakes_blocked_consumers() {
        let flag = running();
        let queue = Arc::new(ConnectionQueue::<u32>::with_poll_interval(
            4,
            Arc::clone(&flag),
            Duration::from_millis(100),
        ));

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        queue.shutdown();

        for c in consumers {
            assert_eq!(c.join().unwrap(), None);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_flag_alone_is_observed_within_poll_interval() {
        // Sin notify: solo se baja la bandera
        let flag = running();
        let queue = Arc::new(ConnectionQueue::<u32>::with_poll_interval(
            2,
            Arc::clone(&flag),
            Duration::from_millis(100),
        ));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        flag.store(false, Ordering::SeqCst);

        assert_eq!(consumer.join().unwrap(), None);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_shutdown_drains_before_signaling_no_more_work() {
        let queue = ConnectionQueue::new(4, running());
        queue.push(1).unwrap();
        queue.push(2).unwrap();

        queue.shutdown();

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_push_after_shutdown_is_returned() {
        let queue = ConnectionQueue::new(4, running());
        queue.shutdown();
        assert_eq!(queue.push(5), Err(5));
    }

    #[test]
    fn test_blocked_push_released_by_shutdown() {
        let queue = Arc::new(ConnectionQueue::with_poll_interval(
            1,
            running(),
            Duration::from_millis(50),
        ));
        queue.push(1).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };

        thread::sleep(Duration::from_millis(100));
        queue.shutdown();
        assert_eq!(producer.join().unwrap(), Err(2));
    }

    #[test]
    fn test_capacity() {
        let queue = ConnectionQueue::<u8>::new(3, running());
        assert_eq!(queue.capacity(), 3);
        assert!(queue.is_empty());
        assert!(queue.is_running());
    }
}
