//! Observer registries for stream listeners.
//!
//! [`ListenerRegistry`] holds independent listeners and notifies each of
//! them in registration order. A listener that returns an error is
//! logged and skipped for that notification; the remaining listeners
//! still run. Registration returns an opaque [`ListenerHandle`] used to
//! deregister explicitly.

use tracing::warn;

/// What a listener returns; an `Err` is logged and isolated to that
/// listener.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Opaque token identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

type Callback<A> = Box<dyn FnMut(&A) -> ListenerResult + Send>;

/// A set of independent listeners invoked per notification.
pub struct ListenerRegistry<A> {
    next_id: u64,
    listeners: Vec<(u64, Callback<A>)>,
}

impl<A> Default for ListenerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> ListenerRegistry<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener and returns its deregistration handle.
    pub fn register<F>(&mut self, listener: F) -> ListenerHandle
    where
        F: FnMut(&A) -> ListenerResult + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));

        ListenerHandle(id)
    }

    /// Removes the listener behind `handle`; returns whether it existed.
    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != handle.0);

        before != self.listeners.len()
    }

    /// Invokes every listener with `arg`, isolating failures per listener.
    pub fn notify(&mut self, arg: &A) {
        for (id, listener) in &mut self.listeners {
            if let Err(e) = listener(arg) {
                warn!(listener_id = *id, error = %e, "Listener failed");
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
