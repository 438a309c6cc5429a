//! Session-change notification.
//!
//! Two ways to listen, both fed by the same `notify` call:
//! - callbacks registered with `add_listener`, removable by id
//! - a broadcast channel for async consumers (`subscribe`)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use crate::api::models::User;

/// Handle returned by `add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

pub struct SessionNotifier {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
    tx: broadcast::Sender<Option<User>>,
}

impl SessionNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            tx,
        }
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(Option<&User>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns false if the id was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Deliver `user` to every listener and subscriber.
    pub fn notify(&self, user: Option<&User>) {
        // Callbacks run outside the lock so they may (un)register listeners.
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        tracing::debug!(
            listeners = snapshot.len(),
            authenticated = user.is_some(),
            "Session changed"
        );

        for listener in snapshot {
            (*listener)(user);
        }
        let _ = self.tx.send(user.cloned());
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionNotifier")
            .field("listeners", &self.listener_count())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
