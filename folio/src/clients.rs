//! Client messaging channel.
//!
//! Pages controlled by the proxy connect to a [`Clients`] registry. They send
//! [`ClientMessage`] commands (skip waiting, clear caches) and receive
//! [`ClientNotification`] broadcasts. Both have a JSON wire form tagged by
//! `type`:
//!
//! ```
//! use folio::clients::{ClientMessage, ClientNotification};
//!
//! let message: ClientMessage = serde_json::from_str(r#"{"type":"CLEAR_CACHE"}"#).unwrap();
//! assert_eq!(message, ClientMessage::ClearCache);
//!
//! let wire = serde_json::to_string(&ClientNotification::CacheCleared).unwrap();
//! assert_eq!(wire, r#"{"type":"CACHE_CLEARED"}"#);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, trace};

const CHANNEL_CAPACITY: usize = 16;

/// Command sent by a client page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Activate a waiting installation now.
    SkipWaiting,
    /// Delete every partition and tell every client.
    ClearCache,
}

/// Broadcast sent to every connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientNotification {
    /// All partitions were deleted.
    CacheCleared,
    /// A new proxy instance took control of the client.
    ControllerChanged,
}

#[derive(Debug)]
struct ClientsInner {
    sender: broadcast::Sender<ClientNotification>,
    connected: DashMap<u64, Arc<AtomicBool>>,
    next_id: AtomicU64,
}

/// Registry of connected client pages.
///
/// Clones share the same registry.
#[derive(Debug, Clone)]
pub struct Clients {
    inner: Arc<ClientsInner>,
}

impl Default for Clients {
    fn default() -> Self {
        Self::new()
    }
}

impl Clients {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Clients {
            inner: Arc::new(ClientsInner {
                sender,
                connected: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Connects a new, not yet controlled, client.
    pub fn connect(&self) -> ClientHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let controlled = Arc::new(AtomicBool::new(false));
        self.inner.connected.insert(id, controlled.clone());
        trace!(client = id, "client connected");
        ClientHandle {
            id,
            controlled,
            receiver: self.inner.sender.subscribe(),
            clients: self.inner.clone(),
        }
    }

    /// Takes control of every connected client.
    ///
    /// Returns the number of clients that were not controlled before. Every
    /// connected client is told the controller changed.
    pub fn claim(&self) -> usize {
        let claimed = self
            .inner
            .connected
            .iter()
            .filter(|client| !client.swap(true, Ordering::SeqCst))
            .count();
        self.notify(ClientNotification::ControllerChanged);
        debug!(claimed, "clients claimed");
        claimed
    }

    /// Broadcasts a notification, returning how many clients will receive it.
    pub fn notify(&self, notification: ClientNotification) -> usize {
        self.inner.sender.send(notification).unwrap_or(0)
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.inner.connected.len()
    }

    /// `true` when no client is connected.
    pub fn is_empty(&self) -> bool {
        self.inner.connected.is_empty()
    }
}

/// One connected client page. Dropping it disconnects the client.
#[derive(Debug)]
pub struct ClientHandle {
    id: u64,
    controlled: Arc<AtomicBool>,
    receiver: broadcast::Receiver<ClientNotification>,
    clients: Arc<ClientsInner>,
}

impl ClientHandle {
    /// Registry-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `true` once the proxy has claimed this client.
    pub fn is_controlled(&self) -> bool {
        self.controlled.load(Ordering::SeqCst)
    }

    /// Waits for the next notification.
    ///
    /// Returns `None` once the registry is gone. Notifications missed because
    /// the client fell behind are skipped.
    pub async fn recv(&mut self) -> Option<ClientNotification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(client = self.id, skipped, "client lagged behind notifications");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns a pending notification without waiting.
    pub fn try_recv(&mut self) -> Option<ClientNotification> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) => return Some(notification),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        self.clients.connected.remove(&self.id);
        trace!(client = self.id, "client disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_screaming_type_tags() {
        assert_eq!(
            serde_json::to_string(&ClientMessage::SkipWaiting).unwrap(),
            r#"{"type":"SKIP_WAITING"}"#
        );
        assert_eq!(
            serde_json::from_str::<ClientNotification>(r#"{"type":"CONTROLLER_CHANGED"}"#)
                .unwrap(),
            ClientNotification::ControllerChanged
        );
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"RELOAD"}"#).is_err());
    }

    #[test]
    fn claim_counts_only_new_clients() {
        let clients = Clients::new();
        let mut first = clients.connect();
        assert_eq!(clients.claim(), 1);
        assert!(first.is_controlled());

        let second = clients.connect();
        assert!(!second.is_controlled());
        assert_eq!(clients.claim(), 1);
        assert!(second.is_controlled());

        assert_eq!(first.try_recv(), Some(ClientNotification::ControllerChanged));
        assert_eq!(first.try_recv(), Some(ClientNotification::ControllerChanged));
        assert_eq!(first.try_recv(), None);
    }

    #[test]
    fn dropping_handle_disconnects() {
        let clients = Clients::new();
        let handle = clients.connect();
        assert_eq!(clients.len(), 1);
        drop(handle);
        assert!(clients.is_empty());
        assert_eq!(clients.notify(ClientNotification::CacheCleared), 0);
    }
}
