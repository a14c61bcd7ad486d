use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;

struct Connection {
    id: u64,
    tx: mpsc::UnboundedSender<String>,
}

/// Registry of live WebSocket connections, keyed by user id.
/// A user may hold several connections (multiple tabs/devices).
#[derive(Clone)]
pub struct NotificationHub {
    connections: Arc<DashMap<i32, Vec<Connection>>>,
    next_conn_id: Arc<AtomicU64>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self, user_id: i32) -> (u64, mpsc::UnboundedReceiver<String>) {
        let id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .entry(user_id)
            .or_default()
            .push(Connection { id, tx });
        (id, rx)
    }

    pub fn unsubscribe(&self, user_id: i32, conn_id: u64) {
        self.retain_connections(user_id, |conn| conn.id != conn_id);
    }

    pub fn send_to_user(&self, user_id: i32, message: &str) {
        // Closed channels are dropped along the way.
        self.retain_connections(user_id, |conn| conn.tx.send(message.to_string()).is_ok());
    }

    fn retain_connections(&self, user_id: i32, keep: impl FnMut(&Connection) -> bool) {
        if let Some(mut conns) = self.connections.get_mut(&user_id) {
            conns.retain(keep);
            if conns.is_empty() {
                drop(conns);
                self.connections.remove(&user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_to_every_connection_of_a_user() {
        let hub = NotificationHub::new();
        let (_, mut rx1) = hub.subscribe(1);
        let (_, mut rx2) = hub.subscribe(1);

        hub.send_to_user(1, "ping");

        assert_eq!(rx1.try_recv().unwrap(), "ping");
        assert_eq!(rx2.try_recv().unwrap(), "ping");
    }

    #[test]
    fn does_not_deliver_to_other_users() {
        let hub = NotificationHub::new();
        let (_, mut rx) = hub.subscribe(1);

        hub.send_to_user(2, "ping");

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unsubscribed_connection_receives_nothing() {
        let hub = NotificationHub::new();
        let (conn_id, mut rx) = hub.subscribe(1);
        hub.unsubscribe(1, conn_id);

        hub.send_to_user(1, "ping");

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_pruned_on_send() {
        let hub = NotificationHub::new();
        let (_, rx) = hub.subscribe(1);
        drop(rx);

        // First send notices the closed channel and prunes it.
        hub.send_to_user(1, "ping");
        assert!(hub.connections.get(&1).is_none());
    }
}
