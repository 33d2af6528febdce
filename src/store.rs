//! Bounded, shared mail store
//!
//! One [`MailStore`] backs a pair of servers: SMTP sessions add to it,
//! POP3 sessions read and delete from it. The store keeps messages in
//! arrival order and never holds more than its capacity; when full, the
//! oldest message is evicted in the same critical section that inserts
//! the new one.
//!
//! Every operation takes the store's lock, so mutations and reads are
//! linearizable. Indices are positional: deleting a message shifts the
//! ones behind it down by one.
//!
//! Observers (a CLI, a test) can follow changes through
//! [`MailStore::subscribe`] without the store knowing about them.

use crate::error::{Error, Result};
use crate::message::Message;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

const EVENT_BUFFER: usize = 64;

/// A change to the contents of a [`MailStore`].
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Added(Arc<Message>),
    /// Dropped to make room, oldest first.
    Evicted(Arc<Message>),
    Deleted(Arc<Message>),
    Cleared,
    CapacityChanged(usize),
}

#[derive(Debug)]
struct Inner {
    capacity: usize,
    messages: VecDeque<Arc<Message>>,
}

impl Inner {
    /// Drop messages from the front until the store fits its capacity.
    fn evict_overflow(&mut self) -> Vec<Arc<Message>> {
        let excess = self.messages.len().saturating_sub(self.capacity);
        self.messages.drain(..excess).collect()
    }
}

/// In-memory, fixed-capacity message store with FIFO eviction.
#[derive(Debug)]
pub struct MailStore {
    inner: Mutex<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl MailStore {
    /// Create a store holding at most `capacity` messages.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                messages: VecDeque::new(),
            }),
            events,
        }
    }

    /// Follow changes to the store.
    ///
    /// Slow receivers lose the oldest events rather than slowing the
    /// store down.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.messages.len()
    }

    pub async fn capacity(&self) -> usize {
        self.inner.lock().await.capacity
    }

    /// Append a message, evicting the oldest ones if the store is full.
    pub async fn add(&self, message: Message) {
        let message = Arc::new(message);
        let evicted = {
            let mut inner = self.inner.lock().await;
            inner.messages.push_back(Arc::clone(&message));
            inner.evict_overflow()
        };

        debug!(uid = message.uid(), evicted = evicted.len(), "message stored");
        self.notify(StoreEvent::Added(message));
        for old in evicted {
            self.notify(StoreEvent::Evicted(old));
        }
    }

    /// A point-in-time copy of every message, oldest first.
    pub async fn list(&self) -> Vec<Arc<Message>> {
        self.inner.lock().await.messages.iter().cloned().collect()
    }

    /// The message at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if `index` is past the end.
    pub async fn get(&self, index: usize) -> Result<Arc<Message>> {
        let inner = self.inner.lock().await;
        inner
            .messages
            .get(index)
            .cloned()
            .ok_or(Error::InvalidIndex {
                index,
                count: inner.messages.len(),
            })
    }

    /// Remove the message at `index`, shifting later messages down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if `index` is past the end.
    pub async fn delete(&self, index: usize) -> Result<()> {
        let removed = {
            let mut inner = self.inner.lock().await;
            let count = inner.messages.len();
            inner
                .messages
                .remove(index)
                .ok_or(Error::InvalidIndex { index, count })?
        };

        debug!(uid = removed.uid(), index, "message deleted");
        self.notify(StoreEvent::Deleted(removed));
        Ok(())
    }

    pub async fn clear(&self) {
        self.inner.lock().await.messages.clear();
        self.notify(StoreEvent::Cleared);
    }

    /// Change the capacity, evicting the oldest messages if the store no
    /// longer fits. A capacity of zero is ignored.
    pub async fn set_capacity(&self, capacity: usize) {
        if capacity == 0 {
            debug!("ignoring store capacity of zero");
            return;
        }

        let evicted = {
            let mut inner = self.inner.lock().await;
            inner.capacity = capacity;
            inner.evict_overflow()
        };

        debug!(capacity, evicted = evicted.len(), "store capacity changed");
        self.notify(StoreEvent::CapacityChanged(capacity));
        for old in evicted {
            self.notify(StoreEvent::Evicted(old));
        }
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is the common case.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_message(body: &str) -> Message {
        let mut message = Message::new();
        message.append(body);
        message.add("Sender", "test@localhost");
        message.add("Subject", "Test message");
        let id = format!("<{}@localhost>", message.uid());
        message.add("Message-Id", id);
        message
    }

    fn bodies(messages: &[Arc<Message>]) -> Vec<String> {
        messages.iter().map(|m| m.body().to_string()).collect()
    }

    #[tokio::test]
    async fn initial_store_is_empty() {
        let store = MailStore::new(10);
        assert_eq!(store.count().await, 0);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn add_actually_adds() {
        let store = MailStore::new(10);
        let message = create_message("Test message body");
        store.add(message.clone()).await;

        assert_eq!(store.count().await, 1);
        let retrieved = store.get(0).await.unwrap();
        assert_eq!(retrieved.uid(), message.uid());
        assert_eq!(retrieved.byte_stuff(), message.byte_stuff());
    }

    #[tokio::test]
    async fn overflow_keeps_newest_in_order() {
        let store = MailStore::new(10);
        for i in 0..12 {
            store.add(create_message(&format!("Message number {i}"))).await;
        }

        assert_eq!(store.count().await, 10);
        let expected: Vec<String> = (2..12).map(|i| format!("Message number {i}")).collect();
        assert_eq!(bodies(&store.list().await), expected);
    }

    #[tokio::test]
    async fn get_out_of_range_fails() {
        let store = MailStore::new(3);
        assert!(matches!(
            store.get(0).await,
            Err(Error::InvalidIndex { index: 0, count: 0 })
        ));

        store.add(create_message("one")).await;
        assert!(store.get(0).await.is_ok());
        assert!(matches!(
            store.get(1).await,
            Err(Error::InvalidIndex { index: 1, count: 1 })
        ));
    }

    #[tokio::test]
    async fn delete_shifts_later_messages() {
        let store = MailStore::new(5);
        for body in ["a", "b", "c"] {
            store.add(create_message(body)).await;
        }

        store.delete(1).await.unwrap();
        assert_eq!(bodies(&store.list().await), vec!["a", "c"]);
        assert_eq!(store.get(1).await.unwrap().body(), "c");
    }

    #[tokio::test]
    async fn delete_out_of_range_fails() {
        let store = MailStore::new(5);
        store.add(create_message("a")).await;

        assert!(matches!(
            store.delete(1).await,
            Err(Error::InvalidIndex { .. })
        ));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn clear_empties_store() {
        let store = MailStore::new(5);
        store.add(create_message("a")).await;
        store.add(create_message("b")).await;
        store.clear().await;
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn shrinking_capacity_evicts_oldest() {
        let store = MailStore::new(5);
        for body in ["a", "b", "c", "d"] {
            store.add(create_message(body)).await;
        }

        store.set_capacity(2).await;
        assert_eq!(store.capacity().await, 2);
        assert_eq!(bodies(&store.list().await), vec!["c", "d"]);

        store.set_capacity(4).await;
        store.add(create_message("e")).await;
        assert_eq!(bodies(&store.list().await), vec!["c", "d", "e"]);
    }

    #[tokio::test]
    async fn zero_capacity_is_ignored() {
        let store = MailStore::new(3);
        store.add(create_message("a")).await;
        store.set_capacity(0).await;

        assert_eq!(store.capacity().await, 3);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn list_is_a_snapshot() {
        let store = MailStore::new(5);
        store.add(create_message("a")).await;
        let snapshot = store.list().await;

        store.add(create_message("b")).await;
        store.delete(0).await.unwrap();

        assert_eq!(bodies(&snapshot), vec!["a"]);
        assert_eq!(bodies(&store.list().await), vec!["b"]);
    }

    #[tokio::test]
    async fn concurrent_adds_respect_capacity() {
        let store = Arc::new(MailStore::new(8));
        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.add(create_message(&i.to_string())).await;
                    assert!(store.count().await <= 8);
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }

        let messages = store.list().await;
        assert_eq!(messages.len(), 8);
        let mut uids: Vec<&str> = messages.iter().map(|m| m.uid()).collect();
        uids.sort_unstable();
        uids.dedup();
        assert_eq!(uids.len(), 8);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = MailStore::new(1);
        let mut events = store.subscribe();

        store.add(create_message("a")).await;
        store.add(create_message("b")).await;
        store.clear().await;

        assert!(matches!(events.recv().await, Ok(StoreEvent::Added(m)) if m.body() == "a"));
        assert!(matches!(events.recv().await, Ok(StoreEvent::Added(m)) if m.body() == "b"));
        assert!(matches!(events.recv().await, Ok(StoreEvent::Evicted(m)) if m.body() == "a"));
        assert!(matches!(events.recv().await, Ok(StoreEvent::Cleared)));
    }
}
