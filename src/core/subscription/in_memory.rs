use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::channel::{join_path, matches, validate};
use super::{PayloadStream, Subscription};
use crate::core::{Error, Result};

pub const DEFAULT_BUFFER: usize = 64;

struct Observer {
    channel: String,
    sender: mpsc::Sender<Bytes>,
}

type Observers = Arc<RwLock<HashMap<Uuid, Observer>>>;

/// Process-wide, in-memory [Subscription].
///
/// Every subscriber owns a bounded queue of `buffer` payloads. Publishing
/// never waits for a subscriber: when a queue is full the payload is
/// dropped for that subscriber only and a warning is logged.
#[derive(Clone)]
pub struct InMemorySubscription {
    observers: Observers,
    buffer: usize,
}

impl Default for InMemorySubscription {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl InMemorySubscription {
    pub fn new(buffer: usize) -> Self {
        Self { observers: Arc::new(RwLock::new(HashMap::new())), buffer: buffer.max(1) }
    }

    fn unsubscribe(observers: &Observers, id: &Uuid) {
        let removed = observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(observer) = removed {
            tracing::debug!(subscriber = %id, channel = %observer.channel, "unsubscribed");
        }
    }
}

impl Subscription for InMemorySubscription {
    fn notify(&self, payload: Bytes, channel: &str) -> Result<()> {
        let channel = join_path(&[channel]);
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);

        for (id, observer) in observers.iter() {
            match matches(&observer.channel, &channel) {
                Ok(true) => match observer.sender.try_send(payload.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => tracing::warn!(
                        subscriber = %id,
                        channel = %channel,
                        "subscriber is not keeping up, dropping notification"
                    ),
                    // the watcher removes it shortly
                    Err(TrySendError::Closed(_)) => {}
                },
                Ok(false) => {}
                Err(error) => tracing::warn!(
                    %error,
                    pattern = %observer.channel,
                    channel = %channel,
                    "failed to match glob pattern"
                ),
            }
        }

        Ok(())
    }

    fn subscribe(&self, channel: &str, cancel: CancellationToken) -> Result<PayloadStream> {
        let channel = join_path(&[channel]);
        validate(&channel)
            .map_err(|source| Error::InvalidPattern { pattern: channel.clone(), source })?;

        let id = Uuid::new_v4();
        let (sender, mut receiver) = mpsc::channel(self.buffer);
        let watcher = sender.clone();

        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Observer { channel: channel.clone(), sender });
        tracing::debug!(subscriber = %id, channel = %channel, "subscribed");

        let observers = self.observers.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = watcher.closed() => {}
            }
            Self::unsubscribe(&observers, &id);
        });

        Ok(futures_util::stream::poll_fn(move |cx| receiver.poll_recv(cx)).boxed())
    }

    fn has_subscribers(&self, channel: &str) -> bool {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        if channel.is_empty() {
            return !observers.is_empty();
        }

        let channel = join_path(&[channel]);
        observers.values().any(|observer| {
            matches(&observer.channel, &channel).unwrap_or_else(|error| {
                tracing::warn!(
                    %error,
                    pattern = %observer.channel,
                    channel = %channel,
                    "failed to match glob pattern"
                );
                false
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_notify_reaches_matching_subscriber_once() {
        let bus = InMemorySubscription::default();
        let cancel = CancellationToken::new();
        let mut peers = bus.subscribe("node.Peer.*", cancel.clone()).unwrap();
        let mut servers = bus.subscribe("node.Server.*", cancel.clone()).unwrap();

        bus.notify(Bytes::from_static(b"hello"), "node.Peer.X").unwrap();
        cancel.cancel();

        assert_eq!(peers.next().await, Some(Bytes::from_static(b"hello")));
        assert_eq!(peers.next().await, None);
        assert_eq!(servers.next().await, None);
    }

    #[tokio::test]
    async fn test_pattern_is_case_insensitive() {
        let bus = InMemorySubscription::default();
        let cancel = CancellationToken::new();
        let mut users = bus.subscribe("node.User.*", cancel.clone()).unwrap();

        bus.notify(Bytes::from_static(b"1"), "node.user.AbCdEf==").unwrap();
        bus.notify(Bytes::from_static(b"2"), "node.Server.AbCdEf==").unwrap();
        cancel.cancel();

        assert_eq!(users.next().await, Some(Bytes::from_static(b"1")));
        assert_eq!(users.next().await, None);
    }

    #[tokio::test]
    async fn test_order_per_subscriber() {
        let bus = InMemorySubscription::default();
        let cancel = CancellationToken::new();
        let stream = bus.subscribe("a.*", cancel.clone()).unwrap();

        for i in 0..10u8 {
            bus.notify(Bytes::from(vec![i]), "a.b").unwrap();
        }
        cancel.cancel();

        let received: Vec<Bytes> = stream.collect().await;
        let expected: Vec<Bytes> = (0..10u8).map(|i| Bytes::from(vec![i])).collect();
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_full_subscriber_does_not_block_others() {
        let bus = InMemorySubscription::new(1);
        let cancel = CancellationToken::new();
        let mut slow = bus.subscribe("a.*", cancel.clone()).unwrap();
        let mut fast = bus.subscribe("a.*", cancel.clone()).unwrap();

        bus.notify(Bytes::from_static(b"1"), "a.b").unwrap();
        assert_eq!(fast.next().await, Some(Bytes::from_static(b"1")));
        bus.notify(Bytes::from_static(b"2"), "a.b").unwrap();
        assert_eq!(fast.next().await, Some(Bytes::from_static(b"2")));
        cancel.cancel();

        // "2" was dropped for the slow subscriber
        assert_eq!(slow.next().await, Some(Bytes::from_static(b"1")));
        assert_eq!(slow.next().await, None);
    }

    #[tokio::test]
    async fn test_cancel_deregisters() {
        let bus = InMemorySubscription::default();
        let cancel = CancellationToken::new();
        let _stream = bus.subscribe("node.server.*", cancel.clone()).unwrap();

        assert!(bus.has_subscribers("node.server.*"));
        assert!(bus.has_subscribers(""));
        assert!(!bus.has_subscribers("node.peer.*"));

        cancel.cancel();
        settle().await;

        assert!(!bus.has_subscribers("node.server.*"));
        assert!(!bus.has_subscribers(""));
    }

    #[tokio::test]
    async fn test_dropped_stream_deregisters() {
        let bus = InMemorySubscription::default();
        let stream = bus.subscribe("node.server.*", CancellationToken::new()).unwrap();
        drop(stream);
        settle().await;

        assert!(!bus.has_subscribers(""));
    }

    #[tokio::test]
    async fn test_malformed_pattern_is_rejected() {
        let bus = InMemorySubscription::default();
        let actual = bus.subscribe("node.[", CancellationToken::new());

        assert!(matches!(actual, Err(Error::InvalidPattern { .. })));
        assert!(!bus.has_subscribers(""));
    }
}
