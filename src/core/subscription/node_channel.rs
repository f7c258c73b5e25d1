use std::sync::Arc;

use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::{EventChannel, Subscription};
use crate::core::model::{NodeChangedEvent, PeerChangedEvent, ServerChangedEvent, UserChangedEvent};
use crate::core::Result;

pub type NodeEventStream = BoxStream<'static, NodeChangedEvent>;

/// Merges `sources` into one stream that ends after every source ended.
pub fn fan_in<S>(sources: impl IntoIterator<Item = S>) -> NodeEventStream
where
    S: Stream<Item = NodeChangedEvent> + Send + Unpin + 'static,
{
    stream::select_all(sources).boxed()
}

/// Change events of every kind of node.
#[derive(Clone)]
pub struct NodeChannel {
    users: EventChannel<UserChangedEvent>,
    servers: EventChannel<ServerChangedEvent>,
    peers: EventChannel<PeerChangedEvent>,
}

impl NodeChannel {
    pub fn new(subscription: Arc<dyn Subscription>) -> Self {
        Self {
            users: EventChannel::new(subscription.clone()),
            servers: EventChannel::new(subscription.clone()),
            peers: EventChannel::new(subscription),
        }
    }

    pub fn users(&self) -> &EventChannel<UserChangedEvent> {
        &self.users
    }

    pub fn servers(&self) -> &EventChannel<ServerChangedEvent> {
        &self.servers
    }

    pub fn peers(&self) -> &EventChannel<PeerChangedEvent> {
        &self.peers
    }

    pub fn subscribe(&self, cancel: CancellationToken) -> Result<NodeEventStream> {
        let users = self.users.subscribe(cancel.clone())?.map(NodeChangedEvent::from);
        let servers = self.servers.subscribe(cancel.clone())?.map(NodeChangedEvent::from);
        let peers = self.peers.subscribe(cancel)?.map(NodeChangedEvent::from);

        Ok(fan_in([users.boxed(), servers.boxed(), peers.boxed()]))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::core::model::{IdKind, User, UserAction};
    use crate::core::subscription::InMemorySubscription;

    fn user(id: &str) -> NodeChangedEvent {
        NodeChangedEvent::User(UserChangedEvent {
            node: User { id: id.to_string(), email: format!("{id}@example.com") },
            action: UserAction::Created,
        })
    }

    fn source() -> (mpsc::UnboundedSender<NodeChangedEvent>, NodeEventStream) {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let stream = stream::poll_fn(move |cx| receiver.poll_recv(cx)).boxed();
        (sender, stream)
    }

    #[tokio::test]
    async fn test_fan_in_ends_after_all_sources() {
        let (a, a_stream) = source();
        let (b, b_stream) = source();
        let (c, c_stream) = source();
        let mut merged = fan_in([a_stream, b_stream, c_stream]);

        a.send(user("1")).unwrap();
        drop(a);
        assert_eq!(merged.next().await, Some(user("1")));

        b.send(user("2")).unwrap();
        drop(b);
        assert_eq!(merged.next().await, Some(user("2")));

        c.send(user("3")).unwrap();
        assert_eq!(merged.next().await, Some(user("3")));
        drop(c);
        assert_eq!(merged.next().await, None);
    }

    #[tokio::test]
    async fn test_fan_in_without_sources() {
        let mut merged = fan_in(Vec::<NodeEventStream>::new());
        assert_eq!(merged.next().await, None);
    }

    #[tokio::test]
    async fn test_node_channel_tags_kind() {
        let bus: Arc<dyn Subscription> = Arc::new(InMemorySubscription::default());
        let nodes = NodeChannel::new(bus);
        let cancel = CancellationToken::new();
        let mut stream = nodes.subscribe(cancel.clone()).unwrap();

        let NodeChangedEvent::User(event) = user("u1") else { unreachable!() };
        nodes.users().notify(&event).unwrap();

        let received = stream.next().await.unwrap();
        assert_eq!(received.kind(), IdKind::User);
        assert_eq!(received, user("u1"));

        cancel.cancel();
        assert_eq!(stream.next().await, None);
    }
}
