use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{join_path, Subscription, NODE_PATH};
use crate::core::model::{ChangedEvent, Node};
use crate::core::Result;

pub type EventStream<E> = BoxStream<'static, E>;

/// Typed view over a [Subscription] for one kind of node.
///
/// Events are published to `node.<kind>.<identity>` and consumed from
/// `node.<kind>.*`.
pub struct EventChannel<E> {
    subscription: Arc<dyn Subscription>,
    path: String,
    _event: PhantomData<fn() -> E>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            subscription: self.subscription.clone(),
            path: self.path.clone(),
            _event: PhantomData,
        }
    }
}

impl<E: ChangedEvent> EventChannel<E> {
    pub fn new(subscription: Arc<dyn Subscription>) -> Self {
        let kind = <E::Node as Node>::KIND;
        Self {
            subscription,
            path: join_path(&[NODE_PATH, kind.as_ref()]),
            _event: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn pattern(&self) -> String {
        format!("{}.*", self.path)
    }

    /// Subscribes to every entity of this kind.
    ///
    /// A payload that fails to decode ends the returned stream and releases
    /// the underlying subscription.
    pub fn subscribe(&self, cancel: CancellationToken) -> Result<EventStream<E>> {
        let payloads = self.subscription.subscribe(&self.pattern(), cancel)?;
        let path = self.path.clone();
        let stream = stream::unfold(Some(payloads), move |payloads| {
            let path = path.clone();
            async move {
                let mut payloads = payloads?;
                let payload = payloads.next().await?;
                match serde_json::from_slice::<E>(&payload) {
                    Ok(event) => Some((event, Some(payloads))),
                    Err(error) => {
                        tracing::error!(%error, channel = %path, "failed to decode event");
                        None
                    }
                }
            }
        });

        Ok(stream.boxed())
    }

    pub fn notify(&self, event: &E) -> Result<()> {
        let payload = serde_json::to_vec(event)?;
        let segment = event.node().node_id().channel_segment();
        let channel = join_path(&[&self.path, &segment]);
        self.subscription.notify(Bytes::from(payload), &channel)
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscription.has_subscribers(&self.pattern())
    }
}
