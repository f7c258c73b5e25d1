mod channel;
mod event_channel;
mod in_memory;
mod node_channel;

use bytes::Bytes;
pub use channel::{join_path, matches, validate, PatternError};
pub use event_channel::{EventChannel, EventStream};
use futures_util::stream::BoxStream;
pub use in_memory::{InMemorySubscription, DEFAULT_BUFFER};
pub use node_channel::{fan_in, NodeChannel, NodeEventStream};
use tokio_util::sync::CancellationToken;

use crate::core::Result;

/// Reserved top-level segment of every entity channel.
pub const NODE_PATH: &str = "node";

/// Raw payloads delivered to one subscriber.
pub type PayloadStream = BoxStream<'static, Bytes>;

/// Publish/subscribe transport over dot-delimited channel names.
///
/// Implementations must be used from within a tokio runtime.
pub trait Subscription: Send + Sync + 'static {
    /// Delivers `payload` to every subscriber whose pattern matches
    /// `channel`.
    fn notify(&self, payload: Bytes, channel: &str) -> Result<()>;

    /// Registers a subscriber for `pattern`. The returned stream ends once
    /// `cancel` fires; dropping it unsubscribes as well.
    fn subscribe(&self, pattern: &str, cancel: CancellationToken) -> Result<PayloadStream>;

    /// Reports whether any registered pattern matches `channel`. An empty
    /// `channel` asks whether there are any subscribers at all.
    fn has_subscribers(&self, channel: &str) -> bool;
}
