use std::hash::Hash;

/// Trait for batch loading.
///
/// Implementations receive every key of one sealed batch, in first-seen
/// order, and must return exactly one entry per key at the same position.
/// `Ok(None)` means the key has no value and is not treated as an error.
#[async_trait::async_trait]
pub trait Loader<K: Send + Sync + Hash + Eq + Clone + 'static>: Send + Sync + 'static {
    /// type of value.
    type Value: Send + Sync + Clone + 'static;

    /// Type of error.
    type Error: Send + Sync + Clone + 'static;

    /// Load the data set specified by the `keys`.
    async fn load(&self, keys: &[K]) -> Vec<Result<Option<Self::Value>, Self::Error>>;
}
