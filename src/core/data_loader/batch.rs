use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::watch;

use super::LoadError;

/// Outcome of one key of a batch.
pub type LoadResult<V, E> = Result<Option<V>, LoadError<E>>;

type Results<V, E> = Arc<Vec<LoadResult<V, E>>>;

/// Keys collected during one coalescing window.
///
/// Keys keep their first-seen order and a repeated key folds into its
/// existing position. A batch stays open until it is [sealed](Batch::seal);
/// sealing consumes it, so nothing can join a batch that is being fetched.
pub struct Batch<K, V, E> {
    id: u64,
    keys: Vec<K>,
    positions: HashMap<K, usize>,
    done: watch::Sender<Option<Results<V, E>>>,
}

impl<K: Clone + Eq + Hash, V, E> Batch<K, V, E> {
    pub fn new(id: u64) -> Self {
        let (done, _) = watch::channel(None);
        Self { id, keys: Vec::new(), positions: HashMap::new(), done }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns the position of `key`, appending it if this batch has not
    /// seen it yet.
    pub fn key_index(&mut self, key: K) -> usize {
        if let Some(position) = self.positions.get(&key) {
            return *position;
        }
        let position = self.keys.len();
        self.positions.insert(key.clone(), position);
        self.keys.push(key);
        position
    }

    /// Creates a handle that resolves to the result at `position` once the
    /// batch completes.
    pub fn handle(&self, position: usize) -> LoadFuture<V, E>
    where
        V: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        let mut done = self.done.subscribe();
        LoadFuture::pending(async move {
            let results = match done.wait_for(Option::is_some).await {
                Ok(guard) => guard.clone(),
                Err(_) => None,
            };
            results
                .and_then(|results| results.get(position).cloned())
                .unwrap_or(Err(LoadError::Aborted))
        })
    }

    pub fn seal(self) -> SealedBatch<K, V, E> {
        SealedBatch { id: self.id, keys: self.keys, done: self.done }
    }
}

/// A batch that no longer accepts keys and is waiting for its fetch.
///
/// Dropping it without calling [complete](SealedBatch::complete) releases
/// every waiter with [LoadError::Aborted].
pub struct SealedBatch<K, V, E> {
    id: u64,
    keys: Vec<K>,
    done: watch::Sender<Option<Results<V, E>>>,
}

impl<K, V, E> SealedBatch<K, V, E> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Releases all waiters at once. `results` must be aligned with
    /// [keys](SealedBatch::keys).
    pub fn complete(self, results: Vec<LoadResult<V, E>>) {
        debug_assert_eq!(results.len(), self.keys.len());
        self.done.send_replace(Some(Arc::new(results)));
    }
}

/// Deferred result of a single [load](super::DataLoader::load).
#[must_use = "a load does nothing for the caller unless awaited"]
pub struct LoadFuture<V, E> {
    inner: BoxFuture<'static, LoadResult<V, E>>,
}

impl<V: Send + 'static, E: Send + 'static> LoadFuture<V, E> {
    pub(super) fn ready(result: LoadResult<V, E>) -> Self {
        Self { inner: futures_util::future::ready(result).boxed() }
    }

    fn pending<F>(future: F) -> Self
    where
        F: Future<Output = LoadResult<V, E>> + Send + 'static,
    {
        Self { inner: future.boxed() }
    }
}

impl<V, E> Future for LoadFuture<V, E> {
    type Output = LoadResult<V, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}
