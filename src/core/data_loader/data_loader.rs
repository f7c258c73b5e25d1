use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::join_all;

use super::batch::{Batch, LoadFuture, LoadResult, SealedBatch};
use super::cache::KeyedCache;
use super::format_errors::default_format_errors;
use super::{LoadError, Loader};

type FormatErrors = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// Data loader.
///
/// Coalesces the keys requested within `delay` of each other into a single
/// call to the [Loader] and remembers every successful resolution for the
/// lifetime of the loader. One instance is meant to serve a single inbound
/// request and must be used from within a tokio runtime.
///
/// Reference: <https://github.com/facebook/dataloader>
pub struct DataLoader<K, L>
where
    K: Send + Sync + Hash + Eq + Clone + 'static,
    L: Loader<K>,
{
    inner: Arc<DataLoaderInner<K, L>>,
    delay: Duration,
    max_batch_size: usize,
    format_errors: FormatErrors,
}

struct DataLoaderInner<K, L>
where
    K: Send + Sync + Hash + Eq + Clone + 'static,
    L: Loader<K>,
{
    state: Mutex<State<K, L::Value, L::Error>>,
    loader: L,
}

struct State<K, V, E> {
    cache: KeyedCache<K, V>,
    batch: Option<Batch<K, V, E>>,
    next_batch_id: u64,
}

enum Action<K, V, E> {
    StartTimer(u64),
    Fetch(SealedBatch<K, V, E>),
    Wait,
}

impl<K, L> DataLoaderInner<K, L>
where
    K: Send + Sync + Hash + Eq + Clone + 'static,
    L: Loader<K>,
{
    fn state(&self) -> MutexGuard<'_, State<K, L::Value, L::Error>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seals the open batch if it is still the one identified by `id`.
    fn seal_if_open(&self, id: u64) -> Option<SealedBatch<K, L::Value, L::Error>> {
        let mut state = self.state();
        match state.batch.as_ref().map(Batch::id) {
            Some(current) if current == id => state.batch.take().map(Batch::seal),
            _ => None,
        }
    }

    async fn do_load(&self, batch: SealedBatch<K, L::Value, L::Error>) {
        let keys = batch.keys();
        tracing::debug!(batch = batch.id(), keys = keys.len(), "fetching batch");

        let values = self.loader.load(keys).await;

        let results: Vec<LoadResult<L::Value, L::Error>> = if values.len() != keys.len() {
            tracing::error!(
                batch = batch.id(),
                expected = keys.len(),
                actual = values.len(),
                "loader returned a mismatched number of results"
            );
            let error = LoadError::LengthMismatch { expected: keys.len(), actual: values.len() };
            vec![Err(error); keys.len()]
        } else {
            let mut state = self.state();
            for (key, value) in keys.iter().zip(values.iter()) {
                if let Ok(value) = value {
                    state.cache.insert(key.clone(), value.clone());
                }
            }
            drop(state);

            values.into_iter().map(|value| value.map_err(LoadError::Fetch)).collect()
        };

        batch.complete(results);
    }
}

impl<K, L> DataLoader<K, L>
where
    K: Send + Sync + Hash + Eq + Clone + 'static,
    L: Loader<K>,
{
    /// Use `Loader` to create a [DataLoader] with an empty cache.
    pub fn new(loader: L) -> Self {
        Self {
            inner: Arc::new(DataLoaderInner {
                state: Mutex::new(State {
                    cache: KeyedCache::default(),
                    batch: None,
                    next_batch_id: 0,
                }),
                loader,
            }),
            delay: Duration::from_millis(1),
            max_batch_size: 1000,
            format_errors: Arc::new(default_format_errors),
        }
    }

    /// Specify the delay time for loading data, the default is `1ms`.
    #[must_use]
    pub fn delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    /// Specify the max batch size for loading data, the default is `1000`.
    /// `0` removes the limit.
    ///
    /// If the keys waiting to be loaded reach the threshold, they are loaded
    /// immediately.
    #[must_use]
    pub fn max_batch_size(self, max_batch_size: usize) -> Self {
        Self { max_batch_size, ..self }
    }

    /// Replace the function used by [DataLoader::format_errors].
    #[must_use]
    pub fn with_format_errors<F>(self, format_errors: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        Self { format_errors: Arc::new(format_errors), ..self }
    }

    /// Get the loader.
    #[inline]
    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    /// Registers `key` and returns a handle for its value.
    ///
    /// Registration happens immediately, so several keys can be queued
    /// before awaiting any of them. A cached key resolves without joining a
    /// batch.
    ///
    /// # Panics
    ///
    /// Panics when a key has to be fetched outside of a tokio runtime, since
    /// the batch timer and the fetch run as spawned tasks.
    pub fn load(&self, key: K) -> LoadFuture<L::Value, L::Error> {
        let (action, handle) = {
            let mut state = self.inner.state();
            if let Some(value) = state.cache.get(&key) {
                return LoadFuture::ready(Ok(value.clone()));
            }

            let State { batch, next_batch_id, .. } = &mut *state;
            let batch = batch.get_or_insert_with(|| {
                *next_batch_id += 1;
                Batch::new(*next_batch_id)
            });

            let position = batch.key_index(key);
            let handle = batch.handle(position);
            let id = batch.id();
            let len = batch.len();

            let action = if self.max_batch_size > 0 && len >= self.max_batch_size {
                match state.batch.take() {
                    Some(batch) => Action::Fetch(batch.seal()),
                    None => Action::Wait,
                }
            } else if len == 1 && position == 0 {
                Action::StartTimer(id)
            } else {
                Action::Wait
            };

            (action, handle)
        };

        match action {
            Action::Fetch(batch) => {
                tracing::debug!(batch = batch.id(), "batch is full");
                let inner = self.inner.clone();
                tokio::spawn(async move { inner.do_load(batch).await });
            }
            Action::StartTimer(id) => {
                let inner = self.inner.clone();
                let delay = self.delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // a full batch may have been sealed already
                    if let Some(batch) = inner.seal_if_open(id) {
                        inner.do_load(batch).await
                    }
                });
            }
            Action::Wait => {}
        }

        handle
    }

    /// Use this `DataLoader` load a data.
    pub async fn load_one(&self, key: K) -> LoadResult<L::Value, L::Error> {
        self.load(key).await
    }

    /// Use this `DataLoader` to load some data. Results are aligned with
    /// `keys`.
    pub async fn load_many<I>(&self, keys: I) -> Vec<LoadResult<L::Value, L::Error>>
    where
        I: IntoIterator<Item = K>,
    {
        let handles: Vec<_> = keys.into_iter().map(|key| self.load(key)).collect();
        join_all(handles).await
    }

    /// Feed a value into the cache unless `key` is already present. Returns
    /// whether the value was stored.
    pub fn prime(&self, key: K, value: L::Value) -> bool {
        self.inner.state().cache.prime(key, value)
    }

    /// Removes `key` from the cache.
    pub fn clear(&self, key: &K) {
        self.inner.state().cache.remove(key);
    }

    /// Combines the errors of several loads into one message, or `None` if
    /// there are none.
    pub fn format_errors<'a, I>(&self, errors: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a LoadError<L::Error>>,
        L::Error: Display,
    {
        let messages: Vec<String> = errors.into_iter().map(ToString::to_string).collect();
        if messages.is_empty() {
            None
        } else {
            Some((self.format_errors)(&messages))
        }
    }
}
