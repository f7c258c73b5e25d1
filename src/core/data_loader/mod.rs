mod batch;
mod cache;
mod data_loader;
mod format_errors;
mod loader;

pub use batch::{LoadFuture, LoadResult};
pub use cache::KeyedCache;
pub use data_loader::DataLoader;
pub use format_errors::default_format_errors;
pub use loader::Loader;

/// Failure of a single key of a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError<E> {
    /// The loader reported an error for this key.
    #[error("{0}")]
    Fetch(E),

    #[error("loader returned {actual} results for {expected} keys")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("batch was dropped before it was fetched")]
    Aborted,
}
