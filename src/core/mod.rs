pub mod config;
pub mod data_loader;
pub mod env;
pub mod error;
pub mod interface_stats;
pub mod loaders;
pub mod model;
pub mod subscription;
pub mod tracing;

use std::borrow::Cow;

pub use error::{Error, Result};

/// Read-only access to environment variables.
pub trait EnvIO: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<Cow<'_, str>>;
}
