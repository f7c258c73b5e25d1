use std::borrow::Cow;
use std::collections::HashMap;

use super::EnvIO;

/// Snapshot of the process environment.
#[derive(Clone)]
pub struct EnvNative {
    vars: HashMap<String, String>,
}

impl EnvIO for EnvNative {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        self.vars.get(key).map(Cow::from)
    }
}

impl EnvNative {
    pub fn init() -> Self {
        Self { vars: std::env::vars().collect() }
    }

    /// Loads `.env` from the working directory (or a parent) into the
    /// process environment first. A missing file is not an error.
    pub fn init_with_dotenv() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
            Err(error) if error.not_found() => {}
            Err(error) => tracing::warn!(%error, "failed to load environment file"),
        }
        Self::init()
    }
}
