use std::str::FromStr;
use std::time::Duration;

use derive_setters::Setters;

use super::{EnvIO, Error, Result};

pub const DEFAULT_LOADER_DELAY: Duration = Duration::from_millis(1);
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 64;
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, Default, PartialEq, Eq, Setters)]
pub struct Config {
    pub loader: LoaderConfig,
    pub subscription: SubscriptionConfig,
    pub stats: StatsConfig,
}

/// Batching window of the per-request loaders.
#[derive(Clone, Debug, PartialEq, Eq, Setters)]
pub struct LoaderConfig {
    pub delay: Duration,
    /// `0` disables the limit.
    pub max_batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { delay: DEFAULT_LOADER_DELAY, max_batch_size: DEFAULT_MAX_BATCH_SIZE }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Setters)]
pub struct SubscriptionConfig {
    /// Payloads queued per subscriber before new ones are dropped.
    pub buffer: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self { buffer: DEFAULT_SUBSCRIPTION_BUFFER }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Setters)]
pub struct StatsConfig {
    pub interval: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_STATS_INTERVAL }
    }
}

impl Config {
    /// Reads overrides of the defaults from `<PREFIX>_LOADER_DELAY_MS`,
    /// `<PREFIX>_LOADER_MAX_BATCH_SIZE`, `<PREFIX>_SUBSCRIPTION_BUFFER` and
    /// `<PREFIX>_STATS_INTERVAL_MS`.
    pub fn from_env(env: &impl EnvIO, prefix: &str) -> Result<Self> {
        let prefix = normalize_prefix(prefix);
        let mut config = Config::default();

        if let Some(ms) = read::<u64>(env, &prefix, "LOADER_DELAY_MS")? {
            config.loader.delay = Duration::from_millis(ms);
        }
        if let Some(size) = read(env, &prefix, "LOADER_MAX_BATCH_SIZE")? {
            config.loader.max_batch_size = size;
        }
        if let Some(buffer) = read(env, &prefix, "SUBSCRIPTION_BUFFER")? {
            config.subscription.buffer = buffer;
        }
        if let Some(ms) = read::<u64>(env, &prefix, "STATS_INTERVAL_MS")? {
            config.stats.interval = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix
        .trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

fn read<T: FromStr>(env: &impl EnvIO, prefix: &str, name: &str) -> Result<Option<T>> {
    let key = if prefix.is_empty() { name.to_string() } else { format!("{prefix}_{name}") };
    let Some(value) = env.get(&key) else {
        return Ok(None);
    };

    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(Error::Config { key, value: value.into_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::tests::TestEnvIO;

    fn env(vars: &[(&str, &str)]) -> TestEnvIO {
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env(&env(&[]), "wgui").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.loader.delay, Duration::from_millis(1));
        assert_eq!(config.loader.max_batch_size, 100);
        assert_eq!(config.subscription.buffer, 64);
        assert_eq!(config.stats.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let env = env(&[
            ("WG_UI_LOADER_DELAY_MS", "5"),
            ("WG_UI_LOADER_MAX_BATCH_SIZE", "0"),
            ("WG_UI_SUBSCRIPTION_BUFFER", " 8 "),
            ("WG_UI_STATS_INTERVAL_MS", "250"),
        ]);
        let actual = Config::from_env(&env, "wg-ui").unwrap();
        let expected = Config::default()
            .loader(LoaderConfig::default().delay(Duration::from_millis(5)).max_batch_size(0))
            .subscription(SubscriptionConfig { buffer: 8 })
            .stats(StatsConfig { interval: Duration::from_millis(250) });

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_invalid_value() {
        let env = env(&[("WGUI_SUBSCRIPTION_BUFFER", "lots")]);
        let actual = Config::from_env(&env, "wgui");

        assert!(matches!(
            actual,
            Err(Error::Config { key, value }) if key == "WGUI_SUBSCRIPTION_BUFFER" && value == "lots"
        ));
    }
}
