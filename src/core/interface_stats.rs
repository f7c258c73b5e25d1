use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::config::StatsConfig;
use super::model::{InterfaceStats, Server, ServerAction, ServerChangedEvent};
use super::subscription::EventChannel;

/// Lists the configured servers.
#[async_trait::async_trait]
pub trait ServerLister: Send + Sync + 'static {
    async fn list_servers(&self) -> anyhow::Result<Vec<Server>>;
}

/// Reads the counters of a server's network interface.
#[async_trait::async_trait]
pub trait InterfaceStatsReader: Send + Sync + 'static {
    async fn interface_stats(&self, server: &Server) -> anyhow::Result<InterfaceStats>;
}

/// Background task publishing `INTERFACE_STATS_UPDATED` events while
/// somebody listens to server changes.
pub struct InterfaceStatsService {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Poller {
    servers: Arc<dyn ServerLister>,
    stats: Arc<dyn InterfaceStatsReader>,
    channel: EventChannel<ServerChangedEvent>,
    last: HashMap<String, InterfaceStats>,
}

impl InterfaceStatsService {
    pub fn start(
        config: &StatsConfig,
        servers: Arc<dyn ServerLister>,
        stats: Arc<dyn InterfaceStatsReader>,
        channel: EventChannel<ServerChangedEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let poller = Poller { servers, stats, channel, last: HashMap::new() };
        let handle = tokio::spawn(poller.run(config.interval, cancel.clone()));

        Self { cancel, handle }
    }

    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(error) = self.handle.await {
            tracing::error!(%error, "interface stats poller failed");
        }
    }
}

impl Poller {
    async fn run(mut self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(?interval, "interface stats poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        tracing::debug!("interface stats poller stopped");
    }

    async fn tick(&mut self) {
        if !self.channel.has_subscribers() {
            return;
        }

        let servers = match self.servers.list_servers().await {
            Ok(servers) => servers,
            Err(error) => {
                tracing::error!(%error, "failed to list servers");
                return;
            }
        };

        for server in servers {
            if !server.enabled || !server.running {
                continue;
            }

            let stats = match self.stats.interface_stats(&server).await {
                Ok(stats) => stats,
                Err(error) => {
                    tracing::error!(server = %server.name, %error, "failed to read interface stats");
                    continue;
                }
            };

            if self.last.get(&server.id) == Some(&stats) {
                continue;
            }
            self.last.insert(server.id.clone(), stats);

            let event = ServerChangedEvent {
                node: Server { interface_stats: Some(stats), ..server },
                action: ServerAction::InterfaceStatsUpdated,
            };
            if let Err(error) = self.channel.notify(&event) {
                tracing::error!(server = %event.node.name, %error, "failed to publish interface stats");
            }
        }
    }
}
