use serde::{Deserialize, Serialize};

use super::{Id, IdKind};

/// An entity addressable through an [Id].
pub trait Node: Clone + Send + Sync + 'static {
    const KIND: IdKind;

    /// Store id of the entity.
    fn id(&self) -> &str;

    fn node_id(&self) -> Id {
        Id::new(Self::KIND, self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub enabled: bool,
    pub running: bool,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_stats: Option<InterfaceStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: String,
    pub server_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub public_key: String,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<u32>,
}

/// Counters of a network interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStats {
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
    pub multicast: u64,
    pub collisions: u64,
}

impl Node for User {
    const KIND: IdKind = IdKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Node for Server {
    const KIND: IdKind = IdKind::Server;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Node for Peer {
    const KIND: IdKind = IdKind::Peer;

    fn id(&self) -> &str {
        &self.id
    }
}
