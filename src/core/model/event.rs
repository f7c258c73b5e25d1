use derive_more::From;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Id, IdKind, Node, Peer, Server, User};

/// A change notification about a single [Node].
pub trait ChangedEvent: Serialize + DeserializeOwned + Send + 'static {
    type Node: Node;

    fn node(&self) -> &Self::Node;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserAction {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerAction {
    Created,
    Updated,
    Deleted,
    InterfaceStatsUpdated,
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerAction {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChangedEvent {
    pub node: User,
    pub action: UserAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerChangedEvent {
    pub node: Server,
    pub action: ServerAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerChangedEvent {
    pub node: Peer,
    pub action: PeerAction,
}

impl ChangedEvent for UserChangedEvent {
    type Node = User;

    fn node(&self) -> &User {
        &self.node
    }
}

impl ChangedEvent for ServerChangedEvent {
    type Node = Server;

    fn node(&self) -> &Server {
        &self.node
    }
}

impl ChangedEvent for PeerChangedEvent {
    type Node = Peer;

    fn node(&self) -> &Peer {
        &self.node
    }
}

/// A change of any kind of node.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum NodeChangedEvent {
    User(UserChangedEvent),
    Server(ServerChangedEvent),
    Peer(PeerChangedEvent),
}

impl NodeChangedEvent {
    pub fn kind(&self) -> IdKind {
        match self {
            NodeChangedEvent::User(_) => IdKind::User,
            NodeChangedEvent::Server(_) => IdKind::Server,
            NodeChangedEvent::Peer(_) => IdKind::Peer,
        }
    }

    pub fn node_id(&self) -> Id {
        match self {
            NodeChangedEvent::User(event) => event.node.node_id(),
            NodeChangedEvent::Server(event) => event.node.node_id(),
            NodeChangedEvent::Peer(event) => event.node.node_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_string(&ServerAction::InterfaceStatsUpdated).unwrap();
        assert_eq!(json, "\"INTERFACE_STATS_UPDATED\"");
        assert_eq!(ServerAction::InterfaceStatsUpdated.to_string(), "INTERFACE_STATS_UPDATED");
    }

    #[test]
    fn test_node_changed_event_kind() {
        let event = NodeChangedEvent::from(UserChangedEvent {
            node: User { id: "u1".into(), email: "a@b.c".into() },
            action: UserAction::Created,
        });

        assert_eq!(event.kind(), IdKind::User);
        assert_eq!(event.node_id(), Id::new(IdKind::User, "u1"));
    }
}
