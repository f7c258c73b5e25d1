mod event;
mod id;
mod node;

pub use event::{
    ChangedEvent, NodeChangedEvent, PeerAction, PeerChangedEvent, ServerAction, ServerChangedEvent,
    UserAction, UserChangedEvent,
};
pub use id::{Id, IdKind};
pub use node::{InterfaceStats, Node, Peer, Server, User};
