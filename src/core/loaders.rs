use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use super::config::LoaderConfig;
use super::data_loader::{DataLoader, LoadResult, Loader};
use super::model::{Id, Node, Peer, Server, User};
use super::{Error, Result};

/// Store that resolves entities by id.
///
/// The returned nodes may come in any order; ids with no entity are simply
/// absent.
#[async_trait::async_trait]
pub trait NodeSource<N>: Send + Sync + 'static {
    async fn find_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<N>>;
}

pub struct NodeLoader<N> {
    source: Arc<dyn NodeSource<N>>,
    _node: PhantomData<fn() -> N>,
}

impl<N> NodeLoader<N> {
    pub fn new(source: Arc<dyn NodeSource<N>>) -> Self {
        Self { source, _node: PhantomData }
    }
}

#[async_trait::async_trait]
impl<N: Node> Loader<String> for NodeLoader<N> {
    type Value = N;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[String]) -> Vec<Result<Option<N>, Self::Error>> {
        match self.source.find_by_ids(keys).await {
            Ok(nodes) => {
                let mut by_id: HashMap<String, N> =
                    nodes.into_iter().map(|node| (node.id().to_string(), node)).collect();
                keys.iter().map(|key| Ok(by_id.remove(key))).collect()
            }
            Err(error) => {
                tracing::error!(kind = %N::KIND, %error, keys = keys.len(), "failed to load nodes");
                let error = Arc::new(error);
                keys.iter().map(|_| Err(error.clone())).collect()
            }
        }
    }
}

pub type NodeDataLoader<N> = DataLoader<String, NodeLoader<N>>;
pub type NodeLoadResult<N> = LoadResult<N, Arc<anyhow::Error>>;

/// Stores backing the loaders of every kind of node.
#[derive(Clone)]
pub struct NodeSources {
    pub users: Arc<dyn NodeSource<User>>,
    pub servers: Arc<dyn NodeSource<Server>>,
    pub peers: Arc<dyn NodeSource<Peer>>,
}

/// Loaders scoped to a single inbound request.
pub struct Loaders {
    pub user: NodeDataLoader<User>,
    pub server: NodeDataLoader<Server>,
    pub peer: NodeDataLoader<Peer>,
}

fn node_loader<N: Node>(config: &LoaderConfig, source: Arc<dyn NodeSource<N>>) -> NodeDataLoader<N> {
    DataLoader::new(NodeLoader::new(source))
        .delay(config.delay)
        .max_batch_size(config.max_batch_size)
}

impl Loaders {
    pub fn new(config: &LoaderConfig, sources: &NodeSources) -> Self {
        Self {
            user: node_loader(config, sources.users.clone()),
            server: node_loader(config, sources.servers.clone()),
            peer: node_loader(config, sources.peers.clone()),
        }
    }
}

/// Per-request state handed to resolvers.
#[derive(Clone, Default)]
pub struct RequestContext {
    loaders: Option<Arc<Loaders>>,
}

impl RequestContext {
    pub fn new(loaders: Loaders) -> Self {
        Self { loaders: Some(Arc::new(loaders)) }
    }

    pub fn loaders(&self) -> Result<&Loaders> {
        self.loaders.as_deref().ok_or(Error::NotInitialized("loaders"))
    }

    pub fn user_loader(&self) -> Result<&NodeDataLoader<User>> {
        Ok(&self.loaders()?.user)
    }

    pub fn server_loader(&self) -> Result<&NodeDataLoader<Server>> {
        Ok(&self.loaders()?.server)
    }

    pub fn peer_loader(&self) -> Result<&NodeDataLoader<Peer>> {
        Ok(&self.loaders()?.peer)
    }

    /// Resolves a public user id through the request's loader.
    pub async fn user(&self, id: &Id) -> Result<NodeLoadResult<User>> {
        let value = id.value_of(User::KIND)?.to_string();
        Ok(self.user_loader()?.load_one(value).await)
    }

    pub async fn server(&self, id: &Id) -> Result<NodeLoadResult<Server>> {
        let value = id.value_of(Server::KIND)?.to_string();
        Ok(self.server_loader()?.load_one(value).await)
    }

    pub async fn peer(&self, id: &Id) -> Result<NodeLoadResult<Peer>> {
        let value = id.value_of(Peer::KIND)?.to_string();
        Ok(self.peer_loader()?.load_one(value).await)
    }
}
