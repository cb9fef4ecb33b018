use super::connection::{connect_with_retry, MonitoredConnection, SharedConnection};
use super::pubsub::MonitoredPubSub;
use crate::library::communication::implementation::redis::RedisFactory;
use crate::library::BoxedError;
use async_trait::async_trait;
use redis::Client;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// [`RedisFactory`] implementation sharing one multiplexed connection for regular commands
///
/// Clones share the same connection. Once it breaks, the next request reconnects.
/// Subscriptions always use dedicated connections.
#[derive(Clone)]
pub struct SharedRedisFactory {
    client: Client,
    shared: SharedConnection,
}

impl SharedRedisFactory {
    /// Creates a new factory opening connections to the given URL
    ///
    /// Fails only if the URL is malformed, no connection is made until one is requested.
    pub fn new(url: &str) -> Result<Self, BoxedError> {
        Ok(Self {
            client: Client::open(url)?,
            shared: Arc::default(),
        })
    }
}

#[async_trait]
impl RedisFactory for SharedRedisFactory {
    type PubSub = MonitoredPubSub;
    type Connection = MonitoredConnection;

    #[instrument(skip(self))]
    async fn pubsub(&self) -> Result<Self::PubSub, BoxedError> {
        debug!("Opening dedicated pubsub connection");
        let con = connect_with_retry(|| self.client.get_async_connection()).await;

        Ok(MonitoredPubSub::new(con))
    }

    async fn connection(&self) -> Result<Self::Connection, BoxedError> {
        let mut slot = self.shared.lock().await;

        let con = match &*slot {
            Some(con) => {
                trace!("Reusing existing shared connection");
                con.clone()
            }
            None => {
                debug!("Creating new shared connection");
                let con = connect_with_retry(|| self.client.get_multiplexed_tokio_connection()).await;
                *slot = Some(con.clone());
                con
            }
        };

        Ok(MonitoredConnection::new(con, self.shared.clone()))
    }
}
