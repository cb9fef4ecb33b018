use super::super::super::super::EmptyResult;
use super::super::super::event::{ChannelDescriptor, RawNotificationPublisher};
use super::super::json::JsonNotificationPublisher;
use super::RedisFactory;
use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::trace;

/// [`NotificationPublisher`](super::super::super::event::NotificationPublisher) implementation using [`PUBLISH`](https://redis.io/commands/publish)
///
/// Publishing succeeds even if nobody is subscribed to the channel.
#[derive(Clone)]
pub struct RedisPublisher<F: RedisFactory> {
    factory: F,
}

impl<F> RedisPublisher<F>
where
    F: RedisFactory,
{
    /// Creates a new instance which obtains connections from the given factory
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F> JsonNotificationPublisher for RedisPublisher<F> where F: RedisFactory + Send + Sync {}

#[async_trait]
impl<F> RawNotificationPublisher for RedisPublisher<F>
where
    F: RedisFactory + Send + Sync,
{
    async fn publish_raw(&self, data: &[u8], channel: &ChannelDescriptor) -> EmptyResult {
        let mut con = self.factory.connection().await?;
        let receivers: usize = con.publish(channel.key(), data).await?;

        trace!(%channel, receivers, "Published message");

        Ok(())
    }
}
