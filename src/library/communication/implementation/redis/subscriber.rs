use super::super::super::super::BoxedError;
use super::super::super::event::{ChannelDescriptor, RawChannelMessage, SubscriptionProvider};
use super::super::json::JsonChannelMessage;
use super::{PubSubResource, RedisFactory};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::Msg;
use tracing::debug;

/// Message received through a redis channel subscription
pub struct RedisChannelMessage {
    msg: Msg,
}

impl From<Msg> for RedisChannelMessage {
    fn from(msg: Msg) -> Self {
        Self { msg }
    }
}

impl RawChannelMessage for RedisChannelMessage {
    fn channel(&self) -> &str {
        self.msg.get_channel_name()
    }

    fn payload(&self) -> &[u8] {
        self.msg.get_payload_bytes()
    }
}

impl JsonChannelMessage for RedisChannelMessage {}

/// [`SubscriptionProvider`] implementation using [`SUBSCRIBE`](https://redis.io/commands/subscribe)
///
/// Each subscription occupies a dedicated connection.
#[derive(Clone)]
pub struct RedisSubscriptionProvider<F: RedisFactory> {
    factory: F,
}

impl<F> RedisSubscriptionProvider<F>
where
    F: RedisFactory,
{
    /// Creates a new instance which obtains connections from the given factory
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

#[async_trait]
impl<F> SubscriptionProvider for RedisSubscriptionProvider<F>
where
    F: RedisFactory + Send + Sync,
{
    type Message = RedisChannelMessage;

    async fn subscribe(
        &self,
        channel: &ChannelDescriptor,
    ) -> Result<BoxStream<'static, Result<Self::Message, BoxedError>>, BoxedError> {
        let mut pubsub = self.factory.pubsub().await?;
        pubsub.subscribe(channel.key()).await?;

        debug!(%channel, "Subscribed to channel");

        let stream = pubsub
            .into_on_message()
            .map(|item| item.map(RedisChannelMessage::from).map_err(BoxedError::from));

        Ok(stream.boxed())
    }
}
