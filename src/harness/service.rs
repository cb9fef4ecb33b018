use super::SharedRedisFactory;
use crate::library::communication::event::{ChannelDescriptor, ConsumerExt};
use crate::library::communication::implementation::redis::RedisSubscriptionProvider;
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};

/// Job feeding every message of a redis channel into a [`Consumer`](crate::library::communication::event::Consumer)
///
/// Fails once the subscription is lost so that the scheduler restarts it with a fresh connection.
pub struct SubscriptionRunner<C> {
    redis_url: String,
    channel: ChannelDescriptor,
    consumer: C,
}

impl<C> SubscriptionRunner<C>
where
    C: ConsumerExt + Send + Sync,
{
    /// Creates a new runner job which will connect to the given redis server and subscribe to the channel
    pub fn new(redis_url: String, channel: ChannelDescriptor, consumer: C) -> Self {
        Self {
            redis_url,
            channel,
            consumer,
        }
    }
}

#[async_trait]
impl<C> Job for SubscriptionRunner<C>
where
    C: ConsumerExt + Send + Sync,
{
    const NAME: &'static str = "SubscriptionRunner";

    fn name(&self) -> String {
        format!("{}({})", Self::NAME, self.channel)
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let factory = SharedRedisFactory::new(&self.redis_url)?;
        let provider = RedisSubscriptionProvider::new(factory);

        manager.ready().await;

        self.consumer.consume_channel(provider, &self.channel).await
    }
}
