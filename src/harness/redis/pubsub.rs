use crate::library::communication::implementation::redis::{PubSubResource, PubSubResourceError};
use async_trait::async_trait;
use futures::stream::{once, BoxStream};
use futures::StreamExt;
use redis::aio::{Connection, PubSub};
use redis::{Msg, RedisResult};
use tracing::warn;

/// Redis PubSub connection reporting the loss of its connection
pub struct MonitoredPubSub {
    pubsub: PubSub,
}

impl MonitoredPubSub {
    pub(super) fn new(con: Connection) -> Self {
        Self {
            pubsub: con.into_pubsub(),
        }
    }
}

#[async_trait]
impl PubSubResource for MonitoredPubSub {
    async fn subscribe(&mut self, channel: &str) -> RedisResult<()> {
        self.pubsub.subscribe(channel).await
    }

    fn into_on_message<'a>(self) -> BoxStream<'a, Result<Msg, PubSubResourceError>> {
        let message_stream = self
            .pubsub
            .into_on_message()
            .map(Ok::<Msg, PubSubResourceError>);
        let error_stream = once(async {
            warn!("Redis subscription connection closed");
            Err(PubSubResourceError::StreamClosed)
        });

        message_stream.chain(error_stream).boxed()
    }
}
