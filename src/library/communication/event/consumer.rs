use super::super::super::EmptyResult;
use super::{
    ChannelDescriptor, ChannelMessage, FrameSummary, Notification, NotificationFrame,
    SubscriptionProvider,
};
use async_trait::async_trait;
use futures::StreamExt;
use std::any::type_name;
use thiserror::Error;
use tracing::{instrument, trace, warn};

const DEFAULT_CONCURRENCY: usize = 10;

/// Error which ends the consumption of a channel
#[derive(Debug, Error)]
pub enum ConsumptionError {
    /// The subscription stream terminated, usually due to a lost connection
    #[error("subscription to channel {0} ended")]
    SubscriptionEnded(String),
}

/// Entity which may consume and process [`Notifications`](Notification)
#[async_trait]
pub trait Consumer {
    /// Notification to consume
    type Notification: Notification;

    /// Processes an event notification and returns whether it succeeded or failed
    async fn consume(&self, frame: NotificationFrame<Self::Notification>) -> EmptyResult;
}

/// Helper functions to aid the consumption of messages
#[async_trait]
pub trait ConsumerExt {
    /// Subscribes to a channel using the given provider and feeds every frame carrying
    /// the consumers notification type into it.
    ///
    /// Frames of other event types are skipped. Failures to parse or consume individual
    /// frames are logged and do not interrupt the subscription. Only returns once the
    /// subscription itself ends.
    async fn consume_channel<P>(&self, provider: P, channel: &ChannelDescriptor) -> EmptyResult
    where
        P: SubscriptionProvider + Send + Sync;
}

#[async_trait]
impl<C> ConsumerExt for C
where
    C: Consumer + Send + Sync,
    C::Notification: Send + Sync,
{
    #[instrument(skip(self, provider, channel), fields(%channel, notification = type_name::<C::Notification>()))]
    async fn consume_channel<P>(&self, provider: P, channel: &ChannelDescriptor) -> EmptyResult
    where
        P: SubscriptionProvider + Send + Sync,
    {
        let stream = provider.subscribe(channel).await?;

        stream
            .for_each_concurrent(Some(DEFAULT_CONCURRENCY), |item| async move {
                match item {
                    Ok(message) => consume_message(self, message).await,
                    Err(e) => warn!(
                        "Failed to receive notification {}: {}",
                        type_name::<C::Notification>(),
                        e
                    ),
                }
            })
            .await;

        Err(ConsumptionError::SubscriptionEnded(channel.to_string()).into())
    }
}

async fn consume_message<C, M>(consumer: &C, message: M)
where
    C: Consumer + Send + Sync,
    C::Notification: Send + Sync,
    M: ChannelMessage + Send + Sync,
{
    let expected = C::Notification::event_name();

    let summary = match message.parse_payload::<FrameSummary>() {
        Ok(summary) => summary,
        Err(e) => {
            warn!(channel = message.channel(), "Failed to parse frame envelope: {}", e);
            return;
        }
    };

    if summary.envelope.name != expected {
        trace!(event = %summary.envelope.name, "Skipping unrelated frame");
        return;
    }

    match message.parse_payload::<NotificationFrame<C::Notification>>() {
        Ok(frame) => {
            if let Err(e) = consumer.consume(frame).await {
                warn!("Failed to consume {}: {}", type_name::<C::Notification>(), e)
            }
        }
        Err(e) => warn!(
            "Failed to deserialize {}: {}",
            type_name::<C::Notification>(),
            e
        ),
    }
}
