use super::{super::super::EmptyResult, ChannelDescriptor, Notification, NotificationFrame};
use async_trait::async_trait;

/// Structure which allows publishing of serialized data onto a channel
#[async_trait]
pub trait RawNotificationPublisher {
    /// Sends an opaque payload to a [`channel`](ChannelDescriptor)
    async fn publish_raw(&self, data: &[u8], channel: &ChannelDescriptor) -> EmptyResult;
}

/// Publisher for [`Notifications`](Notification)
///
/// Publishing is fire-and-forget. A successful return only means that the transport accepted
/// the frame, not that anybody received it.
#[async_trait]
pub trait NotificationPublisher {
    /// Publishes a framed [`Notification`] onto the given channel
    async fn publish<N: Notification + Send + Sync>(
        &self,
        channel: &ChannelDescriptor,
        frame: &NotificationFrame<N>,
    ) -> EmptyResult;
}
