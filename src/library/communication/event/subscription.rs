use super::super::super::BoxedError;
use super::ChannelDescriptor;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Deserialize;

/// Message received from a channel providing a raw payload
pub trait RawChannelMessage {
    /// Channel the message has been received on
    fn channel(&self) -> &str;

    /// Payload of the message
    fn payload(&self) -> &[u8];
}

/// Useful functions for [`RawChannelMessage`] implementations with default implementations
pub trait ChannelMessage: RawChannelMessage {
    /// Attempts to parse the wire-format payload into a given data structure
    fn parse_payload<'a, T>(&'a self) -> Result<T, BoxedError>
    where
        T: Deserialize<'a>;
}

/// Allows listening to channels
#[async_trait]
pub trait SubscriptionProvider {
    /// Type of [`ChannelMessage`] returned by the provider
    type Message: ChannelMessage + Send + Sync;

    /// Subscribes to a channel and streams every message published onto it from now on
    ///
    /// The stream ends with an error when the underlying connection is lost.
    async fn subscribe(
        &self,
        channel: &ChannelDescriptor,
    ) -> Result<BoxStream<'static, Result<Self::Message, BoxedError>>, BoxedError>;
}
