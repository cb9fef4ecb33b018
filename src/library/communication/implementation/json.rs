//! Serialization and deserialization provided by [`serde_json`] using marker traits
//!
//! This module allows implementors of traits that allow raw access to underlying messaging systems
//! to provide the higher-level traits relying on serialization. It does so by providing a number of
//! marker traits which, when implemented, provide default implementations of the higher-level traits
//! by translating between lower-level serialized data and higher-level strongly typed data by using
//! [`serde_json`].

use super::super::event::{
    ChannelDescriptor, ChannelMessage, Notification, NotificationFrame, NotificationPublisher,
    RawChannelMessage, RawNotificationPublisher,
};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use serde::Deserialize;

/// Marker trait providing a default [`NotificationPublisher`] implementation based on [`serde_json`]
pub trait JsonNotificationPublisher: RawNotificationPublisher + Send + Sync {}

#[async_trait]
impl<P> NotificationPublisher for P
where
    P: JsonNotificationPublisher,
{
    /// Serializes the frame using [`serde_json::to_string`]
    async fn publish<N: Notification + Send + Sync>(
        &self,
        channel: &ChannelDescriptor,
        frame: &NotificationFrame<N>,
    ) -> EmptyResult {
        let data = serde_json::to_string(frame)?;
        self.publish_raw(data.as_bytes(), channel).await
    }
}

/// Marker trait providing a default [`ChannelMessage`] implementation based on [`serde_json`]
pub trait JsonChannelMessage: RawChannelMessage {}

impl<M> ChannelMessage for M
where
    M: JsonChannelMessage,
{
    /// Parses the payload using [`serde_json::from_slice`]
    fn parse_payload<'a, T>(&'a self) -> Result<T, BoxedError>
    where
        T: Deserialize<'a>,
    {
        serde_json::from_slice(self.payload()).map_err(Into::into)
    }
}
