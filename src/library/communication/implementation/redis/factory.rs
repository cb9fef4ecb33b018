use super::super::super::super::BoxedError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use redis::aio::ConnectionLike;
use redis::{Msg, RedisResult};
use thiserror::Error;

/// Errors that may occur while listening on a [`PubSubResource`]
#[derive(Error, Debug)]
pub enum PubSubResourceError {
    /// Underlying stream has been closed
    #[error("redis stream has been closed")]
    StreamClosed,
}

/// Wrapper trait for [`PubSub`](redis::aio::PubSub) to allow for black-box implementation
#[async_trait]
pub trait PubSubResource {
    /// Subscribe to a channel by name
    async fn subscribe(&mut self, channel: &str) -> RedisResult<()>;

    /// Listen to the subscribed channels for incoming messages
    ///
    /// The stream yields a [`StreamClosed`](PubSubResourceError::StreamClosed) error
    /// as its last item once the connection is lost.
    fn into_on_message<'a>(self) -> BoxStream<'a, Result<Msg, PubSubResourceError>>;
}

/// Factory for redis connections
#[async_trait]
pub trait RedisFactory {
    /// Type returned when creating a PubSub connection
    type PubSub: PubSubResource + Send;
    /// Type returned for regular commands
    type Connection: ConnectionLike + Send;

    /// Creates a new dedicated PubSub connection
    async fn pubsub(&self) -> Result<Self::PubSub, BoxedError>;

    /// Provides a connection for regular commands which may be shared with other users
    async fn connection(&self) -> Result<Self::Connection, BoxedError>;
}
