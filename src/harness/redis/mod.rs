mod connection;
mod factory;
mod pubsub;

pub use connection::MonitoredConnection;
pub use factory::SharedRedisFactory;
pub use pubsub::MonitoredPubSub;
