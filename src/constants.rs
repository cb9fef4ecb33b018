//! Constants shared across modules

/// Channel on which requests for the backend are published
pub const CHANNEL_TO_BACKEND: &str = "to-akka-apps-redis-channel";

/// Channel on which the backend publishes its replies
pub const CHANNEL_FROM_BACKEND: &str = "from-akka-apps-redis-channel";

/// Value of the `sender` routing field attached to outgoing messages
pub const MESSAGE_SENDER: &str = "html5-server";

/// HTTP header carrying the caller credentials
pub const HEADER_CREDENTIALS: &str = "x-bbb-credentials";
