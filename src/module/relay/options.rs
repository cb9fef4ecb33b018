use crate::constants::{CHANNEL_FROM_BACKEND, CHANNEL_TO_BACKEND, MESSAGE_SENDER};
use crate::library::helpers::parse_seconds;
use crate::module::options::RedisOptions;
use std::time::Duration;
use structopt::StructOpt;

/// Options for the relay module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    /// Port on which signed identities can be requested over HTTP
    #[structopt(long, env, default_value = "48080")]
    pub port: u16,

    /// Channel onto which requests for the backend are published
    #[structopt(long, env, default_value = CHANNEL_TO_BACKEND)]
    pub request_channel: String,

    /// Channel on which the backend publishes its replies
    #[structopt(long, env, default_value = CHANNEL_FROM_BACKEND)]
    pub response_channel: String,

    /// Name stamped onto every published request
    #[structopt(long, env, default_value = MESSAGE_SENDER)]
    pub sender: String,

    /// Seconds after which a pending request is given up.
    /// Requests wait indefinitely for their reply when omitted.
    #[structopt(long, env, parse(try_from_str = parse_seconds))]
    pub response_timeout: Option<Duration>,
}
