//! Options shared between modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct.

use structopt::StructOpt;

/// Options for connecting to the Redis server
#[derive(Debug, StructOpt)]
pub struct RedisOptions {
    /// Redis server URL
    #[structopt(
        short = "r",
        long = "redis",
        env = "REDIS",
        global = true,
        default_value = "redis://localhost:6379/",
        value_name = "url"
    )]
    pub url: String,
}
