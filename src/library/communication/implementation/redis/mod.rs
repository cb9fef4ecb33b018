//! Trait implementations using [`redis`](::redis) publish/subscribe

mod factory;
mod publisher;
mod subscriber;

pub use factory::*;
pub use publisher::*;
pub use subscriber::*;
