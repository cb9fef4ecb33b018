//! Request/response correlation on top of publish/subscribe channels
//!
//! A [`RequestDispatcher`] registers a [`Waiter`] for its requester in a shared
//! [`PendingRequestRegistry`], publishes the request and suspends until the waiter
//! is fulfilled. A [`ResponseHandler`] consumes the reply channel and fulfills all
//! waiters of the addressed requester at once.

mod dispatcher;
mod handler;
mod registry;
mod request;
mod waiter;

pub use dispatcher::*;
pub use handler::*;
pub use registry::*;
pub use request::*;
pub use waiter::*;
