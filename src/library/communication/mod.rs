//! Structures to communicate with services in a distributed system
//!
//! In general, there are two modes of operation:
//!
//! 1. Publish and subscribe
//! 2. Request and response
//!
//! The first is the only primitive the underlying transport offers. Whenever a service wants
//! to tell somebody something, it wraps a [`Notification`](event::Notification) into a
//! [`NotificationFrame`](event::NotificationFrame) and publishes it onto a channel. All parties
//! subscribed to that channel receive it and decide on their own whether they care about it.
//! For more details, consult the [`event`] module.
//!
//! The second mode is built on top of the first one. A caller publishes a
//! [`Request`](request::Request) and waits for a matching [`Response`](request::Response)
//! which arrives on a completely different channel, delivered to a subscriber that knows nothing
//! about the caller. The only thing connecting the two is the identifier of the requester.
//! The [`request`] module contains the bookkeeping which reunites them.

pub mod event;
pub mod implementation;
pub mod request;
