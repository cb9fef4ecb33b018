//! Structures to realise an event-driven service architecture
//!
//! Services have no knowledge of each other. Each service operates independently and
//! whenever something of relevance to others happens, it publishes a [`Notification`]
//! onto a [`channel`](ChannelDescriptor). Every interested party may then subscribe to the
//! channel and process the notifications it receives.
//!
//! Multiple kinds of notifications usually share one channel. Each notification is thus
//! wrapped into a [`NotificationFrame`] which carries the name of the event and some routing
//! information. [`Consumers`](Consumer) only get to see the frames they asked for, everything
//! else is skipped by [`ConsumerExt::consume_channel`].
//!
//! Delivery is at-least-once at best and there is no ordering between notifications. The
//! transport does not acknowledge anything, so nothing in here retries either.

mod channel;
mod consumer;
mod frame;
mod notification;
mod publisher;
mod subscription;

pub use channel::*;
pub use consumer::*;
pub use frame::*;
pub use notification::*;
pub use publisher::*;
pub use subscription::*;
