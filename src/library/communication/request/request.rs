use super::super::event::{Notification, NotificationFrame};
use thiserror::Error;

/// Identifier under which pending requests are correlated with their replies
///
/// Replies only carry the identifier of the user they belong to, thus all requests
/// of one user share the same identifier and are answered together.
pub type RequesterIdentifier = String;

/// Originator of a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requester {
    /// Session (meeting) the requester is part of
    pub session: String,
    /// Correlation key of the requester
    pub identifier: RequesterIdentifier,
}

impl Requester {
    /// Creates a new requester from its session and identifier
    pub fn new(session: impl Into<String>, identifier: impl Into<RequesterIdentifier>) -> Self {
        Self {
            session: session.into(),
            identifier: identifier.into(),
        }
    }
}

/// Query for information which is answered by a [`Response`] on another channel
///
/// Replies are correlated solely by the requester, so concurrent requests of the same
/// requester must be interchangeable. Requests should thus be free of side effects.
pub trait Request: Notification {
    /// Expected response type
    type Response: Response;
}

/// Reply to a [`Request`]
pub trait Response: Notification {
    /// Value handed to every pending request of the requester
    type Payload: Clone + Send + 'static;

    /// Extracts the value from the received notification
    fn into_payload(self) -> Self::Payload;
}

/// Error raised when a received frame can not be attributed to a requester
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    /// Neither the frame header nor its routing carried a user identifier
    #[error("reply {0} does not carry a requester")]
    MissingRequester(String),
}

/// Reply extracted from the wire, ready to be handed out to waiting requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReply<P> {
    /// Requester the reply is addressed at
    pub requester: RequesterIdentifier,
    /// Payload delivered to every waiting request
    pub payload: P,
}

impl<P> InboundReply<P> {
    /// Creates a new reply from its parts
    pub fn new(requester: impl Into<RequesterIdentifier>, payload: P) -> Self {
        Self {
            requester: requester.into(),
            payload,
        }
    }
}

impl<R: Response> TryFrom<NotificationFrame<R>> for InboundReply<R::Payload> {
    type Error = ReplyError;

    fn try_from(frame: NotificationFrame<R>) -> Result<Self, Self::Error> {
        let requester = frame
            .user_id()
            .map(ToOwned::to_owned)
            .ok_or_else(|| ReplyError::MissingRequester(frame.name().to_owned()))?;

        Ok(Self {
            requester,
            payload: frame.into_inner().into_payload(),
        })
    }
}
