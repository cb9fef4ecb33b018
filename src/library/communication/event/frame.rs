use super::Notification;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Addressing information attached to every frame
///
/// Only the `sender` is always present. Messages which are concerned with a specific
/// session or user additionally carry their identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Routing {
    /// Session (meeting) the message belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    /// User the message originates from or is targeted at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Service which sent the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// Outer part of a frame used by transports and routers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Event name of the contained notification
    pub name: String,
    /// Addressing information
    #[serde(default)]
    pub routing: Routing,
    /// Milliseconds since the unix epoch at which the frame was created
    #[serde(default)]
    pub timestamp: i64,
}

/// Header of the frame core, duplicating parts of the envelope for the receiving application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameHeader {
    /// Event name of the contained notification
    pub name: String,
    /// Session (meeting) the message belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    /// User the message originates from or is targeted at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct FrameCore<N> {
    header: FrameHeader,
    body: N,
}

/// Wire representation of a [`Notification`]
///
/// Wraps the notification together with its event name, routing information and a timestamp.
/// Dereferences to the contained notification.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationFrame<N> {
    envelope: Envelope,
    core: FrameCore<N>,
}

impl<N: Notification> NotificationFrame<N> {
    /// Wraps a notification and stamps it with the current time
    pub fn new(body: N, routing: Routing) -> Self {
        let name = N::event_name().to_owned();
        let header = FrameHeader {
            name: name.clone(),
            meeting_id: routing.meeting_id.clone(),
            user_id: routing.user_id.clone(),
        };

        Self {
            envelope: Envelope {
                name,
                routing,
                timestamp: chrono::Utc::now().timestamp_millis(),
            },
            core: FrameCore { header, body },
        }
    }
}

impl<N> NotificationFrame<N> {
    /// Event name as stated by the envelope
    pub fn name(&self) -> &str {
        &self.envelope.name
    }

    /// Outer envelope of the frame
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Header of the frame core
    pub fn header(&self) -> &FrameHeader {
        &self.core.header
    }

    /// User identifier this frame is addressed at or originates from
    ///
    /// Prefers the core header and falls back to the envelope routing.
    pub fn user_id(&self) -> Option<&str> {
        self.core
            .header
            .user_id
            .as_deref()
            .or_else(|| self.envelope.routing.user_id.as_deref())
    }

    /// Discards the framing and returns the contained notification
    pub fn into_inner(self) -> N {
        self.core.body
    }
}

impl<N> Deref for NotificationFrame<N> {
    type Target = N;

    fn deref(&self) -> &Self::Target {
        &self.core.body
    }
}

/// Minimal view of a frame used to peek at its event name without knowing the body type
#[derive(Debug, Deserialize)]
pub struct FrameSummary {
    /// Outer envelope of the frame
    pub envelope: Envelope,
}
