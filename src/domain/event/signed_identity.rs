use crate::library::communication::event::Notification;
use crate::library::communication::request::{Request, Response};
use serde::{Deserialize, Serialize};

/// Request for a signed JSON Web Token asserting the identity of a user
///
/// The requesting user and its meeting are conveyed by the frame routing, the body is empty.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetSignedIdentityRequest;

impl Notification for GetSignedIdentityRequest {
    fn event_name() -> &'static str {
        "GetSignedIdentityReqMsg"
    }
}

impl Request for GetSignedIdentityRequest {
    type Response = SignedIdentityResponse;
}

/// Signed identity issued by the backend
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedIdentityResponse {
    /// Signed JSON Web Token
    pub jwt: String,
}

impl Notification for SignedIdentityResponse {
    fn event_name() -> &'static str {
        "GetSignedIdentityRespMsg"
    }
}

impl Response for SignedIdentityResponse {
    type Payload = String;

    fn into_payload(self) -> Self::Payload {
        self.jwt
    }
}
