//! Mapping of caller credentials onto requesters

use crate::library::communication::request::Requester;
use crate::library::helpers::split_into_two;

/// Separator between the meeting and user identifier in compound credentials
pub const CREDENTIAL_SEPARATOR: &str = "--";

/// Whether a caller may issue requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Caller has been identified as the contained requester
    Eligible(Requester),
    /// Caller could not be identified, no request should be issued
    NotEligible,
}

/// Resolves the identity of a caller from its credentials
pub trait IdentityResolver {
    /// Determines who the caller is, if anyone
    fn resolve(&self, credentials: &str) -> Eligibility;
}

/// Resolver for credentials in the form `<meetingId>--<userId>`
///
/// Credentials lacking the separator or either identifier are not eligible.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundCredentialResolver;

impl IdentityResolver for CompoundCredentialResolver {
    fn resolve(&self, credentials: &str) -> Eligibility {
        match split_into_two(credentials.trim(), CREDENTIAL_SEPARATOR) {
            Some((meeting, user)) if !meeting.is_empty() && !user.is_empty() => {
                Eligibility::Eligible(Requester::new(meeting, user))
            }
            _ => Eligibility::NotEligible,
        }
    }
}
