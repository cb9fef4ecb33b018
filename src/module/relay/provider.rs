use crate::domain::event::GetSignedIdentityRequest;
use crate::domain::identity::{Eligibility, IdentityResolver};
use crate::library::communication::event::NotificationPublisher;
use crate::library::communication::request::{DispatchError, RequestDispatcher};
use tracing::{debug, instrument};

/// Result of asking for a signed identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    /// Token issued by the backend
    Issued(String),
    /// Credentials did not identify anyone, nothing has been requested
    NotEligible,
}

/// Obtains signed identities from the backend on behalf of callers
pub struct SignedIdentityProvider<P, I> {
    dispatcher: RequestDispatcher<P, GetSignedIdentityRequest>,
    resolver: I,
}

impl<P, I> SignedIdentityProvider<P, I>
where
    P: NotificationPublisher + Send + Sync,
    I: IdentityResolver + Send + Sync,
{
    /// Creates a new provider from its parts
    pub fn new(dispatcher: RequestDispatcher<P, GetSignedIdentityRequest>, resolver: I) -> Self {
        Self {
            dispatcher,
            resolver,
        }
    }

    /// Resolves the caller and waits for the backend to sign its identity
    #[instrument(skip(self, credentials))]
    pub async fn signed_identity(&self, credentials: &str) -> Result<IdentityOutcome, DispatchError> {
        let requester = match self.resolver.resolve(credentials) {
            Eligibility::Eligible(requester) => requester,
            Eligibility::NotEligible => {
                debug!("Caller is not eligible for a signed identity");
                return Ok(IdentityOutcome::NotEligible);
            }
        };

        let token = self
            .dispatcher
            .dispatch(&requester, GetSignedIdentityRequest)
            .await?;

        Ok(IdentityOutcome::Issued(token))
    }
}
