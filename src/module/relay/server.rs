use super::provider::{IdentityOutcome, SignedIdentityProvider};
use crate::constants::HEADER_CREDENTIALS;
use crate::domain::identity::IdentityResolver;
use crate::library::communication::event::NotificationPublisher;
use crate::library::communication::request::DispatchError;
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Filter, Rejection, Reply};

/// HTTP surface through which callers obtain their signed identity
pub struct ServerJob<P, I> {
    port: u16,
    provider: Arc<SignedIdentityProvider<P, I>>,
}

impl<P, I> ServerJob<P, I> {
    /// Creates a new job serving the given provider
    pub fn new(port: u16, provider: Arc<SignedIdentityProvider<P, I>>) -> Self {
        Self { port, provider }
    }
}

#[async_trait]
impl<P, I> Job for ServerJob<P, I>
where
    P: NotificationPublisher + Send + Sync + 'static,
    I: IdentityResolver + Send + Sync + 'static,
{
    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let routes = routes(self.provider.clone()).with(warp::trace::request());

        let source_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let (addr, server) =
            warp::serve(routes).bind_with_graceful_shutdown(source_addr, manager.termination_signal());

        info!(?addr, "Serving signed identities");
        manager.ready().await;
        server.await;

        Ok(())
    }
}

/// Routes of the HTTP surface
///
/// `GET /signed-identity` with the caller credentials in the `x-bbb-credentials` header responds with
/// - `200` and the token as plain text
/// - `204` if the credentials do not identify anyone
/// - `504` if the backend did not reply in time
/// - `502` if the request could not be relayed
pub fn routes<P, I>(
    provider: Arc<SignedIdentityProvider<P, I>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    P: NotificationPublisher + Send + Sync + 'static,
    I: IdentityResolver + Send + Sync + 'static,
{
    warp::get()
        .and(warp::path("signed-identity"))
        .and(warp::path::end())
        .and(warp::header::optional::<String>(HEADER_CREDENTIALS))
        .and(warp::any().map(move || provider.clone()))
        .and_then(serve_signed_identity)
        .with(warp::trace::named("signed_identity"))
}

async fn serve_signed_identity<P, I>(
    credentials: Option<String>,
    provider: Arc<SignedIdentityProvider<P, I>>,
) -> Result<Response, Infallible>
where
    P: NotificationPublisher + Send + Sync,
    I: IdentityResolver + Send + Sync,
{
    let credentials = credentials.unwrap_or_default();

    let response = match provider.signed_identity(&credentials).await {
        Ok(IdentityOutcome::Issued(token)) => token.into_response(),
        Ok(IdentityOutcome::NotEligible) => StatusCode::NO_CONTENT.into_response(),
        Err(error @ DispatchError::TimedOut(_)) => {
            warn!(%error, "Backend did not sign identity in time");
            reply::with_status(error.to_string(), StatusCode::GATEWAY_TIMEOUT).into_response()
        }
        Err(error) => {
            warn!(%error, "Failed to obtain signed identity");
            reply::with_status(error.to_string(), StatusCode::BAD_GATEWAY).into_response()
        }
    };

    Ok(response)
}
