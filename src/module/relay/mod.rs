//! Relay handing out signed identities obtained from the conferencing backend
//!
//! Callers request their signed identity over HTTP. Each request is published onto the
//! request channel and the caller is suspended until the backend replies on the response
//! channel. Replies are correlated with the waiting callers through the user identifier.

use crate::domain::event::{GetSignedIdentityRequest, SignedIdentityResponse};
use crate::domain::identity::CompoundCredentialResolver;
use crate::harness::{Heart, Module, SharedRedisFactory, SubscriptionRunner};
use crate::library::communication::event::ChannelDescriptor;
use crate::library::communication::implementation::redis::RedisPublisher;
use crate::library::communication::request::{
    RequestDispatcher, ResponseHandler, ResponseTimeout, SharedRegistry,
};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};
use std::sync::Arc;
use tracing::info;

mod options;
mod provider;
mod server;

pub use options::Options;
pub use provider::{IdentityOutcome, SignedIdentityProvider};
pub use server::{routes, ServerJob};

/// Module implementation
pub struct Relay {
    options: Options,
}

impl Relay {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Module for Relay {
    async fn pre_startup(&mut self) -> EmptyResult {
        // Fail early on malformed URLs instead of restarting jobs forever
        SharedRedisFactory::new(&self.options.redis.url)?;
        Ok(())
    }

    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let redis_url = self.options.redis.url.clone();
        let timeout = ResponseTimeout::from(self.options.response_timeout);

        info!(
            request_channel = %self.options.request_channel,
            response_channel = %self.options.response_channel,
            ?timeout,
            "Relaying signed identity requests"
        );

        // Both halves correlate through the same registry
        let registry: SharedRegistry<String> = SharedRegistry::default();

        let publisher = RedisPublisher::new(SharedRedisFactory::new(&redis_url)?);
        let dispatcher = RequestDispatcher::<_, GetSignedIdentityRequest>::new(
            publisher,
            ChannelDescriptor::new(self.options.request_channel.clone()),
            registry.clone(),
        )
        .with_timeout(timeout)
        .with_sender(self.options.sender.clone());

        let provider = SignedIdentityProvider::new(dispatcher, CompoundCredentialResolver);
        let handler = ResponseHandler::<SignedIdentityResponse>::new(registry);

        let response_runner = SubscriptionRunner::new(
            redis_url,
            ChannelDescriptor::new(self.options.response_channel.clone()),
            handler,
        );
        let server_job = ServerJob::new(self.options.port, Arc::new(provider));

        schedule!(scheduler, { response_runner, server_job });

        Ok(Some(Heart::new()))
    }
}
