use super::super::super::EmptyResult;
use super::super::event::{Consumer, NotificationFrame};
use super::{InboundReply, Response, SharedRegistry};
use async_trait::async_trait;
use std::marker::PhantomData;
use tracing::{debug, instrument, trace, warn};

/// Delivers received replies to every request waiting on the addressed requester
///
/// Replies for requesters without pending requests are dropped. Likewise, replies are
/// not retained for requests made after their arrival.
pub struct ResponseHandler<R: Response> {
    registry: SharedRegistry<R::Payload>,
    phantom: PhantomData<fn(R)>,
}

impl<R: Response> ResponseHandler<R> {
    /// Creates a new handler fulfilling waiters from the given registry
    pub fn new(registry: SharedRegistry<R::Payload>) -> Self {
        Self {
            registry,
            phantom: PhantomData,
        }
    }

    /// Hands the payload to all waiters of the requester and returns how many received it
    #[instrument(skip(self, reply), fields(requester = %reply.requester))]
    pub async fn handle(&self, reply: InboundReply<R::Payload>) -> usize {
        let waiters = self.registry.fetch_and_clear(&reply.requester).await;

        if waiters.is_empty() {
            trace!("Dropping reply without pending requests");
            return 0;
        }

        let mut delivered = 0;

        for waiter in waiters {
            let id = waiter.id();

            match waiter.fulfill(reply.payload.clone()) {
                Ok(_) => delivered += 1,
                Err(e) => debug!(waiter = %id, "Unable to deliver reply: {}", e),
            }
        }

        debug!(delivered, "Delivered reply");
        delivered
    }
}

impl<R: Response> Clone for ResponseHandler<R> {
    fn clone(&self) -> Self {
        Self::new(self.registry.clone())
    }
}

#[async_trait]
impl<R> Consumer for ResponseHandler<R>
where
    R: Response + Send + Sync,
{
    type Notification = R;

    async fn consume(&self, frame: NotificationFrame<R>) -> EmptyResult {
        match InboundReply::try_from(frame) {
            Ok(reply) => {
                self.handle(reply).await;
            }
            Err(e) => warn!("Discarding malformed reply: {}", e),
        }

        Ok(())
    }
}
