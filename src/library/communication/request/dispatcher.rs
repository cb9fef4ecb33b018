use super::super::super::BoxedError;
use super::super::event::{ChannelDescriptor, NotificationFrame, NotificationPublisher, Routing};
use super::{
    Fulfillment, FulfillmentError, PendingRequestRegistry, Request, Requester,
    RequesterIdentifier, Response, Waiter, WaiterId,
};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::yield_now;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument, warn};

/// Payload a request eventually resolves to
pub type PayloadOf<Q> = <<Q as Request>::Response as Response>::Payload;

/// Registry shared between the dispatcher and handler of one request type
pub type SharedRegistry<T> = Arc<PendingRequestRegistry<RequesterIdentifier, T>>;

/// Upper bound for the whole round trip of a dispatched request
///
/// The limit covers publishing the request as well as waiting for its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseTimeout {
    /// Wait indefinitely
    #[default]
    None,
    /// Give up after the given duration
    After(Duration),
}

impl ResponseTimeout {
    fn limit(self) -> Option<(Instant, Duration)> {
        match self {
            ResponseTimeout::None => None,
            ResponseTimeout::After(duration) => Some((Instant::now() + duration, duration)),
        }
    }
}

impl From<Option<Duration>> for ResponseTimeout {
    fn from(duration: Option<Duration>) -> Self {
        duration.map(Self::After).unwrap_or(Self::None)
    }
}

async fn within<F: Future>(
    limit: Option<(Instant, Duration)>,
    future: F,
) -> Result<F::Output, DispatchError> {
    match limit {
        None => Ok(future.await),
        Some((deadline, duration)) => timeout_at(deadline, future)
            .await
            .map_err(|_| DispatchError::TimedOut(duration)),
    }
}

/// Withdraws a registered waiter when dropped before being disarmed
struct Registration<T: Send + 'static> {
    registry: SharedRegistry<T>,
    requester: Option<RequesterIdentifier>,
    waiter: WaiterId,
}

impl<T: Send + 'static> Registration<T> {
    fn new(registry: SharedRegistry<T>, requester: RequesterIdentifier, waiter: WaiterId) -> Self {
        Self {
            registry,
            requester: Some(requester),
            waiter,
        }
    }

    fn disarm(mut self) {
        self.requester = None;
    }
}

impl<T: Send + 'static> Drop for Registration<T> {
    fn drop(&mut self) {
        let requester = match self.requester.take() {
            Some(requester) => requester,
            None => return,
        };

        let registry = self.registry.clone();
        let waiter = self.waiter;

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if registry.withdraw(&requester, waiter).await.is_some() {
                        debug!(%waiter, "Withdrew waiter of cancelled request");
                    }
                });
            }
            Err(_) => warn!(%waiter, "Unable to withdraw waiter without a runtime"),
        }
    }
}

/// Error returned by [`RequestDispatcher::dispatch`]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Publishing the request failed, it has not been sent
    #[error("unable to send request")]
    SendingFailure(#[source] BoxedError),
    /// No reply arrived within the configured timeout
    #[error("no reply received within {0:?}")]
    TimedOut(Duration),
    /// The waiter has been dropped before a reply arrived
    #[error("request has been abandoned")]
    Abandoned(#[from] FulfillmentError),
}

/// Sends requests and suspends the caller until the matching reply arrives
///
/// Each call registers a fresh [`Waiter`] for the requester *before* publishing so that
/// even an immediate reply finds it. Replies are delivered by a
/// [`ResponseHandler`](super::ResponseHandler) operating on the same registry.
pub struct RequestDispatcher<P, Q: Request> {
    publisher: P,
    channel: ChannelDescriptor,
    registry: SharedRegistry<PayloadOf<Q>>,
    timeout: ResponseTimeout,
    sender: Option<String>,
    phantom: PhantomData<fn(Q)>,
}

impl<P, Q: Request> RequestDispatcher<P, Q> {
    /// Creates a new dispatcher publishing onto the given channel
    pub fn new(
        publisher: P,
        channel: ChannelDescriptor,
        registry: SharedRegistry<PayloadOf<Q>>,
    ) -> Self {
        Self {
            publisher,
            channel,
            registry,
            timeout: ResponseTimeout::None,
            sender: None,
            phantom: PhantomData,
        }
    }

    /// Limits how long each request waits for its reply
    pub fn with_timeout(mut self, timeout: ResponseTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stamps every published frame with the given sender name
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Registry used for correlating replies
    pub fn registry(&self) -> &SharedRegistry<PayloadOf<Q>> {
        &self.registry
    }
}

impl<P, Q> RequestDispatcher<P, Q>
where
    P: NotificationPublisher + Send + Sync,
    Q: Request + Send + Sync,
{
    /// Publishes the request and waits for the payload of the next reply addressed at the requester
    ///
    /// Concurrent calls for the same requester all resolve with the same reply. Without a
    /// timeout, a request that is never answered stays pending for as long as the caller awaits it.
    /// Dropping the returned future withdraws the request from the registry.
    #[instrument(skip(self, requester, request), fields(requester = %requester.identifier, session = %requester.session))]
    pub async fn dispatch(
        &self,
        requester: &Requester,
        request: Q,
    ) -> Result<PayloadOf<Q>, DispatchError> {
        // Give sibling tasks on this worker a chance to run before suspending
        yield_now().await;

        let limit = self.timeout.limit();
        let (waiter, fulfillment) = Waiter::new();
        let waiter_id = waiter.id();

        self.registry
            .add(requester.identifier.clone(), waiter)
            .await;

        let registration = Registration::new(
            self.registry.clone(),
            requester.identifier.clone(),
            waiter_id,
        );

        let result = self
            .round_trip(requester, request, waiter_id, fulfillment, limit)
            .await;

        registration.disarm();
        result
    }

    async fn round_trip(
        &self,
        requester: &Requester,
        request: Q,
        waiter_id: WaiterId,
        mut fulfillment: Fulfillment<PayloadOf<Q>>,
        limit: Option<(Instant, Duration)>,
    ) -> Result<PayloadOf<Q>, DispatchError> {
        let routing = Routing {
            meeting_id: Some(requester.session.clone()),
            user_id: Some(requester.identifier.clone()),
            sender: self.sender.clone(),
        };
        let frame = NotificationFrame::new(request, routing);

        let published = match within(limit, self.publisher.publish(&self.channel, &frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("Failed to publish request: {}", e);
                Err(DispatchError::SendingFailure(e))
            }
            Err(e) => {
                warn!("Publishing request did not finish in time");
                Err(e)
            }
        };

        if let Err(error) = published {
            return self.settle(requester, waiter_id, fulfillment, error).await;
        }

        debug!(waiter = %waiter_id, "Awaiting reply");

        match within(limit, &mut fulfillment).await {
            Ok(result) => Ok(result?),
            Err(error) => {
                debug!(waiter = %waiter_id, "Request timed out");
                self.settle(requester, waiter_id, fulfillment, error).await
            }
        }
    }

    /// Withdraws the waiter after a failure unless a reply already claimed it
    async fn settle(
        &self,
        requester: &Requester,
        waiter_id: WaiterId,
        fulfillment: Fulfillment<PayloadOf<Q>>,
        error: DispatchError,
    ) -> Result<PayloadOf<Q>, DispatchError> {
        match self
            .registry
            .withdraw(&requester.identifier, waiter_id)
            .await
        {
            Some(_) => Err(error),
            // A reply claimed the waiter right as the failure occurred
            None => Ok(fulfillment.await?),
        }
    }
}

impl<P: Clone, Q: Request> Clone for RequestDispatcher<P, Q> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
            channel: self.channel.clone(),
            registry: self.registry.clone(),
            timeout: self.timeout,
            sender: self.sender.clone(),
            phantom: PhantomData,
        }
    }
}

#[cfg(test)]
mod does {
    use super::super::super::event::Notification;
    use super::super::super::implementation::mock::MockTransport;
    use super::super::{InboundReply, ResponseHandler};
    use super::*;
    use futures::{poll, FutureExt};
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TokenRequest;

    impl Notification for TokenRequest {
        fn event_name() -> &'static str {
            "TokenReqMsg"
        }
    }

    impl Request for TokenRequest {
        type Response = TokenResponse;
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TokenResponse {
        token: String,
    }

    impl Notification for TokenResponse {
        fn event_name() -> &'static str {
            "TokenRespMsg"
        }
    }

    impl Response for TokenResponse {
        type Payload = String;

        fn into_payload(self) -> String {
            self.token
        }
    }

    struct Fixture {
        transport: MockTransport,
        channel: ChannelDescriptor,
        dispatcher: Arc<RequestDispatcher<MockTransport, TokenRequest>>,
        handler: ResponseHandler<TokenResponse>,
    }

    fn fixture(timeout: ResponseTimeout) -> Fixture {
        let transport = MockTransport::default();
        let channel = ChannelDescriptor::from("requests");
        let registry: SharedRegistry<String> = Default::default();

        let dispatcher =
            RequestDispatcher::<_, TokenRequest>::new(transport.clone(), channel.clone(), registry.clone())
                .with_timeout(timeout)
                .with_sender("test-suite");

        Fixture {
            transport,
            channel,
            dispatcher: Arc::new(dispatcher),
            handler: ResponseHandler::new(registry),
        }
    }

    #[tokio::test]
    async fn resolve_with_reply_payload() {
        let fixture = fixture(ResponseTimeout::None);
        let dispatcher = fixture.dispatcher.clone();

        let request = tokio::spawn(async move {
            dispatcher
                .dispatch(&Requester::new("m1", "u1"), TokenRequest)
                .await
        });

        fixture.transport.wait_for_publications(1).await;
        let delivered = fixture
            .handler
            .handle(InboundReply::new("u1", "jwt-1".to_owned()))
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(request.await.unwrap().unwrap(), "jwt-1");
        assert!(fixture.dispatcher.registry().is_empty().await);
    }

    #[tokio::test]
    async fn publish_routed_frame() {
        let fixture = fixture(ResponseTimeout::None);
        let dispatcher = fixture.dispatcher.clone();

        tokio::spawn(async move {
            dispatcher
                .dispatch(&Requester::new("m1", "u1"), TokenRequest)
                .await
        });

        fixture.transport.wait_for_publications(1).await;

        let published = fixture.transport.published::<TokenRequest>(&fixture.channel);
        assert_eq!(published.len(), 1);

        let frame = &published[0];
        assert_eq!(frame.name(), "TokenReqMsg");
        assert_eq!(frame.header().meeting_id.as_deref(), Some("m1"));
        assert_eq!(frame.user_id(), Some("u1"));
        assert_eq!(
            frame.envelope().routing.sender.as_deref(),
            Some("test-suite")
        );
    }

    #[tokio::test]
    async fn stay_pending_without_reply() {
        let fixture = fixture(ResponseTimeout::None);
        let requester = Requester::new("m1", "u1");
        let mut request = fixture.dispatcher.dispatch(&requester, TokenRequest).boxed();

        for _ in 0..10 {
            assert!(poll!(&mut request).is_pending());
        }

        assert_eq!(fixture.transport.published_count(), 1);
        assert_eq!(fixture.dispatcher.registry().pending("u1").await, 1);
    }

    #[tokio::test]
    async fn share_reply_between_concurrent_requests() {
        let fixture = fixture(ResponseTimeout::None);

        let requests: Vec<_> = (0..2)
            .map(|_| {
                let dispatcher = fixture.dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .dispatch(&Requester::new("m1", "u1"), TokenRequest)
                        .await
                })
            })
            .collect();

        fixture.transport.wait_for_publications(2).await;

        let delivered = fixture
            .handler
            .handle(InboundReply::new("u1", "jwt-shared".to_owned()))
            .await;

        assert_eq!(delivered, 2);
        for request in requests {
            assert_eq!(request.await.unwrap().unwrap(), "jwt-shared");
        }
    }

    #[tokio::test]
    async fn not_block_siblings_on_single_worker() {
        let fixture = fixture(ResponseTimeout::None);

        let first = {
            let dispatcher = fixture.dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&Requester::new("m1", "u1"), TokenRequest)
                    .await
            })
        };

        let second = {
            let dispatcher = fixture.dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&Requester::new("m1", "u2"), TokenRequest)
                    .await
            })
        };

        fixture.transport.wait_for_publications(2).await;
        fixture
            .handler
            .handle(InboundReply::new("u2", "jwt-2".to_owned()))
            .await;

        assert_eq!(second.await.unwrap().unwrap(), "jwt-2");
        assert!(!first.is_finished());
        assert_eq!(fixture.dispatcher.registry().pending("u1").await, 1);
    }

    #[tokio::test]
    async fn withdraw_waiter_on_publish_failure() {
        let fixture = fixture(ResponseTimeout::None);
        fixture.transport.refuse_publishing();

        let result = fixture
            .dispatcher
            .dispatch(&Requester::new("m1", "u1"), TokenRequest)
            .await;

        assert!(matches!(result, Err(DispatchError::SendingFailure(_))));
        assert!(fixture.dispatcher.registry().is_empty().await);
    }

    #[tokio::test]
    async fn withdraw_waiter_on_timeout() {
        let fixture = fixture(ResponseTimeout::After(Duration::from_millis(10)));

        let result = fixture
            .dispatcher
            .dispatch(&Requester::new("m1", "u1"), TokenRequest)
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::TimedOut(duration)) if duration == Duration::from_millis(10)
        ));
        assert!(fixture.dispatcher.registry().is_empty().await);

        // Late replies find nobody to deliver to
        let delivered = fixture
            .handler
            .handle(InboundReply::new("u1", "late".to_owned()))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn time_out_while_publishing_stalls() {
        let fixture = fixture(ResponseTimeout::After(Duration::from_millis(10)));
        fixture.transport.stall_publishing();

        let result = fixture
            .dispatcher
            .dispatch(&Requester::new("m1", "u1"), TokenRequest)
            .await;

        assert!(matches!(result, Err(DispatchError::TimedOut(_))));
        assert!(fixture.dispatcher.registry().is_empty().await);
    }

    #[tokio::test]
    async fn withdraw_waiters_of_dropped_requests() {
        let fixture = fixture(ResponseTimeout::After(Duration::from_millis(20)));

        for _ in 0..100 {
            let requester = Requester::new("m1", "u1");
            let request = fixture.dispatcher.dispatch(&requester, TokenRequest);

            assert!(tokio::time::timeout(Duration::from_millis(1), request)
                .await
                .is_err());
        }

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fixture.dispatcher.registry().pending("u1").await, 0);
        assert!(fixture.dispatcher.registry().is_empty().await);
    }

    #[tokio::test]
    async fn withdraw_waiter_of_dropped_request_without_timeout() {
        let fixture = fixture(ResponseTimeout::None);
        let requester = Requester::new("m1", "u1");
        let mut request = fixture.dispatcher.dispatch(&requester, TokenRequest).boxed();

        while fixture.transport.published_count() == 0 {
            assert!(poll!(&mut request).is_pending());
        }
        assert_eq!(fixture.dispatcher.registry().pending("u1").await, 1);

        drop(request);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(fixture.dispatcher.registry().is_empty().await);
    }

    #[tokio::test]
    async fn resolve_before_timeout() {
        let fixture = fixture(ResponseTimeout::After(Duration::from_secs(10)));
        let dispatcher = fixture.dispatcher.clone();

        let request = tokio::spawn(async move {
            dispatcher
                .dispatch(&Requester::new("m1", "u1"), TokenRequest)
                .await
        });

        fixture.transport.wait_for_publications(1).await;
        fixture
            .handler
            .handle(InboundReply::new("u1", "jwt".to_owned()))
            .await;

        assert_eq!(request.await.unwrap().unwrap(), "jwt");
    }

    #[test]
    fn convert_optional_durations() {
        assert_eq!(ResponseTimeout::from(None), ResponseTimeout::None);
        assert_eq!(
            ResponseTimeout::from(Some(Duration::from_secs(5))),
            ResponseTimeout::After(Duration::from_secs(5))
        );
    }
}
