use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Unique identifier of a [`Waiter`]
pub type WaiterId = Uuid;

/// Error that occurs when either side of a waiter went away
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FulfillmentError {
    /// The other half has been dropped without completing the exchange
    #[error("waiter has been abandoned")]
    Abandoned,
}

/// Fulfillment slot of one in-flight request
///
/// Created together with a [`Fulfillment`] which resolves once the waiter has been fulfilled.
/// Since [`fulfill`](Waiter::fulfill) consumes the waiter, a value can be delivered at most once.
pub struct Waiter<T> {
    id: WaiterId,
    tx: oneshot::Sender<T>,
}

impl<T> Waiter<T> {
    /// Creates a new waiter and the linked future which resolves to the delivered value
    pub fn new() -> (Self, Fulfillment<T>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        (Self { id, tx }, Fulfillment { rx })
    }

    /// Unique identifier of this waiter
    pub fn id(&self) -> WaiterId {
        self.id
    }

    /// Whether the linked [`Fulfillment`] has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Delivers the value and resumes whoever awaits the linked [`Fulfillment`]
    ///
    /// When nobody is waiting anymore, the value is dropped and an error returned.
    pub fn fulfill(self, value: T) -> Result<(), FulfillmentError> {
        self.tx.send(value).map_err(|_| FulfillmentError::Abandoned)
    }
}

impl<T> Debug for Waiter<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter").field("id", &self.id).finish()
    }
}

/// Future resolving to the value delivered into the linked [`Waiter`]
pub struct Fulfillment<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Fulfillment<T> {
    type Output = Result<T, FulfillmentError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| FulfillmentError::Abandoned))
    }
}
