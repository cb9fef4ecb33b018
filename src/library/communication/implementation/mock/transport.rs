use crate::library::communication::event::{
    ChannelDescriptor, Notification, NotificationFrame, RawChannelMessage,
    RawNotificationPublisher, SubscriptionProvider,
};
use crate::library::communication::implementation::json::{
    JsonChannelMessage, JsonNotificationPublisher,
};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::future::pending;
use futures::stream::{unfold, BoxStream};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Error returned while the transport refuses to publish
#[derive(Debug, Error)]
#[error("mock transport refused to publish")]
pub struct MockPublishError;

/// Message received through a [`MockTransport`] subscription
#[derive(Debug, Clone)]
pub struct MockChannelMessage {
    channel: String,
    payload: Vec<u8>,
}

impl MockChannelMessage {
    /// Creates a new instance from raw parts
    pub fn new(channel: &str, payload: Vec<u8>) -> Self {
        Self {
            channel: channel.to_owned(),
            payload,
        }
    }
}

impl RawChannelMessage for MockChannelMessage {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl JsonChannelMessage for MockChannelMessage {}

#[derive(Default)]
struct Broker {
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<MockChannelMessage>>>,
    published: Vec<MockChannelMessage>,
}

/// In-memory publish/subscribe broker
///
/// Everything published is recorded and forwarded to the current subscribers of the channel,
/// just like a real broker would. Clones share the same broker.
#[derive(Clone, Default)]
pub struct MockTransport {
    broker: Arc<Mutex<Broker>>,
    refuse_publishing: Arc<AtomicBool>,
    stall_publishing: Arc<AtomicBool>,
}

impl MockTransport {
    /// Makes all subsequent publish calls fail
    pub fn refuse_publishing(&self) {
        self.refuse_publishing.store(true, Ordering::SeqCst);
    }

    /// Makes all subsequent publish calls hang forever, like a broker that went unreachable
    pub fn stall_publishing(&self) {
        self.stall_publishing.store(true, Ordering::SeqCst);
    }

    /// Sends a frame to all current subscribers of a channel without recording it
    pub fn deliver<N: Notification>(
        &self,
        channel: &ChannelDescriptor,
        frame: &NotificationFrame<N>,
    ) {
        let payload = serde_json::to_vec(frame).unwrap();
        self.deliver_raw(channel, payload);
    }

    /// Sends an opaque payload to all current subscribers of a channel without recording it
    pub fn deliver_raw(&self, channel: &ChannelDescriptor, payload: Vec<u8>) {
        let message = MockChannelMessage::new(channel.key(), payload);
        let mut broker = self.broker.lock().unwrap();

        if let Some(subscribers) = broker.subscribers.get_mut(channel.key()) {
            subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        }
    }

    /// Terminates all subscriptions to a channel
    pub fn close(&self, channel: &ChannelDescriptor) {
        self.broker.lock().unwrap().subscribers.remove(channel.key());
    }

    /// Number of live subscriptions to a channel
    pub fn subscriber_count(&self, channel: &ChannelDescriptor) -> usize {
        self.broker
            .lock()
            .unwrap()
            .subscribers
            .get(channel.key())
            .map(|subscribers| subscribers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Waits until a channel has at least the given number of subscriptions
    pub async fn wait_for_subscribers(&self, channel: &ChannelDescriptor, count: usize) {
        while self.subscriber_count(channel) < count {
            sleep(Duration::from_millis(1)).await;
        }
    }

    /// Frames published onto a channel so far, in publishing order
    pub fn published<N: Notification>(
        &self,
        channel: &ChannelDescriptor,
    ) -> Vec<NotificationFrame<N>> {
        self.broker
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|message| message.channel == channel.key())
            .map(|message| serde_json::from_slice(&message.payload).unwrap())
            .collect()
    }

    /// Total number of frames published so far
    pub fn published_count(&self) -> usize {
        self.broker.lock().unwrap().published.len()
    }

    /// Waits until at least the given number of frames have been published
    pub async fn wait_for_publications(&self, count: usize) {
        while self.published_count() < count {
            sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait]
impl RawNotificationPublisher for MockTransport {
    async fn publish_raw(&self, data: &[u8], channel: &ChannelDescriptor) -> EmptyResult {
        if self.stall_publishing.load(Ordering::SeqCst) {
            pending::<()>().await;
        }

        if self.refuse_publishing.load(Ordering::SeqCst) {
            return Err(MockPublishError.into());
        }

        let message = MockChannelMessage::new(channel.key(), data.to_vec());
        self.broker.lock().unwrap().published.push(message);
        self.deliver_raw(channel, data.to_vec());

        Ok(())
    }
}

impl JsonNotificationPublisher for MockTransport {}

#[async_trait]
impl SubscriptionProvider for MockTransport {
    type Message = MockChannelMessage;

    async fn subscribe(
        &self,
        channel: &ChannelDescriptor,
    ) -> Result<BoxStream<'static, Result<Self::Message, BoxedError>>, BoxedError> {
        let (tx, rx) = mpsc::unbounded_channel();

        self.broker
            .lock()
            .unwrap()
            .subscribers
            .entry(channel.key().to_owned())
            .or_default()
            .push(tx);

        let stream = unfold(rx, |mut rx| async move {
            rx.recv()
                .await
                .map(|message| (Ok::<_, BoxedError>(message), rx))
        });

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::communication::event::ChannelMessage;
    use crate::library::communication::event::NotificationPublisher;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Hello(String);

    impl Notification for Hello {
        fn event_name() -> &'static str {
            "HelloMsg"
        }
    }

    #[tokio::test]
    async fn loop_published_frames_back_to_subscribers() {
        let transport = MockTransport::default();
        let channel = ChannelDescriptor::from("greetings");
        let mut stream = transport.subscribe(&channel).await.unwrap();

        let frame = NotificationFrame::new(Hello("world".into()), Default::default());
        transport.publish(&channel, &frame).await.unwrap();

        let message = stream.next().await.unwrap().unwrap();
        let received: NotificationFrame<Hello> = message.parse_payload().unwrap();

        assert_eq!(received, frame);
        assert_eq!(transport.published::<Hello>(&channel), vec![frame]);
    }

    #[tokio::test]
    async fn refuse_publishing_on_demand() {
        let transport = MockTransport::default();
        let frame = NotificationFrame::new(Hello("nobody".into()), Default::default());

        transport.refuse_publishing();

        assert!(transport
            .publish(&ChannelDescriptor::from("void"), &frame)
            .await
            .is_err());
        assert_eq!(transport.published_count(), 0);
    }
}
