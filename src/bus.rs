// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-process publish/subscribe messaging
//!
//! An [`EventChannel`] fans every published message out to all current
//! subscribers. Each subscriber owns an unbounded queue, so a publish never
//! blocks and never drops a message for a live subscriber: delivery is
//! at-least-once and handlers must tolerate duplicates.
//!
//! Dropping a [`Subscription`] detaches it. Detaching while a publish is in
//! progress does not affect delivery to the other subscribers.
//!
//! The runtime uses two channels, bundled in [`EventBus`]:
//! - `notifications`: every event appended to the log
//! - `errors`: saga outcomes that are not stream facts

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::CustomerResult;
use crate::event_store::RecordedEvent;
use crate::events::DomainErrorEvent;

struct ChannelInner<T> {
    name: &'static str,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, UnboundedSender<T>)>>,
}

impl<T> ChannelInner<T> {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, UnboundedSender<T>)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Named fan-out channel; clones share the same subscriber set
pub struct EventChannel<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                name,
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Attach a new subscriber; it sees every message published from now on
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().push((id, sender));

        debug!(channel = self.inner.name, subscriber = id, "Subscribed");

        Subscription {
            id,
            receiver,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `message` to every current subscriber
    ///
    /// Returns the number of subscribers the message was queued for.
    pub fn publish(&self, message: T) -> usize {
        let mut subscribers = self.inner.subscribers();
        subscribers.retain(|(_, sender)| !sender.is_closed());

        let mut delivered = 0;
        for (_, sender) in subscribers.iter() {
            if sender.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

/// Receiving end of one subscriber; detaches on drop
pub struct Subscription<T> {
    id: u64,
    receiver: UnboundedReceiver<T>,
    channel: Weak<ChannelInner<T>>,
}

impl<T> Subscription<T> {
    /// Next message, or `None` once every publisher handle is gone
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Next already-queued message, without waiting
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.subscribers().retain(|(id, _)| *id != self.id);
            debug!(channel = channel.name, subscriber = self.id, "Unsubscribed");
        }
    }
}

/// The runtime's two channels
#[derive(Clone)]
pub struct EventBus {
    notifications: EventChannel<RecordedEvent>,
    errors: EventChannel<DomainErrorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            notifications: EventChannel::new("notifications"),
            errors: EventChannel::new("errors"),
        }
    }

    /// Events appended to the log, in per-entity commit order
    pub fn notifications(&self) -> &EventChannel<RecordedEvent> {
        &self.notifications
    }

    pub fn errors(&self) -> &EventChannel<DomainErrorEvent> {
        &self.errors
    }

    pub fn publish_error(&self, event: DomainErrorEvent) -> usize {
        self.errors.publish(event)
    }
}

/// Trait for handling messages from a channel
#[async_trait]
pub trait MessageHandler<T>: Send + Sync {
    /// Handle a message
    async fn handle(&self, message: T) -> CustomerResult<()>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Runs handlers against subscriptions
pub struct MessageProcessor;

impl MessageProcessor {
    /// Process messages one at a time until the channel closes
    ///
    /// A handler error is logged and processing continues with the next message.
    pub fn run_handler<T, H>(mut subscription: Subscription<T>, handler: Arc<H>) -> JoinHandle<()>
    where
        T: Send + 'static,
        H: MessageHandler<T> + 'static,
    {
        tokio::spawn(async move {
            info!(handler = handler.name(), "Message handler started");
            while let Some(message) = subscription.recv().await {
                if let Err(e) = handler.handle(message).await {
                    error!(handler = handler.name(), error = %e, "Handler error");
                }
            }
            info!(handler = handler.name(), "Message handler stopped");
        })
    }
}
