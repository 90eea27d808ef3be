// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory event store
//!
//! Streams live behind their own async mutex, so appends to different entities
//! proceed in parallel while appends to one entity are serialized. The version
//! check, the append and the notification fan-out all happen under the stream
//! lock: subscribers therefore observe each entity's events in commit order.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use super::{Appended, ConcurrencyConflict, EventStore, RecordedEvent, StoredEvent};
use crate::bus::EventChannel;
use crate::domain::CustomerId;
use crate::errors::{CustomerError, CustomerResult};
use crate::events::CustomerEvent;

type Stream = Arc<Mutex<Vec<StoredEvent>>>;

pub struct InMemoryEventStore {
    streams: RwLock<HashMap<CustomerId, Stream>>,
    next_position: AtomicU64,
    notifications: EventChannel<RecordedEvent>,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new(EventChannel::new("notifications"))
    }
}

impl InMemoryEventStore {
    /// Empty log publishing appended events to `notifications`
    pub fn new(notifications: EventChannel<RecordedEvent>) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            next_position: AtomicU64::new(1),
            notifications,
        }
    }

    /// Restore a previously exported log
    ///
    /// Each stream must hold versions 1..=n without gaps and positions must be
    /// exactly 1..=n over the whole log. Payloads are not decoded here.
    pub fn from_stored(
        history: Vec<StoredEvent>,
        notifications: EventChannel<RecordedEvent>,
    ) -> CustomerResult<Self> {
        let mut history = history;
        history.sort_by_key(|stored| stored.position);

        let mut max_position = 0;
        let mut streams: HashMap<CustomerId, Vec<StoredEvent>> = HashMap::new();

        for stored in history {
            if stored.position != max_position + 1 {
                return Err(CustomerError::InvalidLog(format!(
                    "expected position {} but found {}",
                    max_position + 1,
                    stored.position
                )));
            }
            max_position = stored.position;

            let stream = streams.entry(stored.entity_id.clone()).or_default();
            let expected = stream.len() as u64 + 1;
            if stored.version != expected {
                return Err(CustomerError::InvalidLog(format!(
                    "stream {} expected version {} but found {}",
                    stored.entity_id, expected, stored.version
                )));
            }
            stream.push(stored);
        }

        debug!(
            streams = streams.len(),
            last_position = max_position,
            "Restored event log"
        );

        Ok(Self {
            streams: RwLock::new(
                streams
                    .into_iter()
                    .map(|(id, events)| (id, Arc::new(Mutex::new(events))))
                    .collect(),
            ),
            next_position: AtomicU64::new(max_position + 1),
            notifications,
        })
    }

    pub fn notifications(&self) -> &EventChannel<RecordedEvent> {
        &self.notifications
    }

    /// Every stored envelope in global position order
    pub async fn export(&self) -> Vec<StoredEvent> {
        let mut all = Vec::new();
        for stream in self.snapshot_streams().await {
            all.extend(stream.lock().await.iter().cloned());
        }
        all.sort_by_key(|stored| stored.position);
        all
    }

    async fn snapshot_streams(&self) -> Vec<Stream> {
        self.streams.read().await.values().cloned().collect()
    }

    async fn stream(&self, entity_id: &CustomerId) -> Option<Stream> {
        self.streams.read().await.get(entity_id).cloned()
    }

    async fn stream_or_create(&self, entity_id: &CustomerId) -> Stream {
        if let Some(stream) = self.stream(entity_id).await {
            return stream;
        }
        self.streams
            .write()
            .await
            .entry(entity_id.clone())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn read_events(&self, entity_id: &CustomerId) -> CustomerResult<Vec<RecordedEvent>> {
        self.read_events_from(entity_id, 1).await
    }

    async fn read_events_from(
        &self,
        entity_id: &CustomerId,
        from_version: u64,
    ) -> CustomerResult<Vec<RecordedEvent>> {
        let Some(stream) = self.stream(entity_id).await else {
            return Ok(Vec::new());
        };
        let stream = stream.lock().await;

        stream
            .iter()
            .filter(|stored| stored.version >= from_version)
            .map(StoredEvent::decode)
            .collect()
    }

    async fn current_version(&self, entity_id: &CustomerId) -> CustomerResult<u64> {
        let Some(stream) = self.stream(entity_id).await else {
            return Ok(0);
        };
        let version = stream.lock().await.last().map_or(0, |stored| stored.version);
        Ok(version)
    }

    #[instrument(skip(self, entity_id, events), fields(entity_id = %entity_id, count = events.len()))]
    async fn store_events(
        &self,
        entity_id: &CustomerId,
        events: Vec<CustomerEvent>,
        expected_version: u64,
    ) -> CustomerResult<Appended> {
        if let Some(foreign) = events.iter().find(|event| event.entity_id() != entity_id) {
            return Err(CustomerError::StreamMismatch {
                stream: entity_id.clone(),
                found: foreign.entity_id().clone(),
            });
        }

        let payloads = events
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let stream = self.stream_or_create(entity_id).await;
        let mut stream = stream.lock().await;

        let actual = stream.last().map_or(0, |stored| stored.version);
        if actual != expected_version {
            warn!(
                expected = expected_version,
                actual, "Concurrency conflict, append rejected"
            );
            return Err(ConcurrencyConflict {
                entity_id: entity_id.clone(),
                expected: expected_version,
                actual,
            }
            .into());
        }

        let recorded_at = Utc::now();
        let mut recorded = Vec::with_capacity(events.len());

        for (event, payload) in events.into_iter().zip(payloads) {
            let version = stream.len() as u64 + 1;
            let position = self.next_position.fetch_add(1, Ordering::SeqCst);

            stream.push(StoredEvent {
                entity_id: entity_id.clone(),
                version,
                position,
                recorded_at,
                kind: event.event_type_name().to_string(),
                payload,
            });
            recorded.push(RecordedEvent {
                entity_id: entity_id.clone(),
                version,
                position,
                recorded_at,
                event,
            });
        }

        let appended = Appended {
            version: stream.len() as u64,
            last_position: stream.last().map_or(0, |stored| stored.position),
        };

        for event in recorded {
            debug!(
                version = event.version,
                position = event.position,
                kind = event.event.event_type_name(),
                "Event appended"
            );
            self.notifications.publish(event);
        }

        Ok(appended)
    }

    async fn read_all(&self) -> CustomerResult<Vec<RecordedEvent>> {
        self.export().await.iter().map(StoredEvent::decode).collect()
    }
}
