// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projector: catch-up and live delivery into a projection
//!
//! [`start_projector`] subscribes to the notification channel first and only
//! then replays the log, so nothing appended during the replay is missed:
//! such events show up in the replay, on the subscription, or both. Duplicates
//! are the projection's job to skip.
//!
//! Progress is published as a **watermark**, the highest position `N` such
//! that every event at positions `1..=N` has been projected. Positions are
//! dense, but events of different entities may be delivered out of global
//! order, so positions above a hole are held back until the hole fills.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{ProjectionAdapter, ProjectionError};
use crate::bus::EventChannel;
use crate::errors::{CustomerError, CustomerResult};
use crate::event_store::{EventStore, RecordedEvent};

#[derive(Debug, Clone, Default, PartialEq)]
struct Progress {
    position: u64,
    failed: Option<ProjectionError>,
}

/// Contiguous watermark over global positions
#[derive(Debug, Default)]
struct WatermarkTracker {
    position: u64,
    pending: BTreeSet<u64>,
}

impl WatermarkTracker {
    /// Record `position` as projected; returns true if the watermark moved
    fn mark(&mut self, position: u64) -> bool {
        if position <= self.position {
            return false;
        }
        self.pending.insert(position);

        let before = self.position;
        while self.pending.remove(&(self.position + 1)) {
            self.position += 1;
        }
        self.position != before
    }
}

/// Read side of a projector's progress
#[derive(Debug, Clone)]
pub struct ProjectionWatermark {
    receiver: watch::Receiver<Progress>,
}

impl ProjectionWatermark {
    /// Every event at or below this position has been projected
    pub fn position(&self) -> u64 {
        self.receiver.borrow().position
    }

    /// The error that stopped the projector, if any
    pub fn failure(&self) -> Option<ProjectionError> {
        self.receiver.borrow().failed.clone()
    }

    /// Wait until every event up to `position` has been projected
    ///
    /// # Errors
    ///
    /// - `Timeout` if the watermark does not get there within `timeout`
    /// - `Projection(Stopped)` if the projector failed or was stopped first
    pub async fn wait_for(&self, position: u64, timeout: Duration) -> CustomerResult<()> {
        let mut receiver = self.receiver.clone();
        let reached = tokio::time::timeout(timeout, async move {
            receiver
                .wait_for(|progress| progress.position >= position || progress.failed.is_some())
                .await
                .map(|progress| progress.clone())
        })
        .await;

        match reached {
            Err(_) => Err(CustomerError::Timeout(format!(
                "projection did not reach position {} within {:?}",
                position, timeout
            ))),
            Ok(Err(_)) => Err(ProjectionError::Stopped("projector is not running".into()).into()),
            Ok(Ok(progress)) if progress.position >= position => Ok(()),
            Ok(Ok(progress)) => Err(ProjectionError::Stopped(
                progress
                    .failed
                    .map_or_else(|| "projector failed".to_string(), |e| e.to_string()),
            )
            .into()),
        }
    }
}

/// Handle to a running projector
///
/// Dropping the handle stops the projector without waiting for it.
pub struct ProjectorHandle {
    watermark: ProjectionWatermark,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ProjectionError>>,
}

impl ProjectorHandle {
    pub fn watermark(&self) -> ProjectionWatermark {
        self.watermark.clone()
    }

    /// Stop the projector and wait for it to finish
    ///
    /// # Errors
    ///
    /// The projector's error if it failed before being stopped.
    pub async fn stop(mut self) -> CustomerResult<()> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| ProjectionError::Stopped(format!("projector task panicked: {e}")))??;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Catch `adapter` up with the log, then keep it current
///
/// Returns once the replay is done; live delivery continues on a background
/// task. The first projection error stops the projector and is published
/// through the watermark.
///
/// # Errors
///
/// Any error from initialization, reading the log, or projecting a replayed
/// event.
pub async fn start_projector<P>(
    mut adapter: P,
    store: Arc<dyn EventStore>,
    notifications: &EventChannel<RecordedEvent>,
) -> CustomerResult<ProjectorHandle>
where
    P: ProjectionAdapter<Event = RecordedEvent, Error = ProjectionError> + 'static,
{
    let mut subscription = notifications.subscribe();
    adapter.initialize().await?;

    let history = store.read_all().await?;
    let replayed = history.len();
    let mut tracker = WatermarkTracker::default();
    for recorded in history {
        let position = recorded.position;
        adapter.project(recorded).await?;
        tracker.mark(position);
    }

    info!(
        projection = adapter.name(),
        replayed,
        watermark = tracker.position,
        "Projection caught up"
    );

    let (progress_tx, progress_rx) = watch::channel(Progress {
        position: tracker.position,
        failed: None,
    });
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    debug!(projection = adapter.name(), "Projector stopped");
                    return Ok(());
                }
                message = subscription.recv() => {
                    let Some(recorded) = message else {
                        debug!(projection = adapter.name(), "Notification channel closed");
                        return Ok(());
                    };
                    let position = recorded.position;

                    if let Err(e) = adapter.project(recorded).await {
                        error!(
                            projection = adapter.name(),
                            position,
                            error = %e,
                            "Projection failed, projector stopping"
                        );
                        progress_tx.send_modify(|progress| progress.failed = Some(e.clone()));
                        return Err(e);
                    }

                    if tracker.mark(position) {
                        let watermark = tracker.position;
                        progress_tx.send_modify(|progress| progress.position = watermark);
                    }
                }
            }
        }
    });

    Ok(ProjectorHandle {
        watermark: ProjectionWatermark {
            receiver: progress_rx,
        },
        stop_tx: Some(stop_tx),
        task,
    })
}
