// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location feeds.
//!
//! A [`LocationSource`] pushes fixes into a channel until the receiver is
//! dropped. [`run_location_feed`] drains such a channel into a
//! [`DriveSession`], handing finalized trips to the [`TripRecorder`].

use futures_util::future::join_all;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{LocationSample, Trip};
use crate::services::recorder::{PendingWrite, TripRecorder};
use crate::services::session::DriveSession;

/// Channel depth between a source and its consumer.
const FEED_BUFFER: usize = 64;

/// Requested fix quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    #[default]
    High,
    Balanced,
    LowPower,
}

/// Subscription parameters for a location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionConfig {
    pub accuracy: Accuracy,
    pub interval: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            interval: Duration::from_secs(1),
        }
    }
}

/// Anything that can stream location fixes.
pub trait LocationSource {
    /// Start delivering fixes. Delivery stops when the receiver is dropped.
    fn subscribe(&self, config: &SubscriptionConfig) -> mpsc::Receiver<LocationSample>;
}

/// Replays a recorded sequence of fixes.
///
/// With a zero interval the fixes are sent back to back, which is what tests
/// and benchmarks want.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    samples: Vec<LocationSample>,
}

impl ReplaySource {
    pub fn new(samples: Vec<LocationSample>) -> Self {
        Self { samples }
    }
}

impl LocationSource for ReplaySource {
    fn subscribe(&self, config: &SubscriptionConfig) -> mpsc::Receiver<LocationSample> {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let samples = self.samples.clone();
        let interval = config.interval;

        tokio::spawn(async move {
            for sample in samples {
                if tx.send(sample).await.is_err() {
                    tracing::debug!("Location subscriber went away, stopping replay");
                    return;
                }
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
        });

        rx
    }
}

/// Summary of a drained feed.
#[derive(Debug, Default)]
pub struct FeedSummary {
    pub samples: usize,
    /// One handle per trip submitted, in classification order
    pub writes: Vec<PendingWrite>,
}

impl FeedSummary {
    /// Wait for every write, returning results in submission order.
    pub async fn wait_all(self) -> Vec<Result<Trip>> {
        join_all(self.writes.into_iter().map(PendingWrite::wait)).await
    }
}

/// Process fixes in arrival order until the feed closes, then tear the
/// session down.
pub async fn run_location_feed(
    mut feed: mpsc::Receiver<LocationSample>,
    mut session: DriveSession,
    recorder: &TripRecorder,
) -> FeedSummary {
    let mut summary = FeedSummary::default();

    while let Some(sample) = feed.recv().await {
        summary.samples += 1;
        let outcome = session.process(&sample);
        if let Some(trip) = outcome.finished_trip {
            summary.writes.push(recorder.submit(trip));
        }
    }

    if let Some(trip) = session.close() {
        summary.writes.push(recorder.submit(trip));
    }

    tracing::info!(
        samples = summary.samples,
        trips = summary.writes.len(),
        "Location feed closed"
    );
    summary
}
