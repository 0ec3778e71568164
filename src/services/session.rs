// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drive sessions: classifier, aggregator and scorer wired together.
//!
//! A [`DriveSession`] is a plain value. All state needed to process the next
//! fix lives in it, so sessions can be tested in isolation and several can
//! run side by side. The [`SessionRegistry`] hands out one lock per session
//! so fixes for a session are applied by a single writer, in order, and
//! closes sessions that stop sending fixes.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::{LocationSample, Trip};
use crate::services::aggregator::{DriveSegment, TripAggregator};
use crate::services::motion::{classify, ClassifierState, MotionState};
use crate::services::recorder::TripRecorder;
use crate::services::scoring::score_speeds;

/// What processing one fix produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub status: MotionState,
    /// Set when this fix ended a drive segment
    pub finished_trip: Option<Trip>,
}

/// Per-device driving session.
#[derive(Debug, Clone)]
pub struct DriveSession {
    uid: String,
    bonus_points: f64,
    classifier: ClassifierState,
    aggregator: TripAggregator,
    status: MotionState,
}

impl DriveSession {
    pub fn new(uid: impl Into<String>, bonus_points: f64) -> Self {
        Self {
            uid: uid.into(),
            bonus_points,
            classifier: ClassifierState::default(),
            aggregator: TripAggregator::new(),
            status: MotionState::NoMove,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Status after the most recent fix.
    pub fn status(&self) -> MotionState {
        self.status
    }

    /// Bonus applied to trips finalized from now on.
    pub fn set_bonus_points(&mut self, bonus_points: f64) {
        self.bonus_points = bonus_points;
    }

    /// Process one fix.
    pub fn process(&mut self, sample: &LocationSample) -> SampleOutcome {
        let (classifier, status) = classify(self.classifier, sample);
        self.classifier = classifier;
        self.status = status;

        let finished_trip = if status == MotionState::Driving {
            self.aggregator.push(sample);
            None
        } else {
            self.aggregator
                .finish()
                .map(|segment| self.finalize(segment, true))
        };

        SampleOutcome {
            status,
            finished_trip,
        }
    }

    /// Tear the session down. A segment still open is returned as an
    /// unfinished trip so the drive is not lost from history.
    pub fn close(mut self) -> Option<Trip> {
        self.aggregator
            .finish()
            .map(|segment| self.finalize(segment, false))
    }

    fn finalize(&self, segment: DriveSegment, finished: bool) -> Trip {
        let scored = score_speeds(&segment.speeds);

        tracing::debug!(
            uid = %self.uid,
            start_time_ms = segment.start_time_ms,
            samples = segment.speeds.len(),
            distance_meters = segment.distance_meters,
            score = scored.score,
            harsh_accelerations = scored.harsh_accelerations,
            harsh_brakes = scored.harsh_brakes,
            finished,
            "Drive segment closed"
        );

        Trip {
            id: None,
            uid: self.uid.clone(),
            start_time_ms: segment.start_time_ms,
            end_time_ms: segment.end_time_ms,
            distance_meters: segment.distance_meters,
            avg_speed_kmh: segment.avg_speed_kmh,
            max_speed_kmh: segment.max_speed_kmh,
            finished,
            score: scored.score,
            bonus_points: self.bonus_points,
        }
    }
}

/// Registry slot for one session.
///
/// The session is taken out when the slot is closed, so a request that
/// resolved the handle before the close finds nothing to write into.
#[derive(Debug)]
pub struct SessionSlot {
    session: Option<DriveSession>,
    last_seen: Instant,
}

impl SessionSlot {
    fn new(session: DriveSession) -> Self {
        Self {
            session: Some(session),
            last_seen: Instant::now(),
        }
    }

    /// The live session, marked as active. `None` once closed.
    pub fn live_mut(&mut self) -> Option<&mut DriveSession> {
        self.last_seen = Instant::now();
        self.session.as_mut()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

/// Handle to a registered session.
pub type SessionHandle = Arc<Mutex<SessionSlot>>;

/// Active sessions keyed by the device's session ID.
#[derive(Default, Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session, creating it for `uid` if it does not exist.
    ///
    /// Returns `None` if the session exists but belongs to another user.
    /// The handle may refer to a slot closed after this returns; callers
    /// check [`SessionSlot::live_mut`].
    pub async fn get_or_create(
        &self,
        session_id: &str,
        uid: &str,
        bonus_points: f64,
    ) -> Option<SessionHandle> {
        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id, uid, "Drive session started");
                Arc::new(Mutex::new(SessionSlot::new(DriveSession::new(
                    uid,
                    bonus_points,
                ))))
            })
            .clone();

        let owned_by_caller = match &handle.lock().await.session {
            Some(session) => session.uid() == uid,
            None => true,
        };
        owned_by_caller.then_some(handle)
    }

    /// Remove a session and return any open segment as an unfinished trip.
    ///
    /// The outer `None` means there was no such session.
    pub async fn close(&self, session_id: &str) -> Option<Option<Trip>> {
        let (_, handle) = self.sessions.remove(session_id)?;
        let session = handle.lock().await.session.take()?;
        tracing::info!(session_id, uid = session.uid(), "Drive session closed");
        Some(session.close())
    }

    /// Close every session with no fixes for at least `idle_timeout` as of
    /// `now`. Returns the open segments of the closed sessions as
    /// unfinished trips.
    pub async fn close_idle(&self, idle_timeout: Duration, now: Instant) -> Vec<Trip> {
        let handles: Vec<(String, SessionHandle)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut open_trips = Vec::new();
        for (session_id, handle) in handles {
            let mut slot = handle.lock().await;
            let idle_for = slot.idle_for(now);
            if slot.is_closed() || idle_for < idle_timeout {
                continue;
            }

            // Only remove the entry if it still maps to this slot
            self.sessions
                .remove_if(&session_id, |_, current| Arc::ptr_eq(current, &handle));
            if let Some(session) = slot.session.take() {
                tracing::info!(
                    session_id = %session_id,
                    uid = session.uid(),
                    idle_secs = idle_for.as_secs(),
                    "Idle drive session closed"
                );
                open_trips.extend(session.close());
            }
        }
        open_trips
    }

    /// Close every session (shutdown).
    pub async fn close_all(&self) -> Vec<Trip> {
        self.close_idle(Duration::ZERO, Instant::now()).await
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodically close idle sessions and store their open segments.
///
/// Phones that crash or lose connectivity never tear their session down;
/// this is what keeps their last drive from being lost.
pub fn spawn_idle_sweeper(
    registry: SessionRegistry,
    recorder: TripRecorder,
    idle_timeout: Duration,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for trip in registry.close_idle(idle_timeout, Instant::now()).await {
                let _ = recorder.submit(trip);
            }
        }
    })
}
