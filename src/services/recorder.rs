// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background persistence of finalized trips.
//!
//! Sample processing must never wait on Firestore. [`TripRecorder::submit`]
//! spawns the write and returns a [`PendingWrite`] the caller can await or
//! drop. Dropping the handle does not cancel the write.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::Trip;

/// Completion handle for one background trip write.
#[derive(Debug)]
pub struct PendingWrite {
    handle: JoinHandle<Result<Trip>>,
}

impl PendingWrite {
    /// Wait for the write. Returns the stored trip with its document ID.
    pub async fn wait(self) -> Result<Trip> {
        self.handle
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Trip write task failed: {}", e)))?
    }
}

/// Per-user locks serializing the stats read-modify-write.
type UserLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Stores finalized trips and keeps the owner's stats current.
///
/// Writes for the same user are serialized inside this process, so trips
/// finalized back to back never race on the stats document. Writers in
/// other processes are still last-writer-wins.
#[derive(Clone)]
pub struct TripRecorder {
    db: FirestoreDb,
    in_flight: Arc<AtomicUsize>,
    submitted: Arc<AtomicUsize>,
    user_locks: UserLocks,
}

impl TripRecorder {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            db,
            in_flight: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(AtomicUsize::new(0)),
            user_locks: Arc::new(DashMap::new()),
        }
    }

    /// Writes submitted but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Writes submitted since startup.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Wait until every submitted write has completed, or `timeout` passes.
    ///
    /// Returns the number of writes still outstanding.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.in_flight() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.in_flight()
    }

    /// Persist a trip in the background.
    ///
    /// A failed write is logged and reported through the handle, never
    /// retried.
    pub fn submit(&self, trip: Trip) -> PendingWrite {
        let db = self.db.clone();
        let in_flight = self.in_flight.clone();
        let user_locks = self.user_locks.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);
        self.submitted.fetch_add(1, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let result = persist_serialized(&db, &user_locks, &trip).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            if let Err(e) = &result {
                tracing::warn!(
                    uid = %trip.uid,
                    start_time_ms = trip.start_time_ms,
                    error = %e,
                    "Failed to persist trip"
                );
            }
            result
        });
        PendingWrite { handle }
    }
}

async fn persist_serialized(
    db: &FirestoreDb,
    user_locks: &UserLocks,
    trip: &Trip,
) -> Result<Trip> {
    let lock = user_locks
        .entry(trip.uid.clone())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();

    let result = {
        let _guard = lock.lock().await;
        persist(db, trip).await
    };

    // Drop the lock entry once no other write for this user holds it
    drop(lock);
    user_locks.remove_if(&trip.uid, |_, l| Arc::strong_count(l) == 1);
    result
}

async fn persist(db: &FirestoreDb, trip: &Trip) -> Result<Trip> {
    let stored = db.insert_trip(trip).await?;

    tracing::info!(
        uid = %stored.uid,
        trip_id = ?stored.id,
        distance_meters = stored.distance_meters,
        score = stored.score,
        finished = stored.finished,
        "Trip stored"
    );

    if stored.finished {
        // The trip itself is safe at this point; a stats failure is only
        // logged and left for the next recomputation.
        if let Err(e) = db.add_trip_to_stats(&stored).await {
            tracing::warn!(uid = %stored.uid, error = %e, "Failed to update user stats");
        }
    }

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip() -> Trip {
        Trip {
            id: None,
            uid: "user-1".to_string(),
            start_time_ms: 0,
            end_time_ms: 10_000,
            distance_meters: 120.0,
            avg_speed_kmh: 25.0,
            max_speed_kmh: 40.0,
            finished: true,
            score: 5.0,
            bonus_points: 0.0,
        }
    }

    #[tokio::test]
    async fn test_offline_write_failure_is_observable() {
        let recorder = TripRecorder::new(FirestoreDb::new_mock());
        let pending = recorder.submit(trip());

        let err = pending.wait().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(recorder.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_drain_waits_for_dropped_handles() {
        let recorder = TripRecorder::new(FirestoreDb::new_mock());
        for _ in 0..3 {
            drop(recorder.submit(trip()));
        }

        let outstanding = recorder.drain(Duration::from_secs(5)).await;
        assert_eq!(outstanding, 0);
    }

    #[tokio::test]
    async fn test_user_locks_released_after_writes() {
        let recorder = TripRecorder::new(FirestoreDb::new_mock());
        let writes: Vec<_> = (0..4).map(|_| recorder.submit(trip())).collect();
        for write in writes {
            assert!(write.wait().await.is_err());
        }

        assert_eq!(recorder.submitted(), 4);
        assert!(recorder.user_locks.is_empty());
    }
}
