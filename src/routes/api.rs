// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for drive sessions, trips, stats and the leaderboard.

use crate::error::{AppError, Result};
use crate::models::{LeaderboardEntry, LocationSample, Trip, TripCorrection, UserStats};
use crate::services::MotionState;
use crate::time_utils::format_epoch_ms;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Upper bound on fixes per ingest request (~10 minutes at 1 Hz).
pub const MAX_SAMPLES_PER_BATCH: u64 = 600;
const MAX_TRIPS_PER_PAGE: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions/{session_id}/samples", post(ingest_samples))
        .route("/api/sessions/{session_id}", delete(close_session))
        .route("/api/users/{uid}/trips", get(get_trips))
        .route("/api/users/{uid}/trips/{trip_id}", put(correct_trip))
        .route("/api/users/{uid}/stats", get(get_stats))
        .route("/api/users/{uid}/stats/recompute", post(recompute_user_stats))
        .route("/api/stats/recompute", post(recompute_all_stats))
        .route("/api/leaderboard", get(get_leaderboard))
}

// ─── Trip Summaries ──────────────────────────────────────────

/// Trip as returned by the API.
#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    #[serde(flatten)]
    pub trip: Trip,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub points: f64,
}

impl From<Trip> for TripSummary {
    fn from(trip: Trip) -> Self {
        Self {
            start_time: format_epoch_ms(trip.start_time_ms),
            end_time: format_epoch_ms(trip.end_time_ms),
            points: trip.points(),
            trip,
        }
    }
}

// ─── Drive Sessions ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct IngestRequest {
    #[validate(length(min = 1, max = 128))]
    uid: String,
    /// Bonus applied to trips this session finalizes
    bonus_points: Option<f64>,
    #[validate(length(min = 1, max = MAX_SAMPLES_PER_BATCH), nested)]
    samples: Vec<LocationSample>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub status: MotionState,
    pub emoji: String,
    pub processed: u32,
    /// Trips finalized by this batch; stored in the background
    pub finished_trips: Vec<TripSummary>,
}

/// Feed a batch of fixes into a drive session.
///
/// Fixes are applied in the order given. Finalized trips are handed to the
/// recorder and stored in the background; the response does not wait.
async fn ingest_samples(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>> {
    request.validate()?;

    let handle = state
        .sessions
        .get_or_create(&session_id, &request.uid, request.bonus_points.unwrap_or(0.0))
        .await
        .ok_or_else(|| {
            AppError::Forbidden(format!("Session {} belongs to another user", session_id))
        })?;

    let mut slot = handle.lock().await;
    // Torn down between lookup and lock; the client starts a new session
    let session = slot
        .live_mut()
        .ok_or_else(|| AppError::NotFound(format!("Session {} was closed", session_id)))?;
    if let Some(bonus) = request.bonus_points {
        session.set_bonus_points(bonus);
    }

    let mut finished_trips = Vec::new();
    for sample in &request.samples {
        let outcome = session.process(sample);
        if let Some(trip) = outcome.finished_trip {
            // Submitted under the session lock so writes keep classification order
            let _ = state.recorder.submit(trip.clone());
            finished_trips.push(TripSummary::from(trip));
        }
    }
    let status = session.status();
    drop(slot);

    tracing::debug!(
        session_id = %session_id,
        uid = %request.uid,
        samples = request.samples.len(),
        status = status.label(),
        finished = finished_trips.len(),
        "Samples processed"
    );

    Ok(Json(IngestResponse {
        status,
        emoji: status.emoji().to_string(),
        processed: request.samples.len() as u32,
        finished_trips,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionResponse {
    pub closed: bool,
    /// Drive still in progress at teardown, stored as unfinished
    pub unfinished_trip: Option<TripSummary>,
}

/// Tear a session down (location permission revoked or app backgrounded).
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<CloseSessionResponse>> {
    let open_trip = state
        .sessions
        .close(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

    let unfinished_trip = open_trip.map(|trip| {
        let _ = state.recorder.submit(trip.clone());
        TripSummary::from(trip)
    });

    Ok(Json(CloseSessionResponse {
        closed: true,
        unfinished_trip,
    }))
}

// ─── Trips ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct TripsQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TripsResponse {
    pub trips: Vec<TripSummary>,
}

/// Recent trips for a user, newest first.
///
/// Best effort: a failed read yields an empty list.
async fn get_trips(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Query(params): Query<TripsQuery>,
) -> Result<Json<TripsResponse>> {
    let limit = params.limit.unwrap_or(state.config.trip_history_limit);
    if limit == 0 {
        return Err(AppError::BadRequest(
            "limit must be greater than 0".to_string(),
        ));
    }
    let limit = limit.min(MAX_TRIPS_PER_PAGE);

    let trips = match state.db.get_trips_for_user(&uid, Some(limit)).await {
        Ok(trips) => trips,
        Err(e) => {
            tracing::warn!(uid = %uid, error = %e, "Failed to load trip history");
            Vec::new()
        }
    };

    Ok(Json(TripsResponse {
        trips: trips.into_iter().map(TripSummary::from).collect(),
    }))
}

/// Apply a corrective edit to a stored trip, then rebuild the owner's stats.
async fn correct_trip(
    State(state): State<Arc<AppState>>,
    Path((uid, trip_id)): Path<(String, String)>,
    Json(correction): Json<TripCorrection>,
) -> Result<Json<TripSummary>> {
    correction.validate()?;

    let mut trip = state
        .db
        .get_trip(&trip_id)
        .await?
        .filter(|t| t.uid == uid)
        .ok_or_else(|| AppError::NotFound(format!("Trip {} not found", trip_id)))?;

    correction
        .apply(&mut trip)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    state.db.update_trip(&trip).await?;

    tracing::info!(uid = %uid, trip_id = %trip_id, "Trip corrected");

    if let Err(e) = state.stats_service.recompute_user(&uid).await {
        tracing::warn!(uid = %uid, error = %e, "Stats recomputation after correction failed");
    }

    Ok(Json(TripSummary::from(trip)))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: UserStats,
    pub avg_score: Option<f64>,
}

impl From<UserStats> for StatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            avg_score: stats.avg_score(),
            stats,
        }
    }
}

/// Stored stats for a user (zeroes if none).
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Json<StatsResponse> {
    Json(state.stats_service.user_stats(&uid).await.into())
}

/// Rebuild a user's stats from their trip history.
async fn recompute_user_stats(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<StatsResponse>> {
    let stats = state.stats_service.recompute_user(&uid).await?;
    Ok(Json(stats.into()))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecomputeAllResponse {
    pub users: usize,
}

/// Rebuild every user's stats.
async fn recompute_all_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecomputeAllResponse>> {
    let users = state.stats_service.recompute_all().await?;
    Ok(Json(RecomputeAllResponse { users }))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

async fn get_leaderboard(State(state): State<Arc<AppState>>) -> Json<LeaderboardResponse> {
    Json(LeaderboardResponse {
        entries: state.stats_service.leaderboard().await,
    })
}
