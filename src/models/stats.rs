// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user statistics aggregate.
//!
//! This is a materialized view over the user's finished trips. It can be
//! rebuilt from trip history at any time with [`UserStats::from_trips`].

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Trip;

/// Aggregate counters for one user.
///
/// Stored at: `user-stats/{uid}` (full overwrite on every write).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Number of finished trips
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub trip_count: i64,
    /// Sum of trip scores
    #[serde(default)]
    pub total_score: f64,
    /// Sum of `score * km + bonus` over trips
    #[serde(default)]
    pub total_points: f64,
    /// Last update timestamp (ISO 8601)
    #[serde(default)]
    pub updated_at: String,
}

impl UserStats {
    /// Fold a trip into the counters.
    ///
    /// Returns `false` (and leaves the counters alone) for unfinished trips.
    pub fn apply_trip(&mut self, trip: &Trip, now: &str) -> bool {
        if !trip.finished {
            return false;
        }

        self.trip_count += 1;
        self.total_score += trip.score;
        self.total_points += trip.points();
        self.updated_at = now.to_string();
        true
    }

    /// Rebuild stats from a user's complete trip history.
    pub fn from_trips<'a, I>(trips: I, now: &str) -> Self
    where
        I: IntoIterator<Item = &'a Trip>,
    {
        let mut stats = Self {
            updated_at: now.to_string(),
            ..Self::default()
        };
        for trip in trips {
            stats.apply_trip(trip, now);
        }
        stats
    }

    /// Average score per trip, or `None` with no trips.
    pub fn avg_score(&self) -> Option<f64> {
        if self.trip_count > 0 {
            Some(self.total_score / self.trip_count as f64)
        } else {
            None
        }
    }
}
