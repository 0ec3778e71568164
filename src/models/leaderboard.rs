// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard row model.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One ranked user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub uid: String,
    pub display_name: String,
    pub avg_score: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub trip_count: i64,
    pub total_points: f64,
}
