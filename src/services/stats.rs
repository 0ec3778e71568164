// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stats recomputation and leaderboard ranking.
//!
//! Stored `user-stats` documents are only a cache of trip history. The
//! functions here rebuild them from the `trips` collection, either for one
//! user or for everyone at once, and rank users for the leaderboard.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{LeaderboardEntry, Trip, User, UserStats};

/// Group trips by owner and fold each group into stats.
///
/// Every uid in `known_users` gets an entry, even without trips, so stale
/// counters for users whose trips are gone get zeroed.
pub fn stats_by_user<'a, I>(trips: I, known_users: &[User], now: &str) -> HashMap<String, UserStats>
where
    I: IntoIterator<Item = &'a Trip>,
{
    let mut by_user: HashMap<String, UserStats> = known_users
        .iter()
        .map(|u| {
            (
                u.uid.clone(),
                UserStats {
                    updated_at: now.to_string(),
                    ..UserStats::default()
                },
            )
        })
        .collect();

    for trip in trips {
        let stats = by_user.entry(trip.uid.clone()).or_insert_with(|| UserStats {
            updated_at: now.to_string(),
            ..UserStats::default()
        });
        stats.apply_trip(trip, now);
    }

    by_user
}

/// Rank users by average score.
///
/// Order: average score descending, then trip count descending, then
/// display name ascending (case-insensitive). Users with the same average
/// share a rank; the next different average takes its row position.
/// Users without finished trips are left out.
pub fn build_leaderboard(
    stats: &HashMap<String, UserStats>,
    users: &[User],
) -> Vec<LeaderboardEntry> {
    let profiles: HashMap<&str, &User> = users.iter().map(|u| (u.uid.as_str(), u)).collect();

    let mut rows: Vec<LeaderboardEntry> = stats
        .iter()
        .filter_map(|(uid, s)| {
            let avg_score = s.avg_score()?;
            Some(LeaderboardEntry {
                rank: 0,
                uid: uid.clone(),
                display_name: profiles
                    .get(uid.as_str())
                    .map_or_else(|| uid.clone(), |u| u.display_name()),
                avg_score,
                trip_count: s.trip_count,
                total_points: s.total_points,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.avg_score
            .partial_cmp(&a.avg_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.trip_count.cmp(&a.trip_count))
            .then_with(|| {
                a.display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase())
            })
    });

    let mut previous: Option<(f64, u32)> = None;
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = match previous {
            Some((avg, rank)) if avg == row.avg_score => rank,
            _ => index as u32 + 1,
        };
        previous = Some((row.avg_score, row.rank));
    }

    rows
}

/// Stats operations backed by Firestore.
#[derive(Clone)]
pub struct StatsService {
    db: FirestoreDb,
}

impl StatsService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Stored stats for a user, or zeroes if missing or unreadable.
    pub async fn user_stats(&self, uid: &str) -> UserStats {
        match self.db.get_user_stats(uid).await {
            Ok(stats) => stats.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(uid, error = %e, "Failed to read user stats");
                UserStats::default()
            }
        }
    }

    /// Rebuild one user's stats from their trip history and overwrite the
    /// stored document.
    pub async fn recompute_user(&self, uid: &str) -> Result<UserStats> {
        let trips = self.db.get_trips_for_user(uid, None).await?;
        let now = chrono::Utc::now().to_rfc3339();
        let stats = UserStats::from_trips(&trips, &now);

        self.db.set_user_stats(uid, &stats).await?;

        tracing::info!(
            uid,
            trips = trips.len(),
            trip_count = stats.trip_count,
            total_score = stats.total_score,
            total_points = stats.total_points,
            "User stats recomputed"
        );
        Ok(stats)
    }

    /// Rebuild every user's stats in one pass and write them atomically.
    ///
    /// Returns the number of stats documents written.
    pub async fn recompute_all(&self) -> Result<usize> {
        let (trips, users) = tokio::try_join!(self.db.get_all_trips(), self.db.list_users())?;
        let now = chrono::Utc::now().to_rfc3339();

        let all_stats = stats_by_user(&trips, &users, &now);
        self.db.set_all_user_stats(&all_stats).await?;

        tracing::info!(
            trips = trips.len(),
            users = all_stats.len(),
            "Global stats recomputation complete"
        );
        Ok(all_stats.len())
    }

    /// Current leaderboard, ranked from the stored `user-stats` documents.
    ///
    /// Those documents are kept current by each stored trip and rebuilt by
    /// the recompute operations; trips are not rescanned here. Falls back
    /// to an empty board if the data can't be read.
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let result = tokio::try_join!(self.db.list_user_stats(), self.db.list_users());
        match result {
            Ok((stats, users)) => build_leaderboard(&stats, &users),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load leaderboard data");
                Vec::new()
            }
        }
    }
}
