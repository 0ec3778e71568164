// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod leaderboard;
pub mod sample;
pub mod stats;
pub mod trip;
pub mod user;

pub use leaderboard::LeaderboardEntry;
pub use sample::LocationSample;
pub use stats::UserStats;
pub use trip::{DecodeError, Trip, TripCorrection, TripDocument};
pub use user::{Car, FavoriteLocation, User};
