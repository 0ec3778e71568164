// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drive-Tracker: trip detection and scoring for the car companion app
//!
//! This crate turns the phone's stream of location fixes into movement
//! status, finished trips with a driving score, and per-user statistics
//! that feed the leaderboard.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{SessionRegistry, StatsService, TripRecorder};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub sessions: SessionRegistry,
    pub recorder: TripRecorder,
    pub stats_service: StatsService,
}

impl AppState {
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(),
            recorder: TripRecorder::new(db.clone()),
            stats_service: StatsService::new(db.clone()),
            db,
        }
    }
}
