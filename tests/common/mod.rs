// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use drive_tracker::config::Config;
use drive_tracker::db::FirestoreDb;
use drive_tracker::models::LocationSample;
use drive_tracker::routes::create_router;
use drive_tracker::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app with an offline database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        FirestoreDb::new_mock(),
    ));
    (create_router(state.clone()), state)
}

/// Generate a unique uid for test isolation.
#[allow(dead_code)]
pub fn unique_uid(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

/// One fix per second at the given speeds, heading north from `lat`.
#[allow(dead_code)]
pub fn drive_samples(lat: f64, start_ts: i64, speeds: &[f32]) -> Vec<LocationSample> {
    speeds
        .iter()
        .enumerate()
        .map(|(i, &speed)| {
            LocationSample::new(lat + i as f64 * 0.0001, -122.1, speed, start_ts + i as i64 * 1000)
        })
        .collect()
}

/// Stationary fixes every 30 s starting at `start_ts`, long enough to hit
/// the walking timeout.
#[allow(dead_code)]
pub fn parked_samples(lat: f64, start_ts: i64) -> Vec<LocationSample> {
    (0..=11)
        .map(|i| LocationSample::new(lat, -122.1, 0.0, start_ts + i * 30_000))
        .collect()
}
