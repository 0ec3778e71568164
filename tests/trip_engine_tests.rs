// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end checks of the trip engine through its public API.
//!
//! These run offline: classification, aggregation, scoring and stats
//! folding are all pure.

use drive_tracker::models::{LocationSample, UserStats};
use drive_tracker::services::stats::{build_leaderboard, stats_by_user};
use drive_tracker::services::{classify, ClassifierState, DriveSession, MotionState};
use geo::{Distance, Haversine};
use std::collections::HashMap;

mod common;
use common::{drive_samples, parked_samples};

#[test]
fn test_fast_sample_drives_from_any_state() {
    let states = [
        ClassifierState::default(),
        ClassifierState {
            last_drive_timestamp: Some(10),
            stop_start_timestamp: Some(20),
        },
    ];
    for state in states {
        let (next, status) = classify(state, &LocationSample::new(0.0, 0.0, 15.0, 99_000));
        assert_eq!(status, MotionState::Driving);
        assert_eq!(next.last_drive_timestamp, Some(99_000));
    }
}

#[test]
fn test_slow_samples_promote_to_walking() {
    let mut state = ClassifierState {
        last_drive_timestamp: Some(0),
        stop_start_timestamp: None,
    };
    let mut status = MotionState::Driving;
    for ts in (1_000..=301_000).step_by(10_000) {
        (state, status) = classify(state, &LocationSample::new(0.0, 0.0, 4.0, ts));
    }
    assert_eq!(status, MotionState::Walking);
}

#[test]
fn test_session_metrics_match_samples() {
    let speeds = [12.0, 18.0, 26.0, 33.0, 40.0, 38.0, 30.0, 22.0, 15.0];
    let driving = drive_samples(37.40, 0, &speeds);

    let mut session = DriveSession::new("metrics", 0.0);
    for sample in &driving {
        assert!(session.process(sample).finished_trip.is_none());
    }
    // Leaving the car: zero speed, same place, until the walking timeout
    let mut trip = None;
    for sample in parked_samples(driving[driving.len() - 1].latitude, 9_000) {
        if let Some(t) = session.process(&sample).finished_trip {
            trip = Some(t);
        }
    }
    let trip = trip.expect("trip finalized when walking starts");

    // Parked fixes before the timeout still count as Driving
    let parked_in_trip = 10;
    let expected_distance: f64 = driving
        .windows(2)
        .map(|w| Haversine.distance(w[0].point(), w[1].point()))
        .sum();
    let expected_avg = speeds.iter().map(|&s| f64::from(s)).sum::<f64>()
        / (speeds.len() + parked_in_trip) as f64;

    assert!((f64::from(trip.distance_meters) - expected_distance).abs() < 0.05);
    assert_eq!(trip.max_speed_kmh, 40.0);
    assert!((f64::from(trip.avg_speed_kmh) - expected_avg).abs() < 1e-4);
    assert_eq!(trip.start_time_ms, 0);
    assert_eq!(trip.end_time_ms, 9_000 + 9 * 30_000);
    // 15 -> 0 when parking is the only harsh event
    assert!((trip.score - 4.9).abs() < 1e-9);
}

#[test]
fn test_recomputation_invariant_and_idempotence() {
    let mut session = DriveSession::new("stats", 1.0);
    let mut trips = Vec::new();
    let mut ts = 0;
    for _ in 0..3 {
        for sample in drive_samples(37.40, ts, &[20.0, 25.0, 30.0, 28.0])
            .into_iter()
            .chain(parked_samples(37.4003, ts + 4_000))
        {
            trips.extend(session.process(&sample).finished_trip);
        }
        ts += 1_000_000;
    }
    assert_eq!(trips.len(), 3);

    let first = stats_by_user(&trips, &[], "t");
    let second = stats_by_user(&trips, &[], "t");
    assert_eq!(first, second);

    let stats = &first["stats"];
    assert_eq!(stats.trip_count, 3);
    let total_score: f64 = trips.iter().map(|t| t.score).sum();
    let total_points: f64 = trips
        .iter()
        .map(|t| t.score * f64::from(t.distance_meters) / 1000.0 + t.bonus_points)
        .sum();
    assert!((stats.total_score - total_score).abs() < 1e-9);
    assert!((stats.total_points - total_points).abs() < 1e-9);
}

#[test]
fn test_leaderboard_dense_ties() {
    let stats = |trip_count: i64, avg: f64| UserStats {
        trip_count,
        total_score: avg * trip_count as f64,
        ..UserStats::default()
    };
    let mut all = HashMap::new();
    all.insert("ten".to_string(), stats(10, 4.5));
    all.insert("five".to_string(), stats(5, 4.5));
    all.insert("twenty".to_string(), stats(20, 3.0));

    let board = build_leaderboard(&all, &[]);
    let rows: Vec<(&str, u32)> = board.iter().map(|r| (r.uid.as_str(), r.rank)).collect();
    assert_eq!(rows, vec![("ten", 1), ("five", 1), ("twenty", 3)]);
}
