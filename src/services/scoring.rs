// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driving-quality score for a finished trip.
//!
//! Every trip starts at [`BASE_SCORE`] and loses [`HARSH_EVENT_PENALTY`] for
//! each harsh acceleration or braking event. The score is not clamped and
//! can go negative on a long, aggressive drive.

/// Score of a trip with no harsh events.
pub const BASE_SCORE: f64 = 5.0;
/// Deducted per harsh event.
pub const HARSH_EVENT_PENALTY: f64 = 0.1;
/// Speed change between consecutive fixes (km/h) above which the change
/// counts as harsh. Fixes arrive at ~1 Hz, so this is roughly 2.8 m/s².
pub const HARSH_DELTA_KMH: f32 = 10.0;

/// Result of scoring one trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripScore {
    pub score: f64,
    pub harsh_accelerations: u32,
    pub harsh_brakes: u32,
}

impl TripScore {
    pub fn harsh_events(&self) -> u32 {
        self.harsh_accelerations + self.harsh_brakes
    }
}

/// Score a trip from its speed samples, in the order they were recorded.
pub fn score_speeds(speeds: &[f32]) -> TripScore {
    let mut result = TripScore {
        score: BASE_SCORE,
        harsh_accelerations: 0,
        harsh_brakes: 0,
    };

    for pair in speeds.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > HARSH_DELTA_KMH {
            result.harsh_accelerations += 1;
        } else if delta < -HARSH_DELTA_KMH {
            result.harsh_brakes += 1;
        } else {
            continue;
        }
        result.score -= HARSH_EVENT_PENALTY;
    }

    result
}

/// Points for a trip: score weighted by distance in km, plus bonus.
pub fn trip_points(score: f64, distance_meters: f32, bonus_points: f64) -> f64 {
    score * (f64::from(distance_meters) / 1000.0) + bonus_points
}
