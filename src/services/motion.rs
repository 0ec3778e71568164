// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Movement classification from speed and time.
//!
//! The classifier is a pure function of `(state, sample)`. Its only memory
//! is two timestamps: when the vehicle was last seen at driving speed, and
//! when the current slow interval began.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::LocationSample;

/// At or above this speed (km/h) the vehicle is driving.
pub const DRIVING_SPEED_KMH: f32 = 10.0;
/// A slow interval this long (ms) means the user has left the car.
pub const STILLNESS_TIMEOUT_MS: i64 = 300_000;

/// Discrete movement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    NoMove,
    Walking,
    Driving,
}

impl MotionState {
    pub fn label(&self) -> &'static str {
        match self {
            MotionState::NoMove => "stopped",
            MotionState::Walking => "walking",
            MotionState::Driving => "driving",
        }
    }

    /// Category icon shown in the app's status bar.
    pub fn emoji(&self) -> &'static str {
        match self {
            MotionState::NoMove => "🛑",
            MotionState::Walking => "🚶",
            MotionState::Driving => "🚗",
        }
    }
}

/// Timestamps the classifier carries between samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub last_drive_timestamp: Option<i64>,
    pub stop_start_timestamp: Option<i64>,
}

/// Classify one sample.
///
/// Timestamps are not checked for monotonicity: a backdated sample yields a
/// negative elapsed time, which never reaches the stillness timeout.
pub fn classify(state: ClassifierState, sample: &LocationSample) -> (ClassifierState, MotionState) {
    if sample.speed_kmh >= DRIVING_SPEED_KMH {
        let next = ClassifierState {
            last_drive_timestamp: Some(sample.timestamp_ms),
            stop_start_timestamp: None,
        };
        return (next, MotionState::Driving);
    }

    let stop_start = state.stop_start_timestamp.unwrap_or(sample.timestamp_ms);
    let next = ClassifierState {
        last_drive_timestamp: state.last_drive_timestamp,
        stop_start_timestamp: Some(stop_start),
    };

    let elapsed = sample.timestamp_ms.saturating_sub(stop_start);
    let status = if elapsed >= STILLNESS_TIMEOUT_MS {
        MotionState::Walking
    } else if state.last_drive_timestamp.is_some() {
        MotionState::Driving
    } else {
        MotionState::NoMove
    };

    (next, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(speed: f32, ts: i64) -> LocationSample {
        LocationSample::new(37.0, -122.0, speed, ts)
    }

    fn run(state: ClassifierState, samples: &[LocationSample]) -> (ClassifierState, MotionState) {
        samples.iter().fold((state, MotionState::NoMove), |(s, _), smp| {
            classify(s, smp)
        })
    }

    #[test]
    fn test_driving_speed_always_drives() {
        let priors = [
            ClassifierState::default(),
            ClassifierState {
                last_drive_timestamp: Some(1),
                stop_start_timestamp: Some(2),
            },
            ClassifierState {
                last_drive_timestamp: None,
                stop_start_timestamp: Some(0),
            },
        ];
        for prior in priors {
            let (next, status) = classify(prior, &sample(15.0, 1_000_000));
            assert_eq!(status, MotionState::Driving);
            assert_eq!(next.last_drive_timestamp, Some(1_000_000));
            assert_eq!(next.stop_start_timestamp, None);
        }
    }

    #[test]
    fn test_exact_threshold_counts_as_driving() {
        let (_, status) = classify(ClassifierState::default(), &sample(10.0, 0));
        assert_eq!(status, MotionState::Driving);
    }

    #[test]
    fn test_walking_after_five_slow_minutes() {
        let prior = ClassifierState {
            last_drive_timestamp: Some(0),
            stop_start_timestamp: None,
        };
        let samples: Vec<_> = (1..=301).map(|s| sample(3.0, s * 1000)).collect();

        // Stop starts at 1000 ms; the 300th sample is only 299 s later.
        let (_, status) = run(prior, &samples[..300]);
        assert_eq!(status, MotionState::Driving);

        let (state, status) = run(prior, &samples);
        assert_eq!(status, MotionState::Walking);
        assert_eq!(state.stop_start_timestamp, Some(1000));
        assert_eq!(state.last_drive_timestamp, Some(0));
    }

    #[test]
    fn test_no_move_without_prior_drive() {
        let state = ClassifierState::default();
        let (state, status) = classify(state, &sample(0.0, 10_000));
        assert_eq!(status, MotionState::NoMove);
        let (state, status) = classify(state, &sample(2.0, 309_999));
        assert_eq!(status, MotionState::NoMove);
        let (_, status) = classify(state, &sample(2.0, 310_000));
        assert_eq!(status, MotionState::Walking);
    }

    #[test]
    fn test_backdated_sample_keeps_negative_elapsed() {
        let state = ClassifierState {
            last_drive_timestamp: None,
            stop_start_timestamp: Some(1_000_000),
        };
        // 600 s *before* the stop started: elapsed is negative, not clamped
        let (next, status) = classify(state, &sample(0.0, 400_000));
        assert_eq!(status, MotionState::NoMove);
        assert_eq!(next.stop_start_timestamp, Some(1_000_000));
    }

    #[test]
    fn test_labels_and_emoji() {
        assert_eq!(MotionState::NoMove.label(), "stopped");
        assert_eq!(MotionState::Walking.emoji(), "🚶");
        assert_eq!(MotionState::Driving.label(), "driving");
    }
}
