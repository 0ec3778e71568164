// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Running metrics for the drive segment in progress.

use geo::{Distance, Haversine, Point};

use crate::models::LocationSample;

/// Metrics of a closed drive segment, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveSegment {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub distance_meters: f32,
    pub avg_speed_kmh: f32,
    pub max_speed_kmh: f32,
    /// Speeds in arrival order, for scoring
    pub speeds: Vec<f32>,
}

#[derive(Debug, Clone)]
struct OpenSegment {
    start_time_ms: i64,
    last_time_ms: i64,
    last_point: Point<f64>,
    distance_meters: f64,
    speed_sum: f64,
    max_speed_kmh: f32,
    speeds: Vec<f32>,
}

/// Folds Driving samples into the current segment.
#[derive(Debug, Clone, Default)]
pub struct TripAggregator {
    open: Option<OpenSegment>,
}

impl TripAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a segment is currently open.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Number of samples folded into the open segment.
    pub fn sample_count(&self) -> usize {
        self.open.as_ref().map_or(0, |s| s.speeds.len())
    }

    /// Fold a sample classified as Driving.
    pub fn push(&mut self, sample: &LocationSample) {
        let point = sample.point();

        match self.open.as_mut() {
            None => {
                self.open = Some(OpenSegment {
                    start_time_ms: sample.timestamp_ms,
                    last_time_ms: sample.timestamp_ms,
                    last_point: point,
                    distance_meters: 0.0,
                    speed_sum: f64::from(sample.speed_kmh),
                    max_speed_kmh: sample.speed_kmh,
                    speeds: vec![sample.speed_kmh],
                });
            }
            Some(segment) => {
                segment.distance_meters += Haversine.distance(segment.last_point, point);
                segment.last_point = point;
                segment.last_time_ms = sample.timestamp_ms;
                segment.speed_sum += f64::from(sample.speed_kmh);
                segment.max_speed_kmh = segment.max_speed_kmh.max(sample.speed_kmh);
                segment.speeds.push(sample.speed_kmh);
            }
        }
    }

    /// Close the open segment, if any, and reset.
    pub fn finish(&mut self) -> Option<DriveSegment> {
        let segment = self.open.take()?;
        let avg_speed_kmh = (segment.speed_sum / segment.speeds.len() as f64) as f32;

        Some(DriveSegment {
            start_time_ms: segment.start_time_ms,
            end_time_ms: segment.last_time_ms,
            distance_meters: segment.distance_meters as f32,
            avg_speed_kmh,
            // Rounding of the mean must not push it above the max
            max_speed_kmh: segment.max_speed_kmh.max(avg_speed_kmh),
            speeds: segment.speeds,
        })
    }
}
