// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw location fix as reported by the phone.

use geo::Point;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One location fix. Consumed immediately, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Ground speed in km/h
    #[validate(range(min = 0.0))]
    pub speed_kmh: f32,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, speed_kmh: f32, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            speed_kmh,
            timestamp_ms,
        }
    }

    /// Position as a geo point (x = longitude, y = latitude).
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}
