// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip model for storage and API.
//!
//! Documents in the `trips` collection are written by more than one client
//! version, so reads go through [`TripDocument`], where every field is
//! optional, and are then decoded into a [`Trip`]. Documents that fail to
//! decode are skipped by callers rather than failing the whole query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A finalized drive segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Document ID, assigned by Firestore on insert
    pub id: Option<String>,
    /// Owner
    pub uid: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub start_time_ms: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub end_time_ms: i64,
    pub distance_meters: f32,
    pub avg_speed_kmh: f32,
    pub max_speed_kmh: f32,
    /// `false` for segments cut off by a session teardown
    pub finished: bool,
    pub score: f64,
    pub bonus_points: f64,
}

impl Trip {
    /// Points earned by this trip: `score * km + bonus`.
    pub fn points(&self) -> f64 {
        crate::services::scoring::trip_points(self.score, self.distance_meters, self.bonus_points)
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_time_ms - self.start_time_ms
    }
}

/// Raw `trips` document as stored in Firestore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDocument {
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub id: Option<String>,
    #[serde(default, alias = "_firestore_created", skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub start_time_ms: Option<i64>,
    #[serde(default)]
    pub end_time_ms: Option<i64>,
    #[serde(default)]
    pub distance_meters: Option<f32>,
    #[serde(default)]
    pub avg_speed_kmh: Option<f32>,
    #[serde(default)]
    pub max_speed_kmh: Option<f32>,
    /// Absent means finished
    #[serde(default)]
    pub finished: Option<bool>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub bonus_points: Option<f64>,
}

/// Why a stored trip document could not be turned into a [`Trip`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error("malformed document: {0}")]
    Malformed(String),
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::MissingField(field))
}

impl TryFrom<TripDocument> for Trip {
    type Error = DecodeError;

    fn try_from(doc: TripDocument) -> Result<Self, Self::Error> {
        let uid = required(doc.uid, "uid")?;
        let start_time_ms = required(doc.start_time_ms, "startTimeMs")?;
        let end_time_ms = required(doc.end_time_ms, "endTimeMs")?;
        let distance_meters = required(doc.distance_meters, "distanceMeters")?;
        let avg_speed_kmh = required(doc.avg_speed_kmh, "avgSpeedKmh")?;
        let max_speed_kmh = required(doc.max_speed_kmh, "maxSpeedKmh")?;
        let score = required(doc.score, "score")?;

        if uid.is_empty() {
            return Err(DecodeError::InvalidField {
                field: "uid",
                reason: "empty".to_string(),
            });
        }
        if end_time_ms < start_time_ms {
            return Err(DecodeError::InvalidField {
                field: "endTimeMs",
                reason: format!("{} is before startTimeMs {}", end_time_ms, start_time_ms),
            });
        }
        if !distance_meters.is_finite() || distance_meters < 0.0 {
            return Err(DecodeError::InvalidField {
                field: "distanceMeters",
                reason: format!("{} is not a non-negative number", distance_meters),
            });
        }

        Ok(Trip {
            id: doc.id,
            uid,
            start_time_ms,
            end_time_ms,
            distance_meters,
            avg_speed_kmh,
            max_speed_kmh,
            finished: doc.finished.unwrap_or(true),
            score,
            bonus_points: doc.bonus_points.unwrap_or(0.0),
        })
    }
}

impl From<&Trip> for TripDocument {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            created_at: None,
            uid: Some(trip.uid.clone()),
            start_time_ms: Some(trip.start_time_ms),
            end_time_ms: Some(trip.end_time_ms),
            distance_meters: Some(trip.distance_meters),
            avg_speed_kmh: Some(trip.avg_speed_kmh),
            max_speed_kmh: Some(trip.max_speed_kmh),
            finished: Some(trip.finished),
            score: Some(trip.score),
            bonus_points: Some(trip.bonus_points),
        }
    }
}

/// Corrective edit of a stored trip. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct TripCorrection {
    #[validate(range(min = 0.0))]
    pub distance_meters: Option<f32>,
    #[validate(range(min = 0.0))]
    pub avg_speed_kmh: Option<f32>,
    #[validate(range(min = 0.0))]
    pub max_speed_kmh: Option<f32>,
    pub end_time_ms: Option<i64>,
    pub finished: Option<bool>,
    pub score: Option<f64>,
    pub bonus_points: Option<f64>,
}

impl TripCorrection {
    /// Apply the edit, rejecting results that break the trip's own invariants.
    pub fn apply(&self, trip: &mut Trip) -> Result<(), DecodeError> {
        let mut edited = trip.clone();
        if let Some(v) = self.distance_meters {
            edited.distance_meters = v;
        }
        if let Some(v) = self.avg_speed_kmh {
            edited.avg_speed_kmh = v;
        }
        if let Some(v) = self.max_speed_kmh {
            edited.max_speed_kmh = v;
        }
        if let Some(v) = self.end_time_ms {
            edited.end_time_ms = v;
        }
        if let Some(v) = self.finished {
            edited.finished = v;
        }
        if let Some(v) = self.score {
            edited.score = v;
        }
        if let Some(v) = self.bonus_points {
            edited.bonus_points = v;
        }

        if edited.end_time_ms < edited.start_time_ms {
            return Err(DecodeError::InvalidField {
                field: "endTimeMs",
                reason: "before startTimeMs".to_string(),
            });
        }
        if edited.max_speed_kmh < edited.avg_speed_kmh {
            return Err(DecodeError::InvalidField {
                field: "maxSpeedKmh",
                reason: "below avgSpeedKmh".to_string(),
            });
        }

        *trip = edited;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_doc() -> TripDocument {
        TripDocument {
            id: Some("abc".to_string()),
            created_at: None,
            uid: Some("user-1".to_string()),
            start_time_ms: Some(1_000),
            end_time_ms: Some(61_000),
            distance_meters: Some(1200.0),
            avg_speed_kmh: Some(42.0),
            max_speed_kmh: Some(60.0),
            finished: None,
            score: Some(4.8),
            bonus_points: None,
        }
    }

    #[test]
    fn test_decode_full_document() {
        let trip = Trip::try_from(full_doc()).unwrap();
        assert_eq!(trip.id.as_deref(), Some("abc"));
        assert_eq!(trip.uid, "user-1");
        assert!(trip.finished, "absent `finished` counts as finished");
        assert_eq!(trip.bonus_points, 0.0);
        assert_eq!(trip.duration_ms(), 60_000);
    }

    #[test]
    fn test_decode_missing_distance_is_rejected() {
        let doc = TripDocument {
            distance_meters: None,
            ..full_doc()
        };
        assert_eq!(
            Trip::try_from(doc).unwrap_err(),
            DecodeError::MissingField("distanceMeters")
        );
    }

    #[test]
    fn test_decode_end_before_start_is_rejected() {
        let doc = TripDocument {
            end_time_ms: Some(500),
            ..full_doc()
        };
        assert!(matches!(
            Trip::try_from(doc),
            Err(DecodeError::InvalidField {
                field: "endTimeMs",
                ..
            })
        ));
    }

    #[test]
    fn test_document_from_json_with_unknown_fields() {
        let json = r#"{
            "uid": "u",
            "startTimeMs": 10,
            "endTimeMs": 20,
            "distanceMeters": 5,
            "avgSpeedKmh": 12.5,
            "maxSpeedKmh": 30,
            "score": 5.0,
            "finished": false,
            "legacyField": "ignored"
        }"#;
        let doc: TripDocument = serde_json::from_str(json).unwrap();
        let trip = Trip::try_from(doc).unwrap();
        assert!(!trip.finished);
        assert_eq!(trip.distance_meters, 5.0);
    }

    #[test]
    fn test_correction_rejects_max_below_avg() {
        let mut trip = Trip::try_from(full_doc()).unwrap();
        let correction = TripCorrection {
            max_speed_kmh: Some(10.0),
            ..Default::default()
        };
        assert!(correction.apply(&mut trip).is_err());
        assert_eq!(trip.max_speed_kmh, 60.0, "failed edit leaves trip untouched");
    }

    #[test]
    fn test_correction_updates_fields() {
        let mut trip = Trip::try_from(full_doc()).unwrap();
        let correction = TripCorrection {
            distance_meters: Some(1500.0),
            bonus_points: Some(2.0),
            ..Default::default()
        };
        correction.apply(&mut trip).unwrap();
        assert_eq!(trip.distance_meters, 1500.0);
        assert_eq!(trip.bonus_points, 2.0);
    }
}
