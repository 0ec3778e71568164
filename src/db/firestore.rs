// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (email, for leaderboard names)
//! - Trips (finalized drive segments)
//! - User stats (materialized aggregates)
//! - Favorite locations and cars (plain CRUD)

use std::collections::HashMap;

use gcloud_sdk::google::firestore::v1::Document;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::db::collections;
use crate::error::AppError;
use crate::models::{DecodeError, Trip, TripDocument, User, UserStats};

/// Firestore rejects transactions with more writes than this.
pub const MAX_TRANSACTION_WRITES: usize = 500;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Just enough of an owned document to check who it belongs to.
#[derive(Deserialize)]
struct OwnerField {
    #[serde(default)]
    uid: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        let user: Option<User> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(user.map(|mut u| {
            u.uid = uid.to_string();
            u
        }))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.uid)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List every user profile.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Trip Operations ─────────────────────────────────────────

    /// Store a new trip and return it with its generated document ID.
    pub async fn insert_trip(&self, trip: &Trip) -> Result<Trip, AppError> {
        let stored: TripDocument = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::TRIPS)
            .generate_document_id()
            .object(&TripDocument::from(trip))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut trip = trip.clone();
        trip.id = stored.id;
        Ok(trip)
    }

    /// Get a single trip by document ID.
    ///
    /// Unlike list reads, a trip asked for by ID that fails to decode is an
    /// error rather than silently missing.
    pub async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        let doc = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .one(trip_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        doc.map(|d| {
            decode_trip(&d).map_err(|reason| AppError::CorruptTrip {
                trip_id: trip_id.to_string(),
                reason,
            })
        })
        .transpose()
    }

    /// Get a user's trips, most recent first.
    ///
    /// Documents that fail to decode are skipped.
    pub async fn get_trips_for_user(
        &self,
        uid: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Trip>, AppError> {
        let uid = uid.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("uid").eq(uid.clone()))
            .order_by([(
                "startTimeMs",
                firestore::FirestoreQueryDirection::Descending,
            )]);

        let docs = match limit {
            Some(limit) => query.limit(limit).query().await,
            None => query.query().await,
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(decode_trips(docs))
    }

    /// Get every trip in the collection (global stats recomputation).
    pub async fn get_all_trips(&self) -> Result<Vec<Trip>, AppError> {
        let docs = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(decode_trips(docs))
    }

    /// Overwrite a stored trip (corrective edits).
    pub async fn update_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let trip_id = trip
            .id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Trip has no ID".to_string()))?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TRIPS)
            .document_id(trip_id)
            .object(&TripDocument::from(trip))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── User Stats Operations ──────────────────────────────────

    /// Get user stats aggregate document.
    ///
    /// Stored in `user-stats` collection, keyed by uid.
    pub async fn get_user_stats(&self, uid: &str) -> Result<Option<UserStats>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every stored stats document, keyed by uid.
    ///
    /// Documents that fail to decode are skipped.
    pub async fn list_user_stats(&self) -> Result<HashMap<String, UserStats>, AppError> {
        let docs = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USER_STATS)
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs
            .iter()
            .filter_map(|doc| {
                let uid = document_id(doc)?;
                match firestore::FirestoreDb::deserialize_doc_to::<UserStats>(doc) {
                    Ok(stats) => Some((uid.to_string(), stats)),
                    Err(e) => {
                        tracing::warn!(document = %doc.name, error = %e, "Skipping undecodable stats");
                        None
                    }
                }
            })
            .collect())
    }

    /// Store user stats aggregate document (full overwrite).
    pub async fn set_user_stats(&self, uid: &str, stats: &UserStats) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_STATS)
            .document_id(uid)
            .object(stats)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Fold one newly stored trip into the user's stats.
    ///
    /// Read-modify-write without a transaction: concurrent updates for the
    /// same user are last-writer-wins. A recomputation repairs any drift.
    pub async fn add_trip_to_stats(&self, trip: &Trip) -> Result<UserStats, AppError> {
        let mut stats = self.get_user_stats(&trip.uid).await?.unwrap_or_default();
        let now = chrono::Utc::now().to_rfc3339();

        if stats.apply_trip(trip, &now) {
            self.set_user_stats(&trip.uid, &stats).await?;
        }
        Ok(stats)
    }

    /// Write stats for many users in a single transaction.
    ///
    /// Either every document is written or none is. More than
    /// [`MAX_TRANSACTION_WRITES`] documents cannot be written atomically,
    /// so that is refused up front rather than sent to Firestore.
    pub async fn set_all_user_stats(
        &self,
        all_stats: &HashMap<String, UserStats>,
    ) -> Result<(), AppError> {
        if all_stats.len() > MAX_TRANSACTION_WRITES {
            tracing::warn!(
                users = all_stats.len(),
                limit = MAX_TRANSACTION_WRITES,
                "Too many users for an atomic stats write"
            );
            return Err(AppError::Database(format!(
                "{} stats documents exceed the transaction limit of {}",
                all_stats.len(),
                MAX_TRANSACTION_WRITES
            )));
        }

        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (uid, stats) in all_stats {
            client
                .fluent()
                .update()
                .in_col(collections::USER_STATS)
                .document_id(uid)
                .object(stats)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add stats for {} to transaction: {}",
                        uid, e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(users = all_stats.len(), "User stats written atomically");
        Ok(())
    }

    // ─── Owned Record Operations (favorites, cars) ───────────────

    /// List records in `collection` owned by `uid`.
    pub async fn list_owned<T>(&self, collection: &str, uid: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field("uid").eq(uid.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a record with a generated document ID; returns it as stored.
    pub async fn insert_owned<T>(&self, collection: &str, record: &T) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        self.get_client()?
            .fluent()
            .insert()
            .into(collection)
            .generate_document_id()
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a record if it belongs to `uid`.
    pub async fn delete_owned(
        &self,
        collection: &str,
        uid: &str,
        document_id: &str,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let owner: Option<OwnerField> = client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(document_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match owner {
            Some(owner) if owner.uid == uid => {}
            _ => {
                return Err(AppError::NotFound(format!(
                    "{} {} not found",
                    collection, document_id
                )))
            }
        }

        client
            .fluent()
            .delete()
            .from(collection)
            .document_id(document_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(collection, uid, document_id, "Deleted owned record");
        Ok(())
    }
}

/// Decode raw trip documents, skipping any that fail.
fn decode_trips(docs: Vec<Document>) -> Vec<Trip> {
    docs.into_iter()
        .filter_map(|doc| match decode_trip(&doc) {
            Ok(trip) => Some(trip),
            Err(e) => {
                tracing::warn!(document = %doc.name, error = %e, "Skipping undecodable trip");
                None
            }
        })
        .collect()
}

fn decode_trip(doc: &Document) -> Result<Trip, DecodeError> {
    let raw: TripDocument = firestore::FirestoreDb::deserialize_doc_to(doc)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Trip::try_from(raw)
}

/// Last path segment of a document name.
fn document_id(doc: &Document) -> Option<&str> {
    doc.name.rsplit('/').next().filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id() {
        let doc = Document {
            name: "projects/p/databases/(default)/documents/user-stats/alice".to_string(),
            ..Default::default()
        };
        assert_eq!(document_id(&doc), Some("alice"));
        assert_eq!(document_id(&Document::default()), None);
    }

    #[tokio::test]
    async fn test_oversized_stats_write_refused() {
        let db = FirestoreDb::new_mock();
        let all_stats: HashMap<String, UserStats> = (0..=MAX_TRANSACTION_WRITES)
            .map(|i| (format!("user-{}", i), UserStats::default()))
            .collect();

        match db.set_all_user_stats(&all_stats).await {
            Err(AppError::Database(msg)) => assert!(msg.contains("transaction limit")),
            other => panic!("expected transaction limit error, got {:?}", other),
        }

        // Within the limit the write is attempted (and fails offline)
        let small: HashMap<String, UserStats> =
            HashMap::from([("alice".to_string(), UserStats::default())]);
        match db.set_all_user_stats(&small).await {
            Err(AppError::Database(msg)) => assert!(msg.contains("offline")),
            other => panic!("expected offline error, got {:?}", other),
        }
    }
}
