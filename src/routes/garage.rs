// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite locations and garage (cars): plain CRUD.

use crate::db::collections;
use crate::error::Result;
use crate::models::{Car, FavoriteLocation};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/users/{uid}/favorites",
            get(list_favorites).post(add_favorite),
        )
        .route(
            "/api/users/{uid}/favorites/{favorite_id}",
            delete(delete_favorite),
        )
        .route("/api/users/{uid}/cars", get(list_cars).post(add_car))
        .route("/api/users/{uid}/cars/{car_id}", delete(delete_car))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

// ─── Favorites ───────────────────────────────────────────────

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<FavoriteLocation>>> {
    let favorites = state
        .db
        .list_owned(collections::FAV_LOCATIONS, &uid)
        .await?;
    Ok(Json(favorites))
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(mut favorite): Json<FavoriteLocation>,
) -> Result<Json<FavoriteLocation>> {
    favorite.validate()?;
    favorite.id = None;
    favorite.uid = uid;

    let stored = state
        .db
        .insert_owned(collections::FAV_LOCATIONS, &favorite)
        .await?;

    tracing::info!(uid = %stored.uid, id = ?stored.id, "Favorite location added");
    Ok(Json(stored))
}

async fn delete_favorite(
    State(state): State<Arc<AppState>>,
    Path((uid, favorite_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>> {
    state
        .db
        .delete_owned(collections::FAV_LOCATIONS, &uid, &favorite_id)
        .await?;
    Ok(Json(DeletedResponse { success: true }))
}

// ─── Cars ────────────────────────────────────────────────────

async fn list_cars(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<Car>>> {
    Ok(Json(state.db.list_owned(collections::CARS, &uid).await?))
}

async fn add_car(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(mut car): Json<Car>,
) -> Result<Json<Car>> {
    car.validate()?;
    car.id = None;
    car.uid = uid;

    let stored = state.db.insert_owned(collections::CARS, &car).await?;

    tracing::info!(uid = %stored.uid, id = ?stored.id, "Car added");
    Ok(Json(stored))
}

async fn delete_car(
    State(state): State<Arc<AppState>>,
    Path((uid, car_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>> {
    state
        .db
        .delete_owned(collections::CARS, &uid, &car_id)
        .await?;
    Ok(Json(DeletedResponse { success: true }))
}
