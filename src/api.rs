//! Read-only JSON API. Unauthenticated and unfiltered; rooms serialize to
//! ids plus the participant id set.

use axum::{
    debug_handler,
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;

use crate::{db, AppError, AppResult, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_routes))
        .route("/rooms", get(get_rooms))
        .route("/rooms/{id}", get(get_room))
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
pub struct ApiRoom {
    pub id: i64,
    pub host: i64,
    pub topic: i64,
    pub name: String,
    pub description: Option<String>,
    pub participants: Vec<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

impl ApiRoom {
    fn new(room: db::Room, participants: Vec<i64>) -> Self {
        Self {
            id: room.id,
            host: room.host_id,
            topic: room.topic_id,
            name: room.name,
            description: room.description,
            participants,
            created: room.created,
            updated: room.updated,
        }
    }
}

#[debug_handler]
pub(crate) async fn get_routes() -> Json<Vec<&'static str>> {
    Json(vec!["GET /api", "GET /api/rooms", "GET /api/rooms/{id}"])
}

#[debug_handler]
pub(crate) async fn get_rooms(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<ApiRoom>>> {
    let rooms = db::all_rooms(&db_pool).await?;

    // One participant query per room; the room count here is small and the
    // endpoint is unpaginated anyway.
    let mut out = Vec::with_capacity(rooms.len());
    for room in rooms {
        let participants = db::participant_ids(&db_pool, room.id).await?;
        out.push(ApiRoom::new(room, participants));
    }

    Ok(Json(out))
}

#[debug_handler]
pub(crate) async fn get_room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
) -> AppResult<Json<ApiRoom>> {
    let Some(room) = db::room_row(&db_pool, room_id).await? else {
        return Err(AppError::NotFound("room"));
    };
    let participants = db::participant_ids(&db_pool, room.id).await?;
    Ok(Json(ApiRoom::new(room, participants)))
}
