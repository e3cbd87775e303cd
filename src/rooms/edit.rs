use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, session, AppError, AppResult};

use super::new::{form_page, RoomForm};

/// Auth, then existence, then ownership. Only the host gets past this.
pub(crate) async fn host_room(
    db_pool: &SqlitePool,
    session: &Session,
    room_id: i64,
) -> AppResult<(db::User, db::RoomListing)> {
    let user = session::require_user(session, db_pool).await?;
    let Some(room) = db::room_by_id(db_pool, room_id).await? else {
        return Err(AppError::NotFound("room"));
    };
    if room.host_id != user.id {
        return Err(AppError::NotAllowed);
    }
    Ok((user, room))
}

#[debug_handler]
pub(crate) async fn update_room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let (user, room) = host_room(&db_pool, &session, room_id).await?;

    Ok(form_page(
        &db_pool,
        &user,
        "Update Room",
        &format!("/update-room/{}", room.id),
        &room.topic_name,
        &room.name,
        room.description.as_deref().unwrap_or(""),
        "",
    )
    .await?
    .into_response())
}

#[debug_handler]
pub(crate) async fn update_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<i64>,
    Form(RoomForm { topic, name, description }): Form<RoomForm>,
) -> AppResult<Response> {
    let (user, room) = host_room(&db_pool, &session, room_id).await?;

    let topic = topic.trim().to_string();
    let name = name.trim().to_string();
    let description = description.as_deref().map(str::trim).filter(|d| !d.is_empty());

    if topic.is_empty() || name.is_empty() {
        return Ok(form_page(
            &db_pool,
            &user,
            "Update Room",
            &format!("/update-room/{}", room.id),
            &topic,
            &name,
            description.unwrap_or(""),
            "Topic and room name are required",
        )
        .await?
        .into_response());
    }

    let topic = db::upsert_topic(&db_pool, &topic).await?;
    db::update_room(&db_pool, room.id, topic.id, &name, description).await?;

    Ok(Redirect::to("/").into_response())
}
