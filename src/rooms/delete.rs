use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

use super::edit::host_room;

#[debug_handler]
pub(crate) async fn delete_room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let (user, room) = host_room(&db_pool, &session, room_id).await?;

    let body = include_res!(str, "/pages/delete.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{obj}", &res::escape(&room.name))
        .replace("{action}", &format!("/delete-room/{}", room.id));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn delete_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let (user, room) = host_room(&db_pool, &session, room_id).await?;

    db::delete_room(&db_pool, room.id).await?;
    tracing::info!(room = room.id, host = user.id, "room deleted");

    Ok(Redirect::to("/").into_response())
}
