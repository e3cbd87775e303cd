use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppError, AppResult};

/// Authentication is checked before ownership, so an anonymous caller gets a
/// login redirect rather than a fault.
async fn author_message(
    db_pool: &SqlitePool,
    session: &Session,
    message_id: i64,
) -> AppResult<(db::User, db::Message)> {
    let user = session::require_user(session, db_pool).await?;
    let Some(message) = db::message_by_id(db_pool, message_id).await? else {
        return Err(AppError::NotFound("message"));
    };
    if message.user_id != user.id {
        return Err(AppError::NotAllowed);
    }
    Ok((user, message))
}

#[debug_handler]
pub(crate) async fn delete_message_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let (user, message) = author_message(&db_pool, &session, message_id).await?;

    let body = include_res!(str, "/pages/delete.html")
        .replace("{nav}", &res::nav(Some(&user)))
        .replace("{obj}", &res::escape(&message.body))
        .replace("{action}", &format!("/delete-message/{}", message.id));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn delete_message(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(message_id): Path<i64>,
) -> AppResult<Response> {
    let (user, message) = author_message(&db_pool, &session, message_id).await?;

    db::delete_message(&db_pool, message.id).await?;
    tracing::info!(message = message.id, author = user.id, "message deleted");

    Ok(Redirect::to("/").into_response())
}
