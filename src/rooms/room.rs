use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppError, AppResult};

#[debug_handler]
pub(crate) async fn room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<i64>,
) -> AppResult<Response> {
    let Some(room) = db::room_by_id(&db_pool, room_id).await? else {
        return Err(AppError::NotFound("room"));
    };

    let viewer = session::current_user(&session, &db_pool).await?;
    let messages = db::room_messages(&db_pool, room.id).await?;
    let participants = db::participants(&db_pool, room.id).await?;

    let mut message_items = String::new();
    for msg in &messages {
        message_items += &res::message_item(msg, viewer.as_ref().map(|u| u.id));
    }

    let mut participant_items = String::new();
    for p in &participants {
        participant_items += &res::participant_item(p);
    }

    let host_controls = match &viewer {
        Some(user) if user.id == room.host_id => format!(
            r#"<p class="controls"><a href="/update-room/{0}">edit</a> <a href="/delete-room/{0}">delete</a></p>"#,
            room.id
        ),
        _ => String::new(),
    };

    let message_form = if viewer.is_some() {
        include_res!(str, "/pages/message_form.html").replace("{room_id}", &room.id.to_string())
    } else {
        r#"<p><a href="/login">Log in</a> to join the conversation.</p>"#.to_string()
    };

    let body = include_res!(str, "/pages/room.html")
        .replace("{nav}", &res::nav(viewer.as_ref()))
        .replace("{room_name}", &res::escape(&room.name))
        .replace("{topic}", &res::escape(&room.topic_name))
        .replace("{host_id}", &room.host_id.to_string())
        .replace("{host}", &res::escape(&room.host_username))
        .replace("{description}", &res::escape(room.description.as_deref().unwrap_or("")))
        .replace("{host_controls}", &host_controls)
        .replace("{messages}", &message_items)
        .replace("{message_form}", &message_form)
        .replace("{participants}", &participant_items);

    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct MessageForm {
    body: String,
}

#[debug_handler]
pub(crate) async fn post_message(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(room_id): Path<i64>,
    Form(MessageForm { body }): Form<MessageForm>,
) -> AppResult<Response> {
    let user = session::require_user(&session, &db_pool).await?;

    let Some(room) = db::room_by_id(&db_pool, room_id).await? else {
        return Err(AppError::NotFound("room"));
    };

    let body = body.trim();
    if !body.is_empty() {
        db::post_message(&db_pool, room.id, user.id, body).await?;
    }

    Ok(Redirect::to(&format!("/room/{}", room.id)).into_response())
}
