use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppError, AppResult};

#[debug_handler]
pub(crate) async fn user_profile(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(user_id): Path<i64>,
) -> AppResult<Response> {
    let Some(user) = db::user_by_id(&db_pool, user_id).await? else {
        return Err(AppError::NotFound("user"));
    };

    let viewer = session::current_user(&session, &db_pool).await?;
    let rooms = db::rooms_by_host(&db_pool, user.id).await?;
    let messages = db::messages_by_user(&db_pool, user.id).await?;
    let topics = db::topics_filtered(&db_pool, "").await?;

    let mut room_items = String::new();
    for room in &rooms {
        room_items += &res::room_item(room);
    }

    let mut feed_items = String::new();
    for msg in &messages {
        feed_items += &res::feed_item(msg);
    }

    let mut topic_items = String::new();
    for topic in &topics {
        topic_items += &res::topic_item(topic);
    }

    let avatar = match &user.avatar {
        Some(url) => format!(r#"<img class="avatar" src="{}" alt="avatar">"#, res::escape(url)),
        None => String::new(),
    };

    let edit_link = match &viewer {
        Some(v) if v.id == user.id => r#"<a href="/update-profile">Edit profile</a>"#,
        _ => "",
    };

    let body = include_res!(str, "/pages/profile.html")
        .replace("{nav}", &res::nav(viewer.as_ref()))
        .replace("{username}", &res::escape(&user.username))
        .replace("{avatar}", &avatar)
        .replace("{bio}", &res::escape(user.bio.as_deref().unwrap_or("")))
        .replace("{edit_link}", edit_link)
        .replace("{topics}", &topic_items)
        .replace("{rooms}", &room_items)
        .replace("{feed}", &feed_items);

    Ok(Html(body).into_response())
}
