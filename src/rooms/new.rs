use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

#[derive(Deserialize)]
pub(crate) struct RoomForm {
    pub(crate) topic: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
}

/// Shared create/update form. Existing topics go into a datalist so hosts can
/// reuse one or type a brand-new name.
pub(crate) async fn form_page(
    db_pool: &SqlitePool,
    user: &db::User,
    title: &str,
    action: &str,
    topic: &str,
    name: &str,
    description: &str,
    flash: &str,
) -> AppResult<Html<String>> {
    let topics = db::topics_filtered(db_pool, "").await?;
    let mut topic_options = String::new();
    for t in &topics {
        topic_options += &format!(r#"<option value="{}">"#, res::escape(&t.name));
    }

    Ok(Html(
        include_res!(str, "/pages/room_form.html")
            .replace("{nav}", &res::nav(Some(user)))
            .replace("{title}", title)
            .replace("{action}", action)
            .replace("{topic_options}", &topic_options)
            .replace("{topic}", &res::escape(topic))
            .replace("{name}", &res::escape(name))
            .replace("{description}", &res::escape(description))
            .replace("{flash}", flash),
    ))
}

#[debug_handler]
pub(crate) async fn create_room_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let user = session::require_user(&session, &db_pool).await?;
    Ok(form_page(&db_pool, &user, "Create Room", "/create-room", "", "", "", "")
        .await?
        .into_response())
}

#[debug_handler]
pub(crate) async fn create_room(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RoomForm { topic, name, description }): Form<RoomForm>,
) -> AppResult<Response> {
    let user = session::require_user(&session, &db_pool).await?;

    let topic = topic.trim().to_string();
    let name = name.trim().to_string();
    let description = description.as_deref().map(str::trim).filter(|d| !d.is_empty());

    if topic.is_empty() || name.is_empty() {
        return Ok(form_page(
            &db_pool,
            &user,
            "Create Room",
            "/create-room",
            &topic,
            &name,
            description.unwrap_or(""),
            "Topic and room name are required",
        )
        .await?
        .into_response());
    }

    let topic = db::upsert_topic(&db_pool, &topic).await?;
    let room_id = db::create_room(&db_pool, user.id, topic.id, &name, description).await?;
    tracing::info!(room = room_id, host = user.id, "room created");

    Ok(Redirect::to("/").into_response())
}
