use axum::{
    debug_handler,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    pub(crate) q: Option<String>,
}

#[debug_handler]
pub async fn home(
    Query(SearchQuery { q }): Query<SearchQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let q = q.unwrap_or_default();
    let user = session::current_user(&session, &db_pool).await?;

    let rooms = db::search_rooms(&db_pool, &q).await?;
    let topics = db::topics_filtered(&db_pool, "").await?;
    let feed = db::feed_for_query(&db_pool, &q).await?;

    let mut room_items = String::new();
    for room in &rooms {
        room_items += &res::room_item(room);
    }

    let mut topic_items = String::new();
    for topic in topics.iter().take(5) {
        topic_items += &res::topic_item(topic);
    }

    let mut feed_items = String::new();
    for msg in &feed {
        feed_items += &res::feed_item(msg);
    }

    let body = include_res!(str, "/pages/index.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{q}", &res::escape(&q))
        .replace("{room_count}", &rooms.len().to_string())
        .replace("{rooms}", &room_items)
        .replace("{topics}", &topic_items)
        .replace("{feed}", &feed_items);

    Ok(Html(body).into_response())
}
