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
pub(crate) struct TopicQuery {
    pub(crate) q: Option<String>,
}

#[debug_handler]
pub async fn topics_page(
    Query(TopicQuery { q }): Query<TopicQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let q = q.unwrap_or_default();
    let user = session::current_user(&session, &db_pool).await?;
    let topics = db::topics_filtered(&db_pool, &q).await?;

    let mut topic_items = String::new();
    for topic in &topics {
        topic_items += &res::topic_item(topic);
    }

    let body = include_res!(str, "/pages/topics.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{q}", &res::escape(&q))
        .replace("{topics}", &topic_items);

    Ok(Html(body).into_response())
}
