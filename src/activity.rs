use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, res, session, AppResult};

/// Global feed: every message in the system, newest first.
#[debug_handler]
pub async fn activity_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let user = session::current_user(&session, &db_pool).await?;
    let messages = db::all_messages(&db_pool).await?;

    let mut feed_items = String::new();
    for msg in &messages {
        feed_items += &res::feed_item(msg);
    }

    let body = include_res!(str, "/pages/activity.html")
        .replace("{nav}", &res::nav(user.as_ref()))
        .replace("{feed}", &feed_items);

    Ok(Html(body).into_response())
}
