use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, AppError, AppResult};

pub const USER_ID: &str = "user_id";

/// The authenticated user behind the session cookie, if any. A stale session
/// pointing at a missing row reads as logged out.
pub async fn current_user(session: &Session, pool: &SqlitePool) -> AppResult<Option<db::User>> {
    let Some(user_id) = session.get::<i64>(USER_ID).await? else {
        return Ok(None);
    };
    Ok(db::user_by_id(pool, user_id).await?)
}

pub async fn require_user(session: &Session, pool: &SqlitePool) -> AppResult<db::User> {
    current_user(session, pool)
        .await?
        .ok_or(AppError::LoginRequired)
}
