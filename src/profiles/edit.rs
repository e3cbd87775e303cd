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
pub(crate) struct UserForm {
    username: String,
    email: String,
    avatar: Option<String>,
    bio: Option<String>,
}

/// The form is always bound to the session user; there is no path to edit
/// anyone else through this endpoint.
fn page(user: &db::User, username: &str, email: &str, avatar: &str, bio: &str, flash: &str) -> Html<String> {
    Html(
        include_res!(str, "/pages/update_user.html")
            .replace("{nav}", &res::nav(Some(user)))
            .replace("{username}", &res::escape(username))
            .replace("{email}", &res::escape(email))
            .replace("{avatar}", &res::escape(avatar))
            .replace("{bio}", &res::escape(bio))
            .replace("{flash}", flash),
    )
}

#[debug_handler]
pub(crate) async fn update_user_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let user = session::require_user(&session, &db_pool).await?;
    Ok(page(
        &user,
        &user.username,
        &user.email,
        user.avatar.as_deref().unwrap_or(""),
        user.bio.as_deref().unwrap_or(""),
        "",
    )
    .into_response())
}

#[debug_handler]
pub(crate) async fn update_user(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(UserForm { username, email, avatar, bio }): Form<UserForm>,
) -> AppResult<Response> {
    let user = session::require_user(&session, &db_pool).await?;

    let username = username.trim().to_lowercase();
    let email = email.trim().to_lowercase();
    let avatar = avatar.as_deref().map(str::trim).filter(|a| !a.is_empty());
    let bio = bio.as_deref().map(str::trim).filter(|b| !b.is_empty());

    if username.is_empty() || email.is_empty() || !email.contains('@') {
        return Ok(page(
            &user,
            &username,
            &email,
            avatar.unwrap_or(""),
            bio.unwrap_or(""),
            "Username and a valid email are required",
        )
        .into_response());
    }

    match db::update_user(&db_pool, user.id, &username, &email, avatar, bio).await {
        Ok(()) => {}
        // Someone else already owns that email.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok(page(
                &user,
                &username,
                &email,
                avatar.unwrap_or(""),
                bio.unwrap_or(""),
                "Could not update profile",
            )
            .into_response());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&format!("/profile/{}", user.id)).into_response())
}
