use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{db, include_res, session, AppResult};

#[derive(Deserialize)]
pub(crate) struct RegisterForm {
    email: String,
    username: String,
    password1: String,
    password2: String,
}

fn page(flash: &str) -> Html<String> {
    Html(include_res!(str, "/pages/register.html").replace("{flash}", flash))
}

#[debug_handler]
pub(crate) async fn register_page() -> impl IntoResponse {
    page("")
}

fn validate(email: &str, username: &str, password1: &str, password2: &str) -> Result<(), &'static str> {
    if email.is_empty() || !email.contains('@') {
        return Err("Enter a valid email address");
    }
    if username.is_empty() {
        return Err("Enter a username");
    }
    if password1.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password1 != password2 {
        return Err("Passwords do not match");
    }
    Ok(())
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(RegisterForm { email, username, password1, password2 }): Form<RegisterForm>,
) -> AppResult<Response> {
    let email = email.trim().to_lowercase();
    let username = username.trim().to_lowercase();

    if let Err(reason) = validate(&email, &username, &password1, &password2) {
        return Ok(page(reason).into_response());
    }

    let password_hash = super::hash_password(&password1)?;
    let user_id = match db::create_user(&db_pool, &email, &username, &password_hash).await {
        Ok(id) => id,
        // Duplicate email. Generic message, no existence leak.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok(page("An error occurred during registration").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    session.insert(session::USER_ID, user_id).await?;
    tracing::info!(user = %username, "registered");

    Ok(Redirect::to("/").into_response())
}
