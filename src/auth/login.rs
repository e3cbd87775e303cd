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
pub(crate) struct LoginForm {
    email: String,
    password: String,
}

fn page(flash: &str) -> Html<String> {
    Html(include_res!(str, "/pages/login.html").replace("{flash}", flash))
}

#[debug_handler]
pub(crate) async fn login_page() -> impl IntoResponse {
    page("")
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { email, password }): Form<LoginForm>,
) -> AppResult<Response> {
    let email = email.trim().to_lowercase();

    // Same message whether the email is unknown or the password is wrong.
    let Some(user) = db::user_by_email(&db_pool, &email).await? else {
        return Ok(page("Email or password is incorrect").into_response());
    };
    if !super::verify_password(&password, &user.password_hash) {
        return Ok(page("Email or password is incorrect").into_response());
    }

    session.insert(session::USER_ID, user.id).await?;
    tracing::info!(user = %user.username, "logged in");

    Ok(Redirect::to("/").into_response())
}
