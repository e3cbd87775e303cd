pub mod activity;
pub mod api;
pub mod auth;
pub mod db;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod session;
pub mod topics;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use sqlx::SqlitePool;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

/// Full application: routes plus the session layer, so integration tests can
/// drive it in-process exactly as `main` serves it.
pub fn app(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(7)));

    Router::new()
        .route("/", get(rooms::home))
        .route("/topics", get(topics::topics_page))
        .route("/activity", get(activity::activity_page))
        .route("/style.css", get(res::style))
        .merge(auth::router())
        .merge(rooms::router())
        .merge(profiles::router())
        .nest("/api", api::router())
        .with_state(state)
        .layer(session_layer)
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// Entity id absent. Carries the entity kind for the response body.
    NotFound(&'static str),
    /// Caller is not the host/author of the target.
    NotAllowed,
    /// Protected action hit without a session.
    LoginRequired,
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
            }
            AppError::NotAllowed => {
                (StatusCode::FORBIDDEN, "You are not allowed here").into_response()
            }
            AppError::LoginRequired => Redirect::to("/login").into_response(),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}\n\n{}", err, err.backtrace()),
            )
                .into_response(),
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Internal(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(anyhow::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::Error);

// password_hash::Error doesn't come with a std::error::Error impl on our
// feature set, so go through the message.
impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_string()))
    }
}
