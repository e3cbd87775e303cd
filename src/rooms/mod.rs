mod delete;
mod edit;
mod home;
mod msg;
mod new;
mod room;

use axum::{routing::get, Router};

use crate::AppState;

pub use home::home;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/room/{id}", get(room::room).post(room::post_message))
        .route("/create-room", get(new::create_room_page).post(new::create_room))
        .route("/update-room/{id}", get(edit::update_room_page).post(edit::update_room))
        .route("/delete-room/{id}", get(delete::delete_room_page).post(delete::delete_room))
        .route(
            "/delete-message/{id}",
            get(msg::delete_message_page).post(msg::delete_message),
        )
}
