//! Embedded page templates. Pages live under `res/` and are compiled in with
//! `include_res!`; placeholders like `{room_name}` are filled by plain
//! replacement, user content escaped first.

use axum::{debug_handler, http::header, response::IntoResponse};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::db;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

#[debug_handler]
pub async fn style() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_res!(str, "/style.css"),
    )
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn when(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_default()
}

/// Top-bar links, switching on whether a session user exists.
pub fn nav(user: Option<&db::User>) -> String {
    match user {
        Some(user) => format!(
            r#"<a href="/profile/{}">@{}</a> <a href="/logout">Logout</a>"#,
            user.id,
            escape(&user.username)
        ),
        None => r#"<a href="/login">Login</a> <a href="/register">Sign up</a>"#.to_string(),
    }
}

pub fn room_item(room: &db::RoomListing) -> String {
    include_res!(str, "/pages/room_item.html")
        .replace("{id}", &room.id.to_string())
        .replace("{name}", &escape(&room.name))
        .replace("{host_id}", &room.host_id.to_string())
        .replace("{host}", &escape(&room.host_username))
        .replace("{topic}", &escape(&room.topic_name))
        .replace("{when}", &when(room.created))
}

pub fn topic_item(topic: &db::TopicRow) -> String {
    include_res!(str, "/pages/topic_item.html")
        .replace("{name}", &escape(&topic.name))
        .replace("{count}", &topic.room_count.to_string())
}

pub fn feed_item(msg: &db::FeedMessage) -> String {
    include_res!(str, "/pages/feed_item.html")
        .replace("{user_id}", &msg.user_id.to_string())
        .replace("{username}", &escape(&msg.username))
        .replace("{room_id}", &msg.room_id.to_string())
        .replace("{room_name}", &escape(&msg.room_name))
        .replace("{when}", &when(msg.created))
        .replace("{body}", &escape(&msg.body))
}

/// Message inside a room page; the delete link only renders for the author.
pub fn message_item(msg: &db::FeedMessage, viewer: Option<i64>) -> String {
    let controls = if viewer == Some(msg.user_id) {
        format!(r#"<a class="delete" href="/delete-message/{}">delete</a>"#, msg.id)
    } else {
        String::new()
    };
    include_res!(str, "/pages/message_item.html")
        .replace("{user_id}", &msg.user_id.to_string())
        .replace("{username}", &escape(&msg.username))
        .replace("{when}", &when(msg.created))
        .replace("{body}", &escape(&msg.body))
        .replace("{controls}", &controls)
}

pub fn participant_item(p: &db::Participant) -> String {
    include_res!(str, "/pages/participant_item.html")
        .replace("{id}", &p.id.to_string())
        .replace("{username}", &escape(&p.username))
}
