//! Repository layer. Every query the handlers run lives here with declared
//! inputs and typed rows; the list views join topics/hosts in one statement
//! instead of fanning out per row.

use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

const SCHEMA: &str = include_str!("../schema.sql");

pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

/// Topic with its room count, for the topic browser and sidebars.
#[derive(Debug, Clone, FromRow)]
pub struct TopicRow {
    pub id: i64,
    pub name: String,
    pub room_count: i64,
}

/// Bare `rooms` row, used by the JSON API.
#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: i64,
    pub host_id: i64,
    pub topic_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
}

/// Room joined with its host and topic names, for the HTML views.
#[derive(Debug, Clone, FromRow)]
pub struct RoomListing {
    pub id: i64,
    pub host_id: i64,
    pub host_username: String,
    pub topic_id: i64,
    pub topic_name: String,
    pub name: String,
    pub description: Option<String>,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct Participant {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
}

/// Message joined with author and room names, for feeds and room pages.
#[derive(Debug, Clone, FromRow)]
pub struct FeedMessage {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    pub username: String,
    pub room_id: i64,
    pub room_name: String,
    pub created: OffsetDateTime,
}

// ---- users ----

pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO users (email, username, password_hash, created) VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(OffsetDateTime::now_utc())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn user_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as(
        "SELECT id, email, username, password_hash, avatar, bio, created
         FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn user_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as(
        "SELECT id, email, username, password_hash, avatar, bio, created
         FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn update_user(
    pool: &SqlitePool,
    id: i64,
    username: &str,
    email: &str,
    avatar: Option<&str>,
    bio: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET username = ?, email = ?, avatar = ?, bio = ? WHERE id = ?")
        .bind(username)
        .bind(email)
        .bind(avatar)
        .bind(bio)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Search input is a literal substring; `%`/`_` must not act as wildcards.
/// Paired with `ESCAPE '\'` in the LIKE queries below.
fn escape_like(q: &str) -> String {
    q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

// ---- topics ----

/// Get-or-create by name, atomic under the unique constraint. Concurrent
/// creators of the same name both get the single surviving row back.
pub async fn upsert_topic(pool: &SqlitePool, name: &str) -> sqlx::Result<Topic> {
    sqlx::query_as(
        "INSERT INTO topics (name) VALUES (?)
         ON CONFLICT(name) DO UPDATE SET name = excluded.name
         RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn topics_filtered(pool: &SqlitePool, q: &str) -> sqlx::Result<Vec<TopicRow>> {
    sqlx::query_as(
        "SELECT t.id, t.name, COUNT(r.id) AS room_count
         FROM topics t
         LEFT JOIN rooms r ON r.topic_id = t.id
         WHERE t.name LIKE '%' || ?1 || '%' ESCAPE '\\'
         GROUP BY t.id, t.name
         ORDER BY t.id",
    )
    .bind(escape_like(q))
    .fetch_all(pool)
    .await
}

// ---- rooms ----

const ROOM_LISTING_COLUMNS: &str = "r.id, r.host_id, u.username AS host_username,
     r.topic_id, t.name AS topic_name, r.name, r.description, r.created, r.updated";

/// Rooms whose topic name, room name, or description contains `q`,
/// case-insensitively. The empty query matches everything.
pub async fn search_rooms(pool: &SqlitePool, q: &str) -> sqlx::Result<Vec<RoomListing>> {
    sqlx::query_as(&format!(
        "SELECT {ROOM_LISTING_COLUMNS}
         FROM rooms r
         JOIN users u ON u.id = r.host_id
         JOIN topics t ON t.id = r.topic_id
         WHERE t.name LIKE '%' || ?1 || '%' ESCAPE '\\'
            OR r.name LIKE '%' || ?1 || '%' ESCAPE '\\'
            OR COALESCE(r.description, '') LIKE '%' || ?1 || '%' ESCAPE '\\'
         ORDER BY r.created DESC, r.id DESC"
    ))
    .bind(escape_like(q))
    .fetch_all(pool)
    .await
}

pub async fn room_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<RoomListing>> {
    sqlx::query_as(&format!(
        "SELECT {ROOM_LISTING_COLUMNS}
         FROM rooms r
         JOIN users u ON u.id = r.host_id
         JOIN topics t ON t.id = r.topic_id
         WHERE r.id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn rooms_by_host(pool: &SqlitePool, host_id: i64) -> sqlx::Result<Vec<RoomListing>> {
    sqlx::query_as(&format!(
        "SELECT {ROOM_LISTING_COLUMNS}
         FROM rooms r
         JOIN users u ON u.id = r.host_id
         JOIN topics t ON t.id = r.topic_id
         WHERE r.host_id = ?
         ORDER BY r.created DESC, r.id DESC"
    ))
    .bind(host_id)
    .fetch_all(pool)
    .await
}

pub async fn all_rooms(pool: &SqlitePool) -> sqlx::Result<Vec<Room>> {
    sqlx::query_as(
        "SELECT id, host_id, topic_id, name, description, created, updated
         FROM rooms ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

pub async fn room_row(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Room>> {
    sqlx::query_as(
        "SELECT id, host_id, topic_id, name, description, created, updated
         FROM rooms WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_room(
    pool: &SqlitePool,
    host_id: i64,
    topic_id: i64,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<i64> {
    let now = OffsetDateTime::now_utc();
    let result = sqlx::query(
        "INSERT INTO rooms (host_id, topic_id, name, description, created, updated)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(host_id)
    .bind(topic_id)
    .bind(name)
    .bind(description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Host never changes; only name, description, and topic are rewritten.
pub async fn update_room(
    pool: &SqlitePool,
    id: i64,
    topic_id: i64,
    name: &str,
    description: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE rooms SET topic_id = ?, name = ?, description = ?, updated = ? WHERE id = ?",
    )
    .bind(topic_id)
    .bind(name)
    .bind(description)
    .bind(OffsetDateTime::now_utc())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Deletes the room together with its messages and participant rows in one
/// transaction; messages cannot outlive their room.
pub async fn delete_room(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM messages WHERE room_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM room_participants WHERE room_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

// ---- participants ----

pub async fn participants(pool: &SqlitePool, room_id: i64) -> sqlx::Result<Vec<Participant>> {
    sqlx::query_as(
        "SELECT u.id, u.username
         FROM room_participants p
         JOIN users u ON u.id = p.user_id
         WHERE p.room_id = ?
         ORDER BY u.username",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await
}

pub async fn participant_ids(pool: &SqlitePool, room_id: i64) -> sqlx::Result<Vec<i64>> {
    sqlx::query_scalar("SELECT user_id FROM room_participants WHERE room_id = ? ORDER BY user_id")
        .bind(room_id)
        .fetch_all(pool)
        .await
}

// ---- messages ----

/// Message insert and the author's participant row in one transaction, so a
/// message never lands without its author joining the room. The participant
/// insert is a no-op if the author is already in.
pub async fn post_message(
    pool: &SqlitePool,
    room_id: i64,
    user_id: i64,
    body: &str,
) -> sqlx::Result<i64> {
    let now = OffsetDateTime::now_utc();
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "INSERT INTO messages (room_id, user_id, body, created, updated) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(room_id)
    .bind(user_id)
    .bind(body)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    sqlx::query("INSERT OR IGNORE INTO room_participants (room_id, user_id) VALUES (?, ?)")
        .bind(room_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.last_insert_rowid())
}

pub async fn message_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Message>> {
    sqlx::query_as(
        "SELECT id, room_id, user_id, body, created, updated FROM messages WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_message(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

const FEED_COLUMNS: &str = "m.id, m.body, m.user_id, u.username,
     m.room_id, r.name AS room_name, m.created";

pub async fn room_messages(pool: &SqlitePool, room_id: i64) -> sqlx::Result<Vec<FeedMessage>> {
    sqlx::query_as(&format!(
        "SELECT {FEED_COLUMNS}
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         WHERE m.room_id = ?
         ORDER BY m.created DESC, m.id DESC"
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await
}

/// Activity feed for the home page: messages of every room the search query
/// matched, same filter as `search_rooms`.
pub async fn feed_for_query(pool: &SqlitePool, q: &str) -> sqlx::Result<Vec<FeedMessage>> {
    sqlx::query_as(&format!(
        "SELECT {FEED_COLUMNS}
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         JOIN topics t ON t.id = r.topic_id
         WHERE t.name LIKE '%' || ?1 || '%' ESCAPE '\\'
            OR r.name LIKE '%' || ?1 || '%' ESCAPE '\\'
            OR COALESCE(r.description, '') LIKE '%' || ?1 || '%' ESCAPE '\\'
         ORDER BY m.created DESC, m.id DESC"
    ))
    .bind(escape_like(q))
    .fetch_all(pool)
    .await
}

pub async fn messages_by_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<FeedMessage>> {
    sqlx::query_as(&format!(
        "SELECT {FEED_COLUMNS}
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         WHERE m.user_id = ?
         ORDER BY m.created DESC, m.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn all_messages(pool: &SqlitePool) -> sqlx::Result<Vec<FeedMessage>> {
    sqlx::query_as(&format!(
        "SELECT {FEED_COLUMNS}
         FROM messages m
         JOIN users u ON u.id = m.user_id
         JOIN rooms r ON r.id = m.room_id
         ORDER BY m.created DESC, m.id DESC"
    ))
    .fetch_all(pool)
    .await
}
