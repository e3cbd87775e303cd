use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use studyhall::{app, db, AppState};
use tower::ServiceExt;

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init(&pool).await.unwrap();
    app(AppState { db_pool: pool })
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn session_cookie(resp: &axum::http::Response<Body>) -> String {
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn body_text(resp: axum::http::Response<Body>) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn json(resp: axum::http::Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

/// Registers a user and returns their session cookie.
async fn register(app: &Router, email: &str, username: &str) -> String {
    let form = format!(
        "email={email}&username={username}&password1=hunter2secret&password2=hunter2secret"
    );
    let resp = app.clone().oneshot(post("/register", &form, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    session_cookie(&resp)
}

async fn create_room(app: &Router, cookie: &str, name: &str, topic: &str) -> i64 {
    let form = format!("topic={topic}&name={name}&description=");
    let resp = app.clone().oneshot(post("/create-room", &form, Some(cookie))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let rooms = json(app.clone().oneshot(get("/api/rooms", None)).await.unwrap()).await;
    rooms
        .as_array()
        .unwrap()
        .last()
        .unwrap()
        .get("id")
        .unwrap()
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn register_then_room_shows_up_in_api() {
    let app = test_app().await;

    let cookie = register(&app, "alice@x.com", "alice").await;
    let room_id = create_room(&app, &cookie, "Algebra+Help", "Math").await;

    let rooms = json(app.clone().oneshot(get("/api/rooms", None)).await.unwrap()).await;
    let room = &rooms.as_array().unwrap()[0];
    assert_eq!(room["name"], "Algebra Help");
    assert_eq!(room["host"], 1);

    let one = json(
        app.clone()
            .oneshot(get(&format!("/api/rooms/{room_id}"), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(one["name"], "Algebra Help");
    assert!(one["participants"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn login_is_generic_about_failures() {
    let app = test_app().await;
    register(&app, "alice@x.com", "alice").await;

    // Wrong password and unknown email produce the same page.
    let resp = app
        .clone()
        .oneshot(post("/login", "email=alice@x.com&password=wrongpassword", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let wrong_pw = body_text(resp).await;

    let resp = app
        .clone()
        .oneshot(post("/login", "email=nobody@x.com&password=whatever", None))
        .await
        .unwrap();
    let unknown = body_text(resp).await;
    assert!(wrong_pw.contains("Email or password is incorrect"));
    assert!(unknown.contains("Email or password is incorrect"));

    // The right credentials establish a session. Email lookup is
    // case-normalized.
    let resp = app
        .clone()
        .oneshot(post("/login", "email=Alice@X.com&password=hunter2secret", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&resp);

    let resp = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert!(body_text(resp).await.contains("Logout"));
}

#[tokio::test]
async fn register_validation_redisplays_the_form() {
    let app = test_app().await;

    let resp = app
        .clone()
        .oneshot(post(
            "/register",
            "email=alice@x.com&username=alice&password1=hunter2secret&password2=different",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Passwords do not match"));

    // Duplicate email gets a generic error, not a leak.
    register(&app, "alice@x.com", "alice").await;
    let resp = app
        .clone()
        .oneshot(post(
            "/register",
            "email=alice@x.com&username=alice2&password1=hunter2secret&password2=hunter2secret",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("An error occurred during registration"));
}

#[tokio::test]
async fn anonymous_writes_redirect_to_login() {
    let app = test_app().await;
    let cookie = register(&app, "alice@x.com", "alice").await;
    let room_id = create_room(&app, &cookie, "Algebra+Help", "Math").await;

    for req in [
        get("/create-room", None),
        post(&format!("/room/{room_id}"), "body=hi", None),
        get("/delete-message/1", None),
        get("/update-profile", None),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn only_the_host_can_update_or_delete_a_room() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;
    let bob = register(&app, "bob@x.com", "bob").await;
    let room_id = create_room(&app, &alice, "Algebra+Help", "Math").await;

    // Both methods, both endpoints: 403 for the non-host.
    for req in [
        get(&format!("/update-room/{room_id}"), Some(&bob)),
        post(&format!("/update-room/{room_id}"), "topic=Math&name=Hijacked", Some(&bob)),
        get(&format!("/delete-room/{room_id}"), Some(&bob)),
        post(&format!("/delete-room/{room_id}"), "", Some(&bob)),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    // The host sails through.
    let resp = app
        .clone()
        .oneshot(post(
            &format!("/update-room/{room_id}"),
            "topic=Physics&name=Mechanics+Help&description=forces",
            Some(&alice),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let one = json(
        app.clone()
            .oneshot(get(&format!("/api/rooms/{room_id}"), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(one["name"], "Mechanics Help");
}

#[tokio::test]
async fn posting_a_message_joins_the_room() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;
    let bob = register(&app, "bob@x.com", "bob").await;
    let room_id = create_room(&app, &alice, "Algebra+Help", "Math").await;

    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(post(&format!("/room/{room_id}"), "body=hello+there", Some(&bob)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    let one = json(
        app.clone()
            .oneshot(get(&format!("/api/rooms/{room_id}"), None))
            .await
            .unwrap(),
    )
    .await;
    // Idempotent join: two posts, one participant entry (bob is user 2).
    assert_eq!(one["participants"], serde_json::json!([2]));

    let page = body_text(app.clone().oneshot(get(&format!("/room/{room_id}"), None)).await.unwrap()).await;
    assert!(page.contains("hello there"));
}

#[tokio::test]
async fn message_deletion_is_author_only() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;
    let bob = register(&app, "bob@x.com", "bob").await;
    let room_id = create_room(&app, &alice, "Algebra+Help", "Math").await;

    app.clone()
        .oneshot(post(&format!("/room/{room_id}"), "body=mine", Some(&alice)))
        .await
        .unwrap();

    // The only message so far has id 1.
    let resp = app.clone().oneshot(post("/delete-message/1", "", Some(&bob))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app.clone().oneshot(post("/delete-message/1", "", Some(&alice))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = app.clone().oneshot(post("/delete-message/1", "", Some(&alice))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let page = body_text(app.clone().oneshot(get("/activity", None)).await.unwrap()).await;
    assert!(!page.contains("mine"));
}

#[tokio::test]
async fn deleting_a_room_unreaches_its_messages() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;
    let room_id = create_room(&app, &alice, "Algebra+Help", "Math").await;
    app.clone()
        .oneshot(post(&format!("/room/{room_id}"), "body=soon+gone", Some(&alice)))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(post(&format!("/delete-room/{room_id}"), "", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = app.clone().oneshot(get(&format!("/room/{room_id}"), None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let page = body_text(app.clone().oneshot(get("/activity", None)).await.unwrap()).await;
    assert!(!page.contains("soon gone"));
}

#[tokio::test]
async fn home_search_filters_rooms_and_feed() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;
    create_room(&app, &alice, "Algebra+Help", "Math").await;
    create_room(&app, &alice, "Chess+Club", "Games").await;

    let everything = body_text(app.clone().oneshot(get("/", None)).await.unwrap()).await;
    assert!(everything.contains("Algebra Help"));
    assert!(everything.contains("Chess Club"));
    assert!(everything.contains("2 rooms available"));

    let math = body_text(app.clone().oneshot(get("/?q=math", None)).await.unwrap()).await;
    assert!(math.contains("Algebra Help"));
    assert!(!math.contains("Chess Club"));
    assert!(math.contains("1 rooms available"));
}

#[tokio::test]
async fn topic_creation_deduplicates_by_name() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;
    create_room(&app, &alice, "Openings", "Chess").await;
    create_room(&app, &alice, "Endgames", "Chess").await;

    let rooms = json(app.clone().oneshot(get("/api/rooms", None)).await.unwrap()).await;
    let rooms = rooms.as_array().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0]["topic"], rooms[1]["topic"]);
}

#[tokio::test]
async fn profile_edit_is_bound_to_the_session_user() {
    let app = test_app().await;
    let alice = register(&app, "alice@x.com", "alice").await;

    let resp = app
        .clone()
        .oneshot(post(
            "/update-profile",
            "username=alice&email=alice@x.com&avatar=&bio=studying+hard",
            Some(&alice),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/profile/1");

    let page = body_text(app.clone().oneshot(get("/profile/1", None)).await.unwrap()).await;
    assert!(page.contains("studying hard"));

    let resp = app.clone().oneshot(get("/profile/99", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_surface() {
    let app = test_app().await;

    let routes = json(app.clone().oneshot(get("/api", None)).await.unwrap()).await;
    assert_eq!(routes.as_array().unwrap().len(), 3);

    let resp = app.clone().oneshot(get("/api/rooms/42", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let rooms = json(app.clone().oneshot(get("/api/rooms", None)).await.unwrap()).await;
    assert!(rooms.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = test_app().await;
    let cookie = register(&app, "alice@x.com", "alice").await;

    let resp = app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = app.clone().oneshot(get("/", Some(&cookie))).await.unwrap();
    assert!(body_text(resp).await.contains("Login"));
}
