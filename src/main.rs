use sqlx::sqlite::SqlitePoolOptions;
use studyhall::{app, db, AppState};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:studyhall.db?mode=rwc".to_string());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url.as_str())
        .await
        .unwrap();
    db::init(&db_pool).await.unwrap();

    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(bind_addr.as_str()).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app(AppState { db_pool })).await.unwrap();
}
