use axum::http::{HeaderValue, Method, header};
use murmurs::{AppState, auth, chat, store::SqliteStore};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(dotenv::var("DATABASE_URL").unwrap().as_str())
        .await.unwrap();

    let store = SqliteStore::new(db_pool);
    store.migrate().await.unwrap();

    let allowed_headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::HeaderName::from_static(auth::USERNAME_HEADER),
    ];
    let cors = match dotenv::var("ORIGIN").as_deref() {
        Ok("*") | Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(allowed_headers),
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(allowed_headers),
    };

    let app = chat::router()
        .with_state(AppState { store })
        .layer(cors);

    let addr = dotenv::var("BIND_ADDR").unwrap_or("0.0.0.0:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
