use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mnu_portal::config;
use mnu_portal::database;
use mnu_portal::handlers::{chat, events, login, users};
use mnu_portal::middleware::jwt_auth_middleware;
use mnu_portal::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    let pool = database::connect().await?;
    database::migrate(&pool).await?;

    let state = AppState::new(pool);
    let app = app(state);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "portal api listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/login/whoami", get(login::whoami))
        .route("/users", get(users::list_users))
        .route(
            "/user/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/user/:id/admin",
            patch(users::grant_admin).delete(users::revoke_admin),
        )
        .route("/event", post(events::create_event))
        .route("/event/:id", delete(events::delete_event))
        .route_layer(middleware::from_fn(jwt_auth_middleware));

    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/user", post(users::register))
        .route("/login/token", post(login::login))
        .route("/events", get(events::list_events))
        .route("/chat/history", get(chat::history))
        .route("/chat/ws", get(chat::ws));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "mnu-portal",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match database::health_check(&state.pool).await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!("health check failed: {}", err);
            "degraded"
        }
    };

    let cache = if state.cache.ping().await { "ok" } else { "degraded" };
    Json(json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "database": database,
        "cache": {
            "status": cache,
            "hits": state.cache.hits(),
            "misses": state.cache.misses(),
        },
    }))
}
