use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use clipstream_api::auth::{self, AppState, AppStateInner};
use clipstream_api::middleware::require_auth;
use clipstream_api::{comments, playlists, posts, reactions, stats, subscriptions, videos};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipstream=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("CLIPSTREAM_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("CLIPSTREAM_DB_PATH").unwrap_or_else(|_| "clipstream.db".into());
    let host = std::env::var("CLIPSTREAM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CLIPSTREAM_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = clipstream_db::Database::open(&PathBuf::from(&db_path))
        .map_err(|e| anyhow::anyhow!("failed to open database: {e}"))?;

    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        // Feed + video CRUD
        .route("/videos", get(videos::list_feed))
        .route("/videos", post(videos::publish_video))
        .route("/videos/{video_id}", get(videos::get_video))
        .route("/videos/{video_id}", patch(videos::update_video))
        .route("/videos/{video_id}", delete(videos::delete_video))
        .route("/videos/{video_id}/publish", post(videos::toggle_publish))
        // Comments
        .route("/videos/{video_id}/comments", get(comments::list_video_comments))
        .route("/videos/{video_id}/comments", post(comments::add_comment))
        .route("/comments/{comment_id}", patch(comments::update_comment))
        .route("/comments/{comment_id}", delete(comments::delete_comment))
        // Posts
        .route("/posts", post(posts::create_post))
        .route("/users/{user_id}/posts", get(posts::list_user_posts))
        .route("/posts/{post_id}", patch(posts::update_post))
        .route("/posts/{post_id}", delete(posts::delete_post))
        // Reactions: one engine, three discriminant routes
        .route("/reactions/video/{video_id}", post(reactions::toggle_video_reaction))
        .route("/reactions/comment/{comment_id}", post(reactions::toggle_comment_reaction))
        .route("/reactions/post/{post_id}", post(reactions::toggle_post_reaction))
        .route("/reactions/videos", get(reactions::list_liked_videos))
        // Subscriptions
        .route("/subscriptions/{channel_id}", post(subscriptions::toggle_subscription))
        .route("/channels/{channel_id}/subscribers", get(subscriptions::channel_subscribers))
        .route("/users/{user_id}/subscriptions", get(subscriptions::subscribed_channels))
        // Channel dashboard
        .route("/channels/{channel_id}/stats", get(stats::channel_stats))
        .route("/channels/{channel_id}/videos", get(stats::channel_videos))
        // Playlists
        .route("/playlists", post(playlists::create_playlist))
        .route("/users/{user_id}/playlists", get(playlists::user_playlists))
        .route("/playlists/{playlist_id}", get(playlists::get_playlist))
        .route("/playlists/{playlist_id}", patch(playlists::update_playlist))
        .route("/playlists/{playlist_id}", delete(playlists::delete_playlist))
        .route(
            "/playlists/{playlist_id}/videos/{video_id}",
            post(playlists::add_playlist_video),
        )
        .route(
            "/playlists/{playlist_id}/videos/{video_id}",
            delete(playlists::remove_playlist_video),
        )
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("clipstream server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
