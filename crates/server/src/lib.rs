//! The posts REST service: a sqlite backed collection served under
//! `/api/posts`, plus a Prometheus counter at `/metrics`.
mod error;
pub mod db;
pub mod metrics;

pub use error::ServerError;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use postboard_core::{
    constant::API_PATH,
    post::{Post, PostDraft, PostId},
};
use serde_json::{json, Value};
use sqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

use metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(conn: Connection) -> anyhow::Result<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            metrics: Arc::new(Metrics::new()?),
        })
    }
}

/// Request body of create and update. Fields are optional on the wire:
/// create requires both, update keeps the stored value for a missing one.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PostFields {
    pub title: Option<String>,
    pub content: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(API_PATH, get(list_posts).post(create_post))
        .route(
            &format!("{API_PATH}/{{id}}"),
            axum::routing::put(update_post).delete(delete_post),
        )
        .route("/metrics", get(metrics::metrics_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics::count_requests,
        ))
        .with_state(state)
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ServerError> {
    let conn = state.conn.lock().await;
    let posts = db::query_posts(&conn)?;
    Ok(Json(posts))
}

async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<PostFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ServerError> {
    let fields = body.map(|Json(fields)| fields).unwrap_or_default();
    let (Some(title), Some(content)) = (fields.title, fields.content) else {
        return Err(ServerError::bad_request(
            "Title and content are required.".into(),
        ));
    };

    let conn = state.conn.lock().await;
    let post = db::insert_post(&conn, &PostDraft { title, content })?;
    tracing::info!(id = %post.id(), "post created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Post created", "post": post })),
    ))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<PostFields>, JsonRejection>,
) -> Result<Json<Value>, ServerError> {
    let id = PostId::new(id);
    let fields = body
        .map(|Json(fields)| fields)
        .map_err(|e| ServerError::bad_request(e.body_text()))?;

    let conn = state.conn.lock().await;
    let mut post = db::query_post_by_id(&conn, id)?.ok_or(ServerError::NotFound)?;
    if let Some(title) = fields.title {
        post.title = title;
    }
    if let Some(content) = fields.content {
        post.content = content;
    }
    db::update_post_by_id(&conn, &post)?;
    tracing::info!(%id, "post updated");

    Ok(Json(
        json!({ "message": format!("Post {id} updated"), "post": post }),
    ))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, ServerError> {
    let id = PostId::new(id);

    let conn = state.conn.lock().await;
    db::query_post_by_id(&conn, id)?.ok_or(ServerError::NotFound)?;
    db::delete_post_by_id(&conn, id)?;
    tracing::info!(%id, "post deleted");

    Ok(Json(json!({ "message": format!("Post {id} deleted") })))
}
