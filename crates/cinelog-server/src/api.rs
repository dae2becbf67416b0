use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use cinelog_catalog::{CatalogClient, SearchKind, SearchPage};
use cinelog_shared::constants::USER_ID_HEADER;
use cinelog_shared::{MediaType, WatchStatus};
use cinelog_store::models::double_option;
use cinelog_store::{
    Comment, CommentUpdate, Database, LibraryEntry, LibraryUpdate, ListInput, Media, User,
    UserList, UserMedia,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub catalog: Arc<CatalogClient>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users", post(create_user))
        .route("/api/tmdb/search", get(catalog_search))
        .route("/api/tmdb/:media_type/:id", get(catalog_details))
        .route("/api/media/:id", get(get_media))
        .route(
            "/api/media/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/comments/:id",
            patch(update_comment).delete(delete_comment),
        )
        .route("/api/user-media", get(list_library))
        .route(
            "/api/user-media/:media_id",
            post(upsert_library_entry).delete(remove_library_entry),
        )
        .route("/api/user-media/:media_id/status", patch(update_status))
        .route("/api/user-media/:media_id/rating", patch(update_rating))
        .route("/api/lists", get(list_lists).post(create_list))
        .route(
            "/api/lists/:id",
            get(get_list).put(update_list).delete(delete_list),
        )
        .route("/api/lists/:id/items", post(add_list_item))
        .route("/api/lists/:id/items/:media_id", delete(remove_list_item))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Request / response bodies ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    username: String,
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    page: Option<u32>,
}

#[derive(Deserialize)]
struct CreateCommentRequest {
    text: String,
    #[serde(default)]
    rating: Option<f64>,
}

#[derive(Deserialize)]
struct StatusRequest {
    status: WatchStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingRequest {
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    personal_comment: Option<Option<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddListItemRequest {
    media_id: i64,
}

// ─── Helpers ───

/// Run a store operation on the blocking pool while holding the connection.
async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T, ServerError> + Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let db = db
            .lock()
            .map_err(|_| ServerError::Internal("database lock poisoned".into()))?;
        f(&db)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

/// Parse the caller's id from the `x-user-id` header.
fn caller_id(headers: &HeaderMap) -> Result<i64, ServerError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or(ServerError::Unauthorized)
}

/// Resolve the caller to an existing user.
fn require_user(db: &Database, user_id: i64) -> Result<i64, ServerError> {
    match db.get_user(user_id) {
        Ok(user) => Ok(user.id),
        Err(e) if e.is_not_found() => Err(ServerError::Unauthorized),
        Err(e) => Err(e.into()),
    }
}

// ─── Handlers ───

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let user = with_db(&state, move |db| Ok(db.create_user(&req.username)?)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn catalog_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, ServerError> {
    let query = params
        .q
        .ok_or_else(|| ServerError::BadRequest("missing query parameter q".into()))?;
    let kind = SearchKind::from_param(params.kind.as_deref());

    let page = state
        .catalog
        .search(&query, kind, params.page.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

/// Fetch a title from the catalog and upsert it, returning the stored row.
async fn catalog_details(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, i64)>,
) -> Result<Json<Media>, ServerError> {
    let media_type: MediaType = media_type
        .parse()
        .map_err(|e: cinelog_shared::SharedError| ServerError::BadRequest(e.to_string()))?;

    let dto = state.catalog.details(media_type, id).await?;
    let media = with_db(&state, move |db| Ok(db.upsert_media(&dto)?)).await?;

    info!(media_id = media.id, external_id = id, media_type = %media_type, "title synced");
    Ok(Json(media))
}

async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Media>, ServerError> {
    let media = with_db(&state, move |db| Ok(db.get_media(id)?)).await?;
    Ok(Json(media))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ServerError> {
    let comments = with_db(&state, move |db| Ok(db.list_comments(media_id)?)).await?;
    Ok(Json(comments))
}

async fn create_comment(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ServerError> {
    let caller = caller_id(&headers)?;
    let comment = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.create_comment(user_id, media_id, &req.text, req.rating)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update_comment(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    Json(update): Json<CommentUpdate>,
) -> Result<Json<Comment>, ServerError> {
    let caller = caller_id(&headers)?;
    let comment = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.update_comment(user_id, comment_id, &update)?)
    })
    .await?;
    Ok(Json(comment))
}

async fn delete_comment(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    let caller = caller_id(&headers)?;
    with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.delete_comment(user_id, comment_id)?)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_library(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Vec<LibraryEntry>>, ServerError> {
    let caller = caller_id(&headers)?;
    let entries = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.list_library(user_id)?)
    })
    .await?;
    Ok(Json(entries))
}

/// Add a title to the library or patch the existing entry.  Answers 201 when
/// the entry was created.
async fn upsert_library_entry(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
    Json(update): Json<LibraryUpdate>,
) -> Result<(StatusCode, Json<UserMedia>), ServerError> {
    let caller = caller_id(&headers)?;
    let (entry, created) = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.upsert_user_media(user_id, media_id, &update)?)
    })
    .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(entry)))
}

async fn remove_library_entry(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    let caller = caller_id(&headers)?;
    with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.remove_from_library(user_id, media_id)?)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<UserMedia>, ServerError> {
    let caller = caller_id(&headers)?;
    let entry = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.update_status(user_id, media_id, req.status)?)
    })
    .await?;
    Ok(Json(entry))
}

async fn update_rating(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(media_id): Path<i64>,
    Json(req): Json<RatingRequest>,
) -> Result<Json<UserMedia>, ServerError> {
    let caller = caller_id(&headers)?;
    let rating = req
        .rating
        .ok_or_else(|| ServerError::BadRequest("rating is required".into()))?;

    let entry = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.update_rating(user_id, media_id, rating, req.personal_comment)?)
    })
    .await?;
    Ok(Json(entry))
}

async fn list_lists(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserList>>, ServerError> {
    let caller = caller_id(&headers)?;
    let lists = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.list_lists(user_id)?)
    })
    .await?;
    Ok(Json(lists))
}

async fn create_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(input): Json<ListInput>,
) -> Result<(StatusCode, Json<UserList>), ServerError> {
    let caller = caller_id(&headers)?;
    let list = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.create_list(user_id, &input)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

async fn get_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
) -> Result<Json<UserList>, ServerError> {
    let caller = caller_id(&headers)?;
    let list = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.get_list(user_id, list_id)?)
    })
    .await?;
    Ok(Json(list))
}

async fn update_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
    Json(input): Json<ListInput>,
) -> Result<Json<UserList>, ServerError> {
    let caller = caller_id(&headers)?;
    let list = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.update_list(user_id, list_id, &input)?)
    })
    .await?;
    Ok(Json(list))
}

async fn delete_list(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    let caller = caller_id(&headers)?;
    with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.delete_list(user_id, list_id)?)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_list_item(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(list_id): Path<i64>,
    Json(req): Json<AddListItemRequest>,
) -> Result<(StatusCode, Json<UserList>), ServerError> {
    let caller = caller_id(&headers)?;
    let list = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.add_list_item(user_id, list_id, req.media_id)?)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

async fn remove_list_item(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((list_id, media_id)): Path<(i64, i64)>,
) -> Result<Json<UserList>, ServerError> {
    let caller = caller_id(&headers)?;
    let list = with_db(&state, move |db| {
        let user_id = require_user(db, caller)?;
        Ok(db.remove_list_item(user_id, list_id, media_id)?)
    })
    .await?;
    Ok(Json(list))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
