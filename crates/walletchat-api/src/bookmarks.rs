use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use walletchat_inbox::CommunityResolver;
use walletchat_types::api::BookmarkRequest;

use crate::error::blocking;
use crate::state::AppState;

pub async fn create_bookmark(
    State(state): State<AppState>,
    Json(req): Json<BookmarkRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let created = blocking(&state, move |s| {
        CommunityResolver::new(&s.db).bookmark(&req.wallet, &req.community)
    })
    .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(json!({ "created": created }))))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    Json(req): Json<BookmarkRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let removed = blocking(&state, move |s| {
        CommunityResolver::new(&s.db).unbookmark(&req.wallet, &req.community)
    })
    .await?;

    Ok(Json(json!({ "removed": removed })))
}

pub async fn get_bookmarks(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let joined = blocking(&state, move |s| {
        CommunityResolver::new(&s.db).joined_communities(&address, now)
    })
    .await?;

    Ok(Json(joined))
}

pub async fn is_bookmarked(
    State(state): State<AppState>,
    Path((address, community)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let bookmarked = blocking(&state, move |s| {
        CommunityResolver::new(&s.db).is_bookmarked(&address, &community)
    })
    .await?;

    Ok(Json(json!({ "bookmarked": bookmarked })))
}
