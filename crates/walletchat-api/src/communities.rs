use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use walletchat_inbox::{CommunityResolver, WatermarkTracker};
use walletchat_types::api::CreateGroupMessageRequest;

use crate::error::blocking;
use crate::state::AppState;

/// Full history of a community for `address`, marking it read.
pub async fn get_group_messages(
    State(state): State<AppState>,
    Path((community, address)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let messages = blocking(&state, move |s| {
        WatermarkTracker::new(&s.db).fetch_history(&address, &community, now)
    })
    .await?;

    Ok(Json(messages))
}

pub async fn create_group_message(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let stored = blocking(&state, move |s| {
        CommunityResolver::new(&s.db).post_message(
            &req.community,
            &req.from_addr,
            &req.message,
            &req.timestamp,
            req.content_type,
            now,
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn get_community(
    State(state): State<AppState>,
    Path((community, address)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let landing = blocking(&state, move |s| {
        CommunityResolver::new(&s.db).community_landing(
            &address,
            &community,
            &s.default_community,
            now,
        )
    })
    .await?;

    Ok(Json(landing))
}
