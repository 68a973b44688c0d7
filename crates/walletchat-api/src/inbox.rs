use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use walletchat_inbox::{ChatStore, ConversationAggregator, WatermarkTracker, conversation};
use walletchat_types::api::UnreadSettingsRequest;
use walletchat_types::models::{UnreadKind, UnreadSettings};

use crate::error::blocking;
use crate::state::AppState;

pub async fn get_inbox(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let inbox = blocking(&state, move |s| {
        ConversationAggregator::new(&s.db).inbox(&address, now)
    })
    .await?;

    Ok(Json(inbox))
}

/// Total unread badge, honoring the wallet's saved settings.
pub async fn get_unread_count(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let count = blocking(&state, move |s| {
        ConversationAggregator::new(&s.db).total_unread_for_wallet(&address, now)
    })
    .await?;

    Ok(Json(count))
}

pub async fn put_unread_settings(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(req): Json<UnreadSettingsRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let settings = UnreadSettings::from(req);
    blocking(&state, move |s| Ok(s.db.save_unread_settings(&address, settings)?)).await?;

    Ok(Json(settings))
}

pub async fn get_unread_count_by_kind(
    State(state): State<AppState>,
    Path((address, kind)): Path<(String, UnreadKind)>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let count = blocking(&state, move |s| {
        ConversationAggregator::new(&s.db).total_unread(&address, kind.settings(), now)
    })
    .await?;

    Ok(Json(count))
}

/// Unread direct messages `from -> to`.
pub async fn get_direct_unread(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let count = blocking(&state, move |s| conversation::unread_between(&s.db, &from, &to)).await?;

    Ok(Json(count))
}

/// Unread messages in a community since the wallet last looked. Marks the
/// community read.
pub async fn get_community_unread(
    State(state): State<AppState>,
    Path((community, address)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let now = Utc::now();
    let count = blocking(&state, move |s| {
        WatermarkTracker::new(&s.db).unread_for_community(&address, &community, now)
    })
    .await?;

    Ok(Json(count))
}

/// Unread messages to `address` about one NFT.
pub async fn get_nft_unread(
    State(state): State<AppState>,
    Path((address, nft_addr, nft_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let count = blocking(&state, move |s| {
        conversation::nft_unread(&s.db, &address, &nft_addr, &nft_id)
    })
    .await?;

    Ok(Json(count))
}

/// Per-sender, per-token NFT threads addressed to `address`.
pub async fn get_nft_sidebar(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let sidebar = blocking(&state, move |s| conversation::nft_sidebar(&s.db, &address)).await?;

    Ok(Json(sidebar))
}
