use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use walletchat_inbox::conversation;
use walletchat_types::api::{MarkReadRequest, SendChatMessageRequest};

use crate::error::blocking;
use crate::state::AppState;

pub async fn create_chat_message(
    State(state): State<AppState>,
    Json(req): Json<SendChatMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let nft = match (req.nft_addr, req.nft_id) {
        (Some(addr), Some(id)) => Some((addr, id)),
        (None, None) => None,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let now = Utc::now();
    let stored = blocking(&state, move |s| {
        conversation::send_direct(
            &s.db,
            &req.from_addr,
            &req.to_addr,
            nft,
            &req.message,
            &req.timestamp,
            now,
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages =
        blocking(&state, move |s| conversation::conversation_between(&s.db, &from, &to)).await?;

    Ok(Json(messages))
}

pub async fn get_nft_conversation(
    State(state): State<AppState>,
    Path((from, to, nft_addr, nft_id)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages = blocking(&state, move |s| {
        conversation::nft_conversation_between(&s.db, &from, &to, &nft_addr, &nft_id)
    })
    .await?;

    Ok(Json(messages))
}

pub async fn get_nft_conversations_of(
    State(state): State<AppState>,
    Path((address, nft_addr, nft_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages = blocking(&state, move |s| {
        conversation::nft_conversations_of(&s.db, &address, &nft_addr, &nft_id)
    })
    .await?;

    Ok(Json(messages))
}

pub async fn get_nft_context(
    State(state): State<AppState>,
    Path((nft_addr, nft_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let messages =
        blocking(&state, move |s| conversation::nft_context(&s.db, &nft_addr, &nft_id)).await?;

    Ok(Json(messages))
}

pub async fn update_chat_message(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let updated = blocking(&state, move |s| {
        conversation::mark_read(&s.db, &from, &to, &req.timestamp, req.read)
    })
    .await?;

    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Path((from, to)): Path<(String, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let deleted =
        blocking(&state, move |s| conversation::delete_conversation(&s.db, &from, &to)).await?;

    Ok(Json(json!({ "deleted": deleted })))
}
