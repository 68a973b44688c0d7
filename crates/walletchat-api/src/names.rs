use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use walletchat_inbox::{ChatStore, InboxError};
use walletchat_types::api::{NameResponse, SetNameRequest};

use crate::error::blocking;
use crate::state::AppState;

pub async fn set_name(
    State(state): State<AppState>,
    Json(req): Json<SetNameRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.address.trim().is_empty() || req.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let address = req.address.clone();
    let name = req.name.clone();
    blocking(&state, move |s| Ok(s.db.set_display_name(&address, &name)?)).await?;
    info!("Named '{}' as '{}'", req.address, req.name);

    Ok((
        StatusCode::CREATED,
        Json(NameResponse {
            address: req.address,
            name: req.name,
        }),
    ))
}

pub async fn get_name(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let lookup = address.clone();
    let name = blocking(&state, move |s| {
        s.db.find_display_name(&lookup)?.ok_or(InboxError::NotFound)
    })
    .await?;

    Ok(Json(NameResponse { address, name }))
}
