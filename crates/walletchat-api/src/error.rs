use axum::http::StatusCode;
use tracing::{error, warn};

use walletchat_inbox::InboxError;

use crate::state::{AppState, AppStateInner};

pub fn status_for(err: &InboxError) -> StatusCode {
    match err {
        InboxError::NotFound => StatusCode::NOT_FOUND,
        InboxError::InvalidInput(_) | InboxError::MalformedTimestamp { .. } => {
            StatusCode::BAD_REQUEST
        }
        InboxError::PersistenceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Runs blocking store work off the async runtime and maps core errors to a
/// status code, logging server-side failures.
pub async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&AppStateInner) -> walletchat_inbox::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&*state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Request failed: {}", e);
            } else {
                warn!("Rejected request: {}", e);
            }
            status
        })
}
