//! HTTP surface of the WalletChat backend.

pub mod bookmarks;
pub mod chat;
pub mod communities;
pub mod error;
pub mod inbox;
pub mod names;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::{AppState, AppStateInner};

pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        // Inbox and unread counters
        .route("/get_inbox/{address}", get(inbox::get_inbox))
        .route(
            "/unreadcount/{address}",
            get(inbox::get_unread_count).put(inbox::put_unread_settings),
        )
        .route("/get_unread_cnt_by_type/{address}/{kind}", get(inbox::get_unread_count_by_kind))
        // Routes sharing a prefix but differing in arity use the same segment
        // names; handlers read segments by position.
        .route("/get_unread_cnt/{a}/{b}", get(inbox::get_direct_unread))
        .route("/get_unread_cnt/{a}/{b}/{c}", get(inbox::get_nft_unread))
        .route("/get_unread_cnt_nft/{address}", get(inbox::get_nft_sidebar))
        .route(
            "/get_groupchatitems_unreadcnt/{community}/{address}",
            get(inbox::get_community_unread),
        )
        // Communities
        .route("/get_groupchatitems/{community}/{address}", get(communities::get_group_messages))
        .route("/create_groupchatitem", post(communities::create_group_message))
        .route("/community/{community}/{address}", get(communities::get_community))
        // Direct messages
        .route("/create_chatitem", post(chat::create_chat_message))
        .route("/getall_chatitems/{fromaddr}/{toaddr}", get(chat::get_conversation))
        .route("/getnft_chatitems/{a}/{b}", get(chat::get_nft_context))
        .route("/getnft_chatitems/{a}/{b}/{c}", get(chat::get_nft_conversations_of))
        .route("/getnft_chatitems/{a}/{b}/{c}/{d}", get(chat::get_nft_conversation))
        .route("/update_chatitem/{fromaddr}/{toaddr}", put(chat::update_chat_message))
        .route("/deleteall_chatitems/{fromaddr}/{toaddr}", delete(chat::delete_conversation))
        // Bookmarks
        .route("/create_bookmark", post(bookmarks::create_bookmark))
        .route("/delete_bookmark", post(bookmarks::delete_bookmark))
        .route("/get_bookmarks/{address}", get(bookmarks::get_bookmarks))
        .route("/get_bookmarks/{address}/{community}", get(bookmarks::is_bookmarked))
        // Names
        .route("/name", post(names::set_name))
        .route("/name/{address}", get(names::get_name));

    Router::new()
        .route("/health", get(health))
        .nest("/v1", v1)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
