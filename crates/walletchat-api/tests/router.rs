use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use walletchat_api::{AppState, AppStateInner, build_router};
use walletchat_db::Database;
use walletchat_inbox::{ChatStore, DefaultCommunity};
use walletchat_types::models::{ContentType, NewDirectMessage, NewGroupMessage};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
}

fn setup() -> (AppState, Router) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        default_community: DefaultCommunity {
            address: "walletchat".into(),
            name: "WalletChat HQ".into(),
        },
    });
    let app = build_router(state.clone());
    (state, app)
}

fn seed_dm(state: &AppState, from: &str, to: &str, sent: i64) {
    state
        .db
        .create_direct_message(&NewDirectMessage {
            from_addr: from.into(),
            to_addr: to.into(),
            nft_addr: None,
            nft_id: None,
            message: format!("{from} says hi"),
            timestamp: format!("t{sent}"),
            sent_at: at(sent),
        })
        .unwrap();
}

fn seed_post(state: &AppState, community: &str, from: &str, sent: i64) {
    state
        .db
        .create_group_message(&NewGroupMessage {
            community: community.into(),
            from_addr: from.into(),
            message: format!("{from} posted"),
            timestamp: format!("t{sent}"),
            sent_at: at(sent),
            content_type: ContentType::Message,
        })
        .unwrap();
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_is_served() {
    let (_state, app) = setup();
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn inbox_merges_direct_and_community_threads() {
    let (state, app) = setup();
    seed_dm(&state, "0xB", "0xA", 100);
    seed_dm(&state, "0xA", "0xB", 200);
    seed_dm(&state, "0xC", "0xA", 150);
    state.db.create_bookmark("0xA", "0xD").unwrap();
    seed_post(&state, "0xD", "0xE", 250);
    state.db.upsert_watermark("0xA", "0xD", at(50)).unwrap();

    let (status, body) = send(&app, "GET", "/v1/get_inbox/0xA", None).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    let keys: Vec<_> = entries.iter().map(|e| e["conversation_key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["0xD", "0xB", "0xC"]);
    assert_eq!(entries[0]["context_type"], "nft_thread");
    assert_eq!(entries[0]["unread_count"], 1);
    assert_eq!(entries[1]["context_type"], "direct_message");
    assert_eq!(entries[1]["unread_count"], 1);
}

#[tokio::test]
async fn unknown_wallet_has_empty_inbox() {
    let (_state, app) = setup();
    let (status, body) = send(&app, "GET", "/v1/get_inbox/0xnobody", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn community_unread_count_marks_read() {
    let (state, app) = setup();
    seed_post(&state, "0xD", "0xB", 1);
    seed_post(&state, "0xD", "0xC", 2);
    seed_post(&state, "0xD", "0xE", 3);

    let uri = "/v1/get_groupchatitems_unreadcnt/0xD/0xA";
    let (_, first) = send(&app, "GET", uri, None).await;
    let (_, second) = send(&app, "GET", uri, None).await;

    assert_eq!(first, 3);
    assert_eq!(second, 0);
}

#[tokio::test]
async fn history_fetch_marks_read_but_inbox_does_not() {
    let (state, app) = setup();
    state.db.create_bookmark("0xA", "lounge").unwrap();
    seed_post(&state, "lounge", "0xB", 1);
    seed_post(&state, "lounge", "0xC", 2);

    let (_, inbox) = send(&app, "GET", "/v1/get_inbox/0xA", None).await;
    assert_eq!(inbox[0]["unread_count"], 2);
    assert_eq!(inbox[0]["context_type"], "community");
    let (_, inbox) = send(&app, "GET", "/v1/get_inbox/0xA", None).await;
    assert_eq!(inbox[0]["unread_count"], 2);

    let (status, history) = send(&app, "GET", "/v1/get_groupchatitems/lounge/0xA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);

    let (_, total) = send(&app, "GET", "/v1/unreadcount/0xA", None).await;
    assert_eq!(total, 0);
}

#[tokio::test]
async fn direct_message_lifecycle() {
    let (_state, app) = setup();

    let (status, created) = send(
        &app,
        "POST",
        "/v1/create_chatitem",
        Some(json!({ "from_addr": "0xB", "to_addr": "0xA", "message": "gm", "timestamp": "t1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["read"], false);

    let (_, unread) = send(&app, "GET", "/v1/get_unread_cnt/0xB/0xA", None).await;
    assert_eq!(unread, 1);

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/update_chatitem/0xB/0xA",
        Some(json!({ "timestamp": "t1", "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, unread) = send(&app, "GET", "/v1/get_unread_cnt/0xB/0xA", None).await;
    assert_eq!(unread, 0);

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/update_chatitem/0xB/0xA",
        Some(json!({ "timestamp": "missing", "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, convo) = send(&app, "GET", "/v1/getall_chatitems/0xA/0xB", None).await;
    assert_eq!(convo.as_array().unwrap().len(), 1);

    let (_, deleted) = send(&app, "DELETE", "/v1/deleteall_chatitems/0xB/0xA", None).await;
    assert_eq!(deleted["deleted"], 1);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let (_state, app) = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/v1/create_chatitem",
        Some(json!({ "from_addr": "0xB", "to_addr": "0xA", "message": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/create_chatitem",
        Some(json!({ "from_addr": "0xB", "to_addr": "0xA", "message": "hi", "nft_id": "7" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/create_groupchatitem",
        Some(json!({ "community": "lounge", "from_addr": "0xB", "message": "hi", "extra": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn default_community_landing_enrolls_once() {
    let (_state, app) = setup();

    let (status, landing) = send(&app, "GET", "/v1/community/walletchat/0xE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(landing["joined"], true);
    assert_eq!(landing["verified"], true);
    assert_eq!(landing["members"], 1);
    assert_eq!(landing["messages"][0]["content_type"], "welcome");

    send(&app, "GET", "/v1/community/walletchat/0xE", None).await;
    let (_, bookmarks) = send(&app, "GET", "/v1/get_bookmarks/0xE", None).await;
    assert_eq!(bookmarks.as_array().unwrap().len(), 1);
    assert_eq!(bookmarks[0]["unread_count"], 0);

    let (_, flag) = send(&app, "GET", "/v1/get_bookmarks/0xE/walletchat", None).await;
    assert_eq!(flag["bookmarked"], true);
}

#[tokio::test]
async fn bookmarks_are_idempotent() {
    let (_state, app) = setup();
    let body = json!({ "wallet": "0xA", "community": "lounge" });

    let (status, first) = send(&app, "POST", "/v1/create_bookmark", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created"], true);
    let (status, second) = send(&app, "POST", "/v1/create_bookmark", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);

    let (_, removed) = send(&app, "POST", "/v1/delete_bookmark", Some(body)).await;
    assert_eq!(removed["removed"], true);
    let (_, flag) = send(&app, "GET", "/v1/get_bookmarks/0xA/lounge", None).await;
    assert_eq!(flag["bookmarked"], false);
}

#[tokio::test]
async fn unread_totals_follow_kind_and_settings() {
    let (state, app) = setup();
    seed_dm(&state, "0xB", "0xA", 1);
    state.db.create_bookmark("0xA", "0xnft").unwrap();
    seed_post(&state, "0xnft", "0xC", 2);
    seed_post(&state, "0xnft", "0xC", 3);

    let (_, dm) = send(&app, "GET", "/v1/get_unread_cnt_by_type/0xA/DM", None).await;
    assert_eq!(dm, 1);
    let (_, nft) = send(&app, "GET", "/v1/get_unread_cnt_by_type/0xA/nft", None).await;
    assert_eq!(nft, 2);
    let (_, all) = send(&app, "GET", "/v1/unreadcount/0xA", None).await;
    assert_eq!(all, 3);

    let (status, _) = send(
        &app,
        "PUT",
        "/v1/unreadcount/0xA",
        Some(json!({ "dm": true, "nft": false, "community": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, filtered) = send(&app, "GET", "/v1/unreadcount/0xA", None).await;
    assert_eq!(filtered, 1);
}

#[tokio::test]
async fn names_are_stored_and_looked_up() {
    let (_state, app) = setup();

    let (status, _) = send(&app, "GET", "/v1/name/0xA", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/name",
        Some(json!({ "address": "0xA", "name": "alice.eth" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, name) = send(&app, "GET", "/v1/name/0xA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(name["name"], "alice.eth");
}

#[tokio::test]
async fn nft_threads_are_listed_and_counted() {
    let (_state, app) = setup();
    for (from, to, nft_id, text) in [
        ("0xB", "0xA", "7", "is this one for sale?"),
        ("0xA", "0xB", "7", "maybe"),
        ("0xB", "0xA", "8", "what about this one?"),
        ("0xC", "0xA", "7", "me too"),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/v1/create_chatitem",
            Some(json!({
                "from_addr": from,
                "to_addr": to,
                "nft_addr": "0xpunk",
                "nft_id": nft_id,
                "message": text,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, convo) = send(&app, "GET", "/v1/getnft_chatitems/0xA/0xB/0xpunk/7", None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = convo.as_array().unwrap().iter().map(|m| m["message"].clone()).collect();
    assert_eq!(texts, vec![json!("is this one for sale?"), json!("maybe")]);

    let (_, mine) = send(&app, "GET", "/v1/getnft_chatitems/0xA/0xpunk/7", None).await;
    assert_eq!(mine.as_array().unwrap().len(), 3);

    let (_, context) = send(&app, "GET", "/v1/getnft_chatitems/0xpunk/8", None).await;
    assert_eq!(context.as_array().unwrap().len(), 1);

    let (_, unread) = send(&app, "GET", "/v1/get_unread_cnt/0xA/0xpunk/7", None).await;
    assert_eq!(unread, 2);

    let (_, pair) = send(&app, "GET", "/v1/get_unread_cnt/0xB/0xA", None).await;
    assert_eq!(pair, 2);

    let (_, sidebar) = send(&app, "GET", "/v1/get_unread_cnt_nft/0xA", None).await;
    assert_eq!(
        sidebar,
        json!([
            { "from_addr": "0xB", "nft_addr": "0xpunk", "nft_id": "7", "unread": 1 },
            { "from_addr": "0xB", "nft_addr": "0xpunk", "nft_id": "8", "unread": 1 },
            { "from_addr": "0xC", "nft_addr": "0xpunk", "nft_id": "7", "unread": 1 },
        ])
    );
}
