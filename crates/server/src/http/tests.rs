//! End-to-end handler tests: router + in-memory store, driven with `oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
};
use chrono::{Duration, Utc};
use domain::{
    moderation::ModerationRules, token, Approval, Comment, CommentEvent, CommentId, DefaultHooks,
    EditHooks, NewComment, PostId, UserId,
};
use serde_json::Value;
use storage::Db;
use tokio::sync::broadcast;
use tower::ServiceExt;

use crate::http::router::build_router;
use crate::nonce::{edit_action, NonceGuard, GENERAL_ACTION};
use crate::session::{SessionKeys, SESSION_COOKIE};
use crate::spam::{NoSpamCheck, SpamCheck};
use crate::state::{AppState, EditPolicy};

const IP: &str = "203.0.113.7";
const UA: &str = "revise-tests/1.0";
const POST: PostId = PostId(10);

async fn make_state() -> AppState {
    let db = Db::in_memory().await.expect("in-memory db");
    let hooks: Arc<dyn EditHooks> = Arc::new(DefaultHooks);
    let policy = EditPolicy::resolve(hooks.as_ref(), 5, true, 100, "/".into(), true);
    let (tx_events, _) = broadcast::channel(16);
    AppState {
        db,
        hooks,
        spam: Arc::new(NoSpamCheck),
        nonces: NonceGuard::new("nonce-secret", 86_400),
        sessions: SessionKeys::new("session-secret"),
        policy,
        moderation: Arc::new(ModerationRules {
            moderation_keys: vec!["casino".into()],
            blacklist_keys: vec!["viagra".into()],
            max_links: 0,
        }),
        tx_events,
    }
}

async fn seed_comment(state: &AppState, user: UserId, age: Duration) -> Comment {
    state
        .db
        .insert_comment(&NewComment {
            post_id: POST,
            parent_id: None,
            user_id: user,
            author_name: "Ferris".into(),
            author_email: "ferris@example.org".into(),
            author_url: String::new(),
            author_ip: IP.into(),
            user_agent: UA.into(),
            content: "original text".into(),
            approval: Approval::Approved,
            created_at: Utc::now().naive_utc() - age,
        })
        .await
        .unwrap()
}

/// Stores the server-side token and returns the matching `Cookie` pair.
async fn seed_token(state: &AppState, comment: &Comment) -> String {
    let fingerprint = token::comment_fingerprint(comment);
    let value = token::new_token_value(&fingerprint);
    assert!(state
        .db
        .add_post_meta_unique(comment.post_id, &token::meta_key(comment.id), &value)
        .await
        .unwrap());
    format!("{}={}", token::cookie_name(comment.id, &fingerprint), value)
}

fn general_nonce(state: &AppState, user: UserId) -> String {
    state
        .nonces
        .create(GENERAL_ACTION, user, Utc::now().timestamp())
}

fn edit_nonce(state: &AppState, comment: &Comment, user: UserId) -> String {
    state
        .nonces
        .create(&edit_action(comment.id), user, Utc::now().timestamp())
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let res = build_router(state.clone(), "*").oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

/// Urlencoded body for `/api/ajax`.
fn form(
    action: &str,
    comment_id: CommentId,
    post_id: PostId,
    nonce: &str,
    content: Option<&str>,
) -> String {
    let comment_id = comment_id.to_string();
    let post_id = post_id.to_string();
    let mut fields = vec![
        ("action", action),
        ("comment_id", comment_id.as_str()),
        ("post_id", post_id.as_str()),
        ("nonce", nonce),
    ];
    if let Some(content) = content {
        fields.push(("comment_content", content));
    }
    serde_urlencoded::to_string(&fields).unwrap()
}

async fn ajax(state: &AppState, body: String, cookie: Option<&str>) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/ajax")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::USER_AGENT, UA)
        .header("x-forwarded-for", IP);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    send(state, builder.body(Body::from(body)).unwrap()).await
}

fn set_cookie_pair(headers: &HeaderMap) -> Option<(String, String)> {
    let raw = headers.get(header::SET_COOKIE)?.to_str().ok()?;
    let first = raw.split(';').next()?;
    let (name, value) = first.split_once('=')?;
    Some((name.to_string(), value.to_string()))
}

async fn save(
    state: &AppState,
    comment: &Comment,
    content: &str,
    cookie: Option<&str>,
) -> (StatusCode, HeaderMap, Value) {
    let nonce = edit_nonce(state, comment, UserId::ANONYMOUS);
    ajax(
        state,
        form("save_comment", comment.id, comment.post_id, &nonce, Some(content)),
        cookie,
    )
    .await
}

async fn stored(state: &AppState, comment: &Comment) -> Comment {
    state.db.get_comment(comment.id).await.unwrap().unwrap()
}

// ── save_comment ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_inside_window_succeeds() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(4)).await;
    let cookie = seed_token(&state, &comment).await;

    let (status, _, body) = save(&state, &comment, "  fixed the typo  ", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"], false);
    assert_eq!(body["error"], "");
    assert_eq!(body["comment_text"], "<p>fixed the typo</p>");

    let after = stored(&state, &comment).await;
    assert_eq!(after.content, "fixed the typo");
    assert_eq!(after.approval, Approval::Approved);
    assert!(after.updated_at.is_some());
}

#[tokio::test]
async fn edit_after_window_fails() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(6)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = save(&state, &comment, "too late", Some(&cookie)).await;
    assert_eq!(body["errors"], true);
    assert_eq!(body["remove"], true);
    assert_eq!(body["error"], "You can no longer edit this comment");
    assert_eq!(stored(&state, &comment).await.content, "original text");
}

#[tokio::test]
async fn edit_without_cookie_fails() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    seed_token(&state, &comment).await;

    let (_, _, body) = save(&state, &comment, "sneaky", None).await;
    assert_eq!(body["error"], "You can no longer edit this comment");
    assert_eq!(stored(&state, &comment).await.content, "original text");
}

#[tokio::test]
async fn edit_with_wrong_cookie_value_fails() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;
    let (name, _) = cookie.split_once('=').unwrap();
    let forged = format!("{}=_revise-guess", name);

    let (_, _, body) = save(&state, &comment, "sneaky", Some(&forged)).await;
    assert_eq!(body["error"], "You can no longer edit this comment");
}

#[tokio::test]
async fn cookie_without_server_token_fails() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;
    state
        .db
        .delete_post_meta(comment.post_id, &token::meta_key(comment.id))
        .await
        .unwrap();

    let (_, _, body) = save(&state, &comment, "sneaky", Some(&cookie)).await;
    assert_eq!(body["error"], "You can no longer edit this comment");
}

#[tokio::test]
async fn signed_in_author_edits_without_cookie() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId(5), Duration::minutes(1)).await;
    let session = format!("{}={}", SESSION_COOKIE, state.sessions.sign(UserId(5)));
    let nonce = edit_nonce(&state, &comment, UserId(5));

    let (_, _, body) = ajax(
        &state,
        form("save_comment", comment.id, comment.post_id, &nonce, Some("by the author")),
        Some(&session),
    )
    .await;
    assert_eq!(body["errors"], false);
    assert_eq!(stored(&state, &comment).await.content, "by the author");
}

#[tokio::test]
async fn signed_in_stranger_cannot_edit() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId(5), Duration::minutes(1)).await;
    let session = format!("{}={}", SESSION_COOKIE, state.sessions.sign(UserId(6)));
    let nonce = edit_nonce(&state, &comment, UserId(6));

    let (_, _, body) = ajax(
        &state,
        form("save_comment", comment.id, comment.post_id, &nonce, Some("hijack")),
        Some(&session),
    )
    .await;
    assert_eq!(body["error"], "You can no longer edit this comment");
    assert_eq!(stored(&state, &comment).await.content, "original text");
}

struct AdminHooks;

impl EditHooks for AdminHooks {
    fn can_edit_not_author(&self, _allowed: bool, _comment: &Comment, visitor: UserId) -> bool {
        visitor == UserId(1)
    }

    fn can_edit_after_time(&self, _allowed: bool, _comment: &Comment) -> bool {
        true
    }
}

#[tokio::test]
async fn hooks_can_override_authorship_and_window() {
    let mut state = make_state().await;
    state.hooks = Arc::new(AdminHooks);
    let comment = seed_comment(&state, UserId(5), Duration::minutes(1)).await;
    let session = format!("{}={}", SESSION_COOKIE, state.sessions.sign(UserId(1)));
    let nonce = edit_nonce(&state, &comment, UserId(1));

    let (_, _, body) = ajax(
        &state,
        form("save_comment", comment.id, comment.post_id, &nonce, Some("moderated")),
        Some(&session),
    )
    .await;
    assert_eq!(body["errors"], false);

    let old = seed_comment(&state, UserId::ANONYMOUS, Duration::hours(3)).await;
    let (_, _, body) = ajax(
        &state,
        form(
            "get_time_left",
            old.id,
            old.post_id,
            &general_nonce(&state, UserId::ANONYMOUS),
            None,
        ),
        None,
    )
    .await;
    assert_eq!(body["can_edit"], true);
    assert_eq!(body["allow_unlimited_time"], true);
    assert_eq!(body["minutes"], 0);
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    for content in ["", "   \n ", "undefined"] {
        let (_, _, body) = save(&state, &comment, content, Some(&cookie)).await;
        assert_eq!(body["errors"], true);
        assert_eq!(body["remove"], false);
        assert_eq!(body["error"], "Your comment cannot be empty");
    }
    assert_eq!(stored(&state, &comment).await.content, "original text");
}

#[tokio::test]
async fn blacklisted_edit_is_stored_as_spam_and_revokes_token() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, headers, body) = save(&state, &comment, "cheap VIAGRA here", Some(&cookie)).await;
    assert_eq!(body["errors"], true);
    assert_eq!(body["remove"], true);
    assert_eq!(body["error"], "This comment was marked as spam");

    let after = stored(&state, &comment).await;
    assert_eq!(after.approval, Approval::Spam);
    assert_eq!(after.content, "cheap VIAGRA here");
    assert!(state
        .db
        .get_post_meta(comment.post_id, &token::meta_key(comment.id))
        .await
        .unwrap()
        .is_none());

    let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
    let (name, _) = cookie.split_once('=').unwrap();
    assert!(set_cookie.starts_with(name));

    // 令牌已失效，再次编辑被拒
    let (_, _, body) = save(&state, &comment, "sorry", Some(&cookie)).await;
    assert_eq!(body["error"], "You can no longer edit this comment");
}

#[tokio::test]
async fn moderation_keys_send_edit_back_to_queue() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = save(&state, &comment, "visit my casino", Some(&cookie)).await;
    assert_eq!(body["errors"], false);
    assert_eq!(stored(&state, &comment).await.approval, Approval::Pending);
}

struct AlwaysSpam;

#[async_trait]
impl SpamCheck for AlwaysSpam {
    async fn is_spam(&self, _comment: &Comment) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn spam_oracle_flags_edit() {
    let mut state = make_state().await;
    state.spam = Arc::new(AlwaysSpam);
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = save(&state, &comment, "looks innocent", Some(&cookie)).await;
    assert_eq!(body["error"], "This comment was marked as spam");
    assert_eq!(stored(&state, &comment).await.approval, Approval::Spam);
}

struct MinLength;

impl EditHooks for MinLength {
    fn check_errors(&self, comment: &Comment) -> Option<String> {
        (comment.content.len() < 5).then(|| "Say a bit <more>".to_string())
    }
}

#[tokio::test]
async fn custom_validation_blocks_save() {
    let mut state = make_state().await;
    state.hooks = Arc::new(MinLength);
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = save(&state, &comment, "hm", Some(&cookie)).await;
    assert_eq!(body["errors"], true);
    assert_eq!(body["remove"], false);
    assert_eq!(body["error"], "Say a bit &lt;more&gt;");
    assert_eq!(stored(&state, &comment).await.content, "original text");
}

#[tokio::test]
async fn bad_nonce_is_rejected_first() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = ajax(
        &state,
        form("save_comment", comment.id, comment.post_id, "00000000000000000000", Some("new")),
        Some(&cookie),
    )
    .await;
    assert_eq!(body["errors"], true);
    assert_eq!(body["remove"], true);
    assert_eq!(body["error"], "You do not have permission to edit this comment.");
    assert_eq!(stored(&state, &comment).await.content, "original text");
}

#[tokio::test]
async fn save_broadcasts_update() {
    let state = make_state().await;
    let mut rx = state.tx_events.subscribe();
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    save(&state, &comment, "live", Some(&cookie)).await;
    match rx.try_recv().unwrap() {
        CommentEvent::Updated {
            comment_id,
            comment_html,
            ..
        } => {
            assert_eq!(comment_id, comment.id);
            assert_eq!(comment_html, "<p>live</p>");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn held_edit_is_not_broadcast() {
    let state = make_state().await;
    let mut rx = state.tx_events.subscribe();
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = save(&state, &comment, "visit my casino", Some(&cookie)).await;
    assert_eq!(body["errors"], false);
    assert_eq!(stored(&state, &comment).await.approval, Approval::Pending);
    match rx.try_recv().unwrap() {
        CommentEvent::Held {
            post_id,
            comment_id,
        } => {
            assert_eq!(post_id, POST);
            assert_eq!(comment_id, comment.id);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

struct BrokenSpamCheck;

#[async_trait]
impl SpamCheck for BrokenSpamCheck {
    async fn is_spam(&self, _comment: &Comment) -> anyhow::Result<bool> {
        Err(anyhow::anyhow!("spam service unreachable"))
    }
}

#[tokio::test]
async fn unreachable_spam_check_keeps_edit() {
    let mut state = make_state().await;
    state.spam = Arc::new(BrokenSpamCheck);
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (status, _, body) = save(&state, &comment, "still fine", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"], false);
    assert_eq!(body["comment_text"], "<p>still fine</p>");

    let after = stored(&state, &comment).await;
    assert_eq!(after.content, "still fine");
    assert_eq!(after.approval, Approval::Approved);
}

#[tokio::test]
async fn malformed_ajax_requests_get_json_errors() {
    let state = make_state().await;
    let nonce = general_nonce(&state, UserId::ANONYMOUS);

    let bad_id = serde_urlencoded::to_string([
        ("action", "save_comment"),
        ("comment_id", "abc"),
        ("post_id", "10"),
        ("nonce", nonce.as_str()),
        ("comment_content", "x"),
    ])
    .unwrap();
    let (status, _, body) = ajax(&state, bad_id, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], true);
    assert_eq!(body["remove"], false);
    assert!(!body["error"].as_str().unwrap().is_empty());

    let unknown = serde_urlencoded::to_string([
        ("action", "bogus"),
        ("comment_id", "1"),
        ("post_id", "10"),
        ("nonce", nonce.as_str()),
    ])
    .unwrap();
    let (status, _, body) = ajax(&state, unknown, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], true);
    assert!(body["error"].as_str().unwrap().contains("bogus"));
}

// ── delete_comment ────────────────────────────────────────────────────────────

async fn delete(state: &AppState, comment: &Comment, cookie: Option<&str>) -> (StatusCode, HeaderMap, Value) {
    let nonce = edit_nonce(state, comment, UserId::ANONYMOUS);
    ajax(
        state,
        form("delete_comment", comment.id, comment.post_id, &nonce, None),
        cookie,
    )
    .await
}

#[tokio::test]
async fn delete_moves_comment_to_trash() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, headers, body) = delete(&state, &comment, Some(&cookie)).await;
    assert_eq!(body["errors"], false);
    assert_eq!(body["error"], "");
    assert!(headers.get(header::SET_COOKIE).is_some());

    assert_eq!(stored(&state, &comment).await.approval, Approval::Trash);
    assert_eq!(
        state.db.trashed_status(comment.id).await.unwrap(),
        Some(Approval::Approved)
    );

    let (_, _, body) = delete(&state, &comment, Some(&cookie)).await;
    assert_eq!(body["error"], "You can no longer edit this comment");
}

#[tokio::test]
async fn delete_disabled_fails_even_with_valid_token() {
    let mut state = make_state().await;
    state.policy.allow_delete = false;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;

    let (_, _, body) = delete(&state, &comment, Some(&cookie)).await;
    assert_eq!(body["errors"], true);
    assert_eq!(body["remove"], true);
    assert_eq!(body["error"], "You can no longer edit this comment");
    assert_eq!(stored(&state, &comment).await.approval, Approval::Approved);
}

// ── get_time_left / get_comment ───────────────────────────────────────────────

#[tokio::test]
async fn time_left_counts_down() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::seconds(75)).await;
    let cookie = seed_token(&state, &comment).await;
    let nonce = general_nonce(&state, UserId::ANONYMOUS);
    let request = form("get_time_left", comment.id, comment.post_id, &nonce, None);

    let (_, _, body) = ajax(&state, request.clone(), Some(&cookie)).await;
    assert_eq!(body["can_edit"], true);
    assert_eq!(body["comment_id"], comment.id.get());
    assert_eq!(body["allow_unlimited_time"], false);
    let left = body["minutes"].as_i64().unwrap() * 60 + body["seconds"].as_i64().unwrap();
    assert!((220..=225).contains(&left), "left = {left}");

    let (_, _, body) = ajax(&state, request, None).await;
    assert_eq!(
        body,
        serde_json::json!({
            "minutes": 0, "seconds": 0, "comment_id": 0,
            "can_edit": false, "allow_unlimited_time": false
        })
    );
}

#[tokio::test]
async fn get_comment_returns_rendered_html() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &comment).await;
    let nonce = general_nonce(&state, UserId::ANONYMOUS);

    let (_, _, body) = ajax(
        &state,
        form("get_comment", comment.id, comment.post_id, &nonce, None),
        Some(&cookie),
    )
    .await;
    assert_eq!(body["id"], comment.id.get());
    assert_eq!(body["content"], "original text");
    assert_eq!(body["comment_html"], "<p>original text</p>");
    assert!(body.get("author_ip").is_none());
}

// ── token issuance ────────────────────────────────────────────────────────────

async fn create(state: &AppState, body: Value, cookie: Option<&str>) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/posts/{}/comments", POST))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, UA)
        .header("x-forwarded-for", IP);
    if let Some(c) = cookie {
        builder = builder.header(header::COOKIE, c);
    }
    send(state, builder.body(Body::from(body.to_string())).unwrap()).await
}

#[tokio::test]
async fn posting_sets_cookie_that_unlocks_editing() {
    let state = make_state().await;
    let (status, headers, body) = create(
        &state,
        serde_json::json!({ "author_name": "Ferris", "content": "first!" }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (name, value) = set_cookie_pair(&headers).unwrap();
    assert!(name.starts_with(token::COOKIE_PREFIX));
    assert_eq!(body["cookie"]["name"], name);
    assert_eq!(body["cookie"]["value"], value);
    assert_eq!(body["cookie"]["path"], "/");

    let comment = state
        .db
        .get_comment(CommentId(body["comment"]["id"].as_i64().unwrap()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(comment.author_ip, IP);

    let cookie = format!("{}={}", name, value);
    let (_, _, body) = save(&state, &comment, "second thoughts", Some(&cookie)).await;
    assert_eq!(body["errors"], false);
}

#[tokio::test]
async fn signed_in_posts_get_no_cookie() {
    let state = make_state().await;
    let session = format!("{}={}", SESSION_COOKIE, state.sessions.sign(UserId(5)));
    let (status, headers, body) = create(
        &state,
        serde_json::json!({ "author_name": "Ferris", "content": "hello" }),
        Some(&session),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(body["cookie"].is_null());
}

#[tokio::test]
async fn blank_comment_is_bad_request() {
    let state = make_state().await;
    let (status, _, body) = create(
        &state,
        serde_json::json!({ "author_name": "Ferris", "content": "  " }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], true);
}

#[tokio::test]
async fn spam_posts_get_no_token() {
    let state = make_state().await;
    let (_, headers, body) = create(
        &state,
        serde_json::json!({ "author_name": "Bot", "content": "viagra" }),
        None,
    )
    .await;
    assert_eq!(body["comment"]["approval"], "spam");
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn ajax_posts_fetch_cookie_once() {
    let state = make_state().await;
    let (_, headers, body) = create(
        &state,
        serde_json::json!({ "author_name": "Ferris", "content": "via script", "ajax": true }),
        None,
    )
    .await;
    assert!(headers.get(header::SET_COOKIE).is_none());
    let id = CommentId(body["comment"]["id"].as_i64().unwrap());
    let nonce = general_nonce(&state, UserId::ANONYMOUS);
    let request = form("get_cookie_var", id, POST, &nonce, None);

    let (_, headers, body) = ajax(&state, request.clone(), None).await;
    let (name, value) = set_cookie_pair(&headers).unwrap();
    assert_eq!(body["name"], name);
    assert_eq!(body["value"], value);
    assert_eq!(body["comment_id"], id.get());
    assert!(body["expires"].as_i64().unwrap() > Utc::now().timestamp_millis());

    // 第二次请求只会让 cookie 过期
    let (_, headers, body) = ajax(&state, request, None).await;
    assert_eq!(body, serde_json::json!({}));
    let raw = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(raw.contains("Max-Age=0"));
}

#[tokio::test]
async fn cookie_var_refuses_other_visitors() {
    let state = make_state().await;
    let comment = seed_comment(&state, UserId::ANONYMOUS, Duration::seconds(5)).await;
    let nonce = general_nonce(&state, UserId::ANONYMOUS);
    let body = form("get_cookie_var", comment.id, comment.post_id, &nonce, None);
    let req = Request::builder()
        .method("POST")
        .uri("/api/ajax")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::USER_AGENT, "someone-else/2.0")
        .header("x-forwarded-for", IP)
        .body(Body::from(body))
        .unwrap();

    let (_, headers, body) = send(&state, req).await;
    assert_eq!(body["error"], "You do not have permission to edit this comment.");
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(state
        .db
        .get_post_meta(comment.post_id, &token::meta_key(comment.id))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn old_tokens_are_collected() {
    let mut state = make_state().await;
    state.policy.security_key_min = 3;

    let mut ids = Vec::new();
    for i in 0..3 {
        let (_, _, body) = create(
            &state,
            serde_json::json!({ "author_name": "Ferris", "content": format!("comment {i}") }),
            None,
        )
        .await;
        ids.push(CommentId(body["comment"]["id"].as_i64().unwrap()));
    }

    let mut remaining = 0;
    for id in &ids {
        if state
            .db
            .get_post_meta(POST, &token::meta_key(*id))
            .await
            .unwrap()
            .is_some()
        {
            remaining += 1;
        }
    }
    // 第三条评论触发回收，只保留它自己的令牌
    assert_eq!(remaining, 1);
    assert!(state
        .db
        .get_post_meta(POST, &token::meta_key(ids[2]))
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        state.db.get_option("security_key_count").await.unwrap().as_deref(),
        Some("1")
    );
}

// ── listing ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_shows_widget_only_to_author() {
    let state = make_state().await;
    let mine = seed_comment(&state, UserId::ANONYMOUS, Duration::minutes(1)).await;
    let cookie = seed_token(&state, &mine).await;
    let other = seed_comment(&state, UserId(9), Duration::minutes(1)).await;

    let req = |cookie: Option<&str>| {
        let mut b = Request::builder()
            .uri(format!("/api/posts/{}/comments", POST))
            .header(header::USER_AGENT, UA)
            .header("x-forwarded-for", IP);
        if let Some(c) = cookie {
            b = b.header(header::COOKIE, c.to_string());
        }
        b.body(Body::empty()).unwrap()
    };

    let (status, _, body) = send(&state, req(Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["comments"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], mine.id.get());
    assert_eq!(items[0]["editable"], true);
    assert!(items[0]["html"]
        .as_str()
        .unwrap()
        .contains(&format!("revise-edit-comment{}", mine.id)));
    assert_eq!(items[1]["id"], other.id.get());
    assert_eq!(items[1]["editable"], false);
    assert_eq!(items[1]["html"], "<p>original text</p>");

    let nonce = body["nonce"].as_str().unwrap();
    assert!(state
        .nonces
        .verify(nonce, GENERAL_ACTION, UserId::ANONYMOUS, Utc::now().timestamp()));

    let (_, _, body) = send(&state, req(None)).await;
    assert!(body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["editable"] == false));
}
