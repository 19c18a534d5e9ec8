use axum_extra::extract::cookie::Cookie;
use chrono::{DateTime, Duration, Utc};
use domain::{protocol::CookieData, token, Comment, CommentId, PostId};
use tracing::{debug, info};

use crate::cookies::{edit_cookie, removal_cookie};
use crate::state::AppState;
use crate::visitor::Visitor;

const SECURITY_KEY_COUNT: &str = "security_key_count";
const SECURITY_KEY_BATCH: i64 = 50;

#[derive(Debug)]
pub enum Issued {
    /// Signed-in visitors are checked by account, nothing is stored.
    Skipped,
    /// A token already exists for the comment. Only an expired cookie is sent.
    Removed(Cookie<'static>),
    Stored {
        cookie: Cookie<'static>,
        data: CookieData,
    },
}

/// Create the token pair for a freshly posted comment. Post meta is written
/// at most once per comment; asking again counts as a request to drop the
/// cookie.
pub async fn issue_edit_token(
    state: &AppState,
    visitor: &Visitor,
    post_id: PostId,
    comment_id: CommentId,
    now: DateTime<Utc>,
) -> anyhow::Result<Issued> {
    let fingerprint = token::fingerprint(
        &visitor.ip,
        now.date_naive(),
        visitor.user,
        &visitor.user_agent,
    );
    let name = token::cookie_name(comment_id, &fingerprint);
    let value = token::new_token_value(&fingerprint);
    let path = state.policy.cookie_path.as_str();

    if visitor.is_signed_in() {
        return Ok(Issued::Skipped);
    }

    let stored = state
        .db
        .add_post_meta_unique(post_id, &token::meta_key(comment_id), &value)
        .await?;
    if !stored {
        debug!("Comment {}: token already issued, expiring cookie", comment_id);
        return Ok(Issued::Removed(removal_cookie(name, path)));
    }

    let expires = now + Duration::seconds(state.policy.window.seconds());
    let data = CookieData {
        name: name.clone(),
        value: value.clone(),
        expires: expires.timestamp_millis(),
        post_id,
        comment_id,
        path: path.to_string(),
    };
    info!("Edit token issued for comment {}", comment_id);

    Ok(Issued::Stored {
        cookie: edit_cookie(name, value, path, expires, now),
        data,
    })
}

/// Drop the server-side token and hand back an expired cookie for the
/// comment's author.
pub async fn revoke_edit_token(
    state: &AppState,
    comment: &Comment,
) -> anyhow::Result<Cookie<'static>> {
    state
        .db
        .delete_post_meta(comment.post_id, &token::meta_key(comment.id))
        .await?;
    info!("Edit token revoked for comment {}", comment.id);

    let name = token::cookie_name(comment.id, &token::comment_fingerprint(comment));
    Ok(removal_cookie(name, &state.policy.cookie_path))
}

/// Counts issued tokens and, once the count reaches `security_key_min`,
/// deletes the oldest batch of stored tokens other than `keep`'s.
pub async fn collect_security_keys(state: &AppState, keep: CommentId) -> anyhow::Result<()> {
    let count = state
        .db
        .get_option(SECURITY_KEY_COUNT)
        .await?
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);
    let mut count = if count == 0 { 1 } else { count + 1 };

    if count >= state.policy.security_key_min {
        let removed = state
            .db
            .purge_oldest_post_meta(token::TOKEN_PREFIX, &token::meta_key(keep), SECURITY_KEY_BATCH)
            .await?;
        info!("Collected {} stale edit tokens", removed);
        count = 1;
    }

    state
        .db
        .update_option(SECURITY_KEY_COUNT, &count.to_string())
        .await
}
