use chrono::NaiveDateTime;
use domain::{token, Approval, Comment, PostId};
use tracing::debug;

use crate::state::AppState;
use crate::visitor::Visitor;

/// Whether `visitor` may still edit `comment`.
///
/// Out-of-window comments are refused unless `can_edit_after_time` says
/// otherwise. Signed-in visitors must be the author. Anonymous visitors must
/// present the edit cookie whose value equals the token kept in post meta.
pub async fn can_edit(
    state: &AppState,
    comment: &Comment,
    post_id: PostId,
    visitor: &Visitor,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    if comment.post_id != post_id || matches!(comment.approval, Approval::Spam | Approval::Trash) {
        return Ok(false);
    }

    let hooks = state.hooks.as_ref();

    if state.policy.window.has_elapsed(comment.created_at, now) {
        return Ok(hooks.can_edit_after_time(false, comment));
    }

    if visitor.is_signed_in() {
        if visitor.user != comment.user_id {
            return Ok(hooks.can_edit_not_author(false, comment, visitor.user));
        }
    } else {
        let fingerprint = token::comment_fingerprint(comment);
        let cookie_name = token::cookie_name(comment.id, &fingerprint);
        let Some(cookie_value) = visitor.cookies.get(&cookie_name).map(|c| c.value()) else {
            debug!("Comment {}: no edit cookie", comment.id);
            return Ok(false);
        };

        let stored = state
            .db
            .get_post_meta(post_id, &token::meta_key(comment.id))
            .await?;
        if stored.as_deref() != Some(cookie_value) {
            debug!("Comment {}: edit cookie does not match", comment.id);
            return Ok(false);
        }
    }

    Ok(hooks.can_edit(true, comment))
}
