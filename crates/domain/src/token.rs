//! Edit token derivation: the fingerprint, cookie name and meta key that tie
//! an anonymous visitor to the comment they just posted.

use chrono::NaiveDate;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::models::{Comment, CommentId, UserId};

pub const COOKIE_PREFIX: &str = "ReviseCommentEditing";
pub const TOKEN_PREFIX: &str = "_revise";
pub const META_KEY_PREFIX: &str = "_revise_comment_";

pub fn fingerprint(ip: &str, date: NaiveDate, user_id: UserId, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(user_id.to_string().as_bytes());
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint recomputed from what was recorded when the comment was posted.
pub fn comment_fingerprint(comment: &Comment) -> String {
    fingerprint(
        &comment.author_ip,
        comment.created_at.date(),
        comment.user_id,
        &comment.user_agent,
    )
}

pub fn cookie_name(comment_id: CommentId, fingerprint: &str) -> String {
    format!("{}{}{}", COOKIE_PREFIX, comment_id, fingerprint)
}

pub fn meta_key(comment_id: CommentId) -> String {
    format!("{}{}", META_KEY_PREFIX, comment_id)
}

pub fn new_token_value(fingerprint: &str) -> String {
    let mut buf = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut buf);
    format!("{}{}{}", TOKEN_PREFIX, fingerprint, hex::encode(buf))
}
