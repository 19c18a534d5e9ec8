use axum::extract::FromRef;
use domain::{moderation::ModerationRules, CommentEvent, EditHooks, EditWindow};
use std::sync::Arc;
use storage::Db;
use tokio::sync::broadcast;

use crate::nonce::NonceGuard;
use crate::session::SessionKeys;
use crate::spam::SpamCheck;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub hooks: Arc<dyn EditHooks>,
    pub spam: Arc<dyn SpamCheck>,
    pub nonces: NonceGuard,
    pub sessions: SessionKeys,
    pub policy: EditPolicy,
    pub moderation: Arc<ModerationRules>,
    pub tx_events: broadcast::Sender<CommentEvent>,
}

/// Editing settings after the hooks have had their say.
#[derive(Clone, Debug)]
pub struct EditPolicy {
    pub window: EditWindow,
    pub allow_delete: bool,
    pub security_key_min: u32,
    pub cookie_path: String,
    pub trust_proxy: bool,
}

impl EditPolicy {
    pub fn resolve(
        hooks: &dyn EditHooks,
        comment_time: u32,
        allow_delete: bool,
        security_key_min: u32,
        cookie_path: String,
        trust_proxy: bool,
    ) -> Self {
        Self {
            window: EditWindow::new(hooks.comment_time(comment_time)),
            allow_delete: hooks.allow_delete(allow_delete),
            security_key_min: hooks.security_key_min(security_key_min),
            cookie_path,
            trust_proxy,
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
