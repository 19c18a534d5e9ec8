use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use domain::{
    protocol::{CommentPayload, EditResponse, TimeLeft},
    render::render_comment_text,
    token, Approval, Comment, CommentEvent, CommentId, EditError, PostId, PublicComment,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::can_edit;
use crate::http::error::ApiError;
use crate::nonce::{edit_action, GENERAL_ACTION};
use crate::state::AppState;
use crate::tokens::{issue_edit_token, revoke_edit_token, Issued};
use crate::visitor::Visitor;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AjaxAction {
    GetTimeLeft,
    GetComment,
    SaveComment,
    DeleteComment,
    GetCookieVar,
}

#[derive(Deserialize, Debug)]
pub struct AjaxRequest {
    pub action: AjaxAction,
    #[serde(default)]
    pub comment_id: i64,
    #[serde(default)]
    pub post_id: i64,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub comment_content: Option<String>,
}

impl AjaxRequest {
    fn comment_id(&self) -> CommentId {
        CommentId(self.comment_id)
    }

    fn post_id(&self) -> PostId {
        PostId(self.post_id)
    }
}

/// `POST /api/ajax`: one JSON document per request, chosen by `action`.
pub async fn dispatch(
    State(state): State<AppState>,
    visitor: Visitor,
    form: Result<Form<AjaxRequest>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(req) = form.map_err(|rejection| {
        warn!("Malformed ajax request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    match req.action {
        AjaxAction::GetTimeLeft => get_time_left(&state, &visitor, &req).await,
        AjaxAction::GetComment => get_comment(&state, &visitor, &req).await,
        AjaxAction::SaveComment => save_comment(&state, &visitor, &req).await,
        AjaxAction::DeleteComment => delete_comment(&state, &visitor, &req).await,
        AjaxAction::GetCookieVar => get_cookie_var(&state, &visitor, &req).await,
    }
}

fn check_nonce(
    state: &AppState,
    visitor: &Visitor,
    nonce: &str,
    action: &str,
) -> Result<(), EditError> {
    if state
        .nonces
        .verify(nonce, action, visitor.user, Utc::now().timestamp())
    {
        Ok(())
    } else {
        Err(EditError::NonceFail)
    }
}

/// Loads the comment and re-runs the authorization check; both failures read
/// as "no longer editable".
async fn editable_comment(
    state: &AppState,
    visitor: &Visitor,
    req: &AjaxRequest,
) -> Result<Comment, ApiError> {
    let comment = state
        .db
        .get_comment(req.comment_id())
        .await?
        .ok_or(EditError::EditFail)?;

    if !can_edit(state, &comment, req.post_id(), visitor, Utc::now().naive_utc()).await? {
        return Err(EditError::EditFail.into());
    }
    Ok(comment)
}

async fn get_time_left(
    state: &AppState,
    visitor: &Visitor,
    req: &AjaxRequest,
) -> Result<Response, ApiError> {
    check_nonce(state, visitor, &req.nonce, GENERAL_ACTION)?;

    let comment = match editable_comment(state, visitor, req).await {
        Ok(c) => c,
        Err(ApiError::Edit(_)) => return Ok(Json(TimeLeft::denied()).into_response()),
        Err(e) => return Err(e),
    };

    let left = state
        .policy
        .window
        .seconds_left(comment.created_at, Utc::now().naive_utc());
    let body = if left < 0 {
        // 超时仍可编辑，说明由钩子放行
        let unlimited = state.hooks.can_edit_after_time(false, &comment);
        TimeLeft {
            minutes: 0,
            seconds: 0,
            comment_id: comment.id,
            can_edit: unlimited,
            allow_unlimited_time: unlimited,
        }
    } else {
        TimeLeft::from_seconds(comment.id, left)
    };
    Ok(Json(body).into_response())
}

async fn get_comment(
    state: &AppState,
    visitor: &Visitor,
    req: &AjaxRequest,
) -> Result<Response, ApiError> {
    check_nonce(state, visitor, &req.nonce, GENERAL_ACTION)?;
    let comment = editable_comment(state, visitor, req).await?;

    let payload = CommentPayload {
        comment: PublicComment::from(&comment),
        comment_html: render_comment_text(&comment, state.hooks.as_ref()),
    };
    Ok(Json(payload).into_response())
}

async fn save_comment(
    state: &AppState,
    visitor: &Visitor,
    req: &AjaxRequest,
) -> Result<Response, ApiError> {
    check_nonce(state, visitor, &req.nonce, &edit_action(req.comment_id()))?;
    let original = editable_comment(state, visitor, req).await?;

    let content = req.comment_content.as_deref().unwrap_or_default().trim();
    if content.is_empty() || content == "undefined" {
        return Err(EditError::CommentEmpty.into());
    }

    let hooks = state.hooks.as_ref();
    let now = Utc::now();
    let post_id = req.post_id();

    let mut to_save = original.clone();
    to_save.approval = state.moderation.evaluate(&original, content);
    to_save.content = content.to_string();
    to_save.updated_at = Some(now.naive_utc());

    if let Some(msg) = hooks.check_errors(&to_save).filter(|m| !m.is_empty()) {
        return Err(EditError::Custom(msg).into());
    }

    let mut to_save = hooks.save_before(to_save, post_id);
    // 钩子不能把修改挪到别的评论上
    to_save.id = original.id;
    to_save.post_id = original.post_id;

    state.db.update_comment(&to_save).await?;
    hooks.save_after(&to_save, post_id);

    if to_save.approval == Approval::Spam {
        warn!("Edit of comment {} hit the blacklist", to_save.id);
        let cookie = revoke_edit_token(state, &to_save).await?;
        return Err(ApiError::EditRevoked(EditError::MarkedSpam, cookie));
    }

    let flagged = state.spam.is_spam(&to_save).await.unwrap_or_else(|e| {
        // 服务不可用时按正常评论处理，修改已经保存
        warn!("Spam check failed for comment {}: {:#}", to_save.id, e);
        false
    });
    if flagged {
        warn!("Edit of comment {} flagged by spam check", to_save.id);
        state
            .db
            .set_comment_approval(to_save.id, Approval::Spam)
            .await?;
        let cookie = revoke_edit_token(state, &to_save).await?;
        return Err(ApiError::EditRevoked(EditError::MarkedSpam, cookie));
    }

    let comment_html = render_comment_text(&to_save, hooks);
    // 待审的修改不能推给其他读者
    let event = if to_save.approval == Approval::Approved {
        CommentEvent::Updated {
            post_id: to_save.post_id,
            comment_id: to_save.id,
            comment_html: comment_html.clone(),
        }
    } else {
        CommentEvent::Held {
            post_id: to_save.post_id,
            comment_id: to_save.id,
        }
    };
    let _ = state.tx_events.send(event);
    info!("Comment {} edited", to_save.id);

    let body = hooks.save_return(EditResponse::with_text(comment_html), to_save.id);
    Ok(Json(body).into_response())
}

async fn delete_comment(
    state: &AppState,
    visitor: &Visitor,
    req: &AjaxRequest,
) -> Result<Response, ApiError> {
    check_nonce(state, visitor, &req.nonce, &edit_action(req.comment_id()))?;
    if !state.policy.allow_delete {
        return Err(EditError::EditFail.into());
    }
    let comment = editable_comment(state, visitor, req).await?;

    let Some(post_id) = state.db.trash_comment(comment.id).await? else {
        return Err(EditError::EditFail.into());
    };
    let cookie = revoke_edit_token(state, &comment).await?;

    let _ = state.tx_events.send(CommentEvent::Trashed {
        post_id,
        comment_id: comment.id,
    });
    info!("Comment {} moved to trash by its author", comment.id);

    Ok((CookieJar::new().add(cookie), Json(EditResponse::ok())).into_response())
}

/// Token pair for comments posted through a script, which could not receive
/// the cookie at creation time. Only the comment's own author qualifies.
async fn get_cookie_var(
    state: &AppState,
    visitor: &Visitor,
    req: &AjaxRequest,
) -> Result<Response, ApiError> {
    check_nonce(state, visitor, &req.nonce, GENERAL_ACTION)?;

    let now = Utc::now();
    let comment = state
        .db
        .get_comment(req.comment_id())
        .await?
        .filter(|c| c.post_id == req.post_id())
        .ok_or(EditError::NonceFail)?;

    let requester = token::fingerprint(
        &visitor.ip,
        now.date_naive(),
        visitor.user,
        &visitor.user_agent,
    );
    if requester != token::comment_fingerprint(&comment) {
        return Err(EditError::NonceFail.into());
    }
    if matches!(comment.approval, Approval::Spam | Approval::Trash)
        || state
            .policy
            .window
            .has_elapsed(comment.created_at, now.naive_utc())
    {
        return Err(EditError::EditFail.into());
    }

    let empty = || Json(serde_json::json!({}));
    let res = match issue_edit_token(state, visitor, comment.post_id, comment.id, now).await? {
        Issued::Skipped => empty().into_response(),
        Issued::Removed(cookie) => (CookieJar::new().add(cookie), empty()).into_response(),
        Issued::Stored { cookie, data } => {
            (CookieJar::new().add(cookie), Json(data)).into_response()
        }
    };
    Ok(res)
}
