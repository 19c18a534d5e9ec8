use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{NaiveDateTime, Utc};
use domain::{
    protocol::CookieData,
    render::{render_comment_text, render_edit_interface, EditInterface},
    Approval, CommentId, NewComment, PostId, PublicComment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::can_edit;
use crate::http::error::ApiError;
use crate::nonce::{edit_action, GENERAL_ACTION};
use crate::state::AppState;
use crate::tokens::{collect_security_keys, issue_edit_token, Issued};
use crate::visitor::Visitor;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub author_url: String,
    pub content: String,
    pub parent_id: Option<i64>,
    /// 脚本提交：不在响应里设置 cookie，由客户端稍后通过 get_cookie_var 领取
    #[serde(default)]
    pub ajax: bool,
}

#[derive(Serialize, Deserialize)]
pub struct CreatedComment {
    pub comment: PublicComment,
    pub cookie: Option<CookieData>,
}

#[derive(Serialize, Deserialize)]
pub struct CommentListItem {
    pub id: CommentId,
    pub author_name: String,
    pub created_at: NaiveDateTime,
    pub editable: bool,
    pub html: String,
}

#[derive(Serialize, Deserialize)]
pub struct CommentList {
    pub nonce: String,
    pub comments: Vec<CommentListItem>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    visitor: Visitor,
) -> Result<Json<CommentList>, ApiError> {
    let post_id = PostId(post_id);
    let now = Utc::now();
    let hooks = state.hooks.as_ref();

    let mut items = Vec::new();
    for comment in state.db.list_comments(post_id).await? {
        let editable = can_edit(&state, &comment, post_id, &visitor, now.naive_utc()).await?;
        if comment.approval != Approval::Approved && !editable {
            continue;
        }

        let rendered = render_comment_text(&comment, hooks);
        let html = if editable {
            let edit_nonce = state
                .nonces
                .create(&edit_action(comment.id), visitor.user, now.timestamp());
            render_edit_interface(
                &EditInterface {
                    comment: &comment,
                    rendered: &rendered,
                    edit_nonce: &edit_nonce,
                    allow_delete: state.policy.allow_delete,
                },
                hooks,
            )
        } else {
            rendered
        };

        items.push(CommentListItem {
            id: comment.id,
            author_name: comment.author_name,
            created_at: comment.created_at,
            editable,
            html,
        });
    }

    Ok(Json(CommentList {
        nonce: state
            .nonces
            .create(GENERAL_ACTION, visitor.user, now.timestamp()),
        comments: items,
    }))
}

pub async fn post_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    visitor: Visitor,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Response, ApiError> {
    let post_id = PostId(post_id);
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Comment content cannot be empty".into()));
    }
    let author_name = payload.author_name.trim();
    if author_name.is_empty() {
        return Err(ApiError::BadRequest("Author name is required".into()));
    }

    let now = Utc::now();
    let mut new_comment = NewComment {
        post_id,
        parent_id: payload.parent_id.map(CommentId),
        user_id: visitor.user,
        author_name: author_name.to_string(),
        author_email: payload.author_email.trim().to_string(),
        author_url: payload.author_url.trim().to_string(),
        author_ip: visitor.ip.clone(),
        user_agent: visitor.user_agent.clone(),
        content: content.to_string(),
        approval: Approval::Pending,
        created_at: now.naive_utc(),
    };
    new_comment.approval = state.moderation.evaluate_new(&new_comment);

    let comment = state.db.insert_comment(&new_comment).await?;
    info!(
        "Comment {} posted on {} ({})",
        comment.id, post_id, comment.approval
    );

    let mut cookie_data = None;
    let mut jar = CookieJar::new();
    if comment.approval != Approval::Spam {
        if !payload.ajax {
            match issue_edit_token(&state, &visitor, post_id, comment.id, now).await? {
                Issued::Stored { cookie, data } => {
                    jar = jar.add(cookie);
                    cookie_data = Some(data);
                }
                Issued::Removed(cookie) => jar = jar.add(cookie),
                Issued::Skipped => {}
            }
        }
        collect_security_keys(&state, comment.id).await?;
    }

    let body = CreatedComment {
        comment: PublicComment::from(&comment),
        cookie: cookie_data,
    };
    Ok((StatusCode::CREATED, jar, Json(body)).into_response())
}
