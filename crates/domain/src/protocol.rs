use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::models::{CommentId, PostId, PublicComment};

/// 编辑 / 删除动作的统一响应体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditResponse {
    pub errors: bool,
    pub remove: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
}

impl EditResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_text(comment_text: String) -> Self {
        Self {
            comment_text: Some(comment_text),
            ..Self::default()
        }
    }
}

impl From<&EditError> for EditResponse {
    fn from(err: &EditError) -> Self {
        Self {
            errors: true,
            remove: err.removes_interface(),
            error: err.message(),
            comment_text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLeft {
    pub minutes: i64,
    pub seconds: i64,
    pub comment_id: CommentId,
    pub can_edit: bool,
    pub allow_unlimited_time: bool,
}

impl TimeLeft {
    pub fn denied() -> Self {
        Self {
            minutes: 0,
            seconds: 0,
            comment_id: CommentId(0),
            can_edit: false,
            allow_unlimited_time: false,
        }
    }

    pub fn from_seconds(comment_id: CommentId, seconds_left: i64) -> Self {
        Self {
            minutes: seconds_left.div_euclid(60),
            seconds: seconds_left.rem_euclid(60),
            comment_id,
            can_edit: true,
            allow_unlimited_time: false,
        }
    }
}

/// Cookie description handed to clients that set the cookie themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieData {
    pub name: String,
    pub value: String,
    /// 毫秒时间戳
    pub expires: i64,
    pub post_id: PostId,
    pub comment_id: CommentId,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPayload {
    #[serde(flatten)]
    pub comment: PublicComment,
    pub comment_html: String,
}
