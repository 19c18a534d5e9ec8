use crate::models::{CommentId, PostId};
use serde::{Deserialize, Serialize};

/// 推送给同一文章页面的实时事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommentEvent {
    Updated {
        post_id: PostId,
        comment_id: CommentId,
        comment_html: String,
    },
    /// 修改后进入待审，其他读者应把它从页面上撤下
    Held {
        post_id: PostId,
        comment_id: CommentId,
    },
    Trashed {
        post_id: PostId,
        comment_id: CommentId,
    },
}

impl CommentEvent {
    pub fn post_id(&self) -> PostId {
        match self {
            CommentEvent::Updated { post_id, .. }
            | CommentEvent::Held { post_id, .. }
            | CommentEvent::Trashed { post_id, .. } => *post_id,
        }
    }
}
