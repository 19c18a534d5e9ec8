use chrono::NaiveDateTime;
use domain::{Approval, Comment, CommentId, PostId, UserId};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub user_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub author_url: String,
    pub author_ip: String,
    pub user_agent: String,
    pub content: String,
    pub comment_type: String,
    pub approved: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        let approval = sql.approved.parse().unwrap_or_else(|e| {
            // 未知状态按待审处理，避免误放行
            tracing::warn!("Comment {}: {}", sql.id, e);
            Approval::Pending
        });
        Comment {
            id: CommentId(sql.id),
            post_id: PostId(sql.post_id),
            parent_id: sql.parent_id.map(CommentId),
            user_id: UserId(sql.user_id),
            author_name: sql.author_name,
            author_email: sql.author_email,
            author_url: sql.author_url,
            author_ip: sql.author_ip,
            user_agent: sql.user_agent,
            content: sql.content,
            comment_type: sql.comment_type,
            approval,
            created_at: sql.created_at,
            updated_at: sql.updated_at,
        }
    }
}

pub(crate) const COMMENT_COLUMNS: &str = r#"
    id, post_id, parent_id, user_id,
    author_name, author_email, author_url,
    author_ip, user_agent,
    content, comment_type, approved,
    created_at, updated_at
"#;
