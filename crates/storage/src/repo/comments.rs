use crate::{
    models::{SqlComment, COMMENT_COLUMNS},
    Db,
};
use chrono::Utc;
use domain::{Approval, Comment, CommentId, NewComment, PostId};

const TRASH_STATUS_KEY: &str = "_trash_meta_status";

impl Db {
    pub async fn insert_comment(&self, c: &NewComment) -> anyhow::Result<Comment> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (
                post_id, parent_id, user_id,
                author_name, author_email, author_url,
                author_ip, user_agent,
                content, approved, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(c.post_id.get())
        .bind(c.parent_id.map(CommentId::get))
        .bind(c.user_id.get())
        .bind(&c.author_name)
        .bind(&c.author_email)
        .bind(&c.author_url)
        .bind(&c.author_ip)
        .bind(&c.user_agent)
        .bind(&c.content)
        .bind(c.approval.as_str())
        .bind(c.created_at)
        .execute(&self.pool)
        .await?;

        let id = CommentId(result.last_insert_rowid());
        self.get_comment(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment {} vanished after insert", id))
    }

    pub async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        let sql = format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS);
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// 只写回可编辑字段：正文、审核状态、更新时间
    pub async fn update_comment(&self, c: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE comments
            SET content = ?, approved = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&c.content)
        .bind(c.approval.as_str())
        .bind(c.updated_at)
        .bind(c.id.get())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_comment_approval(
        &self,
        id: CommentId,
        approval: Approval,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE comments SET approved = ? WHERE id = ?")
            .bind(approval.as_str())
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Soft delete: the row stays for moderators, the previous status is kept
    /// in comment meta so it can be restored.
    pub async fn trash_comment(&self, id: CommentId) -> anyhow::Result<Option<PostId>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT post_id, approved FROM comments WHERE id = ?")
                .bind(id.get())
                .fetch_optional(&mut *tx)
                .await?;

        let Some((post_id, previous)) = row else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO comment_meta (comment_id, meta_key, meta_value)
            VALUES (?, ?, ?)
            ON CONFLICT(comment_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value
            "#,
        )
        .bind(id.get())
        .bind(TRASH_STATUS_KEY)
        .bind(&previous)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE comments SET approved = ?, updated_at = ? WHERE id = ?")
            .bind(Approval::Trash.as_str())
            .bind(Utc::now().naive_utc())
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(PostId(post_id)))
    }

    pub async fn trashed_status(&self, id: CommentId) -> anyhow::Result<Option<Approval>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT meta_value FROM comment_meta WHERE comment_id = ? AND meta_key = ?",
        )
        .bind(id.get())
        .bind(TRASH_STATUS_KEY)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(v,)| v.parse().ok()))
    }

    /// Comments of a post that are neither spam nor trashed, oldest first.
    pub async fn list_comments(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE post_id = ? AND approved IN ('0', '1') ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(post_id.get())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
