use crate::Db;
use domain::PostId;
use sqlx::Row;

impl Db {
    pub async fn get_option(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM options WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    pub async fn update_option(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO options (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value"
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_post_meta(&self, post_id: PostId, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT meta_value FROM post_meta WHERE post_id = ? AND meta_key = ?")
            .bind(post_id.get())
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    /// Returns `false` when the key already exists; the stored value is left untouched.
    pub async fn add_post_meta_unique(
        &self,
        post_id: PostId,
        key: &str,
        value: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO post_meta (post_id, meta_key, meta_value) VALUES (?, ?, ?)",
        )
        .bind(post_id.get())
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_post_meta(&self, post_id: PostId, key: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM post_meta WHERE post_id = ? AND meta_key = ?")
            .bind(post_id.get())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 删除最旧的 `limit` 条令牌（值以 `value_prefix` 开头），跳过 `keep_key`
    pub async fn purge_oldest_post_meta(
        &self,
        value_prefix: &str,
        keep_key: &str,
        limit: i64,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM post_meta
            WHERE meta_id IN (
                SELECT meta_id FROM post_meta
                WHERE substr(meta_value, 1, ?) = ? AND meta_key <> ?
                ORDER BY meta_id ASC
                LIMIT ?
            )
            "#,
        )
        .bind(value_prefix.chars().count() as i64)
        .bind(value_prefix)
        .bind(keep_key)
        .bind(limit)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
