use anyhow::Result;
use async_trait::async_trait;
use domain::Comment;

/// External spam oracle consulted after an edit has been stored.
#[async_trait]
pub trait SpamCheck: Send + Sync {
    async fn is_spam(&self, comment: &Comment) -> Result<bool>;
}

/// 未配置外部服务时使用
pub struct NoSpamCheck;

#[async_trait]
impl SpamCheck for NoSpamCheck {
    async fn is_spam(&self, _comment: &Comment) -> Result<bool> {
        Ok(false)
    }
}
