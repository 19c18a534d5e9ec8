use thiserror::Error;

use crate::render::escape_html;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("You do not have permission to edit this comment.")]
    NonceFail,
    #[error("You can no longer edit this comment")]
    EditFail,
    #[error("Your comment cannot be empty")]
    CommentEmpty,
    #[error("This comment was marked as spam")]
    MarkedSpam,
    /// 来自 `EditHooks::check_errors` 的自定义校验信息
    #[error("{0}")]
    Custom(String),
}

impl EditError {
    /// Whether the client should drop the editing widget from the page.
    pub fn removes_interface(&self) -> bool {
        matches!(
            self,
            EditError::NonceFail | EditError::EditFail | EditError::MarkedSpam
        )
    }

    pub fn message(&self) -> String {
        match self {
            EditError::Custom(msg) => escape_html(msg),
            other => other.to_string(),
        }
    }
}
