use crate::models::{Comment, CommentId, PostId, UserId};
use crate::protocol::EditResponse;

/// Extension points around editing. Every method receives the value the
/// service would use and returns the one it should use; the defaults pass
/// values through unchanged.
pub trait EditHooks: Send + Sync {
    /// Edit window in minutes before clamping.
    fn comment_time(&self, minutes: u32) -> u32 {
        minutes
    }

    fn allow_delete(&self, allow: bool) -> bool {
        allow
    }

    /// Called when the window is over.
    fn can_edit_after_time(&self, allowed: bool, _comment: &Comment) -> bool {
        allowed
    }

    /// Called when a signed-in visitor is not the comment's author.
    fn can_edit_not_author(&self, allowed: bool, _comment: &Comment, _visitor: UserId) -> bool {
        allowed
    }

    /// Final say after every other check passed.
    fn can_edit(&self, allowed: bool, _comment: &Comment) -> bool {
        allowed
    }

    /// Custom validation of an edit before it is stored. A message aborts the save.
    fn check_errors(&self, _comment: &Comment) -> Option<String> {
        None
    }

    fn save_before(&self, comment: Comment, _post_id: PostId) -> Comment {
        comment
    }

    fn save_after(&self, _comment: &Comment, _post_id: PostId) {}

    fn save_return(&self, response: EditResponse, _comment_id: CommentId) -> EditResponse {
        response
    }

    /// Raw text placed in the edit textarea.
    fn textarea_content(&self, raw: String, _comment: &Comment) -> String {
        raw
    }

    /// Rendered comment HTML.
    fn comment_text(&self, html: String, _comment: &Comment) -> String {
        html
    }

    fn extra_fields(&self, _post_id: PostId, _comment_id: CommentId) -> String {
        String::new()
    }

    fn buttons(&self, markup: String, _comment_id: CommentId) -> String {
        markup
    }

    /// The whole editing widget.
    fn edit_widget(&self, markup: String, _comment_id: CommentId) -> String {
        markup
    }

    /// Post-meta tokens kept before the oldest ones are collected.
    fn security_key_min(&self, count: u32) -> u32 {
        count
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl EditHooks for DefaultHooks {}
