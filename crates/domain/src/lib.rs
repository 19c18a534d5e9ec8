mod error;
mod events;
mod hooks;
mod models;
pub mod moderation;
pub mod protocol;
pub mod render;
pub mod token;
mod window;

pub use error::EditError;
pub use events::CommentEvent;
pub use hooks::{DefaultHooks, EditHooks};
pub use models::{
    truncate_user_agent, Approval, Comment, CommentId, NewComment, PostId, PublicComment, UserId,
};
pub use window::{EditWindow, DEFAULT_EDIT_MINUTES, MAX_EDIT_MINUTES};
