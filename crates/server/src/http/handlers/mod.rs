pub mod ajax;
pub mod comments;
pub mod sse;
