mod comments;
mod meta;
