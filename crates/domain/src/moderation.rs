use serde::Deserialize;

use crate::models::{Approval, Comment, NewComment};

/// Author-side fields the word lists are matched against.
pub trait Authored {
    fn author_fields(&self) -> [&str; 5];
}

impl Authored for Comment {
    fn author_fields(&self) -> [&str; 5] {
        [
            &self.author_name,
            &self.author_email,
            &self.author_url,
            &self.author_ip,
            &self.user_agent,
        ]
    }
}

impl Authored for NewComment {
    fn author_fields(&self) -> [&str; 5] {
        [
            &self.author_name,
            &self.author_email,
            &self.author_url,
            &self.author_ip,
            &self.user_agent,
        ]
    }
}

/// Word lists and link limit applied to new and edited comments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationRules {
    /// Matches hold a comment for moderation.
    #[serde(default)]
    pub moderation_keys: Vec<String>,
    /// Matches mark a comment as spam.
    #[serde(default)]
    pub blacklist_keys: Vec<String>,
    /// 0 关闭链接数检查
    #[serde(default)]
    pub max_links: usize,
}

impl ModerationRules {
    /// `true` when the comment may be published without moderation.
    pub fn check_comment(&self, comment: &impl Authored, content: &str) -> bool {
        if self.max_links > 0 && count_links(content) >= self.max_links {
            return false;
        }
        !matches_any(&self.moderation_keys, comment, content)
    }

    /// `true` when the comment hits the blacklist.
    pub fn blacklist_check(&self, comment: &impl Authored, content: &str) -> bool {
        matches_any(&self.blacklist_keys, comment, content)
    }

    /// Status for new text of an existing comment. Only approved comments
    /// are re-moderated; the blacklist applies to all.
    pub fn evaluate(&self, comment: &Comment, content: &str) -> Approval {
        if self.blacklist_check(comment, content) {
            return Approval::Spam;
        }
        match comment.approval {
            Approval::Approved if !self.check_comment(comment, content) => Approval::Pending,
            other => other,
        }
    }

    /// Status for a comment that has not been stored yet.
    pub fn evaluate_new(&self, comment: &NewComment) -> Approval {
        if self.blacklist_check(comment, &comment.content) {
            Approval::Spam
        } else if self.check_comment(comment, &comment.content) {
            Approval::Approved
        } else {
            Approval::Pending
        }
    }
}

fn matches_any(keys: &[String], comment: &impl Authored, content: &str) -> bool {
    let mut fields: Vec<String> = comment
        .author_fields()
        .iter()
        .map(|f| f.to_lowercase())
        .collect();
    fields.push(content.to_lowercase());

    keys.iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| fields.iter().any(|f| f.contains(&k)))
}

fn count_links(content: &str) -> usize {
    let lower = content.to_lowercase();
    lower.matches("http://").count() + lower.matches("https://").count()
}
