use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 浏览器 UA 最多保留的字符数
pub const MAX_USER_AGENT_LEN: usize = 254;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(CommentId);
id_type!(PostId);
id_type!(UserId);

impl UserId {
    pub const ANONYMOUS: UserId = UserId(0);

    pub fn is_anonymous(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Approval {
    Pending,
    Approved,
    Spam,
    Trash,
}

impl Approval {
    pub fn as_str(self) -> &'static str {
        match self {
            Approval::Pending => "0",
            Approval::Approved => "1",
            Approval::Spam => "spam",
            Approval::Trash => "trash",
        }
    }
}

impl FromStr for Approval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Approval::Pending),
            "1" => Ok(Approval::Approved),
            "spam" => Ok(Approval::Spam),
            "trash" => Ok(Approval::Trash),
            other => Err(format!("Unknown approval status: {}", other)),
        }
    }
}

impl fmt::Display for Approval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub user_id: UserId,
    pub author_name: String,
    pub author_email: String,
    pub author_url: String,
    pub author_ip: String,
    pub user_agent: String,
    pub content: String,
    pub comment_type: String,
    pub approval: Approval,
    /// UTC
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// 写入前的评论，id 由存储层分配
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub user_id: UserId,
    pub author_name: String,
    pub author_email: String,
    pub author_url: String,
    pub author_ip: String,
    pub user_agent: String,
    pub content: String,
    pub approval: Approval,
    pub created_at: NaiveDateTime,
}

/// 对外暴露的评论视图，不含 IP / 邮箱 / UA
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicComment {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub author_name: String,
    pub author_url: String,
    pub content: String,
    pub approval: Approval,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl From<&Comment> for PublicComment {
    fn from(c: &Comment) -> Self {
        PublicComment {
            id: c.id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            author_name: c.author_name.clone(),
            author_url: c.author_url.clone(),
            content: c.content.clone(),
            approval: c.approval,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

pub fn truncate_user_agent(ua: &str) -> String {
    ua.chars().take(MAX_USER_AGENT_LEN).collect()
}
