use serde::{Deserialize, Serialize};
use std::fmt;

/// One comment in a submission's tree, flattened. `author` is `None` for
/// deleted accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: Option<String>,
    pub body: String,
    pub created_utc: i64,
}

/// Account attributes fetched fresh for each candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub name: String,
    pub created_utc: i64,
    pub link_karma: i64,
    pub comment_karma: i64,
}

/// The submission that anchors the giveaway and its comment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub url: String,
    pub subreddit: String,
}

impl Submission {
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }
}

/// An undistributed prize. Identity is the exact text; each key is consumed
/// at most once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeKey(String);

impl PrizeKey {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrizeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How winners are notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// Reply with the key directly under the winning comment.
    Inline,
    /// Send the key by private message and leave a generic public reply.
    PrivateMessage,
}

impl Default for ReplyMode {
    fn default() -> Self {
        ReplyMode::PrivateMessage
    }
}

/// Where the giveaway runs: a fresh post in a subreddit, or an existing
/// submission by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GiveawayTarget {
    Subreddit(String),
    Submission(String),
}
