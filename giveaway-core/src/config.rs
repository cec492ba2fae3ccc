use crate::error::ConfigError;
use crate::types::{GiveawayTarget, ReplyMode};
use std::path::PathBuf;

/// Everything a single giveaway run needs, regardless of whether it came
/// from command-line flags or a resumed session.
#[derive(Debug, Clone)]
pub struct GiveawayConfig {
    /// Minimum account age in days before a commenter can win.
    pub min_account_age_days: i64,
    /// Optional second age threshold applied after the configured minimum.
    pub account_age_floor_days: Option<i64>,
    /// Seconds to sleep between comment polls.
    pub poll_seconds: u64,
    /// Keyword a comment body must contain, as a literal substring.
    pub keyword: Option<String>,
    pub reply_mode: ReplyMode,
    /// Shuffle entries instead of awarding in timestamp order.
    pub randomized: bool,
    /// Minutes to wait before the first poll. Required when randomized.
    pub wait_minutes: Option<i64>,
    pub target: GiveawayTarget,
    /// Newline-delimited prize key file.
    pub keyfile: PathBuf,
    pub min_link_karma: Option<i64>,
    pub min_comment_karma: Option<i64>,
    /// Flair template ids for the open/closed markers, if the subreddit
    /// uses them.
    pub flair_open: Option<String>,
    pub flair_closed: Option<String>,
}

/// The age and karma subset of the configuration consumed by the
/// eligibility filter.
#[derive(Debug, Clone)]
pub struct AdmissionRules {
    pub min_account_age_days: i64,
    pub account_age_floor_days: Option<i64>,
    pub min_link_karma: Option<i64>,
    pub min_comment_karma: Option<i64>,
}

impl GiveawayConfig {
    /// Validate configuration consistency before any network action.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.randomized && self.wait_minutes.is_none() {
            return Err(ConfigError::WaitRequired);
        }

        if self.min_account_age_days < 0 {
            return Err(ConfigError::InvalidValue {
                field: "age".to_string(),
                value: self.min_account_age_days.to_string(),
            });
        }

        if let Some(floor) = self.account_age_floor_days {
            if floor < 0 {
                return Err(ConfigError::InvalidValue {
                    field: "age-floor".to_string(),
                    value: floor.to_string(),
                });
            }
        }

        if let Some(wait) = self.wait_minutes {
            if wait < 0 {
                return Err(ConfigError::InvalidValue {
                    field: "wait".to_string(),
                    value: wait.to_string(),
                });
            }
        }

        match &self.target {
            GiveawayTarget::Subreddit(name) if name.trim().is_empty() => {
                Err(ConfigError::MissingField {
                    field: "subreddit".to_string(),
                })
            }
            GiveawayTarget::Submission(url) if url.trim().is_empty() => {
                Err(ConfigError::MissingField {
                    field: "url".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn admission_rules(&self) -> AdmissionRules {
        AdmissionRules {
            min_account_age_days: self.min_account_age_days,
            account_age_floor_days: self.account_age_floor_days,
            min_link_karma: self.min_link_karma,
            min_comment_karma: self.min_comment_karma,
        }
    }
}
