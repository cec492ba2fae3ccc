use chrono::{DateTime, Utc};
use clap::Parser;
use giveaway_core::{ConfigError, GiveawayConfig, GiveawayTarget, ReplyMode};
use giveaway_engine::{remaining_wait_minutes, SessionState};
use std::path::PathBuf;

/// Flag-based configuration. A detected session file offers the second way
/// in: resuming rebuilds the same [`GiveawayConfig`] from persisted state.
#[derive(Parser, Debug)]
#[command(
    name = "giveawaybot",
    about = "Distributes prize keys to eligible Reddit commenters",
    version
)]
pub struct Cli {
    /// Minimum account age in days before a commenter can win
    #[arg(long, default_value_t = 1)]
    pub age: i64,

    /// Optional second account-age floor in days, applied after --age
    #[arg(long)]
    pub age_floor: Option<i64>,

    /// Seconds to sleep between comment polls
    #[arg(long, default_value_t = 30)]
    pub poll: u64,

    /// Keyword a comment must contain to enter
    #[arg(long)]
    pub keyword: Option<String>,

    /// How winners receive their key
    #[arg(long, default_value = "pm", value_parser = ["inline", "pm"])]
    pub reply: String,

    /// Draw winners at random instead of first-come-first-served
    #[arg(long)]
    pub random: bool,

    /// Minutes to wait before the first poll (required with --random)
    #[arg(long)]
    pub wait: Option<i64>,

    /// URL of an existing submission to attach to
    #[arg(long, group = "target")]
    pub url: Option<String>,

    /// Subreddit to post a fresh giveaway submission in
    #[arg(long, group = "target")]
    pub subreddit: Option<String>,

    /// Minimum link karma (check disabled when omitted)
    #[arg(long)]
    pub min_link_karma: Option<i64>,

    /// Minimum comment karma (check disabled when omitted)
    #[arg(long)]
    pub min_comment_karma: Option<i64>,

    /// Newline-delimited list of banned handles
    #[arg(long, default_value = "banned.list")]
    pub banned_list: PathBuf,

    /// Session resource used to resume an interrupted giveaway
    #[arg(long, default_value = "resume.toml")]
    pub session_file: PathBuf,

    /// Flair template id applied while the giveaway is open
    #[arg(long)]
    pub flair_open: Option<String>,

    /// Flair template id applied when the giveaway closes
    #[arg(long)]
    pub flair_closed: Option<String>,

    /// Newline-delimited prize key file
    pub keyfile: Option<PathBuf>,
}

impl Cli {
    fn reply_mode(&self) -> ReplyMode {
        if self.reply == "inline" {
            ReplyMode::Inline
        } else {
            ReplyMode::PrivateMessage
        }
    }

    /// Build the run configuration from flags alone.
    pub fn to_config(&self) -> Result<GiveawayConfig, ConfigError> {
        let target = match (&self.url, &self.subreddit) {
            (Some(url), None) => GiveawayTarget::Submission(url.clone()),
            (None, Some(name)) => GiveawayTarget::Subreddit(name.clone()),
            _ => {
                return Err(ConfigError::MissingField {
                    field: "url or subreddit".to_string(),
                })
            }
        };

        let keyfile = self.keyfile.clone().ok_or_else(|| ConfigError::MissingField {
            field: "keyfile".to_string(),
        })?;

        Ok(GiveawayConfig {
            min_account_age_days: self.age,
            account_age_floor_days: self.age_floor,
            poll_seconds: self.poll,
            keyword: self.keyword.clone(),
            reply_mode: self.reply_mode(),
            randomized: self.random,
            wait_minutes: self.wait,
            target,
            keyfile,
            min_link_karma: self.min_link_karma,
            min_comment_karma: self.min_comment_karma,
            flair_open: self.flair_open.clone(),
            flair_closed: self.flair_closed.clone(),
        })
    }

    /// Build the run configuration from a persisted session, keeping the
    /// flag-supplied thresholds and adjusting the wait by elapsed time.
    pub fn config_from_session(
        &self,
        session: &SessionState,
        now: DateTime<Utc>,
    ) -> GiveawayConfig {
        let wait = remaining_wait_minutes(session.wait_minutes, session.time_posted, now);

        GiveawayConfig {
            min_account_age_days: self.age,
            account_age_floor_days: self.age_floor,
            poll_seconds: self.poll,
            keyword: session.keyword.clone(),
            reply_mode: self.reply_mode(),
            randomized: self.random,
            wait_minutes: Some(wait),
            target: GiveawayTarget::Submission(session.submission_url.clone()),
            keyfile: session.keyfile_path.clone(),
            min_link_karma: self.min_link_karma,
            min_comment_karma: self.min_comment_karma,
            flair_open: self.flair_open.clone(),
            flair_closed: self.flair_closed.clone(),
        }
    }
}
