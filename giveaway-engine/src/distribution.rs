use crate::eligibility::{Decision, EligibilityFilter, RejectReason, Screening};
use crate::key_pool::KeyPool;
use crate::session::{SessionState, SessionStore};
use chrono::Utc;
use giveaway_core::templates;
use giveaway_core::{
    Comment, CoreError, GiveawayConfig, GiveawayTarget, Platform, ReplyMode, Submission,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub awarded: usize,
    pub polls: u64,
}

/// Order the candidates for one poll pass: a uniform shuffle in randomized
/// mode, ascending comment timestamps otherwise.
pub fn order_comments(comments: &mut [Comment], randomized: bool) {
    if randomized {
        fastrand::shuffle(comments);
    } else {
        comments.sort_by_key(|comment| comment.created_utc);
    }
}

/// One giveaway from start to finish: open or attach to a submission, poll
/// its comment tree, award keys to eligible commenters, then close out.
/// Holds every collaborator explicitly; nothing lives in module state.
pub struct GiveawayRun {
    config: GiveawayConfig,
    platform: Arc<dyn Platform>,
    pool: KeyPool,
    filter: EligibilityFilter,
    sessions: SessionStore,
}

impl GiveawayRun {
    pub fn new(
        config: GiveawayConfig,
        platform: Arc<dyn Platform>,
        pool: KeyPool,
        filter: EligibilityFilter,
        sessions: SessionStore,
    ) -> Self {
        Self {
            config,
            platform,
            pool,
            filter,
            sessions,
        }
    }

    pub async fn run(mut self) -> Result<RunSummary, CoreError> {
        let initial_keys = self.pool.len();
        let submission = self.open_submission().await?;
        self.save_session(&submission)?;

        if self.config.randomized {
            // All entries must be in before the draw; first-come order must
            // not matter in random mode.
            let wait = self.config.wait_minutes.unwrap_or(0).max(0);
            if wait > 0 {
                info!("Sleeping for {} minutes while users comment...", wait);
                sleep(Duration::from_secs(wait as u64 * 60)).await;
            }
        }

        let mut polls = 0u64;
        while !self.pool.is_empty() {
            polls += 1;
            info!("Checking comments...");
            let mut comments = self.platform.list_comments(&submission).await?;
            order_comments(&mut comments, self.config.randomized);

            let before = self.pool.len();
            for comment in &comments {
                if self.pool.is_empty() {
                    break;
                }
                self.consider(comment, &submission).await?;
            }

            let awarded = before - self.pool.len();
            if awarded > 0 {
                info!("Awarded {} new prizes!", awarded);
            }

            if !self.pool.is_empty() {
                debug!("Sleeping {}s before next poll", self.config.poll_seconds);
                sleep(Duration::from_secs(self.config.poll_seconds)).await;
            }
        }

        self.close_out(&submission).await;
        self.sessions.clear()?;

        Ok(RunSummary {
            awarded: initial_keys - self.pool.len(),
            polls,
        })
    }

    async fn open_submission(&mut self) -> Result<Submission, CoreError> {
        match self.config.target.clone() {
            GiveawayTarget::Submission(url) => {
                info!("Attaching to existing submission {}", url);
                self.platform.resolve_submission(&url).await
            }
            GiveawayTarget::Subreddit(name) => {
                info!("Creating submission in r/{}...", name);
                let title = templates::render(
                    templates::SUBMISSION_TITLE,
                    &[("keys", &self.pool.len().to_string())],
                )?;
                let body = self.compose_submission_body()?;

                let submission = self
                    .platform
                    .create_post(&name, &title, &body)
                    .await
                    .map_err(|e| {
                        warn!("Error with submission: {}", e);
                        e
                    })?;
                info!("Submission can be found at {}", submission.url);

                if let Some(flair) = &self.config.flair_open {
                    match self.platform.set_flair(&submission, flair).await {
                        Ok(()) => info!("Flair set to open"),
                        Err(e) => warn!("Unable to set open flair: {}", e),
                    }
                }

                Ok(submission)
            }
        }
    }

    fn compose_submission_body(&self) -> Result<String, CoreError> {
        let mut body = templates::SUBMISSION_BODY.to_string();

        if let Some(keyword) = &self.config.keyword {
            body.push_str("\n\n");
            body.push_str(&templates::render(
                templates::KEYWORD_MESSAGE,
                &[("keyword", keyword)],
            )?);
        }

        if self.config.randomized {
            let wait = self.config.wait_minutes.unwrap_or(0).max(0);
            let draw_at = (Utc::now() + chrono::Duration::minutes(wait))
                .format("%H:%M:%S UTC")
                .to_string();
            body.push_str("\n\n");
            body.push_str(&templates::render(
                templates::RANDOM_RULE,
                &[("wait", &wait.to_string()), ("utc", &draw_at)],
            )?);
        } else {
            body.push_str("\n\n");
            body.push_str(templates::TIMESTAMP_RULE);
        }

        body.push_str("\n\n");
        body.push_str(templates::WHAT_IS_THIS);
        Ok(body)
    }

    fn save_session(&self, submission: &Submission) -> Result<(), CoreError> {
        info!(
            "Saving current settings to {}",
            self.sessions.path().display()
        );
        let target = match &self.config.target {
            GiveawayTarget::Subreddit(name) => name.clone(),
            GiveawayTarget::Submission(_) => String::new(),
        };
        self.sessions.save(&SessionState {
            target,
            submission_url: submission.url.clone(),
            wait_minutes: self.config.wait_minutes.unwrap_or(0),
            time_posted: Utc::now(),
            keyword: self.config.keyword.clone(),
            keyfile_path: self.config.keyfile.clone(),
        })
    }

    async fn consider(
        &mut self,
        comment: &Comment,
        submission: &Submission,
    ) -> Result<(), CoreError> {
        let handle = match self
            .filter
            .screen(comment, self.config.keyword.as_deref())
        {
            Screening::Skip(reason) => {
                log_skip(comment, &reason);
                return Ok(());
            }
            Screening::NeedsProfile(handle) => handle,
        };

        let profile = self.platform.author_profile(&handle).await?;
        match self
            .filter
            .admit(&profile, &self.config.admission_rules(), Utc::now())
        {
            Decision::Rejected(reason) => {
                warn!("Author {} {}", handle, reason);
                Ok(())
            }
            Decision::Eligible => self.award_prize(comment, &handle, submission).await,
        }
    }

    async fn award_prize(
        &mut self,
        comment: &Comment,
        handle: &str,
        submission: &Submission,
    ) -> Result<(), CoreError> {
        let key = self.pool.award()?;
        let message = templates::render(
            templates::PRIZE_REPLY_MESSAGE,
            &[("prize", key.as_str()), ("url", submission.url.as_str())],
        )?;

        // The key is consumed as soon as the pool is updated; a failed
        // delivery is logged and never retried, so no key is ever sent twice.
        match self.config.reply_mode {
            ReplyMode::Inline => {
                if let Err(e) = self.platform.reply_to_comment(&comment.id, &message).await {
                    error!("Failed to deliver key to u/{} inline: {}", handle, e);
                }
            }
            ReplyMode::PrivateMessage => {
                if let Err(e) = self
                    .platform
                    .send_private_message(handle, templates::REPLY_TITLE, &message)
                    .await
                {
                    error!("Failed to send key to u/{} by private message: {}", handle, e);
                }
                if let Err(e) = self
                    .platform
                    .reply_to_comment(&comment.id, templates::GENERIC_REPLY_MESSAGE)
                    .await
                {
                    warn!("Failed to leave public reply for u/{}: {}", handle, e);
                }
            }
        }

        info!("Awarded a key to u/{}", handle);
        Ok(())
    }

    async fn close_out(&self, submission: &Submission) {
        match self.platform.submission_body(submission).await {
            Ok(body) => {
                let closing = if body.is_empty() {
                    templates::END_MESSAGE.to_string()
                } else {
                    format!("{}\n\n**EDIT:** {}", body, templates::END_MESSAGE)
                };
                if let Err(e) = self.platform.edit_post(submission, &closing).await {
                    warn!(
                        "Unable to edit original post to warn that the giveaway is over. \
                         Recommend manually editing the post: {}",
                        e
                    );
                }
            }
            Err(e) => warn!("Unable to fetch submission body for the closing edit: {}", e),
        }

        if let Some(flair) = &self.config.flair_closed {
            match self.platform.set_flair(submission, flair).await {
                Ok(()) => info!("Flair set to closed"),
                Err(e) => warn!("Unable to set closed flair: {}", e),
            }
        }
    }
}

fn log_skip(comment: &Comment, reason: &RejectReason) {
    let author = comment.author.as_deref().unwrap_or("[deleted]");
    match reason {
        RejectReason::Banned | RejectReason::KeywordMissing => {
            warn!("Author {} {}", author, reason);
        }
        _ => debug!("Skipping comment {} by {}: {}", comment.id, author, reason),
    }
}
