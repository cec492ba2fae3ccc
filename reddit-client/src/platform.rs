use crate::api::RedditApiClient;
use crate::auth::{RedditAuthConfig, RedditAuthenticator, RedditToken};
use async_trait::async_trait;
use giveaway_core::{AuthorProfile, Comment, ConfigError, CoreError, Platform, Submission};
use tokio::sync::Mutex;
use url::Url;

/// `Platform` implementation backed by the Reddit API. Holds the OAuth
/// token behind a mutex and re-authenticates whenever it lapses.
pub struct RedditPlatform {
    api: RedditApiClient,
    auth: RedditAuthenticator,
    token: Mutex<Option<RedditToken>>,
}

impl RedditPlatform {
    pub fn new(auth_config: RedditAuthConfig) -> Self {
        let api = RedditApiClient::new(auth_config.user_agent.clone());
        Self {
            api,
            auth: RedditAuthenticator::new(auth_config),
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut guard = self.token.lock().await;
        match guard.as_ref() {
            Some(token) if !token.is_expired() => Ok(token.access_token.clone()),
            _ => {
                let fresh = self.auth.authenticate().await?;
                let access = fresh.access_token.clone();
                *guard = Some(fresh);
                Ok(access)
            }
        }
    }
}

/// Extract the base-36 submission id from a reddit.com or redd.it URL.
pub fn submission_id_from_url(raw: &str) -> Result<String, CoreError> {
    let invalid = || {
        CoreError::Config(ConfigError::InvalidValue {
            field: "url".to_string(),
            value: raw.to_string(),
        })
    };

    let parsed = Url::parse(raw).map_err(|_| invalid())?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|part| !part.is_empty()).collect())
        .unwrap_or_default();

    let host = parsed.host_str().unwrap_or_default();
    if host == "redd.it" || host.ends_with(".redd.it") {
        return segments
            .first()
            .map(|id| (*id).to_string())
            .ok_or_else(invalid);
    }

    segments
        .iter()
        .position(|segment| *segment == "comments")
        .and_then(|pos| segments.get(pos + 1))
        .map(|id| (*id).to_string())
        .ok_or_else(invalid)
}

#[async_trait]
impl Platform for RedditPlatform {
    async fn create_post(
        &self,
        subreddit: &str,
        title: &str,
        body: &str,
    ) -> Result<Submission, CoreError> {
        let token = self.access_token().await?;
        let submitted = self
            .api
            .submit_self_post(&token, subreddit, title, body)
            .await?;

        Ok(Submission {
            id: submitted.id,
            url: submitted.url,
            subreddit: subreddit.to_string(),
        })
    }

    async fn resolve_submission(&self, url: &str) -> Result<Submission, CoreError> {
        let id = submission_id_from_url(url)?;
        let token = self.access_token().await?;
        let post = self.api.submission_info(&token, &id).await?;

        Ok(Submission {
            id: post.id,
            url: format!("https://www.reddit.com{}", post.permalink),
            subreddit: post.subreddit,
        })
    }

    async fn submission_body(&self, submission: &Submission) -> Result<String, CoreError> {
        let token = self.access_token().await?;
        let post = self.api.submission_info(&token, &submission.id).await?;
        Ok(post.selftext)
    }

    async fn edit_post(&self, submission: &Submission, body: &str) -> Result<(), CoreError> {
        let token = self.access_token().await?;
        self.api
            .edit_user_text(&token, &submission.fullname(), body)
            .await
    }

    async fn set_flair(
        &self,
        submission: &Submission,
        flair_template_id: &str,
    ) -> Result<(), CoreError> {
        let token = self.access_token().await?;
        self.api
            .select_flair(
                &token,
                &submission.subreddit,
                &submission.fullname(),
                flair_template_id,
            )
            .await
    }

    async fn list_comments(&self, submission: &Submission) -> Result<Vec<Comment>, CoreError> {
        let token = self.access_token().await?;
        let comments = self.api.comment_tree(&token, &submission.id).await?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }

    async fn reply_to_comment(&self, comment_id: &str, text: &str) -> Result<(), CoreError> {
        let token = self.access_token().await?;
        let parent = format!("t1_{}", comment_id);
        self.api.comment_reply(&token, &parent, text).await
    }

    async fn send_private_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), CoreError> {
        let token = self.access_token().await?;
        self.api
            .compose_message(&token, recipient, subject, body)
            .await
    }

    async fn author_profile(&self, handle: &str) -> Result<AuthorProfile, CoreError> {
        let token = self.access_token().await?;
        let user = self.api.user_about(&token, handle).await?;
        Ok(user.into())
    }
}
