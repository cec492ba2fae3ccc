use crate::error::CoreError;
use crate::types::{AuthorProfile, Comment, Submission};
use async_trait::async_trait;

/// The narrow capability interface the giveaway loop needs from the
/// platform. Everything behind it (authentication, HTTP, rate limiting,
/// comment pagination) is the client's concern.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Create a text submission and return a reference to it.
    async fn create_post(
        &self,
        subreddit: &str,
        title: &str,
        body: &str,
    ) -> Result<Submission, CoreError>;

    /// Resolve an existing submission from its URL.
    async fn resolve_submission(&self, url: &str) -> Result<Submission, CoreError>;

    /// Fetch the current self-text of a submission.
    async fn submission_body(&self, submission: &Submission) -> Result<String, CoreError>;

    /// Replace the self-text of a submission.
    async fn edit_post(&self, submission: &Submission, body: &str) -> Result<(), CoreError>;

    /// Apply a flair template to a submission.
    async fn set_flair(
        &self,
        submission: &Submission,
        flair_template_id: &str,
    ) -> Result<(), CoreError>;

    /// Fetch the full comment tree as a flat list, with continuation nodes
    /// resolved.
    async fn list_comments(&self, submission: &Submission) -> Result<Vec<Comment>, CoreError>;

    /// Reply to a comment by id.
    async fn reply_to_comment(&self, comment_id: &str, text: &str) -> Result<(), CoreError>;

    /// Send a private message to a user.
    async fn send_private_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), CoreError>;

    /// Fetch account creation time and karma for a commenter.
    async fn author_profile(&self, handle: &str) -> Result<AuthorProfile, CoreError>;
}
