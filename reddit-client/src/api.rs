use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use giveaway_core::{AuthorProfile, Comment, CoreError, RedditApiError};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit accepts at most this many ids per morechildren call.
const MORECHILDREN_BATCH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i32,
    pub num_comments: u32,
    pub stickied: bool,
    pub locked: bool,
    pub is_self: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditUserData {
    pub id: String,
    pub name: String,
    pub created_utc: f64,
    pub link_karma: i64,
    pub comment_karma: i64,
    pub is_gold: bool,
    pub is_mod: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    pub created_utc: f64,
}

/// Response shape shared by every api_type=json endpoint. A non-empty
/// errors array means Reddit rejected the action.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiJsonEnvelope {
    pub json: ApiJsonBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiJsonBody {
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiJsonBody {
    fn into_data(self) -> Result<Option<Value>, CoreError> {
        if self.errors.is_empty() {
            Ok(self.data)
        } else {
            Err(RedditApiError::Rejected {
                details: Value::Array(self.errors).to_string(),
            }
            .into())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponseData {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth()));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            rate_limiter,
            user_agent,
        }
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
        form_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        self.rate_limiter.acquire_permit().await;
        debug!("Acquired rate limit permit for {} {}", method, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(params) = form_params {
            request_builder = request_builder.form(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded {
                    retry_after,
                }))
            }
            401 => Err(CoreError::RedditApi(RedditApiError::InvalidToken)),
            403 => Err(CoreError::RedditApi(RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            })),
            404 => Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Resource not found".to_string(),
            })),
            code if status.is_server_error() => {
                Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: code,
                }))
            }
            code => Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Unexpected status {code} for {endpoint}"),
            })),
        }
    }

    async fn post_api_json(
        &self,
        endpoint: &str,
        access_token: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<Value>, CoreError> {
        let response = self
            .make_request(Method::POST, endpoint, access_token, None, Some(form))
            .await?;

        let envelope: ApiJsonEnvelope = response.json().await.map_err(|e| {
            error!("Failed to parse response for {}: {}", endpoint, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse response for {endpoint}"),
            })
        })?;

        envelope.json.into_data()
    }

    /// Create a self post. Inbox replies are disabled at submit time so the
    /// giveaway account is not flooded by reply notifications.
    pub async fn submit_self_post(
        &self,
        access_token: &str,
        subreddit: &str,
        title: &str,
        text: &str,
    ) -> Result<SubmitResponseData, CoreError> {
        let form = [
            ("api_type", "json"),
            ("kind", "self"),
            ("sr", subreddit),
            ("title", title),
            ("text", text),
            ("sendreplies", "false"),
        ];

        let data = self
            .post_api_json("/api/submit", access_token, &form)
            .await?
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: "Submit response carried no data".to_string(),
                })
            })?;

        let submitted: SubmitResponseData = serde_json::from_value(data).map_err(|e| {
            error!("Failed to parse submit response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse submit response".to_string(),
            })
        })?;

        info!(
            "Created submission {} in r/{}: {}",
            submitted.id, subreddit, submitted.url
        );
        Ok(submitted)
    }

    pub async fn edit_user_text(
        &self,
        access_token: &str,
        thing_fullname: &str,
        text: &str,
    ) -> Result<(), CoreError> {
        let form = [
            ("api_type", "json"),
            ("thing_id", thing_fullname),
            ("text", text),
        ];
        self.post_api_json("/api/editusertext", access_token, &form)
            .await?;
        debug!("Edited {}", thing_fullname);
        Ok(())
    }

    pub async fn select_flair(
        &self,
        access_token: &str,
        subreddit: &str,
        link_fullname: &str,
        flair_template_id: &str,
    ) -> Result<(), CoreError> {
        let endpoint = format!("/r/{}/api/selectflair", subreddit);
        let form = [
            ("api_type", "json"),
            ("link", link_fullname),
            ("flair_template_id", flair_template_id),
        ];
        self.post_api_json(&endpoint, access_token, &form).await?;
        debug!("Applied flair {} to {}", flair_template_id, link_fullname);
        Ok(())
    }

    pub async fn comment_reply(
        &self,
        access_token: &str,
        parent_fullname: &str,
        text: &str,
    ) -> Result<(), CoreError> {
        let form = [
            ("api_type", "json"),
            ("thing_id", parent_fullname),
            ("text", text),
        ];
        self.post_api_json("/api/comment", access_token, &form)
            .await?;
        debug!("Replied to {}", parent_fullname);
        Ok(())
    }

    pub async fn compose_message(
        &self,
        access_token: &str,
        to: &str,
        subject: &str,
        text: &str,
    ) -> Result<(), CoreError> {
        let form = [
            ("api_type", "json"),
            ("to", to),
            ("subject", subject),
            ("text", text),
        ];
        self.post_api_json("/api/compose", access_token, &form)
            .await?;
        debug!("Sent private message to u/{}", to);
        Ok(())
    }

    pub async fn user_about(
        &self,
        access_token: &str,
        username: &str,
    ) -> Result<RedditUserData, CoreError> {
        let endpoint = format!("/user/{}/about", username);
        let response = self
            .make_request(Method::GET, &endpoint, access_token, None, None)
            .await?;

        let user: RedditListingChild<RedditUserData> = response.json().await.map_err(|e| {
            error!("Failed to parse user data for u/{}: {}", username, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse profile for u/{username}"),
            })
        })?;

        debug!("Retrieved profile for u/{}", username);
        Ok(user.data)
    }

    pub async fn submission_info(
        &self,
        access_token: &str,
        submission_id: &str,
    ) -> Result<RedditPostData, CoreError> {
        let fullname = format!("t3_{}", submission_id);
        let response = self
            .make_request(
                Method::GET,
                "/api/info",
                access_token,
                Some(&[("id", fullname.as_str()), ("raw_json", "1")]),
                None,
            )
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse submission info: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse info for submission {submission_id}"),
            })
        })?;

        listing
            .data
            .children
            .into_iter()
            .next()
            .map(|child| child.data)
            .ok_or_else(|| {
                CoreError::RedditApi(RedditApiError::SubmissionNotFound {
                    submission_id: submission_id.to_string(),
                })
            })
    }

    /// Fetch the complete comment tree for a submission, resolving "more"
    /// continuation nodes until none remain. Reddit caches this endpoint
    /// for about thirty seconds, so polling faster than that gains nothing.
    pub async fn comment_tree(
        &self,
        access_token: &str,
        submission_id: &str,
    ) -> Result<Vec<RedditCommentData>, CoreError> {
        let endpoint = format!("/comments/{}", submission_id);
        let response = self
            .make_request(
                Method::GET,
                &endpoint,
                access_token,
                Some(&[("limit", "500"), ("raw_json", "1")]),
                None,
            )
            .await?;

        let payload: Value = response.json().await.map_err(|e| {
            error!("Failed to parse comment tree: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comments for submission {submission_id}"),
            })
        })?;

        let mut comments = Vec::new();
        let mut continuations = Vec::new();
        if let Some(comment_listing) = payload.get(1) {
            collect_listing(comment_listing, &mut comments, &mut continuations);
        }

        let link_fullname = format!("t3_{}", submission_id);
        while !continuations.is_empty() {
            let batch_len = continuations.len().min(MORECHILDREN_BATCH);
            let batch: Vec<String> = continuations.drain(..batch_len).collect();
            let children = batch.join(",");

            let response = self
                .make_request(
                    Method::GET,
                    "/api/morechildren",
                    access_token,
                    Some(&[
                        ("api_type", "json"),
                        ("link_id", link_fullname.as_str()),
                        ("children", children.as_str()),
                        ("raw_json", "1"),
                    ]),
                    None,
                )
                .await?;

            let payload: Value = response.json().await.map_err(|e| {
                error!("Failed to parse morechildren response: {}", e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: "Failed to parse morechildren response".to_string(),
                })
            })?;

            if let Some(things) = payload
                .pointer("/json/data/things")
                .and_then(Value::as_array)
            {
                for thing in things {
                    collect_thing(thing, &mut comments, &mut continuations);
                }
            }
        }

        info!(
            "Retrieved {} comments for submission {}",
            comments.len(),
            submission_id
        );
        Ok(comments)
    }
}

fn collect_listing(listing: &Value, out: &mut Vec<RedditCommentData>, more: &mut Vec<String>) {
    let Some(children) = listing.pointer("/data/children").and_then(Value::as_array) else {
        return;
    };
    for child in children {
        collect_thing(child, out, more);
    }
}

fn collect_thing(thing: &Value, out: &mut Vec<RedditCommentData>, more: &mut Vec<String>) {
    match thing.get("kind").and_then(Value::as_str) {
        Some("t1") => {
            let Some(data) = thing.get("data") else { return };

            // Nested replies arrive as a listing; an empty string means none.
            if let Some(replies) = data.get("replies") {
                if replies.is_object() {
                    collect_listing(replies, out, more);
                }
            }

            match serde_json::from_value::<RedditCommentData>(data.clone()) {
                Ok(comment) => out.push(comment),
                Err(e) => debug!("Skipping malformed comment node: {}", e),
            }
        }
        Some("more") => {
            if let Some(ids) = thing.pointer("/data/children").and_then(Value::as_array) {
                more.extend(ids.iter().filter_map(Value::as_str).map(String::from));
            }
        }
        _ => {}
    }
}

impl From<RedditCommentData> for Comment {
    fn from(data: RedditCommentData) -> Self {
        // Reddit reports deleted accounts as the literal "[deleted]".
        let author = data.author.filter(|name| name != "[deleted]");
        Self {
            id: data.id,
            author,
            body: data.body,
            created_utc: data.created_utc as i64,
        }
    }
}

impl From<RedditUserData> for AuthorProfile {
    fn from(data: RedditUserData) -> Self {
        Self {
            name: data.name,
            created_utc: data.created_utc as i64,
            link_karma: data.link_karma,
            comment_karma: data.comment_karma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_client_creation() {
        let client = RedditApiClient::new("test-user-agent/1.0".to_string());
        assert_eq!(client.user_agent, "test-user-agent/1.0");
    }

    #[test]
    fn test_collect_nested_tree() {
        let listing = json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t1",
                        "data": {
                            "id": "c1",
                            "author": "alpha",
                            "body": "first",
                            "created_utc": 100.0,
                            "replies": {
                                "kind": "Listing",
                                "data": {
                                    "children": [
                                        {
                                            "kind": "t1",
                                            "data": {
                                                "id": "c2",
                                                "author": "beta",
                                                "body": "nested",
                                                "created_utc": 200.0,
                                                "replies": ""
                                            }
                                        }
                                    ]
                                }
                            }
                        }
                    },
                    {
                        "kind": "more",
                        "data": { "children": ["c3", "c4"] }
                    }
                ]
            }
        });

        let mut comments = Vec::new();
        let mut more = Vec::new();
        collect_listing(&listing, &mut comments, &mut more);

        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(more, vec!["c3".to_string(), "c4".to_string()]);
    }

    #[test]
    fn test_deleted_author_maps_to_none() {
        let deleted = RedditCommentData {
            id: "c9".to_string(),
            author: Some("[deleted]".to_string()),
            body: "gone".to_string(),
            created_utc: 42.0,
        };
        let comment: Comment = deleted.into();
        assert_eq!(comment.author, None);

        let live = RedditCommentData {
            id: "c10".to_string(),
            author: Some("gamma".to_string()),
            body: "here".to_string(),
            created_utc: 43.0,
        };
        let comment: Comment = live.into();
        assert_eq!(comment.author.as_deref(), Some("gamma"));
    }

    #[test]
    fn test_user_data_conversion() {
        let user = RedditUserData {
            id: "u1".to_string(),
            name: "gamma".to_string(),
            created_utc: 1_640_995_200.0,
            link_karma: 15,
            comment_karma: 30,
            is_gold: false,
            is_mod: false,
            verified: true,
        };

        let profile: AuthorProfile = user.into();
        assert_eq!(profile.name, "gamma");
        assert_eq!(profile.created_utc, 1_640_995_200);
        assert_eq!(profile.link_karma, 15);
        assert_eq!(profile.comment_karma, 30);
    }

    #[test]
    fn test_api_json_envelope_errors() {
        let envelope: ApiJsonEnvelope = serde_json::from_value(json!({
            "json": {
                "errors": [["SUBREDDIT_NOEXIST", "that subreddit doesn't exist", "sr"]],
                "data": null
            }
        }))
        .unwrap();

        assert!(matches!(
            envelope.json.into_data(),
            Err(CoreError::RedditApi(RedditApiError::Rejected { .. }))
        ));
    }

    #[test]
    fn test_submit_response_parsing() {
        let envelope: ApiJsonEnvelope = serde_json::from_value(json!({
            "json": {
                "errors": [],
                "data": {
                    "id": "abc123",
                    "name": "t3_abc123",
                    "url": "https://www.reddit.com/r/tinkertown/comments/abc123/giveaway/"
                }
            }
        }))
        .unwrap();

        let data = envelope.json.into_data().unwrap().unwrap();
        let submitted: SubmitResponseData = serde_json::from_value(data).unwrap();
        assert_eq!(submitted.id, "abc123");
        assert_eq!(submitted.name, "t3_abc123");
    }
}
