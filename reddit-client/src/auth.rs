use giveaway_core::{ConfigError, CoreError, RedditApiError};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, ResourceOwnerPassword, ResourceOwnerUsername, Scope,
    TokenResponse, TokenUrl,
};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const REQUIRED_SCOPES: &[&str] = &[
    "identity",
    "read",
    "submit",
    "edit",
    "flair",
    "privatemessages",
];

/// Script-app credentials, read from the environment so they never appear
/// on the command line.
#[derive(Debug, Clone)]
pub struct RedditAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditAuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: require_env("REDDIT_CLIENT_ID")?,
            client_secret: require_env("REDDIT_CLIENT_SECRET")?,
            username: require_env("REDDIT_USERNAME")?,
            password: require_env("REDDIT_PASSWORD")?,
            user_agent: std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "giveawaybot/0.1 (script app)".to_string()),
        })
    }
}

fn require_env(var_name: &str) -> Result<String, ConfigError> {
    std::env::var(var_name).map_err(|_| ConfigError::MissingEnvironmentVariable {
        var_name: var_name.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Performs the resource-owner password grant Reddit offers to script apps.
pub struct RedditAuthenticator {
    config: RedditAuthConfig,
    oauth: BasicClient,
}

impl RedditAuthenticator {
    pub fn new(config: RedditAuthConfig) -> Self {
        let oauth = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(REDDIT_AUTH_URL.to_string()).expect("valid Reddit auth URL"),
            Some(TokenUrl::new(REDDIT_TOKEN_URL.to_string()).expect("valid Reddit token URL")),
        );

        Self { config, oauth }
    }

    pub fn username(&self) -> &str {
        &self.config.username
    }

    pub async fn authenticate(&self) -> Result<RedditToken, CoreError> {
        info!("Logging in as u/{}...", self.config.username);

        let username = ResourceOwnerUsername::new(self.config.username.clone());
        let password = ResourceOwnerPassword::new(self.config.password.clone());
        let mut request = self.oauth.exchange_password(&username, &password);
        for scope in REQUIRED_SCOPES {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let token = request.request_async(async_http_client).await.map_err(|e| {
            RedditApiError::AuthenticationFailed {
                reason: e.to_string(),
            }
        })?;

        let expires_in = token.expires_in().unwrap_or(Duration::from_secs(3600));
        debug!("Token obtained, expires in {}s", expires_in.as_secs());

        Ok(RedditToken {
            access_token: token.access_token().secret().clone(),
            expires_at: SystemTime::now() + expires_in,
        })
    }
}
