pub mod api;
pub mod collector;
pub mod rate_limiter;
pub mod retry;


pub use api::{CommentNode, RedditApiClient, RedditListing, RedditMoreData, RedditPostData};
pub use collector::{Collector, RedditApi};
pub use rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
pub use retry::{RetryConfig, RetryExecutor, RetryMetrics};

use leanscope_core::{CoreError, RedditApiError, RedditCredentials};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError,
    ResourceOwnerPassword, ResourceOwnerUsername, Scope, TokenResponse, TokenUrl,
};
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are refreshed this long before Reddit would reject them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scopes: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|granted| granted == scope || granted == "*")
    }
}

/// Authenticated, paced access to the read-only Reddit endpoints.
pub struct RedditClient {
    credentials: RedditCredentials,
    oauth_client: BasicClient,
    api: RedditApiClient,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| CoreError::Internal {
            message: format!("Invalid auth URL: {}", e),
        })?;
        let token_url =
            TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| CoreError::Internal {
                message: format!("Invalid token URL: {}", e),
            })?;

        let oauth_client = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        );
        let api = RedditApiClient::new(credentials.user_agent.clone())?;

        Ok(Self {
            credentials,
            oauth_client,
            api,
            token: Mutex::new(None),
        })
    }

    pub fn get_required_scopes() -> Vec<&'static str> {
        vec!["read"]
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }

    /// Exchanges the account credentials for a fresh access token.
    pub async fn authenticate(&self) -> Result<RedditToken, CoreError> {
        info!(
            "Authenticating with Reddit as {}",
            self.credentials.username
        );

        let http_client = self.api.http_client().clone();
        let username = ResourceOwnerUsername::new(self.credentials.username.clone());
        let password = ResourceOwnerPassword::new(self.credentials.password.clone());
        let mut request = self.oauth_client.exchange_password(&username, &password);
        for scope in Self::get_required_scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let response = request
            .request_async(|req| token_http_client(http_client, req))
            .await
            .map_err(|e| {
                let reason = match e {
                    RequestTokenError::ServerResponse(response) => response.to_string(),
                    RequestTokenError::Request(err) => format!("token request failed: {}", err),
                    RequestTokenError::Parse(err, _) => {
                        format!("unexpected token response: {}", err)
                    }
                    RequestTokenError::Other(message) => message,
                };
                CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
            })?;

        let lifetime = response
            .expires_in()
            .unwrap_or(Duration::from_secs(3600));
        let scopes = response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
            .unwrap_or_else(|| vec!["read".to_string()]);

        let token = RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
            scopes,
        };
        for scope in Self::get_required_scopes() {
            if !token.has_scope(scope) {
                warn!("Token was granted without the '{}' scope", scope);
            }
        }

        debug!("Access token valid for {:?}", lifetime);
        Ok(token)
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut guard = self.token.lock().await;
        match guard.as_ref() {
            Some(token) if !token.is_expired() => Ok(token.access_token.clone()),
            _ => {
                let token = self.authenticate().await?;
                let access_token = token.access_token.clone();
                *guard = Some(token);
                Ok(access_token)
            }
        }
    }

    /// Runs `call` with a valid token, re-authenticating once if Reddit
    /// rejects the cached one.
    async fn with_token<F, Fut, T>(&self, call: F) -> Result<T, CoreError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let token = self.access_token().await?;
        match call(token).await {
            Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                warn!("Access token rejected, re-authenticating");
                *self.token.lock().await = None;
                let token = self.access_token().await?;
                call(token).await
            }
            other => other,
        }
    }
}

impl RedditApi for RedditClient {
    async fn new_posts(
        &self,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let api = &self.api;
        self.with_token(move |token| async move {
            api.get_new_posts(&token, subreddit, limit, after).await
        })
        .await
    }

    async fn comment_tree(&self, post_id: &str) -> Result<Vec<CommentNode>, CoreError> {
        let api = &self.api;
        self.with_token(move |token| async move {
            api.get_comment_tree(&token, post_id, None).await
        })
        .await
    }

    async fn continue_thread(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Vec<CommentNode>, CoreError> {
        let api = &self.api;
        self.with_token(move |token| async move {
            api.get_comment_tree(&token, post_id, Some(comment_id))
                .await
        })
        .await
    }

    async fn more_children(
        &self,
        post_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentNode>, CoreError> {
        let api = &self.api;
        self.with_token(move |token| async move {
            api.get_more_children(&token, post_id, children).await
        })
        .await
    }
}

/// Sends the token request through the shared client so it carries the
/// configured User-Agent.
async fn token_http_client(
    client: reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
