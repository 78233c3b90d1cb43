use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use leanscope_core::{CoreError, RedditApiError};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page size the listing endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Largest number of ids `/api/morechildren` accepts in one call.
pub const MAX_MORE_CHILDREN: usize = 100;

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
    pub dist: Option<u32>,
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
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    /// Absent on stubs and some removed entries.
    pub body: Option<String>,
    #[serde(default)]
    pub score: i64,
    /// Either an empty string or a nested listing.
    #[serde(default)]
    pub replies: Value,
}

/// A "load more comments" stub. Empty `children` means "continue this thread".
#[derive(Debug, Clone, Deserialize)]
pub struct RedditMoreData {
    pub id: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub children: Vec<String>,
    pub parent_id: String,
}

/// One entry of a flattened comment tree, in thread order.
#[derive(Debug, Clone)]
pub enum CommentNode {
    Comment {
        id: String,
        body: Option<String>,
        score: i64,
    },
    More(RedditMoreData),
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<Value>,
    data: Option<MoreChildrenData>,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<RedditListingChild<Value>>,
}

/// Decodes a `/comments/{id}` body: `[post listing, comment listing]`.
/// An undecodable body is an invalid response for that post only.
pub fn parse_comment_tree(
    body: &[u8],
    post_id: &str,
    focus_comment: Option<&str>,
) -> Result<Vec<CommentNode>, CoreError> {
    let invalid = |details: String| CoreError::from(RedditApiError::InvalidResponse { details });

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        error!("Failed to parse comment tree of {}: {}", post_id, e);
        invalid(format!("Failed to parse comments for post {}", post_id))
    })?;
    let comments = value
        .get(1)
        .ok_or_else(|| invalid(format!("No comment listing for post {}", post_id)))?;

    let mut nodes = flatten_comment_listing(comments);
    if let Some(comment_id) = focus_comment {
        nodes.retain(|node| !matches!(node, CommentNode::Comment { id, .. } if id == comment_id));
    }
    Ok(nodes)
}

/// Flattens a comment listing depth-first. Entries that do not deserialize
/// (deleted shells, unknown kinds) are dropped.
pub fn flatten_comment_listing(listing: &Value) -> Vec<CommentNode> {
    let mut nodes = Vec::new();
    if let Some(children) = listing.pointer("/data/children").and_then(Value::as_array) {
        for child in children {
            flatten_thing(child, &mut nodes);
        }
    }
    nodes
}

fn flatten_thing(thing: &Value, nodes: &mut Vec<CommentNode>) {
    let Some(data) = thing.get("data") else {
        return;
    };
    match thing.get("kind").and_then(Value::as_str) {
        Some("t1") => {
            let Ok(comment) = serde_json::from_value::<RedditCommentData>(data.clone()) else {
                debug!("Skipping malformed comment entry");
                return;
            };
            nodes.push(CommentNode::Comment {
                id: comment.id,
                body: comment.body,
                score: comment.score,
            });
            if comment.replies.is_object() {
                nodes.extend(flatten_comment_listing(&comment.replies));
            }
        }
        Some("more") => {
            if let Ok(more) = serde_json::from_value::<RedditMoreData>(data.clone()) {
                nodes.push(CommentNode::More(more));
            }
        }
        _ => {}
    }
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
            user_agent,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);

        let waited = self.rate_limiter.pace().await;
        if !waited.is_zero() {
            debug!("Paced {} {} by {:?}", method, endpoint, waited);
        }

        let request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(&[("raw_json", "1")])
            .query(query_params);

        debug!("Making Reddit API request: {} {}", method, endpoint);
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
            return Ok(response);
        }

        warn!("Request failed with status: {} for {}", status, endpoint);
        let error: CoreError = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(60);
                RedditApiError::RateLimitExceeded { retry_after }.into()
            }
            401 => RedditApiError::InvalidToken.into(),
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            }
            .into(),
            404 => CoreError::NotFound {
                resource: endpoint.to_string(),
            },
            code if status.is_server_error() => {
                RedditApiError::ServerError { status_code: code }.into()
            }
            code => RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", code, endpoint),
            }
            .into(),
        };
        Err(error)
    }

    /// One page of `/r/{subreddit}/new`, newest first.
    pub async fn get_new_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/new", subreddit);
        let limit_str = limit.min(MAX_PAGE_SIZE).to_string();
        let mut params = vec![("limit", limit_str.as_str())];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &params)
            .await
            .map_err(|e| match e {
                CoreError::NotFound { .. } => RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                }
                .into(),
                other => other,
            })?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// The full comment tree Reddit returns for a post in one call. When
    /// `focus_comment` is set only that comment's thread is returned, minus
    /// the focus comment itself.
    pub async fn get_comment_tree(
        &self,
        access_token: &str,
        post_id: &str,
        focus_comment: Option<&str>,
    ) -> Result<Vec<CommentNode>, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let mut params = vec![("limit", "500"), ("sort", "confidence")];
        if let Some(comment_id) = focus_comment {
            params.push(("comment", comment_id));
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &params)
            .await?;

        let body = response.bytes().await?;
        let nodes = parse_comment_tree(&body, post_id, focus_comment)?;
        debug!("Retrieved {} comment nodes for post {}", nodes.len(), post_id);
        Ok(nodes)
    }

    /// Expands up to `MAX_MORE_CHILDREN` ids of a "load more comments" stub.
    pub async fn get_more_children(
        &self,
        access_token: &str,
        post_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentNode>, CoreError> {
        let link_id = format!("t3_{}", post_id);
        let joined = children.join(",");
        let params = [
            ("api_type", "json"),
            ("link_id", link_id.as_str()),
            ("children", joined.as_str()),
        ];

        let response = self
            .make_request(Method::GET, "/api/morechildren", access_token, &params)
            .await?;

        let parsed: MoreChildrenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse morechildren response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse more comments for post {}", post_id),
            })
        })?;

        if !parsed.json.errors.is_empty() {
            return Err(RedditApiError::InvalidResponse {
                details: format!("morechildren errors: {:?}", parsed.json.errors),
            }
            .into());
        }

        let mut nodes = Vec::new();
        for thing in parsed.json.data.map(|d| d.things).unwrap_or_default() {
            let value = serde_json::json!({ "kind": thing.kind, "data": thing.data });
            flatten_thing(&value, &mut nodes);
        }
        Ok(nodes)
    }

    pub async fn get_rate_limit_status(&self) -> crate::rate_limiter::RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }
}
