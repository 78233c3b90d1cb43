use crate::api::{CommentNode, RedditListing, RedditMoreData, RedditPostData, MAX_MORE_CHILDREN, MAX_PAGE_SIZE};
use crate::retry::{RetryConfig, RetryExecutor, RetryMetrics};
use leanscope_core::{Comment, CoreError, ErrorRecovery, Post, RecoveryStrategy, RedditApiError};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// The Reddit calls the collector needs. Implemented by `RedditClient` and
/// by in-memory fakes in tests.
pub trait RedditApi {
    async fn new_posts(
        &self,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError>;

    async fn comment_tree(&self, post_id: &str) -> Result<Vec<CommentNode>, CoreError>;

    async fn continue_thread(
        &self,
        post_id: &str,
        comment_id: &str,
    ) -> Result<Vec<CommentNode>, CoreError>;

    async fn more_children(
        &self,
        post_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentNode>, CoreError>;
}

/// Fetches posts and their complete comment lists for one community.
pub struct Collector<A: RedditApi> {
    api: A,
    retry: RetryExecutor,
}

impl<A: RedditApi> Collector<A> {
    pub fn new(api: A, retry: RetryConfig) -> Self {
        Self {
            api,
            retry: RetryExecutor::new(retry),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn retry_metrics(&self) -> RetryMetrics {
        self.retry.get_metrics()
    }

    /// Returns up to `num_posts` of the newest posts of `subreddit`, each
    /// with its comments in thread order.
    pub async fn scrape_subreddit(
        &self,
        subreddit: &str,
        num_posts: usize,
    ) -> Result<Vec<Post>, CoreError> {
        let mut posts: Vec<Post> = Vec::new();
        let mut after: Option<String> = None;

        while posts.len() < num_posts {
            let page_size = (num_posts - posts.len()).min(MAX_PAGE_SIZE as usize) as u32;
            let operation = format!("listing r/{}", subreddit);
            let listing = self
                .retry
                .execute(&operation, || {
                    self.api.new_posts(subreddit, page_size, after.as_deref())
                })
                .await?;

            let page = listing.data.children;
            if page.is_empty() {
                break;
            }

            for child in page {
                if posts.len() >= num_posts {
                    break;
                }
                let post_data = child.data;
                let comments = self
                    .collect_comments(&post_data.id, posts.len(), num_posts)
                    .await?;
                debug!(
                    "Post {} has {} comments",
                    post_data.id,
                    comments.len()
                );
                posts.push(Post {
                    id: post_data.id,
                    title: post_data.title,
                    score: post_data.score,
                    comments,
                });
            }

            info!("r/{}: posts scraped: {} out of {}", subreddit, posts.len(), num_posts);

            match listing.data.after {
                Some(next) => after = Some(next),
                None => break,
            }
        }

        Ok(posts)
    }

    async fn collect_comments(
        &self,
        post_id: &str,
        scraped: usize,
        target: usize,
    ) -> Result<Vec<Comment>, CoreError> {
        let operation = format!(
            "comments for post {} (posts scraped: {} out of {})",
            post_id, scraped, target
        );

        let nodes = match self
            .retry
            .execute(&operation, || self.api.comment_tree(post_id))
            .await
        {
            Ok(nodes) => nodes,
            Err(error) => match ErrorRecovery::determine_strategy(&error, self.retry.config().delay) {
                RecoveryStrategy::Skip | RecoveryStrategy::AbandonStep => {
                    warn!("Skipping comments of post {}: {}", post_id, error);
                    return Ok(Vec::new());
                }
                _ => return Err(error),
            },
        };

        let mut comments = Vec::new();
        let mut pending = VecDeque::new();
        let mut requested = HashSet::new();
        absorb(nodes, &mut comments, &mut pending);

        while let Some(more) = pending.pop_front() {
            match self.expand(post_id, &more, &mut requested).await {
                Ok(nodes) => absorb(nodes, &mut comments, &mut pending),
                Err(error) => {
                    match ErrorRecovery::determine_strategy(&error, self.retry.config().delay) {
                        RecoveryStrategy::AbandonStep | RecoveryStrategy::Skip => {
                            warn!(
                                "Stopped expanding post {} due to {}, keeping {} comments (posts scraped: {} out of {})",
                                post_id,
                                error,
                                comments.len(),
                                scraped,
                                target
                            );
                            break;
                        }
                        _ => return Err(error),
                    }
                }
            }
        }

        Ok(comments)
    }

    /// Replaces one "load more comments" stub with the comments behind it.
    async fn expand(
        &self,
        post_id: &str,
        more: &RedditMoreData,
        requested: &mut HashSet<String>,
    ) -> Result<Vec<CommentNode>, CoreError> {
        let duplicate = || {
            CoreError::RedditApi(RedditApiError::DuplicateExpansion {
                post_id: post_id.to_string(),
            })
        };

        if more.children.is_empty() {
            let Some(parent) = more.parent_id.strip_prefix("t1_") else {
                return Ok(Vec::new());
            };
            if !requested.insert(format!("thread:{}", parent)) {
                return Err(duplicate());
            }
            let operation = format!("thread {} of post {}", parent, post_id);
            return self
                .retry
                .execute(&operation, || self.api.continue_thread(post_id, parent))
                .await;
        }

        if more.children.iter().any(|child| requested.contains(child)) {
            return Err(duplicate());
        }
        requested.extend(more.children.iter().cloned());

        let mut nodes = Vec::new();
        for chunk in more.children.chunks(MAX_MORE_CHILDREN) {
            let operation = format!("{} more comments of post {}", chunk.len(), post_id);
            let expanded = self
                .retry
                .execute(&operation, || self.api.more_children(post_id, chunk))
                .await?;
            nodes.extend(expanded);
        }
        Ok(nodes)
    }
}

/// Keeps comments that carry text and queues stubs for expansion.
fn absorb(nodes: Vec<CommentNode>, comments: &mut Vec<Comment>, pending: &mut VecDeque<RedditMoreData>) {
    for node in nodes {
        match node {
            CommentNode::Comment {
                body: Some(body),
                score,
                ..
            } => comments.push(Comment::new(&body, score)),
            CommentNode::Comment { body: None, .. } => {}
            CommentNode::More(more) => pending.push_back(more),
        }
    }
}
