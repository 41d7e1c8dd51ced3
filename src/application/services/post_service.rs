use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    application::models::{
        like::{LikeResponse, LikeStatus},
        post::{PaginatedPosts, Post, PostCreate, PostQuery, PostUpdate, PostWithDetails},
    },
    config::Config,
    error::AppError,
    transport::http_client::FeedHttpClient,
};

/// Feed posts: listing, detail, authoring.
#[async_trait]
pub trait PostService: Send + Sync {
    /// One page of the feed, newest first
    async fn list_posts(&self, query: &PostQuery) -> Result<PaginatedPosts, AppError>;

    /// A post with its author and comments
    async fn get_post(&self, post_id: i64) -> Result<PostWithDetails, AppError>;

    async fn create_post(&self, post: &PostCreate) -> Result<Post, AppError>;

    async fn update_post(&self, post_id: i64, update: &PostUpdate) -> Result<Post, AppError>;

    async fn delete_post(&self, post_id: i64) -> Result<(), AppError>;
}

/// The like endpoint, split out so toggle controllers depend on nothing else.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeApi: Send + Sync {
    /// Flips the current user's like on `post_id` and returns the server's
    /// resulting state.
    async fn toggle_like(&self, post_id: i64) -> Result<LikeStatus, AppError>;
}

pub struct PostServiceImpl<T: FeedHttpClient> {
    config: Arc<Config>,
    client: Arc<T>,
}

impl<T: FeedHttpClient> PostServiceImpl<T> {
    pub fn new(config: Arc<Config>, client: Arc<T>) -> Self {
        Self { config, client }
    }

    pub fn get_config(&self) -> Arc<Config> {
        self.config.clone()
    }
}

#[async_trait]
impl<T: FeedHttpClient + 'static> PostService for PostServiceImpl<T> {
    #[instrument(skip(self))]
    async fn list_posts(&self, query: &PostQuery) -> Result<PaginatedPosts, AppError> {
        info!("Fetching posts");

        let result = self
            .client
            .request::<(), PaginatedPosts>(Method::GET, &query.to_path(), None)
            .await?;

        debug!("Posts fetched: {} of {}", result.posts.len(), result.total);
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_post(&self, post_id: i64) -> Result<PostWithDetails, AppError> {
        let path = format!("posts/{}", post_id);
        info!("Fetching post");

        let result = self
            .client
            .request::<(), PostWithDetails>(Method::GET, &path, None)
            .await?;

        debug!("Post fetched with {} comments", result.comments.len());
        Ok(result)
    }

    #[instrument(skip(self, post), fields(title = %post.title))]
    async fn create_post(&self, post: &PostCreate) -> Result<Post, AppError> {
        info!("Creating post");

        let result = self
            .client
            .request::<PostCreate, Post>(Method::POST, "posts/", Some(post))
            .await?;

        debug!("Post created: {}", result.id);
        Ok(result)
    }

    #[instrument(skip(self, update))]
    async fn update_post(&self, post_id: i64, update: &PostUpdate) -> Result<Post, AppError> {
        let path = format!("posts/{}", post_id);
        info!("Updating post");

        self.client
            .request::<PostUpdate, Post>(Method::PATCH, &path, Some(update))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, post_id: i64) -> Result<(), AppError> {
        let path = format!("posts/{}", post_id);
        info!("Deleting post");

        self.client
            .request::<(), ()>(Method::DELETE, &path, None)
            .await
    }
}

#[async_trait]
impl<T: FeedHttpClient + 'static> LikeApi for PostServiceImpl<T> {
    #[instrument(skip(self))]
    async fn toggle_like(&self, post_id: i64) -> Result<LikeStatus, AppError> {
        let path = format!("posts/{}/like", post_id);

        let result = self
            .client
            .request::<(), LikeResponse>(Method::POST, &path, None)
            .await?;

        debug!("Like toggled: {}", result.status);
        Ok(result.status)
    }
}
