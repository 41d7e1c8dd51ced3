use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    application::models::comment::{Comment, CommentCreate},
    config::Config,
    error::AppError,
    transport::http_client::FeedHttpClient,
};

#[async_trait]
pub trait CommentService: Send + Sync {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError>;

    async fn create_comment(&self, post_id: i64, comment: &CommentCreate) -> Result<Comment, AppError>;
}

pub struct CommentServiceImpl<T: FeedHttpClient> {
    config: Arc<Config>,
    client: Arc<T>,
}

impl<T: FeedHttpClient> CommentServiceImpl<T> {
    pub fn new(config: Arc<Config>, client: Arc<T>) -> Self {
        Self { config, client }
    }

    pub fn get_config(&self) -> Arc<Config> {
        self.config.clone()
    }
}

fn comments_path(post_id: i64) -> String {
    format!("posts/{}/comments/", post_id)
}

#[async_trait]
impl<T: FeedHttpClient + 'static> CommentService for CommentServiceImpl<T> {
    #[instrument(skip(self))]
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        info!("Fetching comments");

        let result = self
            .client
            .request::<(), Vec<Comment>>(Method::GET, &comments_path(post_id), None)
            .await?;

        debug!("Comments fetched: {}", result.len());
        Ok(result)
    }

    #[instrument(skip(self, comment))]
    async fn create_comment(&self, post_id: i64, comment: &CommentCreate) -> Result<Comment, AppError> {
        info!("Creating comment");

        self.client
            .request::<CommentCreate, Comment>(Method::POST, &comments_path(post_id), Some(comment))
            .await
    }
}
