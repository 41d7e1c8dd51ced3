use async_trait::async_trait;
use reqwest::Method;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    application::models::user::{User, UserUpdate},
    config::Config,
    constants::CURRENT_USER_PATH,
    error::AppError,
    transport::http_client::FeedHttpClient,
};

/// The logged-in user's own profile.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn current_user(&self) -> Result<User, AppError>;

    async fn update_me(&self, update: &UserUpdate) -> Result<User, AppError>;
}

pub struct UserServiceImpl<T: FeedHttpClient> {
    config: Arc<Config>,
    client: Arc<T>,
}

impl<T: FeedHttpClient> UserServiceImpl<T> {
    pub fn new(config: Arc<Config>, client: Arc<T>) -> Self {
        Self { config, client }
    }

    pub fn get_config(&self) -> Arc<Config> {
        self.config.clone()
    }
}

#[async_trait]
impl<T: FeedHttpClient + 'static> UserService for UserServiceImpl<T> {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User, AppError> {
        info!("Fetching current user");
        self.client
            .request::<(), User>(Method::GET, CURRENT_USER_PATH, None)
            .await
    }

    #[instrument(skip(self, update))]
    async fn update_me(&self, update: &UserUpdate) -> Result<User, AppError> {
        info!("Updating current user");
        self.client
            .request::<UserUpdate, User>(Method::PATCH, CURRENT_USER_PATH, Some(update))
            .await
    }
}
