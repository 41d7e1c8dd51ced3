use feed_client::application::models::post::PostQuery;
use feed_client::application::services::post_service::{LikeApi, PostService, PostServiceImpl};
use feed_client::config::Config;
use feed_client::presentation::like_toggle::{LikeToggle, ReconciledState};
use feed_client::presentation::navigation::LogNavigator;
use feed_client::presentation::notification::ChannelNotifier;
use feed_client::session::auth::FeedAuth;
use feed_client::session::credential::CredentialStore;
use feed_client::storage::local::FileStorage;
use feed_client::transport::http_client::{build_http_client, SessionTransport};
use feed_client::utils::logger::setup_logger;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logger();
    let config = Arc::new(Config::new());
    info!("Config: {}", config);

    let storage = Arc::new(FileStorage::new(config.storage.path.clone()));
    let credentials = Arc::new(CredentialStore::load(storage));
    let client = build_http_client(&config)?;
    let auth = Arc::new(FeedAuth::new(client.clone(), config.clone(), credentials.clone()));
    if !credentials.is_authenticated() {
        auth.login_with_config().await?;
    }

    let transport = Arc::new(SessionTransport::new(
        client,
        config.clone(),
        credentials,
        auth,
        Arc::new(LogNavigator),
    ));
    let posts = Arc::new(PostServiceImpl::new(config.clone(), transport));

    let page = posts.list_posts(&PostQuery::default()).await?;
    info!("{} posts in the feed", page.total);
    let Some(post) = page.posts.first() else {
        warn!("Feed is empty, nothing to like");
        return Ok(());
    };
    info!("Toggling like on {}", post);

    let (notifier, mut toasts) = ChannelNotifier::channel();
    let likes: Arc<dyn LikeApi> = posts.clone();
    let toggle = LikeToggle::for_post(post, likes, Arc::new(notifier));
    match toggle.toggle().await {
        ReconciledState::Committed(state) => info!("Committed: {:?}", state),
        ReconciledState::RolledBack { snapshot, class } => {
            warn!("Rolled back to {:?} ({})", snapshot, class)
        }
        ReconciledState::Ignored(state) => info!("Ignored: {:?}", state),
    }
    while let Ok(toast) = toasts.try_recv() {
        info!("Toast: {}", toast);
    }
    Ok(())
}
