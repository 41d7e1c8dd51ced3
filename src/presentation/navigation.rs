use tokio::sync::mpsc;
use tracing::{debug, info};

/// Destinations the client core may send the UI to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
}

/// Routing collaborator. The core only ever asks for the login entry point,
/// after the session has been torn down.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Forwards navigation requests to the UI event loop.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect_to_login(&self) {
        if self.tx.send(Route::Login).is_err() {
            debug!("Login redirect dropped, no router listening");
        }
    }
}

/// Navigator for headless use (scripts, the demo); only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self) {
        info!("Session ended, login required");
    }
}
