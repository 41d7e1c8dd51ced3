/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Optimistic like/unlike for one rendered post.
//!
//! The visible state flips as soon as the user acts and is reconciled once
//! the server answers: committed to the server's state on success, restored
//! verbatim from the pre-flip snapshot on any failure.

use crate::application::models::like::LikeStatus;
use crate::application::models::post::Post;
use crate::application::services::post_service::LikeApi;
use crate::presentation::notification::{Notification, Notifier};
use crate::transport::model::OutcomeClass;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, instrument};

pub const LIKED_MESSAGE: &str = "Post liked";
pub const POLICY_REJECTED_MESSAGE: &str = "Cannot like post";
pub const UNAUTHENTICATED_MESSAGE: &str = "Please log in to like posts";
pub const TRANSIENT_FAILURE_MESSAGE: &str = "Failed to update like, please try again";

/// What the surface shows: whether the user likes the post and how many do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleSnapshot {
    pub liked: bool,
    pub count: u64,
}

impl ToggleSnapshot {
    pub fn new(liked: bool, count: u64) -> Self {
        Self { liked, count }
    }

    /// The optimistic guess. Unliking never takes the count below zero.
    pub fn flipped(self) -> Self {
        if self.liked {
            Self::new(false, self.count.saturating_sub(1))
        } else {
            Self::new(true, self.count.saturating_add(1))
        }
    }

    /// Final state once the server has answered with `status`, starting from
    /// the pre-flip snapshot `self`.
    pub fn committed(self, status: LikeStatus) -> Self {
        let count = match (self.liked, status.is_liked()) {
            (false, true) => self.count.saturating_add(1),
            (true, false) => self.count.saturating_sub(1),
            _ => self.count,
        };
        Self::new(status.is_liked(), count)
    }
}

/// How a call to [`LikeToggle::toggle`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciledState {
    /// The server accepted; the visible state is the server's.
    Committed(ToggleSnapshot),
    /// The call failed; the pre-flip snapshot was restored.
    RolledBack {
        snapshot: ToggleSnapshot,
        class: OutcomeClass,
    },
    /// Another toggle was in flight; nothing was sent.
    Ignored(ToggleSnapshot),
}

impl ReconciledState {
    pub fn snapshot(&self) -> ToggleSnapshot {
        match *self {
            ReconciledState::Committed(snapshot)
            | ReconciledState::RolledBack { snapshot, .. }
            | ReconciledState::Ignored(snapshot) => snapshot,
        }
    }
}

/// Like affordance controller, one per rendered post.
///
/// Controllers for the same post on different surfaces do not share state.
pub struct LikeToggle {
    post_id: i64,
    likes: Arc<dyn LikeApi>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ToggleSnapshot>,
    in_flight: AtomicBool,
}

/// Holds the in-flight flag for one toggle. Restores `snapshot` if dropped
/// before the toggle settles.
struct Pending<'a> {
    toggle: &'a LikeToggle,
    snapshot: ToggleSnapshot,
    settled: bool,
}

impl Pending<'_> {
    fn settle(mut self, state: ToggleSnapshot) {
        self.toggle.state.send_replace(state);
        self.settled = true;
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(post_id = self.toggle.post_id, "Toggle abandoned, restoring snapshot");
            self.toggle.state.send_replace(self.snapshot);
        }
        self.toggle.in_flight.store(false, Ordering::Release);
    }
}

impl LikeToggle {
    pub fn new(
        post_id: i64,
        initial: ToggleSnapshot,
        likes: Arc<dyn LikeApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            post_id,
            likes,
            notifier,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Seeds the controller from a fetched post.
    pub fn for_post(post: &Post, likes: Arc<dyn LikeApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(
            post.id,
            ToggleSnapshot::new(post.user_has_liked, post.likes_count),
            likes,
            notifier,
        )
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    /// Receiver for the visible state. Dropping it is fine at any time,
    /// including while a toggle is in flight.
    pub fn subscribe(&self) -> watch::Receiver<ToggleSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ToggleSnapshot {
        *self.state.borrow()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Flips the like, calls the server, and reconciles.
    ///
    /// Returns [`ReconciledState::Ignored`] without a network call while a
    /// previous toggle on this controller is still in flight.
    #[instrument(skip(self), fields(post_id = self.post_id))]
    pub async fn toggle(&self) -> ReconciledState {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Toggle already in flight, ignoring");
            return ReconciledState::Ignored(self.snapshot());
        }

        let snapshot = self.snapshot();
        let pending = Pending {
            toggle: self,
            snapshot,
            settled: false,
        };
        self.state.send_replace(snapshot.flipped());

        let result = self.likes.toggle_like(self.post_id).await;

        match result {
            Ok(status) => {
                let committed = snapshot.committed(status);
                pending.settle(committed);
                if status.is_liked() && !snapshot.liked {
                    self.notifier.notify(Notification::success(LIKED_MESSAGE));
                }
                debug!("Like committed: {}", status);
                ReconciledState::Committed(committed)
            }
            Err(e) => {
                pending.settle(snapshot);
                let class = e.class();
                if e.is_expected() {
                    debug!("Like not applied ({}): {}", class, e);
                } else {
                    error!("Failed to toggle like on post {}: {}", self.post_id, e);
                }
                let message = match class {
                    OutcomeClass::RejectedByPolicy => POLICY_REJECTED_MESSAGE,
                    OutcomeClass::Unauthenticated => UNAUTHENTICATED_MESSAGE,
                    OutcomeClass::TransientFailure | OutcomeClass::Success => {
                        TRANSIENT_FAILURE_MESSAGE
                    }
                };
                self.notifier.notify(Notification::error(message));
                ReconciledState::RolledBack { snapshot, class }
            }
        }
    }
}
