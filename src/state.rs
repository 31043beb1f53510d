use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::discord::{InteractionResponder, SignatureVerifier};
use crate::dispatch::StoryDispatcher;

// app's shared state
pub struct AppState {
    pub dispatcher: StoryDispatcher,
    pub responder: Arc<dyn InteractionResponder>,
    pub verifier: SignatureVerifier,
    // stories still being generated, drained on shutdown
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(
        dispatcher: StoryDispatcher,
        responder: Arc<dyn InteractionResponder>,
        verifier: SignatureVerifier,
    ) -> Self {
        Self {
            dispatcher,
            responder,
            verifier,
            tasks: TaskTracker::new(),
        }
    }

    /// Stop accepting background work and wait up to `grace` for in-flight
    /// stories to be delivered. Returns `false` if some were still running.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.tasks.close();
        let pending = self.tasks.len();
        if pending > 0 {
            info!(pending, "waiting for in-flight stories");
        }
        match tokio::time::timeout(grace, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(pending = self.tasks.len(), "shutdown grace elapsed with stories in flight");
                false
            }
        }
    }
}
