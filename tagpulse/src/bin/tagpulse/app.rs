use anyhow::{Context, Result};
use tagpulse::{AnalyticsConfig, AnalyticsEngine, Broadcaster, ContentService, Store, User};

/// Store, broadcaster and settings shared by every command.
pub struct App<S, B> {
    pub store: S,
    pub broadcaster: B,
    pub analytics: AnalyticsConfig,
    /// Email of the user commands act as.
    pub acting_as: String,
}

impl<S: Store, B: Broadcaster> App<S, B> {
    pub fn content(&self) -> ContentService<'_, S, B> {
        ContentService::new(&self.store, &self.broadcaster)
    }

    pub fn analytics(&self) -> AnalyticsEngine<'_, S> {
        AnalyticsEngine::new(&self.store).with_config(self.analytics)
    }

    pub async fn current_user(&self) -> Result<User> {
        self.content()
            .find_user(&self.acting_as)
            .await
            .with_context(|| format!("Unknown user '{}' (pass --as with a registered email)", self.acting_as))
    }
}
