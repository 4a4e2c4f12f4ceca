pub mod ask;
pub mod chat;
pub mod events;
pub mod exec;
pub mod list;
pub mod profile;
pub mod token;

use tracing::warn;

use crate::engine::Engine;

// A missing profile only costs the assistant context.
pub(crate) async fn prime(engine: &Engine) {
    engine.refresh().await;
    if let Err(err) = engine.load_profile().await {
        warn!(error = %err, "profile unavailable");
    }
}
