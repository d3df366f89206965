mod actors;
mod brain;
mod coach;
mod config;
mod database;
mod error;
mod gateway;
mod models;
mod scenarios;
mod telemetry;

#[cfg(test)]
mod tests;

use crate::actors::llm::LlmActorHandle;
use crate::actors::recorder::RecorderHandle;
use crate::actors::traits::LlmActor;
use crate::coach::CoachingEngine;
use crate::config::AppConfig;
use crate::gateway::AppState;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("load configuration")?;

    let subscriber = telemetry::get_subscriber("calmly-core", &config.log_level, std::io::stdout);
    telemetry::init_subscriber(subscriber)?;

    let library = scenarios::bundled_library().context("load bundled scenario library")?;
    let pool = database::init_db(&config.database_url, &library)
        .await
        .context("initialize database")?;

    let llm_settings = config.llm_settings();
    let llm_timeout = llm_settings.timeout;
    let llm: Arc<dyn LlmActor> = Arc::new(LlmActorHandle::new(llm_settings));
    if !llm.is_configured() {
        warn!("No LLM API key configured; coaching will use fallback responses");
    }

    let coach = CoachingEngine::new(llm, pool.clone());
    let recorder = RecorderHandle::new(pool.clone(), config.queue_capacity);
    let state = AppState {
        pool,
        coach,
        recorder,
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Calmly core");
    gateway::run(
        &config.bind_address(),
        state,
        gateway::request_timeout(llm_timeout),
    )
    .await
}
