//! Builds the text oracle the simulation talks through.

use crate::config::{Config, ConfigError};
use async_openai::config::OpenAIConfig;
use classroom_core::{
    CannedOracle, OpenAICompatibleOracle, TextOracle, TimeoutOracle,
    participant::SELECTION_INSTRUCTION,
};
use std::sync::Arc;
use tracing::info;

/// Reply used for every utterance in a dry run.
pub const DRY_RUN_REPLY: &str = "(dry run)";

/// Creates the oracle described by `config`, wrapped in the configured
/// per-call timeout.
///
/// A dry run needs no credentials: it answers every utterance with
/// [`DRY_RUN_REPLY`] and always hands the turn to the first student.
pub fn build_oracle(config: &Config, dry_run: bool) -> Result<Arc<dyn TextOracle>, ConfigError> {
    let oracle: Arc<dyn TextOracle> = if dry_run {
        info!("Dry run: using canned oracle replies.");
        Arc::new(CannedOracle::new(DRY_RUN_REPLY).when_prompt_contains(SELECTION_INSTRUCTION, "0"))
    } else {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key()?)
            .with_api_base(config.provider.api_base());
        info!(provider = ?config.provider, model = %config.chat_model, "Using OpenAI-compatible oracle.");
        Arc::new(OpenAICompatibleOracle::new(
            openai_config,
            config.chat_model.clone(),
        ))
    };

    Ok(match config.oracle_timeout {
        Some(limit) => Arc::new(TimeoutOracle::new(oracle, limit)),
        None => oracle,
    })
}
