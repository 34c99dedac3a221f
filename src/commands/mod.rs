mod chains;
mod delivery;
mod resolve;

use std::sync::Arc;

use scout_chain::ProviderRegistry;
use scout_resolver::{CancellationToken, MessageResolver};
use serde::Serialize;

use crate::{cli::CliCommand, config::Config, error::AppError};

/// Rendered result of a command.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub body: String,
    /// False when a search completed without finding anything.
    pub found: bool,
}

impl CommandOutput {
    fn json(value: &impl Serialize, found: bool) -> Result<Self, AppError> {
        Ok(Self {
            body: serde_json::to_string_pretty(value)?,
            found,
        })
    }
}

pub(crate) async fn execute(
    command: CliCommand,
    config: &Config,
) -> Result<CommandOutput, AppError> {
    match command {
        CliCommand::Chains => chains::list(config),
        CliCommand::Resolve(args) => {
            let cancel = cancel_on_interrupt();
            resolve::resolve(&message_resolver(config), args, &cancel).await
        }
        CliCommand::Delivery(args) => delivery::delivery(&message_resolver(config), args).await,
    }
}

fn message_resolver(config: &Config) -> MessageResolver {
    let registry = ProviderRegistry::new(config.chains.clone(), config.explorer.clone());
    MessageResolver::new(Arc::new(registry))
        .with_default_window(config.resolver.default_block_window)
}

fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling search");
            trigger.cancel();
        }
    });
    cancel
}
