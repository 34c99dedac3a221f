use scout_chain::B256;
use scout_domain::{ChainName, DeliveryStatus, DomainId};
use scout_resolver::{BlockWindow, CancellationToken, MessageResolver, MultiChainOutcome};
use serde::Serialize;

use super::CommandOutput;
use crate::{cli::ResolveArgs, error::AppError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveReport {
    #[serde(flatten)]
    outcome: MultiChainOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    deliveries: Vec<MessageDelivery>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageDelivery {
    message_id: B256,
    destination_domain: DomainId,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_chain: Option<ChainName>,
    delivery: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub(super) async fn resolve(
    resolver: &MessageResolver,
    args: ResolveArgs,
    cancel: &CancellationToken,
) -> Result<CommandOutput, AppError> {
    let window = BlockWindow::new(args.from_block, args.to_block)?;
    let outcome = resolver
        .resolve(
            &args.identifier,
            args.query_type,
            &args.chains,
            window,
            cancel,
        )
        .await?;

    let mut deliveries = Vec::new();
    if args.check_delivery {
        for message in outcome.messages() {
            let destination_chain = resolver
                .registry()
                .metadata_by_domain(message.destination_domain)
                .map(|metadata| metadata.name.clone());
            // Destination windows are chain-local, so the caller's block bounds do not apply.
            let (delivery, error) = match resolver
                .delivery_for(message, BlockWindow::default())
                .await
            {
                Ok(status) => (status, None),
                Err(error) => {
                    tracing::warn!(
                        message_id = %message.message_id,
                        destination_domain = message.destination_domain,
                        error = %error,
                        "Delivery lookup failed"
                    );
                    (DeliveryStatus::Unknown, Some(error.to_string()))
                }
            };
            deliveries.push(MessageDelivery {
                message_id: message.message_id,
                destination_domain: message.destination_domain,
                destination_chain,
                delivery,
                error,
            });
        }
    }

    let found = matches!(outcome, MultiChainOutcome::Found { .. });
    CommandOutput::json(
        &ResolveReport {
            outcome,
            deliveries,
        },
        found,
    )
}
