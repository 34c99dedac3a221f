use scout_chain::B256;
use scout_domain::{ChainName, DeliveryStatus};
use scout_resolver::{BlockWindow, Identifier, MessageResolver, QueryType, classify};
use serde::Serialize;

use super::CommandOutput;
use crate::{cli::DeliveryArgs, error::AppError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryReport {
    message_id: B256,
    chain: ChainName,
    #[serde(flatten)]
    status: DeliveryStatus,
}

pub(super) async fn delivery(
    resolver: &MessageResolver,
    args: DeliveryArgs,
) -> Result<CommandOutput, AppError> {
    let message_id = message_id(&args.message_id)?;
    let window = BlockWindow::new(args.from_block, args.to_block)?;

    let status = resolver
        .delivery_status(message_id, &args.chain, window)
        .await?;
    let found = status.is_delivered();
    CommandOutput::json(
        &DeliveryReport {
            message_id,
            chain: args.chain,
            status,
        },
        found,
    )
}

fn message_id(input: &str) -> Result<B256, scout_resolver::ResolverError> {
    let identifiers = classify(input, Some(QueryType::MessageId))?;
    match identifiers.as_slice() {
        [Identifier::MessageId(id)] => Ok(*id),
        _ => Err(scout_resolver::ResolverError::HintMismatch {
            input: input.to_string(),
            hint: QueryType::MessageId,
        }),
    }
}
