use futures::{StreamExt, stream::FuturesUnordered};
use scout_domain::{ChainName, DispatchRecord};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{BlockWindow, ChainResolver, Identifier, ResolverError};

/// Result of racing a search across several chains.
///
/// Chains that errored and chains with no matches are not distinguished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MultiChainOutcome {
    Found {
        chain: ChainName,
        messages: Vec<DispatchRecord>,
    },
    NotFound,
}

impl MultiChainOutcome {
    pub fn messages(&self) -> &[DispatchRecord] {
        match self {
            MultiChainOutcome::Found { messages, .. } => messages,
            MultiChainOutcome::NotFound => &[],
        }
    }
}

/// Searches every chain concurrently and accepts the first chain with at least one message.
///
/// Once a winner is found the remaining searches are cancelled through a child of `cancel`;
/// cancelling `cancel` itself stops the whole race.
pub async fn search_chains(
    resolvers: &[ChainResolver],
    identifiers: &[Identifier],
    window: BlockWindow,
    cancel: &CancellationToken,
) -> MultiChainOutcome {
    let race = cancel.child_token();
    let mut searches: FuturesUnordered<_> = resolvers
        .iter()
        .map(|resolver| {
            let race = race.clone();
            async move {
                let result = resolver
                    .search_until_cancelled(identifiers, window, &race)
                    .await;
                (resolver.chain().clone(), result)
            }
        })
        .collect();

    while let Some((chain, result)) = searches.next().await {
        match result {
            Ok(messages) if !messages.is_empty() => {
                race.cancel();
                tracing::info!(
                    chain = %chain,
                    messages = messages.len(),
                    "Messages found; cancelling remaining chain searches"
                );
                return MultiChainOutcome::Found { chain, messages };
            }
            Ok(_) => {
                tracing::debug!(chain = %chain, "No messages on chain");
            }
            Err(ResolverError::Cancelled) => {
                tracing::debug!(chain = %chain, "Chain search cancelled");
            }
            Err(error) => {
                tracing::warn!(chain = %chain, error = %error, "Chain search failed");
            }
        }
    }

    MultiChainOutcome::NotFound
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::{
        fmt,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use alloy::primitives::B256;
    use async_trait::async_trait;
    use scout_chain::{
        CapabilitySet, ChainDataSource, ChainRequest, ChainResponse, MultiProvider, SourceError,
        SourceKind,
    };

    use super::*;
    use crate::{
        mailbox::testing::sample_message,
        search::tests::{FakeChain, MAILBOX, populated_chain, resolver_for},
    };

    /// Source that never answers within the test's lifetime.
    #[derive(Default)]
    struct StalledSource {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl fmt::Debug for StalledSource {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("StalledSource")
        }
    }

    #[async_trait]
    impl ChainDataSource for StalledSource {
        fn label(&self) -> &str {
            "stalled"
        }

        fn kind(&self) -> SourceKind {
            SourceKind::JsonRpc
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::all()
        }

        async fn perform(&self, _request: &ChainRequest) -> Result<ChainResponse, SourceError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::EmptyResult)
        }
    }

    fn stalled_resolver() -> (ChainResolver, Arc<StalledSource>) {
        let source = Arc::new(StalledSource::default());
        let provider = MultiProvider::from_sources(
            ChainName::from("stalled"),
            3,
            vec![source.clone() as Arc<dyn ChainDataSource>],
        )
        .unwrap();
        (ChainResolver::new(Arc::new(provider), MAILBOX), source)
    }

    #[tokio::test(start_paused = true)]
    async fn first_chain_with_messages_wins_and_cancels_siblings() {
        let (stalled, stalled_source) = stalled_resolver();
        let (empty, _) = resolver_for(FakeChain::default(), "empty");
        let (origin, _) = resolver_for(populated_chain(), "origin");
        let cancel = CancellationToken::new();

        let outcome = search_chains(
            &[stalled, empty, origin],
            &[Identifier::TxHash(B256::repeat_byte(0x01))],
            BlockWindow::default(),
            &cancel,
        )
        .await;

        let MultiChainOutcome::Found { chain, messages } = outcome else {
            panic!("expected a winner");
        };
        assert_eq!(chain.as_str(), "origin");
        assert_eq!(messages.len(), 2);
        assert!(!cancel.is_cancelled());

        tokio::time::sleep(Duration::from_secs(7_200)).await;
        assert_eq!(stalled_source.started.load(Ordering::SeqCst), 1);
        assert_eq!(stalled_source.finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn errors_and_empty_chains_are_not_found() {
        let failing = FakeChain {
            fail_receipts: true,
            ..Default::default()
        };
        let (failing, _) = resolver_for(failing, "failing");
        let (empty, _) = resolver_for(FakeChain::default(), "empty");

        let outcome = search_chains(
            &[failing, empty],
            &[Identifier::MessageId(sample_message(1).id())],
            BlockWindow::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, MultiChainOutcome::NotFound);
        assert!(outcome.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_the_caller_token_stops_the_race() {
        let (stalled, _) = stalled_resolver();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let outcome = search_chains(
            &[stalled],
            &[Identifier::TxHash(B256::ZERO)],
            BlockWindow::default(),
            &cancel,
        )
        .await;
        assert_eq!(outcome, MultiChainOutcome::NotFound);
    }
}
