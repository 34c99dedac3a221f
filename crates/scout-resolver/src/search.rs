use std::{collections::BTreeMap, sync::Arc, time::Instant};

use alloy::{
    primitives::{Address, B256},
    rpc::types::Log,
};
use scout_chain::{LogFilter, MultiProvider, ProviderError};
use scout_domain::{ChainName, DeliveryStatus, DispatchRecord};
use tokio_util::sync::CancellationToken;

use crate::{
    Identifier, ResolverError,
    mailbox::{MailboxTopics, decode_dispatch, indexed_message_id},
};

/// Blocks searched back from the chain head when the caller gives no lower bound.
pub const DEFAULT_BLOCK_WINDOW: u64 = 100_000;

/// Caller-supplied block bounds of a log search. Missing bounds are filled in per chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockWindow {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl BlockWindow {
    pub fn new(from_block: Option<u64>, to_block: Option<u64>) -> Result<Self, ResolverError> {
        if let (Some(from), Some(to)) = (from_block, to_block)
            && from > to
        {
            return Err(ResolverError::InvalidWindow { from, to });
        }
        Ok(Self {
            from_block,
            to_block,
        })
    }
}

/// Searches one chain's mailbox for dispatched messages.
#[derive(Debug, Clone)]
pub struct ChainResolver {
    provider: Arc<MultiProvider>,
    topics: MailboxTopics,
    default_window: u64,
}

impl ChainResolver {
    pub fn new(provider: Arc<MultiProvider>, mailbox: Address) -> Self {
        Self {
            provider,
            topics: MailboxTopics::new(mailbox),
            default_window: DEFAULT_BLOCK_WINDOW,
        }
    }

    /// Overrides how many blocks back from the head a search reaches when no start is given.
    pub fn with_default_window(mut self, blocks: u64) -> Self {
        self.default_window = blocks;
        self
    }

    /// Chain this resolver searches.
    pub fn chain(&self) -> &ChainName {
        self.provider.name()
    }

    /// Mailbox contract whose events are matched.
    pub fn mailbox(&self) -> Address {
        self.topics.mailbox
    }

    /// Tries each interpretation in order and returns the first non-empty result.
    ///
    /// A failed or empty interpretation falls through to the next one; the outcome of the last
    /// interpretation is returned as is.
    pub async fn search(
        &self,
        identifiers: &[Identifier],
        window: BlockWindow,
    ) -> Result<Vec<DispatchRecord>, ResolverError> {
        let mut outcome = Ok(Vec::new());
        for (position, identifier) in identifiers.iter().enumerate() {
            outcome = self.search_one(identifier, window).await;
            let found = matches!(&outcome, Ok(messages) if !messages.is_empty());
            let rejected = matches!(&outcome, Err(error) if error.is_input_error());
            if found || rejected {
                return outcome;
            }
            if let Err(error) = &outcome {
                tracing::debug!(
                    chain = %self.chain(),
                    %identifier,
                    error = %error,
                    "Interpretation failed"
                );
            }
            if position + 1 < identifiers.len() {
                tracing::debug!(
                    chain = %self.chain(),
                    %identifier,
                    "No messages found; trying next interpretation"
                );
            }
        }
        outcome
    }

    /// Like [`ChainResolver::search`], abandoning the search at its next suspension point once
    /// `cancel` fires.
    pub async fn search_until_cancelled(
        &self,
        identifiers: &[Identifier],
        window: BlockWindow,
        cancel: &CancellationToken,
    ) -> Result<Vec<DispatchRecord>, ResolverError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ResolverError::Cancelled),
            result = self.search(identifiers, window) => result,
        }
    }

    async fn search_one(
        &self,
        identifier: &Identifier,
        window: BlockWindow,
    ) -> Result<Vec<DispatchRecord>, ResolverError> {
        let started = Instant::now();
        let (strategy, result) = match identifier {
            Identifier::TxHash(hash) => ("tx_hash", self.by_tx_hash(*hash).await),
            Identifier::MessageId(id) => ("message_id", self.by_message_id(*id, window).await),
            Identifier::Address(address) => {
                ("address", self.by_address(*address, window).await)
            }
        };

        let (status, count) = match &result {
            Ok(messages) if messages.is_empty() => ("empty", 0),
            Ok(messages) => ("found", messages.len()),
            Err(_) => ("error", 0),
        };
        scout_observability::record_resolver_search(
            self.chain().as_str(),
            strategy,
            status,
            started.elapsed(),
            count,
        );
        tracing::debug!(
            chain = %self.chain(),
            strategy,
            status,
            messages = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search strategy finished"
        );
        result
    }

    /// Decodes every mailbox dispatch emitted by transaction `hash`.
    pub async fn by_tx_hash(&self, hash: B256) -> Result<Vec<DispatchRecord>, ResolverError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(self.decode_dispatches(receipt.inner.logs()))
    }

    /// Finds the dispatch whose id is `id` via its `DispatchId` log.
    pub async fn by_message_id(
        &self,
        id: B256,
        window: BlockWindow,
    ) -> Result<Vec<DispatchRecord>, ResolverError> {
        let filter = self
            .window_filter(window)
            .await?
            .topic(0, self.topics.dispatch_id)
            .topic(1, id);
        let id_logs = self.provider.get_logs(filter).await?;

        let mut tx_hashes: Vec<B256> = id_logs
            .iter()
            .filter(|log| indexed_message_id(log) == Some(id))
            .filter_map(|log| log.transaction_hash)
            .collect();
        tx_hashes.dedup();

        let mut messages = Vec::new();
        for tx_hash in tx_hashes {
            let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
            messages.extend(
                self.decode_dispatches(receipt.inner.logs())
                    .into_iter()
                    .filter(|record| record.message_id == id),
            );
        }
        Ok(messages)
    }

    /// Finds dispatches sent from or addressed to `address`.
    pub async fn by_address(
        &self,
        address: Address,
        window: BlockWindow,
    ) -> Result<Vec<DispatchRecord>, ResolverError> {
        let base = self
            .window_filter(window)
            .await?
            .topic(0, self.topics.dispatch);
        let word = address.into_word();

        let sent = self.provider.get_logs(base.clone().topic(1, word)).await?;
        let received = self.provider.get_logs(base.topic(3, word)).await?;

        // Keyed by position so a self-addressed message shows up once.
        let mut merged: BTreeMap<(u64, u64, B256), Log> = BTreeMap::new();
        for log in sent.into_iter().chain(received) {
            let Some(tx_hash) = log.transaction_hash else {
                continue;
            };
            let key = (
                log.block_number.unwrap_or_default(),
                log.log_index.unwrap_or_default(),
                tx_hash,
            );
            merged.entry(key).or_insert(log);
        }

        let logs: Vec<Log> = merged.into_values().collect();
        Ok(self.decode_dispatches(&logs))
    }

    /// Looks for the `ProcessId` event of message `id` on this (destination) chain.
    pub async fn delivery_status(
        &self,
        id: B256,
        window: BlockWindow,
    ) -> Result<DeliveryStatus, ResolverError> {
        let filter = self
            .window_filter(window)
            .await?
            .topic(0, self.topics.process_id)
            .topic(1, id);
        let logs = self.provider.get_logs(filter).await?;

        let status = logs
            .iter()
            .filter(|log| indexed_message_id(log) == Some(id))
            .find_map(|log| {
                log.transaction_hash
                    .map(|transaction_hash| DeliveryStatus::Delivered {
                        transaction_hash,
                        block_number: log.block_number,
                    })
            })
            .unwrap_or(DeliveryStatus::Unknown);
        Ok(status)
    }

    async fn window_filter(&self, window: BlockWindow) -> Result<LogFilter, ProviderError> {
        let to = match window.to_block {
            Some(to) => to,
            None => self.provider.get_block_number().await?,
        };
        let from = window
            .from_block
            .unwrap_or_else(|| to.saturating_sub(self.default_window));

        Ok(LogFilter::new()
            .address(self.topics.mailbox)
            .from_block(from)
            .to_block(to))
    }

    fn decode_dispatches(&self, logs: &[Log]) -> Vec<DispatchRecord> {
        logs.iter()
            .filter(|log| self.topics.is_dispatch(log))
            .filter_map(|log| match decode_dispatch(log, self.topics.mailbox) {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!(
                        chain = %self.chain(),
                        tx_hash = ?log.transaction_hash,
                        log_index = ?log.log_index,
                        error = %error,
                        "Dropping undecodable dispatch log"
                    );
                    scout_observability::record_decode_failure(self.chain().as_str(), "Dispatch");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use std::{
        fmt,
        sync::{Arc, Mutex},
    };

    use alloy::{
        primitives::{Bloom, LogData},
        rpc::types::TransactionReceipt,
    };
    use async_trait::async_trait;
    use scout_chain::{
        BlockBound, CapabilitySet, ChainDataSource, ChainRequest, ChainResponse, SourceError,
        SourceKind,
    };

    use serde_json::json;

    use super::*;
    use crate::mailbox::testing::*;

    pub(crate) const MAILBOX: Address = Address::repeat_byte(0xaa);
    pub(crate) const HEAD: u64 = 500_000;

    /// In-memory chain: a log store and receipts keyed by transaction hash.
    #[derive(Default)]
    pub(crate) struct FakeChain {
        pub(crate) logs: Vec<Log>,
        pub(crate) requests: Mutex<Vec<ChainRequest>>,
        pub(crate) fail_receipts: bool,
    }

    impl fmt::Debug for FakeChain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FakeChain").field("logs", &self.logs.len()).finish()
        }
    }

    fn bound(bound: Option<BlockBound>, latest: u64) -> u64 {
        match bound {
            Some(BlockBound::Number(n)) => n,
            Some(BlockBound::Earliest) => 0,
            Some(BlockBound::Latest) | None => latest,
        }
    }

    impl FakeChain {
        fn matching_logs(&self, filter: &LogFilter) -> Vec<Log> {
            let from = bound(filter.from_block, HEAD);
            let to = bound(filter.to_block, HEAD);
            self.logs
                .iter()
                .filter(|log| filter.address.is_none_or(|address| log.address() == address))
                .filter(|log| (from..=to).contains(&log.block_number.unwrap_or_default()))
                .filter(|log| {
                    filter.topics.iter().enumerate().all(|(i, topic)| {
                        topic.is_none_or(|topic| log.topics().get(i) == Some(&topic))
                    })
                })
                .cloned()
                .collect()
        }

        fn receipt(&self, hash: B256) -> Option<TransactionReceipt> {
            let logs: Vec<&Log> = self
                .logs
                .iter()
                .filter(|log| log.transaction_hash == Some(hash))
                .collect();
            let first = logs.first()?;
            let receipt = json!({
                "type": "0x2",
                "status": "0x1",
                "cumulativeGasUsed": "0x5208",
                "logs": logs,
                "logsBloom": Bloom::default(),
                "transactionHash": hash,
                "transactionIndex": "0x0",
                "blockHash": first.block_hash,
                "blockNumber": first.block_number.map(|n| format!("{n:#x}")),
                "gasUsed": "0x5208",
                "effectiveGasPrice": "0x1",
                "from": Address::repeat_byte(0x11),
                "to": MAILBOX,
                "contractAddress": null
            });
            Some(serde_json::from_value(receipt).unwrap())
        }
    }

    #[async_trait]
    impl ChainDataSource for FakeChain {
        fn label(&self) -> &str {
            "fake"
        }

        fn kind(&self) -> SourceKind {
            SourceKind::JsonRpc
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::all()
        }

        async fn perform(&self, request: &ChainRequest) -> Result<ChainResponse, SourceError> {
            self.requests.lock().unwrap().push(request.clone());
            match request {
                ChainRequest::GetBlockNumber => Ok(ChainResponse::BlockNumber(HEAD)),
                ChainRequest::GetLogs(filter) => {
                    Ok(ChainResponse::Logs(self.matching_logs(filter)))
                }
                ChainRequest::GetTransactionReceipt { hash } => {
                    if self.fail_receipts {
                        return Err(SourceError::HttpStatus(503));
                    }
                    self.receipt(*hash)
                        .map(|receipt| ChainResponse::Receipt(Box::new(receipt)))
                        .ok_or(SourceError::EmptyResult)
                }
                other => Err(SourceError::UnsupportedMethod {
                    method: other.method(),
                }),
            }
        }
    }

    pub(crate) fn resolver_for(chain: FakeChain, name: &str) -> (ChainResolver, Arc<FakeChain>) {
        let chain = Arc::new(chain);
        let provider = MultiProvider::from_sources(
            ChainName::from(name),
            1,
            vec![chain.clone() as Arc<dyn ChainDataSource>],
        )
        .unwrap();
        (ChainResolver::new(Arc::new(provider), MAILBOX), chain)
    }

    /// Two dispatches in one transaction plus one unrelated log.
    pub(crate) fn populated_chain() -> FakeChain {
        let tx = B256::repeat_byte(0x01);
        let first = sample_message(1);
        let second = sample_message(2);
        FakeChain {
            logs: vec![
                dispatch_log(MAILBOX, &first, tx, HEAD - 10, 0),
                dispatch_id_log(MAILBOX, first.id(), tx, HEAD - 10, 1),
                dispatch_log(MAILBOX, &second, tx, HEAD - 10, 2),
                dispatch_id_log(MAILBOX, second.id(), tx, HEAD - 10, 3),
                rpc_log(
                    Address::repeat_byte(0xee),
                    LogData::new_unchecked(vec![B256::repeat_byte(9)], Default::default()),
                    tx,
                    HEAD - 10,
                    4,
                ),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn tx_hash_decodes_every_dispatch_in_receipt() {
        let (resolver, _) = resolver_for(populated_chain(), "origin");
        let messages = resolver.by_tx_hash(B256::repeat_byte(0x01)).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].nonce, 1);
        assert_eq!(messages[1].nonce, 2);
    }

    #[tokio::test]
    async fn message_id_returns_only_the_paired_dispatch() {
        let (resolver, _) = resolver_for(populated_chain(), "origin");
        let id = sample_message(2).id();
        let messages = resolver
            .by_message_id(id, BlockWindow::default())
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, id);
        assert_eq!(messages[0].nonce, 2);
    }

    #[tokio::test]
    async fn unmatched_message_id_is_empty_not_error() {
        let (resolver, _) = resolver_for(populated_chain(), "origin");
        let messages = resolver
            .by_message_id(B256::repeat_byte(0x77), BlockWindow::default())
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn default_window_ends_at_head() {
        let (resolver, chain) = resolver_for(FakeChain::default(), "origin");
        resolver
            .by_message_id(B256::ZERO, BlockWindow::default())
            .await
            .unwrap();

        let requests = chain.requests.lock().unwrap();
        let filter = requests
            .iter()
            .find_map(|request| match request {
                ChainRequest::GetLogs(filter) => Some(filter.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(filter.from_block, Some(BlockBound::Number(HEAD - DEFAULT_BLOCK_WINDOW)));
        assert_eq!(filter.to_block, Some(BlockBound::Number(HEAD)));
        assert_eq!(filter.address, Some(MAILBOX));
    }

    #[tokio::test]
    async fn explicit_window_skips_head_lookup() {
        let (resolver, chain) = resolver_for(FakeChain::default(), "origin");
        resolver
            .by_message_id(B256::ZERO, BlockWindow::new(Some(10), Some(20)).unwrap())
            .await
            .unwrap();
        let requests = chain.requests.lock().unwrap();
        assert!(
            !requests
                .iter()
                .any(|request| matches!(request, ChainRequest::GetBlockNumber))
        );
    }

    #[tokio::test]
    async fn address_search_merges_sender_and_recipient_matches() {
        let tx_a = B256::repeat_byte(0x0a);
        let tx_b = B256::repeat_byte(0x0b);
        let watched = Address::repeat_byte(0x11);

        let outbound = sample_message(1);
        let mut inbound = sample_message(2);
        inbound.sender = Address::repeat_byte(0x33).into_word();
        inbound.recipient = watched.into_word();
        let mut self_addressed = sample_message(3);
        self_addressed.recipient = watched.into_word();

        let chain = FakeChain {
            logs: vec![
                dispatch_log(MAILBOX, &inbound, tx_b, HEAD - 5, 0),
                dispatch_log(MAILBOX, &outbound, tx_a, HEAD - 50, 0),
                dispatch_log(MAILBOX, &self_addressed, tx_a, HEAD - 50, 1),
            ],
            ..Default::default()
        };
        let (resolver, _) = resolver_for(chain, "origin");

        let messages = resolver
            .by_address(watched, BlockWindow::default())
            .await
            .unwrap();
        let nonces: Vec<u32> = messages.iter().map(|m| m.nonce).collect();
        assert_eq!(nonces, vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn ambiguous_hash_falls_back_to_message_id() {
        let (resolver, _) = resolver_for(populated_chain(), "origin");
        let id = sample_message(1).id();

        // No transaction has this hash, so the receipt lookup comes back empty.
        let messages = resolver
            .search(
                &[Identifier::TxHash(id), Identifier::MessageId(id)],
                BlockWindow::default(),
            )
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, id);
    }

    #[tokio::test]
    async fn last_interpretation_error_is_returned() {
        let chain = FakeChain {
            fail_receipts: true,
            ..Default::default()
        };
        let (resolver, _) = resolver_for(chain, "origin");
        let err = resolver
            .search(&[Identifier::TxHash(B256::ZERO)], BlockWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::Provider(_)));
    }

    #[tokio::test]
    async fn delivery_is_reported_from_process_id() {
        let id = sample_message(1).id();
        let delivery_tx = B256::repeat_byte(0xdd);
        let chain = FakeChain {
            logs: vec![process_id_log(MAILBOX, id, delivery_tx, HEAD - 1)],
            ..Default::default()
        };
        let (resolver, _) = resolver_for(chain, "destination");

        let status = resolver
            .delivery_status(id, BlockWindow::default())
            .await
            .unwrap();
        assert_eq!(
            status,
            DeliveryStatus::Delivered {
                transaction_hash: delivery_tx,
                block_number: Some(HEAD - 1),
            }
        );

        let unknown = resolver
            .delivery_status(B256::repeat_byte(0x44), BlockWindow::default())
            .await
            .unwrap();
        assert_eq!(unknown, DeliveryStatus::Unknown);
    }

    #[tokio::test]
    async fn malformed_dispatch_is_dropped() {
        let tx = B256::repeat_byte(0x01);
        let good = sample_message(1);
        let mut broken = dispatch_log(MAILBOX, &sample_message(2), tx, HEAD - 1, 1);
        broken.inner.data = LogData::new_unchecked(
            broken.inner.data.topics().to_vec(),
            alloy::primitives::Bytes::from_static(&[0xff; 3]),
        );
        let chain = FakeChain {
            logs: vec![dispatch_log(MAILBOX, &good, tx, HEAD - 1, 0), broken],
            ..Default::default()
        };
        let (resolver, _) = resolver_for(chain, "origin");

        let messages = resolver.by_tx_hash(tx).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].nonce, 1);
    }

    #[tokio::test]
    async fn cancelled_search_stops() {
        let (resolver, _) = resolver_for(populated_chain(), "origin");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = resolver
            .search_until_cancelled(
                &[Identifier::TxHash(B256::repeat_byte(0x01))],
                BlockWindow::default(),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::Cancelled));
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert!(matches!(
            BlockWindow::new(Some(10), Some(5)),
            Err(ResolverError::InvalidWindow { from: 10, to: 5 })
        ));
    }
}
