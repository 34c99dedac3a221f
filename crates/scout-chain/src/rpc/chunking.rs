use std::future::Future;

use futures::future::try_join_all;

use crate::{BlockBound, LogChunk, LogFilter, RpcPagination, SourceError, plan_chunks};

/// Chunks issued concurrently per batch.
pub(crate) const CHUNK_CONCURRENCY: usize = 5;
/// Assumed node retention horizon, in multiples of `max_block_range`.
pub(crate) const RETENTION_WINDOWS: u64 = 10;

/// Block span a paginated `eth_getLogs` will actually query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueryRange {
    pub start: u64,
    pub end: u64,
}

/// Oldest block a node with `pagination` is assumed to serve, given the query's end block.
pub(crate) fn min_queryable_block(end: u64, pagination: &RpcPagination) -> u64 {
    match pagination.max_block_range {
        Some(range) => end
            .checked_sub(range.saturating_mul(RETENTION_WINDOWS))
            .map_or(0, |oldest| oldest.saturating_add(1)),
        None => 0,
    }
}

/// Resolves and validates the start of the span once `end` is known.
///
/// Out-of-bounds requests fail instead of being clamped, so callers never receive a silently
/// narrowed result.
pub(crate) fn resolve_range(
    filter: &LogFilter,
    pagination: &RpcPagination,
    end: u64,
) -> Result<QueryRange, SourceError> {
    let min_queryable = min_queryable_block(end, pagination);
    let start = match filter.from_block {
        Some(BlockBound::Earliest) => 0,
        Some(BlockBound::Number(number)) => number,
        Some(BlockBound::Latest) => end,
        None => min_queryable.max(pagination.min_block_number.unwrap_or(0)),
    };

    let invalid = |reason| SourceError::InvalidBlockRange { start, end, reason };
    if start >= end {
        return Err(invalid("start block must be below end block"));
    }
    if pagination
        .min_block_number
        .is_some_and(|min_block| start < min_block)
    {
        return Err(invalid("start block is below the node's minimum block number"));
    }
    if start < min_queryable {
        return Err(invalid("start block is beyond the node's queryable history"));
    }

    Ok(QueryRange { start, end })
}

/// Runs a paginated log query.
///
/// `latest_block` is only invoked when the filter's end is `latest` or absent. Chunks run in
/// concurrent batches of [`CHUNK_CONCURRENCY`]; batches run one after another. Any chunk failure
/// fails the whole query and results fetched so far are discarded.
pub(crate) async fn fetch_chunked<T, L, LF, C, CF>(
    filter: &LogFilter,
    pagination: &RpcPagination,
    latest_block: L,
    fetch_chunk: C,
) -> Result<Vec<T>, SourceError>
where
    L: FnOnce() -> LF,
    LF: Future<Output = Result<u64, SourceError>>,
    C: Fn(LogChunk) -> CF,
    CF: Future<Output = Result<Vec<T>, SourceError>>,
{
    let end = match filter.to_block {
        Some(BlockBound::Number(number)) => number,
        Some(BlockBound::Earliest) => 0,
        Some(BlockBound::Latest) | None => latest_block().await?,
    };
    let range = resolve_range(filter, pagination, end)?;
    let chunks = plan_chunks(range.start, range.end, pagination.max_block_range);

    tracing::debug!(
        start = range.start,
        end = range.end,
        chunks = chunks.len(),
        "Fetching logs in chunks"
    );

    let mut items = Vec::new();
    for batch in chunks.chunks(CHUNK_CONCURRENCY) {
        let results = try_join_all(batch.iter().map(|chunk| fetch_chunk(*chunk))).await?;
        for chunk_items in results {
            items.extend(chunk_items);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::*;

    fn paginated(max_block_range: Option<u64>, min_block_number: Option<u64>) -> RpcPagination {
        RpcPagination {
            max_block_range,
            min_block_number,
        }
    }

    /// Event blocks served by the reference backend.
    fn events() -> Vec<u64> {
        (0..400).filter(|block| block % 7 == 0).collect()
    }

    fn reference_query(from: u64, to: u64) -> Vec<u64> {
        events()
            .into_iter()
            .filter(|block| (from..=to).contains(block))
            .collect()
    }

    #[tokio::test]
    async fn chunked_result_matches_direct_query() {
        let filter = LogFilter::new().from_block(100).to_block(350);
        let seen = Mutex::new(Vec::new());

        let logs = fetch_chunked(
            &filter,
            &paginated(Some(100), None),
            // Literal bounds never consult the latest block.
            || async { Ok(u64::MAX) },
            |chunk| {
                seen.lock().unwrap().push(chunk);
                async move { Ok(reference_query(chunk.from, chunk.to)) }
            },
        )
        .await
        .unwrap();

        assert_eq!(logs, reference_query(100, 350));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                LogChunk { from: 100, to: 199 },
                LogChunk { from: 200, to: 299 },
                LogChunk { from: 300, to: 350 },
            ]
        );
    }

    #[tokio::test]
    async fn start_below_min_block_number_fails() {
        let filter = LogFilter::new().from_block(100).to_block(1_000);
        let calls = AtomicUsize::new(0);

        let result: Result<Vec<u64>, _> = fetch_chunked(
            &filter,
            &paginated(None, Some(500)),
            || async { Ok(1_000) },
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec![]) }
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(SourceError::InvalidBlockRange { start: 100, end: 1_000, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_bounds_use_latest_and_retention_horizon() {
        let filter = LogFilter::new();
        let seen = Mutex::new(Vec::new());

        fetch_chunked::<u64, _, _, _, _>(
            &filter,
            &paginated(Some(1_000), None),
            || async { Ok(50_000) },
            |chunk| {
                seen.lock().unwrap().push(chunk);
                async { Ok(vec![]) }
            },
        )
        .await
        .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        assert_eq!(seen.first().map(|c| c.from), Some(40_001));
        assert_eq!(seen.last().map(|c| c.to), Some(50_000));
    }

    #[tokio::test]
    async fn start_beyond_retention_horizon_fails() {
        let filter = LogFilter::new().from_block(1_000);
        let result: Result<Vec<u64>, _> = fetch_chunked(
            &filter,
            &paginated(Some(100), None),
            || async { Ok(10_000) },
            |_| async { Ok(vec![]) },
        )
        .await;
        // min queryable = 10_000 - 1_000 + 1
        assert!(matches!(
            result,
            Err(SourceError::InvalidBlockRange { start: 1_000, end: 10_000, .. })
        ));
    }

    #[tokio::test]
    async fn empty_span_fails() {
        let filter = LogFilter::new().from_block(500).to_block(500);
        let result: Result<Vec<u64>, _> = fetch_chunked(
            &filter,
            &paginated(Some(100), None),
            || async { Ok(500) },
            |_| async { Ok(vec![]) },
        )
        .await;
        assert!(matches!(result, Err(SourceError::InvalidBlockRange { .. })));
    }

    #[tokio::test]
    async fn failed_chunk_fails_whole_query() {
        let filter = LogFilter::new().from_block(0).to_block(999);
        let calls = AtomicUsize::new(0);

        let result = fetch_chunked(
            &filter,
            &paginated(Some(100), None),
            || async { Ok(999) },
            |chunk| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if chunk.from == 200 {
                        Err(SourceError::HttpStatus(503))
                    } else {
                        Ok(vec![chunk.from])
                    }
                }
            },
        )
        .await;

        assert!(matches!(result, Err(SourceError::HttpStatus(503))));
        // The failure lands in the first batch, so the second batch never starts.
        assert_eq!(calls.load(Ordering::SeqCst), CHUNK_CONCURRENCY);
    }

    #[tokio::test(start_paused = true)]
    async fn batches_preserve_block_order() {
        // Ten chunks of 100, the whole 1_000-block horizon ending at 1_599.
        let filter = LogFilter::new().from_block(600).to_block(1_599);
        let finished = Mutex::new(Vec::new());

        let logs = fetch_chunked(
            &filter,
            &paginated(Some(100), None),
            || async { Ok(1_599) },
            |chunk| {
                let finished = &finished;
                async move {
                    // Later chunks of a batch complete first.
                    tokio::time::sleep(Duration::from_millis(2_000 - chunk.from)).await;
                    finished.lock().unwrap().push(chunk.from);
                    Ok(vec![chunk.from])
                }
            },
        )
        .await
        .unwrap();

        let expected: Vec<u64> = (6..16).map(|i| i * 100).collect();
        assert_eq!(logs, expected);
        let finished = finished.lock().unwrap();
        assert_eq!(finished[..CHUNK_CONCURRENCY], [1_000, 900, 800, 700, 600]);
        assert_ne!(*finished, expected);
    }

    #[test]
    fn min_queryable_saturates_at_genesis() {
        assert_eq!(min_queryable_block(50, &paginated(Some(100), None)), 0);
        assert_eq!(min_queryable_block(5_000, &paginated(Some(100), None)), 4_001);
        assert_eq!(min_queryable_block(5_000, &paginated(None, Some(7))), 0);
        assert_eq!(min_queryable_block(999, &paginated(Some(100), None)), 0);
        assert_eq!(min_queryable_block(1_000, &paginated(Some(100), None)), 1);
    }

    #[test]
    fn min_queryable_handles_highest_block() {
        assert_eq!(
            min_queryable_block(u64::MAX, &paginated(Some(100), None)),
            u64::MAX - 999
        );
        assert_eq!(min_queryable_block(u64::MAX, &paginated(Some(u64::MAX), None)), 1);
    }
}
