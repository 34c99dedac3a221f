use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256},
    rpc::types::Filter,
};

/// Block bound of a log query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockBound {
    Number(u64),
    Earliest,
    Latest,
}

impl From<u64> for BlockBound {
    fn from(value: u64) -> Self {
        BlockBound::Number(value)
    }
}

impl From<BlockBound> for BlockNumberOrTag {
    fn from(value: BlockBound) -> Self {
        match value {
            BlockBound::Number(number) => BlockNumberOrTag::Number(number),
            BlockBound::Earliest => BlockNumberOrTag::Earliest,
            BlockBound::Latest => BlockNumberOrTag::Latest,
        }
    }
}

/// Event log query. `None` topics are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Option<Address>,
    pub topics: [Option<B256>; 4],
    pub from_block: Option<BlockBound>,
    pub to_block: Option<BlockBound>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Sets the topic at `index` (0 is the event signature). Indexes above 3 are ignored.
    pub fn topic(mut self, index: usize, topic: B256) -> Self {
        if let Some(slot) = self.topics.get_mut(index) {
            *slot = Some(topic);
        }
        self
    }

    pub fn from_block(mut self, bound: impl Into<BlockBound>) -> Self {
        self.from_block = Some(bound.into());
        self
    }

    pub fn to_block(mut self, bound: impl Into<BlockBound>) -> Self {
        self.to_block = Some(bound.into());
        self
    }

    /// The equivalent alloy filter, bounds taken as given.
    pub fn to_rpc_filter(&self) -> Filter {
        let mut filter = self.base_rpc_filter();
        if let Some(from) = self.from_block {
            filter = filter.from_block(BlockNumberOrTag::from(from));
        }
        if let Some(to) = self.to_block {
            filter = filter.to_block(BlockNumberOrTag::from(to));
        }
        filter
    }

    /// The alloy filter restricted to one chunk of the block span.
    pub fn chunk_rpc_filter(&self, chunk: LogChunk) -> Filter {
        self.base_rpc_filter()
            .from_block(chunk.from)
            .to_block(chunk.to)
    }

    fn base_rpc_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(address) = self.address {
            filter = filter.address(address);
        }
        let [topic0, topic1, topic2, topic3] = self.topics;
        if let Some(topic) = topic0 {
            filter = filter.event_signature(topic);
        }
        if let Some(topic) = topic1 {
            filter = filter.topic1(topic);
        }
        if let Some(topic) = topic2 {
            filter = filter.topic2(topic);
        }
        if let Some(topic) = topic3 {
            filter = filter.topic3(topic);
        }
        filter
    }
}

/// Inclusive, contiguous slice `[from, to]` of a log query's block span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogChunk {
    pub from: u64,
    pub to: u64,
}

impl LogChunk {
    pub fn span(&self) -> u64 {
        self.to - self.from + 1
    }
}

/// Splits `[start, end]` into ascending chunks of at most `max_range` blocks.
///
/// Without a range limit the whole span is a single chunk.
pub fn plan_chunks(start: u64, end: u64, max_range: Option<u64>) -> Vec<LogChunk> {
    if start > end {
        return Vec::new();
    }
    let Some(max_range) = max_range.filter(|range| *range > 0) else {
        return vec![LogChunk {
            from: start,
            to: end,
        }];
    };

    let mut chunks = Vec::new();
    let mut from = start;
    loop {
        let to = from.saturating_add(max_range - 1).min(end);
        chunks.push(LogChunk { from, to });
        if to >= end {
            break;
        }
        from = to + 1;
    }
    chunks
}
