use std::fmt;

/// Chain read/write operations a source may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    GetBlock,
    GetBlockNumber,
    GetBalance,
    GetCode,
    GetStorageAt,
    GetTransaction,
    GetTransactionCount,
    GetTransactionReceipt,
    GetLogs,
    GetGasPrice,
    Call,
    EstimateGas,
    SendTransaction,
}

impl Method {
    pub const ALL: [Method; 13] = [
        Method::GetBlock,
        Method::GetBlockNumber,
        Method::GetBalance,
        Method::GetCode,
        Method::GetStorageAt,
        Method::GetTransaction,
        Method::GetTransactionCount,
        Method::GetTransactionReceipt,
        Method::GetLogs,
        Method::GetGasPrice,
        Method::Call,
        Method::EstimateGas,
        Method::SendTransaction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GetBlock => "get_block",
            Method::GetBlockNumber => "get_block_number",
            Method::GetBalance => "get_balance",
            Method::GetCode => "get_code",
            Method::GetStorageAt => "get_storage_at",
            Method::GetTransaction => "get_transaction",
            Method::GetTransactionCount => "get_transaction_count",
            Method::GetTransactionReceipt => "get_transaction_receipt",
            Method::GetLogs => "get_logs",
            Method::GetGasPrice => "get_gas_price",
            Method::Call => "call",
            Method::EstimateGas => "estimate_gas",
            Method::SendTransaction => "send_transaction",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of [`Method`]s a source (or a union of sources) can serve.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Method::ALL.into_iter().collect()
    }

    /// Every method except the listed ones.
    pub fn all_except(excluded: &[Method]) -> Self {
        Method::ALL
            .into_iter()
            .filter(|method| !excluded.contains(method))
            .collect()
    }

    pub fn contains(&self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }

    pub fn insert(&mut self, method: Method) {
        self.0 |= method.bit();
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        Method::ALL
            .into_iter()
            .filter(move |method| self.contains(*method))
    }
}

impl FromIterator<Method> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        let mut set = Self::empty();
        for method in iter {
            set.insert(method);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_except_drops_only_listed_methods() {
        let set = CapabilitySet::all_except(&[Method::Call, Method::EstimateGas]);
        assert_eq!(set.len(), Method::ALL.len() - 2);
        assert!(!set.contains(Method::Call));
        assert!(!set.contains(Method::EstimateGas));
        assert!(set.contains(Method::GetLogs));
        assert!(set.contains(Method::SendTransaction));
    }

    #[test]
    fn union_combines_members() {
        let logs: CapabilitySet = [Method::GetLogs].into_iter().collect();
        let calls: CapabilitySet = [Method::Call, Method::GetLogs].into_iter().collect();
        let union = logs.union(calls);
        assert_eq!(union.iter().collect::<Vec<_>>(), vec![Method::GetLogs, Method::Call]);
        assert!(CapabilitySet::empty().is_empty());
        assert_eq!(CapabilitySet::all().len(), 13);
    }
}
