use serde::{Deserialize, Serialize};

/// Registry name of a chain, e.g. "ethereum", "arbitrum" or "mychain-testnet".
///
/// Names are case-insensitive in configuration and always stored lowercase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ChainName(String);

impl ChainName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChainName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ChainName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
