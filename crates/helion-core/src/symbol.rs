//! The dispatch key used everywhere in the engine: an opaque trading symbol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque identifier for a tradeable instrument, e.g. `"BTC/USDT"`.
///
/// Unique per engine. Cheap to clone and hash; used as the map key for
/// every per-symbol resource (queue, engine, health entry, ledger).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_raw_string() {
        let s = Symbol::new("BTC/USDT");
        assert_eq!(s.to_string(), "BTC/USDT");
        assert_eq!(s.as_str(), "BTC/USDT");
    }

    #[test]
    fn equal_symbols_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Symbol::new("ETH/USDT"));
        assert!(set.contains(&Symbol::new("ETH/USDT")));
    }
}
