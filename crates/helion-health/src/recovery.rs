//! Bounded, backoff-respecting restart authorization.

use dashmap::DashMap;
use helion_core::{RestartLedger, Symbol};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct RecoveryPolicyConfig {
    pub max_restarts_per_hour: u32,
    pub backoff_base_sec: u64,
}

impl Default for RecoveryPolicyConfig {
    fn default() -> Self {
        Self {
            max_restarts_per_hour: 5,
            backoff_base_sec: 60,
        }
    }
}

pub struct RecoveryPolicy {
    config: RecoveryPolicyConfig,
    ledgers: DashMap<Symbol, RestartLedger>,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

impl RecoveryPolicy {
    pub fn new(config: RecoveryPolicyConfig) -> Self {
        Self {
            config,
            ledgers: DashMap::new(),
        }
    }

    /// Purges entries older than one hour. Returns `false` if the hourly
    /// cap is reached, or if the exponential-backoff gate since the last
    /// restart hasn't elapsed yet. Otherwise records `now` and returns
    /// `true`.
    pub fn should_recover(&self, symbol: &Symbol) -> bool {
        self.should_recover_at(symbol, now_unix())
    }

    pub fn should_recover_at(&self, symbol: &Symbol, now: u64) -> bool {
        let mut ledger = self.ledgers.entry(symbol.clone()).or_default();
        ledger.purge_stale(now);

        if ledger.len() as u32 >= self.config.max_restarts_per_hour {
            return false;
        }

        if !ledger.is_empty() {
            let exponent = (ledger.len() as u32).saturating_sub(1).min(10);
            let min_wait = self.config.backoff_base_sec.saturating_mul(1u64 << exponent);
            if let Some(last) = ledger.last() {
                if now.saturating_sub(last) < min_wait {
                    return false;
                }
            }
        }

        ledger.record(now);
        true
    }

    pub fn reset(&self, symbol: &Symbol) {
        if let Some(mut ledger) = self.ledgers.get_mut(symbol) {
            ledger.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym() -> Symbol {
        Symbol::new("BTC/USDT")
    }

    #[test]
    fn five_restarts_within_an_hour_then_sixth_denied() {
        let policy = RecoveryPolicy::new(RecoveryPolicyConfig {
            max_restarts_per_hour: 5,
            backoff_base_sec: 0,
        });
        let mut now = 0u64;
        for _ in 0..5 {
            assert!(policy.should_recover_at(&sym(), now));
            now += 1;
        }
        assert!(!policy.should_recover_at(&sym(), now));
    }

    #[test]
    fn backoff_gate_blocks_premature_retry() {
        let policy = RecoveryPolicy::new(RecoveryPolicyConfig {
            max_restarts_per_hour: 5,
            backoff_base_sec: 60,
        });
        assert!(policy.should_recover_at(&sym(), 0));
        // second restart requires backoff_base * 2^0 = 60s
        assert!(!policy.should_recover_at(&sym(), 30));
        assert!(policy.should_recover_at(&sym(), 60));
    }

    #[test]
    fn reset_clears_the_ledger() {
        let policy = RecoveryPolicy::new(RecoveryPolicyConfig {
            max_restarts_per_hour: 1,
            backoff_base_sec: 0,
        });
        assert!(policy.should_recover_at(&sym(), 0));
        assert!(!policy.should_recover_at(&sym(), 1));

        policy.reset(&sym());

        assert!(policy.should_recover_at(&sym(), 2));
    }

    #[test]
    fn entries_older_than_one_hour_are_purged() {
        let policy = RecoveryPolicy::new(RecoveryPolicyConfig {
            max_restarts_per_hour: 1,
            backoff_base_sec: 0,
        });
        assert!(policy.should_recover_at(&sym(), 0));
        assert!(!policy.should_recover_at(&sym(), 10));
        // past the 1-hour window, the earlier entry is purged
        assert!(policy.should_recover_at(&sym(), 3700));
    }
}
