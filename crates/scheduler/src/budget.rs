//! Session budget accounting.
//!
//! The engine session accumulates conversational context with every
//! turn and degrades as it approaches the engine's hard limit, so the
//! scheduler recycles it proactively based on an estimate instead of
//! waiting for the engine to fail. Two independent ceilings apply:
//! cumulative estimated tokens and a plain served-request count.

use pl_domain::config::BudgetConfig;

pub(crate) struct BudgetTracker {
    config: BudgetConfig,
    estimated_tokens: u64,
    requests: u64,
}

impl BudgetTracker {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            estimated_tokens: 0,
            requests: 0,
        }
    }

    /// Estimated marginal cost of serving `text`: a rough chars→tokens
    /// ratio, doubled to account for the expected output.
    pub fn estimate(text: &str) -> u64 {
        (text.chars().count() as u64 / 4 + 1) * 2
    }

    /// Whether a session reset must happen before a request with the
    /// given estimated cost is served.
    pub fn reset_due(&self, next_cost: u64) -> bool {
        self.estimated_tokens + next_cost > self.config.max_session_tokens
            || self.requests >= self.config.max_session_requests
    }

    /// Record one served (or timed-out) request.
    pub fn charge(&mut self, cost: u64) {
        self.estimated_tokens += cost;
        self.requests += 1;
    }

    /// Zero both counters. Called on every session recycle.
    pub fn clear(&mut self) {
        self.estimated_tokens = 0;
        self.requests = 0;
    }

    pub fn estimated_tokens(&self) -> u64 {
        self.estimated_tokens
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(max_tokens: u64, max_requests: u64) -> BudgetTracker {
        BudgetTracker::new(BudgetConfig {
            max_session_tokens: max_tokens,
            max_session_requests: max_requests,
        })
    }

    #[test]
    fn estimate_scales_with_length_and_doubles() {
        assert_eq!(BudgetTracker::estimate(""), 2);
        assert_eq!(BudgetTracker::estimate("abcd"), 4);
        assert_eq!(BudgetTracker::estimate(&"x".repeat(40)), 22);
    }

    #[test]
    fn token_ceiling_fires_on_the_crossing_request() {
        let mut t = tracker(9, 100);
        let cost = BudgetTracker::estimate("abcd"); // 4

        assert!(!t.reset_due(cost));
        t.charge(cost);
        assert!(!t.reset_due(cost)); // 4 + 4 = 8 <= 9
        t.charge(cost);
        assert!(t.reset_due(cost)); // 8 + 4 > 9
    }

    #[test]
    fn count_ceiling_fires_after_configured_requests() {
        let mut t = tracker(1_000_000, 2);
        assert!(!t.reset_due(1));
        t.charge(1);
        assert!(!t.reset_due(1));
        t.charge(1);
        assert!(t.reset_due(1));
    }

    #[test]
    fn clear_then_charge_restarts_at_triggering_cost() {
        let mut t = tracker(9, 100);
        t.charge(4);
        t.charge(4);
        assert!(t.reset_due(4));

        t.clear();
        t.charge(4);
        assert_eq!(t.estimated_tokens(), 4);
        assert_eq!(t.requests(), 1);
        assert!(!t.reset_due(4)); // fresh headroom, no loss
    }
}
