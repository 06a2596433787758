//! Per-trade state machine
//!
//! ```text
//! Quoted -> [Approving]* -> Submitted -> Confirmed | Reverted | Unknown -> Logged
//! ```

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeState {
    Quoted,
    /// Sell only: waiting on an approval transaction
    Approving,
    Submitted,
    Confirmed,
    Reverted,
    Unknown,
    Logged,
}

impl TradeState {
    pub fn can_transition_to(self, next: TradeState) -> bool {
        use TradeState::*;
        matches!(
            (self, next),
            (Quoted, Approving)
                | (Quoted, Submitted)
                | (Approving, Approving)
                | (Approving, Submitted)
                | (Submitted, Confirmed)
                | (Submitted, Reverted)
                | (Submitted, Unknown)
                | (Confirmed, Logged)
                | (Reverted, Logged)
                | (Unknown, Logged)
        )
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Path a trade has taken so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeLifecycle {
    path: Vec<TradeState>,
}

impl TradeLifecycle {
    /// A trade's lifecycle starts once it has a quote
    pub fn quoted() -> Self {
        Self {
            path: vec![TradeState::Quoted],
        }
    }

    pub fn state(&self) -> TradeState {
        // path is never empty
        self.path[self.path.len() - 1]
    }

    pub fn advance(&mut self, next: TradeState) -> Result<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(from = %current, to = %next, "Trade state transition");
        self.path.push(next);
        Ok(())
    }

    pub fn path(&self) -> &[TradeState] {
        &self.path
    }

    pub fn into_path(self) -> Vec<TradeState> {
        self.path
    }
}
