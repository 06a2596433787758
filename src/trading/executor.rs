//! Buy/sell orchestration against the bonding-curve router

use super::allowance::{AllowanceCheck, AllowanceManager};
use super::clock::{Clock, SystemClock};
use super::lifecycle::{TradeLifecycle, TradeState};
use super::quoter::Quoter;
use super::types::{Quote, TradeDirection, TradeOutcome, TradeParams, TradeRequest, TradeStatus};
use crate::chain::contracts::IERC20;
use crate::chain::{
    ensure_not_cancelled, read_call, unless_cancelled, wait_for_settlement, ChainClient,
    Settlement,
};
use crate::config::TradeSettings;
use crate::ledger::{LedgerEntry, LedgerStore};
use crate::Result;
use alloy::primitives::{Address, B256, U256};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A submitted trade and the states it passed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: TradeOutcome,
    pub path: Vec<TradeState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellResult {
    /// Wallet holds none of the token; nothing was submitted or logged
    NothingToSell,
    Executed(Execution),
}

/// Runs one trade at a time: quote, optional approval, submit, settle, log
pub struct TradeExecutor {
    chain: Arc<dyn ChainClient>,
    quoter: Quoter,
    allowances: AllowanceManager,
    ledger: Arc<dyn LedgerStore>,
    settings: TradeSettings,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl TradeExecutor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        lens: Address,
        ledger: Arc<dyn LedgerStore>,
        settings: TradeSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            quoter: Quoter::new(chain.clone(), lens),
            allowances: AllowanceManager::new(
                chain.clone(),
                settings.confirmation_timeout(),
                cancel.clone(),
            ),
            chain,
            ledger,
            settings,
            clock: Arc::new(SystemClock),
            cancel,
        }
    }

    /// Replace the wall clock (deadlines and ledger timestamps)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn wallet(&self) -> Address {
        self.chain.sender()
    }

    /// Quote-only mode: no state transitions, nothing submitted
    pub async fn quote(
        &self,
        token: Address,
        amount_in: U256,
        direction: TradeDirection,
    ) -> Result<Quote> {
        self.quoter.quote(token, amount_in, direction).await
    }

    pub async fn token_balance(&self, token: Address) -> Result<U256> {
        let call = IERC20::balanceOfCall {
            account: self.wallet(),
        };
        unless_cancelled(&self.cancel, read_call(self.chain.as_ref(), token, &call)).await
    }

    async fn quote_for_trade(&self, request: &TradeRequest) -> Result<Quote> {
        unless_cancelled(
            &self.cancel,
            self.quoter
                .quote(request.token(), request.amount_in(), request.direction()),
        )
        .await
    }

    /// Spend `native_amount_in` of the native currency on `token`
    pub async fn buy(&self, token: Address, native_amount_in: U256) -> Result<Execution> {
        let request = TradeRequest::new(TradeDirection::Buy, token, native_amount_in)?;
        info!(
            token = %token,
            amount_in = %native_amount_in,
            wallet = %self.wallet(),
            "Starting buy"
        );

        let quote = self.quote_for_trade(&request).await?;
        let lifecycle = TradeLifecycle::quoted();

        self.submit_and_settle(request, quote, lifecycle).await
    }

    /// Sell the wallet's entire balance of `token`
    pub async fn sell(&self, token: Address) -> Result<SellResult> {
        let wallet = self.wallet();
        let balance = self.token_balance(token).await?;
        if balance.is_zero() {
            info!(token = %token, wallet = %wallet, "No tokens to sell");
            return Ok(SellResult::NothingToSell);
        }
        info!(token = %token, balance = %balance, wallet = %wallet, "Starting sell");

        let request = TradeRequest::new(TradeDirection::Sell, token, balance)?;
        let quote = self.quote_for_trade(&request).await?;
        let mut lifecycle = TradeLifecycle::quoted();

        // Approval must be fully confirmed before the sell is built
        let allowance = self
            .allowances
            .read_allowance(token, wallet, quote.router)
            .await?;
        if !allowance.covers(balance) {
            lifecycle.advance(TradeState::Approving)?;
            let check = self
                .allowances
                .approve(token, quote.router, balance)
                .await?;
            if let AllowanceCheck::Approved { tx_hash, .. } = check {
                info!(approval_tx = %tx_hash, "Router approved");
            }
        }

        let execution = self.submit_and_settle(request, quote, lifecycle).await?;
        Ok(SellResult::Executed(execution))
    }

    async fn submit_and_settle(
        &self,
        request: TradeRequest,
        quote: Quote,
        mut lifecycle: TradeLifecycle,
    ) -> Result<Execution> {
        let wallet = self.wallet();
        let params = TradeParams::derive(
            &request,
            &quote,
            wallet,
            &self.settings,
            self.clock.now(),
        )?;

        info!(
            direction = %params.direction,
            router = %params.router,
            amount_in = %params.amount_in,
            expected_out = %quote.amount_out,
            amount_out_min = %params.amount_out_min,
            deadline = %params.deadline,
            "Submitting trade"
        );
        ensure_not_cancelled(&self.cancel)?;
        let tx_hash = self
            .chain
            .submit(params.router, params.calldata(), params.value())
            .await?;
        lifecycle.advance(TradeState::Submitted)?;
        info!(tx_hash = %tx_hash, "Trade submitted");

        let settlement = wait_for_settlement(
            self.chain.as_ref(),
            tx_hash,
            self.settings.confirmation_timeout(),
            &self.cancel,
        )
        .await;

        let (status, block_number, state) = match &settlement {
            Settlement::Confirmed { block_number } => {
                (TradeStatus::Success, Some(*block_number), TradeState::Confirmed)
            }
            Settlement::Reverted { block_number } => {
                (TradeStatus::Reverted, Some(*block_number), TradeState::Reverted)
            }
            Settlement::Unknown(reason) => {
                warn!(tx_hash = %tx_hash, reason = %reason, "Trade settlement unknown");
                (TradeStatus::Unknown, None, TradeState::Unknown)
            }
        };
        lifecycle.advance(state)?;

        let outcome = TradeOutcome {
            id: Uuid::new_v4(),
            direction: params.direction,
            token: params.token,
            amount_in: params.amount_in,
            amount_out: quote.amount_out,
            amount_out_min: params.amount_out_min,
            tx_hash,
            status,
            block_number,
            timestamp: self.clock.now(),
            wallet,
        };

        if let Err(e) = self.ledger.append(&LedgerEntry::from(&outcome)).await {
            error!(tx_hash = %tx_hash, status = %status, error = %e, "Failed to record trade");
            return Err(e);
        }
        lifecycle.advance(TradeState::Logged)?;

        info!(
            tx_hash = %tx_hash,
            status = %status,
            block_number = ?block_number,
            "Trade recorded"
        );

        Ok(Execution {
            outcome,
            path: lifecycle.into_path(),
        })
    }

    /// Look up receipts for trades recorded as unknown
    ///
    /// Each resolved trade gains a new ledger entry with its final status; the
    /// earlier unknown entry stays as written.
    pub async fn reconcile(&self) -> Result<Vec<LedgerEntry>> {
        let entries = self.ledger.read_all().await?;
        let settled: HashSet<B256> = entries
            .iter()
            .filter(|e| e.status.is_settled())
            .map(|e| e.hash)
            .collect();

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for entry in entries.iter().filter(|e| !e.status.is_settled()) {
            if settled.contains(&entry.hash) || !seen.insert(entry.hash) {
                continue;
            }

            let receipt = unless_cancelled(&self.cancel, self.chain.receipt(entry.hash)).await?;
            let Some(confirmation) = receipt else {
                info!(tx_hash = %entry.hash, "Still pending");
                continue;
            };

            let status = if confirmation.succeeded {
                TradeStatus::Success
            } else {
                TradeStatus::Reverted
            };
            let settled_entry = entry.settled(status, confirmation.block_number, self.clock.now());
            self.ledger.append(&settled_entry).await?;
            info!(
                tx_hash = %entry.hash,
                status = %status,
                block_number = confirmation.block_number,
                "Reconciled trade"
            );
            resolved.push(settled_entry);
        }

        Ok(resolved)
    }
}
