//! Scripted chain client for unit tests
//!
//! Decodes calldata by selector, answers lens/ERC20 reads from in-memory
//! state, records every submission, and applies approvals when they confirm.

use super::contracts::{IBondingCurveRouter, IERC20, ILens};
use super::{ChainClient, Confirmation};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub const MOCK_ROUTER: Address = Address::repeat_byte(0x22);
pub const MOCK_WALLET: Address = Address::repeat_byte(0x11);
pub const MOCK_BLOCK: u64 = 4_242;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Quote,
    Balance,
    Allowance,
    Approve,
    Buy,
    Sell,
    Other,
}

fn kind_of(calldata: &[u8]) -> CallKind {
    let Some(selector) = calldata.get(..4) else {
        return CallKind::Other;
    };
    if selector == ILens::getAmountOutCall::SELECTOR {
        CallKind::Quote
    } else if selector == IERC20::balanceOfCall::SELECTOR {
        CallKind::Balance
    } else if selector == IERC20::allowanceCall::SELECTOR {
        CallKind::Allowance
    } else if selector == IERC20::approveCall::SELECTOR {
        CallKind::Approve
    } else if selector == IBondingCurveRouter::buyCall::SELECTOR {
        CallKind::Buy
    } else if selector == IBondingCurveRouter::sellCall::SELECTOR {
        CallKind::Sell
    } else {
        CallKind::Other
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub kind: CallKind,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub tx_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Read(CallKind),
    Submitted(CallKind, B256),
    Confirmed(B256),
}

#[derive(Default)]
struct State {
    amount_out: U256,
    quote_revert: Option<String>,
    balance: U256,
    allowance: U256,
    fail_reads: bool,
    revert_trades: bool,
    revert_approvals: bool,
    hang: bool,
    nonce: u8,
    pending_approvals: HashMap<B256, U256>,
    receipts: HashMap<B256, Confirmation>,
    submissions: Vec<Submission>,
    events: Vec<Event>,
}

pub struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                amount_out: U256::from(100u64),
                ..Default::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_amount_out(&self, amount: U256) {
        self.with(|s| s.amount_out = amount);
    }

    pub fn set_balance(&self, balance: U256) {
        self.with(|s| s.balance = balance);
    }

    pub fn set_allowance(&self, allowance: U256) {
        self.with(|s| s.allowance = allowance);
    }

    pub fn allowance(&self) -> U256 {
        self.with(|s| s.allowance)
    }

    pub fn revert_quotes(&self, reason: &str) {
        self.with(|s| s.quote_revert = Some(reason.to_string()));
    }

    pub fn fail_reads(&self) {
        self.with(|s| s.fail_reads = true);
    }

    pub fn revert_next_trade(&self) {
        self.with(|s| s.revert_trades = true);
    }

    pub fn revert_approvals(&self) {
        self.with(|s| s.revert_approvals = true);
    }

    pub fn hang_confirmations(&self) {
        self.with(|s| s.hang = true);
    }

    pub fn set_receipt(&self, tx_hash: B256, confirmation: Confirmation) {
        self.with(|s| s.receipts.insert(tx_hash, confirmation));
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.with(|s| s.submissions.clone())
    }

    pub fn submissions_of(&self, kind: CallKind) -> Vec<Submission> {
        self.with(|s| {
            s.submissions
                .iter()
                .filter(|sub| sub.kind == kind)
                .cloned()
                .collect()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.with(|s| s.events.clone())
    }

    pub fn reads_of(&self, kind: CallKind) -> usize {
        self.with(|s| {
            s.events
                .iter()
                .filter(|e| **e == Event::Read(kind))
                .count()
        })
    }

    fn settle(&self, tx_hash: B256) -> Confirmation {
        self.with(|s| {
            let confirmation = if let Some(amount) = s.pending_approvals.remove(&tx_hash) {
                if !s.revert_approvals {
                    s.allowance = amount;
                }
                Confirmation {
                    succeeded: !s.revert_approvals,
                    block_number: MOCK_BLOCK,
                }
            } else {
                Confirmation {
                    succeeded: !s.revert_trades,
                    block_number: MOCK_BLOCK,
                }
            };
            s.events.push(Event::Confirmed(tx_hash));
            confirmation
        })
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn sender(&self) -> Address {
        MOCK_WALLET
    }

    async fn read(&self, _contract: Address, calldata: Bytes) -> Result<Bytes> {
        let kind = kind_of(&calldata);
        self.with(|s| {
            s.events.push(Event::Read(kind));
            if s.fail_reads {
                return Err(Error::Network("connection refused".to_string()));
            }
            let encoded = match kind {
                CallKind::Quote => {
                    if let Some(reason) = &s.quote_revert {
                        return Err(Error::revert(reason.clone()));
                    }
                    (MOCK_ROUTER, s.amount_out).abi_encode_params()
                }
                CallKind::Balance => s.balance.abi_encode(),
                CallKind::Allowance => s.allowance.abi_encode(),
                _ => return Err(Error::revert("unexpected view call")),
            };
            Ok(Bytes::from(encoded))
        })
    }

    async fn submit(&self, to: Address, calldata: Bytes, value: U256) -> Result<B256> {
        let kind = kind_of(&calldata);
        self.with(|s| {
            s.nonce += 1;
            let tx_hash = B256::with_last_byte(s.nonce);
            if kind == CallKind::Approve {
                let approve = IERC20::approveCall::abi_decode(&calldata)
                    .map_err(|e| Error::Decode(e.to_string()))?;
                s.pending_approvals.insert(tx_hash, approve.amount);
            }
            s.submissions.push(Submission {
                kind,
                to,
                data: calldata,
                value,
                tx_hash,
            });
            s.events.push(Event::Submitted(kind, tx_hash));
            Ok(tx_hash)
        })
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<Confirmation>> {
        Ok(self.with(|s| s.receipts.get(&tx_hash).copied()))
    }

    async fn await_confirmation(&self, tx_hash: B256) -> Result<Confirmation> {
        if self.with(|s| s.hang) {
            std::future::pending::<()>().await;
        }
        Ok(self.settle(tx_hash))
    }
}
