//! On-disk shape of a ledger entry
//!
//! The dashboard renders `monAmount` (buys) or `tokenAmount` (sells) and
//! older agent versions wrote only those ether-formatted amounts, with no id or
//! raw-unit fields. Everything added since is optional so those entries still
//! parse, and keys not modelled here ride along in `extra`.

use crate::trading::{TradeDirection, TradeOutcome, TradeStatus};
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub action: TradeDirection,
    pub token: Address,

    /// Native spent (buys)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mon_amount: Option<String>,
    /// Quoted tokens out (buys)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_tokens: Option<String>,
    /// Tokens sold (sells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_amount: Option<String>,
    /// Quoted native out (sells)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_mon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal_u256")]
    pub amount_in: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal_u256")]
    pub amount_out: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "decimal_u256")]
    pub amount_out_min: Option<U256>,

    pub hash: B256,
    pub status: TradeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub wallet: Address,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LedgerEntry {
    /// Copy of this entry with a final status, as appended by reconciliation
    pub fn settled(&self, status: TradeStatus, block_number: u64, at: DateTime<Utc>) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            status,
            block_number: Some(block_number),
            timestamp: at,
            ..self.clone()
        }
    }
}

impl From<&TradeOutcome> for LedgerEntry {
    fn from(outcome: &TradeOutcome) -> Self {
        let amount_in = Some(ether_string(outcome.amount_in));
        let amount_out = Some(ether_string(outcome.amount_out));
        let (mon_amount, expected_tokens, token_amount, expected_mon) = match outcome.direction {
            TradeDirection::Buy => (amount_in, amount_out, None, None),
            TradeDirection::Sell => (None, None, amount_in, amount_out),
        };

        Self {
            id: Some(outcome.id),
            action: outcome.direction,
            token: outcome.token,
            mon_amount,
            expected_tokens,
            token_amount,
            expected_mon,
            amount_in: Some(outcome.amount_in),
            amount_out: Some(outcome.amount_out),
            amount_out_min: Some(outcome.amount_out_min),
            hash: outcome.tx_hash,
            status: outcome.status,
            block_number: outcome.block_number,
            timestamp: outcome.timestamp,
            wallet: outcome.wallet,
            extra: Map::new(),
        }
    }
}

/// 18-decimal amount with trailing zeros trimmed ("1", "0.25")
pub fn ether_string(amount: U256) -> String {
    let formatted = format_ether(amount);
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => formatted,
    }
}

/// Raw amounts persist as base-10 strings
mod decimal_u256 {
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| U256::from_str(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LEGACY_BUY: &str = r#"{
        "action": "buy",
        "token": "0x4444444444444444444444444444444444444444",
        "monAmount": "0.5",
        "expectedTokens": "1234.5",
        "hash": "0x0202020202020202020202020202020202020202020202020202020202020202",
        "status": "success",
        "timestamp": "2025-06-01T12:00:00.000Z",
        "blockNumber": 777,
        "wallet": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        "note": "manual"
    }"#;

    fn outcome(direction: TradeDirection) -> TradeOutcome {
        TradeOutcome {
            id: Uuid::new_v4(),
            direction,
            token: Address::repeat_byte(1),
            amount_in: U256::from(1_500_000_000_000_000_000u128),
            amount_out: U256::from(250_000_000_000_000_000u128),
            amount_out_min: U256::from(245_000_000_000_000_000u128),
            tx_hash: B256::repeat_byte(2),
            status: TradeStatus::Reverted,
            block_number: Some(12),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            wallet: Address::repeat_byte(4),
        }
    }

    #[test]
    fn test_buy_entry_carries_dashboard_amounts() {
        let value = serde_json::to_value(LedgerEntry::from(&outcome(TradeDirection::Buy))).unwrap();

        assert_eq!(value["action"], "buy");
        assert_eq!(value["monAmount"], "1.5");
        assert_eq!(value["expectedTokens"], "0.25");
        assert!(value.get("tokenAmount").is_none());
        assert_eq!(value["amountIn"], "1500000000000000000");
        assert_eq!(value["amountOutMin"], "245000000000000000");
        assert_eq!(value["status"], "reverted");
        assert_eq!(value["blockNumber"], 12);
        assert!(value["hash"].as_str().unwrap().starts_with("0x0202"));
    }

    #[test]
    fn test_sell_entry_carries_dashboard_amounts() {
        let value =
            serde_json::to_value(LedgerEntry::from(&outcome(TradeDirection::Sell))).unwrap();

        assert_eq!(value["action"], "sell");
        assert_eq!(value["tokenAmount"], "1.5");
        assert_eq!(value["expectedMon"], "0.25");
        assert!(value.get("monAmount").is_none());
    }

    #[test]
    fn test_unknown_entry_omits_block_number() {
        let mut pending = outcome(TradeDirection::Buy);
        pending.status = TradeStatus::Unknown;
        pending.block_number = None;

        let value = serde_json::to_value(LedgerEntry::from(&pending)).unwrap();

        assert_eq!(value["status"], "unknown");
        assert!(value.get("blockNumber").is_none());
    }

    #[test]
    fn test_legacy_entry_parses_and_keeps_its_keys() {
        let entry: LedgerEntry = serde_json::from_str(LEGACY_BUY).unwrap();

        assert_eq!(entry.id, None);
        assert_eq!(entry.action, TradeDirection::Buy);
        assert_eq!(entry.mon_amount.as_deref(), Some("0.5"));
        assert_eq!(entry.amount_in, None);
        assert_eq!(entry.block_number, Some(777));
        assert_eq!(entry.extra["note"], "manual");

        let source: Value = serde_json::from_str(LEGACY_BUY).unwrap();
        let written = serde_json::to_value(&entry).unwrap();
        for key in ["monAmount", "expectedTokens", "status", "blockNumber", "note"] {
            assert_eq!(written[key], source[key], "{key}");
        }
        assert!(written.get("id").is_none());
        assert!(written.get("amountIn").is_none());
    }

    #[test]
    fn test_settled_copy_keeps_trade_fields() {
        let entry: LedgerEntry = serde_json::from_str(LEGACY_BUY).unwrap();
        let at = Utc.timestamp_opt(1_800_000_000, 0).unwrap();

        let settled = entry.settled(TradeStatus::Reverted, 900, at);

        assert!(settled.id.is_some());
        assert_eq!(settled.status, TradeStatus::Reverted);
        assert_eq!(settled.block_number, Some(900));
        assert_eq!(settled.timestamp, at);
        assert_eq!(settled.hash, entry.hash);
        assert_eq!(settled.mon_amount, entry.mon_amount);
        assert_eq!(settled.extra, entry.extra);
    }

    #[test]
    fn test_ether_string_trims_trailing_zeros() {
        assert_eq!(ether_string(U256::ZERO), "0");
        assert_eq!(ether_string(U256::from(10u64).pow(U256::from(18u64))), "1");
        assert_eq!(ether_string(U256::from(100_000_000_000_000_000u128)), "0.1");
        assert_eq!(ether_string(U256::from(1u64)), "0.000000000000000001");
    }
}
