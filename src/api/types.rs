use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Parse a JSON-RPC quantity ("0x10d4f" or bare hex) into a u64.
pub fn parse_quantity(s: &str) -> anyhow::Result<u64> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        bail!("empty quantity");
    }
    u64::from_str_radix(digits, 16).with_context(|| format!("bad quantity {s:?}"))
}

#[derive(Debug, Serialize, Clone)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u32,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(method: &'static str, params: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0", id: 1, method, params }
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl<T> RpcResponse<T> {
    /// Unwrap the envelope; an error object or a missing result is fatal.
    pub fn into_result(self) -> anyhow::Result<T> {
        if let Some(e) = self.error {
            bail!("rpc error {}: {}", e.code, e.message);
        }
        self.result.context("rpc response carried no result")
    }
}

/// Raw `eth_getBlockByNumber` payload. Quantities arrive as hex strings;
/// `transactions` holds hashes when bodies are not requested.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    pub number: String,
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
    pub gas_used: String,
    pub gas_limit: String,
}

impl BlockPayload {
    pub fn summarize(&self) -> anyhow::Result<BlockSummary> {
        Ok(BlockSummary {
            number: parse_quantity(&self.number)?,
            timestamp: parse_quantity(&self.timestamp)?,
            transaction_count: self.transactions.len() as u64,
            gas_used: parse_quantity(&self.gas_used)?,
            gas_limit: parse_quantity(&self.gas_limit)?,
        })
    }
}

/// Five-field per-block summary shown on the dashboard.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub number: u64,
    pub timestamp: u64,
    pub transaction_count: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
}
