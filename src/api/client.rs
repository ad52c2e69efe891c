use super::types::*;
use crate::Network;
use anyhow::{ensure, Context};
use reqwest::Url;

/// Valid range for the number of recent blocks to analyze.
pub const MIN_BLOCKS: u64 = 10;
pub const MAX_BLOCKS: u64 = 100;

#[derive(Clone)]
pub struct NodeClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl NodeClient {
    /// Client against the node provider, credential embedded in the URL path.
    pub fn new(network: Network, project_id: &str) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&format!(
            "https://{}.infura.io/v3/{}",
            network.subdomain(),
            project_id
        ))?;
        Self::with_endpoint(endpoint)
    }

    /// Client against an arbitrary JSON-RPC endpoint (local nodes, tests).
    pub fn with_endpoint(endpoint: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("eth-analytics")
            .build()?;
        Ok(Self { endpoint, http })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> anyhow::Result<T> {
        let req = RpcRequest::new(method, params);
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let envelope: RpcResponse<T> = resp.json().await?;
        envelope
            .into_result()
            .with_context(|| format!("{method} failed"))
    }

    /// Current chain head (highest known block number).
    pub async fn chain_head(&self) -> anyhow::Result<u64> {
        let qty: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_quantity(&qty)
    }

    /// Fetch one block by number. Transaction bodies are not requested;
    /// the hash list is enough for the count.
    pub async fn block_by_number(&self, number: u64) -> anyhow::Result<BlockSummary> {
        let payload: BlockPayload = self
            .call(
                "eth_getBlockByNumber",
                serde_json::json!([format!("0x{number:x}"), false]),
            )
            .await?;
        payload.summarize()
    }

    /// The `count` most recent blocks, descending from the chain head.
    /// One request per block, sequential; any failure aborts the whole fetch.
    pub async fn latest_blocks(&self, count: u64) -> anyhow::Result<Vec<BlockSummary>> {
        ensure!(
            (MIN_BLOCKS..=MAX_BLOCKS).contains(&count),
            "block count {count} outside {MIN_BLOCKS}..={MAX_BLOCKS}"
        );
        let head = self.chain_head().await?;
        ensure!(
            head >= count - 1,
            "chain head {head} lower than requested count {count}"
        );
        tracing::debug!(head, count, "fetching recent blocks");

        let mut blocks = Vec::with_capacity(count as usize);
        for i in 0..count {
            blocks.push(self.block_by_number(head - i).await?);
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> NodeClient {
        NodeClient::with_endpoint(Url::parse(&server.base_url()).unwrap()).unwrap()
    }

    fn mock_head(server: &MockServer, head: u64) {
        server.mock(|when, then| {
            when.method(POST)
                .json_body_partial(r#"{"method":"eth_blockNumber"}"#);
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0", "id": 1, "result": format!("0x{head:x}")
            }));
        });
    }

    fn mock_block(server: &MockServer, number: u64, txs: usize) {
        server.mock(|when, then| {
            when.method(POST)
                .json_body_partial(r#"{"method":"eth_getBlockByNumber"}"#)
                .body_contains(format!("\"0x{number:x}\""));
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "number": format!("0x{number:x}"),
                    "timestamp": format!("0x{:x}", 1_700_000_000u64 + 12 * number),
                    "transactions": vec![serde_json::json!("0xab"); txs],
                    "gasUsed": "0x5208",
                    "gasLimit": "0x1c9c380",
                }
            }));
        });
    }

    #[tokio::test]
    async fn chain_head_parses_quantity() {
        let server = MockServer::start();
        mock_head(&server, 110);
        assert_eq!(client(&server).chain_head().await.unwrap(), 110);
    }

    #[tokio::test]
    async fn latest_blocks_descend_from_head() {
        let server = MockServer::start();
        mock_head(&server, 110);
        for n in 101..=110u64 {
            mock_block(&server, n, 3);
        }

        let blocks = client(&server).latest_blocks(10).await.unwrap();
        assert_eq!(blocks.len(), 10);
        let numbers: Vec<u64> = blocks.iter().map(|b| b.number).collect();
        assert_eq!(numbers, (101..=110u64).rev().collect::<Vec<_>>());
        assert!(blocks.iter().all(|b| b.transaction_count == 3));
    }

    #[tokio::test]
    async fn count_outside_range_fails_before_any_request() {
        let server = MockServer::start();
        // no mocks registered: a network round-trip would error differently
        let err = client(&server).latest_blocks(5).await.unwrap_err();
        assert!(err.to_string().contains("outside"));
        let err = client(&server).latest_blocks(101).await.unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[tokio::test]
    async fn short_chain_fails() {
        let server = MockServer::start();
        mock_head(&server, 3);
        let err = client(&server).latest_blocks(10).await.unwrap_err();
        assert!(err.to_string().contains("lower than"));
    }

    #[tokio::test]
    async fn mid_sequence_failure_yields_no_partial_result() {
        let server = MockServer::start();
        mock_head(&server, 110);
        mock_block(&server, 110, 1);
        // 109 and below unmatched -> 404 from the mock server
        assert!(client(&server).latest_blocks(10).await.is_err());
    }

    #[tokio::test]
    async fn rpc_error_object_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "project ID does not exist" }
            }));
        });
        let err = client(&server).chain_head().await.unwrap_err();
        assert!(format!("{err:#}").contains("project ID does not exist"));
    }
}
