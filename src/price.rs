use std::collections::HashMap;

use anyhow::{anyhow, bail, Context};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const COINGECKO_BASE: &str = "https://api.coingecko.com";
const TOKEN_ID: &str = "ethereum";
const VS_CURRENCY: &str = "usd";

/// Current ETH/USD spot quote.
#[derive(Debug, Serialize, Clone)]
pub struct PriceQuote {
    pub pair: &'static str,
    pub usd: f64,
}

/// Body of the simple-price endpoint: token id -> currency -> value.
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    #[serde(flatten)]
    prices: HashMap<String, HashMap<String, f64>>,
}

impl SimplePriceResponse {
    fn get(&self, id: &str, currency: &str) -> Option<f64> {
        self.prices.get(id).and_then(|p| p.get(currency)).copied()
    }
}

#[derive(Clone)]
pub struct PriceClient {
    base: Url,
    http: reqwest::Client,
}

impl PriceClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base(Url::parse(COINGECKO_BASE)?)
    }

    pub fn with_base(base: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("eth-analytics")
            .build()?;
        Ok(Self { base, http })
    }

    /// Current ETH price in USD from the public simple-price endpoint.
    pub async fn eth_usd(&self) -> anyhow::Result<PriceQuote> {
        let url = self.base.join(&format!(
            "/api/v3/simple/price?ids={TOKEN_ID}&vs_currencies={VS_CURRENCY}"
        ))?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            bail!(
                "price request failed with status {}: {}",
                resp.status(),
                resp.text().await.unwrap_or_default()
            );
        }
        let body: SimplePriceResponse =
            resp.json().await.context("malformed price response")?;
        let usd = body
            .get(TOKEN_ID, VS_CURRENCY)
            .ok_or_else(|| anyhow!("price not found for {TOKEN_ID}/{VS_CURRENCY}"))?;
        Ok(PriceQuote { pair: "ETH/USD", usd })
    }
}
