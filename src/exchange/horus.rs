//! Horus REST API client (market data venue).
//!
//! Read-only price feed keyed by base asset. Endpoints take the asset plus
//! an interval granularity and return either the latest tick or a short
//! ordered candle series.

use crate::config::MarketDataConfig;
use crate::exchange::traits::MarketDataGateway;
use crate::exchange::types::{PriceSample, VenueError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

/// Horus market data client.
pub struct HorusClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(rename = "Success", default)]
    success: bool,
    #[serde(rename = "ErrMsg", default)]
    err_msg: String,
    #[serde(rename = "Price")]
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "Success", default)]
    success: bool,
    #[serde(rename = "ErrMsg", default)]
    err_msg: String,
    #[serde(rename = "Data", default)]
    data: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(rename = "Price")]
    price: Decimal,
    /// Unix timestamp in milliseconds.
    #[serde(rename = "Timestamp", default)]
    timestamp: i64,
}

impl HorusClient {
    /// Create a new client from configuration.
    pub fn new(config: &MarketDataConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .query(params)
            .header("HORUS-API-KEY", &self.api_key)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?
            .error_for_status()
            .with_context(|| format!("Market data venue returned an error status for {}", endpoint))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", endpoint))
    }
}

#[async_trait]
impl MarketDataGateway for HorusClient {
    #[instrument(skip(self))]
    async fn latest_price(&self, asset: &str) -> Result<Decimal> {
        let response: TickerResponse = self
            .get("/v1/ticker", &[("asset", asset.to_string())])
            .await?;

        if !response.success {
            return Err(VenueError::Api(response.err_msg).into());
        }

        response
            .price
            .with_context(|| format!("No price returned for {}", asset))
    }

    #[instrument(skip(self))]
    async fn price_history(
        &self,
        asset: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<PriceSample>> {
        let response: HistoryResponse = self
            .get(
                "/v1/market_price",
                &[
                    ("asset", asset.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        if !response.success {
            return Err(VenueError::Api(response.err_msg).into());
        }

        Ok(response
            .data
            .into_iter()
            .map(|entry| PriceSample {
                price: entry.price,
                timestamp: DateTime::from_timestamp_millis(entry.timestamp).unwrap_or_default(),
            })
            .collect())
    }
}
