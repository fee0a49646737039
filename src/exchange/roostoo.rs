//! Roostoo REST API client (trading venue).
//!
//! All account endpoints are signed: the request parameters (including a
//! millisecond timestamp) are sorted by key, joined as a query string, and
//! HMAC-SHA256 signed with the API secret. The signature travels in the
//! `MSG-SIGNATURE` header next to the `RST-API-KEY` header.

use crate::config::VenueConfig;
use crate::exchange::traits::AccountGateway;
use crate::exchange::types::{ExchangeInfo, OrderAck, OrderSide, Symbol, VenueError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

/// Roostoo API client for account data and order placement.
pub struct RoostooClient {
    http: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(rename = "Success", default)]
    success: bool,
    #[serde(rename = "ErrMsg", default)]
    err_msg: String,
    #[serde(rename = "Wallet", default)]
    wallet: HashMap<String, WalletEntry>,
}

#[derive(Debug, Deserialize)]
struct WalletEntry {
    #[serde(rename = "Free", default)]
    free: Decimal,
}

#[derive(Debug, Deserialize)]
struct PlaceOrderResponse {
    #[serde(rename = "Success", default)]
    success: bool,
    #[serde(rename = "ErrMsg", default)]
    err_msg: String,
    #[serde(rename = "OrderDetail")]
    order_detail: Option<OrderDetail>,
}

#[derive(Debug, Deserialize)]
struct OrderDetail {
    #[serde(rename = "OrderID")]
    order_id: Option<i64>,
    #[serde(rename = "Status", default)]
    status: String,
}

impl RoostooClient {
    /// Create a new client from configuration.
    pub fn new(config: &VenueConfig) -> Result<Self> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(VenueError::MissingCredentials.into());
        }

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// HMAC-SHA256 signature over the key-sorted query string.
    fn sign(&self, params: &[(String, String)]) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Current timestamp in milliseconds.
    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    /// Sort parameters, append the timestamp, and compute the signature.
    fn signed_params(&self, mut params: Vec<(String, String)>) -> (Vec<(String, String)>, String) {
        params.push(("timestamp".to_string(), Self::timestamp().to_string()));
        params.sort_by(|a, b| a.0.cmp(&b.0));
        let signature = self.sign(&params);
        (params, signature)
    }

    async fn signed_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(String, String)>,
    ) -> Result<T> {
        let (params, signature) = self.signed_params(params);
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .query(&params)
            .header("RST-API-KEY", &self.api_key)
            .header("MSG-SIGNATURE", signature)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?
            .error_for_status()
            .with_context(|| format!("Venue returned an error status for {}", endpoint))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", endpoint))
    }

    async fn signed_post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(String, String)>,
    ) -> Result<T> {
        let (params, signature) = self.signed_params(params);
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .http
            .post(&url)
            .form(&params)
            .header("RST-API-KEY", &self.api_key)
            .header("MSG-SIGNATURE", signature)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", endpoint))?
            .error_for_status()
            .with_context(|| format!("Venue returned an error status for {}", endpoint))?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", endpoint))
    }
}

#[async_trait]
impl AccountGateway for RoostooClient {
    #[instrument(skip(self))]
    async fn balances(&self) -> Result<HashMap<String, Decimal>> {
        let response: BalanceResponse = self.signed_get("/v3/balance", Vec::new()).await?;

        if !response.success {
            return Err(VenueError::Api(response.err_msg).into());
        }

        Ok(response
            .wallet
            .into_iter()
            .map(|(coin, entry)| (coin, entry.free))
            .collect())
    }

    #[instrument(skip(self), fields(%symbol, %side, %quantity))]
    async fn place_order(
        &self,
        symbol: &Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderAck> {
        let params = vec![
            ("pair".to_string(), symbol.pair()),
            ("side".to_string(), side.to_string()),
            ("quantity".to_string(), quantity.to_string()),
            ("type".to_string(), "MARKET".to_string()),
        ];

        debug!(%symbol, %side, %quantity, "Placing market order");

        let response: PlaceOrderResponse = self.signed_post("/v3/place_order", params).await?;

        if !response.success {
            return Err(VenueError::OrderRejected(response.err_msg).into());
        }

        let detail = response.order_detail.unwrap_or(OrderDetail {
            order_id: None,
            status: String::new(),
        });

        Ok(OrderAck {
            order_id: detail.order_id,
            status: detail.status,
        })
    }

    #[instrument(skip(self))]
    async fn exchange_info(&self) -> Result<ExchangeInfo> {
        self.signed_get("/v3/exchangeInfo", Vec::new()).await
    }
}
