//! Picnic storefront client
//!
//! Logs in with the account credentials on first use and keeps the session
//! token from the `x-picnic-auth` response header. A request rejected with
//! 401 logs in again once before giving up.

use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::{Client, RequestBuilder, StatusCode};
use sdk::collaborators::{Catalog, CatalogProduct};
use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

const AUTH_HEADER: &str = "x-picnic-auth";
const CLIENT_ID: u32 = 30100;

pub fn storefront_url(country_code: &str, api_version: &str) -> String {
    format!(
        "https://storefront-prod.{}.picnicinternational.com/api/{}",
        country_code.to_lowercase(),
        api_version
    )
}

/// The password travels as its MD5 hex digest
pub fn password_digest(password: &str) -> String {
    hex::encode(Md5::digest(password.as_bytes()))
}

pub struct PicnicClient {
    base_url: String,
    username: String,
    password: String,
    client: Client,
    token: Mutex<Option<String>>,
}

impl std::fmt::Debug for PicnicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PicnicClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    unit_quantity: Option<String>,
    #[serde(default)]
    display_price: Option<i64>,
}

/// Products from a search answer: a list of groups each holding `items`
pub fn flatten_search(body: &Value) -> Vec<CatalogProduct> {
    let groups = match body {
        Value::Array(groups) => groups.as_slice(),
        _ => return Vec::new(),
    };

    groups
        .iter()
        .filter_map(|group| group.get("items").and_then(Value::as_array))
        .flatten()
        .filter_map(|item| serde_json::from_value::<SearchItem>(item.clone()).ok())
        .filter_map(|item| {
            Some(CatalogProduct {
                id: item.id?,
                name: item.name?,
                unit_quantity: item.unit_quantity,
                price_cents: item.display_price,
            })
        })
        .collect()
}

impl PicnicClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            token: Mutex::new(None),
        }
    }

    pub async fn login(&self) -> Result<String, EngineError> {
        let response = self
            .client
            .post(format!("{}/user/login", self.base_url))
            .json(&json!({
                "key": self.username,
                "secret": password_digest(&self.password),
                "client_id": CLIENT_ID,
            }))
            .send()
            .await
            .map_err(|e| EngineError::Catalog(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EngineError::CatalogAuth(format!("Login rejected ({})", status)));
        }
        if !status.is_success() {
            return Err(EngineError::Catalog(format!("Login failed ({})", status)));
        }

        let token = response
            .headers()
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| EngineError::CatalogAuth("Login response has no auth token".into()))?;

        info!("Logged in to Picnic");
        *self.token.lock().await = Some(token.clone());
        Ok(token)
    }

    async fn token(&self) -> Result<String, EngineError> {
        if let Some(token) = self.token.lock().await.clone() {
            return Ok(token);
        }
        self.login().await
    }

    /// Send an authenticated request, logging in again once on 401
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, EngineError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retried = false;
        loop {
            let token = self.token().await?;
            let response = build(&self.client)
                .header(AUTH_HEADER, token)
                .send()
                .await
                .map_err(|e| EngineError::Catalog(e.to_string()))?;

            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                debug!("Picnic session expired, logging in again");
                *self.token.lock().await = None;
                retried = true;
                continue;
            }
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(EngineError::CatalogAuth("Session rejected after login".into()));
            }
            if !response.status().is_success() {
                return Err(EngineError::Catalog(format!(
                    "Picnic returned {}",
                    response.status()
                )));
            }
            return Ok(response);
        }
    }
}

#[async_trait]
impl Catalog for PicnicClient {
    async fn search(&self, term: &str) -> Result<Vec<CatalogProduct>, EngineError> {
        let url = format!("{}/search", self.base_url);
        let body: Value = self
            .send(|client| client.get(&url).query(&[("search_term", term)]))
            .await?
            .json()
            .await
            .map_err(|e| EngineError::Catalog(format!("Invalid search response: {}", e)))?;

        let products = flatten_search(&body);
        debug!(term, results = products.len(), "Picnic search");
        Ok(products)
    }

    async fn add_product(&self, product_id: &str, count: u32) -> Result<(), EngineError> {
        let url = format!("{}/cart/add_product", self.base_url);
        let payload = json!({ "product_id": product_id, "count": count });
        self.send(|client| client.post(&url).json(&payload)).await?;
        info!(product_id, count, "Added product to cart");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_digest() {
        assert_eq!(password_digest("secret"), "5ebe2294ecd0e0f08eab7690d2a6ee69");
    }

    #[test]
    fn test_storefront_url() {
        assert_eq!(
            storefront_url("NL", "15"),
            "https://storefront-prod.nl.picnicinternational.com/api/15"
        );
    }

    #[test]
    fn test_flatten_search_groups() {
        let body = json!([
            {"items": [
                {"id": "s1", "name": "Kipfilet", "unit_quantity": "300 g", "display_price": 449},
                {"type": "CATEGORY", "name": "Vlees"}
            ]},
            {"items": [{"id": "s2", "name": "Kippendijen"}]},
            {"no_items": true}
        ]);
        let products = flatten_search(&body);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price_cents, Some(449));
        assert_eq!(products[1].id, "s2");
        assert!(flatten_search(&json!({"error": "x"})).is_empty());
    }

    #[test]
    fn test_debug_hides_password() {
        let client = PicnicClient::new("http://x", "me@example.com", "hunter2");
        assert!(!format!("{:?}", client).contains("hunter2"));
    }
}
