//! CoinMarketCap-style external asset registry client (part of C8).
//!
//! Fetches the full symbol→asset map once at construction; the result
//! is handed to [`crate::validators::external_cross_check::ExternalCrossCheck`]
//! and shared across every descriptor validated in a run.

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::CmcSettings;
use crate::error::{AppError, InfraError};
use crate::validators::external_cross_check::{CmcAssetMap, CmcAssetRecord};

/// Envelope the registry wraps its asset list in: `{"status": ...,
/// "data": [...]}`. The symbol→asset map this client returns is built
/// client-side from `data`, matching `load_coinmarketcap_assets()` in
/// the original implementation.
#[derive(Debug, Deserialize)]
struct CmcMapResponse {
    data: Vec<CmcAssetRecord>,
}

/// Thin `reqwest` client over the CoinMarketCap-style asset map
/// endpoint. The API key is read from [`CmcSettings`] rather than
/// compiled in (§9 Open Question resolution).
#[derive(Debug)]
pub struct CmcClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CmcClient {
    /// Build a client against `settings`.
    #[must_use]
    pub fn new(settings: &CmcSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    /// Fetch the full symbol→asset map in one request.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// parsed as the expected map shape.
    #[instrument(skip(self))]
    pub async fn fetch_asset_map(&self) -> Result<CmcAssetMap, AppError> {
        let url = format!("{}/v1/cryptocurrency/map", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .send()
            .await
            .map_err(InfraError::CrossCheckClient)?;

        let envelope: CmcMapResponse = response
            .error_for_status()
            .map_err(InfraError::CrossCheckClient)?
            .json()
            .await
            .map_err(InfraError::CrossCheckClient)?;

        let map: CmcAssetMap = envelope
            .data
            .into_iter()
            .map(|record| (record.symbol.clone(), record))
            .collect();

        debug!(symbols = map.len(), "fetched external asset registry");
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> CmcSettings {
        CmcSettings { base_url, api_key: "test-key".into() }
    }

    #[tokio::test]
    async fn fetches_and_parses_asset_map() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cryptocurrency/map"))
            .and(header("X-CMC_PRO_API_KEY", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": {"error_code": 0},
                "data": [
                    {
                        "symbol": "EXT",
                        "platform": {
                            "symbol": "ETH",
                            "token_address": "0x1234567890123456789012345678901234567890"
                        }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = CmcClient::new(&settings(server.uri()));
        let map = client.fetch_asset_map().await.expect("ok");

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("EXT"));
    }

    #[tokio::test]
    async fn http_error_status_surfaces_as_infra_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cryptocurrency/map"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CmcClient::new(&settings(server.uri()));
        let result = client.fetch_asset_map().await;

        assert!(result.is_err());
    }
}
