//! ジオコーディングプロキシクライアント
//!
//! `GET {host}/findNearbyPlaceNameJSON?lat=&lng=&maxRows=1&username=`

use georelay_common::error::{RelayError, RelayResult};
use georelay_common::protocol::GeoNamesResponse;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// 近傍地名を解決するクライアント
#[derive(Clone)]
pub struct GeoNamesClient {
    client: Client,
    host: String,
    username: String,
}

impl GeoNamesClient {
    /// 新しいクライアントを作成
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        timeout: Duration,
    ) -> RelayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RelayError::Network(format!("Failed to create HTTP client: {err}")))?;
        Ok(Self::with_client(client, host, username))
    }

    /// 既存のHTTPクライアントを使って作成
    pub fn with_client(
        client: Client,
        host: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            client,
            host: host.into(),
            username: username.into(),
        }
    }

    /// 最寄りの地名を取得（見つからなければ `None`）
    pub async fn nearest_place_name(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> RelayResult<Option<String>> {
        let url = format!(
            "{}/findNearbyPlaceNameJSON",
            self.host.trim_end_matches('/')
        );
        debug!(url = %url, latitude, longitude, "Looking up place name");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lng", longitude.to_string()),
                ("maxRows", "1".to_string()),
                ("username", self.username.clone()),
            ])
            .send()
            .await
            .map_err(|err| RelayError::Network(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::Network(format!("HTTP {}", response.status())));
        }

        let body: GeoNamesResponse = response
            .json()
            .await
            .map_err(|err| RelayError::Network(err.to_string()))?;
        Ok(body.nearest_place_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeoNamesClient {
        GeoNamesClient::new(server.uri(), "demo", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_nearest_place_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/findNearbyPlaceNameJSON"))
            .and(query_param("lat", "43.6532"))
            .and(query_param("lng", "-79.3832"))
            .and(query_param("maxRows", "1"))
            .and(query_param("username", "demo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "geonames": [{"name": "Toronto", "adminCode1": "08"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let name = client(&server)
            .nearest_place_name(43.6532, -79.3832)
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("Toronto, 08"));
    }

    #[tokio::test]
    async fn test_no_nearby_place() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/findNearbyPlaceNameJSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"geonames": []})))
            .mount(&server)
            .await;

        let name = client(&server).nearest_place_name(0.0, 0.0).await.unwrap();
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn test_proxy_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/findNearbyPlaceNameJSON"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server)
            .nearest_place_name(1.0, 2.0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network_failure");
    }
}
