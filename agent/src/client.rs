//! タイムライン購読クライアント
//!
//! `POST {host}/subscribe` で端末の位置とトークンを登録する。

use georelay_common::error::{CommonError, RelayError, RelayResult};
use georelay_common::protocol::{SubscribeRequest, SubscribeResponse};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// 購読エンドポイントのクライアント
#[derive(Clone)]
pub struct SubscriptionClient {
    client: Client,
    host: String,
}

impl SubscriptionClient {
    /// 新しいクライアントを作成
    pub fn new(host: impl Into<String>, timeout: Duration) -> RelayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RelayError::Network(format!("Failed to create HTTP client: {err}")))?;
        Ok(Self::with_client(client, host))
    }

    /// 既存のHTTPクライアントを使って作成
    pub fn with_client(client: Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    /// 購読URL
    pub fn subscribe_url(&self) -> String {
        format!("{}/subscribe", self.host.trim_end_matches('/'))
    }

    /// 購読リクエストを送信
    ///
    /// 200以外のステータスはエラー。レスポンス本文が空なら地名なしとして扱う。
    pub async fn subscribe(&self, request: &SubscribeRequest) -> RelayResult<SubscribeResponse> {
        let url = self.subscribe_url();
        debug!(url = %url, "Sending subscribe request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| RelayError::Network(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RelayError::Network(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|err| RelayError::Network(err.to_string()))?;
        if body.trim().is_empty() {
            return Ok(SubscribeResponse::default());
        }
        Ok(serde_json::from_str(&body).map_err(CommonError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SubscribeRequest {
        SubscribeRequest {
            location_lat: 43.6532,
            location_lon: -79.3832,
            tz_offset: Some(240),
            user_token: "user-token".to_string(),
            timeline_token: "timeline-token".to_string(),
        }
    }

    fn client(server: &MockServer) -> SubscriptionClient {
        SubscriptionClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_subscribe_url_trims_trailing_slash() {
        let client = SubscriptionClient::with_client(Client::new(), "https://timeline.example.com/");
        assert_eq!(client.subscribe_url(), "https://timeline.example.com/subscribe");
    }

    #[tokio::test]
    async fn test_subscribe_returns_geoname() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subscribe"))
            .and(body_json(json!({
                "location_lat": 43.6532,
                "location_lon": -79.3832,
                "tz_offset": 240,
                "user_token": "user-token",
                "timeline_token": "timeline-token"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"location_geoname": "Toronto, ON"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).subscribe(&request()).await.unwrap();
        assert_eq!(response.location_geoname.as_deref(), Some("Toronto, ON"));
    }

    #[tokio::test]
    async fn test_subscribe_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subscribe"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = client(&server).subscribe(&request()).await.unwrap();
        assert_eq!(response, SubscribeResponse::default());
    }

    #[tokio::test]
    async fn test_subscribe_non_200_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subscribe"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let err = client(&server).subscribe(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "network_failure");
        assert!(err.to_string().contains("201"));
    }

    #[tokio::test]
    async fn test_subscribe_transport_error() {
        let client = SubscriptionClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.subscribe(&request()).await.unwrap_err();
        assert_eq!(err.kind(), "network_failure");
    }
}
