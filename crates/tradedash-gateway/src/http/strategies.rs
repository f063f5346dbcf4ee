/*
[INPUT]:  Strategy definitions and ids
[OUTPUT]: Stored strategies, strategy type catalogue
[POS]:    HTTP layer - strategy management endpoints
[UPDATE]: When the strategy CRUD contract changes
*/

use crate::http::{Deadline, GatewayClient, GatewayError, Result};
use crate::types::{
    Strategy, StrategyEnvelope, StrategyPayload, StrategyToggleRequest, StrategyTypesResponse,
};
use reqwest::Method;
use tracing::info;

impl GatewayClient {
    /// GET /strategies
    pub async fn list_strategies(&self) -> Result<Vec<Strategy>> {
        let builder = self.request(Method::GET, "/strategies")?;
        let envelope = self.strategy_call(builder, Deadline::Data).await?;
        Ok(envelope.strategies.unwrap_or_default())
    }

    /// GET /strategies/{id}
    pub async fn get_strategy(&self, id: &str) -> Result<Strategy> {
        let builder = self.request(Method::GET, &strategy_path(id))?;
        let envelope = self.strategy_call(builder, Deadline::Data).await?;
        require_strategy(envelope)
    }

    /// POST /strategies
    pub async fn create_strategy(&self, strategy: &Strategy) -> Result<Strategy> {
        let payload = StrategyPayload {
            strategy: strategy.clone(),
        };
        let builder = self.request(Method::POST, "/strategies")?.json(&payload);
        let created = require_strategy(self.strategy_call(builder, Deadline::Control).await?)?;
        info!(id = ?created.id, name = %created.name, "strategy created");
        Ok(created)
    }

    /// PUT /strategies/{id}
    pub async fn update_strategy(&self, id: &str, strategy: &Strategy) -> Result<Strategy> {
        let payload = StrategyPayload {
            strategy: strategy.clone(),
        };
        let builder = self.request(Method::PUT, &strategy_path(id))?.json(&payload);
        require_strategy(self.strategy_call(builder, Deadline::Control).await?)
    }

    /// DELETE /strategies/{id}
    pub async fn delete_strategy(&self, id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &strategy_path(id))?;
        self.strategy_call(builder, Deadline::Control).await?;
        info!(id, "strategy deleted");
        Ok(())
    }

    /// POST /strategies/{id}/toggle
    pub async fn toggle_strategy(&self, id: &str, active: bool) -> Result<StrategyEnvelope> {
        let builder = self
            .request(Method::POST, &format!("{}/toggle", strategy_path(id)))?
            .json(&StrategyToggleRequest { active });
        self.strategy_call(builder, Deadline::Control).await
    }

    /// GET /strategies/types
    pub async fn strategy_types(&self) -> Result<StrategyTypesResponse> {
        let builder = self.request(Method::GET, "/strategies/types")?;
        self.send_json(builder, Deadline::Data).await
    }

    async fn strategy_call(
        &self,
        builder: reqwest::RequestBuilder,
        deadline: Deadline,
    ) -> Result<StrategyEnvelope> {
        let envelope: StrategyEnvelope = self.send_json_or_default(builder, deadline).await?;
        if envelope.is_rejected() {
            return Err(GatewayError::Api {
                status: None,
                message: envelope
                    .failure_message()
                    .unwrap_or("strategy request rejected")
                    .to_string(),
            });
        }
        Ok(envelope)
    }
}

fn strategy_path(id: &str) -> String {
    format!("/strategies/{}", encode_segment(id))
}

/// Percent-encode a path segment so ids cannot escape `/strategies/`
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn require_strategy(envelope: StrategyEnvelope) -> Result<Strategy> {
    envelope
        .strategy
        .ok_or_else(|| GatewayError::InvalidResponse("response carried no strategy".to_string()))
}

#[cfg(test)]
mod tests {
    use super::encode_segment;
    use crate::http::{ClientConfig, GatewayClient, GatewayError};
    use crate::types::Strategy;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::with_config(ClientConfig::default().with_base_url(server.uri()))
            .expect("client init")
    }

    fn grid_strategy() -> Strategy {
        Strategy {
            id: None,
            name: "ETH grid".to_string(),
            strategy_type: "grid".to_string(),
            description: String::new(),
            pair: "ETHUSDT".to_string(),
            timeframes: vec!["1h".to_string()],
            parameters: BTreeMap::new(),
            risk_settings: None,
            active: false,
        }
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("abc-123"), "abc-123");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }

    #[tokio::test]
    async fn test_list_strategies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/strategies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "strategies": [{ "id": "s1", "name": "ETH grid", "type": "grid", "active": true }]
            })))
            .mount(&server)
            .await;

        let strategies = client_for(&server)
            .list_strategies()
            .await
            .expect("list_strategies failed");

        assert_eq!(strategies.len(), 1);
        assert!(strategies[0].active);
    }

    #[tokio::test]
    async fn test_create_strategy_wraps_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/strategies"))
            .and(body_json(json!({
                "strategy": {
                    "name": "ETH grid",
                    "type": "grid",
                    "description": "",
                    "pair": "ETHUSDT",
                    "timeframes": ["1h"],
                    "parameters": {},
                    "active": false
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "strategy": { "id": "s9", "name": "ETH grid", "type": "grid" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server)
            .create_strategy(&grid_strategy())
            .await
            .expect("create_strategy failed");

        assert_eq!(created.id.as_deref(), Some("s9"));
    }

    #[tokio::test]
    async fn test_toggle_strategy_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/strategies/s1/toggle"))
            .and(body_json(json!({ "active": true })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": false, "error": "Strategy not found" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .toggle_strategy("s1", true)
            .await
            .expect_err("should be rejected");

        assert!(matches!(err, GatewayError::Api { .. }));
        assert_eq!(err.to_string(), "Strategy not found");
    }

    #[tokio::test]
    async fn test_delete_strategy_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/strategies/s1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete_strategy("s1")
            .await
            .expect("delete_strategy failed");
    }
}
