/*
[INPUT]:  Bot start configuration
[OUTPUT]: Bot status snapshots and control acknowledgements
[POS]:    HTTP layer - bot lifecycle endpoints
[UPDATE]: When the bot control contract changes
*/

use crate::http::{Deadline, GatewayClient, GatewayError, Result};
use crate::types::{BotStartRequest, BotStatusResponse, ControlResponse};
use reqwest::Method;
use tracing::{debug, warn};

impl GatewayClient {
    /// GET /bot/status
    pub async fn bot_status(&self) -> Result<BotStatusResponse> {
        let builder = self.request(Method::GET, "/bot/status")?;
        let status: BotStatusResponse = self.send_json(builder, Deadline::Status).await?;
        debug!(status = %status.status, timestamp = ?status.timestamp, "bot status fetched");
        Ok(status)
    }

    /// POST /bot/start
    ///
    /// A 2xx reply carrying `success: false` is reported as [`GatewayError::Api`].
    pub async fn start_bot(&self, request: &BotStartRequest) -> Result<ControlResponse> {
        let builder = self.request(Method::POST, "/bot/start")?.json(request);
        let response: ControlResponse = self.send_json_or_default(builder, Deadline::Control).await?;
        accept_control(response, "bot start rejected")
    }

    /// POST /bot/stop
    pub async fn stop_bot(&self) -> Result<ControlResponse> {
        let builder = self.request(Method::POST, "/bot/stop")?;
        let response: ControlResponse = self.send_json_or_default(builder, Deadline::Control).await?;
        accept_control(response, "bot stop rejected")
    }
}

fn accept_control(response: ControlResponse, fallback: &str) -> Result<ControlResponse> {
    if response.is_rejected() {
        let message = response.failure_message().unwrap_or(fallback).to_string();
        warn!(message = %message, "bot control rejected by backend");
        return Err(GatewayError::Api {
            status: None,
            message,
        });
    }
    Ok(response)
}
