/*
[INPUT]:  Backtest parameters (strategy, symbol, date range, capital)
[OUTPUT]: Backtest performance summary
[POS]:    HTTP layer - backtesting endpoint
[UPDATE]: When the backtest contract changes
*/

use crate::http::{Deadline, GatewayClient, GatewayError, Result};
use crate::types::{BacktestReport, BacktestRequest};
use reqwest::Method;
use serde_json::Value;

impl GatewayClient {
    /// POST /backtest
    ///
    /// Some deployments wrap the summary as `{ "results": {...} }`; both shapes are accepted.
    pub async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestReport> {
        let builder = self.request(Method::POST, "/backtest")?.json(request);
        let raw: Value = self.send_json(builder, Deadline::Data).await?;
        let summary = match raw {
            Value::Object(mut map) if map.get("results").is_some_and(Value::is_object) => {
                map.remove("results").unwrap_or_default()
            }
            other => other,
        };
        if !summary.is_object() {
            return Err(GatewayError::InvalidResponse(
                "backtest summary is not an object".to_string(),
            ));
        }
        Ok(serde_json::from_value(summary)?)
    }
}
