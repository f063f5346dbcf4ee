/*
[INPUT]:  Exchange API credentials and wallet id
[OUTPUT]: Wallet session id, balances, backend health
[POS]:    HTTP layer - wallet and health endpoints
[UPDATE]: When the credential exchange or balance contract changes
*/

use crate::http::{Deadline, GatewayClient, Result};
use crate::types::{BalanceResponse, HealthResponse, WalletConnectRequest, WalletConnectResponse};
use reqwest::Method;
use tracing::info;

impl GatewayClient {
    /// GET /health
    pub async fn health(&self) -> Result<HealthResponse> {
        let builder = self.request(Method::GET, "/health")?;
        self.send_json(builder, Deadline::Data).await
    }

    /// Exchange credentials for a wallet id
    ///
    /// POST {connect_path}
    pub async fn connect_wallet(&self, request: &WalletConnectRequest) -> Result<WalletConnectResponse> {
        let path = self.config().connect_path.clone();
        let builder = self.request(Method::POST, &path)?.json(request);
        let response: WalletConnectResponse = self.send_json(builder, Deadline::Control).await?;
        info!(
            wallet_id = %response.wallet_id,
            testnet = request.use_testnet,
            "wallet connected"
        );
        Ok(response)
    }

    /// GET /wallet/balance?wallet_id={wallet_id}
    pub async fn wallet_balance(&self, wallet_id: &str) -> Result<BalanceResponse> {
        let builder = self
            .request(Method::GET, "/wallet/balance")?
            .query(&[("wallet_id", wallet_id)]);
        self.send_json(builder, Deadline::Data).await
    }
}
