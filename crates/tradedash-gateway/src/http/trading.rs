/*
[INPUT]:  Order parameters and wallet id
[OUTPUT]: Order acknowledgements and order history
[POS]:    HTTP layer - trading endpoints
[UPDATE]: When adding order types or changing the order list contract
*/

use crate::http::{Deadline, GatewayClient, Result};
use crate::types::{OrderAck, OrderList, OrderRequest, OrderSide};
use reqwest::Method;
use tracing::info;

impl GatewayClient {
    /// POST /trading/buy | /trading/sell
    pub async fn place_order(&self, side: OrderSide, request: &OrderRequest) -> Result<OrderAck> {
        let builder = self.request(Method::POST, side.endpoint())?.json(request);
        let ack: OrderAck = self.send_json(builder, Deadline::Control).await?;
        info!(
            %side,
            symbol = %request.symbol,
            quantity = %request.quantity,
            order_id = %ack.order_id,
            "order placed"
        );
        Ok(ack)
    }

    /// GET /trading/orders?wallet_id={wallet_id}&symbol={symbol}
    pub async fn list_orders(&self, wallet_id: &str, symbol: Option<&str>) -> Result<OrderList> {
        let mut builder = self
            .request(Method::GET, "/trading/orders")?
            .query(&[("wallet_id", wallet_id)]);
        if let Some(symbol) = symbol {
            builder = builder.query(&[("symbol", symbol)]);
        }
        self.send_json(builder, Deadline::Data).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{ClientConfig, GatewayClient};
    use crate::types::{OrderRequest, OrderSide, TradingPair};
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::with_config(ClientConfig::default().with_base_url(server.uri()))
            .expect("client init")
    }

    #[tokio::test]
    async fn test_place_sell_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trading/sell"))
            .and(body_json(json!({
                "symbol": "ETHUSDT",
                "quantity": 0.25,
                "wallet_id": "abc123",
                "price": 3100.0
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "orderId": 991, "status": "NEW", "symbol": "ETHUSDT" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ack = client_for(&server)
            .place_order(
                OrderSide::Sell,
                &OrderRequest {
                    symbol: TradingPair::EthUsdt,
                    quantity: Decimal::new(25, 2),
                    wallet_id: "abc123".to_string(),
                    price: Some(Decimal::from(3100)),
                },
            )
            .await
            .expect("place_order failed");

        assert_eq!(ack.order_id, "991");
        assert_eq!(ack.status.as_deref(), Some("NEW"));
        assert!(ack.extra.contains_key("symbol"));
    }

    #[tokio::test]
    async fn test_list_orders_with_symbol_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trading/orders"))
            .and(query_param("wallet_id", "abc123"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orders": [{
                    "order_id": "1",
                    "symbol": "BTCUSDT",
                    "side": "BUY",
                    "type": "MARKET",
                    "status": "FILLED",
                    "quantity": 0.001,
                    "executed_quantity": 0.001,
                    "cumulative_quote_quantity": 42.0,
                    "created_at": "2024-01-01T00:00:00"
                }],
                "count": 1,
                "timestamp": "2024-01-01T00:00:01"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let list = client_for(&server)
            .list_orders("abc123", Some("BTCUSDT"))
            .await
            .expect("list_orders failed");

        assert_eq!(list.count, 1);
        assert_eq!(list.orders[0].side, "BUY");
    }
}
