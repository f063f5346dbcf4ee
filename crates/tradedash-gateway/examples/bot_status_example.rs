/*
[INPUT]:  Backend base URL (TRADEDASH_BASE_URL, default http://localhost:5000)
[OUTPUT]: Backend health and current bot status
[POS]:    Examples - read-only backend queries
[UPDATE]: When the status or health endpoints change
*/

use tradedash_gateway::*;

/// Example: query backend health and bot status
#[tokio::main]
async fn main() {
    println!("=== tradedash bot status example ===\n");

    let base_url =
        std::env::var("TRADEDASH_BASE_URL").unwrap_or_else(|_| http::DEFAULT_BASE_URL.to_string());
    let client = match GatewayClient::with_config(ClientConfig::default().with_base_url(&base_url)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created for {}\n", client.base_url());

    match client.health().await {
        Ok(health) => println!("✓ Health: {}", health.status),
        Err(e) => println!("✗ Health check failed: {}", e),
    }

    match client.bot_status().await {
        Ok(status) => {
            println!("✓ Bot status: {}", status.status);
            if let Some(ref config) = status.config {
                println!(
                    "  {} every {}s, max {} ({})",
                    config.symbol, config.interval_seconds, config.max_amount, config.strategy
                );
            }
            if let Some(as_of) = status.as_of() {
                println!("  as of {}", as_of.to_rfc3339());
            }
        }
        Err(e) => println!("✗ Status failed: {}", e),
    }
}
