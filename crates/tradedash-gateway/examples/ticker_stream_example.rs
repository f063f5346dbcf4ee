/*
[INPUT]:  Backend WebSocket URL (TRADEDASH_WS_URL, default ws://localhost:5000)
[OUTPUT]: Ticker events printed for a few seconds
[POS]:    Examples - WebSocket stream handling
[UPDATE]: When the market stream API changes
*/

use tokio::time::{Duration, timeout};
use tradedash_gateway::*;

/// Example: follow the backend's ticker relay for BTC and ETH
#[tokio::main]
async fn main() {
    println!("=== tradedash ticker stream example ===\n");

    let ws_url =
        std::env::var("TRADEDASH_WS_URL").unwrap_or_else(|_| http::DEFAULT_WS_URL.to_string());
    let mut stream = MarketStream::new(ws_url);
    let Some(mut receiver) = stream.take_receiver() else {
        eprintln!("Receiver already taken");
        return;
    };

    if let Err(e) = stream
        .connect_ticker(&[TradingPair::BtcUsdt, TradingPair::EthUsdt])
        .await
    {
        eprintln!("✗ Connect failed: {}", e);
        return;
    }
    println!("✓ Connected, listening for 10 seconds\n");

    let listen = async {
        while let Some(event) = receiver.recv().await {
            match event {
                MarketEvent::Ticker(ticker) => {
                    println!("{} last={} high={} low={}", ticker.symbol, ticker.last_price, ticker.high, ticker.low)
                }
                MarketEvent::Kline(kline) => println!("{} candle close={}", kline.symbol, kline.close),
                MarketEvent::Other(_) => {}
            }
        }
    };
    let _ = timeout(Duration::from_secs(10), listen).await;

    stream.close().await;
    println!("\n✓ Stream closed");
}
