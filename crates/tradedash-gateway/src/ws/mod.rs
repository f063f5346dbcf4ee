/*
[INPUT]:  WebSocket base URL and stream parameters
[OUTPUT]: Real-time ticker and kline events
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding new streams or changing connection logic
*/

pub mod client;
pub mod message;

pub use client::MarketStream;
pub use message::{KlineData, MarketEvent, TickerData};
