/*
[INPUT]:  HTTP client configuration and backend endpoints
[OUTPUT]: HTTP responses and typed backend results
[POS]:    HTTP layer - REST communication with the trading backend
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod backtest;
pub mod bot;
pub mod client;
pub mod error;
pub mod strategies;
pub mod trading;
pub mod wallet;

pub use error::{GatewayError, Result, extract_message};

pub use client::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_CONNECT_PATH, DEFAULT_WS_URL, Deadline, GatewayClient,
};
