/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public trading backend gateway crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{ClientConfig, Deadline, GatewayClient, GatewayError, Result};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{KlineData, MarketEvent, MarketStream, TickerData};

/// Shorten a payload for log output without splitting a UTF-8 character
pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
