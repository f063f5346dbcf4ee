/*
[INPUT]:  Backend schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for backend communication
[UPDATE]: When the backend schema changes or new types added
*/

pub mod enums;
pub mod models;
pub mod requests;
pub mod responses;

pub use enums::*;
pub use models::{
    BacktestReport, OrderRecord, RiskSettings, RunningConfig, Strategy, WalletBalance,
    parse_server_time,
};
pub use requests::*;
pub use responses::*;
