/*
[INPUT]:  Public API exports for the tradedash-session crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod bot_config;
pub mod config;
pub mod control;
pub mod dashboard;
pub mod demo;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod portfolio;
pub mod session;
pub mod state;
pub mod status;

// Re-export main types for convenience
pub use bot_config::BotConfig;
pub use config::DashboardConfig;
pub use control::{BotControlFacade, ControlSettings};
pub use dashboard::{BacktestParams, Dashboard, DashboardSettings};
pub use demo::{DataSource, DemoGateway};
pub use error::ClientError;
pub use gateway::{BotGateway, StrategyGateway, WalletGateway};
pub use poller::{BotStatusPoller, PollerHandle, PollerSettings};
pub use portfolio::{PortfolioRefresher, PortfolioSnapshot};
pub use session::{SessionStore, WalletId};
pub use state::{ControlState, SessionSnapshot, StatusBoard};
pub use status::{BotState, BotStatus};
