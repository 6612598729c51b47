pub mod app_config;
pub mod config;
pub mod inventory;

pub use app_config::{AppConfig, TelegramConfig, TokenSource};
pub use config::{load_app_config, load_app_config_from_env};
pub use inventory::{PollResult, StoreRecord, UNKNOWN_INVENTORY};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
