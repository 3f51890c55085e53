#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliArgs, ClassArgs, Command, SlotArgs};
pub use toml_config::{ClientConfig, LogFormat};
