pub mod commands;

pub use commands::{BalanceSource, Cli, Commands, OutputFormat};
