pub mod config;
pub mod error;
pub mod holders;
pub mod solana;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{HolderError, Result};
