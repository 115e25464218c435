use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A wallet verified to hold only the target token. Keyed by `wallet_address`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExclusiveHolder {
    pub wallet_address: String,
    pub token_address: String,
    pub sol_balance: f64,
    pub token_balance: f64,
    pub open_trade: bool,
    pub created_at: DateTime<Utc>,
}

impl ExclusiveHolder {
    pub fn new(wallet_address: &str, token_address: &str, sol_balance: f64, token_balance: f64) -> Self {
        Self {
            wallet_address: wallet_address.to_string(),
            token_address: token_address.to_string(),
            sol_balance,
            token_balance,
            open_trade: false,
            created_at: Utc::now(),
        }
    }
}

/// Projection of a holder that is not currently trading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HolderBalance {
    pub wallet_address: String,
    pub sol_balance: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpenTradeType {
    Buy,
    Sell,
}

impl std::fmt::Display for OpenTradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenTradeType::Buy => write!(f, "BUY"),
            OpenTradeType::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for OpenTradeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(OpenTradeType::Buy),
            "SELL" => Ok(OpenTradeType::Sell),
            other => Err(format!("unknown trade type: {}", other)),
        }
    }
}

/// Trade log entry written by the trading subsystem; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenTrade {
    pub id: i64,
    pub wallet_address: String,
    pub sol_balance: f64,
    pub token_balance: f64,
    pub open_trade_type: OpenTradeType,
    pub token_amount: f64,
    pub sol_amount: f64,
    pub time_stamp: i64,
}

/// Balances captured when a single wallet is confirmed exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HolderSnapshot {
    pub wallet_address: String,
    pub token_mint_address: String,
    pub sol_balance: f64,
    pub token_balance: f64,
}
