use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use solana_account_decoder::{parse_token::UiTokenAmount, UiAccount, UiAccountData};
use solana_client::rpc_response::{Response as RpcResponse, RpcKeyedAccount};
use solana_sdk::commitment_config::CommitmentConfig;
use tracing::{debug, warn};

use crate::error::{HolderError, Result};
use crate::solana::client::RpcMethod;
use crate::solana::fetcher::{FetchError, RateLimitedFetcher};

/// One page of the paginated token-account listing for a mint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenAccountsPage {
    #[serde(default)]
    pub token_accounts: Vec<TokenAccountEntry>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenAccountEntry {
    pub owner: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub mint: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
}

/// The fields of a `jsonParsed` SPL token account this crate cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTokenAccount {
    pub address: String,
    pub mint: String,
    pub ui_amount: f64,
}

impl ParsedTokenAccount {
    /// Returns `None` when the account data is not a parsed token account.
    pub fn from_keyed(keyed: &RpcKeyedAccount) -> Option<Self> {
        let info = match &keyed.account.data {
            UiAccountData::Json(parsed) => parsed.parsed.get("info")?,
            _ => return None,
        };

        let mint = info.get("mint")?.as_str()?.to_string();
        let ui_amount = info
            .get("tokenAmount")
            .cloned()
            .and_then(|amount| serde_json::from_value::<UiTokenAmount>(amount).ok())
            .and_then(|amount| amount.ui_amount)
            .unwrap_or(0.0);

        Some(Self {
            address: keyed.pubkey.clone(),
            mint,
            ui_amount,
        })
    }
}

/// Typed access to the ledger methods the holder pipeline consumes.
#[derive(Clone)]
pub struct TokenLedger {
    fetcher: RateLimitedFetcher,
    commitment: CommitmentConfig,
}

impl TokenLedger {
    pub fn new(fetcher: RateLimitedFetcher) -> Self {
        Self {
            fetcher,
            commitment: CommitmentConfig::confirmed(),
        }
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    fn commitment(&self) -> String {
        self.commitment.commitment.to_string()
    }

    /// Fetch one page of token accounts for `mint`, continuing from `cursor`.
    pub async fn token_accounts_page(
        &self,
        mint: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> std::result::Result<TokenAccountsPage, FetchError> {
        let mut params = json!({
            "mint": mint,
            "limit": limit,
        });
        if let Some(cursor) = cursor {
            params["cursor"] = Value::String(cursor.to_string());
        }

        let value = self.fetcher.call(RpcMethod::TokenAccounts, params).await?;
        if value.is_null() {
            return Ok(TokenAccountsPage::default());
        }
        decode(RpcMethod::TokenAccounts, value)
    }

    /// All SPL token accounts owned by `owner`, jsonParsed.
    pub async fn token_accounts_by_owner(
        &self,
        owner: &str,
    ) -> std::result::Result<Vec<RpcKeyedAccount>, FetchError> {
        let filter = json!({ "programId": spl_token::id().to_string() });
        self.owner_accounts(owner, filter).await
    }

    /// Token accounts owned by `owner` restricted to a single mint.
    pub async fn token_accounts_by_owner_for_mint(
        &self,
        owner: &str,
        mint: &str,
    ) -> std::result::Result<Vec<RpcKeyedAccount>, FetchError> {
        self.owner_accounts(owner, json!({ "mint": mint })).await
    }

    async fn owner_accounts(
        &self,
        owner: &str,
        filter: Value,
    ) -> std::result::Result<Vec<RpcKeyedAccount>, FetchError> {
        let params = json!([
            owner,
            filter,
            { "encoding": "jsonParsed", "commitment": self.commitment() }
        ]);
        let value = self.fetcher.call(RpcMethod::TokenAccountsByOwner, params).await?;
        let response: RpcResponse<Vec<RpcKeyedAccount>> =
            decode(RpcMethod::TokenAccountsByOwner, value)?;
        Ok(response.value)
    }

    /// Native balance in lamports.
    pub async fn balance(&self, address: &str) -> std::result::Result<u64, FetchError> {
        let value = self
            .fetcher
            .call(
                RpcMethod::Balance,
                json!([address, { "commitment": self.commitment() }]),
            )
            .await?;
        let response: RpcResponse<u64> = decode(RpcMethod::Balance, value)?;
        Ok(response.value)
    }

    /// Native balance in lamports, 0 when the call fails.
    pub async fn balance_or_zero(&self, address: &str) -> u64 {
        match self.balance(address).await {
            Ok(lamports) => lamports,
            Err(e) => {
                warn!("Error fetching balance for {}: {}", address, e);
                0
            }
        }
    }

    /// Bulk account lookup; entries are `None` for addresses with no account.
    pub async fn multiple_accounts(
        &self,
        addresses: &[String],
    ) -> std::result::Result<Vec<Option<UiAccount>>, FetchError> {
        let params = json!([
            addresses,
            { "encoding": "base64", "commitment": self.commitment() }
        ]);
        let value = self.fetcher.call(RpcMethod::MultipleAccounts, params).await?;
        let response: RpcResponse<Vec<Option<UiAccount>>> =
            decode(RpcMethod::MultipleAccounts, value)?;
        Ok(response.value)
    }

    /// Decimals of a mint, read from its parsed account info.
    pub async fn token_decimals(&self, mint: &str) -> Result<u8> {
        let params = json!([
            mint,
            { "encoding": "jsonParsed", "commitment": self.commitment() }
        ]);
        let value = self.fetcher.call(RpcMethod::AccountInfo, params).await?;
        let response: RpcResponse<Option<UiAccount>> = decode(RpcMethod::AccountInfo, value)?;

        let account = response
            .value
            .ok_or_else(|| HolderError::MintNotFound(mint.to_string()))?;

        match &account.data {
            UiAccountData::Json(parsed) => parsed
                .parsed
                .get("info")
                .and_then(|info| info.get("decimals"))
                .and_then(Value::as_u64)
                .and_then(|d| u8::try_from(d).ok())
                .ok_or_else(|| HolderError::MintNotFound(mint.to_string())),
            _ => Err(HolderError::MintNotFound(mint.to_string())),
        }
    }

    /// UI amount of `mint` held by `wallet`, 0 when it holds none.
    pub async fn token_balance(&self, wallet: &str, mint: &str) -> Result<f64> {
        let accounts = self.token_accounts_by_owner_for_mint(wallet, mint).await?;

        let balance = accounts
            .iter()
            .filter_map(ParsedTokenAccount::from_keyed)
            .find(|account| account.mint == mint)
            .map(|account| account.ui_amount)
            .unwrap_or(0.0);

        debug!("Token balance of {} for mint {}: {}", wallet, mint, balance);
        Ok(balance)
    }
}

fn decode<T: DeserializeOwned>(
    method: RpcMethod,
    value: Value,
) -> std::result::Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::Decode(format!("{}: {}", method, e)))
}
