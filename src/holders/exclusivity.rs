use solana_client::rpc_response::RpcKeyedAccount;
use tracing::debug;

use crate::solana::{FetchError, ParsedTokenAccount, TokenLedger};

/// Result of checking one wallet against a mint.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The wallet's only token account holds the mint.
    Exclusive(ParsedTokenAccount),
    NotExclusive,
    /// The lookup failed, so exclusivity is unknown.
    Unverified(FetchError),
}

/// The wallet's single token account, if it has exactly one and it holds `mint`.
///
/// Mint comparison ignores ASCII case.
pub fn exclusive_account(mint: &str, accounts: &[RpcKeyedAccount]) -> Option<ParsedTokenAccount> {
    match accounts {
        [only] => ParsedTokenAccount::from_keyed(only)
            .filter(|account| account.mint.eq_ignore_ascii_case(mint)),
        _ => None,
    }
}

/// Look up every token account of `wallet` and classify it against `mint`.
pub async fn verify_wallet(ledger: &TokenLedger, mint: &str, wallet: &str) -> Verdict {
    match ledger.token_accounts_by_owner(wallet).await {
        Ok(accounts) => match exclusive_account(mint, &accounts) {
            Some(account) => Verdict::Exclusive(account),
            None => {
                debug!("{} holds {} token account(s), not exclusive", wallet, accounts.len());
                Verdict::NotExclusive
            }
        },
        Err(e) => Verdict::Unverified(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::ledger::fixtures::token_account;

    fn keyed(address: &str, mint: &str) -> RpcKeyedAccount {
        serde_json::from_value(token_account(address, mint, 10.0)).unwrap()
    }

    #[test]
    fn test_single_matching_account_is_exclusive() {
        let accounts = vec![keyed("acc1", "MintM")];

        let account = exclusive_account("MintM", &accounts).unwrap();

        assert_eq!(account.address, "acc1");
        assert_eq!(account.ui_amount, 10.0);
    }

    #[test]
    fn test_mint_comparison_ignores_case() {
        let accounts = vec![keyed("acc1", "MintM")];
        assert!(exclusive_account("mintm", &accounts).is_some());
        assert!(exclusive_account("MINTM", &accounts).is_some());
    }

    #[test]
    fn test_zero_accounts_is_not_exclusive() {
        assert!(exclusive_account("MintM", &[]).is_none());
    }

    #[test]
    fn test_two_accounts_is_not_exclusive_even_if_both_match() {
        let accounts = vec![keyed("acc1", "MintM"), keyed("acc2", "MintM")];
        assert!(exclusive_account("MintM", &accounts).is_none());
    }

    #[test]
    fn test_single_account_of_other_mint_is_not_exclusive() {
        let accounts = vec![keyed("acc1", "MintX")];
        assert!(exclusive_account("MintM", &accounts).is_none());
    }

    #[test]
    fn test_unparsed_account_is_not_exclusive() {
        let raw: RpcKeyedAccount = serde_json::from_value(serde_json::json!({
            "pubkey": "acc1",
            "account": {
                "lamports": 1u64,
                "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "executable": false,
                "rentEpoch": 0,
                "data": ["", "base64"]
            }
        }))
        .unwrap();

        assert!(exclusive_account("MintM", &[raw]).is_none());
    }
}
