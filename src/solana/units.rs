/// Lamports per SOL. Downstream consumers expect balances divided by exactly this.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert lamports to SOL (as f64)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_is_one_billion() {
        assert_eq!(LAMPORTS_PER_SOL as f64, 1e9);
        assert_eq!(LAMPORTS_PER_SOL, solana_sdk::native_token::LAMPORTS_PER_SOL);
    }

    #[test]
    fn test_lamports_conversion() {
        assert_eq!(lamports_to_sol(LAMPORTS_PER_SOL), 1.0);
        assert_eq!(lamports_to_sol(2_500_000_000), 2.5);
        assert_eq!(lamports_to_sol(0), 0.0);
    }
}
