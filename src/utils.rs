use colored::Colorize;

/// Format a SOL amount with color
pub fn format_sol(sol: f64) -> String {
    format!("{:.9} SOL", sol).yellow().to_string()
}

/// Format pubkey truncated for display
pub fn format_pubkey(pubkey: &str) -> String {
    let chars: Vec<char> = pubkey.chars().collect();
    if chars.len() <= 12 {
        pubkey.to_string()
    } else {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Endpoint URL with query values (API keys) masked.
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let masked: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) => format!("{}=***", key),
            None => pair.to_string(),
        })
        .collect();
    format!("{}?{}", base, masked.join("&"))
}

/// Format a unix timestamp (seconds) in human-readable form
pub fn format_unix_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pubkey() {
        assert_eq!(format_pubkey("short"), "short");
        assert_eq!(
            format_pubkey("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"),
            "Tokenk...3VQ5DA"
        );
    }

    #[test]
    fn test_format_pubkey_handles_multibyte_text() {
        assert_eq!(format_pubkey("ααααααββββββγγγγγγ"), "αααααα...γγγγγγ");
    }

    #[test]
    fn test_redact_url_masks_api_key() {
        assert_eq!(
            redact_url("https://mainnet.helius-rpc.com/?api-key=secret"),
            "https://mainnet.helius-rpc.com/?api-key=***"
        );
        assert_eq!(redact_url("http://localhost:8899"), "http://localhost:8899");
    }

    #[test]
    fn test_format_unix_timestamp() {
        assert_eq!(format_unix_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
