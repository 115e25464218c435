mod cli;

use clap::Parser;
use cli::{BalanceSource, Cli, Commands, OutputFormat};
use colored::*;
use holder_scout::{
    config::Config,
    error::{HolderError, Result},
    holders::{
        queries, BalanceSnapshotService, HolderEnumerator, HolderPipeline, HolderRecorder,
        StopSignal,
    },
    solana::{self, RateLimitedFetcher, RetryPolicy, SolanaRpcClient, TokenLedger},
    storage::{Database, FileSnapshotStore, SnapshotKind, SnapshotStore},
    utils,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("holder_scout=debug,info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init => initialize(&config).await,
        Commands::Enumerate { mint } => {
            info!("Enumerating holders of {}", mint);
            enumerate(&config, &mint).await
        }
        Commands::Discover { mint, resume } => {
            info!("Discovering exclusive holders of {}", mint);
            discover(&config, &mint, resume).await
        }
        Commands::Update {
            mint,
            wallets,
            from_candidates,
        } => update(&config, &mint, wallets, from_candidates).await,
        Commands::Check { mint, wallet } => check(&config, &mint, &wallet).await,
        Commands::Balances {
            source,
            wallets,
            format,
        } => show_balances(&config, source, wallets, format).await,
        Commands::Refresh => refresh(&config).await,
        Commands::Holders { format } => show_holders(&config, format),
        Commands::Trades { format } => show_trades(&config, format),
        Commands::Stats { format } => show_stats(&config, format),
        Commands::Decimals { mint } => show_decimals(&config, &mint).await,
        Commands::TokenBalance { wallet, mint } => show_token_balance(&config, &wallet, &mint).await,
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn build_ledger(config: &Config) -> Result<TokenLedger> {
    let endpoint = config
        .rpc_endpoint()
        .map_err(|e| HolderError::Config(e.to_string()))?;

    let client = SolanaRpcClient::new(&endpoint, config.request_timeout())?;
    let fetcher = RateLimitedFetcher::new(Arc::new(client), RetryPolicy::from_config(&config.retry));
    Ok(TokenLedger::new(fetcher).with_commitment(config.commitment_config()))
}

fn snapshot_store(config: &Config) -> Arc<FileSnapshotStore> {
    Arc::new(FileSnapshotStore::new(&config.storage.snapshot_dir))
}

fn open_database(config: &Config) -> Result<Arc<Database>> {
    Ok(Arc::new(Database::new(&config.storage.database_path)?))
}

/// First Ctrl-C stops after the current page or batch; a second one exits.
fn ctrl_c_stop_signal() -> StopSignal {
    let stop = StopSignal::new();
    let handle = stop.clone();
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if handle.is_stopped() {
                error!("Interrupted again, exiting");
                std::process::exit(130);
            }
            warn!("Interrupt received, finishing current page or batch (Ctrl-C again to exit)");
            handle.stop();
        }
    });
    stop
}

async fn initialize(config: &Config) -> Result<()> {
    println!("{}", "Initializing holder-scout...".green());
    std::fs::create_dir_all(&config.storage.snapshot_dir)?;
    println!("{}", "✓ Snapshot directory ready".green());
    let _db = Database::new(&config.storage.database_path)?;
    println!("{}", "✓ Database initialized".green());

    println!("\n{}", "Configuration:".cyan());
    match config.rpc_endpoint() {
        Ok(url) => println!("  RPC URL:          {}", utils::redact_url(&url)),
        Err(_) => println!("  RPC URL:          {}", "not configured".red()),
    }
    println!("  Commitment:       {}", config.solana.commitment);
    println!("  Retry:            {} attempts, {} ms apart", config.retry.max_attempts, config.retry.delay_ms);
    println!("  Page size:        {}", config.discovery.page_limit);
    println!("  Verify batch:     {}", config.discovery.verify_batch_size);
    println!("  Balance batch:    {}", config.discovery.balance_batch_size);
    println!("  Snapshots:        {}", config.storage.snapshot_dir.display());
    println!("  Database:         {}", config.storage.database_path);
    Ok(())
}

async fn enumerate(config: &Config, mint: &str) -> Result<()> {
    solana::parse_pubkey(mint)?;
    let store = snapshot_store(config);
    let enumerator = HolderEnumerator::new(build_ledger(config)?, store.clone(), &config.discovery)
        .with_stop_signal(ctrl_c_stop_signal());

    let report = enumerator.enumerate_holders(mint).await?;

    println!("\n{}", "=== Enumeration Results ===".cyan().bold());
    println!("Pages fetched:    {}", report.pages);
    println!("Distinct holders: {}", report.owners.len().to_string().green());
    if !report.is_complete() {
        println!("{}", format!("Incomplete: {:?}", report.end).yellow());
    }
    if report.snapshot_saved {
        println!("Saved to:         {}", store.path(SnapshotKind::TokenHolders).display());
    } else {
        println!("{}", "Kept the larger saved candidate snapshot".yellow());
    }
    Ok(())
}

async fn discover(config: &Config, mint: &str, resume: bool) -> Result<()> {
    solana::parse_pubkey(mint)?;
    let store = snapshot_store(config);
    let pipeline = HolderPipeline::new(build_ledger(config)?, store.clone(), &config.discovery)
        .with_stop_signal(ctrl_c_stop_signal());

    let report = pipeline.discover(mint, resume).await?;
    let verification = &report.verification;

    println!("\n{}", "=== Discovery Results ===".cyan().bold());
    println!("Candidates:       {}", report.candidates);
    if let Some(enumeration) = &report.enumeration {
        if !enumeration.is_complete() {
            println!("{}", format!("Enumeration incomplete: {:?}", enumeration.end).yellow());
        }
    }
    println!("Exclusive:        {} ✓", verification.exclusive.len().to_string().green());
    println!("Rejected:         {}", verification.rejected());
    if !verification.unverified.is_empty() {
        println!("Unverified:       {}", verification.unverified.len().to_string().yellow());
    }
    if verification.stopped {
        println!("{}", "Verification stopped before all batches ran".yellow());
    }
    if report.replaced {
        println!("Saved to:         {}", store.path(SnapshotKind::ExclusiveHolders).display());
    } else {
        println!(
            "{} {}",
            "Partial run merged into".yellow(),
            store.path(SnapshotKind::ExclusiveHolders).display()
        );
    }
    Ok(())
}

async fn update(config: &Config, mint: &str, wallets: Vec<String>, from_candidates: bool) -> Result<()> {
    solana::parse_pubkey(mint)?;
    let store = snapshot_store(config);

    let mut wallets = wallets;
    if from_candidates {
        wallets.extend(queries::read_token_holders(store.as_ref()));
    }
    if wallets.is_empty() {
        println!("{}", "No wallets to verify".yellow());
        return Ok(());
    }

    let pipeline = HolderPipeline::new(build_ledger(config)?, store.clone(), &config.discovery);
    let report = pipeline.update(mint, &wallets).await?;

    println!("Verified {} wallets", report.checked);
    println!("New exclusive holders: {}", report.exclusive.len().to_string().green());
    if !report.unverified.is_empty() {
        println!("Unverified:            {}", report.unverified.len().to_string().yellow());
    }
    println!("Exclusive Token Holder file has been updated");
    Ok(())
}

async fn check(config: &Config, mint: &str, wallet: &str) -> Result<()> {
    solana::parse_pubkey(mint)?;
    solana::parse_pubkey(wallet)?;
    let recorder = HolderRecorder::new(build_ledger(config)?, open_database(config)?);

    match recorder.check_and_record(mint, wallet).await {
        Some(snapshot) => {
            println!("{}", "✓ Exclusive holder".green());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("{}", "Not an exclusive holder".yellow()),
    }
    Ok(())
}

async fn show_balances(
    config: &Config,
    source: BalanceSource,
    wallets: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let wallets = if !wallets.is_empty() {
        wallets
    } else {
        match source {
            BalanceSource::Candidates => queries::read_token_holders(snapshot_store(config).as_ref()),
            BalanceSource::Exclusive => snapshot_store(config).load_or_empty(SnapshotKind::ExclusiveHolders)?,
            BalanceSource::Holders => queries::read_exclusive_holders(&*open_database(config)?)
                .into_iter()
                .map(|h| h.wallet_address)
                .collect(),
        }
    };

    let service = BalanceSnapshotService::new(build_ledger(config)?, config.discovery.balance_batch_size);
    let balances = service.snapshot_balances(&wallets).await;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&balances)?);
        return Ok(());
    }

    utils::print_table_border(70);
    utils::print_table_row(&["Wallet", "Balance"], &[46, 20]);
    utils::print_table_border(70);
    for wallet in &wallets {
        if let Some(balance) = balances.get(wallet) {
            utils::print_table_row(&[wallet.as_str(), &utils::format_sol(balance.sol)], &[46, 20]);
        }
    }
    utils::print_table_border(70);
    println!("{} of {} wallets resolved", balances.len(), wallets.len());
    Ok(())
}

async fn refresh(config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let service = BalanceSnapshotService::new(build_ledger(config)?, config.discovery.balance_batch_size);

    let summary = service.refresh_holder_balances(&db).await?;

    println!(
        "Refreshed {} of {} holder balances",
        summary.updated.to_string().green(),
        summary.requested
    );
    Ok(())
}

fn show_holders(config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config)?;
    let holders = queries::read_exclusive_holders(&db);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&holders)?);
        return Ok(());
    }

    println!("{}", "Exclusive holders without an open trade:".yellow());
    utils::print_table_border(70);
    utils::print_table_row(&["Wallet", "SOL"], &[46, 20]);
    utils::print_table_border(70);
    for holder in &holders {
        utils::print_table_row(
            &[holder.wallet_address.as_str(), &utils::format_sol(holder.sol_balance)],
            &[46, 20],
        );
    }
    utils::print_table_border(70);
    Ok(())
}

fn show_trades(config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config)?;
    let trades = queries::read_open_trades(&db);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&trades)?);
        return Ok(());
    }

    utils::print_table_border(100);
    utils::print_table_row(&["Time", "Wallet", "Type", "Tokens", "SOL"], &[24, 16, 6, 18, 18]);
    utils::print_table_border(100);
    for trade in &trades {
        utils::print_table_row(
            &[
                utils::format_unix_timestamp(trade.time_stamp).as_str(),
                &utils::format_pubkey(&trade.wallet_address),
                &trade.open_trade_type.to_string(),
                &format!("{:.4}", trade.token_amount),
                &format!("{:.9}", trade.sol_amount),
            ],
            &[24, 16, 6, 18, 18],
        );
    }
    utils::print_table_border(100);
    Ok(())
}

fn show_stats(config: &Config, format: OutputFormat) -> Result<()> {
    let db = open_database(config)?;
    let stats = db.get_stats()?;
    let store = snapshot_store(config);
    let candidates = queries::read_token_holders(store.as_ref()).len();
    let exclusive = store.load_or_empty(SnapshotKind::ExclusiveHolders)?.len();

    if format == OutputFormat::Json {
        let json = serde_json::json!({
            "database": stats,
            "candidateSnapshot": candidates,
            "exclusiveSnapshot": exclusive,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{}", "=== Holder Statistics ===".cyan().bold());
    println!("\nSnapshots:");
    println!("  Candidates:     {}", candidates);
    println!("  Exclusive list: {}", exclusive);
    println!("\nStored holders:");
    println!("  Total:          {}", stats.total_holders);
    println!("  Trading:        {}", stats.trading_holders.to_string().yellow());
    println!("  Total SOL:      {}", utils::format_sol(stats.total_sol));
    println!("\nOpen trades:      {}", stats.open_trades);
    Ok(())
}

async fn show_decimals(config: &Config, mint: &str) -> Result<()> {
    solana::parse_pubkey(mint)?;
    let decimals = build_ledger(config)?.token_decimals(mint).await?;
    println!("{} has {} decimals", mint, decimals.to_string().green());
    Ok(())
}

async fn show_token_balance(config: &Config, wallet: &str, mint: &str) -> Result<()> {
    solana::parse_pubkey(wallet)?;
    solana::parse_pubkey(mint)?;
    let balance = build_ledger(config)?.token_balance(wallet, mint).await?;
    println!("{} holds {} of {}", utils::format_pubkey(wallet), balance.to_string().green(), mint);
    Ok(())
}
