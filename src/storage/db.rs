use rusqlite::{params, Connection, ErrorCode};
use std::sync::{Mutex, MutexGuard};
use crate::{
    error::{HolderError, Result},
    storage::models::{ExclusiveHolder, HolderBalance, OpenTrade, OpenTradeType},
};
use chrono::Utc;

/// Identity-keyed holder store and read side of the trade log.
pub struct Database {
    conn: Mutex<Connection>,
}

/// Outcome of creating a holder record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self { conn: Mutex::new(conn) };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| HolderError::Other(anyhow::anyhow!("database lock poisoned")))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS exclusive_holders (
                wallet_address TEXT PRIMARY KEY,
                token_address TEXT NOT NULL,
                sol_balance REAL NOT NULL,
                token_balance REAL NOT NULL,
                open_trade INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS open_trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wallet_address TEXT NOT NULL,
                sol_balance REAL NOT NULL,
                token_balance REAL NOT NULL,
                open_trade_type TEXT NOT NULL CHECK (open_trade_type IN ('BUY', 'SELL')),
                token_amount REAL NOT NULL,
                sol_amount REAL NOT NULL,
                time_stamp INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_open_trade ON exclusive_holders(open_trade)",
            [],
        )?;

        Ok(())
    }

    /// Insert a holder. A duplicate wallet leaves the existing row untouched.
    pub fn create_exclusive_holder(&self, holder: &ExclusiveHolder) -> Result<CreateOutcome> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn()?.execute(
            "INSERT INTO exclusive_holders
             (wallet_address, token_address, sol_balance, token_balance, open_trade, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                holder.wallet_address,
                holder.token_address,
                holder.sol_balance,
                holder.token_balance,
                holder.open_trade,
                holder.created_at.to_rfc3339(),
                now,
            ],
        );

        match inserted {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_exclusive_holder(&self, wallet_address: &str) -> Result<Option<ExclusiveHolder>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT wallet_address, token_address, sol_balance, token_balance, open_trade, created_at
             FROM exclusive_holders
             WHERE wallet_address = ?1",
        )?;

        let mut holders = stmt.query_map([wallet_address], |row| {
            let created_at: String = row.get(5)?;
            Ok(ExclusiveHolder {
                wallet_address: row.get(0)?,
                token_address: row.get(1)?,
                sol_balance: row.get(2)?,
                token_balance: row.get(3)?,
                open_trade: row.get(4)?,
                created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
            })
        })?;

        Ok(holders.next().transpose()?)
    }

    /// Holders without an open position, projected to wallet + SOL balance.
    pub fn get_available_holders(&self) -> Result<Vec<HolderBalance>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT wallet_address, sol_balance
             FROM exclusive_holders
             WHERE open_trade = 0
             ORDER BY created_at",
        )?;

        let holders = stmt
            .query_map([], |row| {
                Ok(HolderBalance {
                    wallet_address: row.get(0)?,
                    sol_balance: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(holders)
    }

    /// Overwrite the SOL balance of an existing holder. Returns false if the wallet is unknown.
    pub fn update_sol_balance(&self, wallet_address: &str, sol_balance: f64) -> Result<bool> {
        let updated = self.conn()?.execute(
            "UPDATE exclusive_holders
             SET sol_balance = ?1, updated_at = ?2
             WHERE wallet_address = ?3",
            params![sol_balance, Utc::now().to_rfc3339(), wallet_address],
        )?;

        Ok(updated > 0)
    }

    pub fn get_open_trades(&self) -> Result<Vec<OpenTrade>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, wallet_address, sol_balance, token_balance, open_trade_type,
                    token_amount, sol_amount, time_stamp
             FROM open_trades
             ORDER BY time_stamp",
        )?;

        let trades = stmt
            .query_map([], |row| {
                let trade_type: String = row.get(4)?;
                let open_trade_type = trade_type.parse::<OpenTradeType>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        e.into(),
                    )
                })?;

                Ok(OpenTrade {
                    id: row.get(0)?,
                    wallet_address: row.get(1)?,
                    sol_balance: row.get(2)?,
                    token_balance: row.get(3)?,
                    open_trade_type,
                    token_amount: row.get(5)?,
                    sol_amount: row.get(6)?,
                    time_stamp: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(trades)
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn()?;

        let total_holders: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exclusive_holders",
            [],
            |row| row.get(0),
        )?;

        let trading_holders: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exclusive_holders WHERE open_trade = 1",
            [],
            |row| row.get(0),
        )?;

        let total_sol: Option<f64> = conn.query_row(
            "SELECT SUM(sol_balance) FROM exclusive_holders",
            [],
            |row| row.get(0),
        )?;

        let open_trades: i64 = conn.query_row(
            "SELECT COUNT(*) FROM open_trades",
            [],
            |row| row.get(0),
        )?;

        Ok(DatabaseStats {
            total_holders: total_holders as usize,
            trading_holders: trading_holders as usize,
            total_sol: total_sol.unwrap_or(0.0),
            open_trades: open_trades as usize,
        })
    }

    #[cfg(test)]
    pub(crate) fn insert_open_trade(&self, trade: &OpenTrade) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO open_trades
             (wallet_address, sol_balance, token_balance, open_trade_type, token_amount, sol_amount, time_stamp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                trade.wallet_address,
                trade.sol_balance,
                trade.token_balance,
                trade.open_trade_type.to_string(),
                trade.token_amount,
                trade.sol_amount,
                trade.time_stamp,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_open_trade(&self, wallet_address: &str, open: bool) -> Result<()> {
        self.conn()?.execute(
            "UPDATE exclusive_holders SET open_trade = ?1 WHERE wallet_address = ?2",
            params![open, wallet_address],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub total_holders: usize,
    pub trading_holders: usize,
    pub total_sol: f64,
    pub open_trades: usize,
}
