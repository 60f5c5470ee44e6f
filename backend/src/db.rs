//! Transaction scope for ledger mutations

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::AppResult;

/// Name of the partial unique index on active lot numbers
pub const ACTIVE_LOT_NUMBER_KEY: &str = "lots_active_lot_number_key";

/// Open a transaction whose lock waits give up after `lock_timeout_ms`.
///
/// Dropping the returned transaction without committing rolls it back,
/// so an early `?` return never leaves partial writes behind.
pub async fn begin_ledger_tx(
    pool: &PgPool,
    lock_timeout_ms: u64,
) -> AppResult<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SELECT set_config('lock_timeout', $1, true)")
        .bind(format!("{}ms", lock_timeout_ms))
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped
pub fn contains_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
