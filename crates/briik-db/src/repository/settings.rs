//! # Settings Repository
//!
//! The catalog and billing configuration live in a single row. The invoice
//! counter has its own column and only moves forward.
//!
//! ## Invoice Counter
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session A                         Session B                           │
//! │  ─────────                         ─────────                           │
//! │  read next = 7                     read next = 7                       │
//! │  CAS(7 → 8)  ✓ rows_affected = 1                                       │
//! │                                    CAS(7 → 8)  ✗ rows_affected = 0     │
//! │                                    read next = 8, retry CAS(8 → 9) ✓   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use briik_core::catalog::AppSettings;

use super::to_u32;
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct SettingsRow {
    version: String,
    rules_json: String,
    billing_json: String,
    statuses_json: String,
    models_json: String,
    colors_json: String,
    line_types_json: String,
    next_invoice_number: i64,
}

impl SettingsRow {
    fn into_settings(self) -> DbResult<AppSettings> {
        let mut billing: briik_core::catalog::BillingInfo =
            serde_json::from_str(&self.billing_json)?;
        billing.next_invoice_number =
            to_u32("app_settings.next_invoice_number", self.next_invoice_number)?;

        Ok(AppSettings {
            version: self.version,
            rules: serde_json::from_str(&self.rules_json)?,
            billing,
            statuses: serde_json::from_str(&self.statuses_json)?,
            models: serde_json::from_str(&self.models_json)?,
            colors: serde_json::from_str(&self.colors_json)?,
            line_types: serde_json::from_str(&self.line_types_json)?,
        })
    }
}

/// Repository for the settings row and the invoice counter.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Stored settings, or `None` before the first save.
    pub async fn load(&self) -> DbResult<Option<AppSettings>> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r#"
            SELECT version, rules_json, billing_json, statuses_json,
                   models_json, colors_json, line_types_json, next_invoice_number
            FROM app_settings WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(SettingsRow::into_settings).transpose()
    }

    /// Writes `settings`. The stored invoice counter is kept when it is
    /// already ahead of `settings.billing.next_invoice_number`.
    ///
    /// Returns the settings as stored.
    pub async fn save(&self, settings: &AppSettings) -> DbResult<AppSettings> {
        debug!(
            version = %settings.version,
            next_invoice_number = settings.billing.next_invoice_number,
            "Saving settings"
        );

        sqlx::query(
            r#"
            INSERT INTO app_settings (
                id, version, rules_json, billing_json, statuses_json,
                models_json, colors_json, line_types_json, next_invoice_number
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                version = excluded.version,
                rules_json = excluded.rules_json,
                billing_json = excluded.billing_json,
                statuses_json = excluded.statuses_json,
                models_json = excluded.models_json,
                colors_json = excluded.colors_json,
                line_types_json = excluded.line_types_json,
                next_invoice_number = MAX(next_invoice_number, excluded.next_invoice_number),
                updated_at = datetime('now')
            "#,
        )
        .bind(&settings.version)
        .bind(serde_json::to_string(&settings.rules)?)
        .bind(serde_json::to_string(&settings.billing)?)
        .bind(serde_json::to_string(&settings.statuses)?)
        .bind(serde_json::to_string(&settings.models)?)
        .bind(serde_json::to_string(&settings.colors)?)
        .bind(serde_json::to_string(&settings.line_types)?)
        .bind(i64::from(settings.billing.next_invoice_number))
        .execute(&self.pool)
        .await?;

        self.load()
            .await?
            .ok_or_else(|| DbError::not_found("Settings", "1"))
    }

    /// Current value of the invoice counter.
    pub async fn next_invoice_number(&self) -> DbResult<u32> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT next_invoice_number FROM app_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        let value = value.ok_or_else(|| DbError::not_found("Settings", "1"))?;
        to_u32("app_settings.next_invoice_number", value)
    }

    /// Moves the counter from `expected` to `next` in one statement.
    ///
    /// ## Returns
    /// * `Ok(true)` - the counter was `expected` and is now `next`
    /// * `Ok(false)` - another session moved it first; re-read and retry
    pub async fn compare_and_swap_invoice_counter(&self, expected: u32, next: u32) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE app_settings
            SET next_invoice_number = ?2, updated_at = datetime('now')
            WHERE id = 1 AND next_invoice_number = ?1
            "#,
        )
        .bind(i64::from(expected))
        .bind(i64::from(next))
        .execute(&self.pool)
        .await?;

        let swapped = result.rows_affected() == 1;
        debug!(expected, next, swapped, "Invoice counter compare-and-swap");
        Ok(swapped)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use briik_core::catalog::AppSettings;
    use briik_core::money::TaxRate;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_before_save_is_none() {
        let db = db().await;
        assert!(db.settings().load().await.unwrap().is_none());
        assert!(matches!(
            db.settings().next_invoice_number().await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let db = db().await;
        let mut settings = AppSettings::default();
        settings.billing.re_rate = TaxRate::from_bps(525);
        settings.models.truncate(2);

        let stored = db.settings().save(&settings).await.unwrap();
        assert_eq!(stored, settings);
        assert_eq!(db.settings().load().await.unwrap(), Some(settings));
    }

    #[tokio::test]
    async fn test_counter_compare_and_swap() {
        let db = db().await;
        db.settings().save(&AppSettings::default()).await.unwrap();

        let settings = db.settings();
        assert_eq!(settings.next_invoice_number().await.unwrap(), 1);
        assert!(settings.compare_and_swap_invoice_counter(1, 2).await.unwrap());
        assert!(!settings.compare_and_swap_invoice_counter(1, 2).await.unwrap());
        assert_eq!(settings.next_invoice_number().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_never_moves_counter_back() {
        let db = db().await;
        let mut settings = AppSettings::default();
        settings.billing.next_invoice_number = 10;
        db.settings().save(&settings).await.unwrap();

        settings.billing.next_invoice_number = 3;
        settings.billing.invoice_prefix = "F-".into();
        let stored = db.settings().save(&settings).await.unwrap();

        assert_eq!(stored.billing.next_invoice_number, 10);
        assert_eq!(stored.billing.invoice_prefix, "F-");
    }
}
