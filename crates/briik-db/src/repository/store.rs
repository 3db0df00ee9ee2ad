//! # Store Repository

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use briik_core::types::Store;

use super::confirm_id;
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct StoreRow {
    id: String,
    name: String,
    city: String,
    address: Option<String>,
    postal_code: Option<String>,
    province: Option<String>,
    country: Option<String>,
    nif: Option<String>,
    contact: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    instagram: Option<String>,
    notes: Option<String>,
    requires_re: bool,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            id: row.id,
            name: row.name,
            city: row.city,
            address: row.address,
            postal_code: row.postal_code,
            province: row.province,
            country: row.country,
            nif: row.nif,
            contact: row.contact,
            email: row.email,
            phone: row.phone,
            instagram: row.instagram,
            notes: row.notes,
            requires_re: row.requires_re,
        }
    }
}

const SELECT_STORE: &str = r#"
    SELECT id, name, city, address, postal_code, province, country,
           nif, contact, email, phone, instagram, notes, requires_re
    FROM stores
"#;

/// Repository for store database operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Store>> {
        let row: Option<StoreRow> = sqlx::query_as(&format!("{SELECT_STORE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Store::from))
    }

    /// All stores sorted by name (case-insensitive).
    pub async fn list(&self) -> DbResult<Vec<Store>> {
        let rows: Vec<StoreRow> =
            sqlx::query_as(&format!("{SELECT_STORE} ORDER BY name COLLATE NOCASE, id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Inserts or updates `store`, returning it under its confirmed id.
    pub async fn save(&self, store: &Store) -> DbResult<Store> {
        let id = confirm_id(&store.id);

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stores WHERE id = ?1)")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;

        debug!(id = %id, client_id = %store.id, exists, "Saving store");

        let sql = if exists {
            r#"
            UPDATE stores SET
                name = ?2, city = ?3, address = ?4, postal_code = ?5,
                province = ?6, country = ?7, nif = ?8, contact = ?9,
                email = ?10, phone = ?11, instagram = ?12, notes = ?13,
                requires_re = ?14, updated_at = datetime('now')
            WHERE id = ?1
            "#
        } else {
            r#"
            INSERT INTO stores (
                id, name, city, address, postal_code,
                province, country, nif, contact,
                email, phone, instagram, notes, requires_re
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#
        };

        sqlx::query(sql)
            .bind(&id)
            .bind(&store.name)
            .bind(&store.city)
            .bind(&store.address)
            .bind(&store.postal_code)
            .bind(&store.province)
            .bind(&store.country)
            .bind(&store.nif)
            .bind(&store.contact)
            .bind(&store.email)
            .bind(&store.phone)
            .bind(&store.instagram)
            .bind(&store.notes)
            .bind(store.requires_re)
            .execute(&self.pool)
            .await?;

        Ok(Store {
            id,
            ..store.clone()
        })
    }

    /// Deletes a store together with its orders, lines and deposits.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting store");

        let result = sqlx::query("DELETE FROM stores WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use briik_core::types::Store;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_confirms_local_id() {
        let db = db().await;
        let mut store = Store::new("Juguetería Sol", "Sevilla");
        store.id = "local-1".to_string();
        store.email = Some("sol@example.com".to_string());

        let saved = db.stores().save(&store).await.unwrap();
        assert_ne!(saved.id, "local-1");

        let loaded = db.stores().get_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.email.as_deref(), Some("sol@example.com"));
    }

    #[tokio::test]
    async fn test_save_twice_updates() {
        let db = db().await;
        let store = db.stores().save(&Store::new("Norte", "Oviedo")).await.unwrap();

        let mut edited = store.clone();
        edited.requires_re = true;
        edited.city = "Gijón".to_string();
        let again = db.stores().save(&edited).await.unwrap();

        assert_eq!(again.id, store.id);
        assert_eq!(db.stores().count().await.unwrap(), 1);
        let loaded = db.stores().get_by_id(&store.id).await.unwrap().unwrap();
        assert!(loaded.requires_re);
        assert_eq!(loaded.city, "Gijón");
    }

    #[tokio::test]
    async fn test_list_sorted_and_delete() {
        let db = db().await;
        let b = db.stores().save(&Store::new("beta", "X")).await.unwrap();
        db.stores().save(&Store::new("Alfa", "Y")).await.unwrap();

        let names: Vec<String> = db.stores().list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Alfa", "beta"]);

        db.stores().delete(&b.id).await.unwrap();
        assert!(db.stores().get_by_id(&b.id).await.unwrap().is_none());
        assert!(db.stores().delete(&b.id).await.is_err());
    }
}
