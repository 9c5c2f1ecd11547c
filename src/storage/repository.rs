use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Customer, Debts};

use super::{CustomerStore, MIGRATION_001_CUSTOMERS, StoreError};

/// SQLite-backed customer store.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_CUSTOMERS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer> {
        let id_str: String = row.get("id");
        let balance_str: String = row.get("balance");
        let debts_json: String = row.get("debts");
        let created_at_str: String = row.get("created_at");

        Ok(Customer {
            id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
            name: row.get("name"),
            balance: Decimal::from_str(&balance_str)
                .with_context(|| format!("Invalid balance: {}", balance_str))?,
            debts: serde_json::from_str::<Debts>(&debts_json).context("Invalid debts JSON")?,
            version: row.get("version"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl CustomerStore for Repository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, balance, debts, version, created_at
            FROM customers
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch customer by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_customer(&row)?)),
            None => Ok(None),
        }
    }

    async fn save_all(&self, customers: Vec<Customer>) -> Result<Vec<Customer>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let mut saved = Vec::with_capacity(customers.len());

        for mut customer in customers {
            let debts_json = serde_json::to_string(&customer.debts).context("Failed to encode debts")?;

            if customer.is_persisted() {
                let result = sqlx::query(
                    r#"
                    UPDATE customers
                    SET balance = ?, debts = ?, version = version + 1
                    WHERE id = ? AND version = ?
                    "#,
                )
                .bind(customer.balance.to_string())
                .bind(&debts_json)
                .bind(customer.id.to_string())
                .bind(customer.version)
                .execute(&mut *tx)
                .await
                .context("Failed to update customer")?;

                // Dropping the transaction rolls back anything already written
                if result.rows_affected() == 0 {
                    return Err(StoreError::Conflict {
                        name: customer.name,
                        expected: customer.version,
                    });
                }
            } else {
                let result = sqlx::query(
                    r#"
                    INSERT INTO customers (id, name, balance, debts, version, created_at)
                    VALUES (?, ?, ?, ?, 1, ?)
                    "#,
                )
                .bind(customer.id.to_string())
                .bind(&customer.name)
                .bind(customer.balance.to_string())
                .bind(&debts_json)
                .bind(customer.created_at.to_rfc3339())
                .execute(&mut *tx)
                .await;

                match result {
                    Ok(_) => {}
                    Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                        return Err(StoreError::DuplicateName(customer.name));
                    }
                    Err(err) => {
                        return Err(anyhow::Error::new(err)
                            .context("Failed to insert customer")
                            .into());
                    }
                }
            }

            customer.version += 1;
            saved.push(customer);
        }

        tx.commit().await.context("Failed to commit customers")?;
        Ok(saved)
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, balance, debts, version, created_at
            FROM customers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list customers")?;

        Ok(rows
            .iter()
            .map(Self::row_to_customer)
            .collect::<Result<Vec<_>>>()?)
    }
}
