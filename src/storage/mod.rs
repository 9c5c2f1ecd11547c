mod memory;
mod repository;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Customer;

pub use memory::*;
pub use repository::*;

/// SQL migration for the customers table
pub const MIGRATION_001_CUSTOMERS: &str = include_str!("migrations/001_customers.sql");

#[derive(Error, Debug)]
pub enum StoreError {
    /// The record changed since it was read; nothing from the batch was written.
    #[error("Customer {name} was modified concurrently (expected version {expected})")]
    Conflict { name: String, expected: i64 },

    #[error("Customer already exists: {0}")]
    DuplicateName(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence collaborator for customer records, keyed by unique name.
///
/// Writes are version-checked: a record read at version `n` can only be written
/// back while the stored copy is still at `n`. A record at version 0 is new and
/// is inserted.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Look a customer up by name. A missing name is `Ok(None)`, not an error.
    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError>;

    /// Commit a group of records atomically, in the given order.
    /// Returns the persisted forms with their bumped versions.
    async fn save_all(&self, customers: Vec<Customer>) -> Result<Vec<Customer>, StoreError>;

    /// Every customer, ordered by name.
    async fn list(&self) -> Result<Vec<Customer>, StoreError>;

    /// Insert or update a single record.
    async fn save(&self, customer: Customer) -> Result<Customer, StoreError> {
        let name = customer.name.clone();
        self.save_all(vec![customer])
            .await?
            .pop()
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("No record returned for {}", name)))
    }
}
