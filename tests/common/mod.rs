// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::{Context, Result};
use atm_ledger::application::LedgerService;
use atm_ledger::domain::{Amount, Customer};
use atm_ledger::storage::{CustomerStore, MemoryStore};
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service over an in-memory store
pub fn memory_service() -> LedgerService<MemoryStore> {
    LedgerService::new(MemoryStore::new())
}

/// Insert a customer record exactly as given
pub async fn seed<S: CustomerStore>(service: &LedgerService<S>, customer: Customer) -> Result<Customer> {
    Ok(service.store().save(customer).await?)
}

/// Read back a persisted customer
pub async fn fetch<S: CustomerStore>(service: &LedgerService<S>, name: &str) -> Result<Customer> {
    service
        .store()
        .find_by_name(name)
        .await?
        .with_context(|| format!("customer {} missing", name))
}

pub fn debt_of(customer: &Customer, counterparty: &str) -> Option<Amount> {
    customer.debts.get(counterparty).copied()
}

/// Test fixture: customers with an outstanding IOU between them
pub struct Fixtures;

impl Fixtures {
    /// Alice (balance 50) owes Bob (balance 100) 70
    pub async fn alice_owes_bob<S: CustomerStore>(service: &LedgerService<S>) -> Result<()> {
        seed(
            service,
            Customer::new("Alice")
                .with_balance(dec!(50))
                .with_debt("Bob", dec!(-70)),
        )
        .await?;
        seed(
            service,
            Customer::new("Bob")
                .with_balance(dec!(100))
                .with_debt("Alice", dec!(70)),
        )
        .await?;
        Ok(())
    }

    /// Plain customers with the given balances and no debts
    pub async fn with_balances<S: CustomerStore>(
        service: &LedgerService<S>,
        balances: &[(&str, Amount)],
    ) -> Result<()> {
        for (name, balance) in balances {
            seed(service, Customer::new(*name).with_balance(*balance)).await?;
        }
        Ok(())
    }
}
