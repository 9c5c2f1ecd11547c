use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::Customer;

use super::{CustomerStore, StoreError};

/// In-process customer store. Keeps counters of lookups and written records so
/// callers can assert on persistence side effects.
#[derive(Debug, Default)]
pub struct MemoryStore {
    customers: Mutex<BTreeMap<String, Customer>>,
    lookups: AtomicUsize,
    writes: AtomicUsize,
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_name` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of records written so far (a batch of three counts as three).
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next `save_all` fail with a backend error, writing nothing.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn customers(&self) -> Result<MutexGuard<'_, BTreeMap<String, Customer>>, StoreError> {
        self.customers
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("Memory store lock poisoned")))
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.customers()?.get(name).cloned())
    }

    async fn save_all(&self, customers: Vec<Customer>) -> Result<Vec<Customer>, StoreError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("Injected write failure")));
        }

        let mut stored = self.customers()?;

        // Validate the whole batch first so a conflict leaves nothing half-written
        for customer in &customers {
            match stored.get(&customer.name) {
                Some(existing) if !customer.is_persisted() => {
                    return Err(StoreError::DuplicateName(existing.name.clone()));
                }
                Some(existing) if existing.version != customer.version => {
                    return Err(StoreError::Conflict {
                        name: customer.name.clone(),
                        expected: customer.version,
                    });
                }
                None if customer.is_persisted() => {
                    return Err(StoreError::Conflict {
                        name: customer.name.clone(),
                        expected: customer.version,
                    });
                }
                _ => {}
            }
        }

        let mut saved = Vec::with_capacity(customers.len());
        for mut customer in customers {
            customer.version += 1;
            stored.insert(customer.name.clone(), customer.clone());
            saved.push(customer);
        }
        self.writes.fetch_add(saved.len(), Ordering::SeqCst);

        Ok(saved)
    }

    async fn list(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.customers()?.values().cloned().collect())
    }
}
