use thiserror::Error;

use crate::domain::{Amount, AmountOverflow};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Insufficient funds for {name}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        name: String,
        balance: Amount,
        requested: Amount,
    },

    #[error("Cannot transfer to yourself.")]
    SelfTransfer,

    #[error("Invalid amount: {0} (amounts must be positive)")]
    InvalidAmount(Amount),

    #[error("Amount out of range: {0}")]
    AmountOverflow(#[from] AmountOverflow),

    #[error("Customer {name} kept changing underneath the operation ({attempts} attempts)")]
    Conflict { name: String, attempts: usize },

    #[error("Store failure: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { name, .. } => LedgerError::Conflict { name, attempts: 1 },
            other => LedgerError::Store(other),
        }
    }
}
