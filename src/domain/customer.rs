use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{checked_add, checked_sub, Amount, AmountOverflow};

pub type CustomerId = Uuid;

/// Signed IOUs keyed by counterparty name.
/// Negative: this customer owes the counterparty. Positive: the counterparty owes this customer.
/// Ordered by name so settlement always visits creditors the same way.
pub type Debts = BTreeMap<String, Amount>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub balance: Amount,
    pub debts: Debts,
    /// Optimistic concurrency counter. Zero means "never persisted".
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            balance: Amount::ZERO,
            debts: Debts::new(),
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_balance(mut self, balance: Amount) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_debt(mut self, counterparty: impl Into<String>, amount: Amount) -> Self {
        self.debts.insert(counterparty.into(), amount);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Amount this customer owes `creditor`, as a positive number (zero if nothing is owed).
    pub fn owed_to(&self, creditor: &str) -> Amount {
        match self.debts.get(creditor) {
            Some(amount) if *amount < Amount::ZERO => -*amount,
            _ => Amount::ZERO,
        }
    }

    /// Add cash to the balance.
    pub fn credit(&mut self, amount: Amount) -> Result<(), AmountOverflow> {
        self.balance = checked_add(self.balance, amount)?;
        Ok(())
    }

    /// Take cash out of the balance. Does not check for overdraft.
    pub fn debit(&mut self, amount: Amount) -> Result<(), AmountOverflow> {
        self.balance = checked_sub(self.balance, amount)?;
        Ok(())
    }

    /// Pay down part of what this customer owes `creditor`.
    /// Only touches an existing entry.
    pub fn pay_debt(&mut self, creditor: &str, payment: Amount) -> Result<(), AmountOverflow> {
        if let Some(entry) = self.debts.get_mut(creditor) {
            *entry = checked_add(*entry, payment)?;
        }
        Ok(())
    }

    /// Receive a settlement payment from `debtor`: the cash lands in the balance
    /// and the claim against the debtor shrinks by the same amount.
    /// Nothing changes when either side would overflow.
    pub fn receive_payment(&mut self, debtor: &str, payment: Amount) -> Result<(), AmountOverflow> {
        let balance = checked_add(self.balance, payment)?;
        let claim = match self.debts.get(debtor) {
            Some(entry) => Some(checked_sub(*entry, payment)?),
            None => None,
        };

        self.balance = balance;
        if let Some(claim) = claim {
            self.debts.insert(debtor.to_string(), claim);
        }
        Ok(())
    }

    /// Merge a signed amount into the debt entry for `counterparty`,
    /// creating the entry when missing.
    pub fn add_debt(&mut self, counterparty: &str, amount: Amount) -> Result<(), AmountOverflow> {
        let current = self.debts.get(counterparty).copied().unwrap_or(Amount::ZERO);
        self.debts
            .insert(counterparty.to_string(), checked_add(current, amount)?);
        Ok(())
    }

    /// Drop settled (zero) entries.
    pub fn prune_debts(&mut self) {
        self.debts.retain(|_, amount| !amount.is_zero());
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_new_customer_is_empty() {
        let customer = Customer::new("Alice");
        assert_eq!(customer.name, "Alice");
        assert_eq!(customer.balance, Amount::ZERO);
        assert!(customer.debts.is_empty());
        assert!(!customer.is_persisted());
    }

    #[test]
    fn test_owed_to_ignores_claims() {
        let customer = Customer::new("Alice")
            .with_debt("Bob", dec!(-70))
            .with_debt("Carol", dec!(20));

        assert_eq!(customer.owed_to("Bob"), dec!(70));
        assert_eq!(customer.owed_to("Carol"), Amount::ZERO);
        assert_eq!(customer.owed_to("Dave"), Amount::ZERO);
    }

    #[test]
    fn test_pay_debt_only_touches_existing_entry() {
        let mut customer = Customer::new("Alice").with_debt("Bob", dec!(-70));
        customer.pay_debt("Bob", dec!(30)).unwrap();
        customer.pay_debt("Carol", dec!(10)).unwrap();

        assert_eq!(customer.debts.get("Bob"), Some(&dec!(-40)));
        assert!(!customer.debts.contains_key("Carol"));
    }

    #[test]
    fn test_receive_payment_credits_balance_and_reduces_claim() {
        let mut bob = Customer::new("Bob")
            .with_balance(dec!(100))
            .with_debt("Alice", dec!(70));
        bob.receive_payment("Alice", dec!(30)).unwrap();

        assert_eq!(bob.balance, dec!(130));
        assert_eq!(bob.debts.get("Alice"), Some(&dec!(40)));
    }

    #[test]
    fn test_add_debt_accumulates() {
        let mut customer = Customer::new("Alice");
        customer.add_debt("Bob", dec!(-30)).unwrap();
        customer.add_debt("Bob", dec!(-20)).unwrap();

        assert_eq!(customer.debts.get("Bob"), Some(&dec!(-50)));
    }

    #[test]
    fn test_overflowing_payment_changes_nothing() {
        let mut bob = Customer::new("Bob")
            .with_balance(Amount::MAX)
            .with_debt("Alice", dec!(70));

        assert_eq!(bob.receive_payment("Alice", dec!(1)), Err(AmountOverflow));
        assert_eq!(bob.balance, Amount::MAX);
        assert_eq!(bob.debts.get("Alice"), Some(&dec!(70)));
    }

    #[test]
    fn test_credit_and_debit_report_overflow() {
        let mut customer = Customer::new("Alice").with_balance(Amount::MAX);
        assert_eq!(customer.credit(dec!(1)), Err(AmountOverflow));
        assert_eq!(customer.balance, Amount::MAX);

        customer.debit(dec!(1)).unwrap();
        assert_eq!(customer.balance, Amount::MAX - dec!(1));
    }

    #[test]
    fn test_prune_debts_removes_zero_entries() {
        let mut customer = Customer::new("Alice")
            .with_debt("Bob", dec!(0.00))
            .with_debt("Carol", dec!(-5));
        customer.prune_debts();

        assert_eq!(customer.debts.len(), 1);
        assert!(customer.debts.contains_key("Carol"));
    }
}
