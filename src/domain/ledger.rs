use std::collections::HashMap;
use std::fmt;

use super::{checked_add, checked_sub, Amount, AmountOverflow, Customer, Debts};

/// One payment made to a creditor while settling debts during a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub creditor: String,
    pub amount: Amount,
}

/// How a deposit is split between creditors and the depositor's own balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub payments: Vec<Payment>,
    /// What is left for the depositor's balance once debts are paid.
    pub remaining: Amount,
}

/// Split a deposit across outstanding debts before anything reaches the balance.
/// Creditors are visited in ascending name order; each takes
/// min(remaining, owed) until the deposit runs out.
pub fn plan_settlement(debts: &Debts, amount: Amount) -> Settlement {
    let mut remaining = amount;
    let mut payments = Vec::new();

    for (creditor, owed) in debts.iter().filter(|(_, owed)| **owed < Amount::ZERO) {
        if remaining <= Amount::ZERO {
            break;
        }
        let payment = remaining.min(owed.abs());
        remaining -= payment;
        payments.push(Payment {
            creditor: creditor.clone(),
            amount: payment,
        });
    }

    Settlement {
        payments,
        remaining,
    }
}

/// Split a transfer request into the part the source can cover right now and
/// the shortfall that becomes a debt. Returns `(moved, shortfall)`.
pub fn split_transfer(balance: Amount, requested: Amount) -> Result<(Amount, Amount), AmountOverflow> {
    let moved = balance.min(requested);
    Ok((moved, checked_sub(requested, moved)?))
}

/// Ledger-wide consistency findings.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityReport {
    pub customer_count: usize,
    /// Sum of all balances; `None` when it does not fit in an amount.
    pub total_balance: Option<Amount>,
    pub debt_entries: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    /// `customer.debts[counterparty]` is not the negation of the mirrored entry.
    AsymmetricDebt {
        customer: String,
        counterparty: String,
        recorded: Amount,
        mirrored: Option<Amount>,
    },
    UnknownCounterparty {
        customer: String,
        counterparty: String,
    },
    ZeroDebt {
        customer: String,
        counterparty: String,
    },
    SelfDebt {
        customer: String,
    },
    NegativeBalance {
        customer: String,
        balance: Amount,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::AsymmetricDebt {
                customer,
                counterparty,
                recorded,
                mirrored: Some(mirrored),
            } => write!(
                f,
                "{} records {} against {}, but {} records {}",
                customer, recorded, counterparty, counterparty, mirrored
            ),
            IntegrityIssue::AsymmetricDebt {
                customer,
                counterparty,
                recorded,
                mirrored: None,
            } => write!(
                f,
                "{} records {} against {}, which has no matching entry",
                customer, recorded, counterparty
            ),
            IntegrityIssue::UnknownCounterparty {
                customer,
                counterparty,
            } => write!(f, "{} has a debt with unknown customer {}", customer, counterparty),
            IntegrityIssue::ZeroDebt {
                customer,
                counterparty,
            } => write!(f, "{} keeps a zero debt entry for {}", customer, counterparty),
            IntegrityIssue::SelfDebt { customer } => write!(f, "{} owes itself", customer),
            IntegrityIssue::NegativeBalance { customer, balance } => {
                write!(f, "{} has a negative balance of {}", customer, balance)
            }
        }
    }
}

/// Check every customer's balance and debt entries against the rest of the ledger.
/// A mismatched pair is reported once, by the customer whose name sorts first.
pub fn build_integrity_report(customers: &[Customer]) -> IntegrityReport {
    let by_name: HashMap<&str, &Customer> =
        customers.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut issues = Vec::new();

    for customer in customers {
        if customer.balance < Amount::ZERO {
            issues.push(IntegrityIssue::NegativeBalance {
                customer: customer.name.clone(),
                balance: customer.balance,
            });
        }

        for (counterparty, amount) in &customer.debts {
            if *counterparty == customer.name {
                issues.push(IntegrityIssue::SelfDebt {
                    customer: customer.name.clone(),
                });
                continue;
            }
            if amount.is_zero() {
                issues.push(IntegrityIssue::ZeroDebt {
                    customer: customer.name.clone(),
                    counterparty: counterparty.clone(),
                });
                continue;
            }

            let Some(other) = by_name.get(counterparty.as_str()) else {
                issues.push(IntegrityIssue::UnknownCounterparty {
                    customer: customer.name.clone(),
                    counterparty: counterparty.clone(),
                });
                continue;
            };

            let mirrored = other.debts.get(&customer.name).copied();
            let symmetric = mirrored == Some(-*amount);
            if !symmetric && (mirrored.is_none() || customer.name < other.name) {
                issues.push(IntegrityIssue::AsymmetricDebt {
                    customer: customer.name.clone(),
                    counterparty: counterparty.clone(),
                    recorded: *amount,
                    mirrored,
                });
            }
        }
    }

    IntegrityReport {
        customer_count: customers.len(),
        total_balance: customers
            .iter()
            .try_fold(Amount::ZERO, |total, c| checked_add(total, c.balance).ok()),
        debt_entries: customers.iter().map(|c| c.debts.len()).sum(),
        issues,
    }
}
