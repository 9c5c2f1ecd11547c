use serde::{Deserialize, Serialize};

use super::{Amount, Customer, Debts};

/// Read view handed back to callers after every ledger operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub name: String,
    pub balance: Amount,
    pub debt_info: Vec<String>,
}

impl StatusResponse {
    pub fn from_customer(customer: &Customer, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: customer.name.clone(),
            balance: customer.balance,
            debt_info: describe_debts(&customer.debts),
        }
    }

    pub fn balance_message(balance: Amount) -> String {
        format!("Your balance is {}", balance)
    }
}

/// Render each nonzero debt entry as a human-readable line.
pub fn describe_debts(debts: &Debts) -> Vec<String> {
    debts
        .iter()
        .filter_map(|(counterparty, amount)| {
            if *amount > Amount::ZERO {
                Some(format!("Owed {} from {}", amount, counterparty))
            } else if *amount < Amount::ZERO {
                Some(format!("Owed {} to {}", amount.abs(), counterparty))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_debt_lines() {
        let customer = Customer::new("Alice")
            .with_balance(dec!(50))
            .with_debt("Bob", dec!(-40))
            .with_debt("Carol", dec!(15))
            .with_debt("Dave", dec!(0));

        let status = StatusResponse::from_customer(&customer, "hi");

        assert_eq!(status.name, "Alice");
        assert_eq!(status.balance, dec!(50));
        assert_eq!(
            status.debt_info,
            vec!["Owed 40 to Bob".to_string(), "Owed 15 from Carol".to_string()]
        );
    }

    #[test]
    fn test_balance_message() {
        assert_eq!(
            StatusResponse::balance_message(dec!(150)),
            "Your balance is 150"
        );
    }

    #[test]
    fn test_serializes_balance_as_string() {
        let status = StatusResponse::from_customer(&Customer::new("Alice"), "ok");
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["balance"], "0");
        assert_eq!(json["debt_info"], serde_json::json!([]));
    }
}
