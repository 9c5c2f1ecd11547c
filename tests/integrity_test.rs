mod common;

use anyhow::Result;
use atm_ledger::application::LedgerError;
use atm_ledger::domain::{Amount, Customer, IntegrityIssue};
use common::{seed, test_service, Fixtures};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const NAMES: [&str; 4] = ["Alice", "Bob", "Carol", "Dave"];

/// Small deterministic generator so the operation script is reproducible
struct Script(u64);

impl Script {
    fn next(&mut self, bound: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % bound
    }

    fn amount(&mut self) -> Amount {
        // 0.5 .. 60.0 in steps of 0.5
        Decimal::new((self.next(120) as i64 + 1) * 5, 1)
    }
}

#[tokio::test]
async fn test_debts_stay_mirrored_through_mixed_operations() -> Result<()> {
    let (service, _temp) = test_service().await?;
    for name in NAMES {
        service.find_or_create(name).await?;
    }

    let mut script = Script(42);
    let mut cash_in = Amount::ZERO;
    let mut cash_out = Amount::ZERO;

    for _ in 0..200 {
        let who = NAMES[script.next(4) as usize];
        let amount = script.amount();

        match script.next(3) {
            0 => {
                service.deposit(who, amount).await?;
                cash_in += amount;
            }
            1 => match service.withdraw(who, amount).await {
                Ok(_) => cash_out += amount,
                Err(LedgerError::InsufficientFunds { .. }) => {}
                Err(err) => return Err(err.into()),
            },
            _ => {
                let target = NAMES[script.next(4) as usize];
                match service.transfer(who, target, amount).await {
                    Ok(_) | Err(LedgerError::SelfTransfer) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let report = service.check_integrity().await?;
        assert!(report.is_consistent(), "{:?}", report.issues);
        assert_eq!(report.total_balance, Some(cash_in - cash_out));
    }

    for customer in service.list_customers().await? {
        assert!(customer.balance >= Amount::ZERO);
        assert!(customer.debts.values().all(|amount| !amount.is_zero()));
    }

    Ok(())
}

#[tokio::test]
async fn test_check_reports_broken_mirror() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed(&service, Customer::new("Alice").with_debt("Bob", dec!(-70))).await?;
    seed(&service, Customer::new("Bob").with_debt("Alice", dec!(50))).await?;

    let report = service.check_integrity().await?;

    assert_eq!(report.customer_count, 2);
    assert_eq!(
        report.issues,
        vec![IntegrityIssue::AsymmetricDebt {
            customer: "Alice".into(),
            counterparty: "Bob".into(),
            recorded: dec!(-70),
            mirrored: Some(dec!(50)),
        }]
    );

    Ok(())
}

#[tokio::test]
async fn test_clean_ledger_is_consistent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    Fixtures::alice_owes_bob(&service).await?;

    service.deposit("Alice", dec!(30)).await?;
    service.transfer("Bob", "Carol", dec!(200)).await?;

    let report = service.check_integrity().await?;
    assert!(report.is_consistent(), "{:?}", report.issues);
    assert_eq!(report.customer_count, 3);
    assert_eq!(report.total_balance, Some(dec!(180)));

    Ok(())
}
