use std::future::Future;

use tracing::{debug, info, warn};

use crate::domain::{
    build_integrity_report, plan_settlement, split_transfer, Amount, Customer, IntegrityReport,
    StatusResponse,
};
use crate::storage::{CustomerStore, Repository, StoreError};

use super::{LedgerConfig, LedgerError};

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, API, tests, etc.).
///
/// Every mutating operation reads the records it needs, computes the new state in
/// memory and commits all touched records as one version-checked batch. If another
/// writer got there first the whole operation is re-run from fresh reads.
pub struct LedgerService<S = Repository> {
    store: S,
    config: LedgerConfig,
}

impl LedgerService<Repository> {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await.map_err(StoreError::from)?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url)
            .await
            .map_err(StoreError::from)?;
        Ok(Self::new(repo))
    }
}

impl<S: CustomerStore> LedgerService<S> {
    /// Create a new ledger service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: LedgerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================
    // Customer operations
    // ========================

    /// Get a customer by name, creating an empty record if none exists.
    pub async fn find_or_create(&self, name: &str) -> Result<Customer, LedgerError> {
        if let Some(customer) = self.store.find_by_name(name).await? {
            return Ok(customer);
        }

        match self.store.save(Customer::new(name)).await {
            Ok(customer) => {
                info!(customer = name, "created customer");
                Ok(customer)
            }
            // Someone else created it between our read and our insert
            Err(StoreError::DuplicateName(_)) => self
                .store
                .find_by_name(name)
                .await?
                .ok_or_else(|| LedgerError::NotFound(name.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// Get an existing customer by name.
    pub async fn get_customer(&self, name: &str) -> Result<Customer, LedgerError> {
        self.store
            .find_by_name(name)
            .await?
            .ok_or_else(|| LedgerError::NotFound(name.to_string()))
    }

    /// List all customers, ordered by name.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, LedgerError> {
        Ok(self.store.list().await?)
    }

    /// Log in: there are no sessions, this only makes sure the customer exists.
    pub async fn login(&self, name: &str) -> Result<StatusResponse, LedgerError> {
        let customer = self.find_or_create(name).await?;
        Ok(StatusResponse::from_customer(
            &customer,
            format!("Hello, {}!", name),
        ))
    }

    pub fn logout(&self, name: &str) -> String {
        format!("Goodbye, {}!", name)
    }

    /// Current balance and debts of an existing customer.
    pub async fn status(&self, name: &str) -> Result<StatusResponse, LedgerError> {
        let customer = self.get_customer(name).await?;
        Ok(StatusResponse::from_customer(
            &customer,
            StatusResponse::balance_message(customer.balance),
        ))
    }

    // ========================
    // Ledger operations
    // ========================

    /// Deposit cash. Outstanding debts are paid off first, in counterparty-name
    /// order; only what is left over reaches the depositor's balance.
    /// A sum that leaves the decimal range fails with `AmountOverflow` and nothing is written.
    pub async fn deposit(&self, name: &str, amount: Amount) -> Result<StatusResponse, LedgerError> {
        self.check_amount(amount)?;
        self.retrying("deposit", || self.try_deposit(name, amount))
            .await
    }

    async fn try_deposit(&self, name: &str, amount: Amount) -> Result<StatusResponse, LedgerError> {
        let mut depositor = self.get_customer(name).await?;
        let settlement = plan_settlement(&depositor.debts, amount);
        let mut touched = Vec::with_capacity(settlement.payments.len() + 1);

        for payment in &settlement.payments {
            depositor.pay_debt(&payment.creditor, payment.amount)?;

            match self.store.find_by_name(&payment.creditor).await? {
                Some(mut creditor) => {
                    creditor.receive_payment(name, payment.amount)?;
                    creditor.prune_debts();
                    debug!(
                        debtor = name,
                        creditor = %payment.creditor,
                        amount = %payment.amount,
                        "settled debt"
                    );
                    touched.push(creditor);
                }
                None => warn!(
                    debtor = name,
                    creditor = %payment.creditor,
                    amount = %payment.amount,
                    "creditor record missing, payment applied to debtor only"
                ),
            }
        }

        depositor.credit(settlement.remaining)?;
        depositor.prune_debts();

        let status = StatusResponse::from_customer(
            &depositor,
            StatusResponse::balance_message(depositor.balance),
        );
        // Creditors first, depositor last
        touched.push(depositor);
        self.store.save_all(touched).await?;

        info!(
            customer = name,
            %amount,
            settled = settlement.payments.len(),
            balance = %status.balance,
            "deposit"
        );
        Ok(status)
    }

    /// Withdraw cash. Never overdraws: a request above the balance fails and
    /// nothing is written.
    pub async fn withdraw(&self, name: &str, amount: Amount) -> Result<StatusResponse, LedgerError> {
        self.check_amount(amount)?;
        self.retrying("withdraw", || self.try_withdraw(name, amount))
            .await
    }

    async fn try_withdraw(&self, name: &str, amount: Amount) -> Result<StatusResponse, LedgerError> {
        let mut customer = self.get_customer(name).await?;

        if customer.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                name: name.to_string(),
                balance: customer.balance,
                requested: amount,
            });
        }

        customer.debit(amount)?;
        let saved = self.store.save(customer).await?;

        info!(customer = name, %amount, balance = %saved.balance, "withdraw");
        Ok(StatusResponse::from_customer(
            &saved,
            StatusResponse::balance_message(saved.balance),
        ))
    }

    /// Transfer cash to another customer, creating the target if needed.
    /// Only what the source actually holds moves; the rest becomes a debt
    /// from source to target.
    pub async fn transfer(
        &self,
        source_name: &str,
        target_name: &str,
        amount: Amount,
    ) -> Result<StatusResponse, LedgerError> {
        if source_name == target_name {
            return Err(LedgerError::SelfTransfer);
        }
        self.check_amount(amount)?;
        self.retrying("transfer", || {
            self.try_transfer(source_name, target_name, amount)
        })
        .await
    }

    async fn try_transfer(
        &self,
        source_name: &str,
        target_name: &str,
        amount: Amount,
    ) -> Result<StatusResponse, LedgerError> {
        let (mut source, mut target) = tokio::try_join!(
            self.get_customer(source_name),
            self.find_or_create(target_name)
        )?;

        // Any overflow bails out here, before either record is saved
        let (moved, shortfall) = split_transfer(source.balance, amount)?;
        source.debit(moved)?;
        target.credit(moved)?;

        if shortfall > Amount::ZERO {
            source.add_debt(target_name, -shortfall)?;
            target.add_debt(source_name, shortfall)?;
        }

        source.prune_debts();
        target.prune_debts();

        let status = StatusResponse::from_customer(
            &source,
            format!("Transferred {} to {}", moved, target_name),
        );
        self.store.save_all(vec![source, target]).await?;

        info!(
            source = source_name,
            target = target_name,
            %amount,
            %moved,
            %shortfall,
            "transfer"
        );
        Ok(status)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check ledger integrity and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        let customers = self.store.list().await?;
        Ok(build_integrity_report(&customers))
    }

    fn check_amount(&self, amount: Amount) -> Result<(), LedgerError> {
        if self.config.strict_amounts && amount <= Amount::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(())
    }

    /// Run `attempt` until it no longer fails with a version conflict, up to
    /// `max_conflict_retries` extra runs.
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(LedgerError::Conflict { name, .. }) if retries < self.config.max_conflict_retries => {
                    retries += 1;
                    debug!(operation, customer = %name, retries, "version conflict, retrying");
                }
                Err(LedgerError::Conflict { name, .. }) => {
                    warn!(operation, customer = %name, retries, "giving up after version conflicts");
                    return Err(LedgerError::Conflict {
                        name,
                        attempts: retries + 1,
                    });
                }
                result => return result,
            }
        }
    }
}
