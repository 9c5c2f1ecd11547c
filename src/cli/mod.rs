use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{LedgerConfig, LedgerService};
use crate::domain::{parse_amount, Amount, IntegrityReport, StatusResponse};

/// ATM - cash ledger with IOUs between customers
#[derive(Parser)]
#[command(name = "atm")]
#[command(about = "A cash ledger where deposits settle debts and short transfers become IOUs")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "ATM_DATABASE", default_value = "atm.db", global = true)]
    pub database: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Reject zero and negative amounts
    #[arg(long, env = "ATM_STRICT_AMOUNTS", global = true)]
    pub strict_amounts: bool,

    /// How many times to retry an operation after a concurrent update
    #[arg(long, env = "ATM_MAX_RETRIES", default_value_t = 3, global = true)]
    pub max_retries: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Log in as a customer (creates the customer on first use)
    Login {
        /// Customer name
        name: String,
    },

    /// Log out
    Logout {
        /// Customer name
        name: String,
    },

    /// Deposit cash; outstanding debts are paid first
    Deposit {
        /// Customer name
        name: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw cash
    Withdraw {
        /// Customer name
        name: String,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,
    },

    /// Transfer cash to another customer
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source customer name
        #[arg(long)]
        from: String,

        /// Target customer name (created if missing)
        #[arg(long)]
        to: String,
    },

    /// Show balance and debts for a customer
    Status {
        /// Customer name
        name: String,
    },

    /// List all customers
    Customers,

    /// Verify ledger integrity
    Check,
}

impl Cli {
    fn config(&self) -> LedgerConfig {
        LedgerConfig::default()
            .with_max_conflict_retries(self.max_retries)
            .with_strict_amounts(self.strict_amounts)
    }

    async fn service(&self) -> Result<LedgerService> {
        let service = LedgerService::connect(&self.database)
            .await
            .with_context(|| format!("Failed to open database '{}'. Run 'atm init' first", self.database))?;
        Ok(service.with_config(self.config()))
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Login { name } => {
                let status = self.service().await?.login(name).await?;
                print_status(&status, self.json)?;
            }

            Commands::Logout { name } => {
                let service = self.service().await?;
                println!("{}", service.logout(name));
            }

            Commands::Deposit { name, amount } => {
                let amount = parse_cli_amount(amount)?;
                let status = self.service().await?.deposit(name, amount).await?;
                print_status(&status, self.json)?;
            }

            Commands::Withdraw { name, amount } => {
                let amount = parse_cli_amount(amount)?;
                let status = self.service().await?.withdraw(name, amount).await?;
                print_status(&status, self.json)?;
            }

            Commands::Transfer { amount, from, to } => {
                let amount = parse_cli_amount(amount)?;
                let status = self.service().await?.transfer(from, to, amount).await?;
                print_status(&status, self.json)?;
            }

            Commands::Status { name } => {
                let status = self.service().await?.status(name).await?;
                print_status(&status, self.json)?;
            }

            Commands::Customers => {
                let service = self.service().await?;
                run_customers_command(&service, self.json).await?;
            }

            Commands::Check => {
                let service = self.service().await?;
                let report = service.check_integrity().await?;
                print_integrity_report(&report);
            }
        }

        Ok(())
    }
}

fn parse_cli_amount(raw: &str) -> Result<Amount> {
    parse_amount(raw).context("Invalid amount format. Use '50.00' or '50'")
}

fn print_status(status: &StatusResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!("{}", status.message);
    println!("  Customer: {}", status.name);
    println!("  Balance:  {}", status.balance);
    for line in &status.debt_info {
        println!("  - {}", line);
    }
    Ok(())
}

async fn run_customers_command(service: &LedgerService, json: bool) -> Result<()> {
    let customers = service.list_customers().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&customers)?);
        return Ok(());
    }

    if customers.is_empty() {
        println!("No customers found.");
        return Ok(());
    }

    println!("{:<20} {:>12} {:>6}", "CUSTOMER", "BALANCE", "DEBTS");
    println!("{}", "-".repeat(40));
    for customer in customers {
        println!(
            "{:<20} {:>12} {:>6}",
            truncate(&customer.name, 20),
            customer.balance.to_string(),
            customer.debts.len()
        );
    }
    Ok(())
}

fn print_integrity_report(report: &IntegrityReport) {
    println!("Checking ledger integrity...\n");
    println!("Customers:     {}", report.customer_count);
    println!("Debt entries:  {}", report.debt_entries);
    match report.total_balance {
        Some(total) => println!("Total balance: {}", total),
        None => println!("Total balance: out of range"),
    }
    println!();

    if report.is_consistent() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
