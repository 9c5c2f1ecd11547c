use anyhow::Result;
use atm_ledger::cli::Cli;
use atm_ledger::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::set_up(cli.verbose);
    cli.run().await
}
