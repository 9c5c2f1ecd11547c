mod customer;
mod ledger;
mod money;
mod status;

pub use customer::*;
pub use ledger::*;
pub use money::*;
pub use status::*;
