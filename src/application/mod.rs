// Application layer - use cases over the customer store

pub mod config;
pub mod error;
pub mod service;

pub use config::*;
pub use error::*;
pub use service::*;
