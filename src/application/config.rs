/// Tunables for [`LedgerService`](super::LedgerService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How many times an operation is re-run from fresh reads after a version conflict.
    pub max_conflict_retries: usize,
    /// Reject zero and negative amounts instead of applying them as-is.
    pub strict_amounts: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            strict_amounts: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_max_conflict_retries(mut self, retries: usize) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn with_strict_amounts(mut self, strict: bool) -> Self {
        self.strict_amounts = strict;
        self
    }
}
