use crate::domain::account::Balance;

/// Rejection of a single balance operation.
///
/// Every variant carries the `(available, blocked)` snapshot of the account,
/// which is the state before the call since failed operations never mutate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Overflow error: {operation} of {amount} out of range ({balance})")]
    Overflow {
        operation: &'static str,
        amount: u64,
        balance: Balance,
    },

    #[error("Insufficient funds: required {required} ({balance})")]
    InsufficientFunds { required: u64, balance: Balance },

    #[error("Reservation key {key:?} is already taken ({balance})")]
    DuplicateKey { key: String, balance: Balance },

    #[error("Reservation key {key:?} is missing ({balance})")]
    UnknownKey { key: String, balance: Balance },

    #[error("Amount {requested} does not match {reserved} blocked under {key:?} ({balance})")]
    AmountMismatch {
        key: String,
        reserved: u64,
        requested: u64,
        balance: Balance,
    },
}

impl AccountError {
    pub fn balance(&self) -> Balance {
        match self {
            AccountError::Overflow { balance, .. }
            | AccountError::InsufficientFunds { balance, .. }
            | AccountError::DuplicateKey { balance, .. }
            | AccountError::UnknownKey { balance, .. }
            | AccountError::AmountMismatch { balance, .. } => *balance,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),

    #[error("Account {account_id} rejected operation: {source}")]
    Account {
        account_id: String,
        #[source]
        source: AccountError,
    },
}
