//! Ledger error types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Amount must be non-zero")]
    ZeroAmount,

    #[error("Insufficient spendable balance: requested {requested}, spendable {spendable}")]
    InsufficientBalance { requested: u64, spendable: u64 },

    #[error("Tokens are locked")]
    TokensLocked,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Max supply exceeded")]
    MaxSupplyExceeded,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
