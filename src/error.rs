use thiserror::Error;

use crate::coins::{Address, Amount, Decimal};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validator {0} not found")]
    ValidatorNotFound(Address),
    #[error("No delegation from {delegator} to {validator}")]
    DelegationNotFound {
        delegator: Address,
        validator: Address,
    },
    #[error("No unbonding delegation from {delegator} to {validator}")]
    UnbondingDelegationNotFound {
        delegator: Address,
        validator: Address,
    },
    #[error("No redelegation from {delegator} via {src} to {dst}")]
    RedelegationNotFound {
        delegator: Address,
        src: Address,
        dst: Address,
    },
    #[error("Insufficient shares: have {have}, need {need}")]
    InsufficientShares { have: Decimal, need: Decimal },
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },
    #[error("Cannot redelegate to the same validator")]
    SelfRedelegation,
    #[error("Redelegation source {0} has immature incoming redelegations")]
    TransitiveRedelegation(Address),
    #[error("Redelegation destination {0} is not a valid validator")]
    BadRedelegationDst(Address),
    #[error("Too many unbonding entries for this delegation")]
    MaxUnbondingEntries,
    #[error("Too many redelegation entries for this delegation")]
    MaxRedelegationEntries,
    #[error("Invalid coin denomination: expected {expected}, got {got}")]
    BadDenomination { expected: String, got: String },
    #[error("Validator {0} is jailed")]
    ValidatorJailed(Address),
    #[error("Validator {0} is not jailed")]
    ValidatorNotJailed(Address),
    #[error("Validator {0} already exists")]
    ValidatorExists(Address),
    #[error("Consensus key is already in use by another validator")]
    ConsensusKeyInUse,
    #[error("Invalid commission: {0}")]
    InvalidCommission(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Redelegation amount is too small")]
    TinyRedelegation,
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Unknown query path: {0}")]
    UnknownQuery(String),

    #[error(transparent)]
    Store(#[from] crate::store::Error),
    #[error("Encoding Error: {0:?}")]
    Ed(ed::Error),
    #[error(transparent)]
    Decimal(#[from] rust_decimal::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Address Error: {0}")]
    Address(String),
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Hook Error: {0}")]
    Hook(String),
}

impl From<ed::Error> for Error {
    fn from(err: ed::Error) -> Self {
        Error::Ed(err)
    }
}

/// A result type bound to the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;
