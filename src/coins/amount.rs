use ed::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use crate::{Error, Result};

/// A whole number of tokens.
#[derive(
    Encode,
    Decode,
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub(crate) u64);

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(value: u64) -> Self {
        Amount(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `self - other`, or zero if `other` is larger.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl<I: Into<Self>> Add<I> for Amount {
    type Output = Result<Self>;

    fn add(self, other: I) -> Result<Self> {
        let other = other.into();
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Self>> Sub<I> for Amount {
    type Output = Result<Self>;

    fn sub(self, other: I) -> Result<Self> {
        let other = other.into();
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(Error::Overflow)
    }
}
