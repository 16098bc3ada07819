use ed::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::coins::{Address, Amount, Decimal};

/// Shares held by a delegator in one validator.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: Address,
    pub shares: Decimal,
}

impl Delegation {
    pub fn new(delegator: Address, validator: Address) -> Self {
        Delegation {
            delegator,
            validator,
            shares: Decimal::zero(),
        }
    }
}

#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegationEntry {
    pub creation_height: u64,
    pub completion_time: i64,
    pub initial_balance: Amount,
    /// Tokens still owed to the delegator after any slashing.
    pub balance: Amount,
}

impl UnbondingDelegationEntry {
    pub fn is_mature(&self, now: i64) -> bool {
        self.completion_time <= now
    }
}

/// Tokens a delegator is withdrawing from one validator, one entry per
/// undelegation still waiting out the unbonding period.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator: Address,
    pub validator: Address,
    pub entries: Vec<UnbondingDelegationEntry>,
}

impl UnbondingDelegation {
    pub fn new(delegator: Address, validator: Address) -> Self {
        UnbondingDelegation {
            delegator,
            validator,
            entries: vec![],
        }
    }

    pub fn add_entry(&mut self, creation_height: u64, completion_time: i64, balance: Amount) {
        self.entries.push(UnbondingDelegationEntry {
            creation_height,
            completion_time,
            initial_balance: balance,
            balance,
        });
    }

    /// Removes the entries matured at `now` and returns them.
    pub fn take_matured(&mut self, now: i64) -> Vec<UnbondingDelegationEntry> {
        let (matured, pending) = self
            .entries
            .drain(..)
            .partition(|entry| entry.is_mature(now));
        self.entries = pending;
        matured
    }

    pub fn total_balance(&self) -> Amount {
        Amount::new(self.entries.iter().map(|entry| entry.balance.value()).sum())
    }
}

#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedelegationEntry {
    pub creation_height: u64,
    pub completion_time: i64,
    /// Tokens moved out of the source validator.
    pub initial_balance: Amount,
    /// Shares issued by the destination validator.
    pub shares_dst: Decimal,
}

impl RedelegationEntry {
    pub fn is_mature(&self, now: i64) -> bool {
        self.completion_time <= now
    }
}

/// Stake moved from `src` to `dst`, with one entry per move still
/// answerable for faults at the source.
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redelegation {
    pub delegator: Address,
    pub src: Address,
    pub dst: Address,
    pub entries: Vec<RedelegationEntry>,
}

impl Redelegation {
    pub fn new(delegator: Address, src: Address, dst: Address) -> Self {
        Redelegation {
            delegator,
            src,
            dst,
            entries: vec![],
        }
    }

    pub fn add_entry(
        &mut self,
        creation_height: u64,
        completion_time: i64,
        initial_balance: Amount,
        shares_dst: Decimal,
    ) {
        self.entries.push(RedelegationEntry {
            creation_height,
            completion_time,
            initial_balance,
            shares_dst,
        });
    }

    pub fn remove_matured(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.is_mature(now));
        before - self.entries.len()
    }

    pub fn has_immature(&self, now: i64) -> bool {
        self.entries.iter().any(|entry| !entry.is_mature(now))
    }
}
