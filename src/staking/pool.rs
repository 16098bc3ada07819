use ed::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::coins::Amount;

/// Aggregate token holdings of the staking module, split by whether the
/// tokens currently back the active validator set.
#[derive(Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub bonded_tokens: Amount,
    pub not_bonded_tokens: Amount,
}

impl Pool {
    pub fn total(&self) -> Amount {
        Amount::new(
            self.bonded_tokens
                .value()
                .checked_add(self.not_bonded_tokens.value())
                .unwrap_or_else(|| panic!("Pool total overflows")),
        )
    }

    pub fn bonded_to_not_bonded(&mut self, amount: Amount) {
        self.bonded_tokens = debit(self.bonded_tokens, amount, "bonded");
        self.not_bonded_tokens = credit(self.not_bonded_tokens, amount, "not bonded");
    }

    pub fn not_bonded_to_bonded(&mut self, amount: Amount) {
        self.not_bonded_tokens = debit(self.not_bonded_tokens, amount, "not bonded");
        self.bonded_tokens = credit(self.bonded_tokens, amount, "bonded");
    }

    pub fn add_not_bonded(&mut self, amount: Amount) {
        self.not_bonded_tokens = credit(self.not_bonded_tokens, amount, "not bonded");
    }

    pub fn remove_not_bonded(&mut self, amount: Amount) {
        self.not_bonded_tokens = debit(self.not_bonded_tokens, amount, "not bonded");
    }

    pub fn remove_bonded(&mut self, amount: Amount) {
        self.bonded_tokens = debit(self.bonded_tokens, amount, "bonded");
    }
}

// A pool counter going negative means keeper state is already corrupt.
fn debit(balance: Amount, amount: Amount, bucket: &str) -> Amount {
    match balance.value().checked_sub(amount.value()) {
        Some(value) => Amount::new(value),
        None => panic!(
            "Pool {} tokens would go negative: {} - {}",
            bucket, balance, amount
        ),
    }
}

fn credit(balance: Amount, amount: Amount, bucket: &str) -> Amount {
    match balance.value().checked_add(amount.value()) {
        Some(value) => Amount::new(value),
        None => panic!("Pool {} tokens overflow: {} + {}", bucket, balance, amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfers() {
        let mut pool = Pool::default();
        pool.add_not_bonded(100u64.into());
        pool.not_bonded_to_bonded(60u64.into());
        pool.bonded_to_not_bonded(10u64.into());

        assert_eq!(pool.bonded_tokens, Amount::new(50));
        assert_eq!(pool.not_bonded_tokens, Amount::new(50));
        assert_eq!(pool.total(), Amount::new(100));
    }

    #[test]
    #[should_panic(expected = "Pool bonded tokens would go negative")]
    fn negative_bonded() {
        let mut pool = Pool::default();
        pool.add_not_bonded(5u64.into());
        pool.bonded_to_not_bonded(1u64.into());
    }

    #[test]
    #[should_panic(expected = "Pool not bonded tokens would go negative")]
    fn negative_not_bonded() {
        let mut pool = Pool::default();
        pool.not_bonded_to_bonded(1u64.into());
    }
}
