use ed::{Decode, Encode, Terminated};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coins::{Address, Amount, Decimal};
use crate::encoding::{decode_text, encode_text, text_length};
use crate::{Error, Result};

pub const MAX_MONIKER_LENGTH: usize = 70;
pub const MAX_IDENTITY_LENGTH: usize = 3000;
pub const MAX_WEBSITE_LENGTH: usize = 140;
pub const MAX_DETAILS_LENGTH: usize = 280;

/// Minimum seconds between commission rate changes.
pub const COMMISSION_UPDATE_INTERVAL: i64 = 60 * 60 * 24;

#[derive(Encode, Decode, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub moniker: String,
    pub identity: String,
    pub website: String,
    pub details: String,
}

impl Description {
    pub fn new<M: Into<String>>(moniker: M) -> Self {
        Description {
            moniker: moniker.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("moniker", &self.moniker, MAX_MONIKER_LENGTH),
            ("identity", &self.identity, MAX_IDENTITY_LENGTH),
            ("website", &self.website, MAX_WEBSITE_LENGTH),
            ("details", &self.details, MAX_DETAILS_LENGTH),
        ];
        for (name, value, max) in fields {
            if value.len() > max {
                return Err(Error::InvalidParams(format!(
                    "Description {} is longer than {} bytes",
                    name, max
                )));
            }
        }
        if self.moniker.is_empty() {
            return Err(Error::InvalidParams("Moniker cannot be empty".into()));
        }

        Ok(())
    }
}

impl Encode for Description {
    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(text_length(&self.moniker)?
            + text_length(&self.identity)?
            + text_length(&self.website)?
            + text_length(&self.details)?)
    }

    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        encode_text(&self.moniker, dest)?;
        encode_text(&self.identity, dest)?;
        encode_text(&self.website, dest)?;
        encode_text(&self.details, dest)
    }
}

impl Decode for Description {
    fn decode<R: std::io::Read>(mut reader: R) -> ed::Result<Self> {
        Ok(Description {
            moniker: decode_text(&mut reader)?,
            identity: decode_text(&mut reader)?,
            website: decode_text(&mut reader)?,
            details: decode_text(&mut reader)?,
        })
    }
}

impl Terminated for Description {}

#[derive(Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub rate: Decimal,
    pub max_rate: Decimal,
    pub max_change_rate: Decimal,
    /// Block time of the last rate change.
    pub update_time: i64,
}

impl Commission {
    pub fn new(rate: Decimal, max_rate: Decimal, max_change_rate: Decimal) -> Self {
        Commission {
            rate,
            max_rate,
            max_change_rate,
            update_time: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidCommission(msg.to_string()));

        if self.max_rate.is_negative() || self.max_rate > Decimal::one() {
            return invalid("Max rate must be between 0 and 1");
        }
        if self.rate.is_negative() {
            return invalid("Rate cannot be negative");
        }
        if self.rate > self.max_rate {
            return invalid("Rate cannot exceed max rate");
        }
        if self.max_change_rate.is_negative() {
            return invalid("Max change rate cannot be negative");
        }
        if self.max_change_rate > self.max_rate {
            return invalid("Max change rate cannot exceed max rate");
        }

        Ok(())
    }

    /// Checks a proposed rate change made at block time `now`.
    pub fn validate_new_rate(&self, new_rate: Decimal, now: i64) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidCommission(msg.to_string()));

        if now.saturating_sub(self.update_time) < COMMISSION_UPDATE_INTERVAL {
            return invalid("Commission can only be changed once per day");
        }
        if new_rate.is_negative() {
            return invalid("Rate cannot be negative");
        }
        if new_rate > self.max_rate {
            return invalid("Rate cannot exceed max rate");
        }
        let change = if new_rate > self.rate {
            (new_rate - self.rate)?
        } else {
            (self.rate - new_rate)?
        };
        if change > self.max_change_rate {
            return invalid("Rate change exceeds max change rate");
        }

        Ok(())
    }
}

#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator: Address,
    #[serde(with = "hex_key")]
    pub consensus_key: [u8; 32],
    pub jailed: bool,
    pub status: BondStatus,
    pub tokens: Amount,
    pub delegator_shares: Decimal,
    pub description: Description,
    /// Height at which the validator was created.
    pub bond_height: u64,
    /// Creation order among validators created in the same block.
    pub bond_intra_tx_counter: i16,
    pub unbonding_height: u64,
    pub unbonding_completion_time: i64,
    pub commission: Commission,
}

impl Validator {
    pub fn new(
        operator: Address,
        consensus_key: [u8; 32],
        description: Description,
        commission: Commission,
    ) -> Self {
        Validator {
            operator,
            consensus_key,
            jailed: false,
            status: BondStatus::Unbonded,
            tokens: Amount::ZERO,
            delegator_shares: Decimal::zero(),
            description,
            bond_height: 0,
            bond_intra_tx_counter: 0,
            unbonding_height: 0,
            unbonding_completion_time: 0,
            commission,
        }
    }

    pub fn cons_address(&self) -> Address {
        Address::from_pubkey(&self.consensus_key)
    }

    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }

    /// Voting power this validator would have in the active set.
    pub fn potential_power(&self) -> u64 {
        self.tokens.value()
    }

    /// Voting power this validator has in the active set, zero unless bonded.
    pub fn bonded_power(&self) -> u64 {
        if self.is_bonded() {
            self.potential_power()
        } else {
            0
        }
    }

    /// Tokens per share; one for a validator with no shares.
    pub fn exchange_rate(&self) -> Result<Decimal> {
        if self.delegator_shares.is_zero() {
            return Ok(Decimal::one());
        }
        Decimal::from(self.tokens) / self.delegator_shares
    }

    /// Shares a delegation of `amount` tokens would be issued.
    ///
    /// Issuance rounds toward zero, so a delegation never lowers the
    /// exchange rate.
    pub fn shares_from_tokens(&self, amount: Amount) -> Result<Decimal> {
        if self.delegator_shares.is_zero() {
            return Ok(amount.into());
        }
        self.check_invariant();
        Decimal::from(amount).mul_div(self.delegator_shares, self.tokens)
    }

    /// Whole tokens `shares` are worth, rounded down.
    pub fn tokens_from_shares(&self, shares: Decimal) -> Result<Amount> {
        if self.delegator_shares.is_zero() {
            return Ok(Amount::ZERO);
        }
        shares.mul_div_floor(self.tokens, self.delegator_shares)
    }

    /// Adds delegated tokens and returns the shares issued for them.
    pub fn add_tokens_from_del(&mut self, amount: Amount) -> Result<Decimal> {
        let issued = self.shares_from_tokens(amount)?;
        self.tokens = (self.tokens + amount)?;
        self.delegator_shares = (self.delegator_shares + issued)?;
        self.check_invariant();

        Ok(issued)
    }

    /// Redeems `shares` and returns the whole tokens they were worth. The last
    /// shares redeemed take every remaining token.
    pub fn remove_del_shares(&mut self, shares: Decimal) -> Result<Amount> {
        if shares > self.delegator_shares {
            return Err(Error::InsufficientShares {
                have: self.delegator_shares,
                need: shares,
            });
        }

        let amount = if shares == self.delegator_shares {
            self.tokens
        } else {
            self.tokens_from_shares(shares)?
        };

        self.delegator_shares = (self.delegator_shares - shares)?;
        self.tokens = (self.tokens - amount)?;
        self.check_invariant();

        Ok(amount)
    }

    /// Burns tokens without redeeming shares.
    pub fn remove_tokens(&mut self, amount: Amount) -> Result<()> {
        self.tokens = (self.tokens - amount)?;
        self.check_invariant();
        Ok(())
    }

    fn check_invariant(&self) {
        if self.tokens.is_zero() != self.delegator_shares.is_zero() {
            panic!(
                "Validator {} has {} tokens and {} shares",
                self.operator, self.tokens, self.delegator_shares
            );
        }
    }
}

mod hex_key {
    use super::*;

    pub fn serialize<S: Serializer>(key: &[u8; 32], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Consensus key must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn validator() -> Validator {
        Validator::new(
            Address::from([1; 20]),
            [2; 32],
            Description::new("val"),
            Commission::default(),
        )
    }

    #[test]
    fn bootstrap_shares() -> Result<()> {
        let mut val = validator();
        assert_eq!(val.exchange_rate()?, Decimal::one());

        let issued = val.add_tokens_from_del(20u64.into())?;
        assert_eq!(issued, Decimal::from(20u64));
        assert_eq!(val.tokens, Amount::new(20));
        assert_eq!(val.delegator_shares, Decimal::from(20u64));
        Ok(())
    }

    #[test]
    fn issuance_after_slash() -> Result<()> {
        let mut val = validator();
        val.add_tokens_from_del(100u64.into())?;
        val.remove_tokens(50u64.into())?;
        assert_eq!(val.exchange_rate()?, dec!(0.5).into());

        let issued = val.add_tokens_from_del(10u64.into())?;
        assert_eq!(issued, Decimal::from(20u64));
        assert_eq!(val.exchange_rate()?, dec!(0.5).into());
        Ok(())
    }

    #[test]
    fn issuance_truncates() -> Result<()> {
        let mut val = validator();
        val.add_tokens_from_del(3u64.into())?;
        val.remove_tokens(1u64.into())?;
        val.delegator_shares = dec!(1).into();

        // 1 token at 2 tokens per share
        let issued = val.shares_from_tokens(1u64.into())?;
        assert_eq!(issued, dec!(0.5).into());

        val.delegator_shares = dec!(2).into();
        val.tokens = 3u64.into();
        let issued = val.shares_from_tokens(1u64.into())?;
        assert_eq!(issued, dec!(0.6666666666).into());
        Ok(())
    }

    #[test]
    fn redemption() -> Result<()> {
        let mut val = validator();
        val.add_tokens_from_del(10u64.into())?;
        val.remove_tokens(1u64.into())?;

        // 3 of 10 shares at 0.9 tokens per share is 2.7 tokens
        let amount = val.remove_del_shares(3u64.into())?;
        assert_eq!(amount, Amount::new(2));
        assert_eq!(val.tokens, Amount::new(7));

        // last shares take the remainder
        let amount = val.remove_del_shares(7u64.into())?;
        assert_eq!(amount, Amount::new(7));
        assert!(val.tokens.is_zero());
        assert!(val.delegator_shares.is_zero());
        Ok(())
    }

    #[test]
    fn large_stakes() -> Result<()> {
        let stake = 500_000_000_000_000u64;
        let mut val = validator();
        val.add_tokens_from_del(stake.into())?;
        let issued = val.add_tokens_from_del(stake.into())?;
        assert_eq!(issued, Decimal::from(stake));

        // rate of 2 / 3 tokens per share
        val.remove_tokens((stake * 2 / 3).into())?;
        let issued = val.add_tokens_from_del(1_000_000_000_000_000_000u64.into())?;
        assert!(issued > Decimal::from(1_000_000_000_000_000_000u64));
        assert!(val.exchange_rate()? >= dec!(0.6666666666).into());

        let amount = val.remove_del_shares(Decimal::from(stake))?;
        assert!(amount < Amount::new(stake));
        assert!(amount.value() > stake / 2);
        Ok(())
    }

    #[test]
    fn redeem_too_many() -> Result<()> {
        let mut val = validator();
        val.add_tokens_from_del(10u64.into())?;
        let res = val.remove_del_shares(11u64.into());
        assert!(matches!(res, Err(Error::InsufficientShares { .. })));
        Ok(())
    }

    #[test]
    fn commission_validation() {
        let ok = Commission::new(dec!(0.1).into(), dec!(0.2).into(), dec!(0.01).into());
        ok.validate().unwrap();

        let bad = Commission::new(dec!(0.3).into(), dec!(0.2).into(), dec!(0.01).into());
        assert!(matches!(bad.validate(), Err(Error::InvalidCommission(_))));

        let bad = Commission::new(dec!(0.1).into(), dec!(1.1).into(), dec!(0.01).into());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn commission_change() {
        let mut commission =
            Commission::new(dec!(0.1).into(), dec!(0.2).into(), dec!(0.01).into());
        commission.update_time = 1_000;

        let day = COMMISSION_UPDATE_INTERVAL;
        assert!(commission
            .validate_new_rate(dec!(0.105).into(), 1_000 + day - 1)
            .is_err());
        commission
            .validate_new_rate(dec!(0.105).into(), 1_000 + day)
            .unwrap();
        assert!(commission
            .validate_new_rate(dec!(0.12).into(), 1_000 + day)
            .is_err());
        assert!(commission
            .validate_new_rate(dec!(0.25).into(), 1_000 + day)
            .is_err());
    }

    #[test]
    fn encoding() {
        let mut val = validator();
        val.description.details = "details".into();
        val.add_tokens_from_del(5u64.into()).unwrap();
        let bytes = val.encode().unwrap();
        assert_eq!(Validator::decode(bytes.as_slice()).unwrap(), val);

        let json = serde_json::to_string(&val).unwrap();
        assert!(json.contains(&hex::encode([2u8; 32])));
        assert_eq!(serde_json::from_str::<Validator>(&json).unwrap(), val);
    }
}
