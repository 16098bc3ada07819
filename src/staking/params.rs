use serde::{Deserialize, Serialize};

use crate::encoding::{decode_text, encode_text, text_length, Decode, Encode, Terminated};
use crate::{Error, Result};

pub const DEFAULT_UNBONDING_SECONDS: i64 = 60 * 60 * 24 * 7 * 3;
pub const DEFAULT_MAX_VALIDATORS: u16 = 100;
pub const DEFAULT_MAX_ENTRIES: u16 = 7;
pub const DEFAULT_BOND_DENOM: &str = "stake";

/// Tunable staking parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Seconds between beginning to unbond and the tokens becoming liquid.
    pub unbonding_time: i64,
    /// Size of the active validator set.
    pub max_validators: u16,
    /// Maximum entries per unbonding delegation or redelegation record.
    pub max_entries: u16,
    pub bond_denom: String,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            unbonding_time: DEFAULT_UNBONDING_SECONDS,
            max_validators: DEFAULT_MAX_VALIDATORS,
            max_entries: DEFAULT_MAX_ENTRIES,
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        if self.unbonding_time <= 0 {
            return Err(Error::InvalidParams(
                "Unbonding time must be positive".into(),
            ));
        }
        if self.max_validators == 0 {
            return Err(Error::InvalidParams(
                "Max validators must be positive".into(),
            ));
        }
        if self.max_entries == 0 {
            return Err(Error::InvalidParams("Max entries must be positive".into()));
        }
        if self.bond_denom.trim().is_empty() {
            return Err(Error::InvalidParams("Bond denom cannot be blank".into()));
        }

        Ok(())
    }
}

impl Encode for Params {
    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(self.unbonding_time.encoding_length()?
            + self.max_validators.encoding_length()?
            + self.max_entries.encoding_length()?
            + text_length(&self.bond_denom)?)
    }

    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        self.unbonding_time.encode_into(dest)?;
        self.max_validators.encode_into(dest)?;
        self.max_entries.encode_into(dest)?;
        encode_text(&self.bond_denom, dest)
    }
}

impl Decode for Params {
    fn decode<R: std::io::Read>(mut reader: R) -> ed::Result<Self> {
        Ok(Params {
            unbonding_time: i64::decode(&mut reader)?,
            max_validators: u16::decode(&mut reader)?,
            max_entries: u16::decode(&mut reader)?,
            bond_denom: decode_text(&mut reader)?,
        })
    }
}

impl Terminated for Params {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = Params::default();
        params.validate().unwrap();
        assert_eq!(params.unbonding_time, 1_814_400);
        assert_eq!(params.bond_denom, "stake");
    }

    #[test]
    fn validation() {
        let bad = [
            Params {
                unbonding_time: 0,
                ..Default::default()
            },
            Params {
                max_validators: 0,
                ..Default::default()
            },
            Params {
                max_entries: 0,
                ..Default::default()
            },
            Params {
                bond_denom: " ".into(),
                ..Default::default()
            },
        ];
        for params in bad {
            assert!(matches!(params.validate(), Err(Error::InvalidParams(_))));
        }
    }

    #[test]
    fn encoding() {
        let params = Params {
            bond_denom: "uatom".into(),
            ..Default::default()
        };
        let bytes = params.encode().unwrap();
        assert_eq!(bytes.len(), params.encoding_length().unwrap());
        assert_eq!(Params::decode(bytes.as_slice()).unwrap(), params);
    }
}
