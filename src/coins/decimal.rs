use super::Amount;
use crate::encoding::{Decode, Encode, Terminated};
use crate::{Error, Result};
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};
use rust_decimal::{Decimal as NumDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Number of fractional digits kept in share quantities.
pub const PRECISION: u32 = 10;

/// A fixed-point quantity, used for shares, exchange rates and commission
/// rates.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Decimal {
    pub(crate) value: NumDecimal,
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl Encode for Decimal {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        dest.write_all(&self.value.serialize())?;

        Ok(())
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(16)
    }
}

impl Decode for Decimal {
    fn decode<R: std::io::Read>(mut source: R) -> ed::Result<Self> {
        let mut bytes = [0u8; 16];
        source.read_exact(&mut bytes)?;
        Ok(Decimal {
            value: NumDecimal::deserialize(bytes),
        })
    }
}

impl Terminated for Decimal {}

impl Decimal {
    pub fn zero() -> Self {
        Decimal {
            value: NumDecimal::ZERO,
        }
    }

    pub fn one() -> Self {
        Decimal {
            value: NumDecimal::ONE,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// Drops digits beyond [PRECISION], rounding toward zero.
    pub fn truncate(self) -> Self {
        Decimal {
            value: self
                .value
                .round_dp_with_strategy(PRECISION, RoundingStrategy::ToZero),
        }
    }

    /// Rounds down to a whole token amount.
    pub fn floor_amount(&self) -> Result<Amount> {
        if self.is_negative() {
            return Err(Error::InvalidAmount(
                "Amounts may not be negative".to_string(),
            ));
        }

        self.value
            .floor()
            .to_u64()
            .map(Amount::new)
            .ok_or(Error::Overflow)
    }
}

impl Decimal {
    fn to_ratio(self) -> BigRational {
        let denom = 10i128.pow(self.value.scale());
        BigRational::new(self.value.mantissa().into(), denom.into())
    }

    fn exact_mul_div(self, numer: Decimal, denom: Decimal) -> Result<BigRational> {
        let denom = denom.to_ratio();
        if denom.is_zero() {
            return Err(Error::Overflow);
        }
        Ok(self.to_ratio() * numer.to_ratio() / denom)
    }

    /// Computes `self * numer / denom` without intermediate overflow, rounding
    /// toward zero to [PRECISION] fractional digits. Results too large for
    /// that many digits keep as many as fit.
    pub fn mul_div<N, D>(self, numer: N, denom: D) -> Result<Self>
    where
        N: Into<Self>,
        D: Into<Self>,
    {
        let exact = self.exact_mul_div(numer.into(), denom.into())?;
        for scale in (0..=PRECISION).rev() {
            let shift = BigRational::from_integer(10i128.pow(scale).into());
            let mantissa = (&exact * shift)
                .trunc()
                .to_integer()
                .to_i128()
                .ok_or(Error::Overflow)?;
            if let Ok(value) = NumDecimal::try_from_i128_with_scale(mantissa, scale) {
                return Ok(value.normalize().into());
            }
        }
        Err(Error::Overflow)
    }

    /// Computes `self * numer / denom` without intermediate overflow, rounded
    /// down to a whole token amount.
    pub fn mul_div_floor<N, D>(self, numer: N, denom: D) -> Result<Amount>
    where
        N: Into<Self>,
        D: Into<Self>,
    {
        let exact = self.exact_mul_div(numer.into(), denom.into())?;
        if exact < BigRational::zero() {
            return Err(Error::InvalidAmount(
                "Amounts may not be negative".to_string(),
            ));
        }
        exact
            .floor()
            .to_integer()
            .to_u64()
            .map(Amount::new)
            .ok_or(Error::Overflow)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal {
            value: value.into(),
        }
    }
}

impl From<NumDecimal> for Decimal {
    fn from(value: NumDecimal) -> Self {
        Decimal { value }
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0.into()
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self {
            value: NumDecimal::from_str(s)?,
        })
    }
}

impl<I: Into<Self>> Add<I> for Decimal {
    type Output = Result<Self>;

    fn add(self, other: I) -> Result<Self> {
        self.value
            .checked_add(other.into().value)
            .map(Into::into)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Self>> Sub<I> for Decimal {
    type Output = Result<Self>;

    fn sub(self, other: I) -> Result<Self> {
        self.value
            .checked_sub(other.into().value)
            .map(Into::into)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Self>> Mul<I> for Decimal {
    type Output = Result<Self>;

    fn mul(self, other: I) -> Result<Self> {
        self.value
            .checked_mul(other.into().value)
            .map(Into::into)
            .ok_or(Error::Overflow)
    }
}

impl<I: Into<Self>> Div<I> for Decimal {
    type Output = Result<Self>;

    fn div(self, other: I) -> Result<Self> {
        self.value
            .checked_div(other.into().value)
            .map(Into::into)
            .ok_or(Error::Overflow)
    }
}
