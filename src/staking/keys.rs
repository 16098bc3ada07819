//! Store key layout of the staking keeper.
//!
//! Every record lives under a one-byte namespace. Composite keys concatenate
//! fixed-width big-endian fields so that iteration order is the order the
//! keeper processes them in.

use super::Validator;
use crate::coins::{Address, ADDRESS_LENGTH};
use crate::{Error, Result};

pub const POOL: u8 = 0x01;
pub const PARAMS: u8 = 0x02;
pub const LAST_TOTAL_POWER: u8 = 0x03;
pub const INTRA_TX_COUNTER: u8 = 0x04;

pub const LAST_VALIDATOR_POWER: u8 = 0x11;

pub const VALIDATOR: u8 = 0x21;
pub const VALIDATOR_BY_CONS_ADDR: u8 = 0x22;
pub const VALIDATOR_BY_POWER: u8 = 0x23;

pub const DELEGATION: u8 = 0x31;
pub const DELEGATION_BY_VAL: u8 = 0x32;

pub const UNBONDING_DELEGATION: u8 = 0x41;
pub const UNBONDING_DELEGATION_BY_VAL: u8 = 0x42;

pub const REDELEGATION: u8 = 0x51;
pub const REDELEGATION_BY_SRC: u8 = 0x52;
pub const REDELEGATION_BY_DST: u8 = 0x53;

pub const UNBONDING_QUEUE: u8 = 0x61;
pub const REDELEGATION_QUEUE: u8 = 0x62;
pub const VALIDATOR_QUEUE: u8 = 0x63;

fn key(namespace: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len = 1 + parts.iter().map(|part| part.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.push(namespace);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Encodes a timestamp so that byte order matches numeric order, including
/// for negative values.
pub fn time_bytes(seconds: i64) -> [u8; 8] {
    ((seconds as u64) ^ (1 << 63)).to_be_bytes()
}

pub fn time_from_bytes(bytes: &[u8]) -> Result<i64> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::Ed(ed::Error::UnexpectedByte(0)))?;
    Ok((u64::from_be_bytes(bytes) ^ (1 << 63)) as i64)
}

/// Splits a key suffix into `count` addresses.
pub fn split_addresses(bytes: &[u8], count: usize) -> Result<Vec<Address>> {
    if bytes.len() != count * ADDRESS_LENGTH {
        return Err(Error::Ed(ed::Error::UnexpectedByte(0)));
    }
    bytes
        .chunks(ADDRESS_LENGTH)
        .map(Address::from_slice)
        .collect()
}

pub fn pool_key() -> Vec<u8> {
    vec![POOL]
}

pub fn params_key() -> Vec<u8> {
    vec![PARAMS]
}

pub fn last_total_power_key() -> Vec<u8> {
    vec![LAST_TOTAL_POWER]
}

pub fn intra_tx_counter_key() -> Vec<u8> {
    vec![INTRA_TX_COUNTER]
}

pub fn last_validator_power_key(operator: Address) -> Vec<u8> {
    key(LAST_VALIDATOR_POWER, &[operator.as_slice()])
}

pub fn validator_key(operator: Address) -> Vec<u8> {
    key(VALIDATOR, &[operator.as_slice()])
}

pub fn validator_by_cons_addr_key(cons_addr: Address) -> Vec<u8> {
    key(VALIDATOR_BY_CONS_ADDR, &[cons_addr.as_slice()])
}

/// Power index key: descending tokens, then ascending bond height, then
/// ascending intra-tx counter, then operator address.
pub fn validator_power_key(validator: &Validator) -> Vec<u8> {
    let inverted_power = u64::MAX - validator.tokens.value();
    let counter = (validator.bond_intra_tx_counter as u16) ^ 0x8000;
    key(
        VALIDATOR_BY_POWER,
        &[
            &inverted_power.to_be_bytes(),
            &validator.bond_height.to_be_bytes(),
            &counter.to_be_bytes(),
            validator.operator.as_slice(),
        ],
    )
}

pub fn delegation_key(delegator: Address, validator: Address) -> Vec<u8> {
    key(DELEGATION, &[delegator.as_slice(), validator.as_slice()])
}

pub fn delegations_prefix(delegator: Address) -> Vec<u8> {
    key(DELEGATION, &[delegator.as_slice()])
}

pub fn delegation_by_val_key(validator: Address, delegator: Address) -> Vec<u8> {
    key(DELEGATION_BY_VAL, &[validator.as_slice(), delegator.as_slice()])
}

pub fn delegations_by_val_prefix(validator: Address) -> Vec<u8> {
    key(DELEGATION_BY_VAL, &[validator.as_slice()])
}

pub fn ubd_key(delegator: Address, validator: Address) -> Vec<u8> {
    key(
        UNBONDING_DELEGATION,
        &[delegator.as_slice(), validator.as_slice()],
    )
}

pub fn ubds_prefix(delegator: Address) -> Vec<u8> {
    key(UNBONDING_DELEGATION, &[delegator.as_slice()])
}

pub fn ubd_by_val_key(validator: Address, delegator: Address) -> Vec<u8> {
    key(
        UNBONDING_DELEGATION_BY_VAL,
        &[validator.as_slice(), delegator.as_slice()],
    )
}

pub fn ubds_by_val_prefix(validator: Address) -> Vec<u8> {
    key(UNBONDING_DELEGATION_BY_VAL, &[validator.as_slice()])
}

pub fn red_key(delegator: Address, src: Address, dst: Address) -> Vec<u8> {
    key(
        REDELEGATION,
        &[delegator.as_slice(), src.as_slice(), dst.as_slice()],
    )
}

pub fn reds_prefix(delegator: Address) -> Vec<u8> {
    key(REDELEGATION, &[delegator.as_slice()])
}

pub fn red_by_src_key(src: Address, delegator: Address, dst: Address) -> Vec<u8> {
    key(
        REDELEGATION_BY_SRC,
        &[src.as_slice(), delegator.as_slice(), dst.as_slice()],
    )
}

pub fn reds_by_src_prefix(src: Address) -> Vec<u8> {
    key(REDELEGATION_BY_SRC, &[src.as_slice()])
}

pub fn red_by_dst_key(dst: Address, delegator: Address, src: Address) -> Vec<u8> {
    key(
        REDELEGATION_BY_DST,
        &[dst.as_slice(), delegator.as_slice(), src.as_slice()],
    )
}

pub fn reds_by_dst_prefix(dst: Address) -> Vec<u8> {
    key(REDELEGATION_BY_DST, &[dst.as_slice()])
}

pub fn reds_by_dst_delegator_prefix(dst: Address, delegator: Address) -> Vec<u8> {
    key(REDELEGATION_BY_DST, &[dst.as_slice(), delegator.as_slice()])
}

pub fn ubd_queue_key(completion_time: i64, delegator: Address, validator: Address) -> Vec<u8> {
    key(
        UNBONDING_QUEUE,
        &[
            &time_bytes(completion_time),
            delegator.as_slice(),
            validator.as_slice(),
        ],
    )
}

pub fn red_queue_key(completion_time: i64, delegator: Address, src: Address, dst: Address) -> Vec<u8> {
    key(
        REDELEGATION_QUEUE,
        &[
            &time_bytes(completion_time),
            delegator.as_slice(),
            src.as_slice(),
            dst.as_slice(),
        ],
    )
}

pub fn validator_queue_key(completion_time: i64, operator: Address) -> Vec<u8> {
    key(
        VALIDATOR_QUEUE,
        &[&time_bytes(completion_time), operator.as_slice()],
    )
}

/// Exclusive upper bound of the queue entries maturing at or before `now`.
pub fn queue_end(queue: u8, now: i64) -> Vec<u8> {
    match now.checked_add(1) {
        Some(next) => key(queue, &[&time_bytes(next)]),
        None => vec![queue + 1],
    }
}
