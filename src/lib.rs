#![feature(trivial_bounds)]
pub mod abci;
pub mod coins;
pub mod context;
pub mod encoding;
mod error;
pub mod staking;
pub mod store;

pub use error::{Error, Result};
