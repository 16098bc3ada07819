pub mod accounts;
pub use accounts::*;

pub mod address;
pub use address::*;

pub mod amount;
pub use amount::*;

pub mod bank;
pub use bank::*;

pub mod coin;
pub use coin::*;

pub mod decimal;
pub use decimal::*;
