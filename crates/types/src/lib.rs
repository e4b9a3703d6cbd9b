//! Core types for the bridge-probe verification harness
//!
//! Ledgers, accounts, transfer requests and run specifications, plus the
//! fixed-point decimal converter used to move amounts between ledgers of
//! different precision.

pub mod decimals;
pub mod ledger;
pub mod run;
pub mod transfer;

pub use decimals::{
    convert, parse_amount, scale_down_round_up, scale_down_truncating, scale_up, AmountError,
    Rounding, DFM_DECIMALS, WEI_DECIMALS,
};
pub use ledger::*;
pub use run::*;
pub use transfer::*;

pub use cosmwasm_std::{Binary, Uint256};
