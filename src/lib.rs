//! STFIX Tiered-Yield Staking Vault
//!
//! Users stake lamports into a program-owned principal vault at one of two
//! lock tiers (30 or 90 days). Each lamport staked mints one STFIX receipt.
//! Yield accrues lazily at the tier's annualized bps rate and is paid from a
//! separate, admin-funded yield vault.
//!
//! Architecture:
//! - Config PDA (singleton) holds parameters, totals and the allow-list, and
//!   is the STFIX mint authority
//! - Principal vault and yield vault are zero-data lamport PDAs; payouts never
//!   cross between them except when ExtendLock compounds yield
//! - One Position PDA per (config, owner)
//! - Exits go through a cooldown: RequestWithdraw, wait, Withdraw. Leaving
//!   before the cooldown ends costs a principal penalty kept in the vault
//! - `transition` is the pure state machine; `processor` only validates
//!   accounts, runs a transition and applies its settlement
//! - Deposit, Withdraw and TopUpYield emit fixed-layout event records
//!   (`events`) through `sol_log_data`
//!
//! Instructions:
//!   0 - Initialize:            Create config, vaults and STFIX mint
//!   1 - UpdateParameters:      Admin changes rates, cooldown, penalty, gating
//!   2 - Deposit:               Stake lamports at a tier, mint STFIX 1:1
//!   3 - RequestWithdraw:       Start the cooldown
//!   4 - CancelWithdrawRequest: Drop the request, position stays staked
//!   5 - Withdraw:              Burn STFIX, pay principal (less penalty) + yield
//!   6 - ExtendLock:            Compound accrued yield, switch tier
//!   7 - TopUpYield:            Admin funds the yield vault
//!   8 - AddToWhitelist:        Admin allows a depositor
//!   9 - RemoveFromWhitelist:   Admin revokes a depositor
//!  10 - TransferAdmin:         Admin hands over control

pub mod cpi;
pub mod error;
pub mod events;
pub mod instruction;
pub mod math;
pub mod processor;
pub mod state;
pub mod transition;
pub mod vault;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;
