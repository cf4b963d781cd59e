//! Structured event records.
//!
//! Each record is a fixed `#[repr(C)]` Pod layout emitted with `sol_log_data`.
//! The first segment is the one-byte [`EventKind`], the second the record
//! bytes. A stake record carries the depositor's memo as a third segment when
//! one was given. Off-chain indexers decode the `Program data:` log lines with
//! the same layouts.

use bytemuck::{Pod, Zeroable};
use solana_program::{log::sol_log_data, pubkey::Pubkey};

/// Longest memo accepted with a deposit, in bytes of UTF-8.
pub const MAX_MEMO_LEN: usize = 128;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Stake = 0,
    Redeem = 1,
    EarlyRedeem = 2,
    TopUpYield = 3,
}

impl EventKind {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Stake),
            1 => Some(Self::Redeem),
            2 => Some(Self::EarlyRedeem),
            3 => Some(Self::TopUpYield),
            _ => None,
        }
    }
}

/// A record type with a fixed kind tag.
pub trait Event: Pod {
    const KIND: EventKind;
}

/// Deposit accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct StakeEvent {
    pub user: [u8; 32],
    pub amount: u64,
    /// Lock tier in days (30 or 90)
    pub tier: u64,
    pub timestamp: i64,
}

/// Withdrawal after the cooldown: full principal plus yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RedeemEvent {
    pub user: [u8; 32],
    pub principal: u64,
    pub interest: u64,
    pub timestamp: i64,
}

/// Withdrawal before the cooldown elapsed. `principal` is the amount staked
/// before the penalty was carved out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct EarlyRedeemEvent {
    pub user: [u8; 32],
    pub principal: u64,
    pub penalty: u64,
    pub interest: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct TopUpYieldEvent {
    pub admin: [u8; 32],
    pub amount: u64,
    pub timestamp: i64,
}

impl Event for StakeEvent {
    const KIND: EventKind = EventKind::Stake;
}

impl Event for RedeemEvent {
    const KIND: EventKind = EventKind::Redeem;
}

impl Event for EarlyRedeemEvent {
    const KIND: EventKind = EventKind::EarlyRedeem;
}

impl Event for TopUpYieldEvent {
    const KIND: EventKind = EventKind::TopUpYield;
}

impl StakeEvent {
    pub fn new(user: &Pubkey, amount: u64, tier: u8, timestamp: i64) -> Self {
        Self { user: user.to_bytes(), amount, tier: tier as u64, timestamp }
    }
}

impl RedeemEvent {
    pub fn new(user: &Pubkey, principal: u64, interest: u64, timestamp: i64) -> Self {
        Self { user: user.to_bytes(), principal, interest, timestamp }
    }
}

impl EarlyRedeemEvent {
    pub fn new(user: &Pubkey, principal: u64, penalty: u64, interest: u64, timestamp: i64) -> Self {
        Self { user: user.to_bytes(), principal, penalty, interest, timestamp }
    }
}

impl TopUpYieldEvent {
    pub fn new(admin: &Pubkey, amount: u64, timestamp: i64) -> Self {
        Self { admin: admin.to_bytes(), amount, timestamp }
    }
}

/// Kind tag and record bytes, as written to the log.
pub fn record<E: Event>(event: &E) -> (u8, &[u8]) {
    (E::KIND as u8, bytemuck::bytes_of(event))
}

/// Decode a record from its logged bytes. `None` on a kind or length mismatch.
pub fn decode<E: Event>(kind: u8, bytes: &[u8]) -> Option<E> {
    if EventKind::from_u8(kind)? != E::KIND || bytes.len() != core::mem::size_of::<E>() {
        return None;
    }
    Some(bytemuck::pod_read_unaligned(bytes))
}

pub fn emit<E: Event>(event: &E) {
    let (kind, bytes) = record(event);
    sol_log_data(&[&[kind], bytes]);
}

pub fn emit_stake(event: &StakeEvent, memo: Option<&str>) {
    let (kind, bytes) = record(event);
    match memo {
        Some(memo) => sol_log_data(&[&[kind], bytes, memo.as_bytes()]),
        None => sol_log_data(&[&[kind], bytes]),
    }
}
