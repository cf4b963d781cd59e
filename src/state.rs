use bytemuck::{Pod, Zeroable};
use solana_program::pubkey::Pubkey;

use crate::math::{self, Accrual};

pub const CONFIG_SEED: &[u8] = b"config";
pub const PRINCIPAL_VAULT_SEED: &[u8] = b"principal-vault";
pub const YIELD_VAULT_SEED: &[u8] = b"yield-vault";
pub const STFIX_MINT_SEED: &[u8] = b"stfix-mint";
pub const POSITION_SEED: &[u8] = b"position";

/// Maximum number of allow-listed depositors.
pub const MAX_WHITELIST: usize = 10;

/// STFIX receipt decimals (matches lamports).
pub const STFIX_DECIMALS: u8 = 9;

/// Pool configuration (singleton).
/// PDA seeds: [b"config"]
///
/// Also the mint authority of the STFIX receipt mint, so the program
/// signs mint_to with these seeds.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Config {
    /// One-time initialization guard (1 = yes, 0 = no)
    pub is_initialized: u8,

    /// Bump seed for the config PDA
    pub bump: u8,

    pub principal_vault_bump: u8,
    pub yield_vault_bump: u8,
    pub mint_bump: u8,

    /// Only allow-listed wallets may deposit (1 = yes)
    pub whitelist_only: u8,

    /// Number of live entries in `whitelist`
    pub whitelist_len: u8,

    /// Padding for alignment
    pub _padding: [u8; 1],

    /// Admin (updates parameters, manages whitelist, tops up yield)
    pub admin: [u8; 32],

    /// STFIX receipt mint (authority = this config PDA)
    pub stfix_mint: [u8; 32],

    /// Lamport vault holding staked principal
    pub principal_vault: [u8; 32],

    /// Lamport vault holding the yield reserve
    pub yield_vault: [u8; 32],

    /// Annualized rate for the 30-day tier, basis points
    pub yield_rate_30: u64,

    /// Annualized rate for the 90-day tier, basis points
    pub yield_rate_90: u64,

    /// Delay between RequestWithdraw and a penalty-free Withdraw
    pub cooldown_seconds: i64,

    /// Haircut on principal for withdrawals before the cooldown ends
    pub penalty_rate_bps: u64,

    /// Sum of principal across open positions
    pub total_principal: u64,

    /// STFIX receipts outstanding. Always equals `total_principal`
    pub total_receipts: u64,

    /// Lifetime yield paid out or compounded into principal
    pub total_interest_paid: u64,

    /// Lifetime early-exit penalties retained in the principal vault
    pub total_penalties: u64,

    pub open_positions: u64,

    pub whitelist: [[u8; 32]; MAX_WHITELIST],

    /// Reserved for future use
    pub _reserved: [u8; 64],
}

/// Size of Config in bytes
pub const CONFIG_SIZE: usize = core::mem::size_of::<Config>();

/// Lock tier. Only selects the yield rate; exits are governed by the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTier {
    ThirtyDays,
    NinetyDays,
}

impl LockTier {
    pub fn from_days(days: u8) -> Option<Self> {
        match days {
            30 => Some(Self::ThirtyDays),
            90 => Some(Self::NinetyDays),
            _ => None,
        }
    }

    pub fn days(&self) -> u8 {
        match self {
            Self::ThirtyDays => 30,
            Self::NinetyDays => 90,
        }
    }
}

impl Config {
    pub fn admin_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.admin)
    }

    pub fn stfix_mint_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.stfix_mint)
    }

    pub fn principal_vault_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.principal_vault)
    }

    pub fn yield_vault_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.yield_vault)
    }

    pub fn rate_for_tier(&self, tier: LockTier) -> u64 {
        match tier {
            LockTier::ThirtyDays => self.yield_rate_30,
            LockTier::NinetyDays => self.yield_rate_90,
        }
    }

    pub fn whitelisted(&self) -> &[[u8; 32]] {
        let len = (self.whitelist_len as usize).min(MAX_WHITELIST);
        &self.whitelist[..len]
    }

    pub fn is_whitelisted(&self, user: &Pubkey) -> bool {
        let key = user.to_bytes();
        self.whitelisted().iter().any(|w| *w == key)
    }

    /// Whitelist gate for deposits. Open pools admit everyone.
    pub fn may_deposit(&self, user: &Pubkey) -> bool {
        self.whitelist_only == 0 || self.is_whitelisted(user)
    }
}

/// Observable lifecycle state of a position.
/// A Closed position is zeroed and reads back as `Unopened`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    Unopened,
    Active,
    CooldownPending,
    Withdrawable,
}

/// Per-depositor position.
/// PDA seeds: [b"position", config_pda, owner]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// Whether this record is initialized
    pub is_initialized: u8,

    /// Bump seed for the position PDA
    pub bump: u8,

    /// Lock tier in days (30 or 90)
    pub tier: u8,

    /// 1 when `withdraw_requested_at` is meaningful
    pub has_withdraw_request: u8,

    /// Padding
    pub _padding: [u8; 4],

    /// The config (pool) this position belongs to
    pub config: [u8; 32],

    /// The depositor
    pub owner: [u8; 32],

    /// Staked lamports
    pub principal: u64,

    /// STFIX minted against this position. Always equals `principal`
    pub receipts: u64,

    /// Timestamp the position was opened
    pub deposit_timestamp: i64,

    /// Timestamp yield was last checkpointed
    pub checkpoint_timestamp: i64,

    /// Yield checkpointed but not yet paid
    pub accrued_yield: u64,

    /// Sub-unit yield numerator carried between checkpoints
    pub accrued_remainder: u64,

    /// Valid only when `has_withdraw_request == 1`
    pub withdraw_requested_at: i64,

    /// Reserved for future use
    pub _reserved: [u8; 32],
}

/// Size of Position in bytes
pub const POSITION_SIZE: usize = core::mem::size_of::<Position>();

impl Position {
    pub fn owner_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.owner)
    }

    pub fn config_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.config)
    }

    pub fn lock_tier(&self) -> Option<LockTier> {
        LockTier::from_days(self.tier)
    }

    pub fn withdraw_requested_at(&self) -> Option<i64> {
        (self.has_withdraw_request == 1).then_some(self.withdraw_requested_at)
    }

    pub fn status(&self, now: i64, cooldown_seconds: i64) -> PositionStatus {
        if self.is_initialized != 1 {
            return PositionStatus::Unopened;
        }
        match self.withdraw_requested_at() {
            None => PositionStatus::Active,
            Some(at) if math::cooldown_elapsed(at, cooldown_seconds, now) => {
                PositionStatus::Withdrawable
            }
            Some(_) => PositionStatus::CooldownPending,
        }
    }

    /// Bring accrued yield up to `now` at the position's tier rate.
    /// Delegates to pure math module (Kani-verified).
    pub fn accrue(&self, config: &Config, now: i64) -> Option<Accrual> {
        let rate = self.lock_tier().map(|t| config.rate_for_tier(t)).unwrap_or(0);
        math::accrue_yield(
            self.principal,
            rate,
            self.accrued_yield,
            self.accrued_remainder,
            self.checkpoint_timestamp,
            now,
        )
    }

    /// Accrue and store the checkpoint in place.
    pub fn checkpoint(&mut self, config: &Config, now: i64) -> Option<()> {
        let a = self.accrue(config, now)?;
        self.accrued_yield = a.accrued_yield;
        self.accrued_remainder = a.remainder;
        self.checkpoint_timestamp = a.checkpoint;
        Some(())
    }
}

/// Canonical addresses and bumps of the singleton pool accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAccounts {
    pub config: (Pubkey, u8),
    pub principal_vault: (Pubkey, u8),
    pub yield_vault: (Pubkey, u8),
    pub stfix_mint: (Pubkey, u8),
}

impl PoolAccounts {
    pub fn derive(program_id: &Pubkey) -> Self {
        Self {
            config: derive_config_pda(program_id),
            principal_vault: derive_principal_vault(program_id),
            yield_vault: derive_yield_vault(program_id),
            stfix_mint: derive_stfix_mint(program_id),
        }
    }
}

/// Derive the config PDA (the pool identifier and STFIX mint authority).
pub fn derive_config_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

pub fn derive_principal_vault(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[PRINCIPAL_VAULT_SEED], program_id)
}

pub fn derive_yield_vault(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[YIELD_VAULT_SEED], program_id)
}

pub fn derive_stfix_mint(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STFIX_MINT_SEED], program_id)
}

/// Derive the per-depositor position PDA.
pub fn derive_position_pda(program_id: &Pubkey, config: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[POSITION_SEED, config.as_ref(), owner.as_ref()], program_id)
}
