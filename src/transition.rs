//! Pure state transitions for every instruction.
//!
//! Each handler takes a snapshot of the accounts it touches (`Ledger`) and
//! returns the replacement snapshot plus the value movements the processor
//! must carry out (`Settlement`). Nothing here talks to the runtime, so an
//! `Err` leaves the caller's snapshot exactly as it was.

use bytemuck::Zeroable;
use solana_program::pubkey::Pubkey;

use crate::error::StakeError;
use crate::math;
use crate::state::{Config, LockTier, PoolAccounts, Position, PositionStatus, MAX_WHITELIST};
use crate::vault::VaultBalances;

/// Accounts read by a position instruction.
#[derive(Debug, Clone, Copy)]
pub struct Ledger {
    pub config: Config,
    pub position: Position,
    pub vaults: VaultBalances,
}

/// Value movements implied by a transition, all in lamports / receipt units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Depositor → principal vault
    pub principal_in: u64,
    /// Principal vault → depositor
    pub principal_out: u64,
    /// Admin → yield vault
    pub yield_in: u64,
    /// Yield vault → depositor
    pub yield_out: u64,
    /// Yield vault → principal vault (compounding)
    pub yield_to_principal: u64,
    pub receipts_minted: u64,
    pub receipts_burned: u64,
    /// Haircut kept in the principal vault
    pub penalty: u64,
    /// Position account is reclaimed
    pub close_position: bool,
    /// Withdrawal ran before the cooldown elapsed
    pub early: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub ledger: Ledger,
    pub settlement: Settlement,
}

/// Initialize arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParams {
    pub yield_rate_30: u64,
    pub yield_rate_90: u64,
    pub cooldown_seconds: i64,
    pub penalty_rate_bps: u64,
    pub whitelist_only: bool,
}

/// UpdateParameters arguments. `None` leaves the field unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamUpdate {
    pub yield_rate_30: Option<u64>,
    pub yield_rate_90: Option<u64>,
    pub cooldown_seconds: Option<i64>,
    pub penalty_rate_bps: Option<u64>,
    pub whitelist_only: Option<bool>,
}

fn validate_params(rate_30: u64, rate_90: u64, cooldown: i64, penalty: u64) -> Result<(), StakeError> {
    if !math::is_valid_bps(rate_30) || !math::is_valid_bps(rate_90) || !math::is_valid_bps(penalty) {
        return Err(StakeError::InvalidParameter);
    }
    if cooldown < 0 {
        return Err(StakeError::InvalidParameter);
    }
    Ok(())
}

fn ensure_initialized(config: &Config) -> Result<(), StakeError> {
    if config.is_initialized != 1 {
        return Err(StakeError::NotInitialized);
    }
    Ok(())
}

fn ensure_admin(config: &Config, signer: &Pubkey) -> Result<(), StakeError> {
    ensure_initialized(config)?;
    if config.admin != signer.to_bytes() {
        return Err(StakeError::Unauthorized);
    }
    Ok(())
}

fn ensure_owner(position: &Position, owner: &Pubkey) -> Result<(), StakeError> {
    if position.is_initialized == 1 && position.owner != owner.to_bytes() {
        return Err(StakeError::Unauthorized);
    }
    Ok(())
}

fn add(a: u64, b: u64) -> Result<u64, StakeError> {
    a.checked_add(b).ok_or(StakeError::ArithmeticOverflow)
}

fn sub(a: u64, b: u64) -> Result<u64, StakeError> {
    a.checked_sub(b).ok_or(StakeError::ArithmeticOverflow)
}

/// Yield engine entry point: `(accrued_yield, checkpoint)` as of `now`.
pub fn accrue(position: &Position, now: i64, config: &Config) -> Result<(u64, i64), StakeError> {
    let a = position.accrue(config, now).ok_or(StakeError::ArithmeticOverflow)?;
    Ok((a.accrued_yield, a.checkpoint))
}

fn checkpoint(position: &mut Position, config: &Config, now: i64) -> Result<(), StakeError> {
    position.checkpoint(config, now).ok_or(StakeError::ArithmeticOverflow)
}

/// The principal vault must cover every open position's principal.
fn ensure_principal_backed(ledger: &Ledger) -> Result<(), StakeError> {
    if ledger.vaults.principal < ledger.config.total_principal {
        return Err(StakeError::InsufficientFunds);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// Config store
// ═══════════════════════════════════════════════════════════════

pub fn initialize(
    config: &Config,
    admin: &Pubkey,
    accounts: &PoolAccounts,
    params: &PoolParams,
) -> Result<Config, StakeError> {
    if config.is_initialized != 0 {
        return Err(StakeError::AlreadyInitialized);
    }
    validate_params(
        params.yield_rate_30,
        params.yield_rate_90,
        params.cooldown_seconds,
        params.penalty_rate_bps,
    )?;

    let mut next = Config::zeroed();
    next.is_initialized = 1;
    next.bump = accounts.config.1;
    next.principal_vault_bump = accounts.principal_vault.1;
    next.yield_vault_bump = accounts.yield_vault.1;
    next.mint_bump = accounts.stfix_mint.1;
    next.admin = admin.to_bytes();
    next.stfix_mint = accounts.stfix_mint.0.to_bytes();
    next.principal_vault = accounts.principal_vault.0.to_bytes();
    next.yield_vault = accounts.yield_vault.0.to_bytes();
    next.yield_rate_30 = params.yield_rate_30;
    next.yield_rate_90 = params.yield_rate_90;
    next.cooldown_seconds = params.cooldown_seconds;
    next.penalty_rate_bps = params.penalty_rate_bps;
    next.whitelist_only = params.whitelist_only as u8;
    Ok(next)
}

pub fn update_parameters(
    config: &Config,
    signer: &Pubkey,
    update: &ParamUpdate,
) -> Result<Config, StakeError> {
    ensure_admin(config, signer)?;

    let mut next = *config;
    if let Some(rate) = update.yield_rate_30 {
        next.yield_rate_30 = rate;
    }
    if let Some(rate) = update.yield_rate_90 {
        next.yield_rate_90 = rate;
    }
    if let Some(cooldown) = update.cooldown_seconds {
        next.cooldown_seconds = cooldown;
    }
    if let Some(penalty) = update.penalty_rate_bps {
        next.penalty_rate_bps = penalty;
    }
    if let Some(flag) = update.whitelist_only {
        next.whitelist_only = flag as u8;
    }
    validate_params(next.yield_rate_30, next.yield_rate_90, next.cooldown_seconds, next.penalty_rate_bps)?;
    Ok(next)
}

pub fn add_to_whitelist(config: &Config, signer: &Pubkey, user: &Pubkey) -> Result<Config, StakeError> {
    ensure_admin(config, signer)?;
    if config.is_whitelisted(user) {
        return Ok(*config);
    }
    let len = config.whitelist_len as usize;
    if len >= MAX_WHITELIST {
        return Err(StakeError::WhitelistFull);
    }
    let mut next = *config;
    next.whitelist[len] = user.to_bytes();
    next.whitelist_len += 1;
    Ok(next)
}

/// Swap-remove; order of the allow-list is not meaningful.
pub fn remove_from_whitelist(config: &Config, signer: &Pubkey, user: &Pubkey) -> Result<Config, StakeError> {
    ensure_admin(config, signer)?;
    let key = user.to_bytes();
    let mut next = *config;
    let len = next.whitelisted().len();
    if let Some(idx) = next.whitelisted().iter().position(|w| *w == key) {
        next.whitelist.swap(idx, len - 1);
        next.whitelist[len - 1] = [0u8; 32];
        next.whitelist_len -= 1;
    }
    Ok(next)
}

pub fn transfer_admin(config: &Config, signer: &Pubkey, new_admin: &Pubkey) -> Result<Config, StakeError> {
    ensure_admin(config, signer)?;
    if *new_admin == Pubkey::default() {
        return Err(StakeError::InvalidParameter);
    }
    let mut next = *config;
    next.admin = new_admin.to_bytes();
    Ok(next)
}

/// Admin funds the yield reserve.
pub fn top_up_yield(ledger: &Ledger, signer: &Pubkey, amount: u64) -> Result<Transition, StakeError> {
    ensure_admin(&ledger.config, signer)?;
    if amount == 0 {
        return Err(StakeError::ZeroAmount);
    }
    let mut next = *ledger;
    next.vaults.credit_yield(amount)?;
    Ok(Transition {
        ledger: next,
        settlement: Settlement { yield_in: amount, ..Settlement::default() },
    })
}

// ═══════════════════════════════════════════════════════════════
// Position lifecycle
// ═══════════════════════════════════════════════════════════════

/// Deposit: Unopened | Active → Active.
pub fn deposit(
    ledger: &Ledger,
    pool: &Pubkey,
    owner: &Pubkey,
    amount: u64,
    tier_days: u8,
    now: i64,
) -> Result<Transition, StakeError> {
    ensure_initialized(&ledger.config)?;
    if !ledger.config.may_deposit(owner) {
        return Err(StakeError::WhitelistRequired);
    }
    if amount == 0 {
        return Err(StakeError::ZeroAmount);
    }
    let tier = LockTier::from_days(tier_days).ok_or(StakeError::InvalidTier)?;
    ensure_owner(&ledger.position, owner)?;

    let mut next = *ledger;
    let config = &mut next.config;
    let position = &mut next.position;

    match position.status(now, config.cooldown_seconds) {
        PositionStatus::Unopened => {
            *position = Position::zeroed();
            position.is_initialized = 1;
            position.tier = tier.days();
            position.config = pool.to_bytes();
            position.owner = owner.to_bytes();
            position.deposit_timestamp = now;
            position.checkpoint_timestamp = now;
            config.open_positions = add(config.open_positions, 1)?;
        }
        PositionStatus::Active => {
            if position.lock_tier() != Some(tier) {
                return Err(StakeError::TierMismatch);
            }
            checkpoint(position, config, now)?;
        }
        PositionStatus::CooldownPending | PositionStatus::Withdrawable => {
            return Err(StakeError::WithdrawPending);
        }
    }

    position.principal = add(position.principal, amount)?;
    position.receipts = add(position.receipts, amount)?;
    config.total_principal = add(config.total_principal, amount)?;
    config.total_receipts = add(config.total_receipts, amount)?;
    next.vaults.credit_principal(amount)?;
    ensure_principal_backed(&next)?;

    Ok(Transition {
        ledger: next,
        settlement: Settlement {
            principal_in: amount,
            receipts_minted: amount,
            ..Settlement::default()
        },
    })
}

/// RequestWithdraw: Active → CooldownPending.
pub fn request_withdraw(ledger: &Ledger, owner: &Pubkey, now: i64) -> Result<Transition, StakeError> {
    ensure_initialized(&ledger.config)?;
    ensure_owner(&ledger.position, owner)?;

    let mut next = *ledger;
    let position = &mut next.position;
    if position.status(now, next.config.cooldown_seconds) != PositionStatus::Active
        || position.principal == 0
    {
        return Err(StakeError::NoActivePosition);
    }

    checkpoint(position, &next.config, now)?;
    position.has_withdraw_request = 1;
    position.withdraw_requested_at = now;

    Ok(Transition { ledger: next, settlement: Settlement::default() })
}

/// CancelWithdrawRequest: CooldownPending | Withdrawable → Active. No penalty.
pub fn cancel_withdraw_request(ledger: &Ledger, owner: &Pubkey, now: i64) -> Result<Transition, StakeError> {
    ensure_initialized(&ledger.config)?;
    ensure_owner(&ledger.position, owner)?;

    let mut next = *ledger;
    let position = &mut next.position;
    match position.status(now, next.config.cooldown_seconds) {
        PositionStatus::CooldownPending | PositionStatus::Withdrawable => {}
        _ => return Err(StakeError::NoWithdrawRequest),
    }

    checkpoint(position, &next.config, now)?;
    position.has_withdraw_request = 0;
    position.withdraw_requested_at = 0;

    Ok(Transition { ledger: next, settlement: Settlement::default() })
}

/// Withdraw: CooldownPending | Withdrawable → Closed.
///
/// After the cooldown the full principal is returned. Before it, the penalty
/// is carved out of principal and stays in the principal vault. Accrued yield
/// is paid in full either way.
///
/// Principal and yield leave together or not at all. If the yield vault holds
/// less than the accrued yield, the whole withdrawal fails with
/// `InsufficientFunds` and the principal stays locked until the admin tops the
/// yield vault up. There is no principal-only exit.
pub fn withdraw(ledger: &Ledger, owner: &Pubkey, now: i64) -> Result<Transition, StakeError> {
    ensure_initialized(&ledger.config)?;
    ensure_owner(&ledger.position, owner)?;

    let mut next = *ledger;
    let config = &mut next.config;
    let position = &mut next.position;

    let early = match position.status(now, config.cooldown_seconds) {
        PositionStatus::Withdrawable => false,
        PositionStatus::CooldownPending => true,
        _ => return Err(StakeError::NoWithdrawRequest),
    };

    checkpoint(position, config, now)?;

    let principal = position.principal;
    let (payout, penalty) = if early {
        math::split_penalty(principal, config.penalty_rate_bps).ok_or(StakeError::ArithmeticOverflow)?
    } else {
        (principal, 0)
    };
    let interest = position.accrued_yield;

    next.vaults.debit_principal(payout)?;
    next.vaults.debit_yield(interest)?;

    config.total_principal = sub(config.total_principal, principal)?;
    config.total_receipts = sub(config.total_receipts, position.receipts)?;
    config.total_interest_paid = add(config.total_interest_paid, interest)?;
    config.total_penalties = add(config.total_penalties, penalty)?;
    config.open_positions = sub(config.open_positions, 1)?;

    let receipts = position.receipts;
    *position = Position::zeroed();
    ensure_principal_backed(&next)?;

    Ok(Transition {
        ledger: next,
        settlement: Settlement {
            principal_out: payout,
            yield_out: interest,
            receipts_burned: receipts,
            penalty,
            close_position: true,
            early,
            ..Settlement::default()
        },
    })
}

/// ExtendLock: compound accrued yield into principal and switch tier.
/// Compounded yield is minted as receipts so principal stays 1:1 backed.
pub fn extend_lock(
    ledger: &Ledger,
    owner: &Pubkey,
    tier_days: u8,
    now: i64,
) -> Result<Transition, StakeError> {
    ensure_initialized(&ledger.config)?;
    ensure_owner(&ledger.position, owner)?;
    let tier = LockTier::from_days(tier_days).ok_or(StakeError::InvalidTier)?;

    let mut next = *ledger;
    let config = &mut next.config;
    let position = &mut next.position;
    if position.status(now, config.cooldown_seconds) != PositionStatus::Active {
        return Err(StakeError::NoActivePosition);
    }

    checkpoint(position, config, now)?;
    let interest = position.accrued_yield;

    next.vaults.debit_yield(interest)?;
    next.vaults.credit_principal(interest)?;

    position.principal = add(position.principal, interest)?;
    position.receipts = add(position.receipts, interest)?;
    position.accrued_yield = 0;
    position.tier = tier.days();

    config.total_principal = add(config.total_principal, interest)?;
    config.total_receipts = add(config.total_receipts, interest)?;
    config.total_interest_paid = add(config.total_interest_paid, interest)?;
    ensure_principal_backed(&next)?;

    Ok(Transition {
        ledger: next,
        settlement: Settlement {
            yield_to_principal: interest,
            receipts_minted: interest,
            ..Settlement::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PoolParams {
        PoolParams {
            yield_rate_30: 500,
            yield_rate_90: 1500,
            cooldown_seconds: 3600,
            penalty_rate_bps: 300,
            whitelist_only: false,
        }
    }

    fn pool_accounts() -> PoolAccounts {
        PoolAccounts::derive(&Pubkey::new_unique())
    }

    fn ledger(admin: &Pubkey) -> Ledger {
        let config = initialize(&Config::zeroed(), admin, &pool_accounts(), &params()).unwrap();
        Ledger { config, position: Position::zeroed(), vaults: VaultBalances::new(0, 1_000_000) }
    }

    #[test]
    fn test_update_rejects_out_of_range_merge() {
        let admin = Pubkey::new_unique();
        let l = ledger(&admin);
        let bad = ParamUpdate { penalty_rate_bps: Some(10_001), ..ParamUpdate::default() };
        assert_eq!(update_parameters(&l.config, &admin, &bad).unwrap_err(), StakeError::InvalidParameter);
        let neg = ParamUpdate { cooldown_seconds: Some(-1), ..ParamUpdate::default() };
        assert_eq!(update_parameters(&l.config, &admin, &neg).unwrap_err(), StakeError::InvalidParameter);
    }

    #[test]
    fn test_whitelist_swap_remove_keeps_list_compact() {
        let admin = Pubkey::new_unique();
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let mut cfg = ledger(&admin).config;
        for u in [&a, &b, &c] {
            cfg = add_to_whitelist(&cfg, &admin, u).unwrap();
        }
        cfg = remove_from_whitelist(&cfg, &admin, &a).unwrap();
        assert_eq!(cfg.whitelist_len, 2);
        assert!(!cfg.is_whitelisted(&a));
        assert!(cfg.is_whitelisted(&b) && cfg.is_whitelisted(&c));
        assert_eq!(cfg.whitelist[2], [0u8; 32]);
    }

    #[test]
    fn test_whitelist_full() {
        let admin = Pubkey::new_unique();
        let mut cfg = ledger(&admin).config;
        for _ in 0..MAX_WHITELIST {
            cfg = add_to_whitelist(&cfg, &admin, &Pubkey::new_unique()).unwrap();
        }
        assert_eq!(
            add_to_whitelist(&cfg, &admin, &Pubkey::new_unique()).unwrap_err(),
            StakeError::WhitelistFull
        );
    }

    #[test]
    fn test_deposit_does_not_mutate_input_on_error() {
        let admin = Pubkey::new_unique();
        let l = ledger(&admin);
        let before = l.config.total_principal;
        assert!(deposit(&l, &Pubkey::new_unique(), &Pubkey::new_unique(), 1000, 45, 0).is_err());
        assert_eq!(l.config.total_principal, before);
        assert_eq!(l.position.is_initialized, 0);
    }

    #[test]
    fn test_other_user_cannot_touch_position() {
        let admin = Pubkey::new_unique();
        let (pool, alice, mallory) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let t = deposit(&ledger(&admin), &pool, &alice, 1000, 30, 0).unwrap();
        assert_eq!(request_withdraw(&t.ledger, &mallory, 10).unwrap_err(), StakeError::Unauthorized);
    }
}
