use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    sysvar::{clock::Clock, Sysvar},
};

use crate::cpi;
use crate::error::StakeError;
use crate::events::{self, EarlyRedeemEvent, RedeemEvent, StakeEvent, TopUpYieldEvent};
use crate::instruction::StakeInstruction;
use crate::state::{
    self, Config, PoolAccounts, Position, CONFIG_SEED, CONFIG_SIZE, POSITION_SEED,
    POSITION_SIZE, PRINCIPAL_VAULT_SEED, STFIX_DECIMALS, STFIX_MINT_SEED, YIELD_VAULT_SEED,
};
use crate::transition::{self, Ledger, ParamUpdate, PoolParams, Transition};
use crate::vault::{self, VaultBalances};

use bytemuck::Zeroable;

pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = StakeInstruction::unpack(instruction_data)?;

    match instruction {
        StakeInstruction::Initialize {
            yield_rate_30, yield_rate_90, cooldown_seconds, penalty_rate_bps, whitelist_only,
        } => {
            let params = PoolParams {
                yield_rate_30,
                yield_rate_90,
                cooldown_seconds,
                penalty_rate_bps,
                whitelist_only,
            };
            process_initialize(program_id, accounts, &params)
        }
        StakeInstruction::UpdateParameters {
            yield_rate_30, yield_rate_90, cooldown_seconds, penalty_rate_bps, whitelist_only,
        } => {
            let update = ParamUpdate {
                yield_rate_30,
                yield_rate_90,
                cooldown_seconds,
                penalty_rate_bps,
                whitelist_only,
            };
            process_update_parameters(program_id, accounts, &update)
        }
        StakeInstruction::Deposit { amount, tier, memo } => {
            process_deposit(program_id, accounts, amount, tier, memo.as_deref())
        }
        StakeInstruction::RequestWithdraw => {
            process_request_withdraw(program_id, accounts)
        }
        StakeInstruction::CancelWithdrawRequest => {
            process_cancel_withdraw_request(program_id, accounts)
        }
        StakeInstruction::Withdraw => {
            process_withdraw(program_id, accounts)
        }
        StakeInstruction::ExtendLock { tier } => {
            process_extend_lock(program_id, accounts, tier)
        }
        StakeInstruction::TopUpYield { amount } => {
            process_top_up_yield(program_id, accounts, amount)
        }
        StakeInstruction::AddToWhitelist { user } => {
            process_admin_config(program_id, accounts, |config, admin| {
                transition::add_to_whitelist(config, admin, &user)
            })?;
            msg!("Whitelisted {}", user);
            Ok(())
        }
        StakeInstruction::RemoveFromWhitelist { user } => {
            process_admin_config(program_id, accounts, |config, admin| {
                transition::remove_from_whitelist(config, admin, &user)
            })?;
            msg!("Removed {} from whitelist", user);
            Ok(())
        }
        StakeInstruction::TransferAdmin { new_admin } => {
            process_admin_config(program_id, accounts, |config, admin| {
                transition::transfer_admin(config, admin, &new_admin)
            })?;
            msg!("Admin transferred to {}", new_admin);
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// Helpers: load / store account snapshots
// ═══════════════════════════════════════════════════════════════

/// Verify the config PDA and copy its state out.
///
/// The copy means no data borrow is held across CPIs that pass the config
/// account as mint authority.
fn load_config(program_id: &Pubkey, config_pda: &AccountInfo) -> Result<Config, ProgramError> {
    let (expected, _) = state::derive_config_pda(program_id);
    if *config_pda.key != expected {
        return Err(StakeError::InvalidAccount.into());
    }
    vault::ensure_owned_by(config_pda, program_id)?;

    let data = config_pda.try_borrow_data()?;
    if data.len() < CONFIG_SIZE {
        return Err(StakeError::NotInitialized.into());
    }
    let config: Config = bytemuck::pod_read_unaligned(&data[..CONFIG_SIZE]);
    if config.is_initialized != 1 {
        return Err(StakeError::NotInitialized.into());
    }
    Ok(config)
}

fn store_config(config_pda: &AccountInfo, config: &Config) -> ProgramResult {
    let mut data = config_pda.try_borrow_mut_data()?;
    let slot = data.get_mut(..CONFIG_SIZE).ok_or(StakeError::InvalidAccount)?;
    slot.copy_from_slice(bytemuck::bytes_of(config));
    Ok(())
}

/// Verify the position PDA for (config, owner) and copy its state out.
/// An account with no data reads as a zeroed (Unopened) position, including
/// one that already holds lamports sent by someone else.
fn load_position(
    program_id: &Pubkey,
    config_pda: &AccountInfo,
    owner: &AccountInfo,
    position_pda: &AccountInfo,
) -> Result<(Position, u8), ProgramError> {
    let (expected, bump) = state::derive_position_pda(program_id, config_pda.key, owner.key);
    if *position_pda.key != expected {
        return Err(StakeError::InvalidAccount.into());
    }
    if position_pda.data_is_empty() {
        return Ok((Position::zeroed(), bump));
    }
    vault::ensure_owned_by(position_pda, program_id)?;

    let data = position_pda.try_borrow_data()?;
    if data.len() < POSITION_SIZE {
        return Err(StakeError::InvalidAccount.into());
    }
    let position: Position = bytemuck::pod_read_unaligned(&data[..POSITION_SIZE]);
    Ok((position, bump))
}

fn store_position(position_pda: &AccountInfo, position: &Position) -> ProgramResult {
    let mut data = position_pda.try_borrow_mut_data()?;
    let slot = data.get_mut(..POSITION_SIZE).ok_or(StakeError::InvalidAccount)?;
    slot.copy_from_slice(bytemuck::bytes_of(position));
    Ok(())
}

/// Vault address must match the one recorded at Initialize, and the
/// account must still belong to this program.
fn verify_vault(program_id: &Pubkey, vault_account: &AccountInfo, expected: &Pubkey) -> ProgramResult {
    if vault_account.key != expected {
        return Err(StakeError::InvalidAccount.into());
    }
    vault::ensure_owned_by(vault_account, program_id)
}

fn verify_mint(config: &Config, mint: &AccountInfo) -> ProgramResult {
    if *mint.key != config.stfix_mint_pubkey() {
        return Err(StakeError::InvalidAccount.into());
    }
    Ok(())
}

/// Run an admin-only config transition: admin signs, config is rewritten.
fn process_admin_config<F>(program_id: &Pubkey, accounts: &[AccountInfo], apply: F) -> ProgramResult
where
    F: FnOnce(&Config, &Pubkey) -> Result<Config, StakeError>,
{
    let accounts_iter = &mut accounts.iter();

    let admin = next_account_info(accounts_iter)?;
    let config_pda = next_account_info(accounts_iter)?;

    if !admin.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let config = load_config(program_id, config_pda)?;
    let next = apply(&config, admin.key)?;
    store_config(config_pda, &next)
}

// ═══════════════════════════════════════════════════════════════
// 0: Initialize
// ═══════════════════════════════════════════════════════════════

fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    params: &PoolParams,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let admin = next_account_info(accounts_iter)?;
    let config_pda = next_account_info(accounts_iter)?;
    let principal_vault = next_account_info(accounts_iter)?;
    let yield_vault = next_account_info(accounts_iter)?;
    let stfix_mint = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;
    let rent_sysvar = next_account_info(accounts_iter)?;

    if !admin.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let pool = PoolAccounts::derive(program_id);
    if *config_pda.key != pool.config.0
        || *principal_vault.key != pool.principal_vault.0
        || *yield_vault.key != pool.yield_vault.0
        || *stfix_mint.key != pool.stfix_mint.0
    {
        return Err(StakeError::InvalidAccount.into());
    }

    if !config_pda.data_is_empty() {
        return Err(StakeError::AlreadyInitialized.into());
    }

    // Validate programs BEFORE any invoke_signed that grants PDA signer authority
    cpi::verify_token_program(token_program)?;
    cpi::verify_system_program(system_program)?;

    // Reject bad parameters before paying for any account
    let config = transition::initialize(&Config::zeroed(), admin.key, &pool, params)?;

    let rent = Rent::from_account_info(rent_sysvar)?;

    cpi::create_pda_account(
        admin, config_pda, system_program, &rent, CONFIG_SIZE, program_id,
        &[CONFIG_SEED, &[pool.config.1]],
    )?;
    cpi::create_pda_account(
        admin, principal_vault, system_program, &rent, 0, program_id,
        &[PRINCIPAL_VAULT_SEED, &[pool.principal_vault.1]],
    )?;
    cpi::create_pda_account(
        admin, yield_vault, system_program, &rent, 0, program_id,
        &[YIELD_VAULT_SEED, &[pool.yield_vault.1]],
    )?;
    cpi::create_pda_account(
        admin, stfix_mint, system_program, &rent, spl_token::state::Mint::LEN, &spl_token::id(),
        &[STFIX_MINT_SEED, &[pool.stfix_mint.1]],
    )?;
    cpi::initialize_mint(token_program, stfix_mint, config_pda.key, rent_sysvar, STFIX_DECIMALS)?;

    store_config(config_pda, &config)?;

    msg!(
        "Config initialized: admin {}, rates {}/{} bps, cooldown {}s, penalty {} bps",
        admin.key,
        config.yield_rate_30,
        config.yield_rate_90,
        config.cooldown_seconds,
        config.penalty_rate_bps,
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 1: UpdateParameters
// ═══════════════════════════════════════════════════════════════

fn process_update_parameters(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    update: &ParamUpdate,
) -> ProgramResult {
    process_admin_config(program_id, accounts, |config, admin| {
        transition::update_parameters(config, admin, update)
    })?;

    msg!("Parameters updated");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 2: Deposit
// ═══════════════════════════════════════════════════════════════

fn process_deposit(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    amount: u64,
    tier: u8,
    memo: Option<&str>,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let user = next_account_info(accounts_iter)?;
    let config_pda = next_account_info(accounts_iter)?;
    let position_pda = next_account_info(accounts_iter)?;
    let principal_vault = next_account_info(accounts_iter)?;
    let stfix_mint = next_account_info(accounts_iter)?;
    let user_receipt = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !user.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let config = load_config(program_id, config_pda)?;
    verify_vault(program_id, principal_vault, &config.principal_vault_pubkey())?;
    verify_mint(&config, stfix_mint)?;

    // CRITICAL: the config PDA signs mint_to below; a fake token program
    // would receive that authority.
    cpi::verify_token_program(token_program)?;
    cpi::verify_system_program(system_program)?;

    let clock = Clock::from_account_info(clock_sysvar)?;
    let rent = Rent::get()?;
    let (position, position_bump) = load_position(program_id, config_pda, user, position_pda)?;

    let ledger = Ledger {
        config,
        position,
        vaults: VaultBalances::new(vault::available_balance(principal_vault, &rent), 0),
    };
    let Transition { ledger: mut next, settlement } = transition::deposit(
        &ledger, config_pda.key, user.key, amount, tier, clock.unix_timestamp,
    )?;

    // Lamports alone do not make a position; create_pda_account adopts a
    // pre-funded address.
    if position_pda.data_is_empty() {
        cpi::create_pda_account(
            user, position_pda, system_program, &rent, POSITION_SIZE, program_id,
            &[POSITION_SEED, config_pda.key.as_ref(), user.key.as_ref(), &[position_bump]],
        )?;
    }
    next.position.bump = position_bump;

    cpi::transfer_lamports(user, principal_vault, system_program, settlement.principal_in)?;
    cpi::mint_receipts(
        token_program, stfix_mint, user_receipt, config_pda, settlement.receipts_minted,
        &[CONFIG_SEED, &[config.bump]],
    )?;

    store_position(position_pda, &next.position)?;
    store_config(config_pda, &next.config)?;

    msg!(
        "Deposited {} lamports at {}-day tier, minted {} STFIX",
        amount, tier, settlement.receipts_minted,
    );
    events::emit_stake(&StakeEvent::new(user.key, amount, tier, clock.unix_timestamp), memo);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 3 / 4: RequestWithdraw, CancelWithdrawRequest
// ═══════════════════════════════════════════════════════════════

/// Shared account layout for the two cooldown instructions. Neither moves
/// value, so config stays read-only.
fn process_cooldown_change<F>(program_id: &Pubkey, accounts: &[AccountInfo], apply: F) -> Result<Position, ProgramError>
where
    F: FnOnce(&Ledger, &Pubkey, i64) -> Result<Transition, StakeError>,
{
    let accounts_iter = &mut accounts.iter();

    let user = next_account_info(accounts_iter)?;
    let config_pda = next_account_info(accounts_iter)?;
    let position_pda = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !user.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let config = load_config(program_id, config_pda)?;
    let (position, _) = load_position(program_id, config_pda, user, position_pda)?;
    let clock = Clock::from_account_info(clock_sysvar)?;

    let ledger = Ledger { config, position, vaults: VaultBalances::default() };
    let t = apply(&ledger, user.key, clock.unix_timestamp)?;

    store_position(position_pda, &t.ledger.position)?;
    Ok(t.ledger.position)
}

fn process_request_withdraw(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let position = process_cooldown_change(program_id, accounts, transition::request_withdraw)?;

    msg!(
        "Withdrawal requested at {}, accrued yield {}",
        position.withdraw_requested_at, position.accrued_yield,
    );
    Ok(())
}

fn process_cancel_withdraw_request(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let position = process_cooldown_change(program_id, accounts, transition::cancel_withdraw_request)?;

    msg!("Withdrawal request cancelled, principal {} remains staked", position.principal);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 5 / 6: Withdraw, ExtendLock
// ═══════════════════════════════════════════════════════════════

struct PayoutAccounts<'a, 'b> {
    user: &'a AccountInfo<'b>,
    config_pda: &'a AccountInfo<'b>,
    position_pda: &'a AccountInfo<'b>,
    principal_vault: &'a AccountInfo<'b>,
    yield_vault: &'a AccountInfo<'b>,
    stfix_mint: &'a AccountInfo<'b>,
    user_receipt: &'a AccountInfo<'b>,
    token_program: &'a AccountInfo<'b>,
}

/// Parse and validate the account list shared by Withdraw and ExtendLock,
/// and snapshot the ledger.
fn load_payout<'a, 'b>(
    program_id: &Pubkey,
    accounts: &'a [AccountInfo<'b>],
) -> Result<(PayoutAccounts<'a, 'b>, Ledger, i64), ProgramError> {
    let accounts_iter = &mut accounts.iter();

    let user = next_account_info(accounts_iter)?;
    let config_pda = next_account_info(accounts_iter)?;
    let position_pda = next_account_info(accounts_iter)?;
    let principal_vault = next_account_info(accounts_iter)?;
    let yield_vault = next_account_info(accounts_iter)?;
    let stfix_mint = next_account_info(accounts_iter)?;
    let user_receipt = next_account_info(accounts_iter)?;
    let token_program = next_account_info(accounts_iter)?;
    let clock_sysvar = next_account_info(accounts_iter)?;

    if !user.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let config = load_config(program_id, config_pda)?;
    verify_vault(program_id, principal_vault, &config.principal_vault_pubkey())?;
    verify_vault(program_id, yield_vault, &config.yield_vault_pubkey())?;
    verify_mint(&config, stfix_mint)?;
    cpi::verify_token_program(token_program)?;

    let (position, _) = load_position(program_id, config_pda, user, position_pda)?;
    let clock = Clock::from_account_info(clock_sysvar)?;
    let rent = Rent::get()?;

    let ledger = Ledger {
        config,
        position,
        vaults: VaultBalances::new(
            vault::available_balance(principal_vault, &rent),
            vault::available_balance(yield_vault, &rent),
        ),
    };
    let accounts = PayoutAccounts {
        user,
        config_pda,
        position_pda,
        principal_vault,
        yield_vault,
        stfix_mint,
        user_receipt,
        token_program,
    };
    Ok((accounts, ledger, clock.unix_timestamp))
}

fn process_withdraw(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let (acc, ledger, now) = load_payout(program_id, accounts)?;

    let principal = ledger.position.principal;
    let Transition { ledger: next, settlement } = transition::withdraw(&ledger, acc.user.key, now)?;

    // Token CPI first; direct lamport edits follow so no CPI sees them mid-flight.
    cpi::burn_receipts(
        acc.token_program, acc.user_receipt, acc.stfix_mint, acc.user, settlement.receipts_burned,
    )?;

    let floor = vault::vault_rent_floor(&Rent::get()?);
    vault::release_lamports(acc.principal_vault, acc.user, settlement.principal_out, floor)?;
    vault::release_lamports(acc.yield_vault, acc.user, settlement.yield_out, floor)?;

    store_config(acc.config_pda, &next.config)?;
    if settlement.close_position {
        vault::close_account(acc.position_pda, acc.user)?;
    }

    msg!(
        "Withdrew {} principal + {} yield (penalty {}), burned {} STFIX",
        settlement.principal_out,
        settlement.yield_out,
        settlement.penalty,
        settlement.receipts_burned,
    );
    if settlement.early {
        events::emit(&EarlyRedeemEvent::new(
            acc.user.key, principal, settlement.penalty, settlement.yield_out, now,
        ));
    } else {
        events::emit(&RedeemEvent::new(acc.user.key, principal, settlement.yield_out, now));
    }
    Ok(())
}

fn process_extend_lock(program_id: &Pubkey, accounts: &[AccountInfo], tier: u8) -> ProgramResult {
    let (acc, ledger, now) = load_payout(program_id, accounts)?;

    let Transition { ledger: next, settlement } =
        transition::extend_lock(&ledger, acc.user.key, tier, now)?;

    cpi::mint_receipts(
        acc.token_program, acc.stfix_mint, acc.user_receipt, acc.config_pda,
        settlement.receipts_minted, &[CONFIG_SEED, &[ledger.config.bump]],
    )?;

    let floor = vault::vault_rent_floor(&Rent::get()?);
    vault::release_lamports(acc.yield_vault, acc.principal_vault, settlement.yield_to_principal, floor)?;

    store_position(acc.position_pda, &next.position)?;
    store_config(acc.config_pda, &next.config)?;

    msg!(
        "Lock extended to {}-day tier, compounded {} yield into principal {}",
        tier, settlement.yield_to_principal, next.position.principal,
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// 7: TopUpYield
// ═══════════════════════════════════════════════════════════════

fn process_top_up_yield(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let admin = next_account_info(accounts_iter)?;
    let config_pda = next_account_info(accounts_iter)?;
    let yield_vault = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;

    if !admin.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let config = load_config(program_id, config_pda)?;
    verify_vault(program_id, yield_vault, &config.yield_vault_pubkey())?;
    cpi::verify_system_program(system_program)?;

    let rent = Rent::get()?;
    let ledger = Ledger {
        config,
        position: Position::zeroed(),
        vaults: VaultBalances::new(0, vault::available_balance(yield_vault, &rent)),
    };
    let t = transition::top_up_yield(&ledger, admin.key, amount)?;

    cpi::transfer_lamports(admin, yield_vault, system_program, t.settlement.yield_in)?;

    msg!("Yield reserve topped up by {}, now {}", amount, t.ledger.vaults.yield_reserve);
    events::emit(&TopUpYieldEvent::new(admin.key, amount, Clock::get()?.unix_timestamp));
    Ok(())
}
