//! CPI helpers for the System and SPL Token programs.
//!
//! Every PDA-signed call takes the signer seeds explicitly so callers can
//! see which PDA authorizes what.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    instruction::Instruction,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
};

/// Verify the token program is the real SPL Token program.
/// CRITICAL: Without this check, an attacker can pass a fake token program,
/// receive the config PDA's mint authority via invoke_signed, and mint
/// unbacked receipts.
pub fn verify_token_program(token_program: &AccountInfo) -> ProgramResult {
    if *token_program.key != spl_token::id() {
        msg!("Error: invalid token program {}", token_program.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

pub fn verify_system_program(system_program: &AccountInfo) -> ProgramResult {
    if *system_program.key != solana_program::system_program::id() {
        msg!("Error: invalid system program {}", system_program.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// System program
// ═══════════════════════════════════════════════════════════════

/// System instructions that turn `new_account` into a rent-exempt account of
/// `space` bytes owned by `owner`.
///
/// An untouched address takes a single `create_account`. PDA addresses are
/// public and anyone can transfer lamports to them, and `create_account`
/// refuses a target that already holds lamports. A pre-funded address is
/// therefore topped up to the rent floor, then allocated and assigned in place.
pub fn pda_creation_instructions(
    payer: &Pubkey,
    new_account: &Pubkey,
    current_lamports: u64,
    rent: &Rent,
    space: usize,
    owner: &Pubkey,
) -> Vec<Instruction> {
    let required = rent.minimum_balance(space);
    if current_lamports == 0 {
        return vec![system_instruction::create_account(
            payer,
            new_account,
            required,
            space as u64,
            owner,
        )];
    }

    let mut instructions = Vec::with_capacity(3);
    let shortfall = required.saturating_sub(current_lamports);
    if shortfall > 0 {
        instructions.push(system_instruction::transfer(payer, new_account, shortfall));
    }
    instructions.push(system_instruction::allocate(new_account, space as u64));
    instructions.push(system_instruction::assign(new_account, owner));
    instructions
}

/// Create a rent-exempt PDA account of `space` bytes owned by `owner`.
/// The PDA signs for its own creation with `seeds`.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    new_account: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    rent: &Rent,
    space: usize,
    owner: &Pubkey,
    seeds: &[&[u8]],
) -> ProgramResult {
    let instructions = pda_creation_instructions(
        payer.key,
        new_account.key,
        new_account.lamports(),
        rent,
        space,
        owner,
    );
    let account_infos = [payer.clone(), new_account.clone(), system_program.clone()];
    for instruction in &instructions {
        invoke_signed(instruction, &account_infos, &[seeds])?;
    }
    Ok(())
}

/// Lamports from a signing wallet into a vault.
pub fn transfer_lamports<'a>(
    from: &AccountInfo<'a>,
    to: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    invoke(
        &system_instruction::transfer(from.key, to.key, amount),
        &[from.clone(), to.clone(), system_program.clone()],
    )
}

// ═══════════════════════════════════════════════════════════════
// SPL Token: STFIX receipt mint
// ═══════════════════════════════════════════════════════════════

/// Initialize the receipt mint with the config PDA as mint authority.
/// No freeze authority: receipts are ordinary transferable tokens.
pub fn initialize_mint<'a>(
    token_program: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    mint_authority: &Pubkey,
    rent_sysvar: &AccountInfo<'a>,
    decimals: u8,
) -> ProgramResult {
    invoke(
        &spl_token::instruction::initialize_mint(
            token_program.key,
            mint.key,
            mint_authority,
            None,
            decimals,
        )?,
        &[mint.clone(), rent_sysvar.clone()],
    )
}

/// Mint receipts; the config PDA signs as mint authority.
pub fn mint_receipts<'a>(
    token_program: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    config: &AccountInfo<'a>,
    amount: u64,
    config_seeds: &[&[u8]],
) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }
    invoke_signed(
        &spl_token::instruction::mint_to(
            token_program.key,
            mint.key,
            destination.key,
            config.key,
            &[],
            amount,
        )?,
        &[mint.clone(), destination.clone(), config.clone(), token_program.clone()],
        &[config_seeds],
    )
}

/// Burn receipts from the holder's token account; the holder signs.
pub fn burn_receipts<'a>(
    token_program: &AccountInfo<'a>,
    source: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    holder: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }
    invoke(
        &spl_token::instruction::burn(
            token_program.key,
            source.key,
            mint.key,
            holder.key,
            &[],
            amount,
        )?,
        &[source.clone(), mint.clone(), holder.clone(), token_program.clone()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_with(key: Pubkey, verify: fn(&AccountInfo) -> ProgramResult) -> ProgramResult {
        let owner = Pubkey::default();
        let (mut lamports, mut data) = (0u64, Vec::<u8>::new());
        let info = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &owner, true, 0);
        verify(&info)
    }

    #[test]
    fn test_verify_token_program() {
        assert_eq!(verify_with(spl_token::id(), verify_token_program), Ok(()));
        assert_eq!(
            verify_with(Pubkey::new_unique(), verify_token_program),
            Err(ProgramError::IncorrectProgramId),
        );
        assert_eq!(
            verify_with(solana_program::system_program::id(), verify_token_program),
            Err(ProgramError::IncorrectProgramId),
        );
    }

    #[test]
    fn test_verify_system_program() {
        assert_eq!(verify_with(solana_program::system_program::id(), verify_system_program), Ok(()));
        assert_eq!(
            verify_with(spl_token::id(), verify_system_program),
            Err(ProgramError::IncorrectProgramId),
        );
        assert_eq!(
            verify_with(Pubkey::new_unique(), verify_system_program),
            Err(ProgramError::IncorrectProgramId),
        );
    }

    // ── PDA creation ──

    #[test]
    fn test_fresh_address_uses_create_account() {
        let rent = Rent::default();
        let (payer, pda, owner) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        let ixs = pda_creation_instructions(&payer, &pda, 0, &rent, 160, &owner);
        assert_eq!(
            ixs,
            vec![system_instruction::create_account(&payer, &pda, rent.minimum_balance(160), 160, &owner)],
        );
    }

    #[test]
    fn test_prefunded_address_topped_up_then_allocated() {
        let rent = Rent::default();
        let (payer, pda, owner) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let required = rent.minimum_balance(160);
        let donated = 1_000;

        let ixs = pda_creation_instructions(&payer, &pda, donated, &rent, 160, &owner);
        assert_eq!(
            ixs,
            vec![
                system_instruction::transfer(&payer, &pda, required - donated),
                system_instruction::allocate(&pda, 160),
                system_instruction::assign(&pda, &owner),
            ],
        );
    }

    #[test]
    fn test_prefunded_above_rent_floor_skips_transfer() {
        let rent = Rent::default();
        let (payer, pda, owner) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let required = rent.minimum_balance(0);

        for donated in [required, required + 1, u64::MAX] {
            let ixs = pda_creation_instructions(&payer, &pda, donated, &rent, 0, &owner);
            assert_eq!(
                ixs,
                vec![system_instruction::allocate(&pda, 0), system_instruction::assign(&pda, &owner)],
            );
        }
    }

    #[test]
    fn test_prefunded_mint_assigned_to_token_program() {
        use solana_program::program_pack::Pack;

        let rent = Rent::default();
        let (payer, mint) = (Pubkey::new_unique(), Pubkey::new_unique());
        let space = spl_token::state::Mint::LEN;

        let ixs = pda_creation_instructions(&payer, &mint, 1, &rent, space, &spl_token::id());
        assert_eq!(ixs.len(), 3);
        assert_eq!(ixs[0], system_instruction::transfer(&payer, &mint, rent.minimum_balance(space) - 1));
        assert_eq!(ixs[2], system_instruction::assign(&mint, &spl_token::id()));
        // The payer never signs allocate/assign; only the PDA does.
        assert!(ixs[1..].iter().all(|ix| ix.accounts.iter().all(|meta| meta.pubkey == mint)));
    }
}
