//! Vault custody: principal and yield-reserve lamport vaults.
//!
//! Both vaults are zero-data accounts owned by this program. Their usable
//! balance is everything above the rent-exempt floor. Balances change only
//! through the crate-internal primitives below, reached from processor handlers.

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey, rent::Rent,
};

use crate::error::StakeError;

/// Snapshot of both vault balances (lamports above the rent floor).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VaultBalances {
    pub principal: u64,
    pub yield_reserve: u64,
}

impl VaultBalances {
    pub fn new(principal: u64, yield_reserve: u64) -> Self {
        Self { principal, yield_reserve }
    }

    pub(crate) fn credit_principal(&mut self, amount: u64) -> Result<(), StakeError> {
        self.principal = self.principal.checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        Ok(())
    }

    pub(crate) fn debit_principal(&mut self, amount: u64) -> Result<(), StakeError> {
        self.principal = self.principal.checked_sub(amount)
            .ok_or(StakeError::InsufficientFunds)?;
        Ok(())
    }

    pub(crate) fn credit_yield(&mut self, amount: u64) -> Result<(), StakeError> {
        self.yield_reserve = self.yield_reserve.checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        Ok(())
    }

    pub(crate) fn debit_yield(&mut self, amount: u64) -> Result<(), StakeError> {
        self.yield_reserve = self.yield_reserve.checked_sub(amount)
            .ok_or(StakeError::InsufficientFunds)?;
        Ok(())
    }
}

/// Rent-exempt floor for a zero-data vault.
pub fn vault_rent_floor(rent: &Rent) -> u64 {
    rent.minimum_balance(0)
}

/// Lamports a vault can pay out without dropping below its rent floor.
pub fn available_balance(vault: &AccountInfo, rent: &Rent) -> u64 {
    vault.lamports().saturating_sub(vault_rent_floor(rent))
}

/// Move lamports out of a program-owned account.
///
/// The program may debit accounts it owns directly; `floor` lamports are
/// always left behind so the source stays rent-exempt.
pub(crate) fn release_lamports(
    from: &AccountInfo,
    to: &AccountInfo,
    amount: u64,
    floor: u64,
) -> ProgramResult {
    if amount == 0 {
        return Ok(());
    }
    let available = from.lamports().saturating_sub(floor);
    if amount > available {
        return Err(StakeError::InsufficientFunds.into());
    }

    let mut from_lamports = from.try_borrow_mut_lamports()?;
    let mut to_lamports = to.try_borrow_mut_lamports()?;
    **from_lamports = from_lamports.checked_sub(amount)
        .ok_or(StakeError::InsufficientFunds)?;
    **to_lamports = to_lamports.checked_add(amount)
        .ok_or(StakeError::ArithmeticOverflow)?;
    Ok(())
}

/// Reclaim a program-owned account: all lamports to `recipient`, data zeroed.
/// The runtime purges the zero-lamport account at the end of the transaction.
pub(crate) fn close_account(account: &AccountInfo, recipient: &AccountInfo) -> ProgramResult {
    let lamports = account.lamports();
    release_lamports(account, recipient, lamports, 0)?;
    let mut data = account.try_borrow_mut_data()?;
    data.fill(0);
    Ok(())
}

/// Guard against a vault address owned by someone else.
pub(crate) fn ensure_owned_by(account: &AccountInfo, owner: &Pubkey) -> ProgramResult {
    if account.owner != owner {
        return Err(StakeError::InvalidAccount.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_more_than_balance_fails() {
        let mut v = VaultBalances::new(100, 50);
        assert_eq!(v.debit_principal(101), Err(StakeError::InsufficientFunds));
        assert_eq!(v.debit_yield(51), Err(StakeError::InsufficientFunds));
        assert_eq!(v, VaultBalances::new(100, 50));
    }

    #[test]
    fn test_debit_to_exactly_zero() {
        let mut v = VaultBalances::new(100, 50);
        v.debit_principal(100).unwrap();
        v.debit_yield(50).unwrap();
        assert_eq!(v, VaultBalances::default());
    }

    #[test]
    fn test_credit_overflow() {
        let mut v = VaultBalances::new(u64::MAX, u64::MAX);
        assert_eq!(v.credit_principal(1), Err(StakeError::ArithmeticOverflow));
        assert_eq!(v.credit_yield(1), Err(StakeError::ArithmeticOverflow));
    }

    #[test]
    fn test_release_lamports_respects_floor() {
        let program_id = Pubkey::new_unique();
        let (from_key, to_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut from_lamports, mut to_lamports) = (1_000u64, 0u64);
        let (mut from_data, mut to_data) = (Vec::<u8>::new(), Vec::<u8>::new());
        let from = AccountInfo::new(
            &from_key, false, true, &mut from_lamports, &mut from_data, &program_id, false, 0,
        );
        let to = AccountInfo::new(
            &to_key, false, true, &mut to_lamports, &mut to_data, &program_id, false, 0,
        );

        assert!(release_lamports(&from, &to, 901, 100).is_err());
        release_lamports(&from, &to, 900, 100).unwrap();
        assert_eq!(from.lamports(), 100);
        assert_eq!(to.lamports(), 900);
    }

    #[test]
    fn test_close_account_zeroes_data() {
        let program_id = Pubkey::new_unique();
        let (acc_key, owner_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut acc_lamports, mut owner_lamports) = (500u64, 10u64);
        let mut acc_data = vec![7u8; 16];
        let mut owner_data: Vec<u8> = Vec::new();
        let acc = AccountInfo::new(
            &acc_key, false, true, &mut acc_lamports, &mut acc_data, &program_id, false, 0,
        );
        let owner = AccountInfo::new(
            &owner_key, true, true, &mut owner_lamports, &mut owner_data, &program_id, false, 0,
        );

        close_account(&acc, &owner).unwrap();
        assert_eq!(acc.lamports(), 0);
        assert_eq!(owner.lamports(), 510);
        assert!(acc.try_borrow_data().unwrap().iter().all(|b| *b == 0));
    }
}
