use solana_program::program_error::ProgramError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StakeError {
    /// Config already initialized
    AlreadyInitialized = 0,
    /// Config not initialized
    NotInitialized = 1,
    /// Rate, penalty or cooldown out of range
    InvalidParameter = 2,
    /// Signer is not the admin, or not the position owner
    Unauthorized = 3,
    /// Whitelist-only pool and caller is not listed
    WhitelistRequired = 4,
    /// Whitelist has no free slot
    WhitelistFull = 5,
    /// Tier must be 30 or 90
    InvalidTier = 6,
    /// Deposit tier differs from the open position's tier
    TierMismatch = 7,
    /// Zero amount
    ZeroAmount = 8,
    /// Position is not Active
    NoActivePosition = 9,
    /// Position has no pending withdraw request
    NoWithdrawRequest = 10,
    /// Position has a pending withdraw request; cancel it first
    WithdrawPending = 11,
    /// Vault balance too low for the requested debit
    InsufficientFunds = 12,
    /// Account address does not match its PDA derivation, or wrong owner
    InvalidAccount = 13,
    /// Arithmetic overflow
    ArithmeticOverflow = 14,
}

impl From<StakeError> for ProgramError {
    fn from(e: StakeError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
