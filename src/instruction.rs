use solana_program::{program_error::ProgramError, pubkey::Pubkey};

use crate::events::MAX_MEMO_LEN;

/// Instructions for the STFIX staking vault.
#[derive(Debug)]
pub enum StakeInstruction {
    /// Create the config, both lamport vaults and the STFIX mint.
    /// Callable once; the signer becomes admin.
    ///
    /// Accounts:
    ///   0. `[signer, writable]` Admin (pays rent, becomes admin)
    ///   1. `[writable]` Config PDA (to be created)
    ///   2. `[writable]` Principal vault PDA (to be created)
    ///   3. `[writable]` Yield vault PDA (to be created)
    ///   4. `[writable]` STFIX mint PDA (to be created, authority = config PDA)
    ///   5. `[]` Token program
    ///   6. `[]` System program
    ///   7. `[]` Rent sysvar
    Initialize {
        yield_rate_30: u64,
        yield_rate_90: u64,
        cooldown_seconds: i64,
        penalty_rate_bps: u64,
        whitelist_only: bool,
    },

    /// Admin updates any subset of the pool parameters.
    ///
    /// Accounts:
    ///   0. `[signer]` Admin
    ///   1. `[writable]` Config PDA
    UpdateParameters {
        yield_rate_30: Option<u64>,
        yield_rate_90: Option<u64>,
        cooldown_seconds: Option<i64>,
        penalty_rate_bps: Option<u64>,
        whitelist_only: Option<bool>,
    },

    /// Stake lamports at a tier (30 or 90). Opens the position if needed
    /// and mints STFIX 1:1. An optional UTF-8 memo (at most
    /// `MAX_MEMO_LEN` bytes) is echoed in the stake event and not stored.
    ///
    /// Accounts:
    ///   0. `[signer, writable]` Depositor
    ///   1. `[writable]` Config PDA
    ///   2. `[writable]` Position PDA (created if needed)
    ///   3. `[writable]` Principal vault PDA
    ///   4. `[writable]` STFIX mint
    ///   5. `[writable]` Depositor's STFIX token account
    ///   6. `[]` Token program
    ///   7. `[]` System program
    ///   8. `[]` Clock sysvar
    Deposit { amount: u64, tier: u8, memo: Option<String> },

    /// Start the withdrawal cooldown.
    ///
    /// Accounts:
    ///   0. `[signer]` Depositor
    ///   1. `[]` Config PDA
    ///   2. `[writable]` Position PDA
    ///   3. `[]` Clock sysvar
    RequestWithdraw,

    /// Drop a pending withdrawal request. Same accounts as RequestWithdraw.
    CancelWithdrawRequest,

    /// Close the position: principal (less penalty if early) + accrued yield
    /// to the depositor, STFIX burned.
    ///
    /// Accounts:
    ///   0. `[signer, writable]` Depositor (receives lamports and position rent)
    ///   1. `[writable]` Config PDA
    ///   2. `[writable]` Position PDA
    ///   3. `[writable]` Principal vault PDA
    ///   4. `[writable]` Yield vault PDA
    ///   5. `[writable]` STFIX mint
    ///   6. `[writable]` Depositor's STFIX token account
    ///   7. `[]` Token program
    ///   8. `[]` Clock sysvar
    Withdraw,

    /// Compound accrued yield into principal and switch tier.
    /// Same accounts as Withdraw.
    ExtendLock { tier: u8 },

    /// Admin moves lamports into the yield vault.
    ///
    /// Accounts:
    ///   0. `[signer, writable]` Admin
    ///   1. `[]` Config PDA
    ///   2. `[writable]` Yield vault PDA
    ///   3. `[]` System program
    TopUpYield { amount: u64 },

    /// Accounts:
    ///   0. `[signer]` Admin
    ///   1. `[writable]` Config PDA
    AddToWhitelist { user: Pubkey },

    /// Same accounts as AddToWhitelist.
    RemoveFromWhitelist { user: Pubkey },

    /// Same accounts as AddToWhitelist.
    TransferAdmin { new_admin: Pubkey },
}

fn read_u64(data: &[u8], at: usize) -> Result<u64, ProgramError> {
    data.get(at..at + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)
}

fn read_i64(data: &[u8], at: usize) -> Result<i64, ProgramError> {
    read_u64(data, at).map(|v| v as i64)
}

fn read_pubkey(data: &[u8]) -> Result<Pubkey, ProgramError> {
    let bytes = data.get(0..32).ok_or(ProgramError::InvalidInstructionData)?;
    Pubkey::try_from(bytes).map_err(|_| ProgramError::InvalidInstructionData)
}

/// Length-prefixed UTF-8 memo. Absent or zero-length reads as `None`.
fn read_memo(data: &[u8]) -> Result<Option<String>, ProgramError> {
    let Some((&len, rest)) = data.split_first() else {
        return Ok(None);
    };
    let len = len as usize;
    if len > MAX_MEMO_LEN || rest.len() != len {
        return Err(ProgramError::InvalidInstructionData);
    }
    if len == 0 {
        return Ok(None);
    }
    let memo = core::str::from_utf8(rest).map_err(|_| ProgramError::InvalidInstructionData)?;
    Ok(Some(memo.to_owned()))
}

fn read_bool(byte: u8) -> Result<bool, ProgramError> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ProgramError::InvalidInstructionData),
    }
}

impl StakeInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let (&tag, rest) = data.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        match tag {
            0 => {
                // rate30(8) + rate90(8) + cooldown(8) + penalty(8) + whitelist_only(1)
                if rest.len() < 33 {
                    return Err(ProgramError::InvalidInstructionData);
                }
                Ok(Self::Initialize {
                    yield_rate_30: read_u64(rest, 0)?,
                    yield_rate_90: read_u64(rest, 8)?,
                    cooldown_seconds: read_i64(rest, 16)?,
                    penalty_rate_bps: read_u64(rest, 24)?,
                    whitelist_only: read_bool(rest[32])?,
                })
            }
            1 => {
                // 4 × (flag + 8 bytes) + flag + bool
                if rest.len() < 38 {
                    return Err(ProgramError::InvalidInstructionData);
                }
                let opt_u64 = |at: usize| -> Result<Option<u64>, ProgramError> {
                    if read_bool(rest[at])? { read_u64(rest, at + 1).map(Some) } else { Ok(None) }
                };
                Ok(Self::UpdateParameters {
                    yield_rate_30: opt_u64(0)?,
                    yield_rate_90: opt_u64(9)?,
                    cooldown_seconds: opt_u64(18)?.map(|v| v as i64),
                    penalty_rate_bps: opt_u64(27)?,
                    whitelist_only: if read_bool(rest[36])? { Some(read_bool(rest[37])?) } else { None },
                })
            }
            2 => {
                // amount(8) + tier(1) [+ memo_len(1) + memo]
                if rest.len() < 9 {
                    return Err(ProgramError::InvalidInstructionData);
                }
                Ok(Self::Deposit {
                    amount: read_u64(rest, 0)?,
                    tier: rest[8],
                    memo: read_memo(&rest[9..])?,
                })
            }
            3 => Ok(Self::RequestWithdraw),
            4 => Ok(Self::CancelWithdrawRequest),
            5 => Ok(Self::Withdraw),
            6 => {
                let &tier = rest.first().ok_or(ProgramError::InvalidInstructionData)?;
                Ok(Self::ExtendLock { tier })
            }
            7 => Ok(Self::TopUpYield { amount: read_u64(rest, 0)? }),
            8 => Ok(Self::AddToWhitelist { user: read_pubkey(rest)? }),
            9 => Ok(Self::RemoveFromWhitelist { user: read_pubkey(rest)? }),
            10 => Ok(Self::TransferAdmin { new_admin: read_pubkey(rest)? }),
            _ => Err(ProgramError::InvalidInstructionData),
        }
    }
}
