//! Error code uniqueness and completeness tests.
//!
//! Clients match on these numbers; reordering the enum is a breaking change.

use solana_program::program_error::ProgramError;
use stfix_stake::error::StakeError;

const ALL: [StakeError; 15] = [
    StakeError::AlreadyInitialized,
    StakeError::NotInitialized,
    StakeError::InvalidParameter,
    StakeError::Unauthorized,
    StakeError::WhitelistRequired,
    StakeError::WhitelistFull,
    StakeError::InvalidTier,
    StakeError::TierMismatch,
    StakeError::ZeroAmount,
    StakeError::NoActivePosition,
    StakeError::NoWithdrawRequest,
    StakeError::WithdrawPending,
    StakeError::InsufficientFunds,
    StakeError::InvalidAccount,
    StakeError::ArithmeticOverflow,
];

#[test]
fn test_all_error_codes_unique() {
    let codes: Vec<u32> = ALL.iter().map(|e| *e as u32).collect();

    let mut sorted = codes.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), codes.len(), "Duplicate error codes detected!");

    // Check sequential (0..14)
    for (i, &code) in codes.iter().enumerate() {
        assert_eq!(code, i as u32, "Error code {} expected {}, got {}", i, i, code);
    }
}

#[test]
fn test_error_to_program_error() {
    let err: ProgramError = StakeError::Unauthorized.into();
    match err {
        ProgramError::Custom(code) => assert_eq!(code, 3),
        _ => panic!("Expected Custom error"),
    }

    let err: ProgramError = StakeError::InsufficientFunds.into();
    assert_eq!(err, ProgramError::Custom(12));
}

#[test]
fn test_all_errors_are_custom() {
    for err in &ALL {
        let pe: ProgramError = (*err).into();
        assert!(matches!(pe, ProgramError::Custom(_)));
    }
}
