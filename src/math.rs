//! Pure yield and penalty math, extracted for Kani formal verification.
//!
//! No Solana/Pubkey dependencies. Just arithmetic.
//! All divisions round DOWN so the vaults never pay out more than they hold.

/// 100% in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// 365-day year used to annualize tier rates.
pub const SECONDS_PER_YEAR: u64 = 365 * 86_400;

/// `rate_bps * elapsed / YIELD_DENOMINATOR` is the annualized fraction earned.
pub const YIELD_DENOMINATOR: u128 = (BPS_DENOMINATOR as u128) * (SECONDS_PER_YEAR as u128);

/// Result of bringing a position's yield checkpoint up to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Total checkpointed yield after accrual (previous + delta).
    pub accrued_yield: u64,
    /// Sub-unit numerator carried to the next checkpoint (< YIELD_DENOMINATOR).
    pub remainder: u64,
    /// New checkpoint timestamp.
    pub checkpoint: i64,
}

/// Rates and penalties are bounded by 100%.
pub fn is_valid_bps(bps: u64) -> bool {
    bps <= BPS_DENOMINATOR
}

/// Accrue annualized yield from `checkpoint` to `now`.
///
/// # Arguments
/// * `principal` - Principal earning yield
/// * `rate_bps` - Annualized tier rate in basis points
/// * `accrued_yield` - Yield already checkpointed
/// * `remainder` - Fractional numerator carried from the previous checkpoint
/// * `checkpoint` - Timestamp of the previous checkpoint
/// * `now` - Current unix timestamp
///
/// # Returns
/// * `Some(accrual)` - New accrued total, remainder and checkpoint
/// * `None` - Arithmetic overflow
///
/// # Invariant
/// `delta = floor((principal * rate * elapsed + remainder) / (10_000 * year))`.
/// `now <= checkpoint` leaves everything unchanged (the checkpoint never moves back),
/// so a second call at the same timestamp is a no-op. Because the remainder is
/// carried, accruing over [a, b] then [b, c] equals accruing over [a, c].
pub fn accrue_yield(
    principal: u64,
    rate_bps: u64,
    accrued_yield: u64,
    remainder: u64,
    checkpoint: i64,
    now: i64,
) -> Option<Accrual> {
    if now <= checkpoint {
        return Some(Accrual { accrued_yield, remainder, checkpoint });
    }
    let elapsed = u64::try_from(now.checked_sub(checkpoint)?).ok()?;

    let numerator = (principal as u128)
        .checked_mul(rate_bps as u128)?
        .checked_mul(elapsed as u128)?
        .checked_add(remainder as u128)?;
    let delta = numerator / YIELD_DENOMINATOR;
    let carry = numerator % YIELD_DENOMINATOR;

    let delta = u64::try_from(delta).ok()?;
    Some(Accrual {
        accrued_yield: accrued_yield.checked_add(delta)?,
        // YIELD_DENOMINATOR < u64::MAX, so the carry always fits
        remainder: carry as u64,
        checkpoint: now,
    })
}

/// Early-exit penalty: `floor(principal * penalty_bps / 10_000)`.
///
/// # Returns
/// * `None` on overflow or when `penalty_bps > 10_000`
pub fn penalty_for(principal: u64, penalty_bps: u64) -> Option<u64> {
    if !is_valid_bps(penalty_bps) {
        return None;
    }
    let penalty = (principal as u128)
        .checked_mul(penalty_bps as u128)?
        .checked_div(BPS_DENOMINATOR as u128)?;
    u64::try_from(penalty).ok()
}

/// Split principal into (payout, penalty). `payout + penalty == principal` always.
pub fn split_penalty(principal: u64, penalty_bps: u64) -> Option<(u64, u64)> {
    let penalty = penalty_for(principal, penalty_bps)?;
    Some((principal.checked_sub(penalty)?, penalty))
}

/// Cooldown check. Saturates so a huge cooldown never wraps into "elapsed".
pub fn cooldown_elapsed(requested_at: i64, cooldown_seconds: i64, now: i64) -> bool {
    now >= requested_at.saturating_add(cooldown_seconds)
}


// ═══════════════════════════════════════════════════════════════
// Kani Formal Verification
// ═══════════════════════════════════════════════════════════════
//
// Narrow-type (u32/u64) mirrors live in kani-proofs/ for CBMC tractability.
// Bounded production-type harnesses are in tests/kani.rs.
