//! Kani formal verification for stfix-stake yield and penalty math.
//!
//! ZERO dependencies. Pure Rust. CBMC-friendly.
//!
//! KEY DESIGN DECISION: Functions use u32 inputs / u64 intermediates.
//! The production code uses u64/u128, but the arithmetic properties
//! (conservation, truncation, additivity) are scale-invariant.
//! u32 keeps SAT formulas tractable for CBMC (<60s per proof).
//!
//! Run all:   cargo kani --lib
//! Run one:   cargo kani --harness proof_split_accrual_additive

// ═══════════════════════════════════════════════════════════════
// Yield / penalty math (u32/u64 mirror of stfix-stake/src/math.rs)
// Arithmetic is IDENTICAL, just narrower types for CBMC tractability.
// ═══════════════════════════════════════════════════════════════

pub const BPS_DENOMINATOR: u32 = 10_000;
pub const SECONDS_PER_YEAR: u32 = 365 * 86_400;
pub const YIELD_DENOMINATOR: u64 = (BPS_DENOMINATOR as u64) * (SECONDS_PER_YEAR as u64);

/// (accrued_yield, remainder, checkpoint)
pub type Accrual = (u32, u64, u32);

/// Accrue `principal * rate * elapsed / YIELD_DENOMINATOR` with the remainder carried.
pub fn accrue_yield(
    principal: u32,
    rate_bps: u32,
    accrued: u32,
    remainder: u64,
    checkpoint: u32,
    now: u32,
) -> Option<Accrual> {
    if now <= checkpoint {
        return Some((accrued, remainder, checkpoint));
    }
    let elapsed = now - checkpoint;
    let numerator = (principal as u64)
        .checked_mul(rate_bps as u64)?
        .checked_mul(elapsed as u64)?
        .checked_add(remainder)?;
    let delta = u32::try_from(numerator / YIELD_DENOMINATOR).ok()?;
    Some((accrued.checked_add(delta)?, numerator % YIELD_DENOMINATOR, now))
}

/// floor(principal * bps / 10_000); None above 100%.
pub fn penalty_for(principal: u32, bps: u32) -> Option<u32> {
    if bps > BPS_DENOMINATOR {
        return None;
    }
    let p = (principal as u64).checked_mul(bps as u64)? / BPS_DENOMINATOR as u64;
    u32::try_from(p).ok()
}

/// (payout, penalty)
pub fn split_penalty(principal: u32, bps: u32) -> Option<(u32, u32)> {
    let penalty = penalty_for(principal, bps)?;
    Some((principal.checked_sub(penalty)?, penalty))
}

pub fn cooldown_elapsed(requested_at: u32, cooldown: u32, now: u32) -> bool {
    now >= requested_at.saturating_add(cooldown)
}

// ═══════════════════════════════════════════════════════════════
// KANI PROOFS: 12 harnesses
// ═══════════════════════════════════════════════════════════════

#[cfg(kani)]
mod proofs {
    use super::*;

    // ── 1. Penalty conservation ──

    /// payout + penalty == principal for every valid rate.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_penalty_split_conserves() {
        let principal: u32 = kani::any();
        let bps: u32 = kani::any();
        kani::assume(bps <= BPS_DENOMINATOR);

        let (payout, penalty) = split_penalty(principal, bps).unwrap();
        assert_eq!(payout as u64 + penalty as u64, principal as u64);
    }

    /// Penalty is bounded by principal and rounds down.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_penalty_bounded() {
        let principal: u32 = kani::any();
        let bps: u32 = kani::any();
        kani::assume(bps <= BPS_DENOMINATOR);

        let penalty = penalty_for(principal, bps).unwrap();
        assert!(penalty <= principal);
        assert!(penalty as u64 * BPS_DENOMINATOR as u64 <= principal as u64 * bps as u64);
    }

    /// Higher penalty rate never returns more to the depositor.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_penalty_monotonic_in_rate() {
        let principal: u32 = kani::any();
        let lo: u32 = kani::any();
        let hi: u32 = kani::any();
        kani::assume(principal < 1_000_000);
        kani::assume(lo <= hi && hi <= BPS_DENOMINATOR);

        let (pay_lo, _) = split_penalty(principal, lo).unwrap();
        let (pay_hi, _) = split_penalty(principal, hi).unwrap();
        assert!(pay_hi <= pay_lo);
    }

    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_penalty_rejects_over_100_percent() {
        let principal: u32 = kani::any();
        let bps: u32 = kani::any();
        kani::assume(bps > BPS_DENOMINATOR);
        assert!(penalty_for(principal, bps).is_none());
    }

    // ── 2. Arithmetic safety ──

    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_accrue_no_panic() {
        let _ = accrue_yield(
            kani::any(), kani::any(), kani::any(), kani::any(), kani::any(), kani::any(),
        );
    }

    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_split_penalty_no_panic() {
        let _ = split_penalty(kani::any(), kani::any());
    }

    // ── 3. Yield truncation and checkpoints ──

    /// Yield never exceeds the exact rational amount; remainder stays below one unit.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_yield_rounds_down() {
        let principal: u32 = kani::any();
        let rate: u32 = kani::any();
        let now: u32 = kani::any();
        kani::assume(principal < 1_000_000);
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(now > 0 && now < 100_000);

        let (accrued, rem, ts) = accrue_yield(principal, rate, 0, 0, 0, now).unwrap();
        let exact = principal as u64 * rate as u64 * now as u64;
        assert_eq!(accrued as u64 * YIELD_DENOMINATOR + rem, exact);
        assert!(rem < YIELD_DENOMINATOR);
        assert_eq!(ts, now);
    }

    /// Second call at the same timestamp changes nothing.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_accrue_idempotent() {
        let principal: u32 = kani::any();
        let rate: u32 = kani::any();
        let now: u32 = kani::any();
        kani::assume(principal < 1_000_000);
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(now < 100_000);

        let first = accrue_yield(principal, rate, 0, 0, 0, now).unwrap();
        let (a, r, c) = first;
        assert_eq!(accrue_yield(principal, rate, a, r, c, now), Some(first));
    }

    /// Accruing over [0, mid] then [mid, end] equals accruing over [0, end].
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_split_accrual_additive() {
        let principal: u32 = kani::any();
        let rate: u32 = kani::any();
        let mid: u32 = kani::any();
        let end: u32 = kani::any();
        kani::assume(principal < 10_000);
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(mid <= end && end < 10_000);

        let (a, r, c) = accrue_yield(principal, rate, 0, 0, 0, mid).unwrap();
        let split = accrue_yield(principal, rate, a, r, c, end).unwrap();
        let single = accrue_yield(principal, rate, 0, 0, 0, end).unwrap();
        assert_eq!(split, single);
    }

    /// Later `now` never yields less.
    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_accrue_monotonic() {
        let principal: u32 = kani::any();
        let rate: u32 = kani::any();
        let t1: u32 = kani::any();
        let t2: u32 = kani::any();
        kani::assume(principal < 10_000);
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(t1 <= t2 && t2 < 10_000);

        let (y1, _, _) = accrue_yield(principal, rate, 0, 0, 0, t1).unwrap();
        let (y2, _, _) = accrue_yield(principal, rate, 0, 0, 0, t2).unwrap();
        assert!(y2 >= y1);
    }

    // ── 4. Cooldown ──

    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_cooldown_boundary() {
        let at: u32 = kani::any();
        let cd: u32 = kani::any();
        kani::assume(cd > 0);
        kani::assume(at as u64 + cd as u64 <= u32::MAX as u64);

        assert!(cooldown_elapsed(at, cd, at + cd));
        assert!(!cooldown_elapsed(at, cd, at + cd - 1));
    }

    #[kani::proof]
    #[kani::unwind(33)]
    fn proof_cooldown_saturates() {
        let at: u32 = kani::any();
        let now: u32 = kani::any();
        kani::assume(at > 0 && now < u32::MAX);
        assert!(!cooldown_elapsed(at, u32::MAX, now));
    }
}
