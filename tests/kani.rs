//! Kani formal verification proofs for STFIX yield and penalty math.
//!
//! Proves safety properties on the PURE MATH layer:
//! 1. Penalty conservation: payout + penalty == principal, penalty bounded
//! 2. Yield truncation: never pays more than the exact rational amount
//! 3. Idempotence and checkpoint monotonicity
//! 4. Cooldown boundary
//!
//! Run all:  cargo kani --tests
//! Run one:  cargo kani --harness <name>

#[cfg(kani)]
mod kani_proofs {
    use stfix_stake::math::{
        accrue_yield, cooldown_elapsed, penalty_for, split_penalty, BPS_DENOMINATOR,
        YIELD_DENOMINATOR,
    };

    // ═══════════════════════════════════════════════════════════
    // 1. Penalty
    // ═══════════════════════════════════════════════════════════

    /// PROOF: the split never creates or destroys principal.
    #[kani::proof]
    fn proof_penalty_split_conserves() {
        let principal: u64 = kani::any();
        let bps: u64 = kani::any();
        kani::assume(bps <= BPS_DENOMINATOR);

        let (payout, penalty) = split_penalty(principal, bps).unwrap();
        assert_eq!(payout as u128 + penalty as u128, principal as u128);
        assert!(penalty <= principal);
    }

    /// PROOF: penalty rounds down.
    #[kani::proof]
    fn proof_penalty_rounds_down() {
        let principal: u64 = kani::any();
        let bps: u64 = kani::any();
        kani::assume(bps <= BPS_DENOMINATOR);

        let penalty = penalty_for(principal, bps).unwrap();
        assert!(penalty as u128 * BPS_DENOMINATOR as u128 <= principal as u128 * bps as u128);
    }

    /// PROOF: out-of-range bps is rejected, never silently clamped.
    #[kani::proof]
    fn proof_penalty_rejects_over_100_percent() {
        let principal: u64 = kani::any();
        let bps: u64 = kani::any();
        kani::assume(bps > BPS_DENOMINATOR);
        assert!(penalty_for(principal, bps).is_none());
    }

    #[kani::proof]
    fn proof_zero_penalty_returns_everything() {
        let principal: u64 = kani::any();
        assert_eq!(split_penalty(principal, 0), Some((principal, 0)));
    }

    // ═══════════════════════════════════════════════════════════
    // 2. Yield truncation
    // ═══════════════════════════════════════════════════════════

    /// PROOF: accrued yield * denominator never exceeds the exact numerator.
    #[kani::proof]
    fn proof_yield_rounds_down() {
        let principal: u64 = kani::any();
        let rate: u64 = kani::any();
        let now: i64 = kani::any();
        kani::assume(principal <= 1_000_000);
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(now > 0 && now <= 100_000);

        let a = accrue_yield(principal, rate, 0, 0, 0, now).unwrap();
        let exact = principal as u128 * rate as u128 * now as u128;
        assert!(a.accrued_yield as u128 * YIELD_DENOMINATOR <= exact);
        assert!((a.remainder as u128) < YIELD_DENOMINATOR);
    }

    /// PROOF: zero principal or zero rate never earns anything.
    #[kani::proof]
    fn proof_zero_principal_earns_nothing() {
        let rate: u64 = kani::any();
        let now: i64 = kani::any();
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(now >= 0);

        let a = accrue_yield(0, rate, 0, 0, 0, now).unwrap();
        assert_eq!(a.accrued_yield, 0);
        assert_eq!(a.remainder, 0);
    }

    // ═══════════════════════════════════════════════════════════
    // 3. Checkpoint behavior
    // ═══════════════════════════════════════════════════════════

    /// PROOF: clock at or behind the checkpoint leaves the position untouched.
    #[kani::proof]
    fn proof_no_elapsed_is_noop() {
        let principal: u64 = kani::any();
        let rate: u64 = kani::any();
        let accrued: u64 = kani::any();
        let remainder: u64 = kani::any();
        let checkpoint: i64 = kani::any();
        let now: i64 = kani::any();
        kani::assume(now <= checkpoint);

        let a = accrue_yield(principal, rate, accrued, remainder, checkpoint, now).unwrap();
        assert_eq!(a.accrued_yield, accrued);
        assert_eq!(a.remainder, remainder);
        assert_eq!(a.checkpoint, checkpoint);
    }

    /// PROOF: the checkpoint never moves backwards and accrued never decreases.
    #[kani::proof]
    fn proof_checkpoint_monotonic() {
        let principal: u64 = kani::any();
        let rate: u64 = kani::any();
        let accrued: u64 = kani::any();
        let checkpoint: i64 = kani::any();
        let now: i64 = kani::any();
        kani::assume(principal <= 1_000_000);
        kani::assume(rate <= BPS_DENOMINATOR);
        kani::assume(checkpoint >= 0 && checkpoint <= 1_000_000);
        kani::assume(now >= 0 && now <= 1_000_000);

        if let Some(a) = accrue_yield(principal, rate, accrued, 0, checkpoint, now) {
            assert!(a.checkpoint >= checkpoint);
            assert!(a.accrued_yield >= accrued);
        }
    }

    // ═══════════════════════════════════════════════════════════
    // 4. Cooldown
    // ═══════════════════════════════════════════════════════════

    /// PROOF: exactly at requested_at + cooldown the position is withdrawable,
    /// one second earlier it is not.
    #[kani::proof]
    fn proof_cooldown_boundary() {
        let requested_at: i64 = kani::any();
        let cooldown: i64 = kani::any();
        kani::assume(cooldown >= 1);
        kani::assume(requested_at >= 0 && requested_at <= i64::MAX / 2);
        kani::assume(cooldown <= i64::MAX / 4);

        let end = requested_at + cooldown;
        assert!(cooldown_elapsed(requested_at, cooldown, end));
        assert!(!cooldown_elapsed(requested_at, cooldown, end - 1));
    }

    /// PROOF: a huge cooldown never wraps around into "elapsed".
    #[kani::proof]
    fn proof_cooldown_saturates() {
        let requested_at: i64 = kani::any();
        let now: i64 = kani::any();
        kani::assume(requested_at > 0);
        kani::assume(now < i64::MAX);
        assert!(!cooldown_elapsed(requested_at, i64::MAX, now));
    }
}
