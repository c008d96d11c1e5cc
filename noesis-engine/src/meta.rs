//! Meta-Adaptation of the Correction and Constraint Gains
//!
//! A deliberately slow negative-feedback rule on (λ_E, λ_S), run once per
//! step. The transition table, with the mismatch threshold spelled out:
//!
//!   mismatch > 15  →  dE = −0.05,            dS = −0.03     (retreat)
//!   otherwise      →  dE = +0.02·dominance,  dS = +0.01·mismatch
//!
//! Gains move by `lr·d` and clamp to [0.01, 0.5]. When the observer signal
//! is unreliable (high mismatch) both couplings back off together; when it
//! is trustworthy they grow in proportion to how much there is to correct.

/// Mismatch level above which both gains retreat.
pub const MISMATCH_RETREAT_THRESHOLD: f64 = 15.0;
/// Lower clamp on either gain.
pub const GAIN_MIN: f64 = 0.01;
/// Upper clamp on either gain.
pub const GAIN_MAX: f64 = 0.5;

/// One meta-adaptation update. Returns the successor (λ_E, λ_S).
pub fn adapt(
    lambda_e: f64,
    lambda_s: f64,
    dominance: f64,
    mismatch: f64,
    lr: f64,
) -> (f64, f64) {
    let (d_e, d_s) = if mismatch > MISMATCH_RETREAT_THRESHOLD {
        (-0.05, -0.03)
    } else {
        (0.02 * dominance, 0.01 * mismatch)
    };
    (
        (lambda_e + lr * d_e).clamp(GAIN_MIN, GAIN_MAX),
        (lambda_s + lr * d_s).clamp(GAIN_MIN, GAIN_MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_mismatch_retreats_both_gains() {
        let (e, s) = adapt(0.15, 0.2, 3.0, 20.0, 0.005);
        assert!(e <= 0.15, "λ_E must not grow under high mismatch, got {e}");
        assert!(s <= 0.2, "λ_S must not grow under high mismatch, got {s}");
        assert!((e - (0.15 - 0.005 * 0.05)).abs() < 1e-12);
        assert!((s - (0.2 - 0.005 * 0.03)).abs() < 1e-12);
    }

    #[test]
    fn test_low_mismatch_grows_gains() {
        let (e, s) = adapt(0.15, 0.2, 2.0, 5.0, 0.005);
        assert!(e > 0.15);
        assert!(s > 0.2);
        assert!((e - (0.15 + 0.005 * 0.02 * 2.0)).abs() < 1e-12);
        assert!((s - (0.2 + 0.005 * 0.01 * 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_gains_clamped_to_range() {
        // Repeated retreat pins both gains at the floor.
        let (mut e, mut s) = (0.02, 0.02);
        for _ in 0..200 {
            let next = adapt(e, s, 0.0, 30.0, 0.005);
            e = next.0;
            s = next.1;
        }
        assert!((e - GAIN_MIN).abs() < 1e-12);
        assert!((s - GAIN_MIN).abs() < 1e-12);

        // Repeated growth saturates at the ceiling.
        let (mut e, mut s) = (0.4, 0.4);
        for _ in 0..10_000 {
            let next = adapt(e, s, 10.0, 14.0, 0.005);
            e = next.0;
            s = next.1;
        }
        assert!((e - GAIN_MAX).abs() < 1e-12);
        assert!((s - GAIN_MAX).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_boundary_grows() {
        // Exactly at the threshold the growth branch applies.
        let (e, s) = adapt(0.1, 0.1, 1.0, MISMATCH_RETREAT_THRESHOLD, 0.005);
        assert!(e > 0.1);
        assert!(s > 0.1);
    }
}
