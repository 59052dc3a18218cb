//! Big-integer multiplication via the truncated Fermat transforms.
//!
//! [`mul`] picks the transform parameters: starting from `depth = 6`,
//! `w = 1`, the pair is grown until the coefficient count fits the `4n`
//! positions, fine-tuned through [`FFT_TAB`] below depth 11, and switched
//! to the matrix-Fourier pipeline at depth 11 and beyond. Operands small
//! enough that no valid transform exists go straight to the basecase
//! multiplier.

use crate::fft::{
    fft_mfa_truncate_sqrt2_outer, fft_truncate_sqrt2, ifft_mfa_truncate_sqrt2_outer,
    ifft_truncate_sqrt2, mfa_truncate_sqrt2_inner, FftBuf, Slot::*,
};
use crate::mulmod::mulmod_fermat;
use crate::pack::{combine_bits, split_bits};
use crate::{fermat, limb, Limb, LIMB_BITS};

// ======================================================================
// CONST - PUBLIC

/// Maps `(depth - 6, w - 1)` to the fine-tuning offset applied to the
/// initial parameter choice of [`mul`] below depth 11.
pub const FFT_TAB: [[usize; 2]; 5] = [[2, 2], [2, 2], [2, 2], [2, 1], [1, 1]];

/// Total operand limbs below which [`mul`] defers to the basecase
/// multiplier outright.
pub const MUL_FFT_THRESHOLD: usize = 64;

// ======================================================================
// FUNCTIONS - PUBLIC

/// `r = a * b` for non-negative limb vectors, `r.len() == a.len() + b.len()`.
///
/// Zero-length operands produce zero. Small products bypass the transforms
/// entirely; everything else selects `(depth, w)` and runs the truncated
/// sqrt2 pipeline, or the matrix-Fourier one at depth 11 and beyond.
pub fn mul(r: &mut [Limb], a: &[Limb], b: &[Limb]) {
    assert_eq!(r.len(), a.len() + b.len());
    if a.is_empty() || b.is_empty() {
        limb::zero(r);
        return;
    }
    if a.len() + b.len() < MUL_FFT_THRESHOLD {
        if a.len() >= b.len() {
            limb::mul_basecase(r, a, b);
        } else {
            limb::mul_basecase(r, b, a);
        }
        return;
    }

    let mut depth = 6usize;
    let mut w = 1usize;
    let mut n = 1usize << depth;

    let bits1 = a.len() * LIMB_BITS;
    let bits2 = b.len() * LIMB_BITS;

    let mut bits = (n * w - (depth + 1)) / 2;
    let mut j1 = (bits1 - 1) / bits + 1;
    let mut j2 = (bits2 - 1) / bits + 1;
    debug_assert!(j1 + j2 - 1 > 2 * n);

    // grow (depth, w) until the coefficients fit the 4n positions
    while j1 + j2 - 1 > 4 * n {
        if w == 1 {
            w = 2;
        } else {
            depth += 1;
            w = 1;
            n *= 2;
        }
        bits = (n * w - (depth + 1)) / 2;
        j1 = (bits1 - 1) / bits + 1;
        j2 = (bits2 - 1) / bits + 1;
    }

    if depth < 11 {
        let off = FFT_TAB[depth - 6][w - 1];
        depth -= off;
        n = 1usize << depth;
        w *= 1usize << (2 * off);

        let wadj = if depth < 6 { 1usize << (6 - depth) } else { 1 };

        if w > wadj {
            // see if a smaller w still fits
            loop {
                w -= wadj;
                bits = (n * w - (depth + 1)) / 2;
                j1 = (bits1 - 1) / bits + 1;
                j2 = (bits2 - 1) / bits + 1;
                if j1 + j2 - 1 > 4 * n || w <= wadj {
                    break;
                }
            }
            w += wadj;
        }

        mul_truncate_sqrt2(r, a, b, depth, w);
    } else {
        if j1 + j2 - 1 <= 3 * n {
            depth -= 1;
            w *= 3;
        }
        mul_mfa_truncate_sqrt2(r, a, b, depth, w);
    }
}

/// `r = a * b` with explicit transform parameters, using the plain
/// truncated sqrt2 transforms and pointwise [`mulmod_fermat`].
///
/// The caller guarantees the coefficients of both operands fit `4n`
/// positions at `(depth, w)` and overflow at least `2n` of them.
pub fn mul_truncate_sqrt2(r: &mut [Limb], a: &[Limb], b: &[Limb], depth: usize, w: usize) {
    let n = 1usize << depth;
    let bits1 = (n * w - (depth + 1)) / 2;
    let limbs = (n * w) / LIMB_BITS;
    debug_assert_eq!(limbs * LIMB_BITS, n * w);

    let j1 = (a.len() * LIMB_BITS - 1) / bits1 + 1;
    let j2 = (b.len() * LIMB_BITS - 1) / bits1 + 1;
    debug_assert!(j1 + j2 - 1 <= 4 * n);

    // trunc must exceed 2n and be even
    let mut trunc = (j1 + j2 - 1).max(2 * n + 1);
    trunc += trunc & 1;

    let square = std::ptr::eq(a, b);
    let size = limbs + 1;
    let mut tt = vec![0 as Limb; 2 * size];

    let mut ii = FftBuf::new(4 * n, limbs);
    {
        let mut iv = ii.view();
        let got = split_bits(&mut iv, a, bits1);
        debug_assert_eq!(got, j1);
        iv.zero_coeffs(got..4 * n);
        fft_truncate_sqrt2(&mut iv, 0, n, w, trunc);
    }

    let mut jj = if square {
        None
    } else {
        let mut jj = FftBuf::new(4 * n, limbs);
        let mut jv = jj.view();
        let got = split_bits(&mut jv, b, bits1);
        debug_assert_eq!(got, j2);
        jv.zero_coeffs(got..4 * n);
        fft_truncate_sqrt2(&mut jv, 0, n, w, trunc);
        drop(jv);
        Some(jj)
    };

    {
        let mut iv = ii.view();
        match &mut jj {
            Some(jj) => {
                let mut jv = jj.view();
                for k in 0..trunc {
                    fermat::norm(iv.coeff_mut(k));
                    fermat::norm(jv.coeff_mut(k));
                    let [dst, x] = iv.parts([S1, C(k)]);
                    mulmod_fermat(dst, x, jv.coeff(k), n, w, &mut tt);
                    iv.commit_s1(k);
                }
            }
            None => {
                for k in 0..trunc {
                    fermat::norm(iv.coeff_mut(k));
                    let [dst, x] = iv.parts([S1, C(k)]);
                    let x: &[Limb] = x;
                    mulmod_fermat(dst, x, x, n, w, &mut tt);
                    iv.commit_s1(k);
                }
            }
        }

        ifft_truncate_sqrt2(&mut iv, 0, n, w, trunc);
        for k in 0..trunc {
            let c = iv.coeff_mut(k);
            fermat::div_2exp(c, (depth + 2) as u32);
            fermat::norm(c);
        }
    }

    limb::zero(r);
    combine_bits(r, &ii.view(), j1 + j2 - 1, bits1, limbs);
}

/// `r = a * b` with explicit transform parameters, using the split
/// matrix-Fourier pipeline: column phases, then the parallel fused
/// row-and-pointwise phase, then the inverse column phases.
pub fn mul_mfa_truncate_sqrt2(r: &mut [Limb], a: &[Limb], b: &[Limb], depth: usize, w: usize) {
    let n = 1usize << depth;
    let bits1 = (n * w - (depth + 1)) / 2;
    let sqrt = 1usize << (depth / 2);
    let limbs = (n * w) / LIMB_BITS;
    debug_assert_eq!(limbs * LIMB_BITS, n * w);

    let j1 = (a.len() * LIMB_BITS - 1) / bits1 + 1;
    let j2 = (b.len() * LIMB_BITS - 1) / bits1 + 1;
    debug_assert!(j1 + j2 - 1 > 2 * n);
    debug_assert!(j1 + j2 - 1 <= 4 * n);

    // trunc must be divisible by 2*sqrt
    let trunc = 2 * sqrt * ((j1 + j2 + 2 * sqrt - 2) / (2 * sqrt));

    let square = std::ptr::eq(a, b);

    let mut ii = FftBuf::new(4 * n, limbs);
    {
        let mut iv = ii.view();
        let got = split_bits(&mut iv, a, bits1);
        iv.zero_coeffs(got..4 * n);
        fft_mfa_truncate_sqrt2_outer(&mut iv, n, w, sqrt, trunc);
    }

    let mut jj = if square {
        None
    } else {
        let mut jj = FftBuf::new(4 * n, limbs);
        let mut jv = jj.view();
        let got = split_bits(&mut jv, b, bits1);
        jv.zero_coeffs(got..4 * n);
        fft_mfa_truncate_sqrt2_outer(&mut jv, n, w, sqrt, trunc);
        drop(jv);
        Some(jj)
    };

    mfa_truncate_sqrt2_inner(&mut ii, jj.as_mut(), n, w, sqrt, trunc);
    ifft_mfa_truncate_sqrt2_outer(&mut ii.view(), n, w, sqrt, trunc);

    limb::zero(r);
    combine_bits(r, &ii.view(), j1 + j2 - 1, bits1, limbs);
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn check_against_basecase(alen: usize, blen: usize, seed: u8) {
        let mut rng = ChaCha8Rng::from_seed([seed; 32]);
        let mut a = vec![0 as Limb; alen];
        let mut b = vec![0 as Limb; blen];
        rng.fill(&mut a[..]);
        rng.fill(&mut b[..]);

        let mut got = vec![0 as Limb; alen + blen];
        mul(&mut got, &a, &b);

        let mut expect = vec![0 as Limb; alen + blen];
        limb::mul_basecase(&mut expect, &a, &b);
        assert_eq!(got, expect, "lengths {} x {}", alen, blen);
    }

    // ============================================================
    // small operands (basecase bypass)

    #[test]
    fn one_limb_corner() {
        let a = [Limb::MAX];
        let mut r = [0 as Limb; 2];
        mul(&mut r, &a, &a);
        assert_eq!(r, [0x0000000000000001, 0xFFFFFFFFFFFFFFFE]);
    }

    #[test]
    fn zero_length_operand() {
        let a = [5 as Limb];
        let b: [Limb; 0] = [];
        let mut r = [0 as Limb; 1];
        mul(&mut r, &a, &b);
        assert_eq!(r, [0]);
    }

    #[test]
    fn below_threshold_lengths() {
        for (alen, blen) in [(1, 1), (2, 1), (7, 5), (31, 31)] {
            check_against_basecase(alen, blen, (alen * 7 + blen) as u8);
        }
    }

    // ============================================================
    // truncated sqrt2 path

    #[test]
    fn fft_path_small_depths() {
        for (alen, blen) in [(32, 32), (64, 64), (100, 50), (128, 128), (1000, 1000)] {
            check_against_basecase(alen, blen, (alen % 251) as u8);
        }
    }

    #[test]
    fn fft_path_unbalanced() {
        check_against_basecase(2000, 100, 9);
        check_against_basecase(100, 2000, 10);
    }

    #[test]
    fn exact_coefficient_fill_boundary() {
        // operands filling exactly n coefficients at (6, 1), and one limb
        // (with a single set bit) over that boundary
        let depth = 6;
        let w = 1;
        let n = 1usize << depth;
        let bits = (n * w - (depth + 1)) / 2;
        let alen = n * bits / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([17; 32]);

        let mut a = vec![0 as Limb; alen];
        rng.fill(&mut a[..]);
        let mut got = vec![0 as Limb; 2 * alen];
        mul_truncate_sqrt2(&mut got, &a, &a.clone(), depth, w);
        let mut expect = vec![0 as Limb; 2 * alen];
        limb::mul_basecase(&mut expect, &a, &a);
        assert_eq!(got, expect);

        let mut over = a.clone();
        over.push(1);
        let mut got = vec![0 as Limb; 2 * alen + 1];
        mul_truncate_sqrt2(&mut got, &over, &a, depth, w);
        let mut expect = vec![0 as Limb; 2 * alen + 1];
        limb::mul_basecase(&mut expect, &over, &a);
        assert_eq!(got, expect);
    }

    #[test]
    fn power_of_two_total_size() {
        // no slack in the selection inequality
        check_against_basecase(1024, 1024, 11);
        check_against_basecase(2048, 2048, 12);
    }

    #[test]
    fn squaring_detected() {
        let mut rng = ChaCha8Rng::from_seed([13; 32]);
        let mut a = vec![0 as Limb; 600];
        rng.fill(&mut a[..]);
        let mut got = vec![0 as Limb; 1200];
        // same slice twice: exercises the single-transform path
        let (a1, a2) = (&a[..], &a[..]);
        mul(&mut got, a1, a2);
        let mut expect = vec![0 as Limb; 1200];
        limb::mul_basecase(&mut expect, &a, &a);
        assert_eq!(got, expect);
    }

    #[test]
    fn explicit_truncate_sqrt2_parameters() {
        let mut rng = ChaCha8Rng::from_seed([14; 32]);
        for (depth, w) in [(6, 1), (6, 2), (7, 1), (7, 2), (8, 1), (8, 3)] {
            let n = 1usize << depth;
            let bits = (n * w - (depth + 1)) / 2;
            // pick sizes so that 2n < j1 + j2 - 1 <= 4n
            let total_bits = 3 * n * bits;
            let alen = total_bits / (2 * LIMB_BITS);
            let blen = alen;
            let mut a = vec![0 as Limb; alen];
            let mut b = vec![0 as Limb; blen];
            rng.fill(&mut a[..]);
            rng.fill(&mut b[..]);

            let mut got = vec![0 as Limb; alen + blen];
            mul_truncate_sqrt2(&mut got, &a, &b, depth, w);

            let mut expect = vec![0 as Limb; alen + blen];
            limb::mul_basecase(&mut expect, &a, &b);
            assert_eq!(got, expect, "depth {} w {}", depth, w);
        }
    }

    #[test]
    fn explicit_mfa_parameters() {
        let mut rng = ChaCha8Rng::from_seed([15; 32]);
        for (depth, w) in [(6, 1), (7, 1), (7, 2), (8, 1)] {
            let n = 1usize << depth;
            let bits = (n * w - (depth + 1)) / 2;
            let total_bits = 3 * n * bits;
            let alen = total_bits / (2 * LIMB_BITS);
            let blen = alen;
            let mut a = vec![0 as Limb; alen];
            let mut b = vec![0 as Limb; blen];
            rng.fill(&mut a[..]);
            rng.fill(&mut b[..]);

            let mut got = vec![0 as Limb; alen + blen];
            mul_mfa_truncate_sqrt2(&mut got, &a, &b, depth, w);

            let mut expect = vec![0 as Limb; alen + blen];
            limb::mul_basecase(&mut expect, &a, &b);
            assert_eq!(got, expect, "depth {} w {}", depth, w);
        }
    }

    // ============================================================
    // large end-to-end

    #[test]
    fn large_random_products() {
        // large enough to cross several (depth, w) selections
        for total in [3000, 5000] {
            check_against_basecase(total / 2, total / 2, (total % 251) as u8);
        }
    }

    #[test]
    fn decreasing_pattern_square() {
        // X[i] = UWORD_MAX - i - 1 pattern, reduced size for test time
        let len = 2000;
        let a: Vec<Limb> = (0..len).map(|i| Limb::MAX - i as Limb - 1).collect();
        let mut got = vec![0 as Limb; 2 * len];
        let (a1, a2) = (&a[..], &a[..]);
        mul(&mut got, a1, a2);
        let mut expect = vec![0 as Limb; 2 * len];
        limb::mul_basecase(&mut expect, &a, &a);
        assert_eq!(got, expect);
    }
}
