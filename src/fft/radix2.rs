//! Recursive radix-2 transforms over a transform buffer.
//!
//! All routines work in place on a slot range `off..` of an [`FftView`];
//! butterflies write to the scratch blocks and commit them into the slots,
//! so each layer costs one fused pass per element and zero limb copies.
//!
//! Outputs of the forward transforms are in bit-reversed evaluation order;
//! the inverse transforms accept that order and return `length * input`
//! (callers divide by the transform length afterwards).

use super::buffer::{FftView, Slot::*};
use super::butterfly::*;
use crate::{fermat, limb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - PUBLIC - full transforms

/// In-place radix-2 decimation-in-frequency FFT on `2n` coefficients at
/// `off..off + 2n`, evaluating at powers of `2^w`.
pub fn fft_radix2(v: &mut FftView<'_>, off: usize, n: usize, w: usize) {
    let limbs = (w * n) / LIMB_BITS;

    if n == 0 {
        return;
    }

    if n == 1 {
        let [s, t, a, b] = v.parts([T1, T2, C(off), C(off + 1)]);
        fft_butterfly(s, t, a, b, 0, limbs, w);
        v.commit(off, off + 1);
        return;
    }

    for i in 0..n {
        let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
        fft_butterfly(s, t, a, b, i, limbs, w);
        v.commit(off + i, off + n + i);
    }

    fft_radix2(v, off, n / 2, 2 * w);
    fft_radix2(v, off + n, n / 2, 2 * w);
}

/// Inverse of [`fft_radix2`]; returns `2n` times the original coefficients.
pub fn ifft_radix2(v: &mut FftView<'_>, off: usize, n: usize, w: usize) {
    let limbs = (w * n) / LIMB_BITS;

    if n == 0 {
        return;
    }

    if n == 1 {
        let [s, t, a, b] = v.parts([T1, T2, C(off), C(off + 1)]);
        ifft_butterfly(s, t, a, b, 0, limbs, w);
        v.commit(off, off + 1);
        return;
    }

    ifft_radix2(v, off, n / 2, 2 * w);
    ifft_radix2(v, off + n, n / 2, 2 * w);

    for i in 0..n {
        let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
        ifft_butterfly(s, t, a, b, i, limbs, w);
        v.commit(off + i, off + n + i);
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - truncated transforms

/// Truncated FFT over `2n` coefficients producing only `trunc` outputs,
/// for inputs whose upper coefficients may be non-zero.
pub fn fft_truncate1(v: &mut FftView<'_>, off: usize, n: usize, w: usize, trunc: usize) {
    let limbs = (w * n) / LIMB_BITS;

    if n == 0 {
        return;
    }

    if trunc == 2 * n {
        fft_radix2(v, off, n, w);
    } else if trunc <= n {
        for i in 0..n {
            let [x, y] = v.parts([C(off + i), C(off + n + i)]);
            limb::add_n(x, y);
        }
        fft_truncate1(v, off, n / 2, 2 * w, trunc);
    } else {
        for i in 0..n {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
            fft_butterfly(s, t, a, b, i, limbs, w);
            v.commit(off + i, off + n + i);
        }
        fft_radix2(v, off, n / 2, 2 * w);
        fft_truncate1(v, off + n, n / 2, 2 * w, trunc - n);
    }
}

/// Truncated FFT over `2n` coefficients of which only the first `trunc`
/// are non-zero, producing only `trunc` outputs.
pub fn fft_truncate(v: &mut FftView<'_>, off: usize, n: usize, w: usize, trunc: usize) {
    let limbs = (w * n) / LIMB_BITS;

    if n == 0 {
        return;
    }

    if trunc == 2 * n {
        fft_radix2(v, off, n, w);
    } else if trunc <= n {
        fft_truncate(v, off, n / 2, 2 * w, trunc);
    } else {
        for i in 0..trunc - n {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
            fft_butterfly(s, t, a, b, i, limbs, w);
            v.commit(off + i, off + n + i);
        }
        for i in trunc - n..n {
            // upper input is zero: only the twiddled output is needed
            let [r, a] = v.parts([C(off + n + i), C(off + i)]);
            fft_adjust(r, a, i, limbs, w);
        }
        fft_radix2(v, off, n / 2, 2 * w);
        fft_truncate1(v, off + n, n / 2, 2 * w, trunc - n);
    }
}

/// Inverse of [`fft_truncate1`]: recovers `2n` times the first `trunc`
/// coefficients given `trunc` transform values and the (doubled) upper
/// input coefficients.
pub fn ifft_truncate1(v: &mut FftView<'_>, off: usize, n: usize, w: usize, trunc: usize) {
    let limbs = (w * n) / LIMB_BITS;

    if n == 0 {
        return;
    }

    if trunc == 2 * n {
        ifft_radix2(v, off, n, w);
    } else if trunc <= n {
        for i in trunc..n {
            let [x, y] = v.parts([C(off + i), C(off + n + i)]);
            limb::add_n(x, y);
            fermat::div_2exp(x, 1);
        }
        ifft_truncate1(v, off, n / 2, 2 * w, trunc);
        for i in 0..trunc {
            let [x, y] = v.parts([C(off + i), C(off + n + i)]);
            limb::double_n(x);
            limb::sub_n(x, y);
        }
    } else {
        ifft_radix2(v, off, n / 2, 2 * w);

        for i in trunc - n..n {
            let [x, y] = v.parts([C(off + i), C(off + n + i)]);
            limb::rsub_n(y, x);
            let [t1, y] = v.parts([T1, C(off + n + i)]);
            fft_adjust(t1, y, i, limbs, w);
            let [x, y] = v.parts([C(off + i), C(off + n + i)]);
            limb::add_n(x, y);
            v.commit_t1(off + n + i);
        }

        ifft_truncate1(v, off + n, n / 2, 2 * w, trunc - n);

        for i in 0..trunc - n {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
            ifft_butterfly(s, t, a, b, i, limbs, w);
            v.commit(off + i, off + n + i);
        }
    }
}

/// Inverse of [`fft_truncate`]: recovers `2n` times the first `trunc`
/// coefficients, knowing the rest of the inputs were zero.
pub fn ifft_truncate(v: &mut FftView<'_>, off: usize, n: usize, w: usize, trunc: usize) {
    let limbs = (w * n) / LIMB_BITS;

    if n == 0 {
        return;
    }

    if trunc == 2 * n {
        ifft_radix2(v, off, n, w);
    } else if trunc <= n {
        ifft_truncate(v, off, n / 2, 2 * w, trunc);
        for i in 0..trunc {
            limb::double_n(v.coeff_mut(off + i));
        }
    } else {
        ifft_radix2(v, off, n / 2, 2 * w);

        for i in trunc - n..n {
            let [r, a] = v.parts([C(off + n + i), C(off + i)]);
            fft_adjust(r, a, i, limbs, w);
        }

        ifft_truncate1(v, off + n, n / 2, 2 * w, trunc - n);

        for i in 0..trunc - n {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
            ifft_butterfly(s, t, a, b, i, limbs, w);
            v.commit(off + i, off + n + i);
        }

        for i in trunc - n..n {
            limb::double_n(v.coeff_mut(off + i));
        }
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - negacyclic transform

/// Pre-twisted FFT evaluating at odd powers of the `4n`-th root, which
/// diagonalises multiplication modulo `x^(2n) + 1`.
pub fn fft_negacyclic(v: &mut FftView<'_>, off: usize, n: usize, w: usize) {
    let limbs = (w * n) / LIMB_BITS;

    // twiddle by powers of the square root of 2^w before the transform
    if w % 2 == 1 {
        let mut i = 0;
        while i < n {
            {
                let [t1, a] = v.parts([T1, C(off + i)]);
                fft_adjust(t1, a, i / 2, limbs, w);
            }
            v.commit_t1(off + i);
            {
                let [t2, b] = v.parts([T2, C(off + n + i)]);
                fft_adjust(t2, b, (n + i) / 2, limbs, w);
            }
            v.commit_t2(off + n + i);
            {
                let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
                fft_butterfly(s, t, a, b, i, limbs, w);
            }
            v.commit(off + i, off + n + i);

            i += 1;

            {
                let [t1, a, temp] = v.parts([T1, C(off + i), S1]);
                fft_adjust_sqrt2(t1, a, i, limbs, w, temp);
            }
            v.commit_t1(off + i);
            {
                let [t2, b, temp] = v.parts([T2, C(off + n + i), S1]);
                fft_adjust_sqrt2(t2, b, n + i, limbs, w, temp);
            }
            v.commit_t2(off + n + i);
            {
                let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
                fft_butterfly(s, t, a, b, i, limbs, w);
            }
            v.commit(off + i, off + n + i);

            i += 1;
        }
    } else {
        for i in 0..n {
            {
                let [t1, a] = v.parts([T1, C(off + i)]);
                fft_adjust(t1, a, i, limbs, w / 2);
            }
            v.commit_t1(off + i);
            {
                let [t2, b] = v.parts([T2, C(off + n + i)]);
                fft_adjust(t2, b, n + i, limbs, w / 2);
            }
            v.commit_t2(off + n + i);
            {
                let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
                fft_butterfly(s, t, a, b, i, limbs, w);
            }
            v.commit(off + i, off + n + i);
        }
    }

    fft_radix2(v, off, n / 2, 2 * w);
    fft_radix2(v, off + n, n / 2, 2 * w);
}

/// Inverse of [`fft_negacyclic`]; returns `2n` times the original
/// coefficients.
pub fn ifft_negacyclic(v: &mut FftView<'_>, off: usize, n: usize, w: usize) {
    let limbs = (w * n) / LIMB_BITS;

    ifft_radix2(v, off, n / 2, 2 * w);
    ifft_radix2(v, off + n, n / 2, 2 * w);

    if w % 2 == 1 {
        let mut i = 0;
        while i < n {
            {
                let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
                ifft_butterfly(s, t, a, b, i, limbs, w);
            }
            v.commit(off + i, off + n + i);

            {
                let [t1, a] = v.parts([T1, C(off + i)]);
                fft_adjust(t1, a, n - i / 2, limbs, w);
                limb::neg_in_place(t1);
            }
            v.commit_t1(off + i);
            {
                let [t2, b] = v.parts([T2, C(off + n + i)]);
                fft_adjust(t2, b, n - (n + i) / 2, limbs, w);
                limb::neg_in_place(t2);
            }
            v.commit_t2(off + n + i);

            i += 1;

            {
                let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
                ifft_butterfly(s, t, a, b, i, limbs, w);
            }
            v.commit(off + i, off + n + i);

            {
                let [t1, a, temp] = v.parts([T1, C(off + i), S1]);
                fft_adjust_sqrt2(t1, a, 2 * n - i, limbs, w, temp);
                limb::neg_in_place(t1);
            }
            v.commit_t1(off + i);
            {
                let [t2, b, temp] = v.parts([T2, C(off + n + i), S1]);
                fft_adjust_sqrt2(t2, b, n - i, limbs, w, temp);
                limb::neg_in_place(t2);
            }
            v.commit_t2(off + n + i);

            i += 1;
        }
    } else {
        for i in 0..n {
            {
                let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + n + i)]);
                ifft_butterfly(s, t, a, b, i, limbs, w);
            }
            v.commit(off + i, off + n + i);

            {
                let [t1, a] = v.parts([T1, C(off + i)]);
                fft_adjust(t1, a, 2 * n - i, limbs, w / 2);
                limb::neg_in_place(t1);
            }
            v.commit_t1(off + i);
            {
                let [t2, b] = v.parts([T2, C(off + n + i)]);
                fft_adjust(t2, b, n - i, limbs, w / 2);
                limb::neg_in_place(t2);
            }
            v.commit_t2(off + n + i);
        }
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::FftBuf;
    use crate::test_util;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn round_trip_radix2(depth: usize, w: usize, seed: u8) {
        let n = 1usize << depth;
        let limbs = (n * w) / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([seed; 32]);
        let mut buf = FftBuf::new(2 * n, limbs);
        let mut orig = Vec::new();
        for i in 0..2 * n {
            let c = test_util::random_fermat(limbs, &mut rng);
            buf.coeff_mut(i).copy_from_slice(&c);
            orig.push(c);
        }

        let mut v = buf.view();
        fft_radix2(&mut v, 0, n, w);
        ifft_radix2(&mut v, 0, n, w);
        for i in 0..2 * n {
            let c = v.coeff_mut(i);
            fermat::div_2exp(c, (depth + 1) as u32);
            fermat::norm(c);
            assert_eq!(
                test_util::fermat_to_biguint(c),
                test_util::fermat_to_biguint(&orig[i]),
                "depth {} w {} coeff {}",
                depth,
                w,
                i
            );
        }
    }

    // ============================================================
    // ROUNDTRIP - fft_radix2 / ifft_radix2

    #[test]
    fn radix2_round_trip_small_depths() {
        for (depth, w) in [(6, 1), (6, 2), (7, 1), (7, 3), (8, 1), (9, 2)] {
            round_trip_radix2(depth, w, depth as u8);
        }
    }

    // ============================================================
    // ROUNDTRIP - fft_truncate / ifft_truncate

    fn round_trip_truncate(depth: usize, w: usize, trunc: usize, seed: u8) {
        let n = 1usize << depth;
        let limbs = (n * w) / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([seed; 32]);
        let mut buf = FftBuf::new(2 * n, limbs);
        let mut orig = Vec::new();
        for i in 0..trunc {
            let c = test_util::random_fermat(limbs, &mut rng);
            buf.coeff_mut(i).copy_from_slice(&c);
            orig.push(c);
        }

        let mut v = buf.view();
        fft_truncate(&mut v, 0, n, w, trunc);
        ifft_truncate(&mut v, 0, n, w, trunc);
        for i in 0..trunc {
            let c = v.coeff_mut(i);
            fermat::div_2exp(c, (depth + 1) as u32);
            fermat::norm(c);
            assert_eq!(
                test_util::fermat_to_biguint(c),
                test_util::fermat_to_biguint(&orig[i]),
                "depth {} w {} trunc {} coeff {}",
                depth,
                w,
                trunc,
                i
            );
        }
    }

    #[test]
    fn truncate_round_trip_boundary_lengths() {
        let n = 1 << 6;
        // full, n + 1, fold case n, and the minimal legal length
        for trunc in [2 * n, n + 1, n, 2] {
            round_trip_truncate(6, 1, trunc, trunc as u8);
        }
    }

    #[test]
    fn truncate_round_trip_random_lengths() {
        let mut rng = ChaCha8Rng::from_seed([77; 32]);
        for (depth, w) in [(6, 1), (7, 2), (8, 1)] {
            let n = 1usize << depth;
            for _ in 0..4 {
                let trunc = rng.gen_range(2..=2 * n);
                round_trip_truncate(depth, w, trunc, 3);
            }
        }
    }

    // ============================================================
    // ROUNDTRIP - fft_negacyclic / ifft_negacyclic

    fn round_trip_negacyclic(depth: usize, w: usize, seed: u8) {
        let n = 1usize << depth;
        let limbs = (n * w) / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([seed; 32]);
        let mut buf = FftBuf::new(2 * n, limbs);
        let mut orig = Vec::new();
        for i in 0..2 * n {
            let c = test_util::random_fermat(limbs, &mut rng);
            buf.coeff_mut(i).copy_from_slice(&c);
            orig.push(c);
        }

        let mut v = buf.view();
        fft_negacyclic(&mut v, 0, n, w);
        ifft_negacyclic(&mut v, 0, n, w);
        for i in 0..2 * n {
            let c = v.coeff_mut(i);
            fermat::div_2exp(c, (depth + 1) as u32);
            fermat::norm(c);
            assert_eq!(
                test_util::fermat_to_biguint(c),
                test_util::fermat_to_biguint(&orig[i]),
                "depth {} w {} coeff {}",
                depth,
                w,
                i
            );
        }
    }

    #[test]
    fn negacyclic_round_trip() {
        for (depth, w) in [(6, 1), (6, 2), (7, 1), (7, 2)] {
            round_trip_negacyclic(depth, w, 21 + depth as u8);
        }
    }
}
