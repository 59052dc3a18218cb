//! Truncated transforms of length `4n` using the square root of 2.
//!
//! For odd `w` the ring has no `4n`-th power of 2, but
//! `2^(3*n*w/4) - 2^(n*w/4)` squares to 2 and serves as the extra twiddle;
//! positions alternate between plain and sqrt2 butterflies. For even `w`
//! the transforms fall through to the plain truncated ones at doubled
//! length and halved weight.

use super::buffer::{FftView, Slot::*};
use super::butterfly::*;
use super::radix2::*;
use crate::{limb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - PUBLIC

/// Truncated FFT over `4n` coefficients of which only the first `trunc`
/// are non-zero, producing `trunc` outputs. Requires `2n < trunc <= 4n`.
pub fn fft_truncate_sqrt2(v: &mut FftView<'_>, off: usize, n: usize, w: usize, trunc: usize) {
    debug_assert!(trunc > 2 * n && trunc <= 4 * n);
    // odd w pairs plain and sqrt2 butterflies, so the length must be even
    debug_assert!(w % 2 == 0 || trunc % 2 == 0);
    let limbs = (w * n) / LIMB_BITS;

    if w % 2 == 0 {
        fft_truncate(v, off, 2 * n, w / 2, trunc);
        return;
    }

    let mut i = 0;
    while i < trunc - 2 * n {
        {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + 2 * n + i)]);
            fft_butterfly(s, t, a, b, i / 2, limbs, w);
        }
        v.commit(off + i, off + 2 * n + i);

        i += 1;

        {
            let [s, t, a, b, temp] = v.parts([T1, T2, C(off + i), C(off + 2 * n + i), S1]);
            fft_butterfly_sqrt2(s, t, a, b, i, limbs, w, temp);
        }
        v.commit(off + i, off + 2 * n + i);

        i += 1;
    }

    while i < 2 * n {
        {
            let [r, a] = v.parts([C(off + 2 * n + i), C(off + i)]);
            fft_adjust(r, a, i / 2, limbs, w);
        }

        i += 1;

        {
            let [r, a, temp] = v.parts([C(off + 2 * n + i), C(off + i), S1]);
            fft_adjust_sqrt2(r, a, i, limbs, w, temp);
        }

        i += 1;
    }

    fft_radix2(v, off, n, w);
    fft_truncate1(v, off + 2 * n, n, w, trunc - 2 * n);
}

/// Inverse of [`fft_truncate_sqrt2`]: recovers `4n` times the first
/// `trunc` coefficients, knowing the rest of the inputs were zero.
pub fn ifft_truncate_sqrt2(v: &mut FftView<'_>, off: usize, n: usize, w: usize, trunc: usize) {
    debug_assert!(trunc > 2 * n && trunc <= 4 * n);
    debug_assert!(w % 2 == 0 || trunc % 2 == 0);
    let limbs = (w * n) / LIMB_BITS;

    if w % 2 == 0 {
        ifft_truncate(v, off, 2 * n, w / 2, trunc);
        return;
    }

    ifft_radix2(v, off, n, w);

    let mut i = trunc - 2 * n;
    while i < 2 * n {
        if i % 2 == 1 {
            let [r, a, temp] = v.parts([C(off + 2 * n + i), C(off + i), S1]);
            fft_adjust_sqrt2(r, a, i, limbs, w, temp);
        } else {
            let [r, a] = v.parts([C(off + 2 * n + i), C(off + i)]);
            fft_adjust(r, a, i / 2, limbs, w);
        }
        i += 1;
    }

    ifft_truncate1(v, off + 2 * n, n, w, trunc - 2 * n);

    for i in 0..trunc - 2 * n {
        if i % 2 == 1 {
            let [s, t, a, b, temp] = v.parts([T1, T2, C(off + i), C(off + 2 * n + i), S1]);
            ifft_butterfly_sqrt2(s, t, a, b, i, limbs, w, temp);
        } else {
            let [s, t, a, b] = v.parts([T1, T2, C(off + i), C(off + 2 * n + i)]);
            ifft_butterfly(s, t, a, b, i / 2, limbs, w);
        }
        v.commit(off + i, off + 2 * n + i);
    }

    for i in trunc - 2 * n..2 * n {
        limb::double_n(v.coeff_mut(off + i));
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::FftBuf;
    use crate::test_util;
    use crate::fermat;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn round_trip(depth: usize, w: usize, trunc: usize, seed: u8) {
        let n = 1usize << depth;
        let limbs = (n * w) / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([seed; 32]);
        let mut buf = FftBuf::new(4 * n, limbs);
        let mut orig = Vec::new();
        for i in 0..trunc {
            let c = test_util::random_fermat(limbs, &mut rng);
            buf.coeff_mut(i).copy_from_slice(&c);
            orig.push(c);
        }

        let mut v = buf.view();
        fft_truncate_sqrt2(&mut v, 0, n, w, trunc);
        ifft_truncate_sqrt2(&mut v, 0, n, w, trunc);
        for i in 0..trunc {
            let c = v.coeff_mut(i);
            fermat::div_2exp(c, (depth + 2) as u32);
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

    // ============================================================
    // ROUNDTRIP

    #[test]
    fn sqrt2_round_trip_odd_w() {
        let n = 1 << 6;
        for trunc in [4 * n, 2 * n + 2, 3 * n] {
            round_trip(6, 1, trunc, trunc as u8);
        }
        round_trip(7, 3, 3 << 7, 91);
    }

    #[test]
    fn sqrt2_round_trip_even_w_falls_through() {
        let n = 1 << 6;
        for trunc in [4 * n, 2 * n + 2, 3 * n + 2] {
            round_trip(6, 2, trunc, trunc as u8);
        }
    }

    #[test]
    fn sqrt2_round_trip_random_trunc() {
        let mut rng = ChaCha8Rng::from_seed([55; 32]);
        for (depth, w) in [(6, 1), (7, 1), (6, 3), (8, 1), (7, 2)] {
            let n = 1usize << depth;
            for _ in 0..3 {
                // keep the sqrt2 pairing aligned: even lengths only
                let trunc = 2 * rng.gen_range(n + 1..=2 * n);
                round_trip(depth, w, trunc, 5);
            }
        }
    }
}
