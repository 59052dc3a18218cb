//! Butterflies and twiddle applications on raw Fermat elements.
//!
//! Every routine here works on `limbs + 1`-word slices handed out by an
//! [`FftView`]; the whole-limb part of each twiddle goes through the fused
//! shift butterflies and the sub-limb part through `mul_2exp`/`div_2exp`.
//!
//! [`FftView`]: crate::fft::FftView

use crate::fermat::{self, butterfly_lshb, butterfly_rshb};
use crate::{limb, Limb, SignedLimb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - PUBLIC - radix-2 butterflies

/// `s = a + b`, `t = (a - b) * 2^(i*w)` mod `2^(n*w) + 1`.
pub fn fft_butterfly(
    s: &mut [Limb],
    t: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    i: usize,
    limbs: usize,
    w: usize,
) {
    let b1 = i * w;
    let y = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;
    butterfly_lshb(s, t, a, b, limbs, 0, y);
    fermat::mul_2exp(t, b1 as u32);
}

/// `s = a + b * 2^(-i*w)`, `t = a - b * 2^(-i*w)`; `b` is clobbered.
pub fn ifft_butterfly(
    s: &mut [Limb],
    t: &mut [Limb],
    a: &mut [Limb],
    b: &mut [Limb],
    i: usize,
    limbs: usize,
    w: usize,
) {
    let b1 = i * w;
    let y = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;
    fermat::div_2exp(b, b1 as u32);
    butterfly_rshb(s, t, a, b, limbs, 0, y);
}

// ======================================================================
// FUNCTIONS - PUBLIC - twiddle adjustments

/// `r = a * 2^(i*w)` mod `2^(n*w) + 1`.
///
/// The whole-limb part rotates `a` into `r` with the wrapped low limbs
/// negated; the sub-limb part is a `mul_2exp`.
pub fn fft_adjust(r: &mut [Limb], a: &[Limb], i: usize, limbs: usize, w: usize) {
    let b1 = i * w;
    let x = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;

    if x != 0 {
        r[limbs] = 0;
        r[x..limbs].copy_from_slice(&a[..limbs - x]);
        let cy = limb::neg_to(&mut r[..x], &a[limbs - x..limbs]);
        fermat::add_carry(&mut r[x..=limbs], (a[limbs] as SignedLimb).wrapping_neg());
        limb::sub_1(&mut r[x..=limbs], cy);
        fermat::mul_2exp(r, b1 as u32);
    } else {
        r.copy_from_slice(&a[..=limbs]);
        fermat::mul_2exp(r, b1 as u32);
    }
}

/// Multiplies `x` (in place, via `temp`) by `2^(n*w/2)`: a rotation by half
/// the limbs plus, when `limbs` is odd, half a limb. The result lands in
/// `temp`; `x` is left untouched.
fn half_shift(temp: &mut [Limb], x: &[Limb], limbs: usize) {
    let y = limbs / 2;
    temp[y..limbs].copy_from_slice(&x[..limbs - y]);
    temp[limbs] = 0;
    let cy = if y != 0 {
        limb::neg_to(&mut temp[..y], &x[limbs - y..limbs])
    } else {
        0
    };
    fermat::add_carry(&mut temp[y..=limbs], (x[limbs] as SignedLimb).wrapping_neg());
    limb::sub_1(&mut temp[y..=limbs], cy);
    if limbs % 2 == 1 {
        fermat::mul_2exp(temp, (LIMB_BITS / 2) as u32);
    }
}

/// Splits the sqrt2 twiddle exponent for position `i`: returns
/// `(b1, negate)` with `sqrt2^(i*w) = (-1)^negate * 2^b1 * (2^(n*w/2) - 1)`
/// and `b1 < n*w`.
fn sqrt2_exponent(i: usize, limbs: usize, w: usize) -> (usize, bool) {
    let wn = limbs * LIMB_BITS;
    let b1 = i / 2 + wn / 4 + i * (w / 2);
    if b1 >= wn {
        (b1 - wn, true)
    } else {
        (b1, false)
    }
}

/// `r = a * sqrt2^(i*w)` where `sqrt2 = 2^(3*n*w/4) - 2^(n*w/4)` squares
/// to 2. Needs odd `i` and odd `w`; `temp` is one scratch block.
pub fn fft_adjust_sqrt2(
    r: &mut [Limb],
    a: &[Limb],
    i: usize,
    limbs: usize,
    w: usize,
    temp: &mut [Limb],
) {
    let (b1, negate) = sqrt2_exponent(i, limbs, w);
    let y = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;

    // multiply by 2^(i/2 + wn/4 + i*(w/2))
    if y != 0 {
        temp[y..limbs].copy_from_slice(&a[..limbs - y]);
        let cy = limb::neg_to(&mut temp[..y], &a[limbs - y..limbs]);
        temp[limbs] = 0;
        fermat::add_carry(&mut temp[y..=limbs], (a[limbs] as SignedLimb).wrapping_neg());
        limb::sub_1(&mut temp[y..=limbs], cy);
        r.copy_from_slice(temp);
        fermat::mul_2exp(r, b1 as u32);
    } else {
        r.copy_from_slice(&a[..=limbs]);
        fermat::mul_2exp(r, b1 as u32);
    }

    // multiply by 2^(wn/2) and subtract
    half_shift(temp, r, limbs);
    if negate {
        limb::sub_n(r, temp);
    } else {
        limb::rsub_n(r, temp);
    }
}

/// The sqrt2-twiddled butterfly: `s = a + b`,
/// `t = (a - b) * sqrt2^(i*w)` for odd `i`, odd `w`.
pub fn fft_butterfly_sqrt2(
    s: &mut [Limb],
    t: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    i: usize,
    limbs: usize,
    w: usize,
    temp: &mut [Limb],
) {
    let (b1, negate) = sqrt2_exponent(i, limbs, w);
    let y = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;

    butterfly_lshb(s, t, a, b, limbs, 0, y);
    fermat::mul_2exp(t, b1 as u32);

    half_shift(temp, t, limbs);
    if negate {
        limb::sub_n(t, temp);
    } else {
        limb::rsub_n(t, temp);
    }
}

/// Inverse of [`fft_butterfly_sqrt2`]: `s = a + b * sqrt2^(-i*w)`,
/// `t = a - b * sqrt2^(-i*w)`; `b` is clobbered.
///
/// Uses `(2^(n*w/2) - 1) * (2^(n*w/2) + 1) = -2`, so the inverse twiddle is
/// `(-1)^(negate+1) * (2^(n*w/2) + 1) * 2^(-(b1+1))` with `b1` the forward
/// exponent: one half shift, one add, one negation, then the shifted
/// butterfly.
pub fn ifft_butterfly_sqrt2(
    s: &mut [Limb],
    t: &mut [Limb],
    a: &mut [Limb],
    b: &mut [Limb],
    i: usize,
    limbs: usize,
    w: usize,
    temp: &mut [Limb],
) {
    let wn = limbs * LIMB_BITS;
    let (b1, mut negate) = sqrt2_exponent(i, limbs, w);

    half_shift(temp, b, limbs);
    limb::add_n(b, temp);

    let mut d = b1 + 1;
    if d >= wn {
        d -= wn;
        negate = !negate;
    }
    fermat::div_2exp(b, (d % LIMB_BITS) as u32);
    if !negate {
        limb::neg_in_place(b);
    }
    butterfly_rshb(s, t, a, b, limbs, 0, d / LIMB_BITS);
}

// ======================================================================
// FUNCTIONS - PUBLIC - matrix-Fourier twiddled butterflies

/// Butterfly with both outputs twiddled: `u = (a + b) * 2^b1`,
/// `v = (a - b) * 2^b2`, exponents below `2*n*w` bits.
pub fn fft_butterfly_twiddle(
    u: &mut [Limb],
    v: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    limbs: usize,
    b1: usize,
    b2: usize,
) {
    let nw = limbs * LIMB_BITS;
    let (b1, negate2) = if b1 >= nw { (b1 - nw, true) } else { (b1, false) };
    let (b2, negate1) = if b2 >= nw { (b2 - nw, true) } else { (b2, false) };
    let x = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;
    let y = b2 / LIMB_BITS;
    let b2 = b2 % LIMB_BITS;

    butterfly_lshb(u, v, a, b, limbs, x, y);
    fermat::mul_2exp(u, b1 as u32);
    if negate2 {
        limb::neg_in_place(u);
    }
    fermat::mul_2exp(v, b2 as u32);
    if negate1 {
        limb::neg_in_place(v);
    }
}

/// Inverse of [`fft_butterfly_twiddle`]: both inputs un-twiddled first,
/// then the shifted butterfly. `a` and `b` are clobbered.
pub fn ifft_butterfly_twiddle(
    u: &mut [Limb],
    v: &mut [Limb],
    a: &mut [Limb],
    b: &mut [Limb],
    limbs: usize,
    b1: usize,
    b2: usize,
) {
    let nw = limbs * LIMB_BITS;
    let (b1, negate1) = if b1 >= nw { (b1 - nw, true) } else { (b1, false) };
    let (b2, negate2) = if b2 >= nw { (b2 - nw, true) } else { (b2, false) };
    let x = b1 / LIMB_BITS;
    let b1 = b1 % LIMB_BITS;
    let y = b2 / LIMB_BITS;
    let b2 = b2 % LIMB_BITS;

    if negate1 {
        limb::neg_in_place(a);
    }
    fermat::div_2exp(a, b1 as u32);
    if negate2 {
        limb::neg_in_place(b);
    }
    fermat::div_2exp(b, b2 as u32);
    butterfly_rshb(u, v, a, b, limbs, x, y);
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use num_bigint::BigUint;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn pow2(e: usize, p: &BigUint) -> BigUint {
        BigUint::from(2u32).modpow(&e.into(), p)
    }

    // ============================================================
    // fft_butterfly / ifft_butterfly

    #[test]
    fn butterfly_round_trip() {
        let mut rng = ChaCha8Rng::from_seed([7; 32]);
        let limbs = 4;
        let w = 2;
        // i ranges over one radix-2 layer: i < n = limbs*B/w
        for i in 0..limbs * LIMB_BITS / w {
            let a = test_util::random_fermat(limbs, &mut rng);
            let b = test_util::random_fermat(limbs, &mut rng);
            let mut s = vec![0; limbs + 1];
            let mut t = vec![0; limbs + 1];
            fft_butterfly(&mut s, &mut t, &a, &b, i, limbs, w);

            let mut a2 = vec![0; limbs + 1];
            let mut b2 = vec![0; limbs + 1];
            ifft_butterfly(&mut a2, &mut b2, &mut s, &mut t, i, limbs, w);
            crate::fermat::norm(&mut a2);
            crate::fermat::norm(&mut b2);

            let p = test_util::fermat_p(limbs);
            let av = test_util::fermat_to_biguint(&a);
            let bv = test_util::fermat_to_biguint(&b);
            assert_eq!(test_util::fermat_to_biguint(&a2), (&av + &av) % &p);
            assert_eq!(test_util::fermat_to_biguint(&b2), (&bv + &bv) % &p);
        }
    }

    // ============================================================
    // fft_adjust

    #[test]
    fn adjust_multiplies_by_root_power() {
        let mut rng = ChaCha8Rng::from_seed([8; 32]);
        let limbs = 4;
        let w = 3;
        let p = test_util::fermat_p(limbs);
        // exponent i*w must stay within n*w bits
        for i in 0..=limbs * LIMB_BITS / w {
            let a = test_util::random_fermat(limbs, &mut rng);
            let mut r = vec![0; limbs + 1];
            fft_adjust(&mut r, &a, i, limbs, w);
            crate::fermat::norm(&mut r);
            let expect = test_util::fermat_to_biguint(&a) * pow2(i * w, &p) % &p;
            assert_eq!(test_util::fermat_to_biguint(&r), expect, "i = {}", i);
        }
    }

    // ============================================================
    // sqrt2 twiddles

    #[test]
    fn adjust_sqrt2_squares_to_doubling() {
        // applying the sqrt2 twiddle for position i twice must equal
        // multiplication by 2^(i*w)
        let mut rng = ChaCha8Rng::from_seed([9; 32]);
        let limbs = 4;
        let w = 1;
        let p = test_util::fermat_p(limbs);
        // sqrt2 twiddles are applied at positions below 2n
        for i in (1..2 * limbs * LIMB_BITS / w).step_by(2) {
            let a = test_util::random_fermat(limbs, &mut rng);
            let mut temp = vec![0; limbs + 1];
            let mut r = vec![0; limbs + 1];
            fft_adjust_sqrt2(&mut r, &a, i, limbs, w, &mut temp);
            crate::fermat::norm(&mut r);
            let mut r2 = vec![0; limbs + 1];
            fft_adjust_sqrt2(&mut r2, &r, i, limbs, w, &mut temp);
            crate::fermat::norm(&mut r2);
            let expect = test_util::fermat_to_biguint(&a) * pow2(i * w, &p) % &p;
            assert_eq!(test_util::fermat_to_biguint(&r2), expect, "i = {}", i);
        }
    }

    #[test]
    fn butterfly_sqrt2_round_trip() {
        let mut rng = ChaCha8Rng::from_seed([10; 32]);
        let limbs = 4;
        let w = 1;
        let p = test_util::fermat_p(limbs);
        for i in (1..2 * limbs * LIMB_BITS / w).step_by(2) {
            let a = test_util::random_fermat(limbs, &mut rng);
            let b = test_util::random_fermat(limbs, &mut rng);
            let mut temp = vec![0; limbs + 1];
            let mut s = vec![0; limbs + 1];
            let mut t = vec![0; limbs + 1];
            fft_butterfly_sqrt2(&mut s, &mut t, &a, &b, i, limbs, w, &mut temp);

            let mut a2 = vec![0; limbs + 1];
            let mut b2 = vec![0; limbs + 1];
            ifft_butterfly_sqrt2(&mut a2, &mut b2, &mut s, &mut t, i, limbs, w, &mut temp);
            crate::fermat::norm(&mut a2);
            crate::fermat::norm(&mut b2);

            let av = test_util::fermat_to_biguint(&a);
            let bv = test_util::fermat_to_biguint(&b);
            assert_eq!(test_util::fermat_to_biguint(&a2), (&av + &av) % &p, "i = {}", i);
            assert_eq!(test_util::fermat_to_biguint(&b2), (&bv + &bv) % &p, "i = {}", i);
        }
    }

    // ============================================================
    // twiddled butterflies

    #[test]
    fn butterfly_twiddle_round_trip() {
        let mut rng = ChaCha8Rng::from_seed([11; 32]);
        let limbs = 4;
        let nw = limbs * LIMB_BITS;
        let p = test_util::fermat_p(limbs);
        for _ in 0..100 {
            let a = test_util::random_fermat(limbs, &mut rng);
            let b = test_util::random_fermat(limbs, &mut rng);
            let b1 = rng.gen_range(0..2 * nw);
            let b2 = rng.gen_range(0..2 * nw);
            let mut u = vec![0; limbs + 1];
            let mut v = vec![0; limbs + 1];
            fft_butterfly_twiddle(&mut u, &mut v, &a, &b, limbs, b1, b2);

            let mut s = vec![0; limbs + 1];
            let mut t = vec![0; limbs + 1];
            ifft_butterfly_twiddle(&mut s, &mut t, &mut u, &mut v, limbs, b1, b2);
            crate::fermat::norm(&mut s);
            crate::fermat::norm(&mut t);

            let av = test_util::fermat_to_biguint(&a);
            let bv = test_util::fermat_to_biguint(&b);
            assert_eq!(test_util::fermat_to_biguint(&s), (&av + &av) % &p);
            assert_eq!(test_util::fermat_to_biguint(&t), (&bv + &bv) % &p);
        }
    }
}
