//! Multiplication modulo `2^(n*w) + 1` built on the negacyclic transform.
//!
//! **This is an advanced module which is not needed for [basic usage].**
//!
//! Below [`MULMOD_FERMAT_CUTOFF`] limbs the product is a plain multiply
//! and fold ([`limb::mulmod_2expp1_basecase`]). Above it, the operands are
//! split into `2*n1` coefficients, sent through [`fft_negacyclic`], and the
//! pointwise products recurse with the smaller parameters picked from
//! [`MULMOD_TAB`] — the table shrinks `(depth, w)` monotonically, so the
//! recursion bottoms out in a handful of steps.
//!
//! The negacyclic convolution wraps high products back with a sign, which
//! loses one limb of information per coefficient. The exact low-limb
//! convolution ([`naive_convolution_1`]) recovers it: the combine loop uses
//! its low words to re-bias every coefficient before assembling the result.
//!
//! [basic usage]: crate#basic-usage

use crate::fft::{fft_negacyclic, ifft_negacyclic, FftBuf, Slot::*};
use crate::pack::{combine_bits, split_bits};
use crate::{fermat, limb, Limb, SignedLimb, LIMB_BITS};

// ======================================================================
// CONST - PUBLIC

/// Limb threshold below which [`mulmod_fermat`] uses the basecase
/// multiplier.
pub const MULMOD_FERMAT_CUTOFF: usize = 250;

/// Maps `(depth - 12, w - 1)` to the recursion offset for the negacyclic
/// parameters of [`mulmod_fermat`].
pub const MULMOD_TAB: [[usize; 2]; 7] =
    [[3, 3], [3, 3], [3, 3], [3, 2], [2, 2], [2, 2], [1, 1]];

// ======================================================================
// FUNCTIONS - PUBLIC

/// `r = a * b mod 2^(n*w) + 1`, normalised.
///
/// `a` and `b` are normalised elements of `limbs + 1` words with
/// `limbs = (n*w) / LIMB_BITS`; `r` must not alias them. Passing the same
/// slice for `a` and `b` squares it with a single forward transform.
/// `scratch` needs `2 * limbs` words.
pub fn mulmod_fermat(
    r: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    n: usize,
    w: usize,
    scratch: &mut [Limb],
) {
    let bits = n * w;
    let limbs = bits / LIMB_BITS;
    debug_assert_eq!(limbs * LIMB_BITS, bits);

    // an operand equal to 2^(n*w) multiplies as -1
    if a[limbs] != 0 || b[limbs] != 0 {
        if a[limbs] != 0 && b[limbs] != 0 {
            limb::zero(r);
            r[0] = 1;
        } else if a[limbs] != 0 {
            fermat::neg(r, b);
        } else {
            fermat::neg(r, a);
        }
        return;
    }

    if limbs <= MULMOD_FERMAT_CUTOFF {
        limb::mulmod_2expp1_basecase(r, a, b, scratch);
        return;
    }

    let mut depth = 1;
    while (1usize << depth) < n {
        depth += 1;
    }
    let mut depth1 = 1;
    while (1usize << (2 * depth1)) < bits {
        depth1 += 1;
    }
    depth1 -= 1;

    let w1 = bits >> (2 * depth1);
    if w1 << (2 * depth1) != bits {
        // no exact splitting of n*w into 2^(2*depth1) * w1 exists at this
        // weight, so the negacyclic round-trip would lose bits
        limb::mulmod_2expp1_basecase(r, a, b, scratch);
        return;
    }
    let off = MULMOD_TAB[depth.min(MULMOD_TAB.len() + 11) - 12][w.min(2) - 1];
    mulmod_fermat_fft(r, a, b, limbs, depth1 - off, w1 << (2 * off));
}

/// Exact product of the low limbs of `ii` and `jj` modulo `x^m + 1`, all
/// arithmetic carried out modulo one limb. Recovers the word of
/// information the negacyclic wraparound destroys.
fn naive_convolution_1(r: &mut [Limb], ii: &[Limb], jj: &[Limb], m: usize) {
    for i in 0..m {
        r[i] = ii[0].wrapping_mul(jj[i]);
    }
    for i in 1..m {
        for j in 0..m - i {
            r[i + j] = r[i + j].wrapping_add(ii[i].wrapping_mul(jj[j]));
        }
        for j in m - i..m {
            r[i + j - m] = r[i + j - m].wrapping_sub(ii[i].wrapping_mul(jj[j]));
        }
    }
}

// ======================================================================
// FUNCTIONS - PRIVATE

/// The transform path: negacyclic convolution of `2 * 2^depth` coefficients
/// in `Z / (2^(n1*w1) + 1)` with the auxiliary low-limb convolution and the
/// signed re-bias of the combine step.
fn mulmod_fermat_fft(
    r1: &mut [Limb],
    i1: &[Limb],
    i2: &[Limb],
    r_limbs: usize,
    depth: usize,
    w: usize,
) {
    let n = 1usize << depth;
    let bits1 = (r_limbs * LIMB_BITS) / (2 * n);
    let limbs = (n * w) / LIMB_BITS;
    debug_assert_eq!(limbs * LIMB_BITS, n * w);
    debug_assert_eq!(bits1 % LIMB_BITS, 0);
    debug_assert_eq!(2 * (bits1 / LIMB_BITS), limbs);

    let square = std::ptr::eq(i1, i2);
    let size = limbs + 1;
    let mut tt = vec![0 as Limb; 2 * size];
    let mut rr = vec![0 as Limb; 2 * n];

    let mut ii = FftBuf::new(2 * n, limbs);
    let mut ii0 = vec![0 as Limb; 2 * n];
    {
        let mut iv = ii.view();
        let j = split_bits(&mut iv, &i1[..r_limbs], bits1);
        iv.zero_coeffs(j..2 * n);
        for (k, lo) in ii0.iter_mut().enumerate() {
            *lo = iv.coeff(k)[0];
        }
        fft_negacyclic(&mut iv, 0, n, w);
        for k in 0..2 * n {
            fermat::norm(iv.coeff_mut(k));
        }
    }

    let mut jj = if square {
        None
    } else {
        let mut jj = FftBuf::new(2 * n, limbs);
        let mut jj0 = vec![0 as Limb; 2 * n];
        let mut jv = jj.view();
        let j = split_bits(&mut jv, &i2[..r_limbs], bits1);
        jv.zero_coeffs(j..2 * n);
        for (k, lo) in jj0.iter_mut().enumerate() {
            *lo = jv.coeff(k)[0];
        }
        fft_negacyclic(&mut jv, 0, n, w);
        for k in 0..2 * n {
            fermat::norm(jv.coeff_mut(k));
        }
        drop(jv);
        Some((jj, jj0))
    };

    {
        let mut iv = ii.view();
        match &mut jj {
            Some((jj, _)) => {
                for k in 0..2 * n {
                    let [dst, a] = iv.parts([S1, C(k)]);
                    mulmod_fermat(dst, a, jj.coeff(k), n, w, &mut tt);
                    iv.commit_s1(k);
                }
            }
            None => {
                for k in 0..2 * n {
                    let [dst, a] = iv.parts([S1, C(k)]);
                    let a: &[Limb] = a;
                    mulmod_fermat(dst, a, a, n, w, &mut tt);
                    iv.commit_s1(k);
                }
            }
        }
        ifft_negacyclic(&mut iv, 0, n, w);
    }

    let jj0 = jj.as_ref().map(|(_, jj0)| &jj0[..]).unwrap_or(&ii0[..]);
    naive_convolution_1(&mut rr, &ii0, jj0, 2 * n);

    // adjust each coefficient so its low limb agrees with the exact
    // convolution, recording the borrow indicator in rr[k]
    {
        let mut iv = ii.view();
        for k in 0..2 * n {
            let c = iv.coeff_mut(k);
            fermat::div_2exp(c, (depth + 1) as u32);
            fermat::norm(c);

            let t = c[limbs];
            c[limbs] = rr[k].wrapping_sub(c[0]);
            let v = c[limbs];
            let cy2 = limb::add_1(c, v);
            let (lo, carry) = c[limbs].overflowing_add(t);
            c[limbs] = lo;
            rr[k] = carry as Limb + cy2;
        }
    }

    limb::zero(r1);
    combine_bits(r1, &ii.view(), 2 * n - 1, bits1, limbs + 1);

    // the negacyclic convolution has effectively subtracted the wrapped
    // products, so negative coefficients need the modulus added back
    let limb_add = bits1 / LIMB_BITS;
    let mut ll = 0;
    for k in 0..2 * n - 2 {
        let neg_carry = (ii.coeff(k)[limbs] as SignedLimb) < 0;
        if rr[k] != 0 {
            limb::sub_1(&mut r1[ll + 1..=r_limbs], 1);
        } else if neg_carry {
            limb::sub_1(&mut r1[ll + 1..=r_limbs], 1);
            limb::sub_1(&mut r1[ll + limbs + 1..=r_limbs], 1);
        }
        ll += limb_add;
    }
    // penultimate coefficient: its top bit was already beyond the result
    let k = 2 * n - 2;
    if rr[k] != 0 || (ii.coeff(k)[limbs] as SignedLimb) < 0 {
        limb::sub_1(&mut r1[ll + 1..=r_limbs], 1);
    }

    // final coefficient wraps around the modulus
    let last = ii.coeff(2 * n - 1);
    let cy = limb::add_n(
        &mut r1[r_limbs - limb_add..r_limbs],
        &last[..limb_add],
    );
    r1[r_limbs] = r1[r_limbs].wrapping_add(cy);
    let c = limb::sub_n(&mut r1[..=limbs - limb_add], &last[limb_add..]);
    fermat::add_carry(
        &mut r1[limbs + 1 - limb_add..=r_limbs],
        (c as SignedLimb).wrapping_neg(),
    );
    fermat::norm(r1);
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use num_bigint::BigUint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn check_one(n: usize, w: usize, seed: u8) {
        let limbs = (n * w) / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([seed; 32]);
        let a = test_util::random_fermat(limbs, &mut rng);
        let b = test_util::random_fermat(limbs, &mut rng);
        let mut r = vec![0 as Limb; limbs + 1];
        let mut scratch = vec![0 as Limb; 2 * limbs];
        mulmod_fermat(&mut r, &a, &b, n, w, &mut scratch);

        let p = test_util::fermat_p(limbs);
        let expect =
            test_util::fermat_to_biguint(&a) * test_util::fermat_to_biguint(&b) % &p;
        assert_eq!(
            test_util::fermat_to_biguint(&r),
            expect,
            "n {} w {}",
            n,
            w
        );
    }

    // ============================================================
    // basecase sizes

    #[test]
    fn matches_bignum_reference_small() {
        for (n, w) in [(64, 1), (64, 2), (128, 1), (128, 2), (256, 1), (256, 2), (512, 1), (512, 2)] {
            check_one(n, w, (n % 251) as u8 + w as u8);
        }
    }

    #[test]
    fn squaring_uses_one_transform() {
        let n = 128;
        let w = 2;
        let limbs = (n * w) / LIMB_BITS;
        let mut rng = ChaCha8Rng::from_seed([92; 32]);
        let a = test_util::random_fermat(limbs, &mut rng);
        let mut r = vec![0 as Limb; limbs + 1];
        let mut scratch = vec![0 as Limb; 2 * limbs];
        mulmod_fermat(&mut r, &a, &a, n, w, &mut scratch);

        let p = test_util::fermat_p(limbs);
        let av = test_util::fermat_to_biguint(&a);
        assert_eq!(test_util::fermat_to_biguint(&r), &av * &av % &p);
    }

    #[test]
    fn modulus_representative_operands() {
        let n = 64;
        let w = 1;
        let limbs = 1;
        // a = 2^(n*w): acts as -1
        let mut a = vec![0 as Limb; limbs + 1];
        a[limbs] = 1;
        let mut b = vec![0 as Limb; limbs + 1];
        b[0] = 17;
        let mut r = vec![0 as Limb; limbs + 1];
        let mut scratch = vec![0 as Limb; 2 * limbs];
        mulmod_fermat(&mut r, &a, &b, n, w, &mut scratch);
        let p = test_util::fermat_p(limbs);
        assert_eq!(test_util::fermat_to_biguint(&r), &p - 17u32);

        mulmod_fermat(&mut r, &a, &a, n, w, &mut scratch);
        assert_eq!(test_util::fermat_to_biguint(&r), BigUint::from(1u32));
    }

    // ============================================================
    // transform sizes (above the cutoff)

    #[test]
    fn matches_bignum_reference_large() {
        // n*w chosen so limbs > MULMOD_FERMAT_CUTOFF forces the negacyclic path
        for (n, w, seed) in [(4096, 4, 1u8), (8192, 2, 2), (8192, 4, 3)] {
            check_one(n, w, seed);
        }
    }
}
