//! Arithmetic in the Fermat ring `Z / (2^(n*w) + 1)`.
//!
//! **This is an advanced module which is not needed for [basic usage].**
//!
//! A ring element occupies `limbs + 1` words where `limbs = (n*w) / LIMB_BITS`:
//! the low `limbs` words hold a magnitude and the last word is a signed carry
//! word, read as a two's-complement extension. Operations are allowed to leave
//! a small bounded carry behind; [`norm`] is the single place that produces
//! the canonical representative again.
//!
//! The two fused butterflies ([`butterfly_lshb`], [`butterfly_rshb`]) combine
//! an add/sub pass with a shift by a whole number of limbs, so a transform
//! butterfly touches each word exactly once. Sub-limb shift amounts go
//! through [`mul_2exp`] / [`div_2exp`] instead.
//!
//! [basic usage]: crate#basic-usage

use crate::limb::{self, sumdiff_n};
use crate::{Limb, SignedLimb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - PUBLIC - normalisation

/// Reduces `t` to canonical form.
///
/// On exit the carry word is 0, or 1 with all low limbs zero (the
/// representative of `2^(n*w)`).
pub fn norm(t: &mut [Limb]) {
    let limbs = t.len() - 1;
    let hi = t[limbs] as SignedLimb;
    if hi != 0 {
        t[limbs] = 0;
        add_carry(t, hi.wrapping_neg());

        // carry word is now in [-1, 1]
        let hi = t[limbs] as SignedLimb;
        if hi != 0 {
            t[limbs] = 0;
            add_carry(t, hi.wrapping_neg());

            if t[limbs] == Limb::MAX {
                t[limbs] = 0;
                add_carry(t, 1);
            }
        }
    }
}

/// Adds the signed constant `c` to the value stored in `r`, propagating
/// through all words including the carry word (which wraps).
pub fn add_carry(r: &mut [Limb], c: SignedLimb) {
    let sum = r[0].wrapping_add(c as Limb);
    // the top bit of the low limb only changes when a carry or borrow
    // has to propagate
    if ((sum ^ r[0]) as SignedLimb) >= 0 {
        r[0] = sum;
    } else if c >= 0 {
        limb::add_1(r, c as Limb);
    } else {
        limb::sub_1(r, c.unsigned_abs());
    }
}

/// `r = -x mod 2^(n*w) + 1`, normalised. `r` must not alias `x`.
pub fn neg(r: &mut [Limb], x: &[Limb]) {
    debug_assert_eq!(r.len(), x.len());
    limb::neg_to(r, x);
    norm(r);
}

// ======================================================================
// FUNCTIONS - PUBLIC - multiplication/division by 2^d

/// `t *= 2^d mod 2^(n*w) + 1` in place, `0 <= d < LIMB_BITS`.
///
/// Bits shifted past the top fold back to the low end with the sign flipped,
/// since `2^(n*w) = -1` in the ring.
pub fn mul_2exp(t: &mut [Limb], d: u32) {
    if d == 0 {
        return;
    }
    let limbs = t.len() - 1;
    let hi1 = (t[limbs] as SignedLimb) >> (LIMB_BITS as u32 - d);
    limb::shl_in_place(t, d);
    let hi2 = t[limbs];
    t[limbs] = 0;
    limb::sub_1(t, hi2);
    // the carry word spill re-enters one limb up: 2^((limbs+1)*B) = -2^B
    add_carry(&mut t[1..], hi1.wrapping_neg());
}

/// `t /= 2^d mod 2^(n*w) + 1` in place, `0 <= d < LIMB_BITS`.
///
/// The carry word shifts arithmetically; the dropped low bits re-enter just
/// below the top with the sign flipped.
pub fn div_2exp(t: &mut [Limb], d: u32) {
    if d == 0 {
        return;
    }
    let limbs = t.len() - 1;
    let hi = t[limbs] as SignedLimb;
    let lo = limb::shr_in_place(t, d);
    t[limbs] = (hi >> d) as Limb;
    let (w, bw) = t[limbs - 1].overflowing_sub(lo);
    t[limbs - 1] = w;
    t[limbs] = t[limbs].wrapping_sub(bw as Limb);
}

// ======================================================================
// FUNCTIONS - PUBLIC - fused shift butterflies

/// `t = 2^(x*B) * (a + b)`, `u = 2^(y*B) * (a - b)` mod `2^(n*w) + 1`,
/// where `B = LIMB_BITS` and `0 <= x, y < limbs`.
///
/// Each case runs one fused [`sumdiff_n`] pass per disjoint window, negates
/// the window that crossed the modulus and folds the carry words back via
/// [`add_carry`]. Output carry words stay within `|h| <= 3`.
pub fn butterfly_lshb(
    t: &mut [Limb],
    u: &mut [Limb],
    a: &[Limb],
    b: &[Limb],
    limbs: usize,
    x: usize,
    y: usize,
) {
    debug_assert!(x < limbs && y < limbs);
    if x == 0 {
        if y == 0 {
            sumdiff_n(t, u, a, b);
        } else {
            let cy = sumdiff_n(&mut t[..limbs - y], &mut u[y..limbs], &a[..limbs - y], &b[..limbs - y]);
            u[limbs] = (cy & 1).wrapping_neg();
            let cy1 = cy >> 1;
            let cy = sumdiff_n(
                &mut t[limbs - y..limbs],
                &mut u[..y],
                &b[limbs - y..limbs],
                &a[limbs - y..limbs],
            );
            t[limbs] = cy >> 1;
            limb::add_1(&mut t[limbs - y..=limbs], cy1);
            let c = b[limbs].wrapping_sub(a[limbs]) as SignedLimb - (cy & 1) as SignedLimb;
            add_carry(&mut u[y..=limbs], c);
            let c = (a[limbs].wrapping_add(b[limbs]) as SignedLimb).wrapping_neg();
            add_carry(&mut t[..=limbs], c);
        }
    } else if y == 0 {
        let cy = sumdiff_n(&mut t[x..limbs], &mut u[..limbs - x], &a[..limbs - x], &b[..limbs - x]);
        t[limbs] = cy >> 1;
        let cy1 = cy & 1;
        let cy = sumdiff_n(
            &mut t[..x],
            &mut u[limbs - x..limbs],
            &a[limbs - x..limbs],
            &b[limbs - x..limbs],
        );
        let cy2 = limb::neg_in_place(&mut t[..x]);
        u[limbs] = (cy & 1).wrapping_neg();
        limb::sub_1(&mut u[limbs - x..=limbs], cy1);
        let c = -((cy >> 1) as SignedLimb)
            - cy2 as SignedLimb
            - a[limbs].wrapping_add(b[limbs]) as SignedLimb;
        add_carry(&mut t[x..=limbs], c);
        let c = b[limbs].wrapping_sub(a[limbs]) as SignedLimb;
        add_carry(&mut u[..=limbs], c);
    } else if x > y {
        let cy = sumdiff_n(&mut t[x..limbs], &mut u[y..y + limbs - x], &a[..limbs - x], &b[..limbs - x]);
        t[limbs] = cy >> 1;
        let cy1 = cy & 1;
        let cy = sumdiff_n(
            &mut t[..x - y],
            &mut u[y + limbs - x..limbs],
            &a[limbs - x..limbs - y],
            &b[limbs - x..limbs - y],
        );
        let cy2 = limb::neg_in_place(&mut t[..x - y]);
        u[limbs] = (cy & 1).wrapping_neg();
        limb::sub_1(&mut u[y + limbs - x..=limbs], cy1);
        let cy1 = (cy >> 1).wrapping_add(cy2);
        let cy = sumdiff_n(
            &mut t[x - y..x],
            &mut u[..y],
            &b[limbs - y..limbs],
            &a[limbs - y..limbs],
        );
        let cy2 = limb::neg_in_place(&mut t[x - y..x]);
        let bw = limb::sub_1(&mut t[x - y..x], cy1);
        let c = -((cy >> 1) as SignedLimb)
            - bw as SignedLimb
            - cy2 as SignedLimb
            - a[limbs].wrapping_add(b[limbs]) as SignedLimb;
        add_carry(&mut t[x..=limbs], c);
        let c = b[limbs].wrapping_sub(a[limbs]) as SignedLimb - (cy & 1) as SignedLimb;
        add_carry(&mut u[y..=limbs], c);
    } else if x < y {
        let cy = sumdiff_n(&mut t[x..x + limbs - y], &mut u[y..limbs], &a[..limbs - y], &b[..limbs - y]);
        u[limbs] = (cy & 1).wrapping_neg();
        let cy1 = cy >> 1;
        let cy = sumdiff_n(
            &mut t[x + limbs - y..limbs],
            &mut u[..y - x],
            &b[limbs - y..limbs - x],
            &a[limbs - y..limbs - x],
        );
        t[limbs] = cy >> 1;
        limb::add_1(&mut t[x + limbs - y..=limbs], cy1);
        let cy1 = cy & 1;
        let cy = sumdiff_n(
            &mut t[..x],
            &mut u[y - x..y],
            &b[limbs - x..limbs],
            &a[limbs - x..limbs],
        );
        let bw = limb::sub_1(&mut u[y - x..y], cy1);
        let c = -((cy & 1) as SignedLimb) - bw as SignedLimb
            + b[limbs].wrapping_sub(a[limbs]) as SignedLimb;
        add_carry(&mut u[y..=limbs], c);
        let cy2 = limb::neg_in_place(&mut t[..x]);
        let c = -((cy >> 1) as SignedLimb)
            - a[limbs].wrapping_add(b[limbs]) as SignedLimb
            - cy2 as SignedLimb;
        add_carry(&mut t[x..=limbs], c);
    } else {
        // x == y != 0
        let cy = sumdiff_n(&mut t[x..limbs], &mut u[x..limbs], &a[..limbs - x], &b[..limbs - x]);
        t[limbs] = cy >> 1;
        u[limbs] = (cy & 1).wrapping_neg();
        let cy = sumdiff_n(
            &mut t[..x],
            &mut u[..x],
            &b[limbs - x..limbs],
            &a[limbs - x..limbs],
        );
        let cy2 = limb::neg_in_place(&mut t[..x]);
        let c = -((cy >> 1) as SignedLimb)
            - a[limbs].wrapping_add(b[limbs]) as SignedLimb
            - cy2 as SignedLimb;
        add_carry(&mut t[x..=limbs], c);
        let c = -((cy & 1) as SignedLimb) + b[limbs].wrapping_sub(a[limbs]) as SignedLimb;
        add_carry(&mut u[x..=limbs], c);
    }
}

/// `t = 2^(-x*B)*a + 2^(-y*B)*b`, `u = 2^(-x*B)*a - 2^(-y*B)*b`
/// mod `2^(n*w) + 1`, the mirror image of [`butterfly_lshb`].
///
/// Prefixes of `a` and `b` are negated in place while folding, so both
/// inputs are clobbered.
pub fn butterfly_rshb(
    t: &mut [Limb],
    u: &mut [Limb],
    a: &mut [Limb],
    b: &mut [Limb],
    limbs: usize,
    x: usize,
    y: usize,
) {
    debug_assert!(x < limbs && y < limbs);
    if x == 0 {
        if y == 0 {
            sumdiff_n(t, u, a, b);
        } else {
            let cy = sumdiff_n(&mut t[..limbs - y], &mut u[..limbs - y], &a[..limbs - y], &b[y..limbs]);
            let cy1 = cy >> 1;
            let cy2 = (cy & 1).wrapping_neg();
            let cy = sumdiff_n(
                &mut u[limbs - y..limbs],
                &mut t[limbs - y..limbs],
                &a[limbs - y..limbs],
                &b[..y],
            );
            u[limbs] = (cy >> 1).wrapping_add(a[limbs]);
            t[limbs] = a[limbs].wrapping_sub(cy & 1);
            add_carry(&mut t[limbs - y..=limbs], cy1.wrapping_add(b[limbs]) as SignedLimb);
            add_carry(&mut u[limbs - y..=limbs], cy2.wrapping_sub(b[limbs]) as SignedLimb);
        }
    } else if y == 0 {
        let cy = sumdiff_n(&mut t[..limbs - x], &mut u[..limbs - x], &a[x..limbs], &b[..limbs - x]);
        let cy1 = cy >> 1;
        let cy2 = (cy & 1).wrapping_neg();
        let cy3 = limb::neg_in_place(&mut a[..x]);
        let cy = sumdiff_n(
            &mut t[limbs - x..limbs],
            &mut u[limbs - x..limbs],
            &a[..x],
            &b[limbs - x..limbs],
        );
        u[limbs] = cy3
            .wrapping_neg()
            .wrapping_sub(cy & 1)
            .wrapping_sub(b[limbs]);
        t[limbs] = (cy >> 1).wrapping_add(b[limbs]).wrapping_sub(cy3);
        add_carry(&mut t[limbs - x..=limbs], cy1.wrapping_add(a[limbs]) as SignedLimb);
        add_carry(&mut u[limbs - x..=limbs], cy2.wrapping_add(a[limbs]) as SignedLimb);
    } else if x == y {
        let cy = sumdiff_n(&mut t[..limbs - x], &mut u[..limbs - x], &a[x..limbs], &b[x..limbs]);
        let cy1 = cy >> 1;
        let cy2 = (cy & 1).wrapping_neg();
        let cy = sumdiff_n(
            &mut t[limbs - x..limbs],
            &mut u[limbs - x..limbs],
            &b[..x],
            &a[..x],
        );
        let cy3 = limb::neg_in_place(&mut t[limbs - x..limbs]);
        u[limbs] = (cy & 1).wrapping_neg();
        t[limbs] = (cy >> 1).wrapping_neg().wrapping_sub(cy3);
        add_carry(
            &mut t[limbs - x..=limbs],
            cy1.wrapping_add(a[limbs]).wrapping_add(b[limbs]) as SignedLimb,
        );
        add_carry(
            &mut u[limbs - x..=limbs],
            cy2.wrapping_add(a[limbs]).wrapping_sub(b[limbs]) as SignedLimb,
        );
    } else if x > y {
        let cy = sumdiff_n(
            &mut t[limbs - y..limbs],
            &mut u[limbs - y..limbs],
            &b[..y],
            &a[x - y..x],
        );
        let cy3 = limb::neg_in_place(&mut t[limbs - y..limbs]);
        t[limbs] = (cy >> 1).wrapping_neg().wrapping_sub(cy3);
        u[limbs] = (cy & 1).wrapping_neg();
        let cy3 = limb::neg_in_place(&mut a[..x - y]);
        let cy = sumdiff_n(
            &mut t[limbs - x..limbs - y],
            &mut u[limbs - x..limbs - y],
            &a[..x - y],
            &b[limbs - x + y..limbs],
        );
        add_carry(
            &mut t[limbs - y..=limbs],
            (cy >> 1).wrapping_add(b[limbs]).wrapping_sub(cy3) as SignedLimb,
        );
        add_carry(
            &mut u[limbs - y..=limbs],
            (cy & 1)
                .wrapping_neg()
                .wrapping_sub(b[limbs])
                .wrapping_sub(cy3) as SignedLimb,
        );
        let cy = sumdiff_n(&mut t[..limbs - x], &mut u[..limbs - x], &a[x..limbs], &b[y..limbs - x + y]);
        add_carry(&mut t[limbs - x..=limbs], (cy >> 1).wrapping_add(a[limbs]) as SignedLimb);
        add_carry(
            &mut u[limbs - x..=limbs],
            (cy & 1).wrapping_neg().wrapping_add(a[limbs]) as SignedLimb,
        );
    } else {
        // x < y
        let cy = sumdiff_n(
            &mut t[limbs - x..limbs],
            &mut u[limbs - x..limbs],
            &b[y - x..y],
            &a[..x],
        );
        let cy3 = limb::neg_in_place(&mut t[limbs - x..limbs]);
        t[limbs] = (cy >> 1).wrapping_neg().wrapping_sub(cy3);
        u[limbs] = (cy & 1).wrapping_neg();
        let cy3 = limb::neg_in_place(&mut b[..y - x]);
        let cy = sumdiff_n(
            &mut t[limbs - y..limbs - x],
            &mut u[limbs - y..limbs - x],
            &a[limbs - y + x..limbs],
            &b[..y - x],
        );
        add_carry(
            &mut t[limbs - x..=limbs],
            (cy >> 1).wrapping_add(a[limbs]).wrapping_sub(cy3) as SignedLimb,
        );
        add_carry(
            &mut u[limbs - x..=limbs],
            (cy & 1)
                .wrapping_neg()
                .wrapping_add(a[limbs])
                .wrapping_add(cy3) as SignedLimb,
        );
        let cy = sumdiff_n(&mut t[..limbs - y], &mut u[..limbs - y], &a[x..limbs - y + x], &b[y..limbs]);
        add_carry(&mut t[limbs - y..=limbs], (cy >> 1).wrapping_add(b[limbs]) as SignedLimb);
        add_carry(
            &mut u[limbs - y..=limbs],
            (cy & 1).wrapping_neg().wrapping_sub(b[limbs]) as SignedLimb,
        );
    }
}

// ======================================================================
// TESTS
