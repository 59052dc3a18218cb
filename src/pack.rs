//! Splitting integers into Fermat coefficients and combining them back.
//!
//! **This is an advanced module which is not needed for [basic usage].**
//!
//! [`split_bits`] reads a non-negative limb vector as consecutive
//! `bits`-wide chunks, zero-extending each into a coefficient of a
//! transform buffer, so the integer equals the polynomial evaluated at
//! `2^bits`. [`combine_bits`] is the inverse: it adds coefficient `i`
//! (including its carry word) into the result at bit offset `i * bits`.
//!
//! This is the only place the code treats an integer as a polynomial, and
//! `combine_bits(split_bits(x)) == x` exactly for every non-negative `x`.
//! Sign handling lives one level up: callers that multiply signed values
//! split the absolute value and negate each coefficient in the ring.
//!
//! [basic usage]: crate#basic-usage

use crate::fft::FftView;
use crate::{limb, Limb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - PUBLIC - split

/// Splits `src` into coefficients of `coeff_limbs` whole limbs each.
/// Returns the number of coefficients produced.
pub fn split_limbs(v: &mut FftView<'_>, src: &[Limb], coeff_limbs: usize) -> usize {
    let total_limbs = src.len();
    let length = (total_limbs - 1) / coeff_limbs + 1;
    debug_assert!(length <= v.len());

    let mut skip = 0;
    let mut i = 0;
    while skip + coeff_limbs <= total_limbs {
        let dst = v.coeff_mut(i);
        limb::zero(dst);
        dst[..coeff_limbs].copy_from_slice(&src[skip..skip + coeff_limbs]);
        skip += coeff_limbs;
        i += 1;
    }
    if skip < total_limbs {
        let dst = v.coeff_mut(i);
        limb::zero(dst);
        dst[..total_limbs - skip].copy_from_slice(&src[skip..]);
        i += 1;
    }
    debug_assert_eq!(i, length);
    length
}

/// Splits `src` into consecutive `bits`-wide coefficients, zero-extended
/// into the buffer. Returns the number of coefficients produced.
///
/// When `bits` is a whole number of limbs the split is a pure limb copy;
/// otherwise each chunk is extracted with a cross-limb shift.
pub fn split_bits(v: &mut FftView<'_>, src: &[Limb], bits: usize) -> usize {
    debug_assert!(bits >= 1);
    if bits % LIMB_BITS == 0 {
        return split_limbs(v, src, bits / LIMB_BITS);
    }

    let total_bits = src.len() * LIMB_BITS;
    let length = (total_bits - 1) / bits + 1;
    debug_assert!(length <= v.len());

    for i in 0..length {
        let start = i * bits;
        let nbits = bits.min(total_bits - start);
        let dst = v.coeff_mut(i);
        limb::zero(dst);
        extract_bits(dst, src, start, nbits);
    }
    length
}

/// Copies the bit range `start .. start + nbits` of `src` into the low
/// bits of `dst`.
fn extract_bits(dst: &mut [Limb], src: &[Limb], start: usize, nbits: usize) {
    let limb = start / LIMB_BITS;
    let shift = (start % LIMB_BITS) as u32;
    let out_limbs = (nbits + LIMB_BITS - 1) / LIMB_BITS;

    for k in 0..out_limbs {
        let lo = src.get(limb + k).copied().unwrap_or(0) >> shift;
        let hi = if shift == 0 {
            0
        } else {
            src.get(limb + k + 1).copied().unwrap_or(0) << (LIMB_BITS as u32 - shift)
        };
        dst[k] = lo | hi;
    }

    let top = nbits % LIMB_BITS;
    if top != 0 {
        dst[out_limbs - 1] &= ((1 as Limb) << top) - 1;
    }
}

// ======================================================================
// FUNCTIONS - PUBLIC - combine

/// Adds `length` coefficients of `coeff_limbs` whole limbs spacing into
/// `res`, reading `output_limbs` words of each (plus carry propagation one
/// word further).
pub fn combine_limbs(
    res: &mut [Limb],
    v: &FftView<'_>,
    length: usize,
    coeff_limbs: usize,
    output_limbs: usize,
) {
    let total_limbs = res.len();
    let mut skip = 0;
    for i in 0..length {
        if skip >= total_limbs {
            break;
        }
        let coeff = v.coeff(i);
        let window = (total_limbs - skip).min(output_limbs + 1);
        let take = window.min(output_limbs).min(coeff.len());
        limb::add(&mut res[skip..skip + window], &coeff[..take]);
        skip += coeff_limbs;
    }
}

/// Adds `length` coefficients into `res`, coefficient `i` at bit offset
/// `i * bits`; the inverse of [`split_bits`]. `output_limbs` words of each
/// coefficient take part (the carry word included when the caller passes
/// `limbs + 1`).
pub fn combine_bits(
    res: &mut [Limb],
    v: &FftView<'_>,
    length: usize,
    bits: usize,
    output_limbs: usize,
) {
    if bits % LIMB_BITS == 0 {
        combine_limbs(res, v, length, bits / LIMB_BITS, output_limbs);
        return;
    }

    let total_limbs = res.len();
    let mut temp = vec![0 as Limb; output_limbs + 1];
    for i in 0..length {
        let start = i * bits;
        let limb_off = start / LIMB_BITS;
        if limb_off >= total_limbs {
            break;
        }
        let shift = (start % LIMB_BITS) as u32;
        let coeff = v.coeff(i);
        let take = coeff.len().min(output_limbs + 1);

        temp[..take].copy_from_slice(&coeff[..take]);
        temp[take..].fill(0);
        if shift != 0 {
            limb::shl_in_place(&mut temp, shift);
        }

        let window = (total_limbs - limb_off).min(output_limbs + 1);
        limb::add(&mut res[limb_off..limb_off + window], &temp[..window]);
    }
}

// ======================================================================
// TESTS
