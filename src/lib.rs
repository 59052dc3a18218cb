#![doc = include_str!(concat!(env!("OUT_DIR"), "/README-rustdocified.md"))]
#![deny(missing_docs)]

pub use crate::mul::{mul_mfa_truncate_sqrt2, mul_truncate_sqrt2};
pub use crate::mulmod::mulmod_fermat;

#[cfg(test)]
mod test_util;

pub mod algorithm {
    #![doc = include_str!("algorithm.md")]
}

pub mod fermat;
pub mod fft;
pub mod limb;
pub mod matrix;
pub mod mul;
pub mod mulmod;
pub mod pack;

// ======================================================================
// TYPE ALIASES - PUBLIC

/// The machine word used as a digit of the multi-precision representation.
pub type Limb = u64;

/// A limb read as a two's-complement signed value (carry words).
pub type SignedLimb = i64;

// ======================================================================
// CONST - PUBLIC

/// Bit width of a [`Limb`].
pub const LIMB_BITS: usize = 64;

// ======================================================================
// FUNCTIONS - PUBLIC

/// Multiplies two non-negative little-endian limb vectors in one go,
/// returning a product of `a.len() + b.len()` limbs.
///
/// Small operands go to the schoolbook basecase; everything else runs the
/// Schönhage–Strassen pipeline with automatically selected parameters.
/// See [simple usage](crate#simple-usage) for an example.
pub fn mul(a: &[Limb], b: &[Limb]) -> Vec<Limb> {
    let mut r = vec![0; a.len() + b.len()];
    mul::mul(&mut r, a, b);
    r
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // mul

    #[test]
    fn one_go_product() {
        assert_eq!(mul(&[3], &[4]), vec![12, 0]);
        assert_eq!(
            mul(&[Limb::MAX], &[Limb::MAX]),
            vec![0x0000000000000001, 0xFFFFFFFFFFFFFFFE]
        );
    }

    #[test]
    fn empty_operands() {
        assert_eq!(mul(&[], &[7]), vec![0]);
        assert_eq!(mul(&[], &[]), Vec::<Limb>::new());
    }
}
