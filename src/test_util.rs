use num_bigint::BigUint;
use num_traits::One;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::{Limb, SignedLimb, LIMB_BITS};

// ======================================================================
// FUNCTIONS - CRATE - conversions

/// A little-endian limb slice as a `BigUint`.
pub(crate) fn limbs_to_biguint(limbs: &[Limb]) -> BigUint {
    let bytes: &[u8] = bytemuck::cast_slice(limbs);
    BigUint::from_bytes_le(bytes)
}

/// The Fermat modulus `2^(limbs * LIMB_BITS) + 1`.
pub(crate) fn fermat_p(limbs: usize) -> BigUint {
    (BigUint::one() << (limbs * LIMB_BITS)) + 1u32
}

/// Value of a Fermat element with a signed carry word, reduced into
/// `[0, p)`.
pub(crate) fn fermat_to_biguint(x: &[Limb]) -> BigUint {
    let limbs = x.len() - 1;
    let p = fermat_p(limbs);
    let lo = limbs_to_biguint(&x[..limbs]);
    let hi = x[limbs] as SignedLimb;
    // hi * 2^(limbs*B) = -hi mod p
    if hi >= 0 {
        let hiv = BigUint::from(hi as u64) % &p;
        (lo + &p - hiv) % p
    } else {
        (lo + BigUint::from(hi.unsigned_abs())) % p
    }
}

// ======================================================================
// FUNCTIONS - CRATE - generation

/// A normalised random Fermat element of `limbs + 1` words.
pub(crate) fn random_fermat(limbs: usize, rng: &mut ChaCha8Rng) -> Vec<Limb> {
    let mut x = vec![0 as Limb; limbs + 1];
    rng.fill(&mut x[..limbs]);
    x
}

// ======================================================================
// FUNCTIONS - CRATE - hashing

/// Asserts the SHA-256 of the limbs matches a pinned hex digest.
#[allow(dead_code)]
pub(crate) fn assert_hash(limbs: &[Limb], expected: &str) {
    let mut sha = Sha256::new();
    sha.update(bytemuck::cast_slice::<Limb, u8>(limbs));
    let got = sha.finalize();

    if hex::encode(got) != expected {
        println!("GOT     : {}", hex::encode(got));
        println!("EXPECTED: {}", expected);
        panic!("limb buffer hash doesn't match");
    }
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fermat_value_reads_signed_carry() {
        // [5, -2] over 1 limb: 5 - 2 * 2^64 = 5 + 2 mod p
        let x = [5 as Limb, (-2 as SignedLimb) as Limb];
        assert_eq!(fermat_to_biguint(&x), BigUint::from(7u32));

        // carry word +1 with zero lows is p - 1
        let x = [0 as Limb, 1];
        assert_eq!(fermat_to_biguint(&x), fermat_p(1) - 1u32);
    }
}
